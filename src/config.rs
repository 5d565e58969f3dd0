use anyhow::{Context, Result};
use caselens_core::timeline::{TimelineOptions, UndatedPlacement, DEFAULT_UNDATED_LABEL};
use caselens_core::upload::UploadPolicy;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimelineConfig {
    #[serde(default = "default_undated_label")]
    pub undated_label: String,
    #[serde(default)]
    pub undated_placement: UndatedPlacement,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            undated_label: default_undated_label(),
            undated_placement: UndatedPlacement::default(),
        }
    }
}

fn default_undated_label() -> String {
    DEFAULT_UNDATED_LABEL.to_string()
}

impl TimelineConfig {
    pub fn options(&self) -> TimelineOptions {
        TimelineOptions {
            undated_label: self.undated_label.clone(),
            undated_placement: self.undated_placement,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_case_name")]
    pub default_case_name: String,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            default_case_name: default_case_name(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_case_name() -> String {
    "Demo Case".to_string()
}
fn default_allowed_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

impl UploadConfig {
    pub fn policy(&self) -> UploadPolicy {
        UploadPolicy {
            allowed_extensions: self
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether only PDFs are accepted, in which case file contents are
    /// checked for the PDF signature as well.
    pub fn pdf_only(&self) -> bool {
        let policy = self.policy();
        !policy.allowed_extensions.is_empty()
            && policy.allowed_extensions.iter().all(|e| e == "pdf")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "caselens=info,caselens_core=info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists; otherwise fall back to defaults when
/// `required` is false.
pub fn load_or_default(path: &Path, required: bool) -> Result<Config> {
    if !required && !path.exists() {
        return Ok(Config::default());
    }
    load_config(path)
}

pub fn validate(config: &Config) -> Result<()> {
    let base = config.api.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!("api.base_url must start with http:// or https://");
    }

    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }

    if config.timeline.undated_label.trim().is_empty() {
        anyhow::bail!("timeline.undated_label must not be empty");
    }

    if config
        .upload
        .allowed_extensions
        .iter()
        .any(|e| e.trim_start_matches('.').trim().is_empty())
    {
        anyhow::bail!("upload.allowed_extensions must not contain empty entries");
    }

    Ok(())
}
