//! Export a case as JSON.
//!
//! Produces the `{ case, docs }` document the backend serves at
//! `/export/{id}.json`: the case header and each document's classification
//! metadata, without annotations.

use anyhow::{bail, Context, Result};
use caselens_core::models::CaseId;
use caselens_core::store::CaseStore;
use caselens_core::view::CaseExport;
use std::path::Path;

pub async fn export_case(store: &dyn CaseStore, id: CaseId) -> Result<CaseExport> {
    match store.get_case(id).await? {
        Some(record) => Ok(CaseExport::from_record(&record)),
        None => bail!("case not found: {}", id),
    }
}

/// Export one case as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(store: &dyn CaseStore, id: CaseId, output: Option<&Path>) -> Result<()> {
    let export = export_case(store, id).await?;
    let json = serde_json::to_string_pretty(&export)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported case {} ({} documents) to {}",
                id,
                export.docs.len(),
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
