//! `caselens show`: one case rendered as summary plus timeline.
//!
//! Text output is meant for terminals; `--json` prints the [`CaseView`]
//! itself so scripts get the same grouping and parsed annotations.

use std::fmt::Write as _;

use anyhow::{bail, Result};
use caselens_core::annotation::{FactRecord, ParsedAnnotation};
use caselens_core::models::{CaseId, Document};
use caselens_core::store::CaseStore;
use caselens_core::timeline::TimelineOptions;
use caselens_core::view::{CaseView, SummaryState};
use serde_json::Value;

pub const PENDING_SUMMARY: &str = "Summarization in progress…";

/// Fetch a case and build its view. Fails when the case does not exist.
pub async fn load_view(
    store: &dyn CaseStore,
    id: CaseId,
    options: &TimelineOptions,
) -> Result<CaseView> {
    match store.get_case(id).await? {
        Some(record) => Ok(CaseView::build(&record, options)),
        None => bail!("case not found: {}", id),
    }
}

pub async fn run_show(
    store: &dyn CaseStore,
    id: CaseId,
    options: &TimelineOptions,
    json: bool,
) -> Result<()> {
    let view = load_view(store, id, options).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render_view(&view));
    }
    Ok(())
}

pub fn render_view(view: &CaseView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Case {}: {} (created {})",
        view.meta.id, view.meta.name, view.meta.created_at
    );
    let _ = writeln!(out, "{} document(s)", view.document_count());

    out.push_str("\nSummary\n");
    match &view.summary {
        SummaryState::Pending => {
            let _ = writeln!(out, "  {}", PENDING_SUMMARY);
        }
        SummaryState::Unstructured(text) => {
            for line in text.lines() {
                let _ = writeln!(out, "  {}", line);
            }
        }
        SummaryState::Parsed(parsed) => render_annotation(&mut out, parsed, "  "),
    }

    out.push_str("\nTimeline\n");
    if view.timeline.is_empty() {
        out.push_str("  (no documents)\n");
    }
    for entry in &view.timeline {
        let _ = writeln!(out, "{}", entry.label);
        for item in &entry.documents {
            let _ = writeln!(out, "  {}", document_line(&item.document));
            render_annotation(&mut out, &item.annotation, "    ");
        }
    }
    out
}

/// `filename  [type · provider · N pages]`, leaving out unknown parts.
fn document_line(doc: &Document) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(doc_type) = doc.doc_type.as_deref().filter(|s| !s.is_empty()) {
        parts.push(doc_type.to_string());
    }
    if let Some(provider) = doc.provider.as_deref().filter(|s| !s.is_empty()) {
        parts.push(provider.to_string());
    }
    if let Some(pages) = doc.page_count() {
        parts.push(format!("{} page{}", pages, if pages == 1 { "" } else { "s" }));
    }
    if parts.is_empty() {
        doc.filename.clone()
    } else {
        format!("{}  [{}]", doc.filename, parts.join(" · "))
    }
}

fn render_annotation(out: &mut String, parsed: &ParsedAnnotation, indent: &str) {
    for statement in &parsed.summary {
        let _ = writeln!(out, "{}- {}", indent, statement);
    }
    for fact in &parsed.facts {
        match FactRecord::from_value(fact) {
            Some(record) => render_fact(out, &record, indent),
            None => {
                let _ = writeln!(out, "{}fact: {}", indent, fact);
            }
        }
    }
}

fn render_fact(out: &mut String, record: &FactRecord<'_>, indent: &str) {
    let mut head: Vec<&str> = Vec::new();
    head.extend(record.date_of_visit());
    head.extend(record.doc_type());
    head.extend(record.provider());
    if head.is_empty() {
        let _ = writeln!(out, "{}fact:", indent);
    } else {
        let _ = writeln!(out, "{}fact: {}", indent, head.join(" · "));
    }

    let diagnoses = record.diagnoses();
    if !diagnoses.is_empty() {
        let _ = writeln!(out, "{}  diagnoses: {}", indent, diagnoses.join("; "));
    }
    let treatments = record.treatments();
    if !treatments.is_empty() {
        let _ = writeln!(out, "{}  treatments: {}", indent, treatments.join("; "));
    }

    for (key, value) in record.fields() {
        if matches!(
            key,
            "date_of_visit" | "doc_type" | "provider" | "diagnoses" | "treatments"
        ) {
            continue;
        }
        match value {
            Value::Null => {}
            Value::String(s) => {
                let _ = writeln!(out, "{}  {}: {}", indent, key, s);
            }
            other => {
                let _ = writeln!(out, "{}  {}: {}", indent, key, other);
            }
        }
    }
}
