//! Case list management: `caselens cases`, `rename`, and `delete`.

use anyhow::{bail, Result};
use caselens_core::models::{CaseId, CaseListing};
use caselens_core::store::CaseStore;
use tracing::info;

/// Render the case list as an aligned table, one case per line.
pub fn format_case_table(cases: &[CaseListing]) -> String {
    if cases.is_empty() {
        return "No cases yet.\n".to_string();
    }

    let name_width = cases
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!(
        "{:>6}  {:<name_width$}  {:<19}  {:>4}\n",
        "ID", "NAME", "CREATED", "DOCS"
    );
    for case in cases {
        out.push_str(&format!(
            "{:>6}  {:<name_width$}  {:<19}  {:>4}\n",
            case.id.to_string(),
            case.name,
            case.created_at,
            case.document_count
        ));
    }
    out
}

pub async fn run_list(store: &dyn CaseStore) -> Result<()> {
    let cases = store.list_cases().await?;
    print!("{}", format_case_table(&cases));
    Ok(())
}

pub async fn run_rename(store: &dyn CaseStore, id: CaseId, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("case name must not be empty");
    }
    store.rename_case(id, name).await?;
    info!(%id, name, "case renamed");
    println!("Renamed case {} to \"{}\".", id, name);
    Ok(())
}

/// Delete a case and all of its documents. Refuses unless `confirmed`.
pub async fn run_delete(store: &dyn CaseStore, id: CaseId, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!(
            "refusing to delete case {} without --yes (this removes all of its documents)",
            id
        );
    }
    store.delete_case(id).await?;
    info!(%id, "case deleted");
    println!("Deleted case {}.", id);
    Ok(())
}
