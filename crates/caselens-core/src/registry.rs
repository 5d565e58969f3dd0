//! Case list plus the case currently selected for append-mode uploads.
//!
//! A selection that no longer resolves (the case was deleted elsewhere)
//! behaves exactly like no selection.

use crate::models::{CaseId, CaseListing};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseRegistry {
    cases: Vec<CaseListing>,
    selected: Option<CaseId>,
}

impl CaseRegistry {
    pub fn new(cases: Vec<CaseListing>) -> Self {
        Self {
            cases,
            selected: None,
        }
    }

    pub fn cases(&self) -> &[CaseListing] {
        &self.cases
    }

    pub fn select(&mut self, id: Option<CaseId>) {
        self.selected = id;
    }

    /// The selected case, if the selection still refers to a listed case.
    pub fn selected_case(&self) -> Option<&CaseListing> {
        let id = self.selected?;
        self.cases.iter().find(|c| c.id == id)
    }

    pub fn is_append_mode(&self) -> bool {
        self.selected_case().is_some()
    }

    /// Case id to hand to an upload session: the resolved selection or
    /// `None` for a new case.
    pub fn upload_target(&self) -> Option<CaseId> {
        self.selected_case().map(|c| c.id)
    }

    /// Swap in a fresh case list, dropping a selection that no longer
    /// resolves.
    pub fn replace_cases(&mut self, cases: Vec<CaseListing>) {
        self.cases = cases;
        if self.selected_case().is_none() {
            self.selected = None;
        }
    }
}
