//! # caselens core
//!
//! Pure logic for caselens: case and document models, the annotation
//! parser, timeline aggregation, the upload session state machine, the case
//! registry view, and the [`store::CaseStore`] collaborator trait.
//!
//! This crate contains no tokio, reqwest, filesystem I/O, or other
//! runtime-bound dependencies. Everything except [`store::CaseStore`] and
//! [`upload::UploadSession::submit`] is synchronous.

pub mod annotation;
pub mod models;
pub mod registry;
pub mod store;
pub mod timeline;
pub mod upload;
pub mod view;
