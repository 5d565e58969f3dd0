//! # caselens
//!
//! Command-line front end for a case summarization service.
//!
//! A case is a named batch of documents. The backend stores them, runs
//! extraction and summarization, and hands back raw annotation text.
//! caselens uploads batches, then turns the annotations into a readable
//! case summary and a date-ordered timeline of per-document facts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │  CLI (clap)  │──▶│  caselens-core   │◀──│ HttpCaseStore │
//! │ show/upload  │   │ parse · timeline │   │   (reqwest)   │
//! └──────────────┘   │ upload session   │   └──────┬───────┘
//!                    └──────────────────┘          ▼
//!                                            backend service
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`http_store`] | `CaseStore` over the backend's HTTP API |
//! | [`progress`] | Upload progress on stderr |
//! | [`cases`] | List, rename, delete |
//! | [`show`] | Case summary and timeline rendering |
//! | [`upload`] | Batch upload from local files |
//! | [`export`] | Case export JSON |
//! | [`parse_cmd`] | Offline annotation parsing |

pub mod cases;
pub mod config;
pub mod export;
pub mod http_store;
pub mod parse_cmd;
pub mod progress;
pub mod show;
pub mod upload;
