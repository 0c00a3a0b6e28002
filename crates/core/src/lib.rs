//! # OptiNote Core
//!
//! Core logic for the OptiNote ophthalmology note assistant.
//!
//! This crate contains pure, deterministic operations:
//! - The condition catalogue (free-text fields and toggle groups per condition)
//! - Toggle state scoped to one condition
//! - Rule-based clinical note generation
//! - ICD-10 code search over a bundled catalogue, and the selected-codes list
//!
//! **No API concerns**: HTTP servers, CLI parsing and the remote SOAP formatter belong in
//! `api-rest`, `optinote-cli` and `optinote-soap`.

pub mod catalogue;
pub mod codes;
pub mod condition;
pub mod config;
pub mod constants;
pub mod error;
pub mod notes;
pub mod search;
pub mod selection;
pub mod toggles;

pub use catalogue::{ConditionCatalogue, ConditionSchema, GroupSchema};
pub use codes::{CatalogueEntry, CodeCatalogue, CodeRecord};
pub use condition::Condition;
pub use config::{resolve_code_catalogue_path, ClinicianSettings, CoreConfig};
pub use error::{CoreError, CoreResult};
pub use notes::{ClinicalNote, NoteFields, NoteGenerator, NoteHeader};
pub use search::{CodeSearch, SearchResults};
pub use selection::SelectedCodes;
pub use toggles::ToggleState;
