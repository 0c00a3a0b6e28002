//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Nothing
//! in the core reads process-wide environment variables while handling a request; binaries read
//! the environment and hand the raw values to the constructors here.

use crate::constants::CODE_CATALOGUE_PATH;
use crate::{CoreError, CoreResult};
use optinote_types::{NonEmptyText, SecretText};
use std::path::{Path, PathBuf};

/// Clinician-facing settings: optional values that personalise generated notes.
///
/// Read-only as far as the core is concerned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClinicianSettings {
    pub clinician_name: Option<NonEmptyText>,
    pub department: Option<NonEmptyText>,
    pub api_key: Option<SecretText>,
}

impl ClinicianSettings {
    /// Builds settings from raw (possibly blank) values; blank means "not set".
    pub fn from_values(
        clinician_name: Option<String>,
        department: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            clinician_name: NonEmptyText::optional(clinician_name),
            department: NonEmptyText::optional(department),
            api_key: SecretText::optional(api_key),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    code_catalogue_path: PathBuf,
    settings: ClinicianSettings,
}

impl CoreConfig {
    pub fn new(code_catalogue_path: PathBuf, settings: ClinicianSettings) -> Self {
        Self {
            code_catalogue_path,
            settings,
        }
    }

    pub fn code_catalogue_path(&self) -> &Path {
        &self.code_catalogue_path
    }

    pub fn settings(&self) -> &ClinicianSettings {
        &self.settings
    }
}

/// Resolve the code catalogue path without reading environment variables.
///
/// An explicit `override_path` is returned as-is even if the file does not exist: a missing
/// catalogue is reported later as `CatalogueUnavailable`, not as a startup failure. Without an
/// override this searches for `data/icd10_ophthalmic.json` relative to the current working
/// directory and then walks up from `CARGO_MANIFEST_DIR`.
///
/// # Errors
///
/// Returns `CoreError::InvalidInput` if the override is blank or no candidate file exists.
pub fn resolve_code_catalogue_path(override_path: Option<PathBuf>) -> CoreResult<PathBuf> {
    if let Some(path) = override_path {
        if path.as_os_str().is_empty() {
            return Err(CoreError::InvalidInput(
                "OPTINOTE_CODE_CATALOGUE override cannot be empty".into(),
            ));
        }
        return Ok(path);
    }

    let cwd_relative = PathBuf::from(CODE_CATALOGUE_PATH);
    if cwd_relative.is_file() {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(CODE_CATALOGUE_PATH);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(CoreError::InvalidInput(format!(
        "could not locate {CODE_CATALOGUE_PATH}"
    )))
}
