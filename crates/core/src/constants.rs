//! Constants used throughout the OptiNote core crate.

/// Relative location of the code catalogue resource.
pub const CODE_CATALOGUE_PATH: &str = "data/icd10_ophthalmic.json";

/// Maximum number of search results handed to a display surface.
///
/// This is a display cap, not a relevance cutoff: matches beyond it are dropped.
pub const SEARCH_RESULT_LIMIT: usize = 12;

/// Symptom words must be longer than this (in characters) to match on their own.
pub const SYMPTOM_WORD_MIN_EXCLUSIVE: usize = 3;

/// Fallback text for findings that always appear, even when the field is blank.
pub const NOT_RECORDED: &str = "Not recorded";

/// Placeholder for a missing per-eye reading in a paired line (e.g. IOP R/L).
pub const MISSING_READING: &str = "—";

/// Character repeated to draw the rule under a note title.
pub const TITLE_RULE_CHAR: char = '─';

/// Bullet prefix for plan lines.
pub const PLAN_BULLET: &str = "• ";

/// Date layout used in note headers, e.g. `07 Mar 2026`.
pub const NOTE_DATE_FORMAT: &str = "%d %b %Y";

/// Free-text field that feeds the header's patient reference.
pub const PATIENT_REF_FIELD: &str = "patient_ref";
