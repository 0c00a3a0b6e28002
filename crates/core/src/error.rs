use crate::condition::Condition;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unknown condition: {0}")]
    UnknownCondition(String),
    #[error("unknown group '{group}' for condition {condition}")]
    UnknownGroup { condition: Condition, group: String },
    #[error("'{value}' is not a legal value for group '{group}' ({condition})")]
    InvalidGroupValue {
        condition: Condition,
        group: String,
        value: String,
    },
    #[error("toggle state belongs to {found}, cannot generate a {expected} note")]
    ToggleScopeMismatch {
        expected: Condition,
        found: Condition,
    },

    #[error("code catalogue unavailable: {0}")]
    CatalogueUnavailable(String),
    #[error("failed to read code catalogue: {0}")]
    CatalogueRead(std::io::Error),
    #[error("failed to parse code catalogue: {0}")]
    CatalogueParse(serde_json::Error),
    #[error("invalid condition catalogue: {0}")]
    ConditionSchema(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
