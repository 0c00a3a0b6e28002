//! The fixed enumeration of supported ophthalmic conditions.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// An ophthalmic condition with its own note template.
///
/// Identifiers parse case-sensitively from the tags used by the catalogue (`DR`, `AMD`,
/// `Glaucoma`, `ROP`, `Cataract`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "DR")]
    DiabeticRetinopathy,
    #[serde(rename = "AMD")]
    MacularDegeneration,
    #[serde(rename = "Glaucoma")]
    Glaucoma,
    #[serde(rename = "ROP")]
    RetinopathyOfPrematurity,
    #[serde(rename = "Cataract")]
    Cataract,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::DiabeticRetinopathy,
        Condition::MacularDegeneration,
        Condition::Glaucoma,
        Condition::RetinopathyOfPrematurity,
        Condition::Cataract,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::DiabeticRetinopathy => "DR",
            Condition::MacularDegeneration => "AMD",
            Condition::Glaucoma => "Glaucoma",
            Condition::RetinopathyOfPrematurity => "ROP",
            Condition::Cataract => "Cataract",
        }
    }

    /// Parses a condition tag, failing with `UnknownCondition` for anything outside the
    /// enumeration.
    pub fn parse(tag: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == tag)
            .ok_or_else(|| CoreError::UnknownCondition(tag.to_string()))
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Condition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
