//! Code catalogue: diagnosis-code records keyed by condition name and by symptom phrase.
//!
//! The catalogue is a JSON document of the form:
//!
//! ```json
//! {
//!   "conditions": { "Glaucoma": [{ "code": "H40.11", "description": "..." }] },
//!   "symptoms":   { "eye pain": [{ "code": "H57.1", "description": "...", "condition": "..." }] }
//! }
//! ```
//!
//! Declaration order of both mappings is significant (it drives result order in search), so the
//! mappings are read into ordered entry lists rather than hash maps.

use crate::error::{CoreError, CoreResult};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

/// A single diagnosis code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeRecord {
    pub code: String,
    pub description: String,
    /// Owning condition name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// One key of a catalogue mapping with its records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub key: String,
    pub records: Vec<CodeRecord>,
}

/// Immutable catalogue of condition and symptom entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeCatalogue {
    conditions: Vec<CatalogueEntry>,
    symptoms: Vec<CatalogueEntry>,
}

impl CodeCatalogue {
    pub fn new(conditions: Vec<CatalogueEntry>, symptoms: Vec<CatalogueEntry>) -> Self {
        Self {
            conditions,
            symptoms,
        }
    }

    /// Reads and parses a catalogue file.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::CatalogueRead` if the file cannot be read and
    /// `CoreError::CatalogueParse` if it is not a valid catalogue document.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(CoreError::CatalogueRead)?;
        Self::from_json_str(&text)
    }

    /// Parses a catalogue document.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::CatalogueParse` if the JSON is malformed or either mapping is missing.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let wire: CodeCatalogueWire = serde_json::from_str(json).map_err(CoreError::CatalogueParse)?;
        Ok(Self {
            conditions: wire.conditions.0,
            symptoms: wire.symptoms.0,
        })
    }

    /// Condition name → records, in declaration order.
    pub fn condition_entries(&self) -> &[CatalogueEntry] {
        &self.conditions
    }

    /// Symptom phrase → records, in declaration order.
    pub fn symptom_entries(&self) -> &[CatalogueEntry] {
        &self.symptoms
    }

    /// Total number of records across both mappings (duplicates included).
    pub fn record_count(&self) -> usize {
        self.conditions
            .iter()
            .chain(&self.symptoms)
            .map(|e| e.records.len())
            .sum()
    }
}

#[derive(Deserialize)]
struct CodeCatalogueWire {
    conditions: OrderedEntries,
    symptoms: OrderedEntries,
}

struct OrderedEntries(Vec<CatalogueEntry>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of names to lists of code records")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, records)) = map.next_entry::<String, Vec<CodeRecord>>()? {
                    entries.push(CatalogueEntry { key, records });
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
