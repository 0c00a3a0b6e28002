//! JSON request and response bodies.
//!
//! These mirror the core types but stay flat and string-typed so that the OpenAPI document is
//! self-describing.

use optinote_core::{ClinicalNote, CodeRecord, ConditionSchema, GroupSchema, SearchResults};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupRes {
    pub key: String,
    pub domain: Vec<String>,
    pub default: String,
}

impl From<&GroupSchema> for GroupRes {
    fn from(group: &GroupSchema) -> Self {
        Self {
            key: group.key().to_string(),
            domain: group.domain().to_vec(),
            default: group.default_value().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ConditionRes {
    /// Condition tag, e.g. `DR`.
    pub condition: String,
    pub title: String,
    pub fields: Vec<String>,
    pub groups: Vec<GroupRes>,
}

impl From<&ConditionSchema> for ConditionRes {
    fn from(schema: &ConditionSchema) -> Self {
        Self {
            condition: schema.condition().as_str().to_string(),
            title: schema.title().to_string(),
            fields: schema.fields().to_vec(),
            groups: schema.groups().iter().map(GroupRes::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListConditionsRes {
    pub conditions: Vec<ConditionRes>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateNoteReq {
    pub condition: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Group key to selected value; omitted groups take their defaults.
    #[serde(default)]
    pub toggles: BTreeMap<String, String>,
    #[serde(default)]
    pub patient_ref: Option<String>,
    /// `YYYY-MM-DD`; defaults to today.
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateNoteRes {
    pub condition: String,
    /// Rendered note text.
    pub text: String,
    pub header: Vec<String>,
    pub infant_details: Vec<String>,
    pub findings: Vec<String>,
    pub impression: Vec<String>,
    pub plan: Vec<String>,
}

impl From<&ClinicalNote> for GenerateNoteRes {
    fn from(note: &ClinicalNote) -> Self {
        Self {
            condition: note.condition.as_str().to_string(),
            text: note.render(),
            header: note.header.clone(),
            infant_details: note.infant_details.clone(),
            findings: note.findings.clone(),
            impression: note.impression.clone(),
            plan: note.plan.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CodeRecordRes {
    pub code: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl From<&CodeRecord> for CodeRecordRes {
    fn from(record: &CodeRecord) -> Self {
        Self {
            code: record.code.clone(),
            description: record.description.clone(),
            condition: record.condition.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CodeSearchRes {
    pub query: String,
    pub records: Vec<CodeRecordRes>,
    pub total_matches: usize,
    pub truncated: bool,
    /// Present only when nothing matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&SearchResults> for CodeSearchRes {
    fn from(results: &SearchResults) -> Self {
        Self {
            query: results.query().to_string(),
            records: results.records().iter().map(CodeRecordRes::from).collect(),
            total_matches: results.total_matches(),
            truncated: results.truncated(),
            message: results.no_results_message(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FormatSoapReq {
    pub input: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FormatSoapRes {
    pub soap: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use optinote_core::{Condition, ConditionCatalogue};

    #[test]
    fn condition_res_carries_groups_with_defaults() {
        let catalogue = ConditionCatalogue::builtin().unwrap();
        let res = ConditionRes::from(catalogue.schema(Condition::RetinopathyOfPrematurity));
        assert_eq!(res.condition, "ROP");
        let zone = res.groups.iter().find(|g| g.key == "rop_zone").unwrap();
        assert_eq!(zone.default, "Zone II");
    }

    #[test]
    fn note_request_fills_missing_maps() {
        let req: GenerateNoteReq = serde_json::from_str(r#"{"condition":"Cataract"}"#).unwrap();
        assert!(req.fields.is_empty());
        assert!(req.toggles.is_empty());
        assert!(req.date.is_none());
    }
}
