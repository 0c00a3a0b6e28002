//! Condition catalogue: per-condition field schema and categorical toggle groups.
//!
//! The catalogue is an embedded YAML document parsed once at startup. Parsing goes through a
//! strict wire model (unknown keys are rejected) and `serde_path_to_error`, so a schema mismatch
//! names the offending path. The parsed document is then checked for structural invariants:
//! every condition appears exactly once, every default is drawn from its group's domain, and no
//! key or domain value is duplicated.

use crate::condition::Condition;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const BUILTIN_CATALOGUE_YAML: &str = include_str!("../catalogue/conditions.yaml");

/// A categorical group: the legal values a toggle may take and the one selected by default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupSchema {
    key: String,
    domain: Vec<String>,
    default: String,
}

impl GroupSchema {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Legal values in display order.
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    pub fn allows(&self, value: &str) -> bool {
        self.domain.iter().any(|v| v == value)
    }
}

/// Everything the note generator and form layer need to know about one condition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConditionSchema {
    condition: Condition,
    title: String,
    rule_width: usize,
    fields: Vec<String>,
    groups: Vec<GroupSchema>,
}

impl ConditionSchema {
    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// Note heading, e.g. `GLAUCOMA — CLINICAL NOTE`.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of rule characters drawn beneath the title.
    pub fn rule_width(&self) -> usize {
        self.rule_width
    }

    /// Free-text field keys in form order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Categorical groups in form order.
    pub fn groups(&self) -> &[GroupSchema] {
        &self.groups
    }

    pub fn group(&self, key: &str) -> Option<&GroupSchema> {
        self.groups.iter().find(|g| g.key == key)
    }
}

/// The static per-condition schema, read-only once loaded.
#[derive(Clone, Debug)]
pub struct ConditionCatalogue {
    // One entry per condition, in `Condition::ALL` order.
    schemas: Vec<ConditionSchema>,
}

impl ConditionCatalogue {
    /// Loads the catalogue compiled into the crate.
    pub fn builtin() -> CoreResult<Self> {
        Self::from_yaml(BUILTIN_CATALOGUE_YAML)
    }

    /// Parses and validates a catalogue document.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConditionSchema` if the YAML does not match the wire schema or if it
    /// breaks any structural invariant (missing/duplicate condition, default outside domain,
    /// duplicate keys or domain values).
    pub fn from_yaml(yaml_text: &str) -> CoreResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire: CatalogueWire = serde_path_to_error::deserialize(deserializer).map_err(|err| {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            CoreError::ConditionSchema(format!(
                "schema mismatch at {path}: {}",
                err.into_inner()
            ))
        })?;

        let mut slots: Vec<Option<ConditionSchema>> = vec![None; Condition::ALL.len()];
        for entry in wire.conditions {
            let condition = Condition::parse(&entry.id).map_err(|_| {
                CoreError::ConditionSchema(format!("unknown condition id '{}'", entry.id))
            })?;
            let slot = &mut slots[index_of(condition)];
            if slot.is_some() {
                return Err(CoreError::ConditionSchema(format!(
                    "condition {condition} is defined more than once"
                )));
            }
            *slot = Some(entry.into_schema(condition)?);
        }

        let schemas = slots
            .into_iter()
            .zip(Condition::ALL)
            .map(|(slot, condition)| {
                slot.ok_or_else(|| {
                    CoreError::ConditionSchema(format!("condition {condition} is not defined"))
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self { schemas })
    }

    pub fn schema(&self, condition: Condition) -> &ConditionSchema {
        &self.schemas[index_of(condition)]
    }

    pub fn schemas(&self) -> impl Iterator<Item = &ConditionSchema> {
        self.schemas.iter()
    }

    /// Ordered free-text field keys for a condition.
    pub fn field_schema(&self, condition: Condition) -> &[String] {
        self.schema(condition).fields()
    }

    /// Categorical groups (domain and default) for a condition.
    pub fn group_schema(&self, condition: Condition) -> &[GroupSchema] {
        self.schema(condition).groups()
    }

    /// Like [`Self::field_schema`], but from a raw tag.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownCondition` if `tag` is not a supported condition.
    pub fn field_schema_for(&self, tag: &str) -> CoreResult<&[String]> {
        Ok(self.field_schema(Condition::parse(tag)?))
    }

    /// Like [`Self::group_schema`], but from a raw tag.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownCondition` if `tag` is not a supported condition.
    pub fn group_schema_for(&self, tag: &str) -> CoreResult<&[GroupSchema]> {
        Ok(self.group_schema(Condition::parse(tag)?))
    }
}

fn index_of(condition: Condition) -> usize {
    match condition {
        Condition::DiabeticRetinopathy => 0,
        Condition::MacularDegeneration => 1,
        Condition::Glaucoma => 2,
        Condition::RetinopathyOfPrematurity => 3,
        Condition::Cataract => 4,
    }
}

/// Groups the note rules read for each condition; a catalogue without them is rejected.
fn required_groups(condition: Condition) -> &'static [&'static str] {
    match condition {
        Condition::DiabeticRetinopathy => &["eye", "dr_grade", "maculopathy"],
        Condition::MacularDegeneration => &["eye", "amd_type", "amd_stage", "antivegf"],
        Condition::Glaucoma => &["eye", "glaucoma_type", "vf_status"],
        Condition::RetinopathyOfPrematurity => &["eye", "rop_stage", "rop_zone", "plus"],
        Condition::Cataract => &["eye", "cat_type", "cat_grade"],
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogueWire {
    conditions: Vec<ConditionWire>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConditionWire {
    id: String,
    title: String,
    rule_width: usize,
    fields: Vec<String>,
    groups: Vec<GroupWire>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupWire {
    key: String,
    domain: Vec<String>,
    default: String,
}

impl ConditionWire {
    fn into_schema(self, condition: Condition) -> CoreResult<ConditionSchema> {
        let invalid = |msg: String| CoreError::ConditionSchema(format!("{condition}: {msg}"));

        if self.title.trim().is_empty() {
            return Err(invalid("title cannot be empty".into()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.as_str()) {
                return Err(invalid(format!("duplicate field '{field}'")));
            }
        }

        let mut group_keys = HashSet::new();
        let mut groups = Vec::with_capacity(self.groups.len());
        for group in self.groups {
            if !group_keys.insert(group.key.clone()) {
                return Err(invalid(format!("duplicate group '{}'", group.key)));
            }
            if group.domain.is_empty() {
                return Err(invalid(format!("group '{}' has an empty domain", group.key)));
            }
            let mut values = HashSet::new();
            for value in &group.domain {
                if !values.insert(value.as_str()) {
                    return Err(invalid(format!(
                        "group '{}' lists '{value}' more than once",
                        group.key
                    )));
                }
            }
            if !values.contains(group.default.as_str()) {
                return Err(invalid(format!(
                    "default '{}' of group '{}' is not in its domain",
                    group.default, group.key
                )));
            }
            groups.push(GroupSchema {
                key: group.key,
                domain: group.domain,
                default: group.default,
            });
        }

        for required in required_groups(condition) {
            if !group_keys.contains(*required) {
                return Err(invalid(format!("missing '{required}' group")));
            }
        }

        Ok(ConditionSchema {
            condition,
            title: self.title,
            rule_width: self.rule_width,
            fields: self.fields,
            groups,
        })
    }
}
