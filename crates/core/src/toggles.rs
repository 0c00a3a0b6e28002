//! Categorical selections for the active condition.

use crate::catalogue::ConditionCatalogue;
use crate::condition::Condition;
use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Group key → selected value, scoped to one condition.
///
/// Every stored value is drawn from its group's domain, and there is at most one value per group.
/// Changing condition discards all selections and starts again from the new condition's defaults.
/// The state is owned by the caller and handed to the note generator explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToggleState {
    condition: Condition,
    selections: BTreeMap<String, String>,
}

impl ToggleState {
    /// A state with every group set to its default.
    pub fn with_defaults(catalogue: &ConditionCatalogue, condition: Condition) -> Self {
        let selections = catalogue
            .group_schema(condition)
            .iter()
            .map(|g| (g.key().to_string(), g.default_value().to_string()))
            .collect();
        Self {
            condition,
            selections,
        }
    }

    /// A state with no selections; readers fall back to the catalogue defaults.
    pub fn unset(condition: Condition) -> Self {
        Self {
            condition,
            selections: BTreeMap::new(),
        }
    }

    /// Builds a state from defaults plus explicit `(group, value)` selections.
    ///
    /// # Errors
    ///
    /// Fails on the first selection that names an unknown group or an out-of-domain value.
    pub fn from_selections<K, V>(
        catalogue: &ConditionCatalogue,
        condition: Condition,
        selections: impl IntoIterator<Item = (K, V)>,
    ) -> CoreResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = Self::with_defaults(catalogue, condition);
        for (group, value) in selections {
            state.select(catalogue, group.as_ref(), value.as_ref())?;
        }
        Ok(state)
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// Sets the active value for a group, evicting any previous value.
    ///
    /// # Errors
    ///
    /// - `UnknownGroup` if the condition has no such group.
    /// - `InvalidGroupValue` if the value is outside the group's domain.
    ///
    /// The state is unchanged on error.
    pub fn select(
        &mut self,
        catalogue: &ConditionCatalogue,
        group: &str,
        value: &str,
    ) -> CoreResult<()> {
        let schema = catalogue
            .schema(self.condition)
            .group(group)
            .ok_or_else(|| CoreError::UnknownGroup {
                condition: self.condition,
                group: group.to_string(),
            })?;

        if !schema.allows(value) {
            return Err(CoreError::InvalidGroupValue {
                condition: self.condition,
                group: group.to_string(),
                value: value.to_string(),
            });
        }

        self.selections.insert(group.to_string(), value.to_string());
        Ok(())
    }

    /// Makes `condition` active, resetting every group to that condition's defaults.
    ///
    /// This happens even when `condition` is already active.
    pub fn switch_condition(&mut self, catalogue: &ConditionCatalogue, condition: Condition) {
        *self = Self::with_defaults(catalogue, condition);
    }

    /// The explicitly selected value for a group, if any.
    pub fn get(&self, group: &str) -> Option<&str> {
        self.selections.get(group).map(String::as_str)
    }

    /// The selected value for a group, or the catalogue default when unset.
    ///
    /// Returns `None` only when the condition has no such group.
    pub fn value_or_default<'a>(
        &'a self,
        catalogue: &'a ConditionCatalogue,
        group: &str,
    ) -> Option<&'a str> {
        self.get(group).or_else(|| {
            catalogue
                .schema(self.condition)
                .group(group)
                .map(|g| g.default_value())
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.selections
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> ConditionCatalogue {
        ConditionCatalogue::builtin().unwrap()
    }

    #[test]
    fn with_defaults_populates_every_group() {
        let catalogue = catalogue();
        let state = ToggleState::with_defaults(&catalogue, Condition::MacularDegeneration);
        assert_eq!(state.get("eye"), Some("BE"));
        assert_eq!(state.get("amd_type"), Some("Dry AMD"));
        assert_eq!(state.get("amd_stage"), Some("Early"));
        assert_eq!(state.get("antivegf"), Some("None"));
        assert_eq!(state.iter().count(), 4);
    }

    #[test]
    fn select_evicts_previous_value() {
        let catalogue = catalogue();
        let mut state = ToggleState::with_defaults(&catalogue, Condition::DiabeticRetinopathy);
        state.select(&catalogue, "dr_grade", "Mild NPDR").unwrap();
        state.select(&catalogue, "dr_grade", "PDR").unwrap();
        assert_eq!(state.get("dr_grade"), Some("PDR"));
        assert_eq!(state.iter().filter(|(k, _)| *k == "dr_grade").count(), 1);
    }

    #[test]
    fn select_rejects_out_of_domain_value_and_keeps_state() {
        let catalogue = catalogue();
        let mut state = ToggleState::with_defaults(&catalogue, Condition::Cataract);
        let before = state.clone();

        let err = state
            .select(&catalogue, "eye", "BE")
            .expect_err("cataract notes are single-eye");
        assert!(matches!(err, CoreError::InvalidGroupValue { ref group, .. } if group == "eye"));
        assert_eq!(state, before);
    }

    #[test]
    fn select_rejects_group_from_another_condition() {
        let catalogue = catalogue();
        let mut state = ToggleState::with_defaults(&catalogue, Condition::Glaucoma);
        let err = state
            .select(&catalogue, "rop_zone", "Zone I")
            .expect_err("rop_zone is not a glaucoma group");
        assert!(matches!(err, CoreError::UnknownGroup { condition: Condition::Glaucoma, .. }));
    }

    #[test]
    fn switch_condition_discards_previous_selections() {
        let catalogue = catalogue();
        let mut state = ToggleState::with_defaults(&catalogue, Condition::DiabeticRetinopathy);
        state.select(&catalogue, "eye", "L").unwrap();
        state.select(&catalogue, "dr_grade", "Severe NPDR").unwrap();

        state.switch_condition(&catalogue, Condition::Cataract);
        assert_eq!(state.condition(), Condition::Cataract);
        assert_eq!(state.get("eye"), Some("R"));
        assert_eq!(state.get("dr_grade"), None);

        state.switch_condition(&catalogue, Condition::DiabeticRetinopathy);
        assert_eq!(state.get("eye"), Some("BE"));
        assert_eq!(state.get("dr_grade"), Some("No DR"));
    }

    #[test]
    fn value_or_default_falls_back_for_unset_groups() {
        let catalogue = catalogue();
        let state = ToggleState::unset(Condition::RetinopathyOfPrematurity);
        assert_eq!(state.get("rop_zone"), None);
        assert_eq!(state.value_or_default(&catalogue, "rop_zone"), Some("Zone II"));
        assert_eq!(state.value_or_default(&catalogue, "cat_grade"), None);
    }

    #[test]
    fn from_selections_applies_in_order() {
        let catalogue = catalogue();
        let state = ToggleState::from_selections(
            &catalogue,
            Condition::Glaucoma,
            [("vf_status", "Mild loss"), ("eye", "R")],
        )
        .unwrap();
        assert_eq!(state.get("vf_status"), Some("Mild loss"));
        assert_eq!(state.get("eye"), Some("R"));
        assert_eq!(state.get("glaucoma_type"), Some("POAG"));
    }
}
