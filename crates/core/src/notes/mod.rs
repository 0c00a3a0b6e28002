//! Rule-based clinical note generation.
//!
//! A note is a pure function of four explicit inputs: the condition, the free-text fields, the
//! toggle state and the header. Each condition module turns those into ordered line lists for the
//! findings, impression and plan sections. A line producer either yields a line or yields
//! nothing; absent lines are skipped rather than left blank.
//!
//! Plan rules are independent. Several may fire for the same input and they are emitted in
//! declaration order, so a note can legitimately repeat an urgency (e.g. ROP stage 3 in Zone I
//! with plus disease).

mod amd;
mod cataract;
mod dr;
mod glaucoma;
mod rop;

use crate::catalogue::ConditionCatalogue;
use crate::condition::Condition;
use crate::config::ClinicianSettings;
use crate::constants::{NOTE_DATE_FORMAT, NOT_RECORDED, PLAN_BULLET, TITLE_RULE_CHAR};
use crate::error::{CoreError, CoreResult};
use crate::toggles::ToggleState;
use chrono::NaiveDate;
use optinote_types::NonEmptyText;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Free-text field values keyed by field name.
///
/// Values are trimmed on insertion and an empty value reads as absent. Keys outside the
/// condition's field schema are kept but never interpreted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NoteFields(BTreeMap<String, String>);

impl NoteFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl AsRef<str>) {
        self.0.insert(key.into(), value.as_ref().trim().to_string());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.insert(key, value);
        self
    }

    /// The trimmed value for `key`, or `None` if it is missing or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for NoteFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

/// Submission header: the date plus optional identifying lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NoteHeader {
    pub date: NaiveDate,
    pub patient_ref: Option<NonEmptyText>,
    pub clinician: Option<NonEmptyText>,
    pub department: Option<NonEmptyText>,
}

impl NoteHeader {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            patient_ref: None,
            clinician: None,
            department: None,
        }
    }

    /// Header for a note: patient reference from the form, names from the settings store.
    pub fn compose(date: NaiveDate, patient_ref: Option<&str>, settings: &ClinicianSettings) -> Self {
        Self {
            date,
            patient_ref: NonEmptyText::optional(patient_ref),
            clinician: settings.clinician_name.clone(),
            department: settings.department.clone(),
        }
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Date: {}", self.date.format(NOTE_DATE_FORMAT))];
        if let Some(patient_ref) = &self.patient_ref {
            lines.push(format!("Patient ref: {patient_ref}"));
        }
        if let Some(clinician) = &self.clinician {
            lines.push(format!("Clinician: {clinician}"));
        }
        if let Some(department) = &self.department {
            lines.push(format!("Department: {department}"));
        }
        lines
    }
}

/// A generated note, kept as sections so adapters can render or inspect them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClinicalNote {
    pub condition: Condition,
    pub title: String,
    pub rule_width: usize,
    pub header: Vec<String>,
    /// ROP only; empty when no infant details were supplied.
    pub infant_details: Vec<String>,
    pub findings: Vec<String>,
    pub impression: Vec<String>,
    /// Recommendations in rule declaration order, without bullets.
    pub plan: Vec<String>,
}

impl ClinicalNote {
    pub fn render(&self) -> String {
        let rule: String = std::iter::repeat(TITLE_RULE_CHAR)
            .take(self.rule_width)
            .collect();

        let mut blocks = vec![format!(
            "{}\n{}\n{}",
            self.title,
            rule,
            self.header.join("\n")
        )];
        if !self.infant_details.is_empty() {
            blocks.push(section("INFANT DETAILS", &self.infant_details));
        }
        blocks.push(section("FINDINGS", &self.findings));
        blocks.push(section("IMPRESSION", &self.impression));

        let plan: Vec<String> = self
            .plan
            .iter()
            .map(|line| format!("{PLAN_BULLET}{line}"))
            .collect();
        blocks.push(section("PLAN", &plan));

        blocks.join("\n\n")
    }
}

impl std::fmt::Display for ClinicalNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn section(heading: &str, lines: &[String]) -> String {
    let mut out = heading.to_string();
    for line in lines {
        out.push('\n');
        out.push_str(line);
    }
    out
}

/// Generates notes against a loaded condition catalogue.
#[derive(Clone, Debug)]
pub struct NoteGenerator {
    catalogue: Arc<ConditionCatalogue>,
}

impl NoteGenerator {
    pub fn new(catalogue: Arc<ConditionCatalogue>) -> Self {
        Self { catalogue }
    }

    pub fn catalogue(&self) -> &ConditionCatalogue {
        &self.catalogue
    }

    /// Generates the note for `condition`.
    ///
    /// Groups missing from `toggles` take their catalogue default. Free-text values are echoed
    /// verbatim; they are never checked for clinical plausibility.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ToggleScopeMismatch` if `toggles` belongs to a different condition.
    pub fn generate(
        &self,
        condition: Condition,
        fields: &NoteFields,
        toggles: &ToggleState,
        header: &NoteHeader,
    ) -> CoreResult<ClinicalNote> {
        if toggles.condition() != condition {
            return Err(CoreError::ToggleScopeMismatch {
                expected: condition,
                found: toggles.condition(),
            });
        }

        let ctx = NoteContext {
            catalogue: &self.catalogue,
            toggles,
            fields,
        };
        let body = match condition {
            Condition::DiabeticRetinopathy => dr::build(&ctx),
            Condition::MacularDegeneration => amd::build(&ctx),
            Condition::Glaucoma => glaucoma::build(&ctx),
            Condition::RetinopathyOfPrematurity => rop::build(&ctx),
            Condition::Cataract => cataract::build(&ctx),
        };

        tracing::debug!(
            %condition,
            plan_lines = body.plan.len(),
            "generated clinical note"
        );

        let schema = self.catalogue.schema(condition);
        Ok(ClinicalNote {
            condition,
            title: schema.title().to_string(),
            rule_width: schema.rule_width(),
            header: header.lines(),
            infant_details: body.infant_details.into_vec(),
            findings: body.findings.into_vec(),
            impression: body.impression.into_vec(),
            plan: body.plan.into_vec(),
        })
    }
}

/// Read-only view of the generation inputs handed to each condition module.
pub(crate) struct NoteContext<'a> {
    catalogue: &'a ConditionCatalogue,
    toggles: &'a ToggleState,
    fields: &'a NoteFields,
}

impl<'a> NoteContext<'a> {
    /// Selected value or catalogue default. Rule groups are guaranteed by catalogue validation.
    pub(crate) fn toggle(&self, group: &str) -> &'a str {
        self.toggles
            .value_or_default(self.catalogue, group)
            .unwrap_or_default()
    }

    pub(crate) fn field(&self, key: &str) -> Option<&'a str> {
        self.fields.get(key)
    }

    /// Field value, or "Not recorded" when blank.
    pub(crate) fn field_or_not_recorded(&self, key: &str) -> &'a str {
        self.field(key).unwrap_or(NOT_RECORDED)
    }
}

#[derive(Default)]
pub(crate) struct NoteBody {
    pub(crate) infant_details: Lines,
    pub(crate) findings: Lines,
    pub(crate) impression: Lines,
    pub(crate) plan: Lines,
}

/// Ordered section lines built from optional producers.
#[derive(Default)]
pub(crate) struct Lines(Vec<String>);

impl Lines {
    pub(crate) fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    pub(crate) fn push_opt(&mut self, line: Option<String>) {
        if let Some(line) = line {
            self.0.push(line);
        }
    }

    pub(crate) fn when(&mut self, condition: bool, line: impl Into<String>) {
        if condition {
            self.push(line);
        }
    }

    /// A labelled free-text block set off by a blank line; skipped when the value is absent.
    pub(crate) fn block(&mut self, label: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.0.push(String::new());
            self.0.push(format!("{label}:"));
            self.0.push(value.to_string());
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Human label for an eye code. Anything other than `BE`/`R` reads as the left eye.
pub(crate) fn eye_label(code: &str) -> &'static str {
    match code {
        "BE" => "both eyes",
        "R" => "right eye",
        _ => "left eye",
    }
}

/// Leading integer after the first occurrence of `prefix`, e.g. `"Stage 3"` → `Some(3)`.
pub(crate) fn numeric_suffix(value: &str, prefix: &str) -> Option<u32> {
    let rest = value.replacen(prefix, "", 1);
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn generator() -> NoteGenerator {
        NoteGenerator::new(Arc::new(ConditionCatalogue::builtin().unwrap()))
    }

    pub(crate) fn header() -> NoteHeader {
        NoteHeader::new(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap())
    }

    #[test]
    fn every_condition_generates_deterministically_from_defaults() {
        let generator = generator();
        for condition in Condition::ALL {
            let toggles = ToggleState::unset(condition);
            let fields = NoteFields::new();
            let first = generator
                .generate(condition, &fields, &toggles, &header())
                .unwrap()
                .render();
            let second = generator
                .generate(condition, &fields, &toggles, &header())
                .unwrap()
                .render();
            assert_eq!(first, second);

            let defaults = ToggleState::with_defaults(generator.catalogue(), condition);
            let explicit = generator
                .generate(condition, &fields, &defaults, &header())
                .unwrap()
                .render();
            assert_eq!(first, explicit, "{condition} defaults differ from unset state");
        }
    }

    #[test]
    fn mismatched_toggle_scope_is_rejected() {
        let generator = generator();
        let toggles = ToggleState::unset(Condition::Glaucoma);
        let err = generator
            .generate(Condition::Cataract, &NoteFields::new(), &toggles, &header())
            .expect_err("glaucoma toggles cannot drive a cataract note");
        assert!(matches!(
            err,
            CoreError::ToggleScopeMismatch {
                expected: Condition::Cataract,
                found: Condition::Glaucoma
            }
        ));
    }

    #[test]
    fn render_lays_out_header_and_sections() {
        let generator = generator();
        let settings = ClinicianSettings::from_values(
            Some("Dr R. Mensah".into()),
            Some("Ophthalmology".into()),
            None,
        );
        let header = NoteHeader::compose(
            NaiveDate::from_ymd_opt(2026, 3, 7).unwrap(),
            Some("MRN-4471"),
            &settings,
        );
        let note = generator
            .generate(
                Condition::DiabeticRetinopathy,
                &NoteFields::new(),
                &ToggleState::unset(Condition::DiabeticRetinopathy),
                &header,
            )
            .unwrap();

        let rule = "─".repeat(42);
        let expected = [
            "DIABETIC RETINOPATHY — CLINICAL NOTE",
            rule.as_str(),
            "Date: 07 Mar 2026",
            "Patient ref: MRN-4471",
            "Clinician: Dr R. Mensah",
            "Department: Ophthalmology",
            "",
            "FINDINGS",
            "Eye(s): both eyes",
            "DR Grade: No DR",
            "Maculopathy: No DMO",
            "",
            "IMPRESSION",
            "No diabetic retinopathy detected.",
            "",
            "PLAN",
            "• Annual routine diabetic eye screening",
        ]
        .join("\n");
        assert_eq!(note.render(), expected);
        assert_eq!(note.to_string(), expected);
    }

    #[test]
    fn header_omits_unset_optional_lines() {
        let header = NoteHeader::compose(
            NaiveDate::from_ymd_opt(2026, 11, 30).unwrap(),
            Some("  "),
            &ClinicianSettings::default(),
        );
        assert_eq!(header.lines(), vec!["Date: 30 Nov 2026".to_string()]);
    }

    #[test]
    fn note_fields_trim_and_treat_blank_as_absent() {
        let fields = NoteFields::new().with("va", "  0.2 ").with("hba1c", "   ");
        assert_eq!(fields.get("va"), Some("0.2"));
        assert_eq!(fields.get("hba1c"), None);
        assert_eq!(fields.get("notes"), None);
    }

    #[test]
    fn numeric_suffix_reads_leading_digits() {
        assert_eq!(numeric_suffix("Stage 3", "Stage "), Some(3));
        assert_eq!(numeric_suffix("Grade 4+", "Grade "), Some(4));
        assert_eq!(numeric_suffix("Stage", "Stage "), None);
        assert_eq!(numeric_suffix("Aggressive", "Stage "), None);
    }

    #[test]
    fn lines_skip_absent_producers() {
        let mut lines = Lines::default();
        lines.push("Eye(s): both eyes");
        lines.push_opt(None);
        lines.when(false, "never");
        lines.block("Observations", None);
        assert_eq!(lines.len(), 1);
        lines.block("Observations", Some("Drusen"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn eye_label_maps_codes() {
        assert_eq!(eye_label("BE"), "both eyes");
        assert_eq!(eye_label("R"), "right eye");
        assert_eq!(eye_label("L"), "left eye");
    }
}
