use super::{eye_label, numeric_suffix, NoteBody, NoteContext};

/// LOCS grade at which surgery is recommended.
const SURGICAL_GRADE: u32 = 3;
const FALLBACK_GRADE: u32 = 2;

pub(super) fn build(ctx: &NoteContext<'_>) -> NoteBody {
    let eye = eye_label(ctx.toggle("eye"));
    let kind = ctx.toggle("cat_type");
    let grade = ctx.toggle("cat_grade");
    let surgical = numeric_suffix(grade, "Grade ").unwrap_or(FALLBACK_GRADE) >= SURGICAL_GRADE;

    let mut body = NoteBody::default();

    let findings = &mut body.findings;
    findings.push(format!("Eye: {eye}"));
    findings.push(format!("Cataract type: {kind}"));
    findings.push(format!("Grade (LOCS): {grade}"));
    findings.push(format!(
        "VA Snellen: {}",
        ctx.field_or_not_recorded("va_snellen")
    ));
    findings.push(format!(
        "VA LogMAR: {}",
        ctx.field_or_not_recorded("va_logmar")
    ));
    findings.block("Symptoms reported", ctx.field("symptoms"));

    body.impression
        .push(format!("{kind} cataract, {grade} — {eye}."));

    let plan = &mut body.plan;
    plan.when(!surgical, "Conservative management; annual review");
    plan.when(surgical, "Surgical referral for phacoemulsification + IOL");
    plan.when(surgical, "Pre-operative biometry (IOL Master) requested");
    plan.when(
        surgical,
        "Patient counselled on surgical risks and visual outcomes",
    );
    plan.when(
        !surgical,
        "Consider referral if symptoms worsen or VA drops below 6/18",
    );

    body
}

#[cfg(test)]
mod tests {
    use crate::condition::Condition;
    use crate::notes::tests::{generator, header};
    use crate::notes::NoteFields;
    use crate::toggles::ToggleState;

    #[test]
    fn default_cataract_is_conservative() {
        let generator = generator();
        let note = generator
            .generate(
                Condition::Cataract,
                &NoteFields::new(),
                &ToggleState::unset(Condition::Cataract),
                &header(),
            )
            .unwrap();
        assert_eq!(note.findings[0], "Eye: right eye");
        assert!(note.findings.contains(&"VA Snellen: Not recorded".to_string()));
        assert!(note.findings.contains(&"VA LogMAR: Not recorded".to_string()));
        assert_eq!(
            note.impression,
            vec!["Nuclear cataract, Grade 2 — right eye.".to_string()]
        );
        assert_eq!(
            note.plan,
            vec![
                "Conservative management; annual review".to_string(),
                "Consider referral if symptoms worsen or VA drops below 6/18".to_string(),
            ]
        );
    }

    #[test]
    fn grade_three_is_surgical() {
        let generator = generator();
        let toggles = ToggleState::from_selections(
            generator.catalogue(),
            Condition::Cataract,
            [("cat_grade", "Grade 3"), ("eye", "L"), ("cat_type", "Mixed")],
        )
        .unwrap();
        let fields = NoteFields::new()
            .with("va_snellen", "6/24")
            .with("symptoms", "Glare when driving at night");
        let note = generator
            .generate(Condition::Cataract, &fields, &toggles, &header())
            .unwrap();

        assert_eq!(
            note.plan,
            vec![
                "Surgical referral for phacoemulsification + IOL".to_string(),
                "Pre-operative biometry (IOL Master) requested".to_string(),
                "Patient counselled on surgical risks and visual outcomes".to_string(),
            ]
        );
        assert!(note
            .render()
            .contains("VA LogMAR: Not recorded\n\nSymptoms reported:\nGlare when driving at night\n\nIMPRESSION"));
    }
}
