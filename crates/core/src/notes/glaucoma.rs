use super::{eye_label, NoteBody, NoteContext};
use crate::constants::MISSING_READING;

/// `R <r> / L <l>` when at least one side is recorded.
fn paired_reading(ctx: &NoteContext<'_>, right: &str, left: &str) -> Option<String> {
    let (r, l) = (ctx.field(right), ctx.field(left));
    if r.is_none() && l.is_none() {
        return None;
    }
    Some(format!(
        "R {} / L {}",
        r.unwrap_or(MISSING_READING),
        l.unwrap_or(MISSING_READING)
    ))
}

pub(super) fn build(ctx: &NoteContext<'_>) -> NoteBody {
    let eye = eye_label(ctx.toggle("eye"));
    let kind = ctx.toggle("glaucoma_type");
    let vf = ctx.toggle("vf_status");
    let advanced_loss = vf == "Moderate loss" || vf == "Severe loss";

    let mut body = NoteBody::default();

    let findings = &mut body.findings;
    findings.push(format!("Eye(s): {eye}"));
    findings.push(format!("Diagnosis: {kind}"));
    findings.push_opt(paired_reading(ctx, "iop_r", "iop_l").map(|r| format!("IOP: {r} mmHg")));
    findings.push_opt(paired_reading(ctx, "cdr_r", "cdr_l").map(|r| format!("CDR: {r}")));
    findings.push(format!("Visual Field: {vf}"));
    findings.push_opt(
        ctx.field("drops")
            .map(|d| format!("Current topical therapy: {d}")),
    );

    body.impression.push(format!("{kind} — {eye}. VF: {vf}."));

    let review_months = match vf {
        "Normal" => 12,
        "Mild loss" => 6,
        _ => 3,
    };

    let plan = &mut body.plan;
    plan.when(
        vf == "Normal" && kind == "OHT",
        "Observe; repeat VF and IOP in 12 months",
    );
    plan.when(
        kind == "POAG" && vf == "Mild loss",
        "Continue current drops; repeat HRT/OCT in 6 months",
    );
    plan.when(
        kind == "POAG" && advanced_loss,
        "Review treatment escalation; consider surgery referral",
    );
    plan.when(
        kind == "PACG",
        "Consider laser peripheral iridotomy; review angle anatomy",
    );
    plan.push(format!("Next appointment in {review_months} months"));

    body
}

#[cfg(test)]
mod tests {
    use crate::condition::Condition;
    use crate::notes::tests::{generator, header};
    use crate::notes::NoteFields;
    use crate::toggles::ToggleState;

    #[test]
    fn one_sided_iop_uses_placeholder() {
        let generator = generator();
        let fields = NoteFields::new()
            .with("iop_r", "24")
            .with("cdr_l", "0.7")
            .with("drops", "Latanoprost nocte");
        let note = generator
            .generate(
                Condition::Glaucoma,
                &fields,
                &ToggleState::unset(Condition::Glaucoma),
                &header(),
            )
            .unwrap();
        assert_eq!(
            note.findings,
            vec![
                "Eye(s): both eyes",
                "Diagnosis: POAG",
                "IOP: R 24 / L — mmHg",
                "CDR: R — / L 0.7",
                "Visual Field: Normal",
                "Current topical therapy: Latanoprost nocte",
            ]
        );
    }

    #[test]
    fn no_pressures_means_no_iop_line() {
        let generator = generator();
        let note = generator
            .generate(
                Condition::Glaucoma,
                &NoteFields::new(),
                &ToggleState::unset(Condition::Glaucoma),
                &header(),
            )
            .unwrap();
        assert!(!note.findings.iter().any(|l| l.starts_with("IOP")));
        assert!(!note.findings.iter().any(|l| l.starts_with("CDR")));
        assert_eq!(note.plan, vec!["Next appointment in 12 months".to_string()]);
    }

    #[test]
    fn severe_poag_escalates_with_three_month_review() {
        let generator = generator();
        let toggles = ToggleState::from_selections(
            generator.catalogue(),
            Condition::Glaucoma,
            [("vf_status", "Severe loss"), ("eye", "L")],
        )
        .unwrap();
        let note = generator
            .generate(Condition::Glaucoma, &NoteFields::new(), &toggles, &header())
            .unwrap();
        assert_eq!(
            note.impression,
            vec!["POAG — left eye. VF: Severe loss.".to_string()]
        );
        assert_eq!(
            note.plan,
            vec![
                "Review treatment escalation; consider surgery referral".to_string(),
                "Next appointment in 3 months".to_string(),
            ]
        );
    }

    #[test]
    fn normal_oht_is_observed() {
        let generator = generator();
        let toggles = ToggleState::from_selections(
            generator.catalogue(),
            Condition::Glaucoma,
            [("glaucoma_type", "OHT")],
        )
        .unwrap();
        let note = generator
            .generate(Condition::Glaucoma, &NoteFields::new(), &toggles, &header())
            .unwrap();
        assert_eq!(note.plan[0], "Observe; repeat VF and IOP in 12 months");
    }

    fn glaucoma_plan(selections: &[(&str, &str)]) -> Vec<String> {
        let generator = generator();
        let toggles = ToggleState::from_selections(
            generator.catalogue(),
            Condition::Glaucoma,
            selections.iter().copied(),
        )
        .unwrap();
        generator
            .generate(Condition::Glaucoma, &NoteFields::new(), &toggles, &header())
            .unwrap()
            .plan
    }

    #[test]
    fn mild_poag_continues_drops_with_six_month_review() {
        assert_eq!(
            glaucoma_plan(&[("vf_status", "Mild loss")]),
            vec![
                "Continue current drops; repeat HRT/OCT in 6 months".to_string(),
                "Next appointment in 6 months".to_string(),
            ]
        );
    }

    #[test]
    fn pacg_considers_laser_iridotomy() {
        assert_eq!(
            glaucoma_plan(&[("glaucoma_type", "PACG"), ("vf_status", "Moderate loss")]),
            vec![
                "Consider laser peripheral iridotomy; review angle anatomy".to_string(),
                "Next appointment in 3 months".to_string(),
            ]
        );
    }
}
