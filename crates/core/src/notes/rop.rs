use super::{eye_label, numeric_suffix, NoteBody, NoteContext};

pub(super) fn build(ctx: &NoteContext<'_>) -> NoteBody {
    let eye = eye_label(ctx.toggle("eye"));
    let stage = ctx.toggle("rop_stage");
    let zone = ctx.toggle("rop_zone");
    let plus = ctx.toggle("plus");
    let stage_num = numeric_suffix(stage, "Stage ").unwrap_or(0);
    let plus_disease = plus == "Plus disease";
    let needs_treatment = stage_num >= 3 || plus_disease;

    let mut body = NoteBody::default();

    body.infant_details.push_opt(
        ctx.field("gest_age")
            .map(|v| format!("Gestational age at birth: {v}")),
    );
    body.infant_details
        .push_opt(ctx.field("pma").map(|v| format!("PMA at examination: {v}")));

    let findings = &mut body.findings;
    findings.push(format!("Eye(s): {eye}"));
    findings.push(format!("ROP Stage: {stage}"));
    findings.push(format!("Zone: {zone}"));
    findings.push(format!("Plus disease: {plus}"));

    let plus_clause = if plus == "No plus disease" {
        String::new()
    } else {
        format!(", with {}", plus.to_lowercase())
    };
    body.impression
        .push(format!("ROP {stage}, {zone}{plus_clause} — {eye}."));

    let plan = &mut body.plan;
    plan.when(
        !needs_treatment,
        "No treatment required at present; continue weekly screening",
    );
    plan.when(
        stage_num == 3 && zone == "Zone I",
        "TYPE 1 ROP — treat within 48–72 hours (laser/anti-VEGF)",
    );
    plan.when(
        stage_num == 3 && zone == "Zone II",
        "Review in 3 days; treat if plus disease develops",
    );
    plan.when(
        stage_num >= 4,
        "URGENT surgical referral — consider vitreoretinal surgery",
    );
    plan.when(
        plus_disease,
        "Treat within 48–72 hours — plus disease threshold reached",
    );
    plan.push("Parents counselled on diagnosis and follow-up importance");

    body
}
