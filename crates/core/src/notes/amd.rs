use super::{eye_label, NoteBody, NoteContext};

pub(super) fn build(ctx: &NoteContext<'_>) -> NoteBody {
    let eye = eye_label(ctx.toggle("eye"));
    let amd_type = ctx.toggle("amd_type");
    let stage = ctx.toggle("amd_stage");
    let antivegf = ctx.toggle("antivegf");
    let wet = amd_type == "Wet AMD";
    let dry = amd_type == "Dry AMD";

    let mut body = NoteBody::default();

    let findings = &mut body.findings;
    findings.push(format!("Eye(s): {eye}"));
    findings.push(format!("AMD Type: {amd_type}"));
    findings.push(format!("Stage: {stage}"));
    findings.push(format!(
        "Visual Acuity (LogMAR): {}",
        ctx.field_or_not_recorded("va")
    ));
    findings.push(format!("Current anti-VEGF: {antivegf}"));
    findings.block("OCT Findings", ctx.field("oct"));

    body.impression.push(format!("{stage} {amd_type} — {eye}."));

    let plan = &mut body.plan;
    plan.when(
        wet && antivegf == "None",
        "Initiate anti-VEGF therapy — urgent referral to medical retina",
    );
    plan.when(
        wet && antivegf != "None",
        format!("Continue {antivegf} treatment; monitor OCT at next visit"),
    );
    plan.when(
        dry && stage == "Intermediate",
        "Consider AREDS2 supplements; advise Amsler grid self-monitoring",
    );
    plan.when(
        dry && stage == "Early",
        "Annual review; low vision aids if symptomatic",
    );
    plan.when(
        amd_type == "Geographic atrophy",
        "Discuss emerging therapies; low vision support referral",
    );
    plan.push(
        "Patient counselled on monitoring for new symptoms (metamorphopsia, new central scotoma)",
    );

    body
}
