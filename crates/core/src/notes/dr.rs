use super::{eye_label, NoteBody, NoteContext};

pub(super) fn build(ctx: &NoteContext<'_>) -> NoteBody {
    let eye = eye_label(ctx.toggle("eye"));
    let grade = ctx.toggle("dr_grade");
    let maculo = ctx.toggle("maculopathy");

    let mut body = NoteBody::default();

    let findings = &mut body.findings;
    findings.push(format!("Eye(s): {eye}"));
    findings.push(format!("DR Grade: {grade}"));
    findings.push(format!("Maculopathy: {maculo}"));
    findings.push_opt(ctx.field("va").map(|va| format!("Visual Acuity (LogMAR): {va}")));
    findings.push_opt(ctx.field("hba1c").map(|v| format!("HbA1c: {v}")));
    findings.block("Observations", ctx.field("notes"));

    if grade == "No DR" {
        body.impression.push("No diabetic retinopathy detected.");
    } else {
        body.impression.push(format!("{grade} identified in {eye}."));
    }
    body.impression.when(
        maculo != "No DMO",
        format!("{maculo} present — consider referral to medical retina."),
    );

    let plan = &mut body.plan;
    plan.when(grade == "No DR", "Annual routine diabetic eye screening");
    plan.when(
        grade == "Mild NPDR",
        "Annual review; optimise glycaemic and blood pressure control",
    );
    plan.when(
        grade == "Moderate NPDR",
        "6-monthly review; refer to ophthalmology if progressing",
    );
    plan.when(
        grade == "Severe NPDR",
        "Urgent ophthalmology referral within 4 weeks",
    );
    plan.when(
        grade == "PDR",
        "Urgent ophthalmology referral within 1 week; laser/anti-VEGF to be discussed",
    );
    plan.when(maculo == "CSMO", "Refer for intravitreal anti-VEGF treatment");

    body
}
