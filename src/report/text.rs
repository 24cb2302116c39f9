use crate::report::{ContrastRow, ReportContext, format_f64_6};

pub fn render_report_text(ctx: &ReportContext) -> String {
    let mut out = String::new();

    out.push_str("Change-from-Baseline Subgroup Contrast Report\n");
    out.push_str("=============================================\n\n");

    out.push_str("1. Analysis set\n");
    out.push_str(&format!(
        "Rows read: {} (analysis set: {})\n",
        ctx.counts.rows_read, ctx.counts.rows_in_analysis_set
    ));
    out.push_str(&format!(
        "Baseline records: {}, post-baseline records: {}\n",
        ctx.counts.baseline_records, ctx.counts.post_baseline_records
    ));
    if ctx.counts.subjects_dropped > 0 {
        out.push_str(&format!(
            "Subjects dropped for missing baseline: {}\n",
            ctx.counts.subjects_dropped
        ));
    }
    out.push_str(&format!(
        "Subjects modeled: {}\n\n",
        ctx.counts.subjects_modeled
    ));

    out.push_str("2. Change from baseline\n");
    if let Some(v) = ctx.median_percent_change_active {
        out.push_str(&format!(
            "Median percent change, {}: {}\n",
            ctx.active_arm,
            format_f64_6(v)
        ));
    }
    if let Some(v) = ctx.median_percent_change_placebo {
        out.push_str(&format!(
            "Median percent change, {}: {}\n",
            ctx.placebo_arm,
            format_f64_6(v)
        ));
    }
    out.push('\n');

    out.push_str("3. Mixed model fit\n");
    out.push_str(&format!(
        "Residual SD: {}\n",
        format_f64_6(ctx.variance.residual_sd)
    ));
    out.push_str(&format!(
        "Subject intercept SD: {}\n",
        format_f64_6(ctx.variance.intercept_sd)
    ));
    if let Some(sd) = ctx.variance.slope_sd {
        out.push_str(&format!("Subject visit-slope SD: {}\n", format_f64_6(sd)));
    }
    if let Some(corr) = ctx.variance.intercept_slope_corr {
        out.push_str(&format!(
            "Intercept/slope correlation: {}\n",
            format_f64_6(corr)
        ));
    }
    out.push_str(&format!("Optimizer iterations: {}\n\n", ctx.iterations));

    out.push_str(&format!(
        "4. Treatment contrasts ({} vs {})\n",
        ctx.active_arm, ctx.placebo_arm
    ));
    for row in &ctx.contrasts {
        out.push_str(&contrast_statement(row));
        out.push('\n');
    }
    out.push('\n');

    out.push_str("5. Conventions\n");
    if ctx.benefit_positive {
        out.push_str(&format!(
            "Contrast sign: positive values mean greater weight reduction under {} \
             (the active-minus-placebo difference is stored negated).\n",
            ctx.active_arm
        ));
    } else {
        out.push_str("Contrast sign: raw active-minus-placebo differences.\n");
    }
    out.push_str(&format!(
        "Confidence bounds: estimate +/- {} x SE.\n",
        ctx.ci_multiplier
    ));
    out.push_str(
        "Percent change divides by the current measured value, as in the source analysis.\n",
    );

    out
}

fn contrast_statement(row: &ContrastRow) -> String {
    match (row.estimate, row.se, row.lower, row.upper) {
        (Some(estimate), Some(se), Some(lower), Some(upper)) => format!(
            "{}, biomarker {}: {} (SE {}, CI {} to {})",
            row.visit,
            row.subgroup,
            format_f64_6(estimate),
            format_f64_6(se),
            format_f64_6(lower),
            format_f64_6(upper)
        ),
        _ => format!(
            "{}, biomarker {}: not estimable (no supporting data)",
            row.visit, row.subgroup
        ),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/text.rs"]
mod tests;
