use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::model::design::Design;
use crate::model::emmeans::{ContrastValue, EstimatedMean, TreatmentContrast};
use crate::model::lmm::FittedModel;
use crate::pipeline::stage3_change::DerivedObservation;
use crate::report::json::render_summary_json;
use crate::report::text::render_report_text;
use crate::report::{
    CoefficientRow, ConfigEcho, ContrastRow, EmmeanRow, FitSummary, ReportContext, StageCounts,
    SummaryData, VarianceSummary, format_f64_6, median,
};

#[derive(Debug, Error)]
pub enum Stage6Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct Stage6Input<'a> {
    pub configuration: ConfigEcho,
    pub counts: StageCounts,
    pub derived: &'a [DerivedObservation],
    pub design: &'a Design,
    pub fit: &'a FittedModel,
    pub emmeans: &'a [EstimatedMean],
    pub contrasts: &'a [TreatmentContrast],
}

pub fn write_reports(input: &Stage6Input<'_>, out_dir: &Path) -> Result<(), Stage6Error> {
    fs::create_dir_all(out_dir)?;

    let contrast_rows = contrast_rows(input.contrasts);
    let emmean_rows = emmean_rows(input.emmeans);

    write_contrasts_tsv(&contrast_rows, &out_dir.join("contrasts.tsv"))?;
    write_emmeans_tsv(&emmean_rows, &out_dir.join("emmeans.tsv"))?;

    let summary = build_summary(input, emmean_rows, contrast_rows.clone());
    let json = render_summary_json(&summary)?;
    write_text(&out_dir.join("summary.json"), &json)?;

    let report_ctx = build_report_context(input, contrast_rows);
    let report = render_report_text(&report_ctx);
    write_text(&out_dir.join("report.txt"), &report)?;

    tracing::info!(out_dir = %out_dir.display(), "reports written");
    Ok(())
}

fn contrast_rows(contrasts: &[TreatmentContrast]) -> Vec<ContrastRow> {
    contrasts
        .iter()
        .map(|c| match c.value {
            ContrastValue::Estimable {
                estimate,
                se,
                lower,
                upper,
            } => ContrastRow {
                visit: c.visit.clone(),
                subgroup: c.subgroup.label().to_string(),
                estimable: true,
                estimate: Some(estimate),
                se: Some(se),
                lower: Some(lower),
                upper: Some(upper),
            },
            ContrastValue::NotEstimable => ContrastRow {
                visit: c.visit.clone(),
                subgroup: c.subgroup.label().to_string(),
                estimable: false,
                estimate: None,
                se: None,
                lower: None,
                upper: None,
            },
        })
        .collect()
}

fn emmean_rows(emmeans: &[EstimatedMean]) -> Vec<EmmeanRow> {
    emmeans
        .iter()
        .map(|e| EmmeanRow {
            visit: e.visit.clone(),
            treatment: e.treatment.clone(),
            subgroup: e.subgroup.label().to_string(),
            estimate: e.estimate,
            se: e.se,
        })
        .collect()
}

fn write_contrasts_tsv(rows: &[ContrastRow], path: &Path) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "visit\tsubgroup\testimate\tse\tlower\tupper")?;
    for row in rows {
        let fields = match (row.estimate, row.se, row.lower, row.upper) {
            (Some(estimate), Some(se), Some(lower), Some(upper)) => [
                format_f64_6(estimate),
                format_f64_6(se),
                format_f64_6(lower),
                format_f64_6(upper),
            ],
            _ => std::array::from_fn(|_| "NE".to_string()),
        };
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.visit, row.subgroup, fields[0], fields[1], fields[2], fields[3]
        )?;
    }
    Ok(())
}

fn write_emmeans_tsv(rows: &[EmmeanRow], path: &Path) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "visit\ttreatment\tsubgroup\testimate\tse")?;
    for row in rows {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            row.visit,
            row.treatment,
            row.subgroup,
            format_f64_6(row.estimate),
            format_f64_6(row.se)
        )?;
    }
    Ok(())
}

fn build_summary(
    input: &Stage6Input<'_>,
    emmeans: Vec<EmmeanRow>,
    contrasts: Vec<ContrastRow>,
) -> SummaryData {
    let coefficients = input
        .design
        .column_names
        .iter()
        .enumerate()
        .map(|(i, name)| CoefficientRow {
            name: name.clone(),
            estimate: input.fit.beta[i],
            se: input.fit.beta_cov[[i, i]].max(0.0).sqrt(),
        })
        .collect();

    SummaryData {
        tool: "trial-contrast".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        configuration: input.configuration.clone(),
        counts: input.counts,
        fit: FitSummary {
            n_observations: input.fit.n_observations,
            n_subjects: input.fit.n_subjects,
            n_fixed_effects: input.design.n_fixed_effects(),
            iterations: input.fit.iterations,
            reml_deviance: input.fit.reml_deviance,
            variance: variance_summary(input.fit),
            coefficients,
        },
        emmeans,
        contrasts,
    }
}

fn build_report_context(input: &Stage6Input<'_>, contrasts: Vec<ContrastRow>) -> ReportContext {
    ReportContext {
        active_arm: input.configuration.active_arm.clone(),
        placebo_arm: input.configuration.placebo_arm.clone(),
        counts: input.counts,
        median_percent_change_active: arm_median_percent_change(
            input.derived,
            &input.configuration.active_arm,
        ),
        median_percent_change_placebo: arm_median_percent_change(
            input.derived,
            &input.configuration.placebo_arm,
        ),
        variance: variance_summary(input.fit),
        iterations: input.fit.iterations,
        contrasts,
        ci_multiplier: input.configuration.ci_multiplier,
        benefit_positive: input.configuration.benefit_positive,
    }
}

fn variance_summary(fit: &FittedModel) -> VarianceSummary {
    VarianceSummary {
        residual_sd: fit.variance.residual_sd,
        intercept_sd: fit.variance.intercept_sd,
        slope_sd: fit.variance.slope_sd,
        intercept_slope_corr: fit.variance.intercept_slope_corr,
    }
}

fn arm_median_percent_change(derived: &[DerivedObservation], arm: &str) -> Option<f64> {
    let values: Vec<f64> = derived
        .iter()
        .filter(|d| d.observation.treatment == arm)
        .map(|d| d.percent_change)
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(median(&values))
    }
}

fn write_text(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(contents.as_bytes())?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_report.rs"]
mod tests;
