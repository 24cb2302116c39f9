mod config;
mod input;
mod model;
mod pipeline;
mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::{ComparisonConfig, FilterConfig};
use crate::pipeline::stage1_filter::run_stage1;
use crate::pipeline::stage2_baseline::run_stage2;
use crate::pipeline::stage3_change::run_stage3;
use crate::pipeline::stage4_fit::run_stage4;
use crate::pipeline::stage5_contrasts::run_stage5;
use crate::pipeline::stage6_report::{Stage6Input, write_reports};
use crate::report::{ConfigEcho, StageCounts};

#[derive(Parser)]
#[command(
    name = "trial-contrast",
    version,
    about = "Change-from-baseline subgroup contrast estimation from clinical trial CSV exports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: load, derive, fit, contrast, report
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Input CSV or CSV.GZ export
    #[arg(long)]
    input: PathBuf,

    /// Output directory for the contrast table and reports
    #[arg(long)]
    out: PathBuf,

    /// Study identifier to select
    #[arg(long)]
    study: String,

    /// Study part to select
    #[arg(long)]
    part: String,

    /// Compartment code to select
    #[arg(long)]
    compartment: String,

    /// Dose level to include; repeat for multiple levels
    #[arg(long = "dose", required = true)]
    doses: Vec<String>,

    /// Treatment arm treated as active in the contrasts
    #[arg(long)]
    active_arm: String,

    /// Comparator arm
    #[arg(long)]
    placebo_arm: String,

    /// Profile day identifying the baseline record
    #[arg(long, default_value_t = 0)]
    baseline_day: i64,

    /// Confidence bound multiplier
    #[arg(long, default_value_t = 1.96)]
    ci_multiplier: f64,

    /// Store raw active-minus-placebo differences instead of the
    /// benefit-positive convention
    #[arg(long)]
    keep_direction: bool,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_pipeline(&args),
    }
}

fn run_pipeline(args: &RunArgs) -> Result<(), String> {
    let filter = FilterConfig {
        study: args.study.clone(),
        part: args.part.clone(),
        compartment: args.compartment.clone(),
        doses: args.doses.clone(),
        baseline_day: args.baseline_day,
    };
    let mut comparison = ComparisonConfig::new(&args.active_arm, &args.placebo_arm);
    comparison.ci_multiplier = args.ci_multiplier;
    comparison.benefit_positive = !args.keep_direction;

    let observations = input::load_observations(&args.input).map_err(|e| e.to_string())?;

    let stage1 = run_stage1(observations, &filter).map_err(|e| e.to_string())?;
    let rows_in_analysis_set = stage1.observations.len();
    let n_read = stage1.n_read;

    let stage2 = run_stage2(stage1.observations, filter.baseline_day).map_err(|e| e.to_string())?;
    let stage2_counts = stage2.counts;

    let derived = run_stage3(stage2.joined).map_err(|e| e.to_string())?;

    let stage4 = run_stage4(&derived, &comparison).map_err(|e| e.to_string())?;

    let stage5 = run_stage5(&stage4.design, &stage4.fit, &comparison).map_err(|e| e.to_string())?;

    let counts = StageCounts {
        rows_read: n_read,
        rows_in_analysis_set,
        baseline_records: stage2_counts.baselines,
        post_baseline_records: stage2_counts.post_baseline,
        derived_records: derived.len(),
        subjects_dropped: stage2_counts.subjects_dropped,
        subjects_modeled: stage4.design.n_subjects(),
    };
    let configuration = ConfigEcho {
        study: filter.study.clone(),
        part: filter.part.clone(),
        compartment: filter.compartment.clone(),
        doses: filter.doses.clone(),
        baseline_day: filter.baseline_day,
        active_arm: comparison.active_arm.clone(),
        placebo_arm: comparison.placebo_arm.clone(),
        ci_multiplier: comparison.ci_multiplier,
        benefit_positive: comparison.benefit_positive,
    };

    let stage6 = Stage6Input {
        configuration,
        counts,
        derived: &derived,
        design: &stage4.design,
        fit: &stage4.fit,
        emmeans: &stage5.emmeans,
        contrasts: &stage5.contrasts,
    };
    write_reports(&stage6, &args.out).map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
