use std::path::Path;

use colored::Colorize;

use crate::cli::export::{comparison_file_name, run_exports, today_stamp, ExportJob};
use crate::cli::{parse_months, print_table, resolve_output_dir, OutputFormat};
use crate::comparison::{into_table_and_message, run_comparison_report, ComparisonMode};
use crate::config::ComparisonConfig;
use crate::error::Result;
use crate::importer::load_input;
use crate::settings::load_settings;

pub struct CompareArgs {
    pub mode: String,
    pub years: Vec<i32>,
    pub months: Vec<String>,
    pub projects: Vec<String>,
    pub output_dir: Option<String>,
    pub format: OutputFormat,
}

pub fn build_config(args: &CompareArgs) -> Result<ComparisonConfig> {
    let mut years = args.years.clone();
    years.sort_unstable();
    years.dedup();
    let mut projects: Vec<String> = Vec::new();
    for p in &args.projects {
        let p = p.trim();
        if !p.is_empty() && !projects.iter().any(|q| q == p) {
            projects.push(p.to_string());
        }
    }
    Ok(ComparisonConfig {
        years,
        months: parse_months(&args.months)?,
        selected_projects: projects,
    })
}

pub fn run(input: &Path, args: CompareArgs) -> Result<()> {
    let mode = ComparisonMode::from_label(&args.mode)?;
    let config = build_config(&args)?;
    let source = load_input(input)?;

    let result = run_comparison_report(&source.raw, &config, mode);
    if let Err(failure) = &result {
        failure.log("comparison");
    }
    let comparison = result.as_ref().ok().cloned();
    let (table, message) = into_table_and_message(result);
    let Some(comparison) = comparison else {
        println!("{}", message.yellow());
        return Ok(());
    };
    tracing::info!(mode = mode.key(), rows = table.len(), "comparison ready");

    if args.format.text() {
        println!("{} {}", "Comparison:".bold(), mode.label());
        println!(
            "Years: {}  Months: {}  Projects: {}\n",
            config.years_label(),
            config.months_label(),
            config.projects_label()
        );
        print_table(&message, &table);
    }

    let settings = load_settings();
    let dir = resolve_output_dir(args.output_dir);
    let date = today_stamp();
    let mut jobs = Vec::new();
    if args.format.xlsx() {
        let path = dir.join(comparison_file_name(&date, comparison.kind, "xlsx"));
        #[cfg(feature = "xlsx")]
        jobs.push(ExportJob::new("XLSX", path, || {
            crate::xlsx::comparison_workbook(&comparison, &config, &settings.chart)
        }));
        #[cfg(not(feature = "xlsx"))]
        jobs.push(ExportJob::new("XLSX", path, crate::cli::export::unsupported("xlsx")));
    }
    if args.format.pdf() {
        let path = dir.join(comparison_file_name(&date, comparison.kind, "pdf"));
        #[cfg(feature = "pdf")]
        jobs.push(ExportJob::new("PDF", path, || {
            crate::pdf::render_comparison(&comparison, &config, &settings)
        }));
        #[cfg(not(feature = "pdf"))]
        jobs.push(ExportJob::new("PDF", path, crate::cli::export::unsupported("pdf")));
    }
    run_exports(jobs)?;
    Ok(())
}
