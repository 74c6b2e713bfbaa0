use std::path::Path;

use colored::Colorize;

use crate::cli::export::{run_exports, standard_file_name, today_stamp, ExportJob};
use crate::cli::{parse_months, print_table, report_failure, resolve_output_dir, OutputFormat};
use crate::config::{ProjectFilterEntry, StandardConfig, StandardMode};
use crate::error::Result;
use crate::importer::load_input;
use crate::reports::{run_standard_report, StandardReport};
use crate::settings::load_settings;

pub struct StandardArgs {
    pub mode: Option<String>,
    pub year: Option<i32>,
    pub months: Vec<String>,
    pub projects: Vec<String>,
    pub output_dir: Option<String>,
    pub format: OutputFormat,
}

/// Template configuration with command-line overrides applied.
pub fn build_config(template: StandardConfig, args: &StandardArgs) -> Result<StandardConfig> {
    let mut config = template;
    if let Some(mode) = &args.mode {
        config.mode = StandardMode::from_label(mode);
    }
    if let Some(year) = args.year {
        config.year = year;
    }
    if !args.months.is_empty() {
        config.months = parse_months(&args.months)?;
    }
    if !args.projects.is_empty() {
        config.projects = args
            .projects
            .iter()
            .map(|name| ProjectFilterEntry {
                name: name.clone(),
                include: true,
            })
            .collect();
    }
    Ok(config)
}

fn print_report(report: &StandardReport) {
    let config = &report.config;
    println!(
        "{} {} {}",
        "Standard report".bold(),
        format!("({} {})", config.mode.label(), config.year).dimmed(),
        format!("{} rows", report.filtered.len()).dimmed(),
    );
    println!("Months: {}", config.months_label());
    println!("Projects: {}\n", config.projects_label());
    print_table("Hours by period", &report.summary.by_period);
    print_table("Hours by month", &report.summary.by_month);
    for p in &report.summary.projects {
        if !p.tasks.is_empty() {
            print_table(&format!("{} - Hours by Task", p.project), &p.tasks);
        }
    }
    println!(
        "{} {}",
        "Total hours:".bold(),
        crate::fmt::hours(report.summary.total_hours)
    );
}

pub fn run(input: &Path, args: StandardArgs) -> Result<()> {
    let source = load_input(input)?;
    let config = build_config(source.template_config(), &args)?;

    let report = match run_standard_report(&source.raw, &config) {
        Ok(report) => report,
        Err(failure) => {
            report_failure("standard", &failure);
            return Ok(());
        }
    };
    if report.filtered.dropped_rows > 0 {
        println!(
            "{}",
            format!("Skipped {} rows without a valid date.", report.filtered.dropped_rows).yellow()
        );
    }

    if args.format.text() {
        print_report(&report);
    }

    let settings = load_settings();
    let dir = resolve_output_dir(args.output_dir);
    let date = today_stamp();
    let mut jobs = Vec::new();
    if args.format.xlsx() {
        let path = dir.join(standard_file_name(&date, "xlsx"));
        #[cfg(feature = "xlsx")]
        jobs.push(ExportJob::new("XLSX", path, || {
            crate::xlsx::standard_workbook(&report, &settings.chart)
        }));
        #[cfg(not(feature = "xlsx"))]
        jobs.push(ExportJob::new("XLSX", path, crate::cli::export::unsupported("xlsx")));
    }
    if args.format.pdf() {
        let path = dir.join(standard_file_name(&date, "pdf"));
        #[cfg(feature = "pdf")]
        jobs.push(ExportJob::new("PDF", path, || crate::pdf::render_standard(&report, &settings)));
        #[cfg(not(feature = "pdf"))]
        jobs.push(ExportJob::new("PDF", path, crate::cli::export::unsupported("pdf")));
    }
    run_exports(jobs)?;
    Ok(())
}
