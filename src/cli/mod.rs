pub mod compare;
pub mod export;
pub mod init;
pub mod inspect;
pub mod standard;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::error::Result;
use crate::models::Month;
use crate::settings::{load_settings, shellexpand_path};
use crate::table::SummaryTable;

#[derive(Parser)]
#[command(
    name = "timereport",
    version,
    about = "Standard and comparison reports from timesheet exports."
)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Xlsx,
    Pdf,
    Text,
    All,
}

impl OutputFormat {
    pub fn text(&self) -> bool {
        matches!(self, Self::Text | Self::All)
    }

    pub fn xlsx(&self) -> bool {
        matches!(self, Self::Xlsx | Self::All)
    }

    pub fn pdf(&self) -> bool {
        matches!(self, Self::Pdf | Self::All)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hours by year, month or week per project, with task breakdowns.
    Standard {
        /// Timesheet CSV or template workbook (.xlsx/.xlsm)
        #[arg(long)]
        input: PathBuf,
        /// Grouping: year, month or week (default from the template, else year)
        #[arg(long)]
        mode: Option<String>,
        /// Year to report on (default from the template, else the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month name, abbreviation or number; repeat or comma-separate
        #[arg(long = "month")]
        months: Vec<String>,
        /// Project to include; repeat for several. Replaces the template list.
        #[arg(long = "project")]
        projects: Vec<String>,
        /// Directory for generated files (default from settings)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
        #[arg(long, value_enum, default_value = "all")]
        format: OutputFormat,
    },
    /// Compare projects within a month or year, or one project over time.
    Compare {
        #[arg(long)]
        input: PathBuf,
        /// projects-in-month, projects-in-year or project-over-time
        #[arg(long)]
        mode: String,
        /// Year to compare; repeat for several
        #[arg(long = "year")]
        years: Vec<i32>,
        /// Month name, abbreviation or number; repeat or comma-separate
        #[arg(long = "month")]
        months: Vec<String>,
        /// Project to compare; repeat for several
        #[arg(long = "project")]
        projects: Vec<String>,
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
        #[arg(long, value_enum, default_value = "all")]
        format: OutputFormat,
    },
    /// Show what a timesheet file contains.
    Inspect {
        #[arg(long)]
        input: PathBuf,
    },
    /// Write default settings.
    Init {
        /// Default directory for generated reports
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
        /// Title printed on generated documents
        #[arg(long)]
        title: Option<String>,
        /// Chart font family (Helvetica, Times or Courier)
        #[arg(long)]
        font: Option<String>,
    },
}

/// Month flags may repeat and may each hold a comma-separated list.
pub(crate) fn parse_months(raw: &[String]) -> Result<Vec<Month>> {
    let mut months = Vec::new();
    for arg in raw {
        for m in Month::parse_list(arg)? {
            if !months.contains(&m) {
                months.push(m);
            }
        }
    }
    Ok(months)
}

pub(crate) fn resolve_output_dir(flag: Option<String>) -> PathBuf {
    let dir = flag.unwrap_or_else(|| load_settings().output_dir);
    PathBuf::from(shellexpand_path(&dir))
}

pub(crate) fn print_table(title: &str, table: &SummaryTable) {
    let mut out = comfy_table::Table::new();
    out.set_header(table.columns.clone());
    for row in table.data_rows() {
        out.add_row(row.iter().map(|cell| cell.display()));
    }
    if let Some(total) = table.total_row() {
        out.add_row(
            total
                .iter()
                .map(|cell| comfy_table::Cell::new(cell.display().bold())),
        );
    }
    println!("{}\n{out}", title.bold());
}

/// Show a recoverable report failure to the user and log it.
pub(crate) fn report_failure(stage: &str, failure: &crate::error::Failure) {
    failure.log(stage);
    println!("{}", failure.message().yellow());
}
