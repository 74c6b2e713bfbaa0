mod chart;
mod cli;
mod comparison;
mod config;
mod error;
mod filter;
mod fmt;
mod importer;
mod models;
mod normalize;
#[cfg(feature = "pdf")]
mod pdf;
mod reports;
mod settings;
mod table;
#[cfg(feature = "xlsx")]
mod xlsx;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::compare::CompareArgs;
use cli::standard::StandardArgs;
use cli::{Cli, Commands};

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Standard {
            input,
            mode,
            year,
            months,
            projects,
            output_dir,
            format,
        } => cli::standard::run(
            &input,
            StandardArgs {
                mode,
                year,
                months,
                projects,
                output_dir,
                format,
            },
        ),
        Commands::Compare {
            input,
            mode,
            years,
            months,
            projects,
            output_dir,
            format,
        } => cli::compare::run(
            &input,
            CompareArgs {
                mode,
                years,
                months,
                projects,
                output_dir,
                format,
            },
        ),
        Commands::Inspect { input } => cli::inspect::run(&input),
        Commands::Init {
            output_dir,
            title,
            font,
        } => cli::init::run(output_dir, title, font),
    };

    if let Err(e) = result {
        tracing::debug!("command failed: {e:?}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
