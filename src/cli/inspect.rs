use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::importer::load_input;
use crate::normalize::normalize;

pub fn run(input: &Path) -> Result<()> {
    let source = load_input(input)?;
    let records = normalize(&source.raw);

    println!("{}", input.display().to_string().bold());
    println!("Rows read:      {}", source.raw.rows.len());
    println!("Records kept:   {}", records.len());
    if records.dropped_rows > 0 {
        println!(
            "Dropped rows:   {}",
            records.dropped_rows.to_string().yellow()
        );
    }
    let columns: Vec<&str> = records.columns.iter().map(|c| c.header()).collect();
    println!("Columns:        {}", columns.join(", "));
    if !records.extra_headers.is_empty() {
        println!("Other columns:  {}", records.extra_headers.join(", "));
    }
    let years: Vec<String> = records.years().iter().map(|y| y.to_string()).collect();
    println!("Years:          {}", years.join(", "));
    println!("Total hours:    {}", crate::fmt::hours(records.total_hours()));

    let mut table = Table::new();
    table.set_header(vec!["Project name", "Records", "Hours"]);
    for project in records.projects() {
        let (count, hours) = records
            .records
            .iter()
            .filter(|r| r.project == project)
            .fold((0usize, 0.0f64), |(n, h), r| (n + 1, h + r.hours));
        table.add_row(vec![
            Cell::new(project),
            Cell::new(count),
            Cell::new(crate::fmt::hours(hours)),
        ]);
    }
    println!("\n{table}");

    if source.year_mode.is_some() || source.project_filter.is_some() {
        let config = source.template_config();
        println!("\n{}", "Template configuration".bold());
        println!("Mode:     {}", config.mode.label());
        println!("Year:     {}", config.year);
        println!("Months:   {}", config.months_label());
        println!("Projects: {}", config.projects_label());
    }
    Ok(())
}
