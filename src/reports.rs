use std::collections::BTreeMap;

use crate::config::{StandardConfig, StandardMode};
use crate::error::Failure;
use crate::filter::filter;
use crate::models::{Column, Month, RawTable, RecordSet, TimeRecord};
use crate::normalize::normalize;
use crate::table::{Cell, SummaryTable};

// ---------------------------------------------------------------------------
// Grouping helpers
// ---------------------------------------------------------------------------

/// Sum hours per key, keeping keys in first-encounter order.
fn sum_by<'a, F>(records: &'a [TimeRecord], key: F) -> Vec<(&'a str, f64)>
where
    F: Fn(&'a TimeRecord) -> &'a str,
{
    let mut out: Vec<(&str, f64)> = Vec::new();
    for r in records {
        let k = key(r);
        match out.iter_mut().find(|(name, _)| *name == k) {
            Some((_, total)) => *total += r.hours,
            None => out.push((k, r.hours)),
        }
    }
    out
}

/// Two-column breakdown sorted by hours descending; ties keep encounter order.
fn breakdown_table(label: &str, mut sums: Vec<(&str, f64)>) -> SummaryTable {
    sums.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut table = SummaryTable::new([label, "Hours"]);
    for (name, hours) in sums {
        table.push(vec![Cell::text(name), Cell::Number(hours)]);
    }
    table
}

fn check_schema(records: &RecordSet) -> Result<(), Failure> {
    for col in [Column::Date, Column::Project, Column::Hours] {
        if !records.has(col) {
            return Err(Failure::Schema(format!(
                "Column '{}' does not exist in the record set; cannot build the report.",
                col.header()
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Standard report
// ---------------------------------------------------------------------------

pub struct ProjectBreakdown {
    pub project: String,
    /// `Task` / `Hours`, empty when the source has no Task column.
    pub tasks: SummaryTable,
    /// `Workcentre` / `Hours`, empty when the source has no Workcentre column.
    pub workcentres: SummaryTable,
    pub records: RecordSet,
}

pub struct StandardSummary {
    pub mode: StandardMode,
    /// Hours per (Year, [MonthName | Week], Project name).
    pub by_period: SummaryTable,
    /// `MonthName` / `Hours` in calendar order.
    pub by_month: SummaryTable,
    pub projects: Vec<ProjectBreakdown>,
    pub total_hours: f64,
}

pub struct StandardReport {
    pub config: StandardConfig,
    pub filtered: RecordSet,
    pub summary: StandardSummary,
}

pub fn aggregate(filtered: &RecordSet, mode: StandardMode) -> Result<StandardSummary, Failure> {
    check_schema(filtered)?;
    if filtered.is_empty() {
        return Err(Failure::Empty(
            "The filtered data is empty; no standard report was created.".to_string(),
        ));
    }

    let mut periods: BTreeMap<(i32, u32, &str), f64> = BTreeMap::new();
    let mut months: BTreeMap<Month, f64> = BTreeMap::new();
    for r in &filtered.records {
        let period = match mode {
            StandardMode::Year => 0,
            StandardMode::Month => r.month as u32,
            StandardMode::Week => r.week,
        };
        *periods.entry((r.year, period, r.project.as_str())).or_default() += r.hours;
        *months.entry(r.month).or_default() += r.hours;
    }

    let by_period = {
        let mut columns = vec!["Year"];
        match mode {
            StandardMode::Year => {}
            StandardMode::Month => columns.push("MonthName"),
            StandardMode::Week => columns.push("Week"),
        }
        columns.extend(["Project name", "Hours"]);
        let mut table = SummaryTable::new(columns);
        for ((year, period, project), hours) in periods {
            let mut row = vec![Cell::Int(year as i64)];
            match mode {
                StandardMode::Year => {}
                StandardMode::Month => {
                    row.push(Cell::text(Month::ALL[period as usize].name()));
                }
                StandardMode::Week => row.push(Cell::Int(period as i64)),
            }
            row.push(Cell::text(project));
            row.push(Cell::Number(hours));
            table.push(row);
        }
        table
    };

    let mut by_month = SummaryTable::new(["MonthName", "Hours"]);
    for (month, hours) in months {
        by_month.push(vec![Cell::text(month.name()), Cell::Number(hours)]);
    }

    let projects = filtered
        .projects()
        .into_iter()
        .map(|project| {
            let subset = filtered.with_records(
                filtered
                    .records
                    .iter()
                    .filter(|r| r.project == project)
                    .cloned()
                    .collect(),
            );
            let tasks = if filtered.has(Column::Task) {
                breakdown_table("Task", sum_by(&subset.records, |r| r.task.as_str()))
            } else {
                SummaryTable::new(["Task", "Hours"])
            };
            let workcentres = if filtered.has(Column::Workcentre) {
                breakdown_table("Workcentre", sum_by(&subset.records, |r| r.workcentre.as_str()))
            } else {
                SummaryTable::new(["Workcentre", "Hours"])
            };
            ProjectBreakdown {
                project: project.to_string(),
                tasks,
                workcentres,
                records: subset,
            }
        })
        .collect();

    Ok(StandardSummary {
        mode,
        by_period,
        by_month,
        projects,
        total_hours: filtered.total_hours(),
    })
}

/// Normalize, filter and aggregate a raw table for the standard report.
pub fn run_standard_report(raw: &RawTable, config: &StandardConfig) -> Result<StandardReport, Failure> {
    let records = normalize(raw);
    standard_report(&records, config)
}

/// Standard report over an already normalized record set.
pub fn standard_report(records: &RecordSet, config: &StandardConfig) -> Result<StandardReport, Failure> {
    let filtered = filter(records, &config.filter_config());
    tracing::info!(
        mode = config.mode.label(),
        year = config.year,
        rows = filtered.len(),
        "building standard report"
    );
    let summary = aggregate(&filtered, config.mode)?;
    Ok(StandardReport {
        config: config.clone(),
        filtered,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectFilterEntry;
    use crate::filter::tests::{record, record_set};
    use crate::models::RawValue;
    use proptest::prelude::*;

    fn sample() -> RecordSet {
        record_set(vec![
            record("2024-03-04", "Beta", "Build", 2.0),
            record("2024-01-08", "Alpha", "Design", 5.0),
            record("2024-01-09", "Alpha", "Review", 1.0),
            record("2024-01-10", "Alpha", "Design", 2.5),
            record("2024-02-12", "Beta", "Test", 2.0),
            record("2024-01-15", "Alpha", "Admin", 1.0),
        ])
    }

    fn table_sum(table: &SummaryTable) -> f64 {
        let col = table.column_index("Hours").unwrap();
        table.numbers(col).iter().sum()
    }

    #[test]
    fn test_aggregate_by_year() {
        let summary = aggregate(&sample(), StandardMode::Year).unwrap();
        assert_eq!(summary.by_period.columns, vec!["Year", "Project name", "Hours"]);
        assert_eq!(summary.by_period.len(), 2);
        assert_eq!(summary.by_period.rows[0][1], Cell::text("Alpha"));
        assert_eq!(summary.by_period.rows[0][2], Cell::Number(9.5));
        assert_eq!(summary.total_hours, 13.5);
    }

    #[test]
    fn test_aggregate_by_month_sorts_calendar_order() {
        let summary = aggregate(&sample(), StandardMode::Month).unwrap();
        let months = summary.by_month.labels(0);
        assert_eq!(months, vec!["January", "February", "March"]);
        assert_eq!(summary.by_month.numbers(1), vec![9.5, 2.0, 2.0]);
        let period_months = summary.by_period.labels(1);
        assert_eq!(period_months, vec!["January", "February", "March"]);
    }

    #[test]
    fn test_aggregate_by_week() {
        let summary = aggregate(&sample(), StandardMode::Week).unwrap();
        assert_eq!(summary.by_period.columns[1], "Week");
        assert_eq!(summary.by_period.rows[0][1], Cell::Int(2));
    }

    #[test]
    fn test_task_breakdown_sorted_desc_with_stable_ties() {
        let summary = aggregate(&sample(), StandardMode::Year).unwrap();
        let alpha = &summary.projects[1];
        assert_eq!(alpha.project, "Alpha");
        assert_eq!(alpha.tasks.labels(0), vec!["Design", "Review", "Admin"]);
        assert_eq!(alpha.tasks.numbers(1), vec![7.5, 1.0, 1.0]);
        assert_eq!(alpha.records.len(), 4);
        // projects in first-encounter order
        assert_eq!(summary.projects[0].project, "Beta");
        assert_eq!(summary.projects[0].workcentres.len(), 2);
    }

    #[test]
    fn test_aggregate_empty_is_reported() {
        let empty = record_set(Vec::new());
        let err = aggregate(&empty, StandardMode::Year).err().unwrap();
        assert!(matches!(err, Failure::Empty(_)));
    }

    #[test]
    fn test_aggregate_missing_column_is_schema_failure() {
        let mut set = sample();
        set.columns.remove(&Column::Project);
        let err = aggregate(&set, StandardMode::Month).err().unwrap();
        assert!(matches!(err, Failure::Schema(_)));
        assert!(err.message().contains("Project name"), "got: {err}");
    }

    #[test]
    fn test_missing_task_column_skips_breakdown() {
        let mut set = sample();
        set.columns.remove(&Column::Task);
        let summary = aggregate(&set, StandardMode::Year).unwrap();
        assert!(summary.projects.iter().all(|p| p.tasks.is_empty()));
    }

    #[test]
    fn test_run_standard_report_end_to_end() {
        let text = |s: &str| RawValue::Text(s.to_string());
        let raw = RawTable {
            headers: vec!["Date".into(), "Project Name".into(), "Task".into(), "Hou".into()],
            rows: vec![
                vec![text("2024-01-03"), text("A"), text("T1"), RawValue::Number(3.0)],
                vec![text("2024-02-03"), text("B"), text("T2"), RawValue::Number(4.0)],
                vec![text("2023-02-03"), text("A"), text("T1"), RawValue::Number(9.0)],
                vec![text("bad"), text("A"), text("T1"), RawValue::Number(9.0)],
            ],
        };
        let config = StandardConfig {
            mode: StandardMode::Month,
            year: 2024,
            months: vec![],
            projects: vec![
                ProjectFilterEntry { name: "A".into(), include: true },
                ProjectFilterEntry { name: "B".into(), include: false },
            ],
        };
        let report = run_standard_report(&raw, &config).unwrap();
        assert_eq!(report.filtered.len(), 2);
        assert_eq!(report.summary.total_hours, 7.0);
        assert_eq!(report.filtered.dropped_rows, 1);
    }

    #[test]
    fn test_run_standard_report_empty_allow_list() {
        let raw = RawTable {
            headers: vec!["Date".into(), "Project name".into(), "Hours".into()],
            rows: vec![vec![
                RawValue::Text("2024-01-03".into()),
                RawValue::Text("A".into()),
                RawValue::Number(3.0),
            ]],
        };
        let config = StandardConfig {
            mode: StandardMode::Year,
            year: 2024,
            months: vec![],
            projects: vec![],
        };
        let err = run_standard_report(&raw, &config).err().unwrap();
        assert!(matches!(err, Failure::Empty(_)));
    }

    proptest! {
        #[test]
        fn prop_grouping_conserves_hours(
            rows in prop::collection::vec((0u32..3, 1u32..13, 1u32..28, 0usize..3, 0.0f64..12.0), 1..50),
        ) {
            let names = ["A", "B", "C"];
            let set = record_set(
                rows.iter()
                    .map(|(y, m, d, p, h)| {
                        record(&format!("{}-{:02}-{:02}", 2022 + y, m, d), names[*p], "T", *h)
                    })
                    .collect(),
            );
            let expected = set.total_hours();
            for mode in [StandardMode::Year, StandardMode::Month, StandardMode::Week] {
                let summary = aggregate(&set, mode).unwrap();
                prop_assert!((table_sum(&summary.by_period) - expected).abs() < 1e-6);
                prop_assert!((table_sum(&summary.by_month) - expected).abs() < 1e-6);
            }
        }
    }
}
