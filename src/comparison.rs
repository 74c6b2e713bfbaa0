use std::collections::BTreeMap;

use crate::config::ComparisonConfig;
use crate::error::{Failure, ReportError, Result};
use crate::filter::filter;
use crate::models::{Month, RawTable, RecordSet};
use crate::normalize::normalize;
use crate::table::{Cell, SummaryTable};

/// The comparison a user asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    /// Several projects side by side within one month of one year.
    ProjectsInMonth,
    /// Several projects month by month across one year.
    ProjectsInYear,
    /// One project over the months of a year, or over several years.
    ProjectOverTime,
}

/// Shape of a successful comparison. `ProjectOverTime` resolves into one of
/// the two `ProjectBy*` kinds depending on the year/month selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonKind {
    ProjectsInMonth,
    ProjectsInYear,
    ProjectByMonth,
    ProjectByYear,
}

impl ComparisonKind {
    /// Suffix used in output file names.
    pub fn file_tag(&self) -> &'static str {
        match self {
            Self::ProjectsInMonth => "Month",
            Self::ProjectsInYear => "Year",
            Self::ProjectByMonth => "SingleProjMonths",
            Self::ProjectByYear => "SingleProjYears",
        }
    }
}

impl ComparisonMode {
    pub const ALL: [ComparisonMode; 3] = [
        ComparisonMode::ProjectsInMonth,
        ComparisonMode::ProjectsInYear,
        ComparisonMode::ProjectOverTime,
    ];

    /// Command-line key, English label, Vietnamese label.
    fn labels(&self) -> [&'static str; 3] {
        match self {
            Self::ProjectsInMonth => [
                "projects-in-month",
                "Compare Projects in a Month",
                "So Sánh Dự Án Trong Một Tháng",
            ],
            Self::ProjectsInYear => [
                "projects-in-year",
                "Compare Projects in a Year",
                "So Sánh Dự Án Trong Một Năm",
            ],
            Self::ProjectOverTime => [
                "project-over-time",
                "Compare One Project Over Time (Months/Years)",
                "So Sánh Một Dự Án Qua Các Tháng/Năm",
            ],
        }
    }

    pub fn key(&self) -> &'static str {
        self.labels()[0]
    }

    pub fn label(&self) -> &'static str {
        self.labels()[1]
    }

    /// Resolve a key or display label (English or Vietnamese), ignoring case.
    pub fn from_label(label: &str) -> Result<ComparisonMode> {
        let wanted = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.labels().iter().any(|l| l.to_lowercase() == wanted))
            .ok_or_else(|| ReportError::UnknownMode(label.to_string()))
    }
}

impl std::fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub mode: ComparisonMode,
    pub kind: ComparisonKind,
    pub table: SummaryTable,
    pub title: String,
}

impl Comparison {
    pub fn into_parts(self) -> (SummaryTable, String) {
        (self.table, self.title)
    }
}

/// Flatten a selection result into the `(table, title_or_error)` pair. A
/// failure always yields an empty table.
pub fn into_table_and_message(
    result: std::result::Result<Comparison, Failure>,
) -> (SummaryTable, String) {
    match result {
        Ok(c) => c.into_parts(),
        Err(f) => (SummaryTable::default(), f.message().to_string()),
    }
}

fn project_total_column(project: &str) -> String {
    format!("Total Hours for {project}")
}

// ---------------------------------------------------------------------------
// select
// ---------------------------------------------------------------------------

/// Validate the selection for `mode`, then pivot the matching records.
pub fn select(
    records: &RecordSet,
    config: &ComparisonConfig,
    mode: ComparisonMode,
) -> std::result::Result<Comparison, Failure> {
    if config.selected_projects.is_empty() {
        return Err(Failure::Validation(
            "Please select at least one project to compare.".to_string(),
        ));
    }

    let filtered = filter(records, &config.filter_config());
    if filtered.is_empty() {
        return Err(Failure::Empty(format!(
            "No data found for comparison mode '{}' with the current selection.",
            mode.label()
        )));
    }

    let years = &config.years;
    let months = &config.months;
    let project_count = config.selected_projects.len();

    match mode {
        ComparisonMode::ProjectsInMonth => {
            if years.len() != 1 || months.len() != 1 || project_count < 2 {
                return Err(Failure::Validation(
                    "Select exactly one year, exactly one month and at least two projects for this mode."
                        .to_string(),
                ));
            }
            let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
            for r in &filtered.records {
                *totals.entry(r.project.as_str()).or_default() += r.hours;
            }
            let mut table = SummaryTable::new(["Project Name", "Total Hours"]);
            for (project, hours) in totals {
                table.push(vec![Cell::text(project), Cell::Number(hours)]);
            }
            Ok(Comparison {
                mode,
                kind: ComparisonKind::ProjectsInMonth,
                table,
                title: format!("Hours by project in {} {}", months[0], years[0]),
            })
        }

        ComparisonMode::ProjectsInYear => {
            if years.len() != 1 || project_count < 2 {
                return Err(Failure::Validation(
                    "Select exactly one year and at least two projects for this mode.".to_string(),
                ));
            }
            let mut grid: BTreeMap<&str, BTreeMap<Month, f64>> = BTreeMap::new();
            for r in &filtered.records {
                *grid
                    .entry(r.project.as_str())
                    .or_default()
                    .entry(r.month)
                    .or_default() += r.hours;
            }
            let present: Vec<Month> = Month::ALL
                .iter()
                .copied()
                .filter(|m| grid.values().any(|row| row.contains_key(m)))
                .collect();

            let mut columns = vec!["Project Name".to_string()];
            columns.extend(present.iter().map(|m| m.name().to_string()));
            columns.push("Total Hours".to_string());
            let mut table = SummaryTable::new(columns);
            for (project, by_month) in &grid {
                let mut row = vec![Cell::text(*project)];
                let mut total = 0.0;
                for m in &present {
                    let h = by_month.get(m).copied().unwrap_or(0.0);
                    total += h;
                    row.push(Cell::Number(h));
                }
                row.push(Cell::Number(total));
                table.push(row);
            }
            table.append_total_row();
            Ok(Comparison {
                mode,
                kind: ComparisonKind::ProjectsInYear,
                table,
                title: format!("Hours by project in {} (by month)", years[0]),
            })
        }

        ComparisonMode::ProjectOverTime => {
            if project_count != 1 {
                return Err(Failure::Validation(
                    "Select exactly one project for this mode.".to_string(),
                ));
            }
            let project = config.selected_projects[0].as_str();
            let value_column = project_total_column(project);

            if years.len() == 1 && !months.is_empty() {
                let mut totals: BTreeMap<Month, f64> = BTreeMap::new();
                for r in &filtered.records {
                    *totals.entry(r.month).or_default() += r.hours;
                }
                let mut table =
                    SummaryTable::new(["MonthName".to_string(), value_column, "Project Name".to_string()]);
                for (month, hours) in totals {
                    table.push(vec![
                        Cell::text(month.name()),
                        Cell::Number(hours),
                        Cell::text(project),
                    ]);
                }
                Ok(Comparison {
                    mode,
                    kind: ComparisonKind::ProjectByMonth,
                    table,
                    title: format!("Total hours for project {project} by month in {}", years[0]),
                })
            } else if years.len() > 1 && months.is_empty() {
                let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
                for r in &filtered.records {
                    *totals.entry(r.year).or_default() += r.hours;
                }
                let mut table =
                    SummaryTable::new(["Year".to_string(), value_column, "Project Name".to_string()]);
                for (year, hours) in totals {
                    // text keeps the year axis categorical
                    table.push(vec![
                        Cell::text(year.to_string()),
                        Cell::Number(hours),
                        Cell::text(project),
                    ]);
                }
                Ok(Comparison {
                    mode,
                    kind: ComparisonKind::ProjectByYear,
                    table,
                    title: format!("Total hours for project {project} across years"),
                })
            } else {
                Err(Failure::Validation(
                    "Invalid configuration for comparing one project over time: select one year with \
                     one or more months, or several years with no months."
                        .to_string(),
                ))
            }
        }
    }
}

/// Normalize a raw table and run the comparison selection on it.
pub fn run_comparison_report(
    raw: &RawTable,
    config: &ComparisonConfig,
    mode: ComparisonMode,
) -> std::result::Result<Comparison, Failure> {
    let records = normalize(raw);
    select(&records, config, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{record, record_set};
    use crate::models::RawValue;
    use proptest::prelude::*;

    fn config(years: &[i32], months: &[Month], projects: &[&str]) -> ComparisonConfig {
        ComparisonConfig {
            years: years.to_vec(),
            months: months.to_vec(),
            selected_projects: projects.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn january() -> RecordSet {
        record_set(vec![
            record("2024-01-05", "A", "T", 5.0),
            record("2024-01-06", "B", "T", 3.0),
        ])
    }

    fn year_data() -> RecordSet {
        record_set(vec![
            record("2024-03-05", "B", "T", 4.0),
            record("2024-01-05", "A", "T", 5.0),
            record("2024-01-06", "B", "T", 3.0),
            record("2024-03-07", "A", "T", 1.5),
            record("2024-06-01", "A", "T", 2.0),
            record("2023-06-01", "A", "T", 8.0),
        ])
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(
            ComparisonMode::from_label("projects-in-month").unwrap(),
            ComparisonMode::ProjectsInMonth
        );
        assert_eq!(
            ComparisonMode::from_label("compare projects in a year").unwrap(),
            ComparisonMode::ProjectsInYear
        );
        assert_eq!(
            ComparisonMode::from_label("So Sánh Một Dự Án Qua Các Tháng/Năm").unwrap(),
            ComparisonMode::ProjectOverTime
        );
        assert!(ComparisonMode::from_label("pie chart").is_err());
        for mode in ComparisonMode::ALL {
            assert_eq!(ComparisonMode::from_label(mode.key()).unwrap(), mode);
        }
    }

    #[test]
    fn test_projects_in_month() {
        let c = select(
            &january(),
            &config(&[2024], &[Month::January], &["A", "B"]),
            ComparisonMode::ProjectsInMonth,
        )
        .unwrap();
        assert_eq!(c.kind, ComparisonKind::ProjectsInMonth);
        assert_eq!(c.table.columns, vec!["Project Name", "Total Hours"]);
        assert_eq!(
            c.table.rows,
            vec![
                vec![Cell::text("A"), Cell::Number(5.0)],
                vec![Cell::text("B"), Cell::Number(3.0)],
            ]
        );
        assert!(c.title.contains("January"));
        assert!(c.title.contains("2024"));
    }

    #[test]
    fn test_projects_in_month_needs_two_projects() {
        let result = select(
            &january(),
            &config(&[2024], &[Month::January], &["A"]),
            ComparisonMode::ProjectsInMonth,
        );
        let (table, message) = into_table_and_message(result);
        assert!(table.is_empty());
        assert!(message.contains("at least two projects"), "got: {message}");
    }

    #[test]
    fn test_projects_in_month_needs_one_month() {
        let err = select(
            &january(),
            &config(&[2024], &[Month::January, Month::February], &["A", "B"]),
            ComparisonMode::ProjectsInMonth,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Failure::Validation(_)));
    }

    #[test]
    fn test_no_projects_selected() {
        let err = select(&january(), &config(&[2024], &[], &[]), ComparisonMode::ProjectsInYear)
            .err()
            .unwrap();
        assert!(matches!(err, Failure::Validation(_)));
        assert!(err.message().contains("at least one project"));
    }

    #[test]
    fn test_no_data_names_the_mode() {
        let err = select(
            &january(),
            &config(&[2020], &[], &["A", "B"]),
            ComparisonMode::ProjectsInYear,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Failure::Empty(_)));
        assert!(err.message().contains("Compare Projects in a Year"));
    }

    #[test]
    fn test_projects_in_year_pivot() {
        let c = select(
            &year_data(),
            &config(&[2024], &[], &["A", "B"]),
            ComparisonMode::ProjectsInYear,
        )
        .unwrap();
        assert_eq!(
            c.table.columns,
            vec!["Project Name", "January", "March", "June", "Total Hours"]
        );
        assert_eq!(c.table.len(), 3);
        assert!(c.table.has_total_row);
        let b = &c.table.rows[1];
        assert_eq!(b[0], Cell::text("B"));
        // B has no June hours: zero-filled
        assert_eq!(b[3], Cell::Number(0.0));
        assert_eq!(b[4], Cell::Number(7.0));
        let total = c.table.total_row().unwrap();
        assert_eq!(total[0], Cell::text("Total"));
        assert_eq!(total[1], Cell::Number(8.0));
        assert_eq!(total[4], Cell::Number(15.5));
        assert!(c.title.contains("2024"));
    }

    #[test]
    fn test_project_over_months() {
        let c = select(
            &year_data(),
            &config(&[2024], &[Month::June, Month::January, Month::March], &["A"]),
            ComparisonMode::ProjectOverTime,
        )
        .unwrap();
        assert_eq!(c.kind, ComparisonKind::ProjectByMonth);
        assert_eq!(c.table.columns, vec!["MonthName", "Total Hours for A", "Project Name"]);
        assert_eq!(c.table.labels(0), vec!["January", "March", "June"]);
        assert_eq!(c.table.numbers(1), vec![5.0, 1.5, 2.0]);
        assert_eq!(c.table.rows[0][2], Cell::text("A"));
    }

    #[test]
    fn test_project_over_years() {
        let records = record_set(vec![
            record("2024-02-01", "A", "T", 20.0),
            record("2023-02-01", "A", "T", 10.0),
        ]);
        let c = select(
            &records,
            &config(&[2023, 2024], &[], &["A"]),
            ComparisonMode::ProjectOverTime,
        )
        .unwrap();
        assert_eq!(c.kind, ComparisonKind::ProjectByYear);
        assert_eq!(
            c.table.rows,
            vec![
                vec![Cell::text("2023"), Cell::Number(10.0), Cell::text("A")],
                vec![Cell::text("2024"), Cell::Number(20.0), Cell::text("A")],
            ]
        );
    }

    #[test]
    fn test_project_over_time_rejects_years_and_months() {
        let err = select(
            &year_data(),
            &config(&[2023, 2024], &[Month::January, Month::June], &["A"]),
            ComparisonMode::ProjectOverTime,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Failure::Validation(_)));
        assert!(err.message().contains("Invalid configuration"));
    }

    #[test]
    fn test_project_over_time_rejects_single_year_without_months() {
        let err = select(
            &year_data(),
            &config(&[2024], &[], &["A"]),
            ComparisonMode::ProjectOverTime,
        )
        .err()
        .unwrap();
        assert!(err.message().contains("Invalid configuration"));
    }

    #[test]
    fn test_project_over_time_needs_one_project() {
        let err = select(
            &year_data(),
            &config(&[2023, 2024], &[], &["A", "B"]),
            ComparisonMode::ProjectOverTime,
        )
        .err()
        .unwrap();
        assert!(err.message().contains("exactly one project"));
    }

    #[test]
    fn test_run_comparison_report_from_raw() {
        let text = |s: &str| RawValue::Text(s.to_string());
        let raw = RawTable {
            headers: vec!["Date".into(), "Project Name".into(), "Hours".into()],
            rows: vec![
                vec![text("2024-01-02"), text("A"), RawValue::Number(5.0)],
                vec![text("2024-01-03"), text("B"), text("3")],
            ],
        };
        let result = run_comparison_report(
            &raw,
            &config(&[2024], &[Month::January], &["A", "B"]),
            ComparisonMode::ProjectsInMonth,
        );
        let (table, title) = into_table_and_message(result);
        assert_eq!(table.len(), 2);
        assert!(title.contains("January"));
    }

    proptest! {
        #[test]
        fn prop_total_row_is_column_sum(
            rows in prop::collection::vec((1u32..13, 0usize..4, 0.0f64..10.0), 1..40),
        ) {
            let names = ["A", "B", "C", "D"];
            let set = record_set(
                rows.iter()
                    .map(|(m, p, h)| record(&format!("2024-{m:02}-10"), names[*p], "T", *h))
                    .collect(),
            );
            let result = select(&set, &config(&[2024], &[], &names), ComparisonMode::ProjectsInYear);
            if let Ok(c) = result {
                let total = c.table.total_row().unwrap().to_vec();
                for col in 1..c.table.columns.len() {
                    let sum: f64 = c.table.numbers(col).iter().sum();
                    prop_assert!((total[col].as_f64().unwrap() - sum).abs() < 1e-6);
                }
            }
        }

        #[test]
        fn prop_projects_in_month_rejects_single_project(month in 1u32..13, project in 0usize..2) {
            let names = ["A", "B"];
            let set = record_set(vec![
                record(&format!("2024-{month:02}-10"), "A", "T", 1.0),
                record(&format!("2024-{month:02}-11"), "B", "T", 2.0),
            ]);
            let m = Month::from_number(month).unwrap();
            let result = select(&set, &config(&[2024], &[m], &[names[project]]), ComparisonMode::ProjectsInMonth);
            let (table, message) = into_table_and_message(result);
            prop_assert!(table.is_empty());
            prop_assert!(!message.is_empty());
        }
    }
}
