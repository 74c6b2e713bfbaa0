use crate::comparison::{Comparison, ComparisonKind};
use crate::reports::StandardSummary;
use crate::table::SummaryTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
}

/// Inclusive cell range inside a table, with the header as row 0 and the
/// first data row as row 1. Writers add their own origin offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellSpan {
    fn column(col: usize, rows: usize) -> CellSpan {
        CellSpan {
            first_row: 1,
            first_col: col as u16,
            last_row: rows as u32,
            last_col: col as u16,
        }
    }

    fn row(row: usize, first_col: usize, last_col: usize) -> CellSpan {
        CellSpan {
            first_row: row as u32,
            first_col: first_col as u16,
            last_row: row as u32,
            last_col: last_col as u16,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
    pub span: CellSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub categories: Vec<String>,
    pub categories_span: CellSpan,
    pub series: Vec<ChartSeries>,
}

impl ChartSpec {
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max)
    }
}

/// A chart plus the project it belongs to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportChart {
    pub project: Option<String>,
    pub spec: ChartSpec,
}

/// Single-series chart from a label column and a value column.
fn column_chart(
    table: &SummaryTable,
    kind: ChartKind,
    title: &str,
    label_col: usize,
    value_col: usize,
) -> Option<ChartSpec> {
    let rows = table.data_rows().len();
    if rows == 0 || value_col >= table.columns.len() {
        return None;
    }
    let value_name = &table.columns[value_col];
    Some(ChartSpec {
        kind,
        title: title.to_string(),
        x_title: table.columns[label_col].clone(),
        y_title: value_name.clone(),
        categories: table.labels(label_col),
        categories_span: CellSpan::column(label_col, rows),
        series: vec![ChartSeries {
            name: value_name.clone(),
            values: table.numbers(value_col),
            span: CellSpan::column(value_col, rows),
        }],
    })
}

/// Projects-in-year pivot: months along the axis, one line per project.
fn month_lines(table: &SummaryTable, title: &str) -> Option<ChartSpec> {
    let total_col = table.column_index("Total Hours");
    let month_cols: Vec<usize> = (1..table.columns.len())
        .filter(|&i| Some(i) != total_col)
        .collect();
    let (first, last) = (*month_cols.first()?, *month_cols.last()?);
    let rows = table.data_rows();
    if rows.is_empty() {
        return None;
    }
    let series = rows
        .iter()
        .enumerate()
        .map(|(i, row)| ChartSeries {
            name: row[0].display(),
            values: month_cols
                .iter()
                .map(|&c| row.get(c).and_then(|cell| cell.as_f64()).unwrap_or(0.0))
                .collect(),
            span: CellSpan::row(i + 1, first, last),
        })
        .collect();
    Some(ChartSpec {
        kind: ChartKind::Line,
        title: title.to_string(),
        x_title: "Month".to_string(),
        y_title: "Total Hours".to_string(),
        categories: month_cols.iter().map(|&c| table.columns[c].clone()).collect(),
        categories_span: CellSpan::row(0, first, last),
        series,
    })
}

/// Chart shape for a comparison. Synthetic totals never reach the chart;
/// `None` when no data rows remain.
pub fn resolve(comparison: &Comparison) -> Option<ChartSpec> {
    let table = &comparison.table;
    let title = comparison.title.as_str();
    match comparison.kind {
        ComparisonKind::ProjectsInMonth => column_chart(table, ChartKind::Bar, title, 0, 1),
        ComparisonKind::ProjectsInYear => month_lines(table, title),
        ComparisonKind::ProjectByMonth => column_chart(table, ChartKind::Bar, title, 0, 1),
        ComparisonKind::ProjectByYear => column_chart(table, ChartKind::Line, title, 0, 1),
    }
}

/// Horizontal breakdown chart, skipped when empty or all zero.
pub fn breakdown(table: &SummaryTable, title: &str) -> Option<ChartSpec> {
    if table.numbers(1).iter().sum::<f64>() <= 0.0 {
        return None;
    }
    column_chart(table, ChartKind::HorizontalBar, title, 0, 1)
}

pub fn month_overview(summary: &StandardSummary) -> Option<ChartSpec> {
    column_chart(&summary.by_month, ChartKind::Bar, "Total Hours by Month", 0, 1)
}

/// Every chart of a standard report in page order: the month overview, then
/// task and workcentre breakdowns per project.
pub fn standard_charts(summary: &StandardSummary) -> Vec<ReportChart> {
    let mut charts: Vec<ReportChart> = month_overview(summary)
        .map(|spec| ReportChart { project: None, spec })
        .into_iter()
        .collect();
    for p in &summary.projects {
        let by_task = breakdown(&p.tasks, &format!("{} - Hours by Task", p.project));
        let by_wc = breakdown(&p.workcentres, &format!("{} - Hours by Workcentre", p.project));
        for spec in [by_task, by_wc].into_iter().flatten() {
            charts.push(ReportChart {
                project: Some(p.project.clone()),
                spec,
            });
        }
    }
    charts
}
