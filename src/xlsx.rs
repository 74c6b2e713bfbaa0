use std::sync::OnceLock;

use chrono::Datelike;
use regex::Regex;
use rust_xlsxwriter::{
    Chart, ChartDataLabel, ChartFont, ChartFormat, ChartLine, ChartSolidFill, ChartType, Color,
    ExcelDateTime, Format, FormatBorder, Workbook, Worksheet,
};

use crate::chart::{self, ChartKind, ChartSpec};
use crate::comparison::Comparison;
use crate::config::ComparisonConfig;
use crate::error::Result;
use crate::models::{Column, RecordSet};
use crate::reports::StandardReport;
use crate::settings::ChartStyle;
use crate::table::{Cell, SummaryTable};

const MAX_SHEET_NAME: usize = 31;
const FIXED_SHEETS: &[&str] = &["Summary", "Period Summary", "RawData", "Config_Info"];
pub const COMPARISON_SHEET: &str = "Comparison Report";

// ---------------------------------------------------------------------------
// Sheet names
// ---------------------------------------------------------------------------

fn invalid_sheet_chars() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\\/*?\[\]:;|=,<>]").ok()).as_ref()
}

fn trim_sheet_name(name: &str) -> &str {
    name.trim_matches(|c: char| c == '\'' || c.is_whitespace())
}

/// A worksheet name Excel accepts that is not in `taken` (compared without
/// case). The chosen name is added to `taken`.
pub fn sanitize_sheet_name(name: &str, taken: &mut Vec<String>) -> String {
    let replaced = match invalid_sheet_chars() {
        Some(re) => re.replace_all(name, "_").into_owned(),
        None => name.to_string(),
    };
    let cleaned: String = replaced
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    // the cut can expose an apostrophe, which Excel rejects at either end
    let cut: String = trim_sheet_name(&cleaned).chars().take(MAX_SHEET_NAME).collect();
    let base = match trim_sheet_name(&cut) {
        "" => "Project".to_string(),
        name => name.to_string(),
    };

    let is_taken = |candidate: &str, taken: &[String]| {
        taken.iter().any(|t| t.eq_ignore_ascii_case(candidate))
    };
    let mut candidate = base.clone();
    let mut n = 1;
    while is_taken(&candidate, taken) {
        let suffix = format!("_{n}");
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        candidate = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        n += 1;
    }
    taken.push(candidate.clone());
    candidate
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

struct Formats {
    header: Format,
    number: Format,
    date: Format,
    total: Format,
    total_number: Format,
    bold: Format,
    title: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xD9E1F2))
                .set_border(FormatBorder::Thin),
            number: Format::new().set_num_format("#,##0.0"),
            date: Format::new().set_num_format("yyyy-mm-dd"),
            total: Format::new().set_bold().set_border(FormatBorder::Thin),
            total_number: Format::new()
                .set_bold()
                .set_num_format("#,##0.0")
                .set_border(FormatBorder::Thin),
            bold: Format::new().set_bold(),
            title: Format::new().set_bold().set_font_size(14),
        }
    }
}

struct WorkbookWriter<'a> {
    workbook: Workbook,
    formats: Formats,
    style: &'a ChartStyle,
}

impl<'a> WorkbookWriter<'a> {
    fn new(style: &'a ChartStyle) -> Self {
        Self {
            workbook: Workbook::new(),
            formats: Formats::new(),
            style,
        }
    }

    /// Write `table` with its header at (`row`, 0). Returns the row after
    /// the last written row.
    fn write_table(&self, ws: &mut Worksheet, row: u32, table: &SummaryTable) -> Result<u32> {
        let f = &self.formats;
        for (c, name) in table.columns.iter().enumerate() {
            ws.write_string_with_format(row, c as u16, name, &f.header)?;
        }
        let last = table.rows.len();
        for (i, cells) in table.rows.iter().enumerate() {
            let r = row + 1 + i as u32;
            let is_total = table.has_total_row && i + 1 == last;
            for (c, cell) in cells.iter().enumerate() {
                let c = c as u16;
                match (cell, is_total) {
                    (Cell::Text(s), false) => {
                        ws.write_string(r, c, s)?;
                    }
                    (Cell::Text(s), true) => {
                        ws.write_string_with_format(r, c, s, &f.total)?;
                    }
                    (Cell::Int(n), _) => {
                        ws.write_number(r, c, *n as f64)?;
                    }
                    (Cell::Number(n), false) => {
                        ws.write_number_with_format(r, c, *n, &f.number)?;
                    }
                    (Cell::Number(n), true) => {
                        ws.write_number_with_format(r, c, *n, &f.total_number)?;
                    }
                }
            }
        }
        for c in 0..table.columns.len() {
            ws.set_column_width(c as u16, 16)?;
        }
        Ok(row + 1 + table.rows.len() as u32)
    }

    /// Record listing with the header at `row`: canonical columns present,
    /// Year/MonthName/Week, then passthrough columns.
    fn write_records(&self, ws: &mut Worksheet, row: u32, records: &RecordSet) -> Result<u32> {
        let f = &self.formats;
        for (c, name) in records.listing_headers().iter().enumerate() {
            ws.write_string_with_format(row, c as u16, name, &f.header)?;
        }
        let canonical: Vec<Column> = [
            Column::Date,
            Column::Employee,
            Column::Project,
            Column::Task,
            Column::Workcentre,
            Column::Hours,
        ]
        .into_iter()
        .filter(|c| records.has(*c))
        .collect();

        for (i, rec) in records.records.iter().enumerate() {
            let r = row + 1 + i as u32;
            let mut c: u16 = 0;
            for col in &canonical {
                match col {
                    Column::Date => {
                        let date = ExcelDateTime::from_ymd(
                            rec.date.year() as u16,
                            rec.date.month() as u8,
                            rec.date.day() as u8,
                        )?;
                        ws.write_datetime_with_format(r, c, &date, &f.date)?;
                    }
                    Column::Employee => {
                        ws.write_string(r, c, &rec.employee)?;
                    }
                    Column::Project => {
                        ws.write_string(r, c, &rec.project)?;
                    }
                    Column::Task => {
                        ws.write_string(r, c, &rec.task)?;
                    }
                    Column::Workcentre => {
                        ws.write_string(r, c, &rec.workcentre)?;
                    }
                    Column::Hours => {
                        ws.write_number_with_format(r, c, rec.hours, &f.number)?;
                    }
                }
                c += 1;
            }
            ws.write_number(r, c, rec.year)?;
            ws.write_string(r, c + 1, rec.month.name())?;
            ws.write_number(r, c + 2, rec.week)?;
            c += 3;
            for value in &rec.extra {
                ws.write_string(r, c, value)?;
                c += 1;
            }
        }
        Ok(row + 1 + records.len() as u32)
    }

    /// Native chart bound to a table whose header sits at (`origin_row`, 0)
    /// of `sheet`.
    fn chart(&self, spec: &ChartSpec, sheet: &str, origin_row: u32) -> Chart {
        let mut chart = Chart::new(match spec.kind {
            ChartKind::Bar => ChartType::Column,
            ChartKind::HorizontalBar => ChartType::Bar,
            ChartKind::Line => ChartType::Line,
        });
        let font = &self.style.font;
        chart
            .title()
            .set_name(spec.title.as_str())
            .set_font(ChartFont::new().set_name(font).set_bold());
        chart.x_axis().set_name(spec.x_title.as_str());
        chart.y_axis().set_name(spec.y_title.as_str());

        let cats = spec.categories_span;
        let single = spec.series.len() == 1;
        for (i, s) in spec.series.iter().enumerate() {
            let color = Color::RGB(self.style.color_hex(i));
            let series = chart.add_series();
            series
                .set_categories((
                    sheet,
                    origin_row + cats.first_row,
                    cats.first_col,
                    origin_row + cats.last_row,
                    cats.last_col,
                ))
                .set_values((
                    sheet,
                    origin_row + s.span.first_row,
                    s.span.first_col,
                    origin_row + s.span.last_row,
                    s.span.last_col,
                ))
                .set_name(s.name.as_str());
            if spec.kind == ChartKind::Line {
                series.set_format(
                    ChartFormat::new().set_line(ChartLine::new().set_color(color).set_width(2.25)),
                );
            } else {
                series.set_format(
                    ChartFormat::new().set_solid_fill(ChartSolidFill::new().set_color(color)),
                );
            }
            if single {
                series.set_data_label(ChartDataLabel::new().show_value());
            }
        }
        if single {
            chart.legend().set_hidden();
        }
        chart.set_width(720).set_height(400);
        chart
    }

    fn save(mut self) -> Result<Vec<u8>> {
        Ok(self.workbook.save_to_buffer()?)
    }
}

// ---------------------------------------------------------------------------
// Standard workbook
// ---------------------------------------------------------------------------

pub fn standard_workbook(report: &StandardReport, style: &ChartStyle) -> Result<Vec<u8>> {
    let mut w = WorkbookWriter::new(style);
    let summary = &report.summary;
    let mut taken: Vec<String> = FIXED_SHEETS.iter().map(|s| s.to_string()).collect();

    let mut ws = Worksheet::new();
    ws.set_name("Summary")?;
    w.write_table(&mut ws, 0, &summary.by_month)?;
    if let Some(spec) = chart::month_overview(summary) {
        ws.insert_chart(1, 4, &w.chart(&spec, "Summary", 0))?;
    }
    w.workbook.push_worksheet(ws);

    let mut ws = Worksheet::new();
    ws.set_name("Period Summary")?;
    w.write_table(&mut ws, 0, &summary.by_period)?;
    w.workbook.push_worksheet(ws);

    let mut ws = Worksheet::new();
    ws.set_name("RawData")?;
    w.write_records(&mut ws, 0, &report.filtered)?;
    w.workbook.push_worksheet(ws);

    for project in &summary.projects {
        let name = sanitize_sheet_name(&project.project, &mut taken);
        let mut ws = Worksheet::new();
        ws.set_name(&name)?;
        let next = w.write_table(&mut ws, 0, &project.tasks)?;
        let title = format!("{} - Hours by Task", project.project);
        if let Some(spec) = chart::breakdown(&project.tasks, &title) {
            ws.insert_chart(0, 4, &w.chart(&spec, &name, 0))?;
        }
        // leave room below the chart before the listing
        let listing_row = next.max(21) + 2;
        ws.write_string_with_format(
            listing_row,
            0,
            &format!("Records for {}", project.project),
            &w.formats.bold,
        )?;
        w.write_records(&mut ws, listing_row + 1, &project.records)?;
        w.workbook.push_worksheet(ws);
    }

    let mut ws = Worksheet::new();
    ws.set_name("Config_Info")?;
    let config = &report.config;
    let info = [
        ("Mode", config.mode.label().to_string()),
        ("Year(s)", config.year.to_string()),
        ("Months", config.months_label()),
        ("Projects Included", config.projects_label()),
    ];
    ws.write_string_with_format(0, 0, "Key", &w.formats.header)?;
    ws.write_string_with_format(0, 1, "Value", &w.formats.header)?;
    for (i, (key, value)) in info.iter().enumerate() {
        ws.write_string_with_format(i as u32 + 1, 0, *key, &w.formats.bold)?;
        ws.write_string(i as u32 + 1, 1, value)?;
    }
    ws.set_column_width(0, 20)?;
    ws.set_column_width(1, 60)?;
    w.workbook.push_worksheet(ws);

    tracing::debug!(projects = summary.projects.len(), "standard workbook built");
    w.save()
}

// ---------------------------------------------------------------------------
// Comparison workbook
// ---------------------------------------------------------------------------

/// Rows of the info block title and the chart, given the row after the
/// table and the number of info lines. Each sits after one blank row.
fn comparison_layout(table_end: u32, info_lines: u32) -> (u32, u32) {
    let info_row = table_end + 1;
    let last_info_row = info_row + info_lines;
    (info_row, last_info_row + 2)
}

pub fn comparison_workbook(
    comparison: &Comparison,
    config: &ComparisonConfig,
    style: &ChartStyle,
) -> Result<Vec<u8>> {
    let mut w = WorkbookWriter::new(style);
    let mut ws = Worksheet::new();
    ws.set_name(COMPARISON_SHEET)?;

    let end = w.write_table(&mut ws, 0, &comparison.table)?;

    let info = [
        ("Years:", config.years_label()),
        ("Months:", config.months_label()),
        ("Projects:", config.projects_label()),
    ];
    let (info_row, chart_row) = comparison_layout(end, info.len() as u32);
    let last_col = comparison.table.columns.len().max(4) as u16 - 1;
    ws.merge_range(
        info_row,
        0,
        info_row,
        last_col,
        &format!("COMPARISON REPORT: {}", comparison.mode.label()),
        &w.formats.title,
    )?;
    for (i, (key, value)) in info.iter().enumerate() {
        let r = info_row + 1 + i as u32;
        ws.write_string_with_format(r, 0, *key, &w.formats.bold)?;
        ws.write_string(r, 1, value)?;
    }

    if let Some(spec) = chart::resolve(comparison) {
        ws.insert_chart(chart_row, 0, &w.chart(&spec, COMPARISON_SHEET, 0))?;
    }
    w.workbook.push_worksheet(ws);

    w.save()
}
