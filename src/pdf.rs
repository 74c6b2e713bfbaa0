use std::io::BufWriter;

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;

use crate::chart::{self, ChartKind, ChartSpec, ReportChart};
use crate::comparison::Comparison;
use crate::config::{ComparisonConfig, StandardConfig};
use crate::error::{ReportError, Result};
use crate::reports::StandardReport;
use crate::settings::{ChartStyle, Settings};
use crate::table::{Cell, SummaryTable};

// US Letter landscape (mm)
const PAGE_W: f32 = 279.4;
const PAGE_H: f32 = 215.9;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 19.05;
const MARGIN_RIGHT: f32 = 19.05;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 14.0;
const LABEL_SIZE: f32 = 7.0;
const GRID_COLUMNS: usize = 3;
const GRID_LINES: usize = 5;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

/// Cut `text` so it fits in `width` mm at `size`, marking the cut with "..".
fn fit(text: &str, width: f32, size: f32) -> String {
    let max = (width / (size * 0.18)).floor().max(1.0) as usize;
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let keep = max.saturating_sub(2).max(1);
        format!("{}..", text.chars().take(keep).collect::<String>())
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, None))
}

fn gray(level: f32) -> Color {
    Color::Rgb(Rgb::new(level, level, level, None))
}

fn builtin_fonts(family: &str) -> (BuiltinFont, BuiltinFont) {
    match family.trim().to_lowercase().as_str() {
        "times" | "times new roman" | "times-roman" | "serif" => {
            (BuiltinFont::TimesRoman, BuiltinFont::TimesBold)
        }
        "courier" | "monospace" => (BuiltinFont::Courier, BuiltinFont::CourierBold),
        _ => (BuiltinFont::Helvetica, BuiltinFont::HelveticaBold),
    }
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

struct PdfWriter<'a> {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    style: &'a ChartStyle,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl<'a> PdfWriter<'a> {
    fn new(title: &str, style: &'a ChartStyle) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let (regular, bold) = builtin_fonts(&style.font);
        let font = doc
            .add_builtin_font(regular)
            .map_err(|e| ReportError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(bold)
            .map_err(|e| ReportError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            style,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
        })
    }

    fn layer(&self) -> PdfLayerReference {
        self.doc
            .get_page(self.current_page)
            .get_layer(self.current_layer)
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    // --- primitives; `y` is measured from the top of the page -------------

    fn text_at(&self, s: &str, x: f32, y: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        let layer = self.layer();
        layer.set_fill_color(gray(0.0));
        layer.use_text(s, size, Mm(x), Mm(PAGE_H - y), font);
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        self.text_at(s, x, self.y, size, bold);
    }

    fn centered(&self, s: &str, size: f32, bold: bool) {
        let x = ((PAGE_W - approx_text_width(s, size)) / 2.0).max(MARGIN_LEFT);
        self.text(s, x, size, bold);
    }

    fn line(&self, points: &[(f32, f32)], color: Color, thickness: f32) {
        let layer = self.layer();
        layer.set_outline_color(color);
        layer.set_outline_thickness(thickness);
        layer.add_line(Line {
            points: points
                .iter()
                .map(|(x, y)| (Point::new(Mm(*x), Mm(PAGE_H - *y)), false))
                .collect(),
            is_closed: false,
        });
    }

    fn rect(&self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let corner = |cx: f32, cy: f32| (Point::new(Mm(cx), Mm(PAGE_H - cy)), false);
        let layer = self.layer();
        layer.set_fill_color(color);
        layer.add_polygon(Polygon {
            rings: vec![vec![
                corner(x, y),
                corner(x + w, y),
                corner(x + w, y + h),
                corner(x, y + h),
            ]],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn hline(&self, x1: f32, x2: f32) {
        self.line(&[(x1, self.y), (x2, self.y)], gray(0.0), 0.5);
    }

    // --- layout -----------------------------------------------------------

    fn header(&mut self, title: &str) {
        self.centered(title, TITLE_SIZE, true);
        self.y += 9.0;
        let ts = chrono::Local::now()
            .format("Generated on: %Y-%m-%d %H:%M:%S")
            .to_string();
        self.centered(&ts, FONT_SIZE, false);
        self.y += 6.0;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 8.0;
    }

    fn info_line(&mut self, label: &str, value: &str) {
        self.ensure_space(ROW_H);
        self.text(label, MARGIN_LEFT, FONT_SIZE, true);
        let width = PAGE_W - MARGIN_RIGHT - MARGIN_LEFT - 40.0;
        self.text(&fit(value, width, FONT_SIZE), MARGIN_LEFT + 40.0, FONT_SIZE, false);
        self.y += ROW_H + 1.0;
    }

    /// Numbered items laid out in fixed columns, filled row by row.
    fn grid(&mut self, label: &str, items: &[String]) {
        self.ensure_space(ROW_H * 2.0);
        self.text(label, MARGIN_LEFT, FONT_SIZE, true);
        self.y += ROW_H + 1.0;
        let col_w = (PAGE_W - MARGIN_LEFT - MARGIN_RIGHT - 10.0) / GRID_COLUMNS as f32;
        for chunk in items.iter().enumerate().collect::<Vec<_>>().chunks(GRID_COLUMNS) {
            self.ensure_space(ROW_H);
            for (slot, (i, item)) in chunk.iter().enumerate() {
                let entry = fit(&format!("{}. {}", i + 1, item), col_w - 2.0, FONT_SIZE);
                let x = MARGIN_LEFT + 10.0 + slot as f32 * col_w;
                self.text(&entry, x, FONT_SIZE, false);
            }
            self.y += ROW_H;
        }
        self.y += 2.0;
    }

    fn table_header(&mut self, cols: &[Col], headers: &[&str]) {
        self.ensure_space(ROW_H * 2.0);
        let mut x = MARGIN_LEFT;
        for (i, col) in cols.iter().enumerate() {
            if i < headers.len() {
                let h = fit(headers[i], col.width - 2.0, FONT_SIZE);
                match col.align {
                    Align::Left => self.text(&h, x, FONT_SIZE, true),
                    Align::Right => {
                        let tw = approx_text_width(&h, FONT_SIZE);
                        self.text(&h, x + col.width - tw, FONT_SIZE, true);
                    }
                }
            }
            x += col.width;
        }
        self.y += 2.0;
        let right = MARGIN_LEFT + cols.iter().map(|c| c.width).sum::<f32>();
        self.hline(MARGIN_LEFT, right);
        self.y += ROW_H;
    }

    fn table_row(&mut self, cols: &[Col], values: &[String], bold: bool) {
        self.ensure_space(ROW_H);
        let mut x = MARGIN_LEFT;
        for (i, col) in cols.iter().enumerate() {
            if let Some(v) = values.get(i) {
                let v = fit(v, col.width - 2.0, FONT_SIZE);
                match col.align {
                    Align::Left => self.text(&v, x, FONT_SIZE, bold),
                    Align::Right => {
                        let tw = approx_text_width(&v, FONT_SIZE);
                        self.text(&v, x + col.width - tw, FONT_SIZE, bold);
                    }
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
    }

    fn summary_table(&mut self, table: &SummaryTable) {
        if table.columns.is_empty() {
            return;
        }
        let usable = PAGE_W - MARGIN_LEFT - MARGIN_RIGHT;
        let width = (usable / table.columns.len() as f32).min(60.0);
        let numeric = |c: usize| {
            table
                .rows
                .first()
                .and_then(|r| r.get(c))
                .map(|cell| !matches!(cell, Cell::Text(_)))
                .unwrap_or(false)
        };
        let cols: Vec<Col> = (0..table.columns.len())
            .map(|c| Col {
                width,
                align: if numeric(c) { Align::Right } else { Align::Left },
            })
            .collect();
        let headers: Vec<&str> = table.columns.iter().map(String::as_str).collect();
        self.table_header(&cols, &headers);
        let last = table.rows.len();
        for (i, row) in table.rows.iter().enumerate() {
            let values: Vec<String> = row.iter().map(Cell::display).collect();
            let bold = table.has_total_row && i + 1 == last;
            self.table_row(&cols, &values, bold);
        }
        self.y += ROW_H;
    }

    // --- charts -----------------------------------------------------------

    /// One chart per page: optional project heading, title, then the drawing.
    fn chart_page(&mut self, item: &ReportChart) {
        self.new_page();
        if let Some(project) = &item.project {
            self.text(&format!("Project: {project}"), MARGIN_LEFT, HEADING_SIZE, true);
            self.y += 8.0;
        }
        self.centered(&item.spec.title, HEADING_SIZE, true);
        self.y += 10.0;
        self.draw_chart(&item.spec);
    }

    fn draw_chart(&mut self, spec: &ChartSpec) {
        let legend_w = if spec.series.len() > 1 { 45.0 } else { 0.0 };
        let gutter = if spec.kind == ChartKind::HorizontalBar { 55.0 } else { 18.0 };
        let left = MARGIN_LEFT + gutter;
        let right = PAGE_W - MARGIN_RIGHT - legend_w;
        let top = self.y + 4.0;
        let bottom = PAGE_H - MARGIN_BOTTOM - 16.0;
        let max = {
            let m = spec.max_value();
            if m > 0.0 {
                m * 1.1
            } else {
                1.0
            }
        };

        match spec.kind {
            ChartKind::HorizontalBar => self.draw_horizontal(spec, left, right, top, bottom, max),
            ChartKind::Bar | ChartKind::Line => {
                self.draw_vertical(spec, left, right, top, bottom, max)
            }
        }

        // axis titles; a horizontal chart carries values along the x axis
        let (x_axis_title, y_axis_title) = if spec.kind == ChartKind::HorizontalBar {
            (&spec.y_title, &spec.x_title)
        } else {
            (&spec.x_title, &spec.y_title)
        };
        let x_mid = (left + right - approx_text_width(x_axis_title, FONT_SIZE)) / 2.0;
        self.text_at(x_axis_title, x_mid, bottom + 12.0, FONT_SIZE, true);
        self.text_at(y_axis_title, MARGIN_LEFT, top - 2.0, FONT_SIZE, true);

        if legend_w > 0.0 {
            let x = right + 6.0;
            for (i, s) in spec.series.iter().enumerate() {
                let y = top + 4.0 + i as f32 * 6.0;
                self.rect(x, y - 3.0, 4.0, 3.0, rgb(self.style.color(i)));
                self.text_at(&fit(&s.name, legend_w - 10.0, LABEL_SIZE), x + 6.0, y, LABEL_SIZE, false);
            }
        }
        self.y = bottom + 16.0;
    }

    fn value_gridlines(&self, left: f32, right: f32, top: f32, bottom: f32, max: f32, vertical: bool) {
        for step in 0..=GRID_LINES {
            let value = max * step as f32 / GRID_LINES as f32;
            let label = format!("{value:.1}");
            if vertical {
                let y = bottom - (bottom - top) * step as f32 / GRID_LINES as f32;
                self.line(&[(left, y), (right, y)], gray(0.85), 0.3);
                let tw = approx_text_width(&label, LABEL_SIZE);
                self.text_at(&label, left - tw - 1.5, y + 1.0, LABEL_SIZE, false);
            } else {
                let x = left + (right - left) * step as f32 / GRID_LINES as f32;
                self.line(&[(x, top), (x, bottom)], gray(0.85), 0.3);
                let tw = approx_text_width(&label, LABEL_SIZE);
                self.text_at(&label, x - tw / 2.0, bottom + 4.0, LABEL_SIZE, false);
            }
        }
        self.line(&[(left, top), (left, bottom), (right, bottom)], gray(0.0), 0.6);
    }

    fn draw_vertical(&self, spec: &ChartSpec, left: f32, right: f32, top: f32, bottom: f32, max: f64) {
        let max = max as f32;
        self.value_gridlines(left, right, top, bottom, max, true);
        let n = spec.categories.len().max(1);
        let slot = (right - left) / n as f32;
        let height = |v: f64| (v as f32 / max) * (bottom - top);

        for (c, cat) in spec.categories.iter().enumerate() {
            let label = fit(cat, slot - 1.0, LABEL_SIZE);
            let cx = left + slot * (c as f32 + 0.5);
            let tw = approx_text_width(&label, LABEL_SIZE);
            self.text_at(&label, cx - tw / 2.0, bottom + 4.0, LABEL_SIZE, false);
        }

        let single = spec.series.len() == 1;
        match spec.kind {
            ChartKind::Line => {
                for (i, s) in spec.series.iter().enumerate() {
                    let color = rgb(self.style.color(i));
                    let points: Vec<(f32, f32)> = s
                        .values
                        .iter()
                        .enumerate()
                        .map(|(c, v)| (left + slot * (c as f32 + 0.5), bottom - height(*v)))
                        .collect();
                    if points.len() > 1 {
                        self.line(&points, color.clone(), 1.2);
                    }
                    for (p, v) in points.iter().zip(&s.values) {
                        self.rect(p.0 - 1.0, p.1 - 1.0, 2.0, 2.0, color.clone());
                        if single {
                            let label = format!("{v:.1}");
                            let tw = approx_text_width(&label, LABEL_SIZE);
                            self.text_at(&label, p.0 - tw / 2.0, p.1 - 2.5, LABEL_SIZE, false);
                        }
                    }
                }
            }
            _ => {
                let group = slot * 0.7;
                let bar_w = group / spec.series.len().max(1) as f32;
                for (i, s) in spec.series.iter().enumerate() {
                    let color = rgb(self.style.color(i));
                    for (c, v) in s.values.iter().enumerate() {
                        let x = left + slot * c as f32 + (slot - group) / 2.0 + bar_w * i as f32;
                        let h = height(*v);
                        self.rect(x, bottom - h, bar_w, h, color.clone());
                        if single {
                            let label = format!("{v:.1}");
                            let tw = approx_text_width(&label, LABEL_SIZE);
                            self.text_at(&label, x + (bar_w - tw) / 2.0, bottom - h - 1.5, LABEL_SIZE, false);
                        }
                    }
                }
            }
        }
    }

    fn draw_horizontal(&self, spec: &ChartSpec, left: f32, right: f32, top: f32, bottom: f32, max: f64) {
        let max = max as f32;
        self.value_gridlines(left, right, top, bottom, max, false);
        let n = spec.categories.len().max(1);
        let slot = (bottom - top) / n as f32;
        let color = rgb(self.style.color(0));
        let values = spec.series.first().map(|s| s.values.as_slice()).unwrap_or(&[]);
        for (c, cat) in spec.categories.iter().enumerate() {
            let y = top + slot * c as f32;
            let label = fit(cat, left - MARGIN_LEFT - 2.0, LABEL_SIZE);
            let tw = approx_text_width(&label, LABEL_SIZE);
            self.text_at(&label, left - tw - 1.5, y + slot / 2.0 + 1.0, LABEL_SIZE, false);
            let v = values.get(c).copied().unwrap_or(0.0);
            let w = (v as f32 / max) * (right - left);
            let bar_h = (slot * 0.7).min(12.0);
            let bar_y = y + (slot - bar_h) / 2.0;
            self.rect(left, bar_y, w, bar_h, color.clone());
            self.text_at(&format!("{v:.1}"), left + w + 1.5, bar_y + bar_h / 2.0 + 1.0, LABEL_SIZE, false);
        }
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ReportError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| ReportError::Pdf(e.to_string()))
    }
}

const NO_CHARTS: &str = "No charts generated for this report.";
const NO_PROJECTS: &str = "No projects selected or found";

/// Every allow-list name, whatever its Include flag. Only the workbook's
/// `Config_Info` sheet narrows the list to included entries.
fn cover_projects(config: &StandardConfig) -> Vec<String> {
    config.projects.iter().map(|p| p.name.clone()).collect()
}

// ---------------------------------------------------------------------------
// Render functions
// ---------------------------------------------------------------------------

pub fn render_standard(report: &StandardReport, settings: &Settings) -> Result<Vec<u8>> {
    let title = format!("{} - Standard Report", settings.report_title);
    let mut pdf = PdfWriter::new(&title, &settings.chart)?;
    pdf.header(&title);

    let config = &report.config;
    pdf.info_line("Mode:", config.mode.label());
    pdf.info_line("Year:", &config.year.to_string());
    pdf.info_line("Total hours:", &crate::fmt::hours(report.summary.total_hours));
    if config.months.is_empty() {
        pdf.info_line("Months:", "All");
    } else {
        let months: Vec<String> = config.months.iter().map(|m| m.name().to_string()).collect();
        pdf.grid("Months:", &months);
    }
    let projects = cover_projects(config);
    if projects.is_empty() {
        pdf.info_line("Projects:", NO_PROJECTS);
    } else {
        pdf.grid("Projects:", &projects);
    }
    pdf.y += ROW_H;
    pdf.summary_table(&report.summary.by_month);

    let charts = chart::standard_charts(&report.summary);
    if charts.is_empty() {
        pdf.centered(NO_CHARTS, FONT_SIZE, true);
    }
    for c in &charts {
        pdf.chart_page(c);
    }
    tracing::debug!(charts = charts.len(), "standard document built");
    pdf.to_bytes()
}

pub fn render_comparison(
    comparison: &Comparison,
    config: &ComparisonConfig,
    settings: &Settings,
) -> Result<Vec<u8>> {
    let title = format!("{} - Comparison Report", settings.report_title);
    let mut pdf = PdfWriter::new(&title, &settings.chart)?;
    pdf.header(&title);

    pdf.info_line("Mode:", comparison.mode.label());
    pdf.info_line("Years:", &config.years_label());
    pdf.info_line("Months:", &config.months_label());
    pdf.info_line("Projects:", &config.projects_label());
    pdf.info_line("Report:", &comparison.title);
    pdf.y += ROW_H;
    pdf.summary_table(&comparison.table);

    match chart::resolve(comparison) {
        Some(spec) => pdf.chart_page(&ReportChart { project: None, spec }),
        None => pdf.centered(NO_CHARTS, FONT_SIZE, true),
    }
    pdf.to_bytes()
}
