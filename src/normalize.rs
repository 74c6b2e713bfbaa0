use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::models::{Column, Month, RawTable, RawValue, RecordSet, TimeRecord};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a raw header to its canonical column. Matching is case-insensitive on
/// the trimmed header and covers the aliases seen in exported timesheets.
pub fn canonical_column(header: &str) -> Option<Column> {
    match header.trim().to_lowercase().as_str() {
        "date" => Some(Column::Date),
        "employee" | "team member" => Some(Column::Employee),
        "project name" | "project" => Some(Column::Project),
        "task" => Some(Column::Task),
        "workcentre" | "workcenter" | "work centre" => Some(Column::Workcentre),
        "hours" | "hou" => Some(Column::Hours),
        _ => None,
    }
}

fn thousands_grouped() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3}(,\d{3})+(\.\d+)?$").ok())
        .as_ref()
}

fn parse_hours_text(raw: &str) -> f64 {
    let s = raw.replace('"', "");
    let s = s.trim();
    // commas only count as thousands separators; "1,5" is not a number
    let grouped = thousands_grouped().is_some_and(|re| re.is_match(s));
    if grouped {
        s.replace(',', "").parse().unwrap_or(0.0)
    } else {
        s.parse().unwrap_or(0.0)
    }
}

/// Hours as a non-negative number. Anything unparsable, non-finite or
/// negative becomes 0.
pub fn parse_hours(raw: &RawValue) -> f64 {
    let value = match raw {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => parse_hours_text(s),
        RawValue::Empty | RawValue::DateTime(_) => 0.0,
    };
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial as i64))
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

pub fn parse_date(raw: &RawValue) -> Option<NaiveDate> {
    match raw {
        RawValue::DateTime(dt) => Some(dt.date()),
        RawValue::Number(n) => excel_serial_to_date(*n),
        RawValue::Text(s) => {
            let s = s.trim();
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                        .map(|dt| dt.date())
                })
        }
        RawValue::Empty => None,
    }
}

fn month_of(date: NaiveDate) -> Month {
    // chrono months are always 1..=12
    Month::from_number(date.month()).unwrap_or(Month::January)
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// Turn a raw table into normalized records. Rows whose date cannot be parsed
/// are dropped; their count is kept on the result for diagnostics.
pub fn normalize(raw: &RawTable) -> RecordSet {
    let mut index: Vec<(Column, usize)> = Vec::new();
    let mut extra_idx = Vec::new();
    let mut extra_headers = Vec::new();
    for (i, header) in raw.headers.iter().enumerate() {
        match canonical_column(header) {
            // first occurrence wins when a sheet repeats a column
            Some(col) if !index.iter().any(|(c, _)| *c == col) => index.push((col, i)),
            Some(_) => {}
            None => {
                extra_idx.push(i);
                extra_headers.push(header.trim().to_string());
            }
        }
    }
    let columns: BTreeSet<Column> = index.iter().map(|(c, _)| *c).collect();
    let pos = |col: Column| index.iter().find(|(c, _)| *c == col).map(|(_, i)| *i);

    let cell = |row: &[RawValue], col: Column| -> RawValue {
        pos(col)
            .and_then(|i| row.get(i))
            .cloned()
            .unwrap_or(RawValue::Empty)
    };

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut dropped = 0usize;
    for row in &raw.rows {
        let Some(date) = parse_date(&cell(row, Column::Date)) else {
            dropped += 1;
            continue;
        };
        let extra = extra_idx
            .iter()
            .map(|i| row.get(*i).map(RawValue::as_text).unwrap_or_default())
            .collect();
        records.push(TimeRecord {
            date,
            employee: cell(row, Column::Employee).as_text(),
            project: cell(row, Column::Project).as_text(),
            task: cell(row, Column::Task).as_text(),
            workcentre: cell(row, Column::Workcentre).as_text(),
            hours: parse_hours(&cell(row, Column::Hours)),
            year: date.year(),
            month: month_of(date),
            week: date.iso_week().week(),
            extra,
        });
    }

    if dropped > 0 {
        tracing::debug!(dropped, kept = records.len(), "dropped rows without a valid date");
    }

    RecordSet {
        records,
        columns,
        extra_headers,
        dropped_rows: dropped,
    }
}
