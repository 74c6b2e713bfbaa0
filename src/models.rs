use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Calendar month. Declaration order is the canonical January to December order
/// used for sorting and chart categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::January => "January",
            Self::February => "February",
            Self::March => "March",
            Self::April => "April",
            Self::May => "May",
            Self::June => "June",
            Self::July => "July",
            Self::August => "August",
            Self::September => "September",
            Self::October => "October",
            Self::November => "November",
            Self::December => "December",
        }
    }

    /// 1-based month number.
    pub fn from_number(n: u32) -> Option<Month> {
        Self::ALL.get(n.checked_sub(1)? as usize).copied()
    }

    /// Case-insensitive lookup by full English name, three-letter
    /// abbreviation or number.
    pub fn parse(raw: &str) -> Result<Month> {
        let s = raw.trim();
        if let Ok(n) = s.parse::<u32>() {
            return Month::from_number(n).ok_or_else(|| ReportError::UnknownMonth(raw.to_string()));
        }
        let lower = s.to_lowercase();
        Self::ALL
            .iter()
            .find(|m| {
                let name = m.name().to_lowercase();
                name == lower || (lower.len() == 3 && name.starts_with(&lower))
            })
            .copied()
            .ok_or_else(|| ReportError::UnknownMonth(raw.to_string()))
    }

    /// Parse a comma-separated month list as written in the template config.
    pub fn parse_list(raw: &str) -> Result<Vec<Month>> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Month::parse)
            .collect()
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical columns the core understands. Anything else in a raw table is
/// carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Date,
    Employee,
    Project,
    Task,
    Workcentre,
    Hours,
}

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Employee => "Employee",
            Self::Project => "Project name",
            Self::Task => "Task",
            Self::Workcentre => "Workcentre",
            Self::Hours => "Hours",
        }
    }
}

/// A single cell as read from a CSV or workbook before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
    DateTime(chrono::NaiveDateTime),
}

impl RawValue {
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.date().format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }
}

/// Intermediate representation from a CSV/XLSX reader before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeRecord {
    pub date: NaiveDate,
    pub employee: String,
    pub project: String,
    pub task: String,
    pub workcentre: String,
    pub hours: f64,
    pub year: i32,
    pub month: Month,
    pub week: u32,
    /// Values of non-canonical raw columns, aligned with `RecordSet::extra_headers`.
    pub extra: Vec<String>,
}

/// Normalized snapshot handed to filters, aggregators and selectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub records: Vec<TimeRecord>,
    pub columns: BTreeSet<Column>,
    pub extra_headers: Vec<String>,
    pub dropped_rows: usize,
}

impl RecordSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn total_hours(&self) -> f64 {
        self.records.iter().map(|r| r.hours).sum()
    }

    /// A record set with the same schema but a different row selection.
    pub fn with_records(&self, records: Vec<TimeRecord>) -> RecordSet {
        RecordSet {
            records,
            columns: self.columns.clone(),
            extra_headers: self.extra_headers.clone(),
            dropped_rows: self.dropped_rows,
        }
    }

    /// Distinct project names in first-encounter order.
    pub fn projects(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for r in &self.records {
            if !seen.contains(&r.project.as_str()) {
                seen.push(r.project.as_str());
            }
        }
        seen
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.records.iter().map(|r| r.year).collect()
    }

    /// Header row for a raw listing: canonical columns present, derived
    /// columns, then passthrough columns.
    pub fn listing_headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = [
            Column::Date,
            Column::Employee,
            Column::Project,
            Column::Task,
            Column::Workcentre,
            Column::Hours,
        ]
        .iter()
        .filter(|c| self.has(**c))
        .map(|c| c.header().to_string())
        .collect();
        headers.extend(["Year", "MonthName", "Week"].map(String::from));
        headers.extend(self.extra_headers.iter().cloned());
        headers
    }
}
