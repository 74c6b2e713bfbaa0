use std::collections::BTreeSet;

use chrono::Datelike;

use crate::models::{Month, RawTable, RawValue};

/// Time granularity of the standard report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StandardMode {
    #[default]
    Year,
    Month,
    Week,
}

impl StandardMode {
    /// Any label other than `month` or `week` means yearly grouping.
    pub fn from_label(label: &str) -> StandardMode {
        match label.trim().to_lowercase().as_str() {
            "month" => Self::Month,
            "week" => Self::Week,
            _ => Self::Year,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Year => "Year",
            Self::Month => "Month",
            Self::Week => "Week",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    None,
    /// Standard report: one year, matched by equality.
    Single(i32),
    /// Comparison report: any of several years.
    AnyOf(BTreeSet<i32>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFilterEntry {
    pub name: String,
    /// Display-only; membership in the allow-list alone decides filtering.
    pub include: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterConfig {
    pub years: YearFilter,
    pub months: Vec<Month>,
    pub projects: Vec<ProjectFilterEntry>,
}

/// Configuration of a standard report run.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardConfig {
    pub mode: StandardMode,
    pub year: i32,
    pub months: Vec<Month>,
    pub projects: Vec<ProjectFilterEntry>,
}

impl Default for StandardConfig {
    fn default() -> Self {
        Self {
            mode: StandardMode::Year,
            year: chrono::Local::now().year(),
            months: Vec::new(),
            projects: Vec::new(),
        }
    }
}

impl StandardConfig {
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            years: YearFilter::Single(self.year),
            months: self.months.clone(),
            projects: self.projects.clone(),
        }
    }

    pub fn months_label(&self) -> String {
        months_label(&self.months)
    }

    pub fn projects_label(&self) -> String {
        let included: Vec<&str> = self
            .projects
            .iter()
            .filter(|p| p.include)
            .map(|p| p.name.as_str())
            .collect();
        if self.projects.is_empty() || included.is_empty() {
            "No projects selected or found".to_string()
        } else {
            included.join(", ")
        }
    }
}

/// Selection for a comparison report. Built per request and discarded after
/// rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComparisonConfig {
    pub years: Vec<i32>,
    pub months: Vec<Month>,
    pub selected_projects: Vec<String>,
}

impl ComparisonConfig {
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            years: if self.years.is_empty() {
                YearFilter::None
            } else {
                YearFilter::AnyOf(self.years.iter().copied().collect())
            },
            months: self.months.clone(),
            projects: self
                .selected_projects
                .iter()
                .map(|name| ProjectFilterEntry {
                    name: name.clone(),
                    include: true,
                })
                .collect(),
        }
    }

    pub fn years_label(&self) -> String {
        if self.years.is_empty() {
            "N/A".to_string()
        } else {
            join(&self.years)
        }
    }

    pub fn months_label(&self) -> String {
        months_label(&self.months)
    }

    pub fn projects_label(&self) -> String {
        if self.selected_projects.is_empty() {
            "None".to_string()
        } else {
            self.selected_projects.join(", ")
        }
    }
}

pub fn months_label(months: &[Month]) -> String {
    if months.is_empty() {
        "All".to_string()
    } else {
        join(months)
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Template configuration sheets
// ---------------------------------------------------------------------------

fn header_index(table: &RawTable, name: &str) -> Option<usize> {
    table
        .headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn lookup<'a>(table: &'a RawTable, key: &str) -> Option<&'a RawValue> {
    let k = header_index(table, "Key")?;
    let v = header_index(table, "Value")?;
    table
        .rows
        .iter()
        .find(|row| {
            row.get(k)
                .map(|c| c.as_text().eq_ignore_ascii_case(key))
                .unwrap_or(false)
        })
        .and_then(|row| row.get(v))
        .filter(|c| **c != RawValue::Empty)
}

/// Build a standard configuration from the `Key`/`Value` mode sheet and the
/// `Project Name`/`Include` project sheet. Missing or malformed entries fall
/// back to defaults: mode `year`, the current year, all months.
pub fn parse_template_config(year_mode: &RawTable, project_filter: &RawTable) -> StandardConfig {
    let mut config = StandardConfig::default();

    if let Some(mode) = lookup(year_mode, "mode") {
        config.mode = StandardMode::from_label(&mode.as_text());
    }

    match lookup(year_mode, "year") {
        Some(RawValue::Number(n)) if n.fract() == 0.0 => config.year = *n as i32,
        Some(other) => match other.as_text().parse() {
            Ok(y) => config.year = y,
            Err(_) => tracing::warn!(value = %other.as_text(), "ignoring non-numeric year in template"),
        },
        None => {}
    }

    if let Some(months) = lookup(year_mode, "months") {
        match Month::parse_list(&months.as_text()) {
            Ok(m) => config.months = m,
            Err(e) => tracing::warn!("ignoring month list in template: {e}"),
        }
    }

    if let Some(name_idx) = header_index(project_filter, "Project Name") {
        let include_idx = header_index(project_filter, "Include");
        for row in &project_filter.rows {
            let name = row.get(name_idx).map(RawValue::as_text).unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            let include = include_idx
                .and_then(|i| row.get(i))
                .map(|c| c.as_text().eq_ignore_ascii_case("yes"))
                .unwrap_or(false);
            config.projects.push(ProjectFilterEntry { name, include });
        }
    }

    config
}
