use crate::config::{FilterConfig, YearFilter};
use crate::models::{RecordSet, TimeRecord};

fn keep(record: &TimeRecord, config: &FilterConfig) -> bool {
    let year_ok = match &config.years {
        YearFilter::None => true,
        YearFilter::Single(y) => record.year == *y,
        YearFilter::AnyOf(years) => years.contains(&record.year),
    };
    let month_ok = config.months.is_empty() || config.months.contains(&record.month);
    let project_ok = config.projects.iter().any(|p| p.name == record.project);
    year_ok && month_ok && project_ok
}

/// Apply year, month and project allow-list filters. An empty allow-list
/// selects nothing. The Include flag plays no part here.
pub fn filter(records: &RecordSet, config: &FilterConfig) -> RecordSet {
    if config.projects.is_empty() {
        return records.with_records(Vec::new());
    }
    let kept: Vec<TimeRecord> = records
        .records
        .iter()
        .filter(|r| keep(r, config))
        .cloned()
        .collect();
    tracing::debug!(before = records.len(), after = kept.len(), "filtered records");
    records.with_records(kept)
}
