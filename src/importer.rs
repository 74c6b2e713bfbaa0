use std::path::Path;

use crate::config::{parse_template_config, StandardConfig};
use crate::error::{ReportError, Result};
use crate::models::{RawTable, RawValue};

pub const RAW_DATA_SHEET: &str = "Raw Data";
pub const YEAR_MODE_SHEET: &str = "Config_Year_Mode";
pub const PROJECT_FILTER_SHEET: &str = "Config_Project_Filter";

// ---------------------------------------------------------------------------
// Input kinds, picked by file extension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputKind {
    Csv,
    #[cfg(feature = "xlsx")]
    Workbook,
}

impl InputKind {
    pub fn detect(file_path: &Path) -> Result<InputKind> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            #[cfg(feature = "xlsx")]
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(Self::Workbook),
            _ => Err(ReportError::UnsupportedInput(file_path.display().to_string())),
        }
    }
}

/// Raw data plus whatever template configuration the file carries.
#[derive(Debug, Clone, Default)]
pub struct Input {
    pub raw: RawTable,
    pub year_mode: Option<RawTable>,
    pub project_filter: Option<RawTable>,
}

impl Input {
    /// Standard configuration from the template sheets, defaults otherwise.
    pub fn template_config(&self) -> StandardConfig {
        let empty = RawTable::default();
        parse_template_config(
            self.year_mode.as_ref().unwrap_or(&empty),
            self.project_filter.as_ref().unwrap_or(&empty),
        )
    }
}

pub fn load_input(file_path: &Path) -> Result<Input> {
    let input = match InputKind::detect(file_path)? {
        InputKind::Csv => Input {
            raw: read_csv(file_path)?,
            ..Input::default()
        },
        #[cfg(feature = "xlsx")]
        InputKind::Workbook => read_workbook(file_path)?,
    };
    tracing::info!(
        path = %file_path.display(),
        rows = input.raw.rows.len(),
        columns = input.raw.headers.len(),
        "loaded raw data"
    );
    Ok(input)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn csv_cell(raw: &str) -> RawValue {
    let s = raw.trim();
    if s.is_empty() {
        RawValue::Empty
    } else {
        RawValue::Text(s.to_string())
    }
}

/// Read a CSV file whose first row is the header. Short rows are padded with
/// empty cells.
pub fn read_csv(file_path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(file));
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let mut row: Vec<RawValue> = record.iter().map(csv_cell).collect();
        row.resize(headers.len().max(row.len()), RawValue::Empty);
        rows.push(row);
    }
    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Workbooks
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn excel_serial_to_datetime(serial: f64) -> Option<chrono::NaiveDateTime> {
    let date = crate::normalize::excel_serial_to_date(serial)?;
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(chrono::Duration::seconds(seconds))
}

#[cfg(feature = "xlsx")]
fn data_to_raw(cell: &calamine::Data) -> RawValue {
    use calamine::Data;
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            if s.trim().is_empty() {
                RawValue::Empty
            } else {
                RawValue::Text(s.clone())
            }
        }
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Float(f) => RawValue::Number(*f),
        Data::Bool(b) => RawValue::Text(if *b { "Yes" } else { "No" }.to_string()),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(RawValue::DateTime)
            .unwrap_or(RawValue::Number(dt.as_f64())),
    }
}

#[cfg(feature = "xlsx")]
fn range_to_table(range: &calamine::Range<calamine::Data>) -> RawTable {
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(|c| data_to_raw(c).as_text()).collect())
        .unwrap_or_default();
    let rows = rows
        .filter(|r| r.iter().any(|c| !matches!(c, calamine::Data::Empty)))
        .map(|r| r.iter().map(data_to_raw).collect())
        .collect();
    RawTable { headers, rows }
}

/// Read the `Raw Data` sheet (or the first sheet) and the optional template
/// configuration sheets.
#[cfg(feature = "xlsx")]
pub fn read_workbook(file_path: &Path) -> Result<Input> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)?;
    let names = workbook.sheet_names();
    let data_sheet = names
        .iter()
        .find(|n| n.as_str() == RAW_DATA_SHEET)
        .or_else(|| names.first())
        .cloned()
        .ok_or_else(|| ReportError::UnsupportedInput(format!("{}: no sheets", file_path.display())))?;
    if data_sheet != RAW_DATA_SHEET {
        tracing::warn!(sheet = %data_sheet, "no '{RAW_DATA_SHEET}' sheet; reading the first sheet");
    }
    let raw = range_to_table(&workbook.worksheet_range(&data_sheet)?);

    let mut optional = |name: &str| -> Result<Option<RawTable>> {
        if names.iter().any(|n| n == name) {
            Ok(Some(range_to_table(&workbook.worksheet_range(name)?)))
        } else {
            Ok(None)
        }
    };
    let year_mode = optional(YEAR_MODE_SHEET)?;
    let project_filter = optional(PROJECT_FILTER_SHEET)?;

    Ok(Input {
        raw,
        year_mode,
        project_filter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_detect_input_kind() {
        assert_eq!(InputKind::detect(Path::new("a/b.CSV")).unwrap(), InputKind::Csv);
        assert!(InputKind::detect(Path::new("notes.txt")).is_err());
        assert!(InputKind::detect(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_read_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "time.csv",
            "Date,Team member,Project Name,Task,Hou\n\
             2024-01-02,Ann,Alpha,Design,\"1,5\"\n\
             ,,,,\n\
             2024-01-03,Bob,Beta\n",
        );
        let table = read_csv(&path).unwrap();
        assert_eq!(table.headers, vec!["Date", "Team member", "Project Name", "Task", "Hou"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][2], RawValue::Text("Alpha".into()));
        assert_eq!(table.rows[1].len(), 5);
        assert_eq!(table.rows[1][4], RawValue::Empty);

        let records = crate::normalize::normalize(&table);
        assert_eq!(records.len(), 2);
        assert_eq!(records.records[0].project, "Alpha");
        assert_eq!(records.records[0].hours, 0.0);
    }

    #[test]
    fn test_load_input_csv_has_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "t.csv", "Date,Project name,Hours\n2024-01-02,A,3\n");
        let input = load_input(&path).unwrap();
        assert_eq!(input.raw.rows.len(), 1);
        assert!(input.year_mode.is_none());
        let config = input.template_config();
        assert!(config.projects.is_empty());
    }

    #[test]
    fn test_load_input_missing_file() {
        let err = load_input(Path::new("/definitely/missing.csv")).err().unwrap();
        assert!(matches!(err, ReportError::Io(_)));
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_read_workbook_with_template_sheets() {
        use rust_xlsxwriter::Workbook;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.xlsx");
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.set_name(RAW_DATA_SHEET).unwrap();
        ws.write_string(0, 0, "Date").unwrap();
        ws.write_string(0, 1, "Project Name").unwrap();
        ws.write_string(0, 2, "Hours").unwrap();
        ws.write_string(1, 0, "2024-03-01").unwrap();
        ws.write_string(1, 1, "Alpha").unwrap();
        ws.write_number(1, 2, 4.5).unwrap();

        let ws = wb.add_worksheet();
        ws.set_name(YEAR_MODE_SHEET).unwrap();
        ws.write_string(0, 0, "Key").unwrap();
        ws.write_string(0, 1, "Value").unwrap();
        ws.write_string(1, 0, "mode").unwrap();
        ws.write_string(1, 1, "month").unwrap();
        ws.write_string(2, 0, "year").unwrap();
        ws.write_number(2, 1, 2024).unwrap();

        let ws = wb.add_worksheet();
        ws.set_name(PROJECT_FILTER_SHEET).unwrap();
        ws.write_string(0, 0, "Project Name").unwrap();
        ws.write_string(0, 1, "Include").unwrap();
        ws.write_string(1, 0, "Alpha").unwrap();
        ws.write_string(1, 1, "yes").unwrap();
        wb.save(&path).unwrap();

        let input = load_input(&path).unwrap();
        assert_eq!(input.raw.headers, vec!["Date", "Project Name", "Hours"]);
        assert_eq!(input.raw.rows[0][2], RawValue::Number(4.5));
        let config = input.template_config();
        assert_eq!(config.mode, crate::config::StandardMode::Month);
        assert_eq!(config.year, 2024);
        assert_eq!(config.projects.len(), 1);
        assert!(config.projects[0].include);
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_excel_serial_to_datetime() {
        let dt = excel_serial_to_datetime(45292.5).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-01-01 12:00");
    }
}
