use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TIMESHEET: &str = "\
Date,Team member,Project name,Task,Workcentre,Hours
2024-01-08,Ann,Alpha,Design,Studio,4
2024-01-09,Ann,Alpha,Build,Studio,3.5
2024-01-15,Bo,Beta,Design,Office,2
2024-02-05,Bo,Beta,Review,Office,6
2024-02-06,Ann,Alpha,Build,Studio,1.5
2023-03-01,Bo,Alpha,Design,Studio,5
not a date,Bo,Alpha,Design,Studio,9
";

struct Fixture {
    home: TempDir,
    input: PathBuf,
}

impl Fixture {
    fn new() -> Fixture {
        let home = TempDir::new().unwrap();
        let input = home.path().join("timesheet.csv");
        fs::write(&input, TIMESHEET).unwrap();
        Fixture { home, input }
    }

    fn out_dir(&self) -> PathBuf {
        self.home.path().join("out")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("timereport").unwrap();
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn files_with_ext(dir: &Path, ext: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(ext))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn standard_text_prints_monthly_totals() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["standard", "--input"])
        .arg(&fx.input)
        .args(["--mode", "month", "--year", "2024"])
        .args(["--project", "Alpha", "--project", "Beta"])
        .args(["--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hours by month"))
        .stdout(predicate::str::contains("January"))
        .stdout(predicate::str::contains("February"))
        .stdout(predicate::str::contains("Total hours: 17.0"))
        .stdout(predicate::str::contains("Skipped 1 rows"));
    assert!(files_with_ext(&fx.out_dir(), ".xlsx").is_empty());
}

#[test]
fn standard_without_projects_reports_empty_selection() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["standard", "--input"])
        .arg(&fx.input)
        .args(["--year", "2024", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The filtered data is empty"));
}

#[test]
fn standard_all_writes_workbook_and_pdf() {
    let fx = Fixture::new();
    let out = fx.out_dir();
    fx.cmd()
        .args(["standard", "--input"])
        .arg(&fx.input)
        .args(["--year", "2024", "--project", "Alpha", "--project", "Beta"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let xlsx = files_with_ext(&out, ".xlsx");
    let pdf = files_with_ext(&out, ".pdf");
    assert_eq!(xlsx.len(), 1);
    assert_eq!(pdf.len(), 1);
    assert!(xlsx[0].starts_with("Time_report_Standard_"));
    assert!(fs::read(out.join(&xlsx[0])).unwrap().starts_with(b"PK"));
    assert!(fs::read(out.join(&pdf[0])).unwrap().starts_with(b"%PDF"));
}

#[test]
fn compare_projects_in_year_writes_tagged_files() {
    let fx = Fixture::new();
    let out = fx.out_dir();
    fx.cmd()
        .args(["compare", "--input"])
        .arg(&fx.input)
        .args(["--mode", "projects-in-year", "--year", "2024"])
        .args(["--project", "Alpha", "--project", "Beta"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Hours by project in 2024"))
        .stdout(predicate::str::contains("Total"));

    let xlsx = files_with_ext(&out, ".xlsx");
    assert_eq!(xlsx.len(), 1);
    assert!(xlsx[0].ends_with("_Year.xlsx"));
    assert_eq!(files_with_ext(&out, "_Year.pdf").len(), 1);
}

#[test]
fn compare_single_project_over_years() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["compare", "--input"])
        .arg(&fx.input)
        .args(["--mode", "project-over-time", "--year", "2023", "--year", "2024"])
        .args(["--project", "Alpha", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Hours for Alpha"))
        .stdout(predicate::str::contains("2023"));
}

#[test]
fn compare_rejects_single_project_in_month_mode() {
    let fx = Fixture::new();
    let out = fx.out_dir();
    fx.cmd()
        .args(["compare", "--input"])
        .arg(&fx.input)
        .args(["--mode", "projects-in-month", "--year", "2024", "--month", "jan"])
        .args(["--project", "Alpha"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("at least two projects"));
    assert!(files_with_ext(&out, ".xlsx").is_empty());
}

#[test]
fn compare_unknown_mode_fails() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["compare", "--input"])
        .arg(&fx.input)
        .args(["--mode", "sideways", "--project", "Alpha"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn missing_input_fails() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["inspect", "--input"])
        .arg(fx.home.path().join("nope.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn inspect_summarizes_file() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["inspect", "--input"])
        .arg(&fx.input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Records kept:   6"))
        .stdout(predicate::str::contains("Alpha"))
        .stdout(predicate::str::contains("Beta"));
}

#[test]
fn init_writes_settings() {
    let fx = Fixture::new();
    let out = fx.home.path().join("reports");
    fx.cmd()
        .args(["init", "--title", "Studio hours", "--output-dir"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings saved"));

    let path = fx.home.path().join(".config/timereport/settings.json");
    let saved = fs::read_to_string(path).unwrap();
    assert!(saved.contains("Studio hours"));
    assert!(out.is_dir());
}
