use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::comparison::ComparisonKind;
use crate::error::{ReportError, Result};

pub fn standard_file_name(date: &str, ext: &str) -> String {
    format!("Time_report_Standard_{date}.{ext}")
}

pub fn comparison_file_name(date: &str, kind: ComparisonKind, ext: &str) -> String {
    format!("Time_report_Comparison_{date}_{}.{ext}", kind.file_tag())
}

pub fn today_stamp() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

/// Write through a temporary file in the destination directory so a failed
/// write never leaves a partial file at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| ReportError::Io(e.error))?;
    Ok(())
}

/// A deferred render plus the file it should land in.
pub struct ExportJob<'a> {
    pub label: &'static str,
    pub path: PathBuf,
    pub render: Box<dyn FnOnce() -> Result<Vec<u8>> + 'a>,
}

impl<'a> ExportJob<'a> {
    pub fn new(
        label: &'static str,
        path: PathBuf,
        render: impl FnOnce() -> Result<Vec<u8>> + 'a,
    ) -> Self {
        Self {
            label,
            path,
            render: Box::new(render),
        }
    }
}

/// Run every job. One failing export never skips the others; the result is
/// an error if any of them failed.
pub fn run_exports(jobs: Vec<ExportJob<'_>>) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let mut failed = Vec::new();
    for job in jobs {
        let outcome = (job.render)().and_then(|bytes| write_atomic(&job.path, &bytes));
        match outcome {
            Ok(()) => {
                tracing::info!(path = %job.path.display(), "{} export written", job.label);
                println!("Wrote {}", job.path.display().to_string().green());
                written.push(job.path);
            }
            Err(e) => {
                tracing::error!(path = %job.path.display(), "{} export failed: {e}", job.label);
                eprintln!("{} {} export failed: {e}", "!".red().bold(), job.label);
                failed.push(job.label);
            }
        }
    }
    if failed.is_empty() {
        Ok(written)
    } else {
        Err(ReportError::Other(format!("export failed: {}", failed.join(", "))))
    }
}

/// Stand-in render for a format this build was compiled without.
#[cfg(not(all(feature = "xlsx", feature = "pdf")))]
pub fn unsupported(format: &'static str) -> impl FnOnce() -> Result<Vec<u8>> {
    move || {
        Err(ReportError::Other(format!(
            "this build has no {format} support; rebuild with the '{format}' feature"
        )))
    }
}
