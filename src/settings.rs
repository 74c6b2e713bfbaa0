use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

const DEFAULT_PALETTE: &[&str] = &[
    "#4472C4", "#ED7D31", "#A5A5A5", "#FFC000", "#5B9BD5", "#70AD47", "#264478", "#9E480E",
];

/// Chart appearance shared by the workbook and document renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

fn default_font() -> String {
    "Helvetica".to_string()
}

fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            font: default_font(),
            palette: default_palette(),
        }
    }
}

impl ChartStyle {
    /// Palette entry `i` (cycling) as RGB. Malformed entries fall back to the
    /// built-in palette.
    pub fn color(&self, i: usize) -> (u8, u8, u8) {
        let pick = |palette: &[String]| {
            if palette.is_empty() {
                None
            } else {
                parse_hex(&palette[i % palette.len()])
            }
        };
        pick(&self.palette)
            .or_else(|| pick(&default_palette()))
            .unwrap_or((0x44, 0x72, 0xC4))
    }

    /// Palette entry `i` as a `0xRRGGBB` value.
    pub fn color_hex(&self, i: usize) -> u32 {
        let (r, g, b) = self.color(i);
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }
}

fn parse_hex(raw: &str) -> Option<(u8, u8, u8)> {
    let s = raw.trim().trim_start_matches('#');
    if s.len() != 6 || !s.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub output_dir: String,
    #[serde(default = "default_report_title")]
    pub report_title: String,
    #[serde(default)]
    pub chart: ChartStyle,
}

fn default_report_title() -> String {
    "Time Report".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir().to_string_lossy().to_string(),
            report_title: default_report_title(),
            chart: ChartStyle::default(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("timereport")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("timereport")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Settings at `path`, or defaults when the file is missing or unreadable.
pub fn load_settings_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "ignoring malformed settings: {e}");
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ReportError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("settings.json");
        let settings = Settings {
            output_dir: "/tmp/reports".to_string(),
            report_title: "Team Hours".to_string(),
            chart: ChartStyle {
                font: "Times".to_string(),
                palette: vec!["#112233".to_string()],
            },
        };
        save_settings_to(&settings, &path).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let s = load_settings_from(Path::new("/nowhere/settings.json"));
        assert_eq!(s.report_title, "Time Report");
        assert_eq!(s.chart.font, "Helvetica");
        assert!(!s.output_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"output_dir": "/tmp/out"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.output_dir, "/tmp/out");
        assert_eq!(s.report_title, "Time Report");
        assert_eq!(s.chart.palette.len(), DEFAULT_PALETTE.len());
    }

    #[test]
    fn test_malformed_settings_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn test_palette_colors() {
        let style = ChartStyle {
            font: default_font(),
            palette: vec!["#FF0000".into(), "bogus".into()],
        };
        assert_eq!(style.color(0), (255, 0, 0));
        assert_eq!(style.color(2), (255, 0, 0));
        // malformed entry falls back to the built-in palette slot
        assert_eq!(style.color(1), (0xED, 0x7D, 0x31));
        assert_eq!(style.color_hex(0), 0xFF0000);
    }

    #[test]
    fn test_shellexpand_path() {
        assert_eq!(shellexpand_path("/abs/dir"), "/abs/dir");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(shellexpand_path("~/x"), format!("{}/x", home.to_string_lossy()));
        }
    }
}
