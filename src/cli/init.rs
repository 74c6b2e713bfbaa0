use colored::Colorize;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path, Settings};

/// Apply `init` flags on top of existing settings.
pub fn apply(
    mut settings: Settings,
    output_dir: Option<String>,
    title: Option<String>,
    font: Option<String>,
) -> Settings {
    if let Some(dir) = output_dir {
        settings.output_dir = shellexpand_path(&dir);
    }
    if let Some(title) = title {
        settings.report_title = title;
    }
    if let Some(font) = font {
        settings.chart.font = font;
    }
    settings
}

pub fn run(output_dir: Option<String>, title: Option<String>, font: Option<String>) -> Result<()> {
    let settings = apply(load_settings(), output_dir, title, font);
    std::fs::create_dir_all(&settings.output_dir)?;
    save_settings(&settings)?;
    println!("Settings saved to {}", settings_path().display().to_string().green());
    println!("Reports will be written to {}", settings.output_dir);
    Ok(())
}
