use std::path::Path;

use color_eyre::eyre::Result;
use owo_colors::OwoColorize;

use locsync_core::LocaleId;
use locsync_services::diff_report;

pub fn run(
    root: &Path,
    config: Option<&Path>,
    targets: &[String],
    use_color: bool,
    json: bool,
) -> Result<()> {
    let cfg = match config {
        Some(path) => locsync_config::load_config_at(path)?,
        None => locsync_config::load_config(root)?,
    };
    let targets: Vec<LocaleId> = targets.iter().map(|t| LocaleId::new(t.clone())).collect();
    let reports = diff_report(root, &cfg, &targets)?;

    if json {
        println!("{}", serde_json::to_string(&reports)?);
        return Ok(());
    }

    for report in &reports {
        if use_color {
            println!("{}", report.locale.bold());
        } else {
            println!("{}", report.locale);
        }
        for file in &report.files {
            if let Some(error) = &file.error {
                let line = format!("  {}: {error}", file.path);
                if use_color {
                    eprintln!("{}", line.yellow());
                } else {
                    eprintln!("{line}");
                }
                continue;
            }
            println!(
                "  {}: {} added, {} changed, {} removed, {} up to date",
                file.path,
                file.added.len(),
                file.changed.len(),
                file.removed.len(),
                file.unchanged
            );
            for key in &file.added {
                println!("    + {key}");
            }
            for key in &file.changed {
                println!("    ~ {key}");
            }
            for key in &file.removed {
                println!("    - {key}");
            }
        }
    }
    Ok(())
}
