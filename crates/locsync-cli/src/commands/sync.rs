use std::path::Path;

use color_eyre::eyre::Result;
use owo_colors::OwoColorize;
use tracing::debug;

use locsync_core::LocaleId;
use locsync_domain::SyncSummary;
use locsync_provider::create_provider;
use locsync_services::{run_sync, SyncOptions};

pub async fn run(
    root: &Path,
    config: Option<&Path>,
    dry_run: bool,
    targets: &[String],
    use_color: bool,
    json: bool,
) -> Result<()> {
    let cfg = match config {
        Some(path) => locsync_config::load_config_at(path)?,
        None => locsync_config::load_config(root)?,
    };
    debug!(source = %cfg.locale.source, targets = cfg.locale.targets.len(), "config loaded");

    let provider = create_provider(
        &cfg.llm.provider,
        &cfg.llm.model,
        cfg.llm.base_url.as_deref(),
        cfg.llm.api_key_env.as_deref(),
    )?;

    let opts = SyncOptions {
        dry_run,
        targets: targets.iter().map(|t| LocaleId::new(t.clone())).collect(),
    };
    let summary = run_sync(root, &cfg, provider.as_ref(), &opts).await?;

    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        print_summary(&summary, use_color);
    }
    Ok(())
}

fn print_summary(summary: &SyncSummary, use_color: bool) {
    for locale in &summary.locales {
        let header = format!(
            "{} — {} translated, {} removed, {} failed",
            locale.locale, locale.translated, locale.removed, locale.failed
        );
        if use_color {
            println!("{}", header.bold());
        } else {
            println!("{header}");
        }
        for file in &locale.files {
            println!(
                "  {} [{}] +{} -{} ={}",
                file.path, file.status, file.translated, file.removed, file.unchanged
            );
        }
    }
    for issue in &summary.issues {
        let line = format!(
            "[{}] {} {} — {}",
            issue.kind, issue.locale, issue.key, issue.message
        );
        if use_color {
            eprintln!("{}", line.yellow());
        } else {
            eprintln!("{line}");
        }
    }
    let footer = format!(
        "{} {}: {} unit(s) translated, {} provider call(s)",
        if summary.total_failed() == 0 { "✔" } else { "⚠" },
        summary.mode,
        summary.total_translated(),
        summary.provider_calls
    );
    if use_color {
        println!("{}", footer.green());
    } else {
        println!("{footer}");
    }
}
