//! End-to-end pipeline: source load → per-target diff / translate / merge,
//! with target locales running in parallel under a bounded worker count.
//!
//! Per-unit and per-file problems are collected into the run summary; only
//! configuration errors and total provider unavailability fail the run.

use std::collections::HashMap;
use std::path::Path;

use futures::{stream, StreamExt};
use tracing::{info, warn};

use locsync_config::SyncConfig;
use locsync_core::{KeyPath, LocaleId, TranslationUnit};
use locsync_domain::{
    FileDiffReport, FileSyncStat, LocaleDiffReport, LocaleSyncStat, SyncSummary, UnitIssue,
    SCHEMA_VERSION,
};
use locsync_formats::adapter_for;
use locsync_provider::TranslationProvider;
use locsync_store::FingerprintStore;

use crate::loader::{self, LocaleFile};
use crate::orchestrator::{self, FailureKind};
use crate::{diff, extract, merge, SyncError};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
    /// Restrict the run to these target locales (all when empty).
    pub targets: Vec<LocaleId>,
}

/// Run the full pipeline for every (selected) target locale.
pub async fn run_sync(
    root: &Path,
    cfg: &SyncConfig,
    provider: &dyn TranslationProvider,
    opts: &SyncOptions,
) -> Result<SyncSummary, SyncError> {
    let (source_files, group_errors) = loader::load_source_locale(root, cfg)?;
    let mut issues: Vec<UnitIssue> = group_errors
        .iter()
        .map(|e| UnitIssue {
            locale: cfg.locale.source.to_string(),
            path: String::new(),
            key: String::new(),
            kind: "missing-source-file".into(),
            message: e.to_string(),
        })
        .collect();

    let targets: Vec<&LocaleId> = cfg
        .locale
        .targets
        .iter()
        .filter(|t| opts.targets.is_empty() || opts.targets.contains(t))
        .collect();

    let mut runs = stream::iter(
        targets
            .iter()
            .copied()
            .map(|target| sync_locale(root, cfg, provider, &source_files, target, opts.dry_run)),
    )
    .buffer_unordered(cfg.sync.max_parallel_locales.max(1));

    let mut locales = Vec::with_capacity(targets.len());
    let mut provider_calls = 0usize;
    let mut attempted = 0usize;
    let mut accepted = 0usize;
    let mut exhausted = 0usize;
    while let Some(run) = runs.next().await {
        provider_calls += run.provider_calls;
        attempted += run.attempted;
        accepted += run.accepted;
        exhausted += run.exhausted;
        issues.extend(run.issues);
        locales.push(run.stat);
    }
    locales.sort_by(|a, b| a.locale.cmp(&b.locale));

    // Nothing got through and every pending unit died on a transient
    // provider error: the provider is down, fail the run.
    if !opts.dry_run && attempted > 0 && accepted == 0 && exhausted == attempted {
        return Err(SyncError::ProviderUnavailable);
    }

    info!(
        locales = locales.len(),
        translated = accepted,
        provider_calls,
        "sync finished"
    );
    Ok(SyncSummary {
        schema_version: SCHEMA_VERSION,
        mode: if opts.dry_run { "dry-run" } else { "sync" }.into(),
        source_locale: cfg.locale.source.to_string(),
        locales,
        issues,
        provider_calls,
    })
}

struct LocaleRun {
    stat: LocaleSyncStat,
    issues: Vec<UnitIssue>,
    provider_calls: usize,
    attempted: usize,
    accepted: usize,
    exhausted: usize,
}

async fn sync_locale(
    root: &Path,
    cfg: &SyncConfig,
    provider: &dyn TranslationProvider,
    source_files: &[LocaleFile],
    target: &LocaleId,
    dry_run: bool,
) -> LocaleRun {
    let mut run = LocaleRun {
        stat: LocaleSyncStat {
            locale: target.to_string(),
            files: Vec::new(),
            translated: 0,
            removed: 0,
            failed: 0,
        },
        issues: Vec::new(),
        provider_calls: 0,
        attempted: 0,
        accepted: 0,
        exhausted: 0,
    };

    let mut store = match FingerprintStore::load(root, target) {
        Ok(store) => store,
        Err(e) => {
            run.issues.push(UnitIssue {
                locale: target.to_string(),
                path: String::new(),
                key: String::new(),
                kind: "store-error".into(),
                message: e.to_string(),
            });
            return run;
        }
    };

    for source_file in source_files {
        match sync_file(root, cfg, provider, source_file, target, dry_run, &mut store, &mut run)
            .await
        {
            Ok(()) => {}
            Err(e) => {
                // Merge/write failure aborts this locale; the store still
                // holds only commits for files that were written, so saving
                // below is safe and pending units retry next run.
                warn!(locale = %target, "aborting locale: {e}");
                run.issues.push(UnitIssue {
                    locale: target.to_string(),
                    path: source_file.rel_path.clone(),
                    key: String::new(),
                    kind: "merge-write-failed".into(),
                    message: e.to_string(),
                });
                run.stat.files.push(FileSyncStat {
                    path: source_file.rel_path.clone(),
                    status: "failed".into(),
                    translated: 0,
                    removed: 0,
                    unchanged: 0,
                });
                break;
            }
        }
    }

    if store.is_dirty() {
        if let Err(e) = store.save() {
            run.issues.push(UnitIssue {
                locale: target.to_string(),
                path: String::new(),
                key: String::new(),
                kind: "store-error".into(),
                message: e.to_string(),
            });
        }
    }
    run
}

#[allow(clippy::too_many_arguments)]
async fn sync_file(
    root: &Path,
    cfg: &SyncConfig,
    provider: &dyn TranslationProvider,
    source_file: &LocaleFile,
    target: &LocaleId,
    dry_run: bool,
    store: &mut FingerprintStore,
    run: &mut LocaleRun,
) -> Result<(), SyncError> {
    let adapter = adapter_for(&source_file.group)?;
    let target_file = match loader::target_file_for(root, source_file, &cfg.locale.source, target) {
        Ok(f) => f,
        Err(e) => {
            // Unparsable target file: report and leave it alone rather than
            // clobbering it.
            run.issues.push(UnitIssue {
                locale: target.to_string(),
                path: source_file.rel_path.clone(),
                key: String::new(),
                kind: "target-parse-failed".into(),
                message: e.to_string(),
            });
            run.stat.files.push(FileSyncStat {
                path: source_file.rel_path.clone(),
                status: "failed".into(),
                translated: 0,
                removed: 0,
                unchanged: 0,
            });
            return Ok(());
        }
    };

    let source_units = extract::extract_units(&source_file.tree);
    let records = store.records_for(&target_file.rel_path);
    let file_diff = diff::classify(&source_units, &target_file.tree, &records);
    let pending_count = file_diff.added.len() + file_diff.changed.len();

    if dry_run {
        run.stat.translated += pending_count;
        run.stat.removed += file_diff.removed.len();
        run.stat.files.push(FileSyncStat {
            path: target_file.rel_path.clone(),
            status: "planned".into(),
            translated: pending_count,
            removed: file_diff.removed.len(),
            unchanged: file_diff.unchanged.len(),
        });
        return Ok(());
    }

    let mut pending = file_diff.added;
    pending.extend(file_diff.changed);
    run.attempted += pending.len();

    let outcome =
        orchestrator::translate_units(provider, pending, &cfg.locale.source, target, &cfg.sync)
            .await;
    run.provider_calls += outcome.provider_calls;
    run.accepted += outcome.accepted.len();
    run.exhausted += outcome
        .failed
        .iter()
        .filter(|f| f.kind == FailureKind::ProviderExhausted)
        .count();
    run.stat.failed += outcome.failed.len();
    for failure in &outcome.failed {
        run.issues.push(UnitIssue {
            locale: target.to_string(),
            path: target_file.rel_path.clone(),
            key: failure.key_path.to_string(),
            kind: failure.kind.as_str().into(),
            message: failure.message.clone(),
        });
    }

    if outcome.accepted.is_empty() && file_diff.removed.is_empty() {
        run.stat.files.push(FileSyncStat {
            path: target_file.rel_path.clone(),
            status: "skipped".into(),
            translated: 0,
            removed: 0,
            unchanged: file_diff.unchanged.len(),
        });
        return Ok(());
    }

    // Accepted units arrive in batch-completion order; restore source order
    // so appended keys match the source file's key order.
    let position: HashMap<&KeyPath, usize> = source_units
        .iter()
        .enumerate()
        .map(|(i, u)| (&u.key_path, i))
        .collect();
    let mut accepted = outcome.accepted;
    accepted.sort_by_key(|a| position.get(&a.unit.key_path).copied().unwrap_or(usize::MAX));

    let mut tree = target_file.tree.clone();
    merge::apply_to_tree(&mut tree, &accepted, &file_diff.removed);
    let write_outcome = merge::write_back(adapter, &target_file.abs_path, &tree)?;

    // Write-back succeeded; only now do fingerprint records move.
    for a in &accepted {
        store.upsert(
            &target_file.rel_path,
            a.unit.key_path.clone(),
            a.unit.fingerprint.clone(),
            locsync_core::fingerprint(&a.text),
        );
    }
    for key_path in &file_diff.removed {
        store.remove(&target_file.rel_path, key_path);
    }

    run.stat.translated += accepted.len();
    run.stat.removed += file_diff.removed.len();
    run.stat.files.push(FileSyncStat {
        path: target_file.rel_path.clone(),
        status: write_outcome.as_str().into(),
        translated: accepted.len(),
        removed: file_diff.removed.len(),
        unchanged: file_diff.unchanged.len(),
    });
    Ok(())
}

/// Diff classification for the selected target locales, without touching the
/// provider or writing anything.
pub fn diff_report(
    root: &Path,
    cfg: &SyncConfig,
    targets: &[LocaleId],
) -> Result<Vec<LocaleDiffReport>, SyncError> {
    let (source_files, group_errors) = loader::load_source_locale(root, cfg)?;
    for e in &group_errors {
        warn!("{e}");
    }

    let mut reports = Vec::new();
    for target in cfg
        .locale
        .targets
        .iter()
        .filter(|t| targets.is_empty() || targets.contains(t))
    {
        let store = FingerprintStore::load(root, target)?;
        let mut files = Vec::new();
        for source_file in &source_files {
            // An unreadable target file spoils only its own report entry.
            let target_file =
                match loader::target_file_for(root, source_file, &cfg.locale.source, target) {
                    Ok(f) => f,
                    Err(e) => {
                        warn!(path = %source_file.rel_path, "cannot diff target file: {e}");
                        files.push(FileDiffReport {
                            path: loader::retarget_rel_path(
                                &source_file.rel_path,
                                &cfg.locale.source,
                                target,
                            ),
                            error: Some(e.to_string()),
                            ..FileDiffReport::default()
                        });
                        continue;
                    }
                };
            let source_units: Vec<TranslationUnit> = extract::extract_units(&source_file.tree);
            let records = store.records_for(&target_file.rel_path);
            let d = diff::classify(&source_units, &target_file.tree, &records);
            files.push(FileDiffReport {
                path: target_file.rel_path,
                added: d.added.iter().map(|u| u.key_path.to_string()).collect(),
                changed: d.changed.iter().map(|u| u.key_path.to_string()).collect(),
                removed: d.removed.iter().map(|k| k.to_string()).collect(),
                unchanged: d.unchanged.len(),
                error: None,
            });
        }
        reports.push(LocaleDiffReport {
            schema_version: SCHEMA_VERSION,
            locale: target.to_string(),
            files,
        });
    }
    Ok(reports)
}
