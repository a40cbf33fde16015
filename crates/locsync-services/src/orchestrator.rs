//! Translation orchestrator: batches pending units, dispatches them to the
//! provider under a concurrency bound, retries transient failures with
//! exponential backoff and runs the acceptance check on every returned unit.
//!
//! Partial failure never aborts a run: exhausted or rejected units become
//! per-unit failures and stay pending (their fingerprint records are left
//! untouched), so the next run picks them up again.

use std::collections::HashMap;

use futures::{stream, StreamExt};
use tracing::{debug, warn};

use locsync_core::{placeholders::extract_placeholders, KeyPath, LocaleId, TranslationUnit};
use locsync_config::SyncPolicy;
use locsync_provider::{backoff, ProviderUnit, TranslationProvider, UnitOutcome};

/// A translated unit that passed the acceptance check.
#[derive(Debug, Clone)]
pub struct AcceptedUnit {
    pub unit: TranslationUnit,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Token set of the translation differs from the source; non-retryable
    /// within this run.
    PlaceholderMismatch,
    /// Provider returned an empty string.
    EmptyTranslation,
    /// Provider response did not mention this unit.
    MissingInResponse,
    /// Batch failed with a transient error and retries ran out.
    ProviderExhausted,
    /// Provider rejected the unit or batch permanently.
    ProviderRejected,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::PlaceholderMismatch => "placeholder-mismatch",
            FailureKind::EmptyTranslation => "empty-translation",
            FailureKind::MissingInResponse => "missing-in-response",
            FailureKind::ProviderExhausted => "provider-exhausted",
            FailureKind::ProviderRejected => "provider-failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FailedUnit {
    pub key_path: KeyPath,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct TranslationOutcome {
    pub accepted: Vec<AcceptedUnit>,
    pub failed: Vec<FailedUnit>,
    /// Provider round trips, including retries.
    pub provider_calls: usize,
}

/// Translate the Added ∪ Changed unit set for one target locale file.
/// Accepted units are collected as each batch completes; batch order is not
/// significant (the merger re-establishes source order).
pub async fn translate_units(
    provider: &dyn TranslationProvider,
    pending: Vec<TranslationUnit>,
    source: &LocaleId,
    target: &LocaleId,
    policy: &SyncPolicy,
) -> TranslationOutcome {
    let mut outcome = TranslationOutcome::default();
    if pending.is_empty() {
        return outcome;
    }

    let batch_size = policy.batch_size.max(1);
    let batches: Vec<Vec<TranslationUnit>> = pending
        .chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect();
    debug!(
        units = pending.len(),
        batches = batches.len(),
        %target,
        "translating pending units"
    );

    let mut results = stream::iter(
        batches
            .into_iter()
            .map(|batch| run_batch(provider, batch, source, target, policy)),
    )
    .buffer_unordered(policy.max_concurrent_batches.max(1));

    while let Some(batch_outcome) = results.next().await {
        outcome.accepted.extend(batch_outcome.accepted);
        outcome.failed.extend(batch_outcome.failed);
        outcome.provider_calls += batch_outcome.provider_calls;
    }
    outcome
}

async fn run_batch(
    provider: &dyn TranslationProvider,
    batch: Vec<TranslationUnit>,
    source: &LocaleId,
    target: &LocaleId,
    policy: &SyncPolicy,
) -> TranslationOutcome {
    let mut outcome = TranslationOutcome::default();
    // Wire keys are batch indices, not display paths: a flat key "a.b" and
    // the nested path a -> b dot-join to the same string, and the provider
    // can only echo back whatever key it was given.
    let request: Vec<ProviderUnit> = batch
        .iter()
        .enumerate()
        .map(|(i, u)| ProviderUnit {
            key: i.to_string(),
            source_text: u.source_text.clone(),
        })
        .collect();

    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    let unit_outcomes = loop {
        attempt += 1;
        outcome.provider_calls += 1;
        match provider.translate(&request, source, target).await {
            Ok(results) => break Some(results),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay =
                    backoff::exponential_with_jitter(attempt - 1, policy.backoff_base_ms, policy.backoff_max_ms);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient provider failure, backing off: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                let kind = if e.is_transient() {
                    FailureKind::ProviderExhausted
                } else {
                    FailureKind::ProviderRejected
                };
                warn!(units = batch.len(), "batch failed: {e}");
                for unit in &batch {
                    outcome.failed.push(FailedUnit {
                        key_path: unit.key_path.clone(),
                        kind,
                        message: e.to_string(),
                    });
                }
                break None;
            }
        }
    };

    let Some(unit_outcomes) = unit_outcomes else {
        return outcome;
    };

    let mut by_key: HashMap<String, UnitOutcome> = unit_outcomes
        .into_iter()
        .map(|o| {
            let key = match &o {
                UnitOutcome::Translated { key, .. } | UnitOutcome::Failed { key, .. } => key.clone(),
            };
            (key, o)
        })
        .collect();

    for (i, unit) in batch.into_iter().enumerate() {
        match by_key.remove(&i.to_string()) {
            Some(UnitOutcome::Translated { text, .. }) => match accept(&unit, &text) {
                Ok(()) => outcome.accepted.push(AcceptedUnit { unit, text }),
                Err(failure) => outcome.failed.push(failure),
            },
            Some(UnitOutcome::Failed { reason, .. }) => outcome.failed.push(FailedUnit {
                key_path: unit.key_path,
                kind: FailureKind::ProviderRejected,
                message: reason,
            }),
            None => outcome.failed.push(FailedUnit {
                key_path: unit.key_path,
                kind: FailureKind::MissingInResponse,
                message: "unit missing from provider response".into(),
            }),
        }
    }
    outcome
}

/// Acceptance check: non-empty text carrying exactly the source's
/// placeholder token set (order-insensitive).
fn accept(unit: &TranslationUnit, text: &str) -> Result<(), FailedUnit> {
    if text.trim().is_empty() {
        return Err(FailedUnit {
            key_path: unit.key_path.clone(),
            kind: FailureKind::EmptyTranslation,
            message: "provider returned an empty translation".into(),
        });
    }
    let translated = extract_placeholders(text);
    if translated != unit.placeholders {
        let missing: Vec<&str> = unit
            .placeholders
            .difference(&translated)
            .map(|s| s.as_str())
            .collect();
        let extra: Vec<&str> = translated
            .difference(&unit.placeholders)
            .map(|s| s.as_str())
            .collect();
        return Err(FailedUnit {
            key_path: unit.key_path.clone(),
            kind: FailureKind::PlaceholderMismatch,
            message: format!("missing {missing:?}, unexpected {extra:?}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(key: &str, text: &str) -> TranslationUnit {
        TranslationUnit::new(KeyPath(vec![key.to_string()]), text)
    }

    #[test]
    fn acceptance_rejects_missing_placeholder() {
        let u = unit("greeting", "Hello {name}");
        let err = accept(&u, "Hola").unwrap_err();
        assert_eq!(err.kind, FailureKind::PlaceholderMismatch);
    }

    #[test]
    fn acceptance_ignores_placeholder_order() {
        let u = unit("range", "{from} to {to}");
        assert!(accept(&u, "{to} desde {from}").is_ok());
    }

    #[test]
    fn acceptance_rejects_empty_text() {
        let u = unit("greeting", "Hello");
        let err = accept(&u, "   ").unwrap_err();
        assert_eq!(err.kind, FailureKind::EmptyTranslation);
    }

    #[tokio::test]
    async fn dotted_flat_key_does_not_collide_with_nested_path() {
        let flat = unit("a.b", "X");
        let nested = TranslationUnit::new(
            KeyPath(vec!["a".to_string(), "b".to_string()]),
            "Y",
        );
        let outcome = translate_units(
            &locsync_provider::PseudoProvider,
            vec![flat, nested],
            &LocaleId::from("en"),
            &LocaleId::from("es"),
            &SyncPolicy::default(),
        )
        .await;

        assert!(outcome.failed.is_empty(), "{:?}", outcome.failed);
        let by_source: HashMap<&str, &str> = outcome
            .accepted
            .iter()
            .map(|a| (a.unit.source_text.as_str(), a.text.as_str()))
            .collect();
        assert_eq!(by_source["X"], "\u{27e6}X\u{27e7}");
        assert_eq!(by_source["Y"], "\u{27e6}Y\u{27e7}");
    }
}
