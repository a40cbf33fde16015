use async_trait::async_trait;

use locsync_core::LocaleId;

use crate::{ProviderError, ProviderUnit, TranslationProvider, UnitOutcome};

/// Offline pseudo-localization provider: wraps each string in `⟦…⟧` and
/// leaves placeholder tokens verbatim. Useful for exercising the full
/// pipeline (and CI) without network access or API keys.
pub struct PseudoProvider;

pub fn pseudo_localize(text: &str) -> String {
    format!("\u{27e6}{text}\u{27e7}")
}

#[async_trait]
impl TranslationProvider for PseudoProvider {
    fn name(&self) -> &'static str {
        "pseudo"
    }

    async fn translate(
        &self,
        batch: &[ProviderUnit],
        _source: &LocaleId,
        _target: &LocaleId,
    ) -> Result<Vec<UnitOutcome>, ProviderError> {
        Ok(batch
            .iter()
            .map(|u| UnitOutcome::Translated {
                key: u.key.clone(),
                text: pseudo_localize(&u.source_text),
            })
            .collect())
    }
}
