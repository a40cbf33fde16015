//! Translation provider boundary: an async capability that turns a batch of
//! source strings into per-unit results. Providers are network-bound,
//! rate-limited and occasionally unavailable; the orchestrator decides what
//! to retry based on [`ProviderError::is_transient`].

use async_trait::async_trait;

use locsync_core::LocaleId;

pub mod backoff;
mod openai;
mod pseudo;

pub use openai::OpenAiProvider;
pub use pseudo::PseudoProvider;

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("provider rate limited")]
    RateLimited,
    #[error("provider request timed out")]
    Timeout,
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),
    #[error("unknown provider {0:?}")]
    UnknownProvider(String),
}

impl ProviderError {
    /// Transient failures are retried with backoff; the rest degrade to
    /// per-unit failures immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::RateLimited | ProviderError::Timeout | ProviderError::Unavailable(_) => {
                true
            }
            ProviderError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// One unit of a provider batch; `key` is an opaque request-scoped
/// identifier, used only to match responses back to requests. Callers must
/// pick keys that are unique within the batch.
#[derive(Debug, Clone)]
pub struct ProviderUnit {
    pub key: String,
    pub source_text: String,
}

/// Per-unit outcome of a batch call.
#[derive(Debug, Clone)]
pub enum UnitOutcome {
    Translated { key: String, text: String },
    Failed { key: String, reason: String },
}

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Translate one batch. `Err` means the whole batch failed (possibly
    /// transiently); `Ok` carries one outcome per unit the provider could
    /// answer for. Units missing from the response are treated as failed by
    /// the caller.
    async fn translate(
        &self,
        batch: &[ProviderUnit],
        source: &LocaleId,
        target: &LocaleId,
    ) -> Result<Vec<UnitOutcome>, ProviderError>;
}

/// Resolve the provider named in the config's `llm.provider` field.
pub fn create_provider(
    provider: &str,
    model: &str,
    base_url: Option<&str>,
    api_key_env: Option<&str>,
) -> Result<Box<dyn TranslationProvider>, ProviderError> {
    match provider {
        "openai" => Ok(Box::new(OpenAiProvider::new(model, base_url, api_key_env)?)),
        "pseudo" => Ok(Box::new(PseudoProvider)),
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}
