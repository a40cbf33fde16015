use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use locsync_core::LocaleId;

use crate::{ProviderError, ProviderUnit, TranslationProvider, UnitOutcome};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI-compatible chat-completions provider. The whole batch goes out as
/// one request carrying a JSON object of key -> source text; the model is
/// instructed to answer with the same object, values translated.
pub struct OpenAiProvider {
    client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(
        model: &str,
        base_url: Option<&str>,
        api_key_env: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let env_var = api_key_env.unwrap_or(DEFAULT_API_KEY_ENV);
        let api_key = std::env::var(env_var)
            .map_err(|_| ProviderError::MissingApiKey(env_var.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("locsync/cli")
            .build()?;
        Ok(OpenAiProvider {
            client,
            model: model.to_string(),
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn prompt(source: &LocaleId, target: &LocaleId) -> String {
        format!(
            "You are a professional software localizer. Translate the string values of \
             the given JSON object from locale \"{source}\" to locale \"{target}\". \
             Keep every placeholder token (like {{name}} or %s) exactly as in the source. \
             Reply with only a JSON object containing the same keys and the translated values."
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl TranslationProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn translate(
        &self,
        batch: &[ProviderUnit],
        source: &LocaleId,
        target: &LocaleId,
    ) -> Result<Vec<UnitOutcome>, ProviderError> {
        let payload: HashMap<&str, &str> = batch
            .iter()
            .map(|u| (u.key.as_str(), u.source_text.as_str()))
            .collect();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: Self::prompt(source, target),
                },
                ChatMessage {
                    role: "user",
                    content: serde_json::to_string(&payload)
                        .map_err(|e| ProviderError::Malformed(e.to_string()))?,
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat { kind: "json_object" },
        };

        debug!(units = batch.len(), %target, "dispatching provider batch");
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if status.is_server_error() {
            return Err(ProviderError::Unavailable(format!("http {status}")));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Malformed(format!("http {status}: {text}")));
        }

        let parsed: ChatResponse = resp.json().await?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ProviderError::Malformed("empty choices".into()))?;
        let translations: HashMap<String, serde_json::Value> = serde_json::from_str(content)
            .map_err(|e| ProviderError::Malformed(format!("response is not a JSON object: {e}")))?;

        let mut out = Vec::with_capacity(batch.len());
        for unit in batch {
            match translations.get(&unit.key) {
                Some(serde_json::Value::String(text)) => out.push(UnitOutcome::Translated {
                    key: unit.key.clone(),
                    text: text.clone(),
                }),
                Some(other) => {
                    warn!(key = %unit.key, "provider returned a non-string value");
                    out.push(UnitOutcome::Failed {
                        key: unit.key.clone(),
                        reason: format!("non-string value in response: {other}"),
                    });
                }
                None => {} // caller records these as missing-in-response
            }
        }
        Ok(out)
    }
}
