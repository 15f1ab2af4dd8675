//! HTTP client for the Hugging Face Inference API (automatic speech
//! recognition task).
//!
//! The transcribe flow:
//! 1. `POST {endpoint}/{model_id}` with the encoded audio as the raw body and
//!    its MIME type as `Content-Type` (the service decodes Ogg/Opus itself)
//! 2. `503` with `estimated_time` means the model is still being loaded;
//!    that is retried after the advertised delay
//! 3. Success bodies are `{"text": "..."}` (some deployments wrap it in a
//!    one-element array)
//!
//! [`HfInferenceClient::check_model`] asks the Hub whether the model exists
//! and is an ASR model before the bot starts taking voice notes.

use super::token::{resolve_token, HfToken};
use super::{AudioClip, Transcriber, Transcript};
use crate::config::{AsrConfig, AsrSettings};
use crate::error::{BotError, Result};
use crate::network::{extract_error_message, CircuitBreakerStats, HttpClient, Upstream};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Asks the inference API to hold the request until a cold model is loaded.
const WAIT_FOR_MODEL_HEADER: &str = "x-wait-for-model";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AsrResponse {
    Single(AsrOutput),
    Batch(Vec<AsrOutput>),
}

#[derive(Debug, Deserialize)]
struct AsrOutput {
    text: String,
}

/// Body of a `503` while the model loads.
#[derive(Debug, Deserialize)]
struct LoadingBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    estimated_time: Option<f64>,
}

/// Hub metadata from `GET /api/models/{model_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub pipeline_tag: Option<String>,
    #[serde(default)]
    pub private: bool,
    /// `false`, `"auto"` or `"manual"`.
    #[serde(default)]
    pub gated: serde_json::Value,
}

impl ModelInfo {
    pub fn is_gated(&self) -> bool {
        !matches!(
            self.gated,
            serde_json::Value::Null | serde_json::Value::Bool(false)
        )
    }

    pub fn is_speech_recognition(&self) -> bool {
        self.pipeline_tag.as_deref() == Some(AsrConfig::EXPECTED_PIPELINE_TAG)
    }
}

/// Speech recognizer backed by a hosted inference endpoint.
pub struct HfInferenceClient {
    upstream: Upstream,
    model_id: String,
    inference_url: String,
    model_info_url: String,
    token: Option<HfToken>,
}

impl HfInferenceClient {
    pub fn new(settings: &AsrSettings) -> Result<Self> {
        let upstream = Upstream::new(AsrConfig::SERVICE_NAME, settings.timeout)?;
        Ok(Self::with_upstream(settings, upstream))
    }

    /// Build on a preconfigured upstream (custom retry or breaker policy).
    pub fn with_upstream(settings: &AsrSettings, upstream: Upstream) -> Self {
        let token = resolve_token(settings.token.as_deref());
        match &token {
            Some(token) => debug!("Using Hugging Face token from {}", token.source.as_str()),
            None => debug!("No Hugging Face token found, calling the API anonymously"),
        }

        Self {
            upstream,
            model_id: settings.model_id.clone(),
            inference_url: format!(
                "{}/{}",
                settings.endpoint.trim_end_matches('/'),
                settings.model_id
            ),
            model_info_url: format!(
                "{}/api/models/{}",
                settings.hub_base.trim_end_matches('/'),
                settings.model_id
            ),
            token,
        }
    }

    pub fn token(&self) -> Option<&HfToken> {
        self.token.as_ref()
    }

    /// Look the model up on the Hub and warn if it is not usable for ASR.
    pub async fn check_model(&self) -> Result<ModelInfo> {
        let http = self.upstream.http();
        let mut request = http.inner().get(&self.model_info_url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(&token.value);
        }

        let info: ModelInfo = http.json(http.send(request).await?).await?;

        if !info.is_speech_recognition() {
            warn!(
                "Model {} has pipeline tag {:?}, expected {}",
                info.id,
                info.pipeline_tag,
                AsrConfig::EXPECTED_PIPELINE_TAG
            );
        }
        if (info.private || info.is_gated()) && self.token.is_none() {
            warn!(
                "Model {} is private or gated but no Hugging Face token is configured",
                info.id
            );
        }
        info!(
            "ASR model {} available (pipeline: {})",
            info.id,
            info.pipeline_tag.as_deref().unwrap_or("unknown")
        );
        Ok(info)
    }

    async fn transcribe_once(&self, http: &HttpClient, clip: &AudioClip) -> Result<Transcript> {
        let mut request = http
            .inner()
            .post(&self.inference_url)
            .header(CONTENT_TYPE, clip.mime_type.as_str())
            .header(WAIT_FOR_MODEL_HEADER, "true")
            .body(clip.bytes.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(&token.value);
        }

        let response = http.send_unchecked(request).await?;
        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            return Err(self.unavailable_error(&body));
        }

        let response = http.check_response_status(response).await?;
        let parsed: AsrResponse = http.json(response).await?;
        let text = match parsed {
            AsrResponse::Single(output) => Some(output.text),
            AsrResponse::Batch(outputs) => outputs.into_iter().next().map(|o| o.text),
        }
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

        if text.is_empty() {
            return Err(BotError::EmptyResponse {
                service: AsrConfig::SERVICE_NAME.to_string(),
            });
        }
        Ok(Transcript { text })
    }

    fn unavailable_error(&self, body: &str) -> BotError {
        match serde_json::from_str::<LoadingBody>(body) {
            Ok(loading)
                if loading.estimated_time.is_some()
                    || loading
                        .error
                        .as_deref()
                        .is_some_and(|e| e.contains("loading")) =>
            {
                BotError::ModelLoading {
                    model: self.model_id.clone(),
                    estimated_secs: loading.estimated_time,
                }
            }
            _ => BotError::Api {
                service: AsrConfig::SERVICE_NAME.to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                message: extract_error_message(body),
            },
        }
    }
}

#[async_trait]
impl Transcriber for HfInferenceClient {
    async fn transcribe(&self, clip: AudioClip) -> Result<Transcript> {
        clip.validate()?;
        debug!(
            "Transcribing {} bytes of {} with {}",
            clip.len(),
            clip.mime_type,
            self.model_id
        );
        let clip = &clip;
        self.upstream
            .call(|http| self.transcribe_once(http, clip))
            .await
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn health(&self) -> Option<CircuitBreakerStats> {
        Some(self.upstream.breaker_stats())
    }
}
