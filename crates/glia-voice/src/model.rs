//! **Emotion model boundary**: one window of samples in, one logit vector out.
//!
//! The model consumes a single named input (`input_values`: a window of f32 samples)
//! and returns a single named output (`logits`: one value per [`Emotion`] in label
//! order). Implement `EmotionModel` for any backend that honours that contract.

use crate::emotion::Emotion;
use crate::error::{VoiceError, VoiceResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Name of the model's single input tensor.
pub const MODEL_INPUT_NAME: &str = "input_values";

/// Name of the model's single output tensor.
pub const MODEL_OUTPUT_NAME: &str = "logits";

/// Backend that scores one window of audio. Implementations must be safe to call from
/// the worker thread; they are never called concurrently for the same worker.
pub trait EmotionModel: Send + Sync {
    /// Return per-class logits for `input_values`, in [`Emotion::ALL`] order.
    fn infer(&self, input_values: &[f32]) -> VoiceResult<Vec<f32>>;
}

fn default_timeout_secs() -> u64 {
    10
}

/// Where the acoustic model lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// URL of an HTTP inference service. When unset the placeholder model is used.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Optional bearer token for the inference service.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Placeholder model: uniform logits, so every window classifies as NEUTRAL at 1/6
/// confidence and never clears the logging threshold. Use to exercise the pipeline
/// without an inference service.
#[derive(Debug, Default)]
pub struct PlaceholderEmotionModel;

impl EmotionModel for PlaceholderEmotionModel {
    fn infer(&self, _input_values: &[f32]) -> VoiceResult<Vec<f32>> {
        Ok(vec![0.0; Emotion::COUNT])
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    input_values: [&'a [f32]; 1],
}

#[derive(Deserialize)]
struct InferenceResponse {
    logits: Vec<Vec<f32>>,
}

/// Remote model: POSTs `{"input_values": [[...]]}` and reads `{"logits": [[...]]}`.
/// Uses a blocking client since it is only ever called from a dedicated worker thread.
#[derive(Debug, Clone)]
pub struct HttpEmotionModel {
    /// Full URL of the inference endpoint.
    pub endpoint: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpEmotionModel {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> VoiceResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VoiceError::Model(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client,
        })
    }
}

impl EmotionModel for HttpEmotionModel {
    fn infer(&self, input_values: &[f32]) -> VoiceResult<Vec<f32>> {
        let request = InferenceRequest {
            input_values: [input_values],
        };
        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }
        let res = builder.send()?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(VoiceError::Model(format!("inference API error {}: {}", status, body)));
        }
        let response: InferenceResponse = res.json()?;
        response
            .logits
            .into_iter()
            .next()
            .ok_or_else(|| VoiceError::Model(format!("response has an empty `{}` batch", MODEL_OUTPUT_NAME)))
    }
}

/// Pick the model backend from configuration: HTTP when an endpoint is set, placeholder otherwise.
pub fn create_emotion_model(config: &ModelConfig) -> VoiceResult<Box<dyn EmotionModel>> {
    let endpoint = config
        .endpoint
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match endpoint {
        Some(url) => {
            info!("Emotion model: remote inference at {}", url);
            let model = HttpEmotionModel::new(
                url,
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Box::new(model))
        }
        None => {
            info!("Emotion model: no endpoint configured, using placeholder");
            Ok(Box::new(PlaceholderEmotionModel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_returns_one_logit_per_label() {
        let logits = PlaceholderEmotionModel.infer(&[0.0; 32000]).unwrap();
        assert_eq!(logits.len(), Emotion::COUNT);
        assert!(logits.iter().all(|&l| l == 0.0));
    }

    #[test]
    fn request_uses_named_input() {
        let samples = [0.25f32, -0.5];
        let body = serde_json::to_value(InferenceRequest {
            input_values: [&samples[..]],
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "input_values": [[0.25, -0.5]] }));
        assert!(body.get(MODEL_INPUT_NAME).is_some());
    }

    #[test]
    fn response_reads_named_output() {
        let response: InferenceResponse =
            serde_json::from_str(r#"{"logits": [[0.1, 2.0, 0.0, 0.0, 0.0, 0.0]]}"#).unwrap();
        assert_eq!(response.logits[0].len(), 6);
    }

    #[test]
    fn blank_endpoint_falls_back_to_placeholder() {
        let config = ModelConfig {
            endpoint: Some("   ".to_string()),
            ..Default::default()
        };
        let model = create_emotion_model(&config).unwrap();
        assert_eq!(model.infer(&[0.0; 10]).unwrap().len(), Emotion::COUNT);
    }
}
