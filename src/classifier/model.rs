/// Sentiment model trait and hosted inference implementation
use super::{Classification, SentimentLabel};
use crate::config::ModelConfig;
use crate::error::TubesentError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model initialization failed: {0}")]
    InitializationError(String),

    #[error("Inference request failed: {0}")]
    RequestError(String),

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Unknown label from model: {0}")]
    UnknownLabel(String),

    #[error("Result count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

impl From<ModelError> for TubesentError {
    fn from(e: ModelError) -> Self {
        TubesentError::Model(e.to_string())
    }
}

/// Trait for three-class sentiment models
///
/// Implementations are built once per process and shared read-only.
#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// Classify a batch of cleaned texts, one result per input, in order
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Classification>, ModelError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Cap text length before sending, at roughly 4 characters per token
pub fn truncate_for_model(text: &str, max_tokens: usize) -> &str {
    let max_chars = max_tokens.saturating_mul(4);
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

// The endpoint returns either the top class per input or every class per input
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    AllScores(Vec<Vec<LabelScore>>),
    TopScore(Vec<LabelScore>),
}

#[derive(Debug, Clone, Deserialize)]
struct InferenceErrorBody {
    error: String,
}

fn best_classification(scores: &[LabelScore]) -> Result<Classification, ModelError> {
    let best = scores
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
        .ok_or_else(|| ModelError::InvalidResponse("empty score list".to_string()))?;

    to_classification(best)
}

fn to_classification(entry: &LabelScore) -> Result<Classification, ModelError> {
    let label = SentimentLabel::from_model_label(&entry.label)
        .ok_or_else(|| ModelError::UnknownLabel(entry.label.clone()))?;

    Ok(Classification {
        label,
        score: entry.score.clamp(0.0, 1.0),
    })
}

/// Parse an inference response body into one classification per input
fn parse_response(body: &str, expected: usize) -> Result<Vec<Classification>, ModelError> {
    let parsed: InferenceResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::InvalidResponse(format!("{}: {}", e, body)))?;

    let results = match parsed {
        InferenceResponse::AllScores(per_input) => per_input
            .iter()
            .map(|scores| best_classification(scores))
            .collect::<Result<Vec<_>, _>>()?,
        InferenceResponse::TopScore(flat) => flat
            .iter()
            .map(to_classification)
            .collect::<Result<Vec<_>, _>>()?,
    };

    if results.len() != expected {
        return Err(ModelError::CountMismatch {
            expected,
            actual: results.len(),
        });
    }

    Ok(results)
}

/// Text-classification model served over the Hugging Face inference protocol
///
/// The default configuration points at the hosted inference API for
/// `w11wo/indonesian-roberta-base-sentiment-classifier`; any compatible
/// self-hosted endpoint works by changing `model.endpoint`.
pub struct InferenceApiModel {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    model_name: String,
    max_length: usize,
}

impl InferenceApiModel {
    /// Build the model handle from configuration and an optional token
    pub fn new(config: &ModelConfig, token: Option<String>) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::InitializationError(e.to_string()))?;

        tracing::info!(
            "Using sentiment model: {} (max_length={}, authenticated={})",
            config.name,
            config.max_length,
            token.is_some()
        );

        Ok(Self {
            client,
            url: config.model_url(),
            token,
            model_name: config.name.clone(),
            max_length: config.max_length,
        })
    }
}

#[async_trait]
impl SentimentModel for InferenceApiModel {
    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Classification>, ModelError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = texts
            .iter()
            .map(|t| truncate_for_model(t, self.max_length))
            .collect();

        let body = serde_json::json!({
            "inputs": inputs,
            "parameters": {
                "truncation": true,
                "max_length": self.max_length,
            },
            "options": {
                "wait_for_model": true,
            }
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ModelError::RequestError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::RequestError(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<InferenceErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(ModelError::RequestError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        parse_response(&text, texts.len())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_scores() {
        let body = r#"[
            [{"label": "positive", "score": 0.91}, {"label": "neutral", "score": 0.06}, {"label": "negative", "score": 0.03}],
            [{"label": "negative", "score": 0.2}, {"label": "neutral", "score": 0.7}, {"label": "positive", "score": 0.1}]
        ]"#;
        let results = parse_response(body, 2).unwrap();

        assert_eq!(results[0].label, SentimentLabel::Positive);
        assert!((results[0].score - 0.91).abs() < 1e-6);
        assert_eq!(results[1].label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_parse_top_score() {
        let body = r#"[{"label": "LABEL_2", "score": 0.8}, {"label": "Positive", "score": 0.99}]"#;
        let results = parse_response(body, 2).unwrap();

        assert_eq!(results[0].label, SentimentLabel::Negative);
        assert_eq!(results[1].label, SentimentLabel::Positive);
    }

    #[test]
    fn test_parse_count_mismatch() {
        let body = r#"[{"label": "positive", "score": 0.8}]"#;
        assert!(matches!(
            parse_response(body, 2),
            Err(ModelError::CountMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_parse_unknown_label() {
        let body = r#"[{"label": "sarcastic", "score": 0.8}]"#;
        assert!(matches!(
            parse_response(body, 1),
            Err(ModelError::UnknownLabel(_))
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_response(r#"{"error": "loading"}"#, 1),
            Err(ModelError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_truncate_for_model() {
        let long = "a".repeat(3000);
        assert_eq!(truncate_for_model(&long, 512).len(), 2048);
        assert_eq!(truncate_for_model("pendek", 512), "pendek");
        // multi-byte boundaries stay valid
        let wide = "é".repeat(10);
        assert_eq!(truncate_for_model(&wide, 1).chars().count(), 4);
    }

    #[tokio::test]
    #[ignore] // Requires network access to the inference endpoint - run with: cargo test -- --ignored
    async fn test_live_inference() {
        let config = crate::config::Config::default().model;
        let model = InferenceApiModel::new(&config, config.api_token()).unwrap();
        let results = model
            .classify_batch(&["videonya bagus banget".to_string()])
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}
