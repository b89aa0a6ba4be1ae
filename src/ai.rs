//! External AI chat client
//!
//! One operation: send a prompt with fixed generation parameters to a hosted
//! inference endpoint and normalize the response. The client owns the
//! request timeout; the aggregator does not retry.

use crate::config::AiConfig;
use crate::errors::AppError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

/// Generation parameters sent with every chat request
#[derive(Debug, Clone, Serialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub frequency_penalty: f64,
    pub seed: u64,
    pub safety_mode: &'static str,
}

impl GenerationParams {
    /// Deterministic-leaning settings used for class analysis
    pub fn analysis_defaults() -> Self {
        Self {
            max_tokens: 600,
            temperature: 1.0,
            top_p: 0.75,
            top_k: 0,
            frequency_penalty: 0.0,
            seed: 0,
            safety_mode: "CONTEXTUAL",
        }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send a prompt and return the normalized response object
    async fn chat(&self, prompt: &str, params: &GenerationParams) -> Result<Value, AppError>;
}

/// Client for the hosted inference endpoint
pub struct CloudChatClient {
    client: reqwest::Client,
    config: AiConfig,
}

impl CloudChatClient {
    pub fn new(config: AiConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Analysis(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatClient for CloudChatClient {
    async fn chat(&self, prompt: &str, params: &GenerationParams) -> Result<Value, AppError> {
        let payload = json!({
            "compartmentId": self.config.compartment_id,
            "servingMode": { "modelId": self.config.model_id },
            "chatRequest": {
                "message": prompt,
                "maxTokens": params.max_tokens,
                "temperature": params.temperature,
                "topP": params.top_p,
                "topK": params.top_k,
                "frequencyPenalty": params.frequency_penalty,
                "seed": params.seed,
                "safetyMode": params.safety_mode,
            }
        });

        let res = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Analysis(format!("Request failed: {}", e)))?;

        if !res.status().is_success() {
            return Err(AppError::Analysis(format!(
                "Inference endpoint returned {}",
                res.status()
            )));
        }

        let body: Value = res
            .json()
            .await
            .map_err(|e| AppError::Analysis(format!("Parse error: {}", e)))?;

        Ok(normalize_response(body))
    }
}

/// Normalize a vendor response into a single object.
///
/// Preference order: the structured `chatResponse` object (its `text`
/// overwritten by any top-level `text`), then a bare `{"text": ...}`, then
/// the whole body stringified under `"raw"` so nothing is silently dropped.
fn normalize_response(body: Value) -> Value {
    let text = body.get("text").and_then(Value::as_str).map(str::to_string);

    if let Some(Value::Object(mut chat)) = body.get("chatResponse").cloned() {
        if let Some(text) = text {
            chat.insert("text".to_string(), Value::String(text));
        }
        return Value::Object(chat);
    }

    if let Some(text) = text {
        return json!({ "text": text });
    }

    json!({ "raw": body.to_string() })
}

/// In-process client used when no real endpoint is configured and in tests
pub struct MockChatClient;

#[async_trait]
impl ChatClient for MockChatClient {
    async fn chat(&self, _prompt: &str, _params: &GenerationParams) -> Result<Value, AppError> {
        Ok(json!({
            "text": "1. Concept: Recursion. Mastery: 40/100. Covered in: Lecture 2. \
                     Struggled because: abstract treatment. Revisit with: worked examples."
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefers_structured_chat_response() {
        let body = json!({
            "chatResponse": { "finishReason": "COMPLETE" },
            "text": "the analysis"
        });
        let out = normalize_response(body);
        assert_eq!(out["finishReason"], "COMPLETE");
        assert_eq!(out["text"], "the analysis");
    }

    #[test]
    fn test_normalize_top_level_text_wins_over_nested() {
        let body = json!({
            "chatResponse": { "text": "truncated nested copy" },
            "text": "the full answer"
        });
        let out = normalize_response(body);
        assert_eq!(out["text"], "the full answer");
    }

    #[test]
    fn test_normalize_falls_back_to_text() {
        let out = normalize_response(json!({ "text": "flat answer" }));
        assert_eq!(out, json!({ "text": "flat answer" }));
    }

    #[test]
    fn test_normalize_falls_back_to_raw() {
        let out = normalize_response(json!({ "unexpected": true }));
        assert!(out["raw"].as_str().unwrap().contains("unexpected"));
    }

    #[test]
    fn test_analysis_params_are_fixed() {
        let params = GenerationParams::analysis_defaults();
        assert_eq!(params.max_tokens, 600);
        assert_eq!(params.top_p, 0.75);
        assert_eq!(params.seed, 0);
        assert_eq!(params.safety_mode, "CONTEXTUAL");
    }

    #[tokio::test]
    async fn test_mock_client_returns_text_object() {
        let client = MockChatClient;
        let out = client
            .chat("prompt", &GenerationParams::analysis_defaults())
            .await
            .unwrap();
        assert!(out["text"].as_str().unwrap().contains("Concept"));
    }
}
