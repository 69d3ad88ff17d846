//! services/api/src/adapters/mood_llm.rs
//!
//! This module contains the adapter for the mood-analysis LLM.
//! It implements the `MoodAnalysisService` port from the `core` crate by calling an
//! OpenAI-compatible chat-completions gateway in JSON-object mode.

use std::time::Duration;

use async_trait::async_trait;
use diary_core::{
    analysis::{user_prompt, SYSTEM_INSTRUCTIONS},
    domain::AnalysisResult,
    ports::{MoodAnalysisService, PortError, PortResult},
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'static str,
    content: std::borrow::Cow<'a, str>,
}

#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Deserialize, Debug)]
struct ChatReply {
    content: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `MoodAnalysisService` against a chat-completions gateway.
#[derive(Clone)]
pub struct GatewayMoodAdapter {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl GatewayMoodAdapter {
    /// Creates a new `GatewayMoodAdapter`.
    pub fn new(
        url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url,
            api_key,
            model,
        })
    }

    fn build_request<'a>(&'a self, content: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTIONS.into(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(content).into(),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

//=========================================================================================
// `MoodAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl MoodAnalysisService for GatewayMoodAdapter {
    async fn analyze_mood(&self, content: &str) -> PortResult<AnalysisResult> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PortError::Unexpected("AI_GATEWAY_API_KEY is not configured".to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&self.build_request(content))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("AI gateway request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, "AI gateway response received");

        if !status.is_success() {
            match response.text().await {
                Ok(body) => error!(status = %status, body = %body, "AI gateway error"),
                Err(e) => error!(
                    status = %status,
                    error = %e,
                    "AI gateway error; failed to read response body"
                ),
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(PortError::RateLimited);
            }
            return Err(PortError::Unexpected(format!(
                "AI gateway error: {}",
                status.as_u16()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("failed to parse AI gateway response: {e}")))?;

        let analysis_text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| PortError::Unexpected("No analysis returned from AI".to_string()))?;

        AnalysisResult::from_model_reply(&analysis_text)
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer, api_key: Option<&str>) -> GatewayMoodAdapter {
        GatewayMoodAdapter::new(
            format!("{}/v1/chat/completions", server.uri()),
            api_key.map(str::to_string),
            "google/gemini-2.5-flash".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn completion(content: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn sends_the_prompt_contract() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "google/gemini-2.5-flash",
                "response_format": {"type": "json_object"},
                "messages": [
                    {"role": "system", "content": SYSTEM_INSTRUCTIONS},
                    {"role": "user", "content": "Analyze this diary entry:\n\nSunny walk"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                serde_json::json!(r#"{"emojis":["☀️"],"sentiment":"Bright."}"#),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let result = adapter(&server, Some("test-key"))
            .analyze_mood("Sunny walk")
            .await
            .unwrap();
        assert_eq!(result.emojis, vec!["☀️"]);
        assert_eq!(result.sentiment, "Bright.");
    }

    #[tokio::test]
    async fn rate_limit_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(1)
            .mount(&server)
            .await;

        let err = adapter(&server, Some("k")).analyze_mood("hi").await.unwrap_err();
        assert!(matches!(err, PortError::RateLimited));
    }

    #[tokio::test]
    async fn other_statuses_are_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = adapter(&server, Some("k")).analyze_mood("hi").await.unwrap_err();
        assert_eq!(err.message(), "AI gateway error: 502");
    }

    #[tokio::test]
    async fn undecodable_error_body_keeps_the_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_bytes(vec![0xff, 0xfe, 0x00]))
            .expect(1)
            .mount(&server)
            .await;

        let err = adapter(&server, Some("k")).analyze_mood("hi").await.unwrap_err();
        assert_eq!(err.message(), "AI gateway error: 503");
    }

    #[tokio::test]
    async fn missing_message_content_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let err = adapter(&server, Some("k")).analyze_mood("hi").await.unwrap_err();
        assert_eq!(err.message(), "No analysis returned from AI");
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_calling_the_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = adapter(&server, None).analyze_mood("hi").await.unwrap_err();
        assert_eq!(err.message(), "AI_GATEWAY_API_KEY is not configured");
    }
}
