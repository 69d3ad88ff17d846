//! crates/diary_core/src/analysis.rs
//!
//! The mood-analysis contract: the prompt sent to the model, normalization of
//! the model's JSON reply, and the outcome taxonomy the analysis endpoint
//! turns into HTTP responses.

use serde_json::Value;
use tracing::error;

use crate::domain::AnalysisResult;
use crate::ports::{MoodAnalysisService, PortError};

pub const SYSTEM_INSTRUCTIONS: &str = r#"You are an empathetic diary companion that analyzes emotional tone.
Respond with a JSON object containing:
1. "emojis": array of 3-5 emojis that represent the mood/themes
2. "sentiment": a brief 1-2 sentence reflection on the emotional tone
Keep the sentiment warm, non-judgmental, and supportive."#;

/// Sentiment used when the model replied but left the field out.
pub const MISSING_SENTIMENT: &str = "Unable to analyze sentiment at this time.";

/// Sentiment used when the analysis failed outright.
pub const UNAVAILABLE_SENTIMENT: &str = "Unable to analyze at this time.";

pub const CONTENT_REQUIRED: &str = "Content is required";

pub const RATE_LIMIT_EXCEEDED: &str = "Rate limit exceeded. Please try again in a moment.";

/// Builds the user message that embeds the diary text verbatim.
pub fn user_prompt(content: &str) -> String {
    format!("Analyze this diary entry:\n\n{}", content)
}

impl AnalysisResult {
    /// Normalizes the JSON object the model returned in its message content.
    ///
    /// A missing or non-array `emojis` becomes empty, a missing or empty
    /// `sentiment` becomes [`MISSING_SENTIMENT`]. Only text that is not JSON at
    /// all is an error.
    pub fn from_model_reply(reply: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(reply)?;

        let emojis = value
            .get("emojis")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let sentiment = value
            .get("sentiment")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(MISSING_SENTIMENT)
            .to_string();

        Ok(Self { emojis, sentiment })
    }

    /// The result reported alongside a total analysis failure.
    pub fn unavailable() -> Self {
        Self {
            emojis: Vec::new(),
            sentiment: UNAVAILABLE_SENTIMENT.to_string(),
        }
    }
}

/// What one analysis request ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Analyzed(AnalysisResult),
    /// No usable content was supplied; the gateway was not contacted.
    MissingContent,
    RateLimited,
    /// Any other failure, with a best-effort message for the caller.
    Failed(String),
}

/// Runs one analysis for the endpoint, validating the content first.
pub async fn analyze_content(
    analyzer: &dyn MoodAnalysisService,
    content: Option<&str>,
) -> AnalysisOutcome {
    let content = match content {
        Some(c) if !c.trim().is_empty() => c,
        _ => return AnalysisOutcome::MissingContent,
    };

    match analyzer.analyze_mood(content).await {
        Ok(result) => AnalysisOutcome::Analyzed(result),
        Err(PortError::RateLimited) => AnalysisOutcome::RateLimited,
        Err(e) => {
            error!("Error in mood analysis: {:?}", e);
            AnalysisOutcome::Failed(e.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubAnalyzer, StubReply};

    #[test]
    fn reply_with_both_fields_is_kept_verbatim() {
        let result =
            AnalysisResult::from_model_reply(r#"{"emojis":["😊","🌱"],"sentiment":"You seem hopeful."}"#)
                .unwrap();
        assert_eq!(result.emojis, vec!["😊", "🌱"]);
        assert_eq!(result.sentiment, "You seem hopeful.");
    }

    #[test]
    fn missing_fields_fall_back() {
        let result = AnalysisResult::from_model_reply("{}").unwrap();
        assert!(result.emojis.is_empty());
        assert_eq!(result.sentiment, MISSING_SENTIMENT);
    }

    #[test]
    fn empty_sentiment_counts_as_missing() {
        let result =
            AnalysisResult::from_model_reply(r#"{"emojis":["🙂"],"sentiment":""}"#).unwrap();
        assert_eq!(result.emojis, vec!["🙂"]);
        assert_eq!(result.sentiment, MISSING_SENTIMENT);
    }

    #[test]
    fn non_json_reply_is_an_error() {
        assert!(AnalysisResult::from_model_reply("I feel you're happy!").is_err());
    }

    #[tokio::test]
    async fn blank_content_never_reaches_the_analyzer() {
        let analyzer = StubAnalyzer::returning(&["🙂"], "fine");
        assert_eq!(
            analyze_content(&analyzer, Some("  ")).await,
            AnalysisOutcome::MissingContent
        );
        assert_eq!(
            analyze_content(&analyzer, None).await,
            AnalysisOutcome::MissingContent
        );
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn port_errors_map_to_outcomes() {
        let limited = StubAnalyzer::new(StubReply::RateLimited);
        assert_eq!(
            analyze_content(&limited, Some("hi")).await,
            AnalysisOutcome::RateLimited
        );

        let broken = StubAnalyzer::new(StubReply::Failure("No analysis returned from AI".into()));
        assert_eq!(
            analyze_content(&broken, Some("hi")).await,
            AnalysisOutcome::Failed("No analysis returned from AI".to_string())
        );
    }

    #[test]
    fn user_prompt_embeds_content() {
        assert_eq!(
            user_prompt("rainy day"),
            "Analyze this diary entry:\n\nrainy day"
        );
    }
}
