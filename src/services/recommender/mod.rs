//! "You might also like" recommendations.
//!
//! The client picks one of three paths per call:
//!
//! 1. No model configured: the first few candidates in catalog order.
//! 2. Model configured and the call succeeds: the model's structured answer, verbatim.
//! 3. Model configured and the call fails or returns junk: an empty selection
//!    with an apologetic message.
//!
//! `recommend` never returns an error. Callers must still filter the returned
//! ids against their own catalog before display, since the model is free to
//! answer with ids it was never given.
use std::sync::Arc;

use serde_json::{json, Value};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{RecommendationRequest, RecommendationResult},
};

pub mod gemini;

pub use gemini::GeminiModel;

/// Upper bound on the number of books suggested per request
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Reasoning shown when no model credential is configured
pub const FALLBACK_REASONING: &str = "API Key missing. Showing random suggestions.";

/// Reasoning shown when the model could not produce a usable answer
pub const UNAVAILABLE_REASONING: &str =
    "We are having trouble connecting to the AI Librarian at the moment.";

/// A generative model that can answer a prompt with JSON matching a schema
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Returns the raw JSON text of the model's structured answer
    async fn generate(&self, prompt: &str, schema: &Value) -> AppResult<String>;

    /// Model name for logging
    fn name(&self) -> &'static str;
}

impl RecommendationResult {
    /// Deterministic suggestions used when no model is configured
    pub fn fallback(request: &RecommendationRequest) -> Self {
        let ids = request
            .candidates
            .iter()
            .take(MAX_RECOMMENDATIONS)
            .map(|b| b.id.clone())
            .collect();
        Self::new(ids, FALLBACK_REASONING)
    }

    /// Result for a failed model call
    pub fn unavailable() -> Self {
        Self::new(Vec::new(), UNAVAILABLE_REASONING)
    }
}

#[derive(Clone, Default)]
pub struct RecommendationClient {
    model: Option<Arc<dyn GenerativeModel>>,
}

impl RecommendationClient {
    pub fn new(model: Option<Arc<dyn GenerativeModel>>) -> Self {
        Self { model }
    }

    /// Builds a Gemini-backed client when a credential is configured
    pub fn from_config(config: &Config) -> Self {
        let model = config.credential().map(|key| {
            Arc::new(GeminiModel::new(
                key.to_string(),
                config.gemini_api_url.clone(),
                config.gemini_model.clone(),
            )) as Arc<dyn GenerativeModel>
        });

        if model.is_none() {
            tracing::warn!("No Gemini API key configured, recommendations will use fallback data");
        }

        Self::new(model)
    }

    pub fn is_ai_backed(&self) -> bool {
        self.model.is_some()
    }

    pub async fn recommend(&self, request: &RecommendationRequest) -> RecommendationResult {
        let Some(model) = &self.model else {
            tracing::warn!(
                focal_id = %request.focal.id,
                candidates = request.candidates.len(),
                "No model configured, returning fallback recommendations"
            );
            return RecommendationResult::fallback(request);
        };

        match ask_model(model.as_ref(), request).await {
            Ok(result) => {
                tracing::info!(
                    focal_id = %request.focal.id,
                    model = model.name(),
                    recommended = result.recommended_book_ids.len(),
                    "Recommendations generated"
                );
                result
            }
            Err(e) => {
                tracing::error!(
                    focal_id = %request.focal.id,
                    model = model.name(),
                    error = %e,
                    "Recommendation request failed"
                );
                RecommendationResult::unavailable()
            }
        }
    }
}

async fn ask_model(
    model: &dyn GenerativeModel,
    request: &RecommendationRequest,
) -> AppResult<RecommendationResult> {
    let prompt = build_prompt(request)?;
    let raw = model.generate(&prompt, &response_schema()).await?;

    let result: RecommendationResult = serde_json::from_str(raw.trim()).map_err(|e| {
        tracing::debug!(response = %raw, "Model answer did not match the response schema");
        AppError::MalformedResponse(format!("Failed to parse recommendation: {}", e))
    })?;

    Ok(result)
}

/// Instruction text sent to the model
pub fn build_prompt(request: &RecommendationRequest) -> AppResult<String> {
    let catalog = serde_json::to_string(&request.candidate_summaries())
        .map_err(|e| AppError::Internal(format!("Failed to serialize candidates: {}", e)))?;
    let focal = &request.focal;

    Ok(format!(
        "You are an expert librarian recommendation engine.\n\
         \n\
         Context:\n\
         The reader is currently looking at: \"{title}\" by {author} ({genre}).\n\
         The reader has recently viewed: [{history}].\n\
         \n\
         Task:\n\
         From the Available Catalog JSON below, select exactly {count} books this reader \
         would most likely enjoy given their current interest and history. Only use ids \
         that appear in the catalog.\n\
         Write a short \"reasoning\" paragraph explaining the shared themes, or why these \
         books match the reader's taste.\n\
         \n\
         Available Catalog:\n\
         {catalog}\n",
        title = focal.title,
        author = focal.author,
        genre = focal.genre,
        history = request.history_titles(),
        count = MAX_RECOMMENDATIONS,
        catalog = catalog,
    ))
}

/// Structured output schema requested from the model
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "recommendedBookIds": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": format!("Array of exactly {} book IDs from the catalog", MAX_RECOMMENDATIONS)
            },
            "reasoning": {
                "type": "STRING",
                "description": "A friendly, librarian-style explanation of why these books were chosen."
            }
        },
        "required": ["recommendedBookIds", "reasoning"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{test_support::book, InteractionHistory};

    fn request_with(candidate_ids: &[&str]) -> RecommendationRequest {
        let focal = book("focal", "The Focal Point");
        let mut catalog = vec![focal.clone()];
        catalog.extend(candidate_ids.iter().map(|id| book(id, &format!("Title {}", id))));
        RecommendationRequest::new(focal, &InteractionHistory::new(), &catalog)
    }

    fn client_with(model: MockGenerativeModel) -> RecommendationClient {
        RecommendationClient::new(Some(Arc::new(model)))
    }

    #[tokio::test]
    async fn test_fallback_takes_first_three_in_order() {
        let client = RecommendationClient::new(None);
        let request = request_with(&["a", "b", "c", "d"]);

        let result = client.recommend(&request).await;
        assert_eq!(result.recommended_book_ids, vec!["a", "b", "c"]);
        assert_eq!(result.reasoning, FALLBACK_REASONING);
    }

    #[tokio::test]
    async fn test_fallback_with_fewer_candidates() {
        let client = RecommendationClient::new(None);
        let request = request_with(&["a"]);

        let result = client.recommend(&request).await;
        assert_eq!(result.recommended_book_ids, vec!["a"]);
        assert_eq!(result.reasoning, FALLBACK_REASONING);

        let empty = client.recommend(&request_with(&[])).await;
        assert!(empty.is_empty());
        assert_eq!(empty.reasoning, FALLBACK_REASONING);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let client = RecommendationClient::new(None);
        let request = request_with(&["a", "b", "c", "d", "e"]);

        let first = tokio_test::block_on(client.recommend(&request));
        let second = tokio_test::block_on(client.recommend(&request));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_primary_path_returns_model_answer_verbatim() {
        let mut model = MockGenerativeModel::new();
        model.expect_generate().times(1).returning(|_, _| {
            Ok(r#"{"recommendedBookIds":["d","b","zzz"],"reasoning":"Shared themes."}"#.to_string())
        });
        model.expect_name().return_const("mock");

        let result = client_with(model)
            .recommend(&request_with(&["a", "b", "c", "d"]))
            .await;

        // Unknown ids pass through; filtering is the caller's job
        assert_eq!(result.recommended_book_ids, vec!["d", "b", "zzz"]);
        assert_eq!(result.reasoning, "Shared themes.");
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_unavailable() {
        let mut model = MockGenerativeModel::new();
        model
            .expect_generate()
            .returning(|_, _| Err(AppError::ExternalApi("connection reset".to_string())));
        model.expect_name().return_const("mock");

        let result = client_with(model)
            .recommend(&request_with(&["a", "b", "c"]))
            .await;

        assert!(result.is_empty());
        assert_eq!(result.reasoning, UNAVAILABLE_REASONING);
    }

    #[tokio::test]
    async fn test_malformed_answers_become_unavailable() {
        let answers = [
            "not json at all",
            "{}",
            r#"{"recommendedBookIds":"a","reasoning":"x"}"#,
            r#"{"recommendedBookIds":["a"]}"#,
            r#"["a","b","c"]"#,
        ];

        for answer in answers {
            let mut model = MockGenerativeModel::new();
            model
                .expect_generate()
                .returning(move |_, _| Ok(answer.to_string()));
            model.expect_name().return_const("mock");

            let result = client_with(model)
                .recommend(&request_with(&["a", "b"]))
                .await;
            assert_eq!(result, RecommendationResult::unavailable(), "answer: {}", answer);
        }
    }

    #[tokio::test]
    async fn test_model_receives_prompt_and_schema() {
        let mut model = MockGenerativeModel::new();
        model
            .expect_generate()
            .withf(|prompt, schema| {
                prompt.contains("\"The Focal Point\"")
                    && prompt.contains(r#""id":"a""#)
                    && !prompt.contains(r#""id":"focal""#)
                    && schema["required"] == json!(["recommendedBookIds", "reasoning"])
            })
            .returning(|_, _| Ok(r#"{"recommendedBookIds":[],"reasoning":"none"}"#.to_string()));
        model.expect_name().return_const("mock");

        let result = client_with(model).recommend(&request_with(&["a"])).await;
        assert_eq!(result.reasoning, "none");
    }

    #[test]
    fn test_prompt_embeds_context() {
        let focal = book("focal", "Dune");
        let mut history = InteractionHistory::new();
        history.push(book("h1", "Foundation"));
        history.push(book("h2", "Hyperion"));
        let catalog = vec![focal.clone(), book("x", "Solaris")];

        let request = RecommendationRequest::new(focal, &history, &catalog);
        let prompt = build_prompt(&request).unwrap();

        assert!(prompt.contains("\"Dune\" by Author of Dune (Fiction)"));
        assert!(prompt.contains("[Foundation, Hyperion]"));
        assert!(prompt.contains("select exactly 3 books"));
        assert!(prompt.contains(r#"{"id":"x","title":"Solaris""#));
        assert!(!prompt.contains("rating"));
        assert!(!prompt.contains("coverUrl"));
    }

    #[test]
    fn test_prompt_with_empty_history() {
        let request = request_with(&["a"]);
        let prompt = build_prompt(&request).unwrap();
        assert!(prompt.contains("recently viewed: []."));
    }

    #[test]
    fn test_from_config_without_key_uses_fallback() {
        let client = RecommendationClient::from_config(&Config::default());
        assert!(!client.is_ai_backed());

        let keyed = RecommendationClient::from_config(&Config {
            gemini_api_key: Some("key".to_string()),
            ..Config::default()
        });
        assert!(keyed.is_ai_backed());
    }
}
