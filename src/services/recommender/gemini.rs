//! Google Generative Language API model
//!
//! Calls `models/{model}:generateContent` with a JSON response schema and
//! returns the text of the first candidate, which the API guarantees to be
//! JSON matching that schema when it succeeds.
use crate::{
    error::{AppError, AppResult},
    services::recommender::GenerativeModel,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiModel {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        (!text.trim().is_empty()).then_some(text)
    }
}

impl GeminiModel {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        )
    }

    fn request_body(prompt: &str, schema: &Value) -> Value {
        json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        })
    }
}

#[async_trait::async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, prompt: &str, schema: &Value) -> AppResult<String> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&Self::request_body(prompt, schema))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        tracing::debug!(response = %response_text, "Raw Gemini API response");

        let parsed: GenerateContentResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                tracing::error!(
                    error = %e,
                    response = %response_text,
                    "Failed to deserialize Gemini response"
                );
                AppError::MalformedResponse(format!("Failed to parse Gemini response: {}", e))
            })?;

        parsed.text().ok_or_else(|| {
            AppError::MalformedResponse("Gemini response contained no text".to_string())
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
