use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::FALLBACK_COVER_URL,
};

/// Finds cover art for books added by administrators
#[async_trait::async_trait]
pub trait CoverLookup: Send + Sync {
    /// Cover image URL for a title. Never fails; unknown titles get the fallback cover.
    async fn cover_for(&self, title: &str) -> String;
}

/// Open Library search backed cover lookup
#[derive(Clone)]
pub struct OpenLibraryCovers {
    http_client: HttpClient,
    api_url: String,
    image_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    cover_i: Option<u64>,
}

impl OpenLibraryCovers {
    pub fn new(api_url: String, image_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url: image_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cover_api_url.clone(), config.cover_image_url.clone())
    }

    fn image_for(&self, cover_id: u64) -> String {
        format!("{}/b/id/{}-L.jpg", self.image_url, cover_id)
    }

    async fn search_cover_id(&self, title: &str) -> AppResult<Option<u64>> {
        let url = format!("{}/search.json", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("title", title), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Open Library returned status {}",
                response.status()
            )));
        }

        let results: SearchResponse = response.json().await?;
        Ok(results.docs.first().and_then(|doc| doc.cover_i))
    }
}

#[async_trait::async_trait]
impl CoverLookup for OpenLibraryCovers {
    async fn cover_for(&self, title: &str) -> String {
        match self.search_cover_id(title).await {
            Ok(Some(cover_id)) => self.image_for(cover_id),
            Ok(None) => {
                tracing::debug!(title = %title, "No cover found, using fallback");
                FALLBACK_COVER_URL.to_string()
            }
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "Cover lookup failed");
                FALLBACK_COVER_URL.to_string()
            }
        }
    }
}

/// Cover lookup that always answers with the fallback cover
#[derive(Clone, Copy, Default)]
pub struct NoCovers;

#[async_trait::async_trait]
impl CoverLookup for NoCovers {
    async fn cover_for(&self, _title: &str) -> String {
        FALLBACK_COVER_URL.to_string()
    }
}
