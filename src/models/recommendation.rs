use serde::{Deserialize, Serialize};

use super::{Book, InteractionHistory};

/// Everything the recommender needs for one focal book
#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    pub focal: Book,
    pub history: Vec<Book>,
    /// Catalog minus the focal book, in catalog order
    pub candidates: Vec<Book>,
}

impl RecommendationRequest {
    /// Snapshots the session, excluding the focal book from the candidate set.
    pub fn new(focal: Book, history: &InteractionHistory, catalog: &[Book]) -> Self {
        let candidates = catalog
            .iter()
            .filter(|b| b.id != focal.id)
            .cloned()
            .collect();

        Self {
            focal,
            history: history.items().to_vec(),
            candidates,
        }
    }

    /// Compact outbound form of the candidates
    pub fn candidate_summaries(&self) -> Vec<CandidateSummary<'_>> {
        self.candidates.iter().map(CandidateSummary::from).collect()
    }

    pub fn history_titles(&self) -> String {
        self.history
            .iter()
            .map(|b| b.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The fields of a candidate that matter for thematic matching.
///
/// Rating, availability and cover are left out of the outbound payload.
#[derive(Debug, Serialize)]
pub struct CandidateSummary<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub author: &'a str,
    pub genre: &'a str,
    pub description: &'a str,
}

impl<'a> From<&'a Book> for CandidateSummary<'a> {
    fn from(book: &'a Book) -> Self {
        Self {
            id: &book.id,
            title: &book.title,
            author: &book.author,
            genre: &book.genre,
            description: &book.description,
        }
    }
}

/// Recommended book ids plus a justification meant for direct display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub recommended_book_ids: Vec<String>,
    pub reasoning: String,
}

impl RecommendationResult {
    pub fn new(recommended_book_ids: Vec<String>, reasoning: impl Into<String>) -> Self {
        Self {
            recommended_book_ids,
            reasoning: reasoning.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recommended_book_ids.is_empty()
    }
}
