use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shown when no cover could be found for a newly added book
pub const FALLBACK_COVER_URL: &str =
    "https://images.unsplash.com/photo-1543002588-bfa74002ed7e?auto=format&fit=crop&w=400&q=80";

/// Description given to books added through the admin dashboard
pub const NEW_BOOK_DESCRIPTION: &str = "A newly added book to the collection.";

/// Whether a book can currently be borrowed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Availability {
    #[serde(rename = "In Stock")]
    Available,
    #[serde(rename = "Out of Stock")]
    Unavailable,
}

impl Availability {
    pub fn toggled(self) -> Self {
        match self {
            Availability::Available => Availability::Unavailable,
            Availability::Unavailable => Availability::Available,
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Stable identifier, unique within the catalog
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub status: Availability,
    pub cover_url: String,
    /// 1.0 to 5.0
    pub rating: f32,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.status == Availability::Available
    }
}

/// Fields an administrator supplies when adding a book
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genre: Option<String>,
}

impl NewBook {
    /// Builds the catalog entry, filling in the defaults for everything the form omits.
    pub fn into_book(self, cover_url: String) -> Book {
        let genre = self
            .genre
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| "General".to_string());

        Book {
            id: Uuid::new_v4().to_string(),
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            genre,
            description: NEW_BOOK_DESCRIPTION.to_string(),
            status: Availability::Available,
            cover_url,
            rating: 4.0,
        }
    }
}
