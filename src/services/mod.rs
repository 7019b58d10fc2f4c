pub mod auth;
pub mod catalog;
pub mod covers;
pub mod library;
pub mod recommender;
pub mod seats;

pub use auth::{ConfiguredVerifier, CredentialVerifier};
pub use catalog::Catalog;
pub use covers::{CoverLookup, NoCovers, OpenLibraryCovers};
pub use library::{Completion, CommandOutcome, Library, LibraryCommand, RecommendationPanel};
pub use recommender::{GenerativeModel, RecommendationClient};
pub use seats::{SeatMap, SeatSimulator};
