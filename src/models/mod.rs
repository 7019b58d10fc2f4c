mod book;
mod history;
mod recommendation;
mod seat;
mod session;

pub use book::{Availability, Book, NewBook, FALLBACK_COVER_URL, NEW_BOOK_DESCRIPTION};
pub use history::InteractionHistory;
pub use recommendation::{CandidateSummary, RecommendationRequest, RecommendationResult};
pub use seat::{Seat, Zone, ZoneSummary};
pub use session::{Role, Session};
