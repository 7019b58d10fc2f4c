//! Session state for one library visitor.
//!
//! `Library` owns everything the visitor can change: the catalog, their
//! browsing history, wishlist and loans, the book in focus, and the
//! recommendation panel shown next to it. All mutations go through
//! [`Library::apply`].
//!
//! Recommendations are fetched outside the state lock. Each fetch is tied to a
//! [`RecommendationTicket`]; a result is only shown if its ticket is still the
//! latest one issued and the visitor is still looking at the same book.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{
        Availability, Book, InteractionHistory, RecommendationRequest, RecommendationResult,
        Session,
    },
    services::catalog::Catalog,
};

/// Identifies one recommendation fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationTicket {
    seq: u64,
    focal_id: String,
}

impl RecommendationTicket {
    pub fn focal_id(&self) -> &str {
        &self.focal_id
    }
}

/// A fetch the caller should run and report back through `complete_recommendation`
#[derive(Debug, Clone)]
pub struct PendingRecommendation {
    pub ticket: RecommendationTicket,
    pub request: RecommendationRequest,
}

/// Recommendations currently shown for the focal book
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationPanel {
    pub focal_id: String,
    pub books: Vec<Book>,
    pub reasoning: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The visitor moved on before the result arrived; it was discarded
    Superseded,
}

#[derive(Debug, Clone)]
pub enum LibraryCommand {
    Login(Session),
    Logout,
    ViewBook(String),
    GoHome,
    ToggleWishlist(String),
    ToggleBorrow(String),
    AddBook(Book),
    DeleteBook(String),
    ToggleStock(String),
}

impl LibraryCommand {
    fn requires_admin(&self) -> bool {
        matches!(
            self,
            LibraryCommand::AddBook(_)
                | LibraryCommand::DeleteBook(_)
                | LibraryCommand::ToggleStock(_)
        )
    }
}

#[derive(Debug, Clone)]
pub enum CommandOutcome {
    LoggedIn(Session),
    LoggedOut,
    Viewing {
        book: Book,
        pending: PendingRecommendation,
    },
    Home,
    Wishlist {
        book: Book,
        wishlisted: bool,
    },
    Loan {
        book: Book,
        borrowed: bool,
    },
    Added(Book),
    Deleted(Book),
    StockChanged(Book),
}

#[derive(Debug, Default)]
pub struct Library {
    catalog: Catalog,
    history: InteractionHistory,
    wishlist: Vec<String>,
    borrowed: Vec<String>,
    focal: Option<String>,
    panel: Option<RecommendationPanel>,
    session: Option<Session>,
    latest_ticket: u64,
}

impl Library {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn history(&self) -> &InteractionHistory {
        &self.history
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn require_session(&self) -> AppResult<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("Login required".to_string()))
    }

    pub fn focal(&self) -> Option<&Book> {
        self.focal.as_deref().and_then(|id| self.catalog.get(id))
    }

    pub fn panel(&self) -> Option<&RecommendationPanel> {
        self.panel.as_ref()
    }

    pub fn wishlist(&self) -> Vec<Book> {
        self.lookup(&self.wishlist)
    }

    pub fn borrowed(&self) -> Vec<Book> {
        self.lookup(&self.borrowed)
    }

    pub fn is_wishlisted(&self, id: &str) -> bool {
        self.wishlist.iter().any(|w| w == id)
    }

    pub fn is_borrowed(&self, id: &str) -> bool {
        self.borrowed.iter().any(|b| b == id)
    }

    /// Books for `ids`, in the order the ids were added
    fn lookup(&self, ids: &[String]) -> Vec<Book> {
        ids.iter()
            .filter_map(|id| self.catalog.get(id))
            .cloned()
            .collect()
    }

    pub fn apply(&mut self, command: LibraryCommand) -> AppResult<CommandOutcome> {
        if !matches!(command, LibraryCommand::Login(_)) {
            let session = self.require_session()?;
            if command.requires_admin() && !session.is_admin() {
                return Err(AppError::Forbidden("Admin role required".to_string()));
            }
        }

        match command {
            LibraryCommand::Login(session) => {
                self.reset_session();
                tracing::info!(username = %session.username, role = ?session.role, "Logged in");
                self.session = Some(session.clone());
                Ok(CommandOutcome::LoggedIn(session))
            }
            LibraryCommand::Logout => {
                if let Some(session) = &self.session {
                    tracing::info!(username = %session.username, "Logged out");
                }
                self.reset_session();
                Ok(CommandOutcome::LoggedOut)
            }
            LibraryCommand::ViewBook(id) => self.view_book(&id),
            LibraryCommand::GoHome => {
                self.focal = None;
                self.panel = None;
                Ok(CommandOutcome::Home)
            }
            LibraryCommand::ToggleWishlist(id) => {
                let book = self.catalog.require(&id)?.clone();
                let wishlisted = if self.is_wishlisted(&id) {
                    self.wishlist.retain(|w| *w != id);
                    false
                } else {
                    self.wishlist.push(id);
                    true
                };
                Ok(CommandOutcome::Wishlist { book, wishlisted })
            }
            LibraryCommand::ToggleBorrow(id) => self.toggle_borrow(&id),
            LibraryCommand::AddBook(book) => {
                if book.title.trim().is_empty() || book.author.trim().is_empty() {
                    return Err(AppError::InvalidInput(
                        "Title and author are required".to_string(),
                    ));
                }
                self.catalog.insert_front(book.clone())?;
                tracing::info!(book_id = %book.id, title = %book.title, "Book added");
                Ok(CommandOutcome::Added(book))
            }
            LibraryCommand::DeleteBook(id) => {
                let book = self.catalog.remove(&id)?;
                self.wishlist.retain(|w| *w != id);
                self.borrowed.retain(|b| *b != id);

                if self.focal.as_deref() == Some(id.as_str()) {
                    self.focal = None;
                    self.panel = None;
                } else if let Some(panel) = &mut self.panel {
                    panel.books.retain(|b| b.id != id);
                }

                tracing::info!(book_id = %id, title = %book.title, "Book deleted");
                Ok(CommandOutcome::Deleted(book))
            }
            LibraryCommand::ToggleStock(id) => {
                let book = self.catalog.toggle_stock(&id)?.clone();
                tracing::info!(book_id = %id, status = ?book.status, "Stock status changed");
                Ok(CommandOutcome::StockChanged(book))
            }
        }
    }

    fn view_book(&mut self, id: &str) -> AppResult<CommandOutcome> {
        let book = self.catalog.require(id)?.clone();

        self.focal = Some(book.id.clone());
        self.panel = None;
        self.history.push(book.clone());

        let pending = self.begin_recommendation(&book);
        Ok(CommandOutcome::Viewing { book, pending })
    }

    fn begin_recommendation(&mut self, focal: &Book) -> PendingRecommendation {
        self.latest_ticket += 1;
        let ticket = RecommendationTicket {
            seq: self.latest_ticket,
            focal_id: focal.id.clone(),
        };
        let request = RecommendationRequest::new(focal.clone(), &self.history, self.catalog.all());

        PendingRecommendation { ticket, request }
    }

    /// Shows a finished recommendation if it still belongs to the current view
    pub fn complete_recommendation(
        &mut self,
        ticket: &RecommendationTicket,
        result: RecommendationResult,
    ) -> Completion {
        let current = self.session.is_some()
            && ticket.seq == self.latest_ticket
            && self.focal.as_deref() == Some(ticket.focal_id.as_str());

        if !current {
            tracing::debug!(
                focal_id = %ticket.focal_id,
                seq = ticket.seq,
                latest = self.latest_ticket,
                "Discarding stale recommendation"
            );
            return Completion::Superseded;
        }

        // Candidates are the catalog minus the focal book
        let candidate_ids: Vec<String> = result
            .recommended_book_ids
            .iter()
            .filter(|id| **id != ticket.focal_id)
            .cloned()
            .collect();
        let books = self.catalog.resolve(&candidate_ids);
        if books.len() < result.recommended_book_ids.len() {
            tracing::debug!(
                returned = result.recommended_book_ids.len(),
                kept = books.len(),
                "Dropped recommended ids outside the candidate set"
            );
        }

        self.panel = Some(RecommendationPanel {
            focal_id: ticket.focal_id.clone(),
            books,
            reasoning: result.reasoning,
            generated_at: Utc::now(),
        });
        Completion::Applied
    }

    fn toggle_borrow(&mut self, id: &str) -> AppResult<CommandOutcome> {
        let book = self.catalog.require(id)?;

        if self.is_borrowed(id) {
            self.borrowed.retain(|b| b != id);
            let book = self.catalog.set_availability(id, Availability::Available)?.clone();
            tracing::info!(book_id = %id, "Book returned");
            return Ok(CommandOutcome::Loan {
                book,
                borrowed: false,
            });
        }

        if !book.is_available() {
            return Err(AppError::Conflict(format!(
                "\"{}\" is currently out of stock",
                book.title
            )));
        }

        self.borrowed.push(id.to_string());
        let book = self.catalog.set_availability(id, Availability::Unavailable)?.clone();
        tracing::info!(book_id = %id, "Book borrowed");
        Ok(CommandOutcome::Loan {
            book,
            borrowed: true,
        })
    }

    fn reset_session(&mut self) {
        self.session = None;
        self.history.clear();
        self.wishlist.clear();
        self.borrowed.clear();
        self.focal = None;
        self.panel = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{test_support::book, Role};

    fn student_library() -> Library {
        let mut library = Library::new(Catalog::new(vec![
            book("a", "Alpha"),
            book("b", "Beta"),
            book("c", "Gamma"),
            book("d", "Delta"),
        ]));
        library
            .apply(LibraryCommand::Login(Session::new("ada", Role::Student)))
            .unwrap();
        library
    }

    fn view(library: &mut Library, id: &str) -> PendingRecommendation {
        match library.apply(LibraryCommand::ViewBook(id.to_string())).unwrap() {
            CommandOutcome::Viewing { pending, .. } => pending,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    fn answer(ids: &[&str]) -> RecommendationResult {
        RecommendationResult::new(ids.iter().map(|s| s.to_string()).collect(), "because")
    }

    #[test]
    fn test_commands_require_login() {
        let mut library = Library::new(Catalog::new(vec![book("a", "Alpha")]));
        let err = library
            .apply(LibraryCommand::ViewBook("a".to_string()))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_admin_commands_require_admin() {
        let mut library = student_library();
        let err = library
            .apply(LibraryCommand::ToggleStock("a".to_string()))
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        library
            .apply(LibraryCommand::Login(Session::new("root", Role::Admin)))
            .unwrap();
        assert!(library
            .apply(LibraryCommand::ToggleStock("a".to_string()))
            .is_ok());
    }

    #[test]
    fn test_view_builds_request_and_history() {
        let mut library = student_library();
        view(&mut library, "a");
        let pending = view(&mut library, "b");

        assert_eq!(pending.ticket.focal_id(), "b");
        assert_eq!(pending.request.focal.id, "b");
        let candidates: Vec<&str> = pending.request.candidates.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(candidates, vec!["a", "c", "d"]);
        assert_eq!(pending.request.history_titles(), "Alpha, Beta");
        assert_eq!(library.focal().map(|b| b.id.as_str()), Some("b"));
    }

    #[test]
    fn test_repeat_view_does_not_grow_history() {
        let mut library = student_library();
        view(&mut library, "a");
        view(&mut library, "a");
        assert_eq!(library.history().len(), 1);
        view(&mut library, "b");
        assert_eq!(library.history().len(), 2);
    }

    #[test]
    fn test_completion_filters_unknown_ids() {
        let mut library = student_library();
        let pending = view(&mut library, "a");

        let outcome = library.complete_recommendation(&pending.ticket, answer(&["d", "ghost", "b"]));
        assert_eq!(outcome, Completion::Applied);

        let panel = library.panel().unwrap();
        let ids: Vec<&str> = panel.books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d"]);
        assert_eq!(panel.reasoning, "because");
        assert_eq!(panel.focal_id, "a");
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut library = student_library();
        let first = view(&mut library, "a");
        let second = view(&mut library, "b");

        // The slower response for "a" arrives after the visitor moved to "b"
        assert_eq!(
            library.complete_recommendation(&first.ticket, answer(&["c"])),
            Completion::Superseded
        );
        assert!(library.panel().is_none());

        assert_eq!(
            library.complete_recommendation(&second.ticket, answer(&["d"])),
            Completion::Applied
        );
        assert_eq!(library.panel().unwrap().focal_id, "b");
    }

    #[test]
    fn test_revisiting_same_book_supersedes_older_ticket() {
        let mut library = student_library();
        let first = view(&mut library, "a");
        view(&mut library, "b");
        let third = view(&mut library, "a");

        assert_eq!(
            library.complete_recommendation(&first.ticket, answer(&["c"])),
            Completion::Superseded
        );
        assert_eq!(
            library.complete_recommendation(&third.ticket, answer(&["c"])),
            Completion::Applied
        );
    }

    #[test]
    fn test_go_home_discards_pending_result() {
        let mut library = student_library();
        let pending = view(&mut library, "a");
        library.apply(LibraryCommand::GoHome).unwrap();

        assert_eq!(
            library.complete_recommendation(&pending.ticket, answer(&["b"])),
            Completion::Superseded
        );
        assert!(library.focal().is_none());
    }

    #[test]
    fn test_borrow_and_return() {
        let mut library = student_library();

        match library.apply(LibraryCommand::ToggleBorrow("a".to_string())).unwrap() {
            CommandOutcome::Loan { book, borrowed } => {
                assert!(borrowed);
                assert_eq!(book.status, Availability::Unavailable);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(library.borrowed().len(), 1);
        assert!(!library.catalog().get("a").unwrap().is_available());

        match library.apply(LibraryCommand::ToggleBorrow("a".to_string())).unwrap() {
            CommandOutcome::Loan { book, borrowed } => {
                assert!(!borrowed);
                assert_eq!(book.status, Availability::Available);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(library.borrowed().is_empty());
    }

    #[test]
    fn test_cannot_borrow_out_of_stock_book() {
        let mut library = student_library();
        library
            .apply(LibraryCommand::Login(Session::new("root", Role::Admin)))
            .unwrap();
        library
            .apply(LibraryCommand::ToggleStock("b".to_string()))
            .unwrap();

        let err = library
            .apply(LibraryCommand::ToggleBorrow("b".to_string()))
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_wishlist_toggle() {
        let mut library = student_library();
        library
            .apply(LibraryCommand::ToggleWishlist("c".to_string()))
            .unwrap();
        library
            .apply(LibraryCommand::ToggleWishlist("a".to_string()))
            .unwrap();

        let titles: Vec<String> = library.wishlist().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Gamma", "Alpha"]);

        match library.apply(LibraryCommand::ToggleWishlist("c".to_string())).unwrap() {
            CommandOutcome::Wishlist { wishlisted, .. } => assert!(!wishlisted),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(library.wishlist().len(), 1);
    }

    #[test]
    fn test_logout_clears_session_state() {
        let mut library = student_library();
        let pending = view(&mut library, "a");
        library
            .apply(LibraryCommand::ToggleWishlist("b".to_string()))
            .unwrap();
        library
            .apply(LibraryCommand::ToggleBorrow("c".to_string()))
            .unwrap();

        library.apply(LibraryCommand::Logout).unwrap();
        assert!(library.session().is_none());
        assert!(library.history().is_empty());
        assert!(library.wishlist().is_empty());
        assert!(library.borrowed().is_empty());
        assert!(library.focal().is_none());
        assert_eq!(
            library.complete_recommendation(&pending.ticket, answer(&["b"])),
            Completion::Superseded
        );
    }

    #[test]
    fn test_delete_book_cleans_up_references() {
        let mut library = student_library();
        library
            .apply(LibraryCommand::ToggleWishlist("b".to_string()))
            .unwrap();
        let pending = view(&mut library, "a");
        library.complete_recommendation(&pending.ticket, answer(&["b", "c"]));

        library
            .apply(LibraryCommand::Login(Session::new("root", Role::Admin)))
            .unwrap();
        // Admin login starts a fresh session
        assert!(library.wishlist().is_empty());

        library
            .apply(LibraryCommand::ToggleWishlist("b".to_string()))
            .unwrap();
        let pending = view(&mut library, "a");
        library.complete_recommendation(&pending.ticket, answer(&["b", "c"]));

        library
            .apply(LibraryCommand::DeleteBook("b".to_string()))
            .unwrap();
        assert!(library.catalog().get("b").is_none());
        assert!(library.wishlist().is_empty());
        let panel_ids: Vec<&str> = library
            .panel()
            .unwrap()
            .books
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(panel_ids, vec!["c"]);

        library
            .apply(LibraryCommand::DeleteBook("a".to_string()))
            .unwrap();
        assert!(library.focal().is_none());
        assert!(library.panel().is_none());
        // History is append-only; deleted books stay in it
        assert_eq!(library.history().titles(), vec!["Alpha"]);
    }

    #[test]
    fn test_delete_keeps_history_free_of_adjacent_repeats() {
        let mut library = student_library();
        library
            .apply(LibraryCommand::Login(Session::new("root", Role::Admin)))
            .unwrap();
        view(&mut library, "a");
        view(&mut library, "b");
        view(&mut library, "a");
        library
            .apply(LibraryCommand::DeleteBook("b".to_string()))
            .unwrap();

        let titles = library.history().titles();
        assert_eq!(titles, vec!["Alpha", "Beta", "Alpha"]);
        assert!(titles.windows(2).all(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn test_completion_never_recommends_focal_book() {
        let mut library = student_library();
        let pending = view(&mut library, "a");

        library.complete_recommendation(&pending.ticket, answer(&["a", "b"]));

        let panel = library.panel().unwrap();
        let ids: Vec<&str> = panel.books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_add_book_goes_first() {
        let mut library = student_library();
        library
            .apply(LibraryCommand::Login(Session::new("root", Role::Admin)))
            .unwrap();

        library
            .apply(LibraryCommand::AddBook(book("z", "Zeta")))
            .unwrap();
        assert_eq!(library.catalog().all()[0].id, "z");

        let mut nameless = book("y", "");
        nameless.title = " ".to_string();
        let err = library.apply(LibraryCommand::AddBook(nameless)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
