use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Book, NewBook, Role, Seat, Session, ZoneSummary},
    services::{CommandOutcome, Completion, LibraryCommand, RecommendationPanel},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session: Session,
    pub wishlist_count: usize,
    pub borrowed_count: usize,
    pub history: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetailsResponse {
    pub book: Book,
    pub wishlisted: bool,
    pub borrowed: bool,
    pub recommendations: Option<RecommendationPanel>,
    /// True when the visitor opened another book before recommendations arrived
    pub superseded: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub book: Book,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct SeatsResponse {
    pub total: usize,
    pub available: usize,
    pub zones: Vec<ZoneSummary>,
    pub seats: Vec<Seat>,
}

fn unexpected(outcome: CommandOutcome) -> AppError {
    AppError::Internal(format!("Unexpected command outcome: {:?}", outcome))
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "ai_recommendations": state.recommender.is_ai_backed(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<Session>> {
    let session = state
        .verifier
        .verify(&request.username, request.role, request.password.as_deref())
        .await
        .map_err(|e| {
            tracing::warn!(
                request_id = %request_id,
                username = %request.username,
                role = ?request.role,
                method = state.verifier.method_name(),
                error = %e,
                "Login rejected"
            );
            AppError::from(e)
        })?;

    match state.login(session).await? {
        CommandOutcome::LoggedIn(session) => Ok(Json(session)),
        other => Err(unexpected(other)),
    }
}

pub async fn logout(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_session(State(state): State<AppState>) -> AppResult<Json<SessionResponse>> {
    let library = state.library.read().await;
    let session = library.require_session()?.clone();

    Ok(Json(SessionResponse {
        session,
        wishlist_count: library.wishlist().len(),
        borrowed_count: library.borrowed().len(),
        history: library
            .history()
            .titles()
            .into_iter()
            .map(str::to_string)
            .collect(),
    }))
}

/// Catalog listing, optionally filtered by title, author or genre
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let library = state.library.read().await;
    library.require_session()?;
    Ok(Json(library.catalog().search(&params.q)))
}

/// Opens a book and fetches recommendations for it
pub async fn view_book(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> AppResult<Json<BookDetailsResponse>> {
    let (book, pending) = match state
        .library
        .write()
        .await
        .apply(LibraryCommand::ViewBook(id))?
    {
        CommandOutcome::Viewing { book, pending } => (book, pending),
        other => return Err(unexpected(other)),
    };

    tracing::info!(
        request_id = %request_id,
        book_id = %book.id,
        candidates = pending.request.candidates.len(),
        "Fetching recommendations"
    );

    // No lock is held while the model thinks
    let result = state.recommender.recommend(&pending.request).await;

    let mut library = state.library.write().await;
    let completion = library.complete_recommendation(&pending.ticket, result);

    if completion == Completion::Superseded {
        tracing::info!(
            request_id = %request_id,
            book_id = %book.id,
            "Recommendations superseded by a newer view"
        );
    }

    let book = library.catalog().get(&book.id).cloned().unwrap_or(book);
    Ok(Json(BookDetailsResponse {
        wishlisted: library.is_wishlisted(&book.id),
        borrowed: library.is_borrowed(&book.id),
        recommendations: match completion {
            Completion::Applied => library.panel().cloned(),
            Completion::Superseded => None,
        },
        superseded: completion == Completion::Superseded,
        book,
    }))
}

/// Recommendations currently shown for the focal book
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<RecommendationPanel>> {
    let library = state.library.read().await;
    library.require_session()?;

    library
        .panel()
        .filter(|panel| panel.focal_id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No recommendations for book {}", id)))
}

pub async fn go_home(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.library.write().await.apply(LibraryCommand::GoHome)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_wishlist(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let library = state.library.read().await;
    library.require_session()?;
    Ok(Json(library.wishlist()))
}

pub async fn toggle_wishlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ToggleResponse>> {
    match state
        .library
        .write()
        .await
        .apply(LibraryCommand::ToggleWishlist(id))?
    {
        CommandOutcome::Wishlist { book, wishlisted } => Ok(Json(ToggleResponse {
            book,
            active: wishlisted,
        })),
        other => Err(unexpected(other)),
    }
}

pub async fn get_borrowed(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let library = state.library.read().await;
    library.require_session()?;
    Ok(Json(library.borrowed()))
}

/// Borrows the book, or returns it if the visitor already has it
pub async fn toggle_borrow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ToggleResponse>> {
    match state
        .library
        .write()
        .await
        .apply(LibraryCommand::ToggleBorrow(id))?
    {
        CommandOutcome::Loan { book, borrowed } => Ok(Json(ToggleResponse {
            book,
            active: borrowed,
        })),
        other => Err(unexpected(other)),
    }
}

/// Live seat occupancy
pub async fn get_seats(State(state): State<AppState>) -> AppResult<Json<SeatsResponse>> {
    state.library.read().await.require_session()?;

    let seats = state.seats.read().await;
    Ok(Json(SeatsResponse {
        total: seats.total(),
        available: seats.available(),
        zones: seats.zones(),
        seats: seats.seats().to_vec(),
    }))
}

/// Adds a book, looking up its cover first
pub async fn add_book(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<NewBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    {
        let library = state.library.read().await;
        if !library.require_session()?.is_admin() {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }
    }

    if request.title.trim().is_empty() || request.author.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Title and author are required".to_string(),
        ));
    }

    let cover_url = state.covers.cover_for(request.title.trim()).await;
    let book = request.into_book(cover_url);

    tracing::info!(
        request_id = %request_id,
        title = %book.title,
        cover = %book.cover_url,
        "Adding book"
    );

    match state
        .library
        .write()
        .await
        .apply(LibraryCommand::AddBook(book))?
    {
        CommandOutcome::Added(book) => Ok((StatusCode::CREATED, Json(book))),
        other => Err(unexpected(other)),
    }
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    match state
        .library
        .write()
        .await
        .apply(LibraryCommand::DeleteBook(id))?
    {
        CommandOutcome::Deleted(book) => Ok(Json(book)),
        other => Err(unexpected(other)),
    }
}

pub async fn toggle_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    match state
        .library
        .write()
        .await
        .apply(LibraryCommand::ToggleStock(id))?
    {
        CommandOutcome::StockChanged(book) => Ok(Json(book)),
        other => Err(unexpected(other)),
    }
}
