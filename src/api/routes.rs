use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Session
        .route("/session", get(handlers::get_session))
        .route("/session/login", post(handlers::login))
        .route("/session/logout", post(handlers::logout))
        .route("/session/home", post(handlers::go_home))
        // Catalog
        .route("/books", get(handlers::list_books))
        .route("/books/:id", get(handlers::view_book))
        .route("/books/:id/recommendations", get(handlers::get_recommendations))
        .route("/books/:id/borrow", post(handlers::toggle_borrow))
        .route("/borrowed", get(handlers::get_borrowed))
        // Wishlist
        .route("/wishlist", get(handlers::get_wishlist))
        .route("/wishlist/:id", post(handlers::toggle_wishlist))
        // Live seats
        .route("/seats", get(handlers::get_seats))
        // Admin dashboard
        .route("/admin/books", post(handlers::add_book))
        .route("/admin/books/:id", delete(handlers::delete_book))
        .route("/admin/books/:id/stock", post(handlers::toggle_stock))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
