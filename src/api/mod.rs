//! HTTP handlers for the catalog site

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;
pub mod health;

use axum::{
    http::{header, HeaderValue},
    response::Redirect,
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookView},
    AppState,
};

/// Build the application router with all routes.
///
/// Literal segments (`create`) are registered ahead of `:id` routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/catalog") }))
        // Probes
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Dashboard
        .route("/catalog", get(catalog::index))
        .route("/catalog/", get(catalog::index))
        // Books
        .route("/catalog/book/create", get(books::create_form).post(books::create))
        .route("/catalog/book/:id/delete", get(books::delete_form).post(books::delete))
        .route("/catalog/book/:id/update", get(books::update_form).post(books::update))
        .route("/catalog/book/:id", get(books::detail))
        .route("/catalog/books", get(books::list))
        // Authors
        .route("/catalog/author/create", get(authors::create_form).post(authors::create))
        .route("/catalog/author/:id/delete", get(authors::delete_form).post(authors::delete))
        .route("/catalog/author/:id/update", get(authors::update_form).post(authors::update))
        .route("/catalog/author/:id", get(authors::detail))
        .route("/catalog/authors", get(authors::list))
        // Genres
        .route("/catalog/genre/create", get(genres::create_form).post(genres::create))
        .route("/catalog/genre/:id/delete", get(genres::delete_form).post(genres::delete))
        .route("/catalog/genre/:id/update", get(genres::update_form).post(genres::update))
        .route("/catalog/genre/:id", get(genres::detail))
        .route("/catalog/genres", get(genres::list))
        // Book instances
        .route(
            "/catalog/bookinstance/create",
            get(book_instances::create_form).post(book_instances::create),
        )
        .route(
            "/catalog/bookinstance/:id/delete",
            get(book_instances::delete_form).post(book_instances::delete),
        )
        .route(
            "/catalog/bookinstance/:id/update",
            get(book_instances::update_form).post(book_instances::update),
        )
        .route("/catalog/bookinstance/:id", get(book_instances::detail))
        .route("/catalog/bookinstances", get(book_instances::list))
        .fallback(not_found)
        .with_state(state)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}

/// Parse an id taken from the URL. A malformed id cannot name a stored
/// document, so it is reported as not found.
pub(crate) fn parse_id(raw: &str, entity: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| missing(entity))
}

pub(crate) fn missing(entity: &str) -> AppError {
    AppError::NotFound(format!("{} not found", entity))
}

/// Title and summary of books listed under an author or genre
pub(crate) fn book_summaries(books: &[Book]) -> Vec<BookView> {
    books
        .iter()
        .map(|book| BookView::populate(book, &[], &[]))
        .collect()
}
