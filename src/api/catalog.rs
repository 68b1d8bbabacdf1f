//! Home page

use axum::{extract::State, response::Html};
use tera::Context;

use crate::{error::AppResult, views, AppState};

/// Collection counts; rendered even when some of them failed
pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let counts = state.services.catalog.counts().await;

    let mut context = Context::new();
    context.insert("title", "Local Library Home");
    context.insert("error", &counts.error);
    context.insert("data", &counts);
    views::render("index", &context)
}
