//! Genre pages

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Serialize;
use tera::Context;
use uuid::Uuid;

use super::{book_summaries, missing, parse_id};
use crate::{
    error::AppResult,
    models::{Book, Genre, GenreInput, GenreView},
    services::DeleteOutcome,
    validation::{validate, FieldError, FormFields},
    views, AppState,
};

const LIST_URL: &str = "/catalog/genres";

pub async fn list(State(state): State<AppState>) -> AppResult<Html<String>> {
    let genres = state.services.genres.list().await?;
    let genre_list: Vec<GenreView> = genres.iter().map(GenreView::from).collect();

    let mut context = Context::new();
    context.insert("title", "Genre List");
    context.insert("genre_list", &genre_list);
    views::render("genre_list", &context)
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&id, "Genre")?;
    let (genre, books) = state
        .services
        .genres
        .with_books(id)
        .await?
        .ok_or_else(|| missing("Genre"))?;

    let mut context = Context::new();
    context.insert("title", "Genre Detail");
    context.insert("genre", &GenreView::from(&genre));
    context.insert("genre_books", &book_summaries(&books));
    views::render("genre_detail", &context)
}

pub async fn create_form() -> AppResult<Html<String>> {
    render_form("Create Genre", &serde_json::Map::new(), &[])
}

/// Submitting a name that is already stored leads to that genre
pub async fn create(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let validated = validate(&FormFields::from(fields), &GenreInput::rules());
    if !validated.is_valid() {
        return Ok(render_form("Create Genre", validated.values(), validated.errors())?.into_response());
    }

    let created = state
        .services
        .genres
        .create(GenreInput::from_validated(&validated))
        .await?;
    Ok(Redirect::to(&created.genre().url()).into_response())
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&id, "Genre")?;
    let genre = state
        .services
        .genres
        .get(id)
        .await?
        .ok_or_else(|| missing("Genre"))?;
    render_form("Update Genre", &genre.form_values(), &[])
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let id = parse_id(&id, "Genre")?;
    let validated = validate(&FormFields::from(fields), &GenreInput::rules());
    if !validated.is_valid() {
        return Ok(render_form("Update Genre", validated.values(), validated.errors())?.into_response());
    }

    let genre = state
        .services
        .genres
        .update(id, GenreInput::from_validated(&validated))
        .await?
        .ok_or_else(|| missing("Genre"))?;
    Ok(Redirect::to(&genre.url()).into_response())
}

pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let Ok(id) = Uuid::parse_str(&id) else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };
    match state.services.genres.with_books(id).await? {
        Some((genre, books)) => Ok(render_delete(&genre, &books)?.into_response()),
        None => Ok(Redirect::to(LIST_URL).into_response()),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = FormFields::from(fields);
    let Some(id) = form.scalar("genreid").and_then(|raw| Uuid::parse_str(raw.trim()).ok()) else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };

    match state.services.genres.delete(id).await? {
        DeleteOutcome::Blocked { target, dependents } => {
            Ok(render_delete(&target, &dependents)?.into_response())
        }
        DeleteOutcome::Missing | DeleteOutcome::Deleted => Ok(Redirect::to(LIST_URL).into_response()),
    }
}

fn render_form<V: Serialize + ?Sized>(
    title: &str,
    values: &V,
    errors: &[FieldError],
) -> AppResult<Html<String>> {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("values", values);
    context.insert("errors", errors);
    views::render("genre_form", &context)
}

fn render_delete(genre: &Genre, books: &[Book]) -> AppResult<Html<String>> {
    let mut context = Context::new();
    context.insert("title", "Delete Genre");
    context.insert("genre", &GenreView::from(genre));
    context.insert("genre_books", &book_summaries(books));
    views::render("genre_delete", &context)
}
