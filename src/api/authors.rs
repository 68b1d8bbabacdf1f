//! Author pages

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
    models::{Author, AuthorInput, AuthorView, Book},
    services::DeleteOutcome,
    validation::{validate, FieldError, FormFields},
    views, AppState,
};

const LIST_URL: &str = "/catalog/authors";

pub async fn list(State(state): State<AppState>) -> AppResult<Html<String>> {
    let authors = state.services.authors.list().await?;
    let author_list: Vec<AuthorView> = authors.iter().map(AuthorView::from).collect();

    let mut context = Context::new();
    context.insert("title", "Author List");
    context.insert("author_list", &author_list);
    views::render("author_list", &context)
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&id, "Author")?;
    let (author, books) = state
        .services
        .authors
        .with_books(id)
        .await?
        .ok_or_else(|| missing("Author"))?;

    let mut context = Context::new();
    context.insert("title", "Author Detail");
    context.insert("author", &AuthorView::from(&author));
    context.insert("author_books", &book_summaries(&books));
    views::render("author_detail", &context)
}

pub async fn create_form() -> AppResult<Html<String>> {
    render_form("Create Author", &serde_json::Map::new(), &[])
}

pub async fn create(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let validated = validate(&FormFields::from(fields), &AuthorInput::rules());
    if !validated.is_valid() {
        return Ok(render_form("Create Author", validated.values(), validated.errors())?.into_response());
    }

    let author = state
        .services
        .authors
        .create(AuthorInput::from_validated(&validated))
        .await?;
    Ok(Redirect::to(&author.url()).into_response())
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&id, "Author")?;
    let author = state
        .services
        .authors
        .get(id)
        .await?
        .ok_or_else(|| missing("Author"))?;
    render_form("Update Author", &author.form_values(), &[])
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let id = parse_id(&id, "Author")?;
    let validated = validate(&FormFields::from(fields), &AuthorInput::rules());
    if !validated.is_valid() {
        return Ok(render_form("Update Author", validated.values(), validated.errors())?.into_response());
    }

    let author = state
        .services
        .authors
        .update(id, AuthorInput::from_validated(&validated))
        .await?
        .ok_or_else(|| missing("Author"))?;
    Ok(Redirect::to(&author.url()).into_response())
}

pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let Ok(id) = Uuid::parse_str(&id) else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };
    match state.services.authors.with_books(id).await? {
        Some((author, books)) => Ok(render_delete(&author, &books)?.into_response()),
        None => Ok(Redirect::to(LIST_URL).into_response()),
    }
}

/// The target id comes from the confirmation form, not the URL
pub async fn delete(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = FormFields::from(fields);
    let Some(id) = form.scalar("authorid").and_then(|raw| Uuid::parse_str(raw.trim()).ok()) else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };

    match state.services.authors.delete(id).await? {
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
    views::render("author_form", &context)
}

fn render_delete(author: &Author, books: &[Book]) -> AppResult<Html<String>> {
    let mut context = Context::new();
    context.insert("title", "Delete Author");
    context.insert("author", &AuthorView::from(author));
    context.insert("author_books", &book_summaries(books));
    views::render("author_delete", &context)
}
