//! Book pages

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Serialize;
use tera::Context;
use uuid::Uuid;

use super::{missing, parse_id};
use crate::{
    error::AppResult,
    models::{
        author::AuthorOption, genre::GenreOption, Book, BookInput, BookInstance, BookInstanceView,
        BookView,
    },
    services::DeleteOutcome,
    validation::{validate, FieldError, FormFields, Validated},
    views, AppState,
};

const LIST_URL: &str = "/catalog/books";

pub async fn list(State(state): State<AppState>) -> AppResult<Html<String>> {
    let book_list = state.services.books.list().await?;

    let mut context = Context::new();
    context.insert("title", "Book List");
    context.insert("book_list", &book_list);
    views::render("book_list", &context)
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&id, "Book")?;
    let (book, copies) = state
        .services
        .books
        .detail(id)
        .await?
        .ok_or_else(|| missing("Book"))?;

    let mut context = Context::new();
    context.insert("title", &book.title);
    context.insert("book", &book);
    context.insert("book_instances", &copy_views(&copies));
    views::render("book_detail", &context)
}

pub async fn create_form(State(state): State<AppState>) -> AppResult<Html<String>> {
    let (authors, genres) = state.services.books.form_options().await?;
    render_form(
        "Create Book",
        &serde_json::Map::new(),
        AuthorOption::list(&authors, ""),
        GenreOption::list(&genres, &[]),
        &[],
    )
}

pub async fn create(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let mut validated = validate(&FormFields::from(fields), &BookInput::rules());
    if let Some(input) = checked_input(&state, &mut validated).await? {
        let book = state.services.books.create(input).await?;
        return Ok(Redirect::to(&book.url()).into_response());
    }

    Ok(rerender(&state, "Create Book", &validated).await?.into_response())
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&id, "Book")?;
    let (book, authors, genres) = state
        .services
        .books
        .edit_form(id)
        .await?
        .ok_or_else(|| missing("Book"))?;

    render_form(
        "Update Book",
        &book.form_values(),
        AuthorOption::list(&authors, &book.author.to_string()),
        GenreOption::list(&genres, &book.genre_ids()),
        &[],
    )
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let id = parse_id(&id, "Book")?;
    let mut validated = validate(&FormFields::from(fields), &BookInput::rules());
    if let Some(input) = checked_input(&state, &mut validated).await? {
        let book = state
            .services
            .books
            .update(id, input)
            .await?
            .ok_or_else(|| missing("Book"))?;
        return Ok(Redirect::to(&book.url()).into_response());
    }

    Ok(rerender(&state, "Update Book", &validated).await?.into_response())
}

pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let Ok(id) = Uuid::parse_str(&id) else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };
    match state.services.books.with_copies(id).await? {
        Some((book, copies)) => Ok(render_delete(&book, &copies)?.into_response()),
        None => Ok(Redirect::to(LIST_URL).into_response()),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = FormFields::from(fields);
    let Some(id) = form.scalar("bookid").and_then(|raw| Uuid::parse_str(raw.trim()).ok()) else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };

    match state.services.books.delete(id).await? {
        DeleteOutcome::Blocked { target, dependents } => {
            Ok(render_delete(&target, &dependents)?.into_response())
        }
        DeleteOutcome::Missing | DeleteOutcome::Deleted => Ok(Redirect::to(LIST_URL).into_response()),
    }
}

/// Parsed input once the rule chains passed and every reference resolved
async fn checked_input(state: &AppState, validated: &mut Validated) -> AppResult<Option<BookInput>> {
    if !validated.is_valid() {
        return Ok(None);
    }
    let Some(input) = BookInput::from_validated(validated) else {
        return Ok(None);
    };
    state.services.books.check_references(&input, validated).await?;
    Ok(validated.is_valid().then_some(input))
}

/// Form again, with the submitted choices kept selected
async fn rerender(state: &AppState, title: &str, validated: &Validated) -> AppResult<Html<String>> {
    let (authors, genres) = state.services.books.form_options().await?;
    render_form(
        title,
        validated.values(),
        AuthorOption::list(&authors, validated.value("author")),
        GenreOption::list(&genres, validated.list("genre")),
        validated.errors(),
    )
}

fn render_form<V: Serialize + ?Sized>(
    title: &str,
    values: &V,
    authors: Vec<AuthorOption>,
    genres: Vec<GenreOption>,
    errors: &[FieldError],
) -> AppResult<Html<String>> {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("values", values);
    context.insert("authors", &authors);
    context.insert("genres", &genres);
    context.insert("errors", errors);
    views::render("book_form", &context)
}

fn render_delete(book: &Book, copies: &[BookInstance]) -> AppResult<Html<String>> {
    let mut context = Context::new();
    context.insert("title", "Delete Book");
    context.insert("book", &BookView::populate(book, &[], &[]));
    context.insert("book_instances", &copy_views(copies));
    views::render("book_delete", &context)
}

fn copy_views(copies: &[BookInstance]) -> Vec<BookInstanceView> {
    copies.iter().map(BookInstanceView::from).collect()
}
