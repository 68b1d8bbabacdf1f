//! Book instance (copy) pages

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
        book::BookOption, book_instance::StatusOption, BookInstanceInput, BookInstanceView,
    },
    validation::{validate, FieldError, FormFields, Validated},
    views, AppState,
};

const LIST_URL: &str = "/catalog/bookinstances";

pub async fn list(State(state): State<AppState>) -> AppResult<Html<String>> {
    let bookinstance_list = state.services.book_instances.list().await?;

    let mut context = Context::new();
    context.insert("title", "Book Instance List");
    context.insert("bookinstance_list", &bookinstance_list);
    views::render("bookinstance_list", &context)
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&id, "Book copy")?;
    let copy = state
        .services
        .book_instances
        .detail(id)
        .await?
        .ok_or_else(|| missing("Book copy"))?;

    let title = match &copy.book {
        Some(book) => format!("Copy: {}", book.title),
        None => "Copy".to_string(),
    };
    let mut context = Context::new();
    context.insert("title", &title);
    context.insert("bookinstance", &copy);
    views::render("bookinstance_detail", &context)
}

pub async fn create_form(State(state): State<AppState>) -> AppResult<Html<String>> {
    let books = state.services.book_instances.book_options().await?;
    render_form(
        "Create BookInstance",
        &serde_json::Map::new(),
        BookOption::list(&books, ""),
        StatusOption::list(""),
        &[],
    )
}

pub async fn create(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let mut validated = validate(&FormFields::from(fields), &BookInstanceInput::rules());
    if let Some(input) = checked_input(&state, &mut validated).await? {
        let copy = state.services.book_instances.create(input).await?;
        return Ok(Redirect::to(&copy.url()).into_response());
    }

    Ok(rerender(&state, "Create BookInstance", &validated).await?.into_response())
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_id(&id, "Book copy")?;
    let (copy, books) = state
        .services
        .book_instances
        .edit_form(id)
        .await?
        .ok_or_else(|| missing("Book copy"))?;

    render_form(
        "Update BookInstance",
        &copy.form_values(),
        BookOption::list(&books, &copy.book.to_string()),
        StatusOption::list(copy.status.as_str()),
        &[],
    )
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let id = parse_id(&id, "Book copy")?;
    let mut validated = validate(&FormFields::from(fields), &BookInstanceInput::rules());
    if let Some(input) = checked_input(&state, &mut validated).await? {
        let copy = state
            .services
            .book_instances
            .update(id, input)
            .await?
            .ok_or_else(|| missing("Book copy"))?;
        return Ok(Redirect::to(&copy.url()).into_response());
    }

    Ok(rerender(&state, "Update BookInstance", &validated).await?.into_response())
}

pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let Ok(id) = Uuid::parse_str(&id) else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };
    match state.services.book_instances.detail(id).await? {
        Some(copy) => Ok(render_delete(&copy)?.into_response()),
        None => Ok(Redirect::to(LIST_URL).into_response()),
    }
}

/// Copies have no dependents; a confirmed delete always goes through
pub async fn delete(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<Response> {
    let form = FormFields::from(fields);
    if let Some(id) = form
        .scalar("bookinstanceid")
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    {
        state.services.book_instances.delete(id).await?;
    }
    Ok(Redirect::to(LIST_URL).into_response())
}

async fn checked_input(
    state: &AppState,
    validated: &mut Validated,
) -> AppResult<Option<BookInstanceInput>> {
    if !validated.is_valid() {
        return Ok(None);
    }
    let Some(input) = BookInstanceInput::from_validated(validated) else {
        return Ok(None);
    };
    state
        .services
        .book_instances
        .check_references(&input, validated)
        .await?;
    Ok(validated.is_valid().then_some(input))
}

async fn rerender(state: &AppState, title: &str, validated: &Validated) -> AppResult<Html<String>> {
    let books = state.services.book_instances.book_options().await?;
    render_form(
        title,
        validated.values(),
        BookOption::list(&books, validated.value("book")),
        StatusOption::list(validated.value("status")),
        validated.errors(),
    )
}

fn render_form<V: Serialize + ?Sized>(
    title: &str,
    values: &V,
    books: Vec<BookOption>,
    statuses: Vec<StatusOption>,
    errors: &[FieldError],
) -> AppResult<Html<String>> {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("values", values);
    context.insert("book_list", &books);
    context.insert("statuses", &statuses);
    context.insert("errors", errors);
    views::render("bookinstance_form", &context)
}

fn render_delete(copy: &BookInstanceView) -> AppResult<Html<String>> {
    let mut context = Context::new();
    context.insert("title", "Delete BookInstance");
    context.insert("bookinstance", copy);
    views::render("bookinstance_delete", &context)
}
