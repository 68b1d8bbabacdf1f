//! HTML views
//!
//! Templates are compiled into the binary and parsed once. Autoescaping is
//! off: every stored text field went through the `escape` sanitizer already,
//! and templates escape the few raw values they echo back explicitly.

use axum::{http::StatusCode, response::Html};
use once_cell::sync::Lazy;
use tera::{Context, Tera};

use crate::error::{AppError, AppResult};

const TEMPLATES_SRC: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("error.html", include_str!("../templates/error.html")),
    ("author_list.html", include_str!("../templates/author_list.html")),
    ("author_detail.html", include_str!("../templates/author_detail.html")),
    ("author_form.html", include_str!("../templates/author_form.html")),
    ("author_delete.html", include_str!("../templates/author_delete.html")),
    ("genre_list.html", include_str!("../templates/genre_list.html")),
    ("genre_detail.html", include_str!("../templates/genre_detail.html")),
    ("genre_form.html", include_str!("../templates/genre_form.html")),
    ("genre_delete.html", include_str!("../templates/genre_delete.html")),
    ("book_list.html", include_str!("../templates/book_list.html")),
    ("book_detail.html", include_str!("../templates/book_detail.html")),
    ("book_form.html", include_str!("../templates/book_form.html")),
    ("book_delete.html", include_str!("../templates/book_delete.html")),
    ("bookinstance_list.html", include_str!("../templates/bookinstance_list.html")),
    ("bookinstance_detail.html", include_str!("../templates/bookinstance_detail.html")),
    ("bookinstance_form.html", include_str!("../templates/bookinstance_form.html")),
    ("bookinstance_delete.html", include_str!("../templates/bookinstance_delete.html")),
];

static TEMPLATES: Lazy<Result<Tera, String>> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES_SRC.iter().copied())
        .map_err(|e| format!("{:?}", e))?;
    tera.autoescape_on(vec![]);
    Ok(tera)
});

/// Render the named template (without extension)
pub fn render(name: &str, context: &Context) -> AppResult<Html<String>> {
    let tera = TEMPLATES
        .as_ref()
        .map_err(|e| AppError::Internal(format!("Templates failed to load: {}", e)))?;
    let body = tera.render(&format!("{}.html", name), context)?;
    Ok(Html(body))
}

/// Error page for `status`
pub fn error_page(status: StatusCode, message: &str) -> AppResult<Html<String>> {
    let mut context = Context::new();
    context.insert("title", status.canonical_reason().unwrap_or("Error"));
    context.insert("status", &status.as_u16());
    context.insert("message", message);
    render("error", &context)
}
