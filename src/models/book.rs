//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::author::{Author, AuthorView};
use super::genre::{Genre, GenreView};
use crate::validation::{FieldChain, Validated};

/// Book document. `author` and `genre` hold references, resolved for display
/// into a [`BookView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: Uuid,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<Uuid>,
}

impl Book {
    pub fn new(input: BookInput) -> Self {
        Self::with_id(Uuid::new_v4(), input)
    }

    pub fn with_id(id: Uuid, input: BookInput) -> Self {
        Self {
            id,
            title: input.title,
            author: input.author,
            summary: input.summary,
            isbn: input.isbn,
            genre: input.genre,
        }
    }

    pub fn url(&self) -> String {
        format!("/catalog/book/{}", self.id)
    }

    pub fn genre_ids(&self) -> Vec<String> {
        self.genre.iter().map(Uuid::to_string).collect()
    }

    pub fn form_values(&self) -> serde_json::Value {
        serde_json::json!({
            "title": self.title,
            "author": self.author.to_string(),
            "summary": self.summary,
            "isbn": self.isbn,
        })
    }
}

/// Sanitized book fields with parsed references
#[derive(Debug, Clone, PartialEq)]
pub struct BookInput {
    pub title: String,
    pub author: Uuid,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<Uuid>,
}

impl BookInput {
    pub fn rules() -> Vec<FieldChain> {
        vec![
            FieldChain::body("title")
                .trim()
                .min_length(1, "Title must be specified.")
                .escape(),
            FieldChain::body("author")
                .trim()
                .min_length(1, "Author must be specified.")
                .escape(),
            FieldChain::body("summary")
                .trim()
                .min_length(1, "Summary must be specified.")
                .escape(),
            FieldChain::body("isbn")
                .trim()
                .min_length(1, "ISBN must be specified.")
                .escape(),
            FieldChain::each("genre").escape(),
        ]
    }

    /// Build the input from a form that passed its rules. Malformed reference
    /// ids are recorded on `validated` and yield `None`.
    pub fn from_validated(validated: &mut Validated) -> Option<Self> {
        let author = Uuid::parse_str(validated.value("author")).ok();
        if author.is_none() {
            validated.push_error("author", "Author not found.");
        }

        let mut genre = Vec::new();
        let mut malformed_genre = false;
        for raw in validated.list("genre") {
            match Uuid::parse_str(raw) {
                Ok(id) => genre.push(id),
                Err(_) => malformed_genre = true,
            }
        }
        if malformed_genre {
            validated.push_error("genre", "Genre not found.");
        }

        let author = author?;
        if malformed_genre {
            return None;
        }

        Some(Self {
            title: validated.value("title").to_string(),
            author,
            summary: validated.value("summary").to_string(),
            isbn: validated.value("isbn").to_string(),
            genre,
        })
    }
}

/// Book with its author and genres resolved
#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<AuthorView>,
    pub genre: Vec<GenreView>,
}

impl BookView {
    /// Resolve references against already fetched documents; dangling ones
    /// are dropped.
    pub fn populate(book: &Book, authors: &[Author], genres: &[Genre]) -> Self {
        Self {
            id: book.id,
            url: book.url(),
            title: book.title.clone(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            author: authors
                .iter()
                .find(|a| a.id == book.author)
                .map(AuthorView::from),
            genre: book
                .genre
                .iter()
                .filter_map(|id| genres.iter().find(|g| g.id == *id))
                .map(GenreView::from)
                .collect(),
        }
    }
}

/// Book reference shown on copy pages and in the copy form's `<select>`
#[derive(Debug, Clone, Serialize)]
pub struct BookOption {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub selected: bool,
}

impl BookOption {
    pub fn list(books: &[Book], selected: &str) -> Vec<Self> {
        books
            .iter()
            .map(|book| Self {
                selected: book.id.to_string() == selected,
                ..Self::from(book)
            })
            .collect()
    }
}

impl From<&Book> for BookOption {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            url: book.url(),
            title: book.title.clone(),
            selected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::author::AuthorInput;
    use crate::models::genre::GenreInput;
    use crate::validation::{validate, FormFields};

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        FormFields::from(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_input_parses_references() {
        let author = Uuid::new_v4();
        let genre = Uuid::new_v4();
        let mut validated = validate(
            &form(&[
                ("title", " Dune "),
                ("author", &author.to_string()),
                ("summary", "Spice."),
                ("isbn", "9780441013593"),
                ("genre", &genre.to_string()),
            ]),
            &BookInput::rules(),
        );
        assert!(validated.is_valid());

        let input = BookInput::from_validated(&mut validated).expect("input should build");
        assert_eq!(input.title, "Dune");
        assert_eq!(input.author, author);
        assert_eq!(input.genre, vec![genre]);
    }

    #[test]
    fn test_malformed_author_is_a_field_error() {
        let mut validated = validate(
            &form(&[
                ("title", "Dune"),
                ("author", "nobody"),
                ("summary", "Spice."),
                ("isbn", "9780441013593"),
            ]),
            &BookInput::rules(),
        );

        assert!(BookInput::from_validated(&mut validated).is_none());
        assert_eq!(validated.errors().len(), 1);
        assert_eq!(validated.errors()[0].field, "author");
    }

    #[test]
    fn test_populate_resolves_references() {
        let author = Author::new(AuthorInput {
            first_name: "Frank".into(),
            family_name: "Herbert".into(),
            ..Default::default()
        });
        let genre = Genre::new(GenreInput { name: "Science Fiction".into() });
        let book = Book::new(BookInput {
            title: "Dune".into(),
            author: author.id,
            summary: "Spice.".into(),
            isbn: "9780441013593".into(),
            genre: vec![genre.id, Uuid::new_v4()],
        });

        let view = BookView::populate(&book, &[author], &[genre]);
        assert_eq!(view.author.map(|a| a.name), Some("Herbert, Frank".to_string()));
        assert_eq!(view.genre.len(), 1);
        assert_eq!(view.genre[0].name, "Science Fiction");
    }
}
