//! Book instance (physical copy) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::Postgres, Decode, Encode, FromRow};
use uuid::Uuid;

use super::book::{Book, BookOption};
use crate::validation::{FieldChain, Validated};

/// Circulation status of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookInstanceStatus {
    Available,
    Maintenance,
    Loaned,
    Reserved,
}

impl BookInstanceStatus {
    pub const ALL: [BookInstanceStatus; 4] = [
        BookInstanceStatus::Maintenance,
        BookInstanceStatus::Available,
        BookInstanceStatus::Loaned,
        BookInstanceStatus::Reserved,
    ];

    pub const NAMES: &'static [&'static str] = &["Maintenance", "Available", "Loaned", "Reserved"];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookInstanceStatus::Available => "Available",
            BookInstanceStatus::Maintenance => "Maintenance",
            BookInstanceStatus::Loaned => "Loaned",
            BookInstanceStatus::Reserved => "Reserved",
        }
    }
}

impl Default for BookInstanceStatus {
    fn default() -> Self {
        BookInstanceStatus::Maintenance
    }
}

impl std::fmt::Display for BookInstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookInstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(BookInstanceStatus::Available),
            "Maintenance" => Ok(BookInstanceStatus::Maintenance),
            "Loaned" => Ok(BookInstanceStatus::Loaned),
            "Reserved" => Ok(BookInstanceStatus::Reserved),
            _ => Err(format!("Invalid book instance status: {}", s)),
        }
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for BookInstanceStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BookInstanceStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookInstanceStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Book instance document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BookInstance {
    pub id: Uuid,
    pub book: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: DateTime<Utc>,
}

impl BookInstance {
    pub fn new(input: BookInstanceInput) -> Self {
        Self::with_id(Uuid::new_v4(), input)
    }

    /// Missing status falls back to Maintenance, missing due date to now.
    pub fn with_id(id: Uuid, input: BookInstanceInput) -> Self {
        Self {
            id,
            book: input.book,
            imprint: input.imprint,
            status: input.status.unwrap_or_default(),
            due_back: input.due_back.unwrap_or_else(Utc::now),
        }
    }

    pub fn url(&self) -> String {
        format!("/catalog/bookinstance/{}", self.id)
    }

    /// e.g. "Oct 15, 2023"
    pub fn due_back_formatted(&self) -> String {
        self.due_back.format("%b %-d, %Y").to_string()
    }

    pub fn due_back_yyyy_mm_dd(&self) -> String {
        self.due_back.format("%Y-%m-%d").to_string()
    }

    pub fn form_values(&self) -> serde_json::Value {
        serde_json::json!({
            "book": self.book.to_string(),
            "imprint": self.imprint,
            "status": self.status.as_str(),
            "due_back": self.due_back_yyyy_mm_dd(),
        })
    }
}

/// Sanitized copy fields with a parsed book reference
#[derive(Debug, Clone, PartialEq)]
pub struct BookInstanceInput {
    pub book: Uuid,
    pub imprint: String,
    pub status: Option<BookInstanceStatus>,
    pub due_back: Option<DateTime<Utc>>,
}

impl BookInstanceInput {
    pub fn rules() -> Vec<FieldChain> {
        vec![
            FieldChain::body("book")
                .trim()
                .min_length(1, "Book must be specified.")
                .escape(),
            FieldChain::body("imprint")
                .trim()
                .min_length(1, "Imprint must be specified.")
                .escape(),
            FieldChain::body("status")
                .optional()
                .trim()
                .one_of(BookInstanceStatus::NAMES, "Invalid status.")
                .escape(),
            FieldChain::body("due_back")
                .optional()
                .iso8601("Invalid date"),
        ]
    }

    /// Build the input from a form that passed its rules. A malformed book
    /// id is recorded on `validated` and yields `None`.
    pub fn from_validated(validated: &mut Validated) -> Option<Self> {
        let Ok(book) = Uuid::parse_str(validated.value("book")) else {
            validated.push_error("book", "Book not found.");
            return None;
        };

        Some(Self {
            book,
            imprint: validated.value("imprint").to_string(),
            status: validated.value("status").parse().ok(),
            due_back: validated.datetime("due_back"),
        })
    }
}

/// Copy with its book resolved
#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceView {
    pub id: Uuid,
    pub url: String,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back_formatted: String,
    pub due_back_yyyy_mm_dd: String,
    pub book: Option<BookOption>,
}

impl BookInstanceView {
    pub fn populate(instance: &BookInstance, books: &[Book]) -> Self {
        Self {
            book: books
                .iter()
                .find(|b| b.id == instance.book)
                .map(BookOption::from),
            ..Self::from(instance)
        }
    }
}

impl From<&BookInstance> for BookInstanceView {
    fn from(instance: &BookInstance) -> Self {
        Self {
            id: instance.id,
            url: instance.url(),
            imprint: instance.imprint.clone(),
            status: instance.status,
            due_back_formatted: instance.due_back_formatted(),
            due_back_yyyy_mm_dd: instance.due_back_yyyy_mm_dd(),
            book: None,
        }
    }
}

/// Status entry of the copy form's `<select>`
#[derive(Debug, Clone, Serialize)]
pub struct StatusOption {
    pub name: &'static str,
    pub selected: bool,
}

impl StatusOption {
    pub fn list(selected: &str) -> Vec<Self> {
        BookInstanceStatus::ALL
            .iter()
            .map(|status| Self {
                name: status.as_str(),
                selected: status.as_str() == selected,
            })
            .collect()
    }
}
