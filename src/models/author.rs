//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{FieldChain, Validated};

/// Upper bound on either name part
pub const NAME_MAX_LENGTH: u64 = 100;

/// Author document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// New author with a freshly generated id
    pub fn new(input: AuthorInput) -> Self {
        Self::with_id(Uuid::new_v4(), input)
    }

    /// Rebuild an author under an existing id (full replace on update)
    pub fn with_id(id: Uuid, input: AuthorInput) -> Self {
        Self {
            id,
            first_name: input.first_name,
            family_name: input.family_name,
            date_of_birth: input.date_of_birth,
            date_of_death: input.date_of_death,
        }
    }

    /// "family_name, first_name", or empty when either part is missing
    pub fn name(&self) -> String {
        if self.first_name.is_empty() || self.family_name.is_empty() {
            return String::new();
        }
        format!("{}, {}", self.family_name, self.first_name)
    }

    pub fn url(&self) -> String {
        format!("/catalog/author/{}", self.id)
    }

    pub fn date_of_birth_yyyy_mm_dd(&self) -> String {
        iso_date(self.date_of_birth)
    }

    pub fn date_of_death_yyyy_mm_dd(&self) -> String {
        iso_date(self.date_of_death)
    }

    /// "Jan 2, 1920 - Apr 6, 1992"; unknown ends are left blank
    pub fn lifespan(&self) -> String {
        if self.date_of_birth.is_none() && self.date_of_death.is_none() {
            return String::new();
        }
        format!(
            "{} - {}",
            medium_date(self.date_of_birth),
            medium_date(self.date_of_death)
        )
        .trim()
        .to_string()
    }

    /// Current field values for the update form
    pub fn form_values(&self) -> serde_json::Value {
        serde_json::json!({
            "first_name": self.first_name,
            "family_name": self.family_name,
            "date_of_birth": self.date_of_birth_yyyy_mm_dd(),
            "date_of_death": self.date_of_death_yyyy_mm_dd(),
        })
    }
}

fn iso_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn medium_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Sanitized author fields from a submitted form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorInput {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorInput {
    pub fn rules() -> Vec<FieldChain> {
        vec![
            FieldChain::body("first_name")
                .trim()
                .min_length(1, "First name must be specified.")
                .max_length(NAME_MAX_LENGTH, "First name must not exceed 100 characters.")
                .escape()
                .alphanumeric("First name has non-alphanumeric characters."),
            FieldChain::body("family_name")
                .trim()
                .min_length(1, "Family name must be specified.")
                .max_length(NAME_MAX_LENGTH, "Family name must not exceed 100 characters.")
                .escape()
                .alphanumeric("Family name has non-alphanumeric characters."),
            FieldChain::body("date_of_birth")
                .optional()
                .iso8601("Invalid date of birth"),
            FieldChain::body("date_of_death")
                .optional()
                .iso8601("Invalid date of death"),
        ]
    }

    pub fn from_validated(validated: &Validated) -> Self {
        Self {
            first_name: validated.value("first_name").to_string(),
            family_name: validated.value("family_name").to_string(),
            date_of_birth: validated.date("date_of_birth"),
            date_of_death: validated.date("date_of_death"),
        }
    }
}

/// Author as handed to templates, derived fields included
#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    pub id: Uuid,
    pub url: String,
    pub name: String,
    pub first_name: String,
    pub family_name: String,
    pub lifespan: String,
    pub date_of_birth_yyyy_mm_dd: String,
    pub date_of_death_yyyy_mm_dd: String,
}

impl From<&Author> for AuthorView {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            url: author.url(),
            name: author.name(),
            first_name: author.first_name.clone(),
            family_name: author.family_name.clone(),
            lifespan: author.lifespan(),
            date_of_birth_yyyy_mm_dd: author.date_of_birth_yyyy_mm_dd(),
            date_of_death_yyyy_mm_dd: author.date_of_death_yyyy_mm_dd(),
        }
    }
}

/// Author entry of a `<select>` on the book form
#[derive(Debug, Clone, Serialize)]
pub struct AuthorOption {
    pub id: Uuid,
    pub name: String,
    pub selected: bool,
}

impl AuthorOption {
    pub fn list(authors: &[Author], selected: &str) -> Vec<Self> {
        authors
            .iter()
            .map(|author| Self {
                id: author.id,
                name: author.name(),
                selected: author.id.to_string() == selected,
            })
            .collect()
    }
}
