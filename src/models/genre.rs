//! Genre model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{FieldChain, Validated};

/// Genre document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

impl Genre {
    pub fn new(input: GenreInput) -> Self {
        Self::with_id(Uuid::new_v4(), input)
    }

    pub fn with_id(id: Uuid, input: GenreInput) -> Self {
        Self { id, name: input.name }
    }

    pub fn url(&self) -> String {
        format!("/catalog/genre/{}", self.id)
    }

    pub fn form_values(&self) -> serde_json::Value {
        serde_json::json!({ "name": self.name })
    }
}

/// Sanitized genre fields from a submitted form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenreInput {
    pub name: String,
}

impl GenreInput {
    pub fn rules() -> Vec<FieldChain> {
        vec![FieldChain::body("name")
            .trim()
            .min_length(3, "Genre name must contain at least 3 characters.")
            .max_length(100, "Genre name must not exceed 100 characters.")
            .escape()]
    }

    pub fn from_validated(validated: &Validated) -> Self {
        Self {
            name: validated.value("name").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreView {
    pub id: Uuid,
    pub url: String,
    pub name: String,
}

impl From<&Genre> for GenreView {
    fn from(genre: &Genre) -> Self {
        Self {
            id: genre.id,
            url: genre.url(),
            name: genre.name.clone(),
        }
    }
}

/// Genre checkbox on the book form
#[derive(Debug, Clone, Serialize)]
pub struct GenreOption {
    pub id: Uuid,
    pub name: String,
    pub checked: bool,
}

impl GenreOption {
    /// Mark every genre whose id appears in `chosen`
    pub fn list(genres: &[Genre], chosen: &[String]) -> Vec<Self> {
        genres
            .iter()
            .map(|genre| {
                let id = genre.id.to_string();
                Self {
                    id: genre.id,
                    name: genre.name.clone(),
                    checked: chosen.iter().any(|c| *c == id),
                }
            })
            .collect()
    }
}
