//! Genre management service

use uuid::Uuid;

use super::DeleteOutcome;
use crate::{
    error::AppResult,
    models::{Book, Genre, GenreInput},
    repository::Repository,
};

/// Result of a genre create submission
#[derive(Debug)]
pub enum GenreCreated {
    /// A genre with the same name was already stored
    Existing(Genre),
    Created(Genre),
}

impl GenreCreated {
    pub fn genre(&self) -> &Genre {
        match self {
            GenreCreated::Existing(genre) | GenreCreated::Created(genre) => genre,
        }
    }
}

#[derive(Clone)]
pub struct GenresService {
    repository: Repository,
}

impl GenresService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Genre>> {
        self.repository.genres.get(id).await
    }

    /// Genre together with the books tagged with it
    pub async fn with_books(&self, id: Uuid) -> AppResult<Option<(Genre, Vec<Book>)>> {
        let (genre, books) = tokio::try_join!(
            self.repository.genres.get(id),
            self.repository.books.find_by_genre(id),
        )?;
        Ok(genre.map(|genre| (genre, books)))
    }

    /// Create a genre unless one with the exact same name exists
    pub async fn create(&self, input: GenreInput) -> AppResult<GenreCreated> {
        if let Some(existing) = self.repository.genres.find_by_name(&input.name).await? {
            tracing::debug!("Genre create: name already stored as id={}", existing.id);
            return Ok(GenreCreated::Existing(existing));
        }

        let genre = Genre::new(input);
        self.repository.genres.insert(&genre).await?;
        tracing::info!("Genre created: id={}", genre.id);
        Ok(GenreCreated::Created(genre))
    }

    pub async fn update(&self, id: Uuid, input: GenreInput) -> AppResult<Option<Genre>> {
        let genre = Genre::with_id(id, input);
        if !self.repository.genres.replace(&genre).await? {
            return Ok(None);
        }
        tracing::info!("Genre updated: id={}", id);
        Ok(Some(genre))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<Genre, Book>> {
        let Some((genre, books)) = self.with_books(id).await? else {
            return Ok(DeleteOutcome::Missing);
        };

        if !books.is_empty() {
            tracing::warn!("Genre delete blocked: id={} still tags {} book(s)", id, books.len());
            return Ok(DeleteOutcome::Blocked {
                target: genre,
                dependents: books,
            });
        }

        self.repository.genres.delete(id).await?;
        tracing::info!("Genre deleted: id={}", id);
        Ok(DeleteOutcome::Deleted)
    }
}
