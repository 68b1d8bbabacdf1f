//! Author management service

use uuid::Uuid;

use super::DeleteOutcome;
use crate::{
    error::AppResult,
    models::{Author, AuthorInput, Book},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All authors ordered by family name
    pub async fn list(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Author>> {
        self.repository.authors.get(id).await
    }

    /// Author together with the books they wrote, fetched concurrently
    pub async fn with_books(&self, id: Uuid) -> AppResult<Option<(Author, Vec<Book>)>> {
        let (author, books) = tokio::try_join!(
            self.repository.authors.get(id),
            self.repository.books.find_by_author(id),
        )?;
        Ok(author.map(|author| (author, books)))
    }

    pub async fn create(&self, input: AuthorInput) -> AppResult<Author> {
        let author = Author::new(input);
        self.repository.authors.insert(&author).await?;
        tracing::info!("Author created: id={}", author.id);
        Ok(author)
    }

    /// Replace the stored author, keeping its id. `None` when it is gone.
    pub async fn update(&self, id: Uuid, input: AuthorInput) -> AppResult<Option<Author>> {
        let author = Author::with_id(id, input);
        if !self.repository.authors.replace(&author).await? {
            return Ok(None);
        }
        tracing::info!("Author updated: id={}", id);
        Ok(Some(author))
    }

    /// Delete an author that no book references anymore
    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<Author, Book>> {
        let Some((author, books)) = self.with_books(id).await? else {
            return Ok(DeleteOutcome::Missing);
        };

        if !books.is_empty() {
            tracing::warn!("Author delete blocked: id={} still has {} book(s)", id, books.len());
            return Ok(DeleteOutcome::Blocked {
                target: author,
                dependents: books,
            });
        }

        self.repository.authors.delete(id).await?;
        tracing::info!("Author deleted: id={}", id);
        Ok(DeleteOutcome::Deleted)
    }
}
