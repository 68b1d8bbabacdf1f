//! Book instance (copy) management service

use uuid::Uuid;

use super::unique_ids;
use crate::{
    error::AppResult,
    models::{Book, BookInstance, BookInstanceInput, BookInstanceView},
    repository::Repository,
    validation::Validated,
};

#[derive(Clone)]
pub struct BookInstancesService {
    repository: Repository,
}

impl BookInstancesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All copies in store order, each with its book resolved
    pub async fn list(&self) -> AppResult<Vec<BookInstanceView>> {
        let copies = self.repository.book_instances.list().await?;
        let book_ids = unique_ids(copies.iter().map(|c| c.book));
        let books = self.repository.books.get_many(&book_ids).await?;
        Ok(copies
            .iter()
            .map(|copy| BookInstanceView::populate(copy, &books))
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<BookInstance>> {
        self.repository.book_instances.get(id).await
    }

    /// Copy with its book resolved. A dangling book reference is left empty.
    pub async fn detail(&self, id: Uuid) -> AppResult<Option<BookInstanceView>> {
        let Some(copy) = self.repository.book_instances.get(id).await? else {
            return Ok(None);
        };
        let book = self.repository.books.get(copy.book).await?;
        Ok(Some(BookInstanceView::populate(&copy, book.as_slice())))
    }

    /// Selection list for the copy form
    pub async fn book_options(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn edit_form(&self, id: Uuid) -> AppResult<Option<(BookInstance, Vec<Book>)>> {
        let (copy, books) = tokio::try_join!(
            self.repository.book_instances.get(id),
            self.repository.books.list(),
        )?;
        Ok(copy.map(|copy| (copy, books)))
    }

    pub async fn check_references(
        &self,
        input: &BookInstanceInput,
        validated: &mut Validated,
    ) -> AppResult<()> {
        if self.repository.books.get(input.book).await?.is_none() {
            validated.push_error("book", "Book not found.");
        }
        Ok(())
    }

    pub async fn create(&self, input: BookInstanceInput) -> AppResult<BookInstance> {
        let copy = BookInstance::new(input);
        self.repository.book_instances.insert(&copy).await?;
        tracing::info!("Book instance created: id={} book={}", copy.id, copy.book);
        Ok(copy)
    }

    pub async fn update(&self, id: Uuid, input: BookInstanceInput) -> AppResult<Option<BookInstance>> {
        let copy = BookInstance::with_id(id, input);
        if !self.repository.book_instances.replace(&copy).await? {
            return Ok(None);
        }
        tracing::info!("Book instance updated: id={}", id);
        Ok(Some(copy))
    }

    /// Copies have no dependents, so deletion is unconditional.
    /// Returns `false` when nothing was stored under `id`.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let deleted = self.repository.book_instances.delete(id).await?;
        if deleted {
            tracing::info!("Book instance deleted: id={}", id);
        }
        Ok(deleted)
    }
}
