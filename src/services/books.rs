//! Book management service

use uuid::Uuid;

use super::{unique_ids, DeleteOutcome};
use crate::{
    error::AppResult,
    models::{Author, Book, BookInput, BookInstance, BookView, Genre},
    repository::Repository,
    validation::Validated,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All books ordered by title, each with its author resolved
    pub async fn list(&self) -> AppResult<Vec<BookView>> {
        let books = self.repository.books.list().await?;
        let author_ids = unique_ids(books.iter().map(|b| b.author));
        let authors = self.repository.authors.get_many(&author_ids).await?;
        Ok(books
            .iter()
            .map(|book| BookView::populate(book, &authors, &[]))
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Book>> {
        self.repository.books.get(id).await
    }

    /// Resolve a book's author and genres
    pub async fn populate(&self, book: &Book) -> AppResult<BookView> {
        let author_ids = [book.author];
        let (authors, genres) = tokio::try_join!(
            self.repository.authors.get_many(&author_ids),
            self.repository.genres.get_many(&book.genre),
        )?;
        Ok(BookView::populate(book, &authors, &genres))
    }

    /// Book with author and genres resolved, plus its copies
    pub async fn detail(&self, id: Uuid) -> AppResult<Option<(BookView, Vec<BookInstance>)>> {
        let (book, copies) = tokio::try_join!(
            self.repository.books.get(id),
            self.repository.book_instances.find_by_book(id),
        )?;
        let Some(book) = book else {
            return Ok(None);
        };
        Ok(Some((self.populate(&book).await?, copies)))
    }

    /// Selection lists for the book form
    pub async fn form_options(&self) -> AppResult<(Vec<Author>, Vec<Genre>)> {
        tokio::try_join!(self.repository.authors.list(), self.repository.genres.list())
    }

    /// Stored book plus the form's selection lists
    pub async fn edit_form(&self, id: Uuid) -> AppResult<Option<(Book, Vec<Author>, Vec<Genre>)>> {
        let (book, authors, genres) = tokio::try_join!(
            self.repository.books.get(id),
            self.repository.authors.list(),
            self.repository.genres.list(),
        )?;
        Ok(book.map(|book| (book, authors, genres)))
    }

    /// Record a field error for every reference that does not resolve
    pub async fn check_references(&self, input: &BookInput, validated: &mut Validated) -> AppResult<()> {
        let genre_ids = unique_ids(input.genre.iter().copied());
        let (author, genres) = tokio::try_join!(
            self.repository.authors.get(input.author),
            self.repository.genres.get_many(&genre_ids),
        )?;

        if author.is_none() {
            validated.push_error("author", "Author not found.");
        }
        if genres.len() < genre_ids.len() {
            validated.push_error("genre", "Genre not found.");
        }
        Ok(())
    }

    pub async fn create(&self, input: BookInput) -> AppResult<Book> {
        let book = Book::new(input);
        self.repository.books.insert(&book).await?;
        tracing::info!("Book created: id={}", book.id);
        Ok(book)
    }

    pub async fn update(&self, id: Uuid, input: BookInput) -> AppResult<Option<Book>> {
        let book = Book::with_id(id, input);
        if !self.repository.books.replace(&book).await? {
            return Ok(None);
        }
        tracing::info!("Book updated: id={}", id);
        Ok(Some(book))
    }

    /// Book together with its copies
    pub async fn with_copies(&self, id: Uuid) -> AppResult<Option<(Book, Vec<BookInstance>)>> {
        let (book, copies) = tokio::try_join!(
            self.repository.books.get(id),
            self.repository.book_instances.find_by_book(id),
        )?;
        Ok(book.map(|book| (book, copies)))
    }

    /// Delete a book that has no copies left
    pub async fn delete(&self, id: Uuid) -> AppResult<DeleteOutcome<Book, BookInstance>> {
        let Some((book, copies)) = self.with_copies(id).await? else {
            return Ok(DeleteOutcome::Missing);
        };

        if !copies.is_empty() {
            tracing::warn!("Book delete blocked: id={} still has {} copies", id, copies.len());
            return Ok(DeleteOutcome::Blocked {
                target: book,
                dependents: copies,
            });
        }

        self.repository.books.delete(id).await?;
        tracing::info!("Book deleted: id={}", id);
        Ok(DeleteOutcome::Deleted)
    }
}
