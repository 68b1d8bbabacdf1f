//! Repository layer for catalog storage
//!
//! One trait per collection. `Repository::new` wires the PostgreSQL backend,
//! `Repository::in_memory` the in-process one used by tests and demos.

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Author, Book, BookInstance, BookInstanceStatus, Genre},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorsRepository: Send + Sync {
    /// All authors ordered by family name
    async fn list(&self) -> AppResult<Vec<Author>>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Author>>;
    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Author>>;
    async fn insert(&self, author: &Author) -> AppResult<()>;
    /// Full replace; `false` when no author has this id
    async fn replace(&self, author: &Author) -> AppResult<bool>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenresRepository: Send + Sync {
    /// All genres ordered by name
    async fn list(&self) -> AppResult<Vec<Genre>>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Genre>>;
    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Genre>>;
    /// Exact, case-sensitive name match
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Genre>>;
    async fn insert(&self, genre: &Genre) -> AppResult<()>;
    async fn replace(&self, genre: &Genre) -> AppResult<bool>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// All books ordered by title
    async fn list(&self) -> AppResult<Vec<Book>>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Book>>;
    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Book>>;
    /// Books written by an author, ordered by title
    async fn find_by_author(&self, author_id: Uuid) -> AppResult<Vec<Book>>;
    /// Books tagged with a genre, ordered by title
    async fn find_by_genre(&self, genre_id: Uuid) -> AppResult<Vec<Book>>;
    async fn insert(&self, book: &Book) -> AppResult<()>;
    async fn replace(&self, book: &Book) -> AppResult<bool>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInstancesRepository: Send + Sync {
    /// All copies in store order
    async fn list(&self) -> AppResult<Vec<BookInstance>>;
    async fn get(&self, id: Uuid) -> AppResult<Option<BookInstance>>;
    async fn find_by_book(&self, book_id: Uuid) -> AppResult<Vec<BookInstance>>;
    async fn insert(&self, instance: &BookInstance) -> AppResult<()>;
    async fn replace(&self, instance: &BookInstance) -> AppResult<bool>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
    async fn count_by_status(&self, status: BookInstanceStatus) -> AppResult<i64>;
}

/// Handles on the four catalog collections
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn AuthorsRepository>,
    pub genres: Arc<dyn GenresRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub book_instances: Arc<dyn BookInstancesRepository>,
}

impl Repository {
    /// Create a repository backed by the given PostgreSQL pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(authors::PgAuthorsRepository::new(pool.clone())),
            genres: Arc::new(genres::PgGenresRepository::new(pool.clone())),
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            book_instances: Arc::new(book_instances::PgBookInstancesRepository::new(pool)),
        }
    }

    /// Create a repository over a fresh, empty in-memory store
    pub fn in_memory() -> Self {
        let store = memory::InMemoryStore::new();
        Self {
            authors: Arc::new(store.clone()),
            genres: Arc::new(store.clone()),
            books: Arc::new(store.clone()),
            book_instances: Arc::new(store),
        }
    }
}
