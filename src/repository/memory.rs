//! In-memory catalog store
//!
//! Backs the test suite and local demos. Collections keep insertion order,
//! which is what "store order" means for unsorted listings.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use indexmap::IndexMap;
use uuid::Uuid;

use super::{AuthorsRepository, BookInstancesRepository, BooksRepository, GenresRepository};
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, BookInstance, BookInstanceStatus, Genre},
};

#[derive(Default)]
struct Collections {
    authors: IndexMap<Uuid, Author>,
    genres: IndexMap<Uuid, Genre>,
    books: IndexMap<Uuid, Book>,
    book_instances: IndexMap<Uuid, BookInstance>,
}

/// Shared store implementing every collection trait
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Collections>> {
        self.inner
            .read()
            .map_err(|e| AppError::Store(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Collections>> {
        self.inner
            .write()
            .map_err(|e| AppError::Store(format!("Failed to acquire write lock: {}", e)))
    }
}

fn sorted_by<T: Clone, K: Ord>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort_by_key(|item| key(item));
    items
}

/// Insert fails on a duplicate id, like a primary key would
fn insert_new<T: Clone>(map: &mut IndexMap<Uuid, T>, id: Uuid, value: &T) -> AppResult<()> {
    if map.contains_key(&id) {
        return Err(AppError::Store(format!("Duplicate id {}", id)));
    }
    map.insert(id, value.clone());
    Ok(())
}

fn replace_existing<T: Clone>(map: &mut IndexMap<Uuid, T>, id: Uuid, value: &T) -> bool {
    match map.get_mut(&id) {
        Some(slot) => {
            *slot = value.clone();
            true
        }
        None => false,
    }
}

#[async_trait]
impl AuthorsRepository for InMemoryStore {
    async fn list(&self) -> AppResult<Vec<Author>> {
        let store = self.read()?;
        Ok(sorted_by(store.authors.values().cloned(), |a| a.family_name.clone()))
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Author>> {
        Ok(self.read()?.authors.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Author>> {
        let store = self.read()?;
        Ok(ids.iter().filter_map(|id| store.authors.get(id).cloned()).collect())
    }

    async fn insert(&self, author: &Author) -> AppResult<()> {
        insert_new(&mut self.write()?.authors, author.id, author)
    }

    async fn replace(&self, author: &Author) -> AppResult<bool> {
        Ok(replace_existing(&mut self.write()?.authors, author.id, author))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.write()?.authors.shift_remove(&id).is_some())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.read()?.authors.len() as i64)
    }
}

#[async_trait]
impl GenresRepository for InMemoryStore {
    async fn list(&self) -> AppResult<Vec<Genre>> {
        let store = self.read()?;
        Ok(sorted_by(store.genres.values().cloned(), |g| g.name.clone()))
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Genre>> {
        Ok(self.read()?.genres.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Genre>> {
        let store = self.read()?;
        let found = ids.iter().filter_map(|id| store.genres.get(id).cloned());
        Ok(sorted_by(found, |g| g.name.clone()))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Genre>> {
        Ok(self
            .read()?
            .genres
            .values()
            .find(|g| g.name == name)
            .cloned())
    }

    async fn insert(&self, genre: &Genre) -> AppResult<()> {
        insert_new(&mut self.write()?.genres, genre.id, genre)
    }

    async fn replace(&self, genre: &Genre) -> AppResult<bool> {
        Ok(replace_existing(&mut self.write()?.genres, genre.id, genre))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.write()?.genres.shift_remove(&id).is_some())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.read()?.genres.len() as i64)
    }
}

#[async_trait]
impl BooksRepository for InMemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let store = self.read()?;
        Ok(sorted_by(store.books.values().cloned(), |b| b.title.clone()))
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.read()?.books.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Book>> {
        let store = self.read()?;
        let found = ids.iter().filter_map(|id| store.books.get(id).cloned());
        Ok(sorted_by(found, |b| b.title.clone()))
    }

    async fn find_by_author(&self, author_id: Uuid) -> AppResult<Vec<Book>> {
        let store = self.read()?;
        let found = store.books.values().filter(|b| b.author == author_id).cloned();
        Ok(sorted_by(found, |b| b.title.clone()))
    }

    async fn find_by_genre(&self, genre_id: Uuid) -> AppResult<Vec<Book>> {
        let store = self.read()?;
        let found = store
            .books
            .values()
            .filter(|b| b.genre.contains(&genre_id))
            .cloned();
        Ok(sorted_by(found, |b| b.title.clone()))
    }

    async fn insert(&self, book: &Book) -> AppResult<()> {
        insert_new(&mut self.write()?.books, book.id, book)
    }

    async fn replace(&self, book: &Book) -> AppResult<bool> {
        Ok(replace_existing(&mut self.write()?.books, book.id, book))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.write()?.books.shift_remove(&id).is_some())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.read()?.books.len() as i64)
    }
}

#[async_trait]
impl BookInstancesRepository for InMemoryStore {
    async fn list(&self) -> AppResult<Vec<BookInstance>> {
        Ok(self.read()?.book_instances.values().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<BookInstance>> {
        Ok(self.read()?.book_instances.get(&id).cloned())
    }

    async fn find_by_book(&self, book_id: Uuid) -> AppResult<Vec<BookInstance>> {
        Ok(self
            .read()?
            .book_instances
            .values()
            .filter(|i| i.book == book_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, instance: &BookInstance) -> AppResult<()> {
        insert_new(&mut self.write()?.book_instances, instance.id, instance)
    }

    async fn replace(&self, instance: &BookInstance) -> AppResult<bool> {
        Ok(replace_existing(&mut self.write()?.book_instances, instance.id, instance))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.write()?.book_instances.shift_remove(&id).is_some())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.read()?.book_instances.len() as i64)
    }

    async fn count_by_status(&self, status: BookInstanceStatus) -> AppResult<i64> {
        Ok(self
            .read()?
            .book_instances
            .values()
            .filter(|i| i.status == status)
            .count() as i64)
    }
}
