//! Business logic services

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;

use indexmap::IndexSet;
use uuid::Uuid;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub authors: authors::AuthorsService,
    pub genres: genres::GenresService,
    pub books: books::BooksService,
    pub book_instances: book_instances::BookInstancesService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            authors: authors::AuthorsService::new(repository.clone()),
            genres: genres::GenresService::new(repository.clone()),
            books: books::BooksService::new(repository.clone()),
            book_instances: book_instances::BookInstancesService::new(repository),
        }
    }
}

/// Result of a delete submission
#[derive(Debug)]
pub enum DeleteOutcome<T, D> {
    /// Nothing stored under that id
    Missing,
    /// Dependents still reference the target; nothing was deleted
    Blocked { target: T, dependents: Vec<D> },
    Deleted,
}

/// Distinct ids, first occurrence order
pub(crate) fn unique_ids(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    ids.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}
