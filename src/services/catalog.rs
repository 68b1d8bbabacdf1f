//! Catalog dashboard service

use serde::Serialize;

use crate::{error::AppResult, models::BookInstanceStatus, repository::Repository};

/// Shown instead of the counts that could not be fetched
const COUNT_ERROR: &str = "Some catalog counts could not be loaded.";

/// Collection sizes shown on the home page. A `None` count failed to load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogCounts {
    pub book_count: Option<i64>,
    pub book_instance_count: Option<i64>,
    pub book_instance_available_count: Option<i64>,
    pub author_count: Option<i64>,
    pub genre_count: Option<i64>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Run the five counts concurrently. Every count is awaited even when
    /// another one fails.
    pub async fn counts(&self) -> CatalogCounts {
        let repo = &self.repository;
        let (books, instances, available, authors, genres) = tokio::join!(
            repo.books.count(),
            repo.book_instances.count(),
            repo.book_instances.count_by_status(BookInstanceStatus::Available),
            repo.authors.count(),
            repo.genres.count(),
        );

        let mut failed = false;
        let mut keep = |what: &str, result: AppResult<i64>| match result {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::error!("Dashboard {} count failed: {}", what, e);
                failed = true;
                None
            }
        };

        let counts = CatalogCounts {
            book_count: keep("book", books),
            book_instance_count: keep("book instance", instances),
            book_instance_available_count: keep("available book instance", available),
            author_count: keep("author", authors),
            genre_count: keep("genre", genres),
            error: None,
        };

        CatalogCounts {
            error: failed.then(|| COUNT_ERROR.to_string()),
            ..counts
        }
    }

    /// Cheapest round trip to the store
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.genres.count().await.map(|_| ())
    }
}
