//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;

// Re-export commonly used types
pub use author::{Author, AuthorInput, AuthorView};
pub use book::{Book, BookInput, BookView};
pub use book_instance::{BookInstance, BookInstanceInput, BookInstanceStatus, BookInstanceView};
pub use genre::{Genre, GenreInput, GenreView};
