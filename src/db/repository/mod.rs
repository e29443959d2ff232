//! Repository traits for catalog persistence.
//!
//! The traits are object-safe so the HTTP layer can hold an
//! `Arc<dyn CatalogRepository>` and stay agnostic of the storage backend.
//! All read operations are deterministic given identical store state and
//! identical inputs.

use async_trait::async_trait;

use super::models::{
    Author, AuthorQuery, AuthorWithCount, Book, BookChanges, BookFilter, BookQuery, NewAuthor,
    NewBook,
};

mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Repository operations for authors.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Insert a new author. The store assigns id and created_at and is the
    /// final authority on email uniqueness: a lost check/insert race
    /// surfaces as [`RepositoryError::Conflict`].
    async fn insert_author(&self, new: NewAuthor) -> RepositoryResult<Author>;

    /// Fetch an author by id. Returns `Ok(None)` when absent.
    async fn fetch_author(&self, id: i64) -> RepositoryResult<Option<Author>>;

    /// Check whether an author with this exact email already exists.
    async fn author_email_exists(&self, email: &str) -> RepositoryResult<bool>;

    /// List authors with their book counts, filtered, sorted, and windowed
    /// per `query`. Authors without books appear with `book_count = 0`.
    async fn list_authors(&self, query: &AuthorQuery) -> RepositoryResult<Vec<AuthorWithCount>>;

    /// Count authors matching the name filter alone; unaffected by any
    /// page window.
    async fn count_authors(&self, name_filter: Option<&str>) -> RepositoryResult<i64>;

    /// Fetch all books owned by an author, ordered by id ascending.
    async fn fetch_books_by_author(&self, author_id: i64) -> RepositoryResult<Vec<Book>>;

    /// Count the books owned by an author.
    async fn count_books_by_author(&self, author_id: i64) -> RepositoryResult<i64>;
}

/// Repository operations for books.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Insert a new book. The store enforces ISBN uniqueness
    /// ([`RepositoryError::Conflict`]) and the author foreign key
    /// ([`RepositoryError::ValidationError`]).
    async fn insert_book(&self, new: NewBook) -> RepositoryResult<Book>;

    /// Fetch a book by id. Returns `Ok(None)` when absent.
    async fn fetch_book(&self, id: i64) -> RepositoryResult<Option<Book>>;

    /// Check whether a book with this ISBN already exists.
    async fn book_isbn_exists(&self, isbn: &str) -> RepositoryResult<bool>;

    /// Apply the supplied fields to an existing book and return the full
    /// updated record. Fields not supplied are left unchanged. Returns
    /// [`RepositoryError::NotFound`] when the id does not exist.
    async fn update_book(&self, id: i64, changes: BookChanges) -> RepositoryResult<Book>;

    /// List books filtered, sorted, and windowed per `query`.
    async fn list_books(&self, query: &BookQuery) -> RepositoryResult<Vec<Book>>;

    /// Count books matching the filters alone; unaffected by any page
    /// window.
    async fn count_books(&self, filter: &BookFilter) -> RepositoryResult<i64>;
}

/// Combined repository interface used by the application.
#[async_trait]
pub trait CatalogRepository: AuthorRepository + BookRepository {
    /// Verify the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
