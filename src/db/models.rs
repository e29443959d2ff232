//! Domain models and query types for the catalog.
//!
//! These are plain structured records returned by the repository layer.
//! Relationship traversal is always explicit: listing operations return the
//! joined/aggregated data they need instead of lazily loading it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted author record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub published_year: Option<i32>,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new author. Id and timestamp are store-assigned.
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub name: String,
    pub email: String,
}

/// Fields for inserting a new book. Id and timestamp are store-assigned.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub isbn: String,
    pub published_year: Option<i32>,
    pub author_id: i64,
}

/// Partial update for a book. `None` means "field not supplied"; supplied
/// fields are applied, everything else is left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub author_id: Option<i64>,
}

impl BookChanges {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.isbn.is_none()
            && self.published_year.is_none()
            && self.author_id.is_none()
    }
}

/// An author row paired with the number of books it owns. Authors with no
/// books carry `book_count = 0` (left-join semantics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorWithCount {
    pub author: Author,
    pub book_count: i64,
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-insensitive parse of `"asc"` / `"desc"`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }
}

/// Sort key for the author listing. The only non-default key orders by the
/// computed book count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorSortKey {
    BookCount,
}

impl AuthorSortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "book_count" => Some(Self::BookCount),
            _ => None,
        }
    }
}

/// Sort key for the book listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookSortKey {
    Title,
    PublishedYear,
    CreatedAt,
}

impl BookSortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(Self::Title),
            "published_year" => Some(Self::PublishedYear),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

/// Page window applied after filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

/// Parameters for the paginated author listing.
#[derive(Debug, Clone)]
pub struct AuthorQuery {
    /// Case-insensitive substring match against the author name.
    pub name: Option<String>,
    /// Unset sort orders by id ascending.
    pub sort: Option<AuthorSortKey>,
    pub order: SortOrder,
    pub page: Page,
}

/// Filters for the book listing; shared by the page and count queries so
/// the reported total is always consistent with the rows.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Case-insensitive substring match against the book title.
    pub title: Option<String>,
    /// Case-insensitive substring match against the owning author's name.
    pub author_name: Option<String>,
    /// Exact match on the publication year.
    pub year: Option<i32>,
}

/// Parameters for the paginated book listing.
#[derive(Debug, Clone)]
pub struct BookQuery {
    pub filter: BookFilter,
    /// Unset sort orders by id ascending. Every explicit sort key gets id
    /// ascending as a secondary sort so pagination stays deterministic.
    pub sort: Option<BookSortKey>,
    pub order: SortOrder,
    pub page: Page,
}
