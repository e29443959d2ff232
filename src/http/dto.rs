//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies and query parameters are validated here, before any
//! store access, so malformed input never reaches the data layer. The
//! validation pass collects every field-level failure instead of stopping
//! at the first one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::FieldError;
use crate::db::models::{
    Author, AuthorQuery, AuthorSortKey, Book, BookChanges, BookFilter, BookQuery, BookSortKey,
    Page, SortOrder,
};
use crate::validation::{is_valid_email, is_valid_isbn10, is_valid_year};

/// Page size bounds for list endpoints.
const LIMIT_MIN: i64 = 1;
const LIMIT_MAX: i64 = 100;
const LIMIT_DEFAULT: i64 = 20;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Author representation with its computed book count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorOut {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub book_count: i64,
}

impl AuthorOut {
    pub fn from_author(author: Author, book_count: i64) -> Self {
        Self {
            id: author.id,
            name: author.name,
            email: author.email,
            created_at: author.created_at,
            book_count,
        }
    }
}

/// Book representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookOut {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub published_year: Option<i32>,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Book> for BookOut {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            isbn: book.isbn,
            published_year: book.published_year,
            author_id: book.author_id,
            created_at: book.created_at,
        }
    }
}

/// Author detail: base fields plus the full list of owned books.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorWithBooks {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub books: Vec<BookOut>,
}

impl AuthorWithBooks {
    pub fn from_parts(author: Author, books: Vec<Book>) -> Self {
        Self {
            id: author.id,
            name: author.name,
            email: author.email,
            created_at: author.created_at,
            books: books.into_iter().map(Into::into).collect(),
        }
    }
}

/// Book detail: base fields plus the owning author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookWithAuthor {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub published_year: Option<i32>,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub author: AuthorOut,
}

impl BookWithAuthor {
    pub fn from_parts(book: Book, author: Author, author_book_count: i64) -> Self {
        Self {
            id: book.id,
            title: book.title,
            isbn: book.isbn,
            published_year: book.published_year,
            author_id: book.author_id,
            created_at: book.created_at,
            author: AuthorOut::from_author(author, author_book_count),
        }
    }
}

/// Paginated list envelope: `total` reflects the filters alone and is
/// invariant under the page window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Request body for creating an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuthorRequest {
    pub name: String,
    pub email: String,
}

impl CreateAuthorRequest {
    /// Field-level validation pass; collects all failures.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.name.chars().count() < 2 {
            errors.push(FieldError::body(
                "name",
                "Name must be at least 2 characters long.",
            ));
        }
        if !is_valid_email(&self.email) {
            errors.push(FieldError::body("email", "Invalid email address."));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Request body for creating a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub isbn: String,
    #[serde(default)]
    pub published_year: Option<i32>,
    pub author_id: i64,
}

impl CreateBookRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.title.is_empty() {
            errors.push(FieldError::body("title", "Title must not be empty."));
        }
        if !is_valid_isbn10(&self.isbn) {
            errors.push(FieldError::body("isbn", "ISBN must be exactly 10 digits."));
        }
        if !is_valid_year(self.published_year) {
            errors.push(FieldError::body(
                "published_year",
                "Published year must be between 1000 and 2100.",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Request body for partially updating a book. Absent fields are left
/// unchanged; only supplied isbn/published_year values are re-validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBookRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub author_id: Option<i64>,
}

impl UpdateBookRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if let Some(isbn) = &self.isbn {
            if !is_valid_isbn10(isbn) {
                errors.push(FieldError::body("isbn", "ISBN must be exactly 10 digits."));
            }
        }
        if self.published_year.is_some() && !is_valid_year(self.published_year) {
            errors.push(FieldError::body(
                "published_year",
                "Published year must be between 1000 and 2100.",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<UpdateBookRequest> for BookChanges {
    fn from(req: UpdateBookRequest) -> Self {
        BookChanges {
            title: req.title,
            isbn: req.isbn,
            published_year: req.published_year,
            author_id: req.author_id,
        }
    }
}

/// Raw query parameters for `GET /authors`. Every value arrives as a
/// string so range and enum failures produce the API's own JSON 400
/// shape instead of a framework rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorListParams {
    pub name: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl AuthorListParams {
    pub fn into_query(self) -> Result<AuthorQuery, Vec<FieldError>> {
        let mut errors = Vec::new();

        let sort = match self.sort.as_deref() {
            None => None,
            Some(s) => match AuthorSortKey::parse(s) {
                Some(key) => Some(key),
                None => {
                    errors.push(FieldError::query("sort", "Sort key must be 'book_count'."));
                    None
                }
            },
        };
        // Authors default to descending so the busiest authors come first.
        let order = parse_order(self.order.as_deref(), SortOrder::Desc, &mut errors);
        let page = parse_page(self.limit.as_deref(), self.offset.as_deref(), &mut errors);

        if errors.is_empty() {
            Ok(AuthorQuery {
                name: self.name,
                sort,
                order,
                page,
            })
        } else {
            Err(errors)
        }
    }
}

/// Raw query parameters for `GET /books`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookListParams {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl BookListParams {
    pub fn into_query(self) -> Result<BookQuery, Vec<FieldError>> {
        let mut errors = Vec::new();

        let year = match self.year.as_deref() {
            None => None,
            Some(s) => match s.parse::<i32>() {
                Ok(y) => Some(y),
                Err(_) => {
                    errors.push(FieldError::query("year", "Year must be an integer."));
                    None
                }
            },
        };
        let sort = match self.sort.as_deref() {
            None => None,
            Some(s) => match BookSortKey::parse(s) {
                Some(key) => Some(key),
                None => {
                    errors.push(FieldError::query(
                        "sort",
                        "Sort key must be one of 'title', 'published_year', 'created_at'.",
                    ));
                    None
                }
            },
        };
        let order = parse_order(self.order.as_deref(), SortOrder::Asc, &mut errors);
        let page = parse_page(self.limit.as_deref(), self.offset.as_deref(), &mut errors);

        if errors.is_empty() {
            Ok(BookQuery {
                filter: BookFilter {
                    title: self.title,
                    author_name: self.author,
                    year,
                },
                sort,
                order,
                page,
            })
        } else {
            Err(errors)
        }
    }
}

fn parse_order(raw: Option<&str>, default: SortOrder, errors: &mut Vec<FieldError>) -> SortOrder {
    match raw {
        None => default,
        Some(s) => match SortOrder::parse(s) {
            Some(order) => order,
            None => {
                errors.push(FieldError::query("order", "Order must be 'asc' or 'desc'."));
                default
            }
        },
    }
}

fn parse_page(
    limit: Option<&str>,
    offset: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Page {
    let limit = match limit {
        None => LIMIT_DEFAULT,
        Some(s) => match s.parse::<i64>() {
            Ok(v) if (LIMIT_MIN..=LIMIT_MAX).contains(&v) => v,
            _ => {
                errors.push(FieldError::query(
                    "limit",
                    format!("Limit must be an integer between {LIMIT_MIN} and {LIMIT_MAX}."),
                ));
                LIMIT_DEFAULT
            }
        },
    };
    let offset = match offset {
        None => 0,
        Some(s) => match s.parse::<i64>() {
            Ok(v) if v >= 0 => v,
            _ => {
                errors.push(FieldError::query(
                    "offset",
                    "Offset must be a non-negative integer.",
                ));
                0
            }
        },
    };
    Page { limit, offset }
}
