//! In-memory repository implementation.
//!
//! Used for unit testing and local development. Mirrors the PostgreSQL
//! backend's semantics, including uniqueness enforcement, foreign-key
//! checks, and null placement when sorting by publication year
//! (ASC puts NULLs last, DESC puts them first).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::db::models::{
    Author, AuthorQuery, AuthorSortKey, AuthorWithCount, Book, BookChanges, BookFilter, BookQuery,
    BookSortKey, NewAuthor, NewBook, SortOrder,
};
use crate::db::repository::{
    AuthorRepository, BookRepository, CatalogRepository, ErrorContext, RepositoryError,
    RepositoryResult,
};

#[derive(Debug, Default)]
struct Store {
    authors: BTreeMap<i64, Author>,
    books: BTreeMap<i64, Book>,
    next_author_id: i64,
    next_book_id: i64,
}

/// In-memory implementation of the catalog repository.
#[derive(Debug, Default)]
pub struct LocalRepository {
    store: RwLock<Store>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Compare optional years the way Postgres orders nullable columns
/// ascending: NULLs sort last. Descending order is the exact reverse.
fn cmp_year_asc(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

fn apply_order(ord: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

fn page_slice<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

impl Store {
    fn book_count_for(&self, author_id: i64) -> i64 {
        self.books.values().filter(|b| b.author_id == author_id).count() as i64
    }

    fn filtered_authors(&self, name_filter: Option<&str>) -> Vec<&Author> {
        self.authors
            .values()
            .filter(|a| name_filter.map_or(true, |n| contains_ci(&a.name, n)))
            .collect()
    }

    fn filtered_books(&self, filter: &BookFilter) -> Vec<&Book> {
        self.books
            .values()
            .filter(|b| {
                filter.title.as_deref().map_or(true, |t| contains_ci(&b.title, t))
                    && filter.author_name.as_deref().map_or(true, |n| {
                        self.authors
                            .get(&b.author_id)
                            .map_or(false, |a| contains_ci(&a.name, n))
                    })
                    && filter.year.map_or(true, |y| b.published_year == Some(y))
            })
            .collect()
    }
}

#[async_trait]
impl AuthorRepository for LocalRepository {
    async fn insert_author(&self, new: NewAuthor) -> RepositoryResult<Author> {
        let mut store = self.store.write();
        if store.authors.values().any(|a| a.email == new.email) {
            return Err(RepositoryError::conflict_with_context(
                "Email already exists.",
                ErrorContext::new("insert_author").with_entity("author"),
            ));
        }

        store.next_author_id += 1;
        let author = Author {
            id: store.next_author_id,
            name: new.name,
            email: new.email,
            created_at: Utc::now(),
        };
        store.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn fetch_author(&self, id: i64) -> RepositoryResult<Option<Author>> {
        Ok(self.store.read().authors.get(&id).cloned())
    }

    async fn author_email_exists(&self, email: &str) -> RepositoryResult<bool> {
        Ok(self.store.read().authors.values().any(|a| a.email == email))
    }

    async fn list_authors(&self, query: &AuthorQuery) -> RepositoryResult<Vec<AuthorWithCount>> {
        let store = self.store.read();
        let mut rows: Vec<AuthorWithCount> = store
            .filtered_authors(query.name.as_deref())
            .into_iter()
            .map(|a| AuthorWithCount {
                author: a.clone(),
                book_count: store.book_count_for(a.id),
            })
            .collect();

        match query.sort {
            // BTreeMap iteration already yields id ascending.
            None => {}
            Some(AuthorSortKey::BookCount) => rows.sort_by(|a, b| {
                apply_order(a.book_count.cmp(&b.book_count), query.order)
                    .then(a.author.id.cmp(&b.author.id))
            }),
        }

        Ok(page_slice(rows, query.page.limit, query.page.offset))
    }

    async fn count_authors(&self, name_filter: Option<&str>) -> RepositoryResult<i64> {
        Ok(self.store.read().filtered_authors(name_filter).len() as i64)
    }

    async fn fetch_books_by_author(&self, author_id: i64) -> RepositoryResult<Vec<Book>> {
        Ok(self
            .store
            .read()
            .books
            .values()
            .filter(|b| b.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn count_books_by_author(&self, author_id: i64) -> RepositoryResult<i64> {
        Ok(self.store.read().book_count_for(author_id))
    }
}

#[async_trait]
impl BookRepository for LocalRepository {
    async fn insert_book(&self, new: NewBook) -> RepositoryResult<Book> {
        let mut store = self.store.write();
        if !store.authors.contains_key(&new.author_id) {
            return Err(RepositoryError::validation_with_context(
                "Invalid author_id. Author does not exist.",
                ErrorContext::new("insert_book")
                    .with_entity("author")
                    .with_entity_id(new.author_id),
            ));
        }
        if store.books.values().any(|b| b.isbn == new.isbn) {
            return Err(RepositoryError::conflict_with_context(
                "ISBN already exists.",
                ErrorContext::new("insert_book").with_entity("book"),
            ));
        }

        store.next_book_id += 1;
        let book = Book {
            id: store.next_book_id,
            title: new.title,
            isbn: new.isbn,
            published_year: new.published_year,
            author_id: new.author_id,
            created_at: Utc::now(),
        };
        store.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn fetch_book(&self, id: i64) -> RepositoryResult<Option<Book>> {
        Ok(self.store.read().books.get(&id).cloned())
    }

    async fn book_isbn_exists(&self, isbn: &str) -> RepositoryResult<bool> {
        Ok(self.store.read().books.values().any(|b| b.isbn == isbn))
    }

    async fn update_book(&self, id: i64, changes: BookChanges) -> RepositoryResult<Book> {
        let mut store = self.store.write();

        if !store.books.contains_key(&id) {
            return Err(RepositoryError::not_found_with_context(
                "Book not found.",
                ErrorContext::new("update_book")
                    .with_entity("book")
                    .with_entity_id(id),
            ));
        }
        if let Some(isbn) = &changes.isbn {
            if store.books.values().any(|b| b.id != id && &b.isbn == isbn) {
                return Err(RepositoryError::conflict_with_context(
                    "ISBN already exists.",
                    ErrorContext::new("update_book").with_entity("book").with_entity_id(id),
                ));
            }
        }
        if let Some(author_id) = changes.author_id {
            if !store.authors.contains_key(&author_id) {
                return Err(RepositoryError::validation_with_context(
                    "Invalid author_id. Author does not exist.",
                    ErrorContext::new("update_book")
                        .with_entity("author")
                        .with_entity_id(author_id),
                ));
            }
        }

        let book = store
            .books
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::internal("book row vanished during update"))?;
        if let Some(title) = changes.title {
            book.title = title;
        }
        if let Some(isbn) = changes.isbn {
            book.isbn = isbn;
        }
        if let Some(year) = changes.published_year {
            book.published_year = Some(year);
        }
        if let Some(author_id) = changes.author_id {
            book.author_id = author_id;
        }
        Ok(book.clone())
    }

    async fn list_books(&self, query: &BookQuery) -> RepositoryResult<Vec<Book>> {
        let store = self.store.read();
        let mut rows: Vec<Book> = store
            .filtered_books(&query.filter)
            .into_iter()
            .cloned()
            .collect();

        match query.sort {
            None => {}
            Some(BookSortKey::Title) => rows.sort_by(|a, b| {
                apply_order(a.title.cmp(&b.title), query.order).then(a.id.cmp(&b.id))
            }),
            Some(BookSortKey::PublishedYear) => rows.sort_by(|a, b| {
                apply_order(cmp_year_asc(a.published_year, b.published_year), query.order)
                    .then(a.id.cmp(&b.id))
            }),
            Some(BookSortKey::CreatedAt) => rows.sort_by(|a, b| {
                apply_order(a.created_at.cmp(&b.created_at), query.order).then(a.id.cmp(&b.id))
            }),
        }

        Ok(page_slice(rows, query.page.limit, query.page.offset))
    }

    async fn count_books(&self, filter: &BookFilter) -> RepositoryResult<i64> {
        Ok(self.store.read().filtered_books(filter).len() as i64)
    }
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
