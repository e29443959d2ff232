use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text, Timestamptz};

use super::schema::{authors, books};
use crate::db::models::{Author, Book, BookChanges, NewAuthor, NewBook};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = authors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthorRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Author {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = authors)]
pub struct NewAuthorRow {
    pub name: String,
    pub email: String,
}

impl From<NewAuthor> for NewAuthorRow {
    fn from(new: NewAuthor) -> Self {
        NewAuthorRow {
            name: new.name,
            email: new.email,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookRow {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub published_year: Option<i32>,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            title: row.title,
            isbn: row.isbn,
            published_year: row.published_year,
            author_id: row.author_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = books)]
pub struct NewBookRow {
    pub title: String,
    pub isbn: String,
    pub published_year: Option<i32>,
    pub author_id: i64,
}

impl From<NewBook> for NewBookRow {
    fn from(new: NewBook) -> Self {
        NewBookRow {
            title: new.title,
            isbn: new.isbn,
            published_year: new.published_year,
            author_id: new.author_id,
        }
    }
}

/// Changeset for partial book updates. `None` fields are skipped by Diesel,
/// so only the supplied fields reach the UPDATE statement.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = books)]
pub struct BookChangesRow {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub author_id: Option<i64>,
}

impl From<BookChanges> for BookChangesRow {
    fn from(changes: BookChanges) -> Self {
        BookChangesRow {
            title: changes.title,
            isbn: changes.isbn,
            published_year: changes.published_year,
            author_id: changes.author_id,
        }
    }
}

/// Row shape for the aggregated author listing (raw SQL with a LEFT JOIN
/// and GROUP BY, so authors without books still appear with a zero count).
#[derive(Debug, Clone, QueryableByName)]
pub struct AuthorCountRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Text)]
    pub email: String,
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = BigInt)]
    pub book_count: i64,
}
