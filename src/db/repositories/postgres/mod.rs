//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic migration execution at startup
//! - Blocking Diesel work moved off the async runtime via `spawn_blocking`
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)

use async_trait::async_trait;
use diesel::dsl::{count_star, exists};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::db::models::{
    Author, AuthorQuery, AuthorSortKey, AuthorWithCount, Book, BookChanges, BookFilter, BookQuery,
    BookSortKey, NewAuthor, NewBook, SortOrder,
};
use crate::db::repository::{
    AuthorRepository, BookRepository, CatalogRepository, ErrorContext, RepositoryError,
    RepositoryResult,
};

mod models;
mod schema;

use models::{AuthorCountRow, AuthorRow, BookChangesRow, BookRow, NewAuthorRow, NewBookRow};
use schema::{authors, books};

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation on the blocking thread pool.
    ///
    /// Diesel connections are synchronous; running them through
    /// `spawn_blocking` keeps the async runtime free. No automatic retry
    /// is performed: a request either completes or fails.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();

        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection"),
                )
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn like_pattern(needle: &str) -> String {
    format!("%{}%", needle)
}

/// ORDER BY fragment for the aggregated author listing. Built from closed
/// enums, never from raw user input.
fn author_order_sql(sort: Option<AuthorSortKey>, order: SortOrder) -> &'static str {
    match (sort, order) {
        (None, _) => "a.id ASC",
        (Some(AuthorSortKey::BookCount), SortOrder::Asc) => "book_count ASC, a.id ASC",
        (Some(AuthorSortKey::BookCount), SortOrder::Desc) => "book_count DESC, a.id ASC",
    }
}

#[async_trait]
impl AuthorRepository for PostgresRepository {
    async fn insert_author(&self, new: NewAuthor) -> RepositoryResult<Author> {
        let row: NewAuthorRow = new.into();
        self.with_conn(move |conn| {
            let inserted: AuthorRow = diesel::insert_into(authors::table)
                .values(&row)
                .returning(AuthorRow::as_returning())
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("insert_author"))?;
            Ok(inserted.into())
        })
        .await
    }

    async fn fetch_author(&self, id: i64) -> RepositoryResult<Option<Author>> {
        self.with_conn(move |conn| {
            let row: Option<AuthorRow> = authors::table
                .find(id)
                .select(AuthorRow::as_select())
                .first(conn)
                .optional()
                .map_err(|e| RepositoryError::from(e).with_operation("fetch_author"))?;
            Ok(row.map(Into::into))
        })
        .await
    }

    async fn author_email_exists(&self, email: &str) -> RepositoryResult<bool> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            diesel::select(exists(authors::table.filter(authors::email.eq(email))))
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("author_email_exists"))
        })
        .await
    }

    async fn list_authors(&self, query: &AuthorQuery) -> RepositoryResult<Vec<AuthorWithCount>> {
        // The book count is an aggregate over a LEFT JOIN; raw SQL keeps
        // the GROUP BY explicit while the ORDER BY comes from a closed
        // enum match above.
        let base = "SELECT a.id, a.name, a.email, a.created_at, COUNT(b.id) AS book_count \
                    FROM authors a LEFT JOIN books b ON b.author_id = a.id";
        let order = author_order_sql(query.sort, query.order);
        let name = query.name.clone();
        let (limit, offset) = (query.page.limit, query.page.offset);

        self.with_conn(move |conn| {
            let rows: Vec<AuthorCountRow> = match name {
                Some(name) => sql_query(format!(
                    "{base} WHERE a.name ILIKE $1 GROUP BY a.id ORDER BY {order} \
                     LIMIT $2 OFFSET $3"
                ))
                .bind::<Text, _>(like_pattern(&name))
                .bind::<BigInt, _>(limit)
                .bind::<BigInt, _>(offset)
                .load(conn),
                None => sql_query(format!(
                    "{base} GROUP BY a.id ORDER BY {order} LIMIT $1 OFFSET $2"
                ))
                .bind::<BigInt, _>(limit)
                .bind::<BigInt, _>(offset)
                .load(conn),
            }
            .map_err(|e| RepositoryError::from(e).with_operation("list_authors"))?;

            Ok(rows
                .into_iter()
                .map(|r| AuthorWithCount {
                    author: Author {
                        id: r.id,
                        name: r.name,
                        email: r.email,
                        created_at: r.created_at,
                    },
                    book_count: r.book_count,
                })
                .collect())
        })
        .await
    }

    async fn count_authors(&self, name_filter: Option<&str>) -> RepositoryResult<i64> {
        let name_filter = name_filter.map(ToString::to_string);
        self.with_conn(move |conn| {
            let mut q = authors::table.select(count_star()).into_boxed();
            if let Some(name) = name_filter {
                q = q.filter(authors::name.ilike(like_pattern(&name)));
            }
            q.get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("count_authors"))
        })
        .await
    }

    async fn fetch_books_by_author(&self, author_id: i64) -> RepositoryResult<Vec<Book>> {
        self.with_conn(move |conn| {
            let rows: Vec<BookRow> = books::table
                .filter(books::author_id.eq(author_id))
                .order(books::id.asc())
                .select(BookRow::as_select())
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("fetch_books_by_author"))?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn count_books_by_author(&self, author_id: i64) -> RepositoryResult<i64> {
        self.with_conn(move |conn| {
            books::table
                .filter(books::author_id.eq(author_id))
                .select(count_star())
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("count_books_by_author"))
        })
        .await
    }
}

#[async_trait]
impl BookRepository for PostgresRepository {
    async fn insert_book(&self, new: NewBook) -> RepositoryResult<Book> {
        let row: NewBookRow = new.into();
        self.with_conn(move |conn| {
            let inserted: BookRow = diesel::insert_into(books::table)
                .values(&row)
                .returning(BookRow::as_returning())
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("insert_book"))?;
            Ok(inserted.into())
        })
        .await
    }

    async fn fetch_book(&self, id: i64) -> RepositoryResult<Option<Book>> {
        self.with_conn(move |conn| {
            let row: Option<BookRow> = books::table
                .find(id)
                .select(BookRow::as_select())
                .first(conn)
                .optional()
                .map_err(|e| RepositoryError::from(e).with_operation("fetch_book"))?;
            Ok(row.map(Into::into))
        })
        .await
    }

    async fn book_isbn_exists(&self, isbn: &str) -> RepositoryResult<bool> {
        let isbn = isbn.to_string();
        self.with_conn(move |conn| {
            diesel::select(exists(books::table.filter(books::isbn.eq(isbn))))
                .get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("book_isbn_exists"))
        })
        .await
    }

    async fn update_book(&self, id: i64, changes: BookChanges) -> RepositoryResult<Book> {
        self.with_conn(move |conn| {
            // Diesel rejects an all-None changeset, and the semantics of an
            // empty update are "return the record unchanged" anyway.
            if changes.is_empty() {
                let row: Option<BookRow> = books::table
                    .find(id)
                    .select(BookRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(|e| RepositoryError::from(e).with_operation("update_book"))?;
                return row.map(Into::into).ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        "Book not found.",
                        ErrorContext::new("update_book")
                            .with_entity("book")
                            .with_entity_id(id),
                    )
                });
            }

            let changeset: BookChangesRow = changes.into();
            let updated: Option<BookRow> = diesel::update(books::table.find(id))
                .set(&changeset)
                .returning(BookRow::as_returning())
                .get_result(conn)
                .optional()
                .map_err(|e| RepositoryError::from(e).with_operation("update_book"))?;

            updated.map(Into::into).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "Book not found.",
                    ErrorContext::new("update_book")
                        .with_entity("book")
                        .with_entity_id(id),
                )
            })
        })
        .await
    }

    async fn list_books(&self, query: &BookQuery) -> RepositoryResult<Vec<Book>> {
        let query = query.clone();
        self.with_conn(move |conn| {
            let mut q = books::table
                .inner_join(authors::table)
                .select(BookRow::as_select())
                .into_boxed();

            if let Some(title) = &query.filter.title {
                q = q.filter(books::title.ilike(like_pattern(title)));
            }
            if let Some(author_name) = &query.filter.author_name {
                q = q.filter(authors::name.ilike(like_pattern(author_name)));
            }
            if let Some(year) = query.filter.year {
                q = q.filter(books::published_year.eq(year));
            }

            // Secondary sort by id keeps pagination deterministic.
            q = match (query.sort, query.order) {
                (None, _) => q.order(books::id.asc()),
                (Some(BookSortKey::Title), SortOrder::Asc) => q.order(books::title.asc()),
                (Some(BookSortKey::Title), SortOrder::Desc) => q.order(books::title.desc()),
                (Some(BookSortKey::PublishedYear), SortOrder::Asc) => {
                    q.order(books::published_year.asc())
                }
                (Some(BookSortKey::PublishedYear), SortOrder::Desc) => {
                    q.order(books::published_year.desc())
                }
                (Some(BookSortKey::CreatedAt), SortOrder::Asc) => q.order(books::created_at.asc()),
                (Some(BookSortKey::CreatedAt), SortOrder::Desc) => {
                    q.order(books::created_at.desc())
                }
            };
            if query.sort.is_some() {
                q = q.then_order_by(books::id.asc());
            }

            let rows: Vec<BookRow> = q
                .limit(query.page.limit)
                .offset(query.page.offset)
                .load(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("list_books"))?;
            Ok(rows.into_iter().map(Into::into).collect())
        })
        .await
    }

    async fn count_books(&self, filter: &BookFilter) -> RepositoryResult<i64> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let mut q = books::table
                .inner_join(authors::table)
                .select(count_star())
                .into_boxed();

            if let Some(title) = &filter.title {
                q = q.filter(books::title.ilike(like_pattern(title)));
            }
            if let Some(author_name) = &filter.author_name {
                q = q.filter(authors::name.ilike(like_pattern(author_name)));
            }
            if let Some(year) = filter.year {
                q = q.filter(books::published_year.eq(year));
            }

            q.get_result(conn)
                .map_err(|e| RepositoryError::from(e).with_operation("count_books"))
        })
        .await
    }
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(|e| RepositoryError::from(e).with_operation("health_check"))
        })
        .await
    }
}
