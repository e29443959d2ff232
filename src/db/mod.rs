//! Database module for catalog persistence.
//!
//! This module provides abstractions for database operations via the
//! Repository pattern, allowing different storage backends to be swapped
//! easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (HTTP handlers, binaries)            │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs) - Business Logic           │
//! │  - Uniqueness/existence pre-checks                      │
//! │  - List + count composition for pagination              │
//! └───────────────────┬─────────────────────────────────────┘
//! │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │ LocalRepository              │ PostgresRepository
//!     │ (in-memory)                  │ (Diesel + r2d2)
//!     └──────────────────────────────┘
//! ```
//!
//! # Recommended Usage
//!
//! **Use the service layer:**
//! ```ignore
//! use librarium::db::{self, services};
//!
//! async fn example() -> anyhow::Result<()> {
//!     db::init_repository()?;
//!     let repo = db::get_repository()?;
//!     let (authors, total) = services::list_authors(repo.as_ref(), &query).await?;
//!     Ok(())
//! }
//! ```

// Feature flag priority: postgres > local
// When multiple features are enabled (e.g., --all-features), postgres takes precedence.
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod models;
pub mod repositories;
pub mod repository;
pub mod services;

pub use factory::{RepositoryFactory, RepositoryType};
pub use models::{
    Author, AuthorQuery, AuthorSortKey, AuthorWithCount, Book, BookChanges, BookFilter, BookQuery,
    BookSortKey, NewAuthor, NewBook, Page, SortOrder,
};
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::{PostgresConfig, PostgresRepository};
pub use repository::{
    AuthorRepository, BookRepository, CatalogRepository, ErrorContext, RepositoryError,
    RepositoryResult,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn CatalogRepository>> = OnceLock::new();

// Priority: postgres > local (when --all-features is used)
#[cfg(feature = "postgres-repo")]
fn create_selected_repository() -> RepositoryResult<Arc<dyn CatalogRepository>> {
    let config = PostgresConfig::from_env().map_err(RepositoryError::configuration)?;
    RepositoryFactory::create_postgres(&config)
}

#[cfg(all(feature = "local-repo", not(feature = "postgres-repo")))]
fn create_selected_repository() -> RepositoryResult<Arc<dyn CatalogRepository>> {
    Ok(RepositoryFactory::create_local())
}

/// Initialize the global repository singleton for the selected backend.
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = create_selected_repository().map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn CatalogRepository>> {
    if REPOSITORY.get().is_none() {
        init_repository()?;
    }

    REPOSITORY
        .get()
        .context("Database not initialized. Call init_repository() first.")
}
