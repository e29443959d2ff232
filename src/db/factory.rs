//! Factory for creating repository instances.
//!
//! Centralizes backend construction so binaries and tests never reference
//! a concrete repository type directly.

use std::sync::Arc;

#[cfg(feature = "local-repo")]
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::{PostgresConfig, PostgresRepository};
use super::repository::CatalogRepository;
#[cfg(feature = "postgres-repo")]
use super::repository::RepositoryResult;

/// Available repository backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory backend
    #[cfg(feature = "local-repo")]
    Local,
    /// PostgreSQL backend
    #[cfg(feature = "postgres-repo")]
    Postgres,
}

/// Factory for creating repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create an in-memory repository.
    #[cfg(feature = "local-repo")]
    pub fn create_local() -> Arc<dyn CatalogRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create a Postgres repository, running pending migrations.
    #[cfg(feature = "postgres-repo")]
    pub fn create_postgres(config: &PostgresConfig) -> RepositoryResult<Arc<dyn CatalogRepository>> {
        let repo = PostgresRepository::new(config.clone())?;
        Ok(Arc::new(repo))
    }
}
