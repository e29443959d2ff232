//! Service layer: business logic on top of the repository traits.
//!
//! These functions perform the advisory pre-checks (email/ISBN uniqueness,
//! author existence) before delegating to the store. The checks are
//! best-effort: a race between check and insert is possible, and the
//! store's own constraints remain the final authority. Validation of field
//! syntax (ISBN format, year range) happens earlier, in the schema layer,
//! so nothing here mutates the store with malformed data.

use tracing::debug;

use super::models::{
    Author, AuthorQuery, AuthorWithCount, Book, BookChanges, BookQuery, NewAuthor, NewBook,
};
use super::repository::{CatalogRepository, RepositoryError, RepositoryResult};

/// Check that the backing store is reachable.
pub async fn health_check(repo: &dyn CatalogRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Create an author after verifying the email is not already taken.
pub async fn create_author(
    repo: &dyn CatalogRepository,
    new: NewAuthor,
) -> RepositoryResult<Author> {
    if repo.author_email_exists(&new.email).await? {
        return Err(RepositoryError::conflict("Email already exists.")
            .with_operation("create_author"));
    }
    let author = repo.insert_author(new).await?;
    debug!(author_id = author.id, "created author");
    Ok(author)
}

/// Fetch an author together with all of its books.
pub async fn get_author_with_books(
    repo: &dyn CatalogRepository,
    author_id: i64,
) -> RepositoryResult<(Author, Vec<Book>)> {
    let author = repo
        .fetch_author(author_id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Author not found."))?;
    let books = repo.fetch_books_by_author(author_id).await?;
    Ok((author, books))
}

/// Run the author page and count queries. The total reflects the name
/// filter alone and is invariant under the page window.
pub async fn list_authors(
    repo: &dyn CatalogRepository,
    query: &AuthorQuery,
) -> RepositoryResult<(Vec<AuthorWithCount>, i64)> {
    let total = repo.count_authors(query.name.as_deref()).await?;
    let rows = repo.list_authors(query).await?;
    Ok((rows, total))
}

/// Create a book after verifying the author exists and the ISBN is free.
pub async fn create_book(repo: &dyn CatalogRepository, new: NewBook) -> RepositoryResult<Book> {
    if repo.fetch_author(new.author_id).await?.is_none() {
        return Err(
            RepositoryError::validation("Invalid author_id. Author does not exist.")
                .with_operation("create_book"),
        );
    }
    if repo.book_isbn_exists(&new.isbn).await? {
        return Err(RepositoryError::conflict("ISBN already exists.").with_operation("create_book"));
    }
    let book = repo.insert_book(new).await?;
    debug!(book_id = book.id, "created book");
    Ok(book)
}

/// Fetch a book together with its owning author and the author's current
/// book count.
pub async fn get_book_with_author(
    repo: &dyn CatalogRepository,
    book_id: i64,
) -> RepositoryResult<(Book, Author, i64)> {
    let book = repo
        .fetch_book(book_id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("Book not found."))?;
    let author = repo.fetch_author(book.author_id).await?.ok_or_else(|| {
        // The schema's foreign key makes this unreachable outside of a
        // concurrent cascade; treat it as a store inconsistency.
        RepositoryError::internal(format!(
            "Book {} references missing author {}",
            book.id, book.author_id
        ))
    })?;
    let book_count = repo.count_books_by_author(author.id).await?;
    Ok((book, author, book_count))
}

/// Apply a partial update to a book. Supplied ISBN/author values are
/// checked by the store; a missing id yields `NotFound`.
pub async fn update_book(
    repo: &dyn CatalogRepository,
    book_id: i64,
    changes: BookChanges,
) -> RepositoryResult<Book> {
    let book = repo.update_book(book_id, changes).await?;
    debug!(book_id = book.id, "updated book");
    Ok(book)
}

/// Run the book page and count queries. The total reflects the filters
/// alone and is invariant under the page window.
pub async fn list_books(
    repo: &dyn CatalogRepository,
    query: &BookQuery,
) -> RepositoryResult<(Vec<Book>, i64)> {
    let total = repo.count_books(&query.filter).await?;
    let rows = repo.list_books(query).await?;
    Ok((rows, total))
}
