//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic. Body and path extractors are taken
//! as `Result`s so a malformed JSON body, a missing content type, or a
//! non-integer id surfaces as the API's own 400 shape rather than a
//! plain-text framework rejection.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    AuthorListParams, AuthorOut, AuthorWithBooks, BookListParams, BookOut, BookWithAuthor,
    CreateAuthorRequest, CreateBookRequest, HealthResponse, Paginated, UpdateBookRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::models::{NewAuthor, NewBook};
use crate::db::services as db_services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn parse_body<T: serde::de::DeserializeOwned>(
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) =
        body.map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}

fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    let Path(id) =
        path.map_err(|e| AppError::BadRequest(format!("Invalid path parameter: {}", e)))?;
    Ok(id)
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is
/// accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    // Store errors are logged, never echoed into the response body.
    let status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "ok",
        Ok(false) => "degraded",
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            "degraded"
        }
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
    }))
}

// =============================================================================
// Authors
// =============================================================================

/// GET /authors
///
/// Paginated author listing with optional name filter and book_count sort.
pub async fn list_authors(
    State(state): State<AppState>,
    Query(params): Query<AuthorListParams>,
) -> HandlerResult<Paginated<AuthorOut>> {
    let query = params.into_query().map_err(AppError::Validation)?;
    let (rows, total) = db_services::list_authors(state.repository.as_ref(), &query).await?;

    Ok(Json(Paginated {
        data: rows
            .into_iter()
            .map(|row| AuthorOut::from_author(row.author, row.book_count))
            .collect(),
        total,
        limit: query.page.limit,
        offset: query.page.offset,
    }))
}

/// POST /authors
///
/// Create an author. Duplicate emails yield 409.
pub async fn create_author(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthorOut>), AppError> {
    let request: CreateAuthorRequest = parse_body(body)?;
    request.validate().map_err(AppError::Validation)?;

    let author = db_services::create_author(
        state.repository.as_ref(),
        NewAuthor {
            name: request.name,
            email: request.email,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(AuthorOut::from_author(author, 0))))
}

/// GET /authors/{author_id}
///
/// Author detail including the full list of owned books.
pub async fn get_author(
    State(state): State<AppState>,
    author_id: Result<Path<i64>, PathRejection>,
) -> HandlerResult<AuthorWithBooks> {
    let author_id = path_id(author_id)?;
    let (author, books) =
        db_services::get_author_with_books(state.repository.as_ref(), author_id).await?;

    Ok(Json(AuthorWithBooks::from_parts(author, books)))
}

// =============================================================================
// Books
// =============================================================================

/// GET /books
///
/// Paginated book listing with title/author/year filters and sorting.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BookListParams>,
) -> HandlerResult<Paginated<BookOut>> {
    let query = params.into_query().map_err(AppError::Validation)?;
    let (rows, total) = db_services::list_books(state.repository.as_ref(), &query).await?;

    Ok(Json(Paginated {
        data: rows.into_iter().map(Into::into).collect(),
        total,
        limit: query.page.limit,
        offset: query.page.offset,
    }))
}

/// POST /books
///
/// Create a book. An unknown author_id yields 400, a duplicate ISBN 409.
pub async fn create_book(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookOut>), AppError> {
    let request: CreateBookRequest = parse_body(body)?;
    request.validate().map_err(AppError::Validation)?;

    let book = db_services::create_book(
        state.repository.as_ref(),
        NewBook {
            title: request.title,
            isbn: request.isbn,
            published_year: request.published_year,
            author_id: request.author_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(book.into())))
}

/// GET /books/{book_id}
///
/// Book detail including the owning author and its current book count.
pub async fn get_book(
    State(state): State<AppState>,
    book_id: Result<Path<i64>, PathRejection>,
) -> HandlerResult<BookWithAuthor> {
    let book_id = path_id(book_id)?;
    let (book, author, book_count) =
        db_services::get_book_with_author(state.repository.as_ref(), book_id).await?;

    Ok(Json(BookWithAuthor::from_parts(book, author, book_count)))
}

/// PUT /books/{book_id}
///
/// Partial update: absent fields keep their stored values.
pub async fn update_book(
    State(state): State<AppState>,
    book_id: Result<Path<i64>, PathRejection>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> HandlerResult<BookOut> {
    let book_id = path_id(book_id)?;
    let request: UpdateBookRequest = parse_body(body)?;
    request.validate().map_err(AppError::Validation)?;

    let book =
        db_services::update_book(state.repository.as_ref(), book_id, request.into()).await?;

    Ok(Json(book.into()))
}
