//! Handler-level tests for the HTTP API.
//!
//! Most handlers are invoked directly with extractor values; framework
//! rejection paths (malformed JSON, non-integer path ids) go through the
//! full router so the wire shape is asserted exactly as a client would
//! see it.

mod support;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::{Path, Query, State};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use tower::ServiceExt;

use librarium::db::models::{
    Author, AuthorQuery, AuthorWithCount, Book, BookChanges, BookFilter, BookQuery, NewAuthor,
    NewBook,
};
use librarium::db::repositories::LocalRepository;
use librarium::db::repository::{
    AuthorRepository, BookRepository, CatalogRepository, RepositoryError, RepositoryResult,
};
use librarium::http::dto::{AuthorListParams, BookListParams};
use librarium::http::error::AppError;
use librarium::http::{create_router, handlers, AppState};

fn empty_state() -> AppState {
    AppState::new(Arc::new(LocalRepository::new()) as Arc<dyn CatalogRepository>)
}

async fn seeded_state() -> (AppState, Vec<i64>) {
    let repo = LocalRepository::new();
    let ids = support::seed_catalog(&repo).await;
    (
        AppState::new(Arc::new(repo) as Arc<dyn CatalogRepository>),
        ids,
    )
}

/// Render an `AppError` the way the server would and decode its JSON body.
async fn error_response(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read error body");
    let body = serde_json::from_slice(&bytes).expect("error body is JSON");
    (status, body)
}

/// Send a raw request through the router and decode status plus JSON body.
async fn send(request: Request<Body>) -> (StatusCode, String, Value) {
    let response = create_router(empty_state())
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes).expect("body is JSON");
    (status, content_type, body)
}

/// A backend whose every operation fails, for exercising store-error paths.
struct UnreachableStore;

fn store_down() -> RepositoryError {
    RepositoryError::connection("connection refused")
}

#[async_trait]
impl AuthorRepository for UnreachableStore {
    async fn insert_author(&self, _new: NewAuthor) -> RepositoryResult<Author> {
        Err(store_down())
    }
    async fn fetch_author(&self, _id: i64) -> RepositoryResult<Option<Author>> {
        Err(store_down())
    }
    async fn author_email_exists(&self, _email: &str) -> RepositoryResult<bool> {
        Err(store_down())
    }
    async fn list_authors(&self, _query: &AuthorQuery) -> RepositoryResult<Vec<AuthorWithCount>> {
        Err(store_down())
    }
    async fn count_authors(&self, _name_filter: Option<&str>) -> RepositoryResult<i64> {
        Err(store_down())
    }
    async fn fetch_books_by_author(&self, _author_id: i64) -> RepositoryResult<Vec<Book>> {
        Err(store_down())
    }
    async fn count_books_by_author(&self, _author_id: i64) -> RepositoryResult<i64> {
        Err(store_down())
    }
}

#[async_trait]
impl BookRepository for UnreachableStore {
    async fn insert_book(&self, _new: NewBook) -> RepositoryResult<Book> {
        Err(store_down())
    }
    async fn fetch_book(&self, _id: i64) -> RepositoryResult<Option<Book>> {
        Err(store_down())
    }
    async fn book_isbn_exists(&self, _isbn: &str) -> RepositoryResult<bool> {
        Err(store_down())
    }
    async fn update_book(&self, _id: i64, _changes: BookChanges) -> RepositoryResult<Book> {
        Err(store_down())
    }
    async fn list_books(&self, _query: &BookQuery) -> RepositoryResult<Vec<Book>> {
        Err(store_down())
    }
    async fn count_books(&self, _filter: &BookFilter) -> RepositoryResult<i64> {
        Err(store_down())
    }
}

#[async_trait]
impl CatalogRepository for UnreachableStore {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Err(store_down())
    }
}

// =========================================================
// Health
// =========================================================

#[tokio::test]
async fn test_health_reports_ok() {
    let Json(health) = handlers::health_check(State(empty_state())).await.unwrap();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_health_does_not_leak_store_errors() {
    let state = AppState::new(Arc::new(UnreachableStore) as Arc<dyn CatalogRepository>);
    let Json(health) = handlers::health_check(State(state)).await.unwrap();
    assert_eq!(health.status, "degraded");
    assert!(!health.status.contains("connection refused"));
}

// =========================================================
// Framework rejection paths
// =========================================================

#[tokio::test]
async fn test_malformed_json_body_gets_json_error_shape() {
    let (status, content_type, body) = send(
        Request::builder()
            .method(Method::POST)
            .uri("/authors")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.starts_with("application/json"));
    assert!(body["error"].as_str().unwrap().contains("Invalid request body"));
}

#[tokio::test]
async fn test_missing_content_type_gets_json_error_shape() {
    let (status, content_type, body) = send(
        Request::builder()
            .method(Method::POST)
            .uri("/authors")
            .body(Body::from(r#"{"name":"Jane Austen","email":"jane@example.com"}"#))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.starts_with("application/json"));
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn test_non_integer_path_id_gets_json_error_shape() {
    let (status, content_type, body) = send(
        Request::builder()
            .method(Method::GET)
            .uri("/authors/abc")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.starts_with("application/json"));
    assert!(body["error"].as_str().unwrap().contains("Invalid path parameter"));
}

// =========================================================
// Authors
// =========================================================

#[tokio::test]
async fn test_create_author_returns_201_and_zero_book_count() {
    let state = empty_state();
    let (status, Json(author)) = handlers::create_author(
        State(state),
        Ok(Json(json!({"name": "Jane Austen", "email": "jane@example.com"}))),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(author.name, "Jane Austen");
    assert_eq!(author.book_count, 0);
}

#[tokio::test]
async fn test_repeated_author_post_is_conflict() {
    let state = empty_state();
    let body = json!({"name": "Jane Austen", "email": "jane@example.com"});

    handlers::create_author(State(state.clone()), Ok(Json(body.clone())))
        .await
        .unwrap();
    let err = handlers::create_author(State(state), Ok(Json(body)))
        .await
        .unwrap_err();

    let (status, body) = error_response(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already exists.");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_create_author_collects_field_errors() {
    let err = handlers::create_author(
        State(empty_state()),
        Ok(Json(json!({"name": "J", "email": "not-an-email"}))),
    )
    .await
    .unwrap_err();

    let (status, body) = error_response(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed.");
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["loc"], json!(["body", "name"]));
    assert_eq!(details[1]["loc"], json!(["body", "email"]));
}

#[tokio::test]
async fn test_create_author_rejects_incomplete_body() {
    let err = handlers::create_author(
        State(empty_state()),
        Ok(Json(json!({"name": "Jane Austen"}))),
    )
    .await
    .unwrap_err();

    let (status, _) = error_response(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_author_returns_books() {
    let (state, ids) = seeded_state().await;
    let Json(detail) = handlers::get_author(State(state), Ok(Path(ids[0])))
        .await
        .unwrap();

    assert_eq!(detail.name, "J. R. R. Tolkien");
    assert_eq!(detail.books.len(), 3);
}

#[tokio::test]
async fn test_get_missing_author_is_404() {
    let err = handlers::get_author(State(empty_state()), Ok(Path(999)))
        .await
        .unwrap_err();

    let (status, body) = error_response(err).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Author not found.");
}

#[tokio::test]
async fn test_list_authors_sorts_by_book_count_desc_by_default() {
    let (state, ids) = seeded_state().await;
    let params = AuthorListParams {
        sort: Some("book_count".to_string()),
        ..Default::default()
    };
    let Json(page) = handlers::list_authors(State(state), Query(params))
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    let counts: Vec<i64> = page.data.iter().map(|a| a.book_count).collect();
    assert_eq!(counts, vec![3, 2, 2, 2, 1]);
    assert_eq!(page.data[0].id, ids[0]);
    // Equal counts fall back to id ascending.
    assert_eq!(page.data[1].id, ids[1]);
    assert_eq!(page.data[2].id, ids[3]);
}

#[tokio::test]
async fn test_list_authors_rejects_unknown_order() {
    let params = AuthorListParams {
        order: Some("sideways".to_string()),
        ..Default::default()
    };
    let err = handlers::list_authors(State(empty_state()), Query(params))
        .await
        .unwrap_err();

    let (status, body) = error_response(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["loc"], json!(["query", "order"]));
}

// =========================================================
// Books
// =========================================================

#[tokio::test]
async fn test_create_book_returns_201() {
    let (state, ids) = seeded_state().await;
    let (status, Json(book)) = handlers::create_book(
        State(state),
        Ok(Json(json!({
            "title": "Unfinished Tales",
            "isbn": "1212121212",
            "published_year": 1980,
            "author_id": ids[0],
        }))),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book.title, "Unfinished Tales");
    assert_eq!(book.published_year, Some(1980));
}

#[tokio::test]
async fn test_create_book_rejects_bad_isbn() {
    let (state, ids) = seeded_state().await;
    for isbn in ["123456789", "12345678901", "123456789X", "12345 6789"] {
        let err = handlers::create_book(
            State(state.clone()),
            Ok(Json(json!({"title": "Bad ISBN", "isbn": isbn, "author_id": ids[0]}))),
        )
        .await
        .unwrap_err();

        let (status, body) = error_response(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "isbn={isbn}");
        assert_eq!(body["details"][0]["loc"], json!(["body", "isbn"]));
    }
}

#[tokio::test]
async fn test_create_book_year_boundaries() {
    let (state, ids) = seeded_state().await;
    for (year, isbn, ok) in [
        (999, "1000000001", false),
        (1000, "1000000002", true),
        (2100, "1000000003", true),
        (2101, "1000000004", false),
    ] {
        let result = handlers::create_book(
            State(state.clone()),
            Ok(Json(json!({
                "title": "Boundary",
                "isbn": isbn,
                "published_year": year,
                "author_id": ids[0],
            }))),
        )
        .await;
        assert_eq!(result.is_ok(), ok, "year={year}");
        if let Err(err) = result {
            let (status, body) = error_response(err).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["details"][0]["loc"], json!(["body", "published_year"]));
        }
    }
}

#[tokio::test]
async fn test_create_book_with_unknown_author_is_400_not_404() {
    let err = handlers::create_book(
        State(empty_state()),
        Ok(Json(json!({"title": "Orphan", "isbn": "0000000000", "author_id": 42}))),
    )
    .await
    .unwrap_err();

    let (status, body) = error_response(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid author_id. Author does not exist.");
}

#[tokio::test]
async fn test_duplicate_isbn_is_conflict() {
    let (state, ids) = seeded_state().await;
    let err = handlers::create_book(
        State(state),
        Ok(Json(json!({"title": "Hobbit Again", "isbn": "1234567890", "author_id": ids[0]}))),
    )
    .await
    .unwrap_err();

    let (status, body) = error_response(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ISBN already exists.");
}

#[tokio::test]
async fn test_get_book_includes_author_with_count() {
    let (state, _) = seeded_state().await;
    let Json(listing) = handlers::list_books(
        State(state.clone()),
        Query(BookListParams {
            title: Some("Hobbit".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    let hobbit_id = listing.data[0].id;

    let Json(detail) = handlers::get_book(State(state), Ok(Path(hobbit_id)))
        .await
        .unwrap();
    assert_eq!(detail.title, "The Hobbit");
    assert_eq!(detail.author.name, "J. R. R. Tolkien");
    assert_eq!(detail.author.book_count, 3);
}

#[tokio::test]
async fn test_get_missing_book_is_404() {
    let err = handlers::get_book(State(empty_state()), Ok(Path(999)))
        .await
        .unwrap_err();

    let (status, body) = error_response(err).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Book not found.");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_list_books_by_year_finds_the_hobbit() {
    let (state, _) = seeded_state().await;
    let Json(page) = handlers::list_books(
        State(state),
        Query(BookListParams {
            year: Some("1937".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].title, "The Hobbit");
    assert_eq!(page.data[0].isbn, "1234567890");
}

#[tokio::test]
async fn test_list_books_total_ignores_page_window() {
    let (state, _) = seeded_state().await;
    let Json(page) = handlers::list_books(
        State(state),
        Query(BookListParams {
            limit: Some("2".to_string()),
            offset: Some("8".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(page.total, 10);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.limit, 2);
    assert_eq!(page.offset, 8);
}

#[tokio::test]
async fn test_list_books_rejects_out_of_range_limit() {
    let err = handlers::list_books(
        State(empty_state()),
        Query(BookListParams {
            limit: Some("0".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap_err();

    let (status, body) = error_response(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["loc"], json!(["query", "limit"]));
}

#[tokio::test]
async fn test_list_books_rejects_unknown_sort() {
    let err = handlers::list_books(
        State(empty_state()),
        Query(BookListParams {
            sort: Some("isbn".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap_err();

    let (status, body) = error_response(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["loc"], json!(["query", "sort"]));
}

#[tokio::test]
async fn test_update_book_preserves_absent_fields() {
    let (state, _) = seeded_state().await;
    let Json(listing) = handlers::list_books(
        State(state.clone()),
        Query(BookListParams {
            title: Some("Hobbit".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    let before = listing.data[0].clone();

    let Json(after) = handlers::update_book(
        State(state),
        Ok(Path(before.id)),
        Ok(Json(json!({"title": "The Hobbit, or There and Back Again"}))),
    )
    .await
    .unwrap();

    assert_eq!(after.title, "The Hobbit, or There and Back Again");
    assert_eq!(after.isbn, before.isbn);
    assert_eq!(after.published_year, before.published_year);
    assert_eq!(after.author_id, before.author_id);
}

#[tokio::test]
async fn test_update_book_validates_supplied_fields_only() {
    let (state, _) = seeded_state().await;
    let err = handlers::update_book(State(state), Ok(Path(1)), Ok(Json(json!({"isbn": "123"}))))
        .await
        .unwrap_err();

    let (status, body) = error_response(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["loc"], json!(["body", "isbn"]));
}

#[tokio::test]
async fn test_update_missing_book_is_404() {
    let err = handlers::update_book(
        State(empty_state()),
        Ok(Path(999)),
        Ok(Json(json!({"title": "Ghost"}))),
    )
    .await
    .unwrap_err();

    let (status, _) = error_response(err).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
