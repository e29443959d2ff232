//! # Librarium
//!
//! REST API backend for a small library catalog of authors and books.
//!
//! The crate exposes CRUD-style endpoints with filtering, sorting, and
//! pagination on top of a relational store. Persistence goes through the
//! repository pattern so the storage backend can be swapped: a Diesel-backed
//! PostgreSQL implementation for production and an in-memory implementation
//! for tests and local development.
//!
//! ## Architecture
//!
//! The crate is organized into three logical modules:
//!
//! - [`validation`]: pure field validators (ISBN, publication year, email)
//! - [`db`]: domain models, repository traits, storage backends, and the
//!   service layer that performs uniqueness/existence pre-checks
//! - [`http`]: axum-based HTTP server, request/response DTOs, and error
//!   mapping to status codes
//!
//! Control flow: HTTP request → handler parses and validates input →
//! service layer runs pre-checks → repository executes the query →
//! handler maps the result into a response DTO.

pub mod db;
pub mod validation;

#[cfg(feature = "http-server")]
pub mod http;
