//! HTTP facade over the record store.
//!
//! # Endpoints
//!
//! - `GET /api/books?search&category&sort` - filtered, sorted list
//! - `POST /api/books` - create, `201` with the stored record
//! - `PUT /api/books/:id` - partial update
//! - `DELETE /api/books/:id` - delete, always `{"success": true}`
//! - `GET /api/categories` - `"All"` plus every category in use

mod routes;
mod server;

pub use routes::{book_routes, ApiError};
pub use server::{build_router, HttpServer};
