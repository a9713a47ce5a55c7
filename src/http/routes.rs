//! Book catalog HTTP routes.
//!
//! Every handler converts errors at its own boundary: the write endpoints
//! (create, update, delete) answer `400`, the read endpoints (list,
//! categories) answer `500`. The status depends on the endpoint, not on the
//! kind of error. Bodies are always `{"error": "<message>"}`.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;
use tracing::{debug, warn};

use crate::db::BookStore;
use crate::error::{CatalogError, Result};
use crate::models::{Book, BookFields, BookId};
use crate::query::BookQuery;

/// Shared handler state: the injected record store.
#[derive(Clone)]
pub struct CatalogState {
    store: Arc<dyn BookStore>,
}

/// Error response carrying the status chosen by the handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, err: impl Display) -> Self {
        let message = err.to_string();
        warn!(status = status.as_u16(), error = %message, "request failed");
        Self { status, message }
    }

    fn bad_request(err: impl Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    fn internal(err: impl Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Create the book routes. Mounted under `/api` by the server.
pub fn book_routes(store: Arc<dyn BookStore>) -> Router {
    Router::new()
        .route("/books", get(list_books_handler).post(create_book_handler))
        .route("/books/:id", put(update_book_handler).delete(delete_book_handler))
        .route("/categories", get(list_categories_handler))
        .with_state(CatalogState { store })
}

/// Run a store operation on the blocking pool; SQLite calls are synchronous.
async fn with_store<T, F>(state: &CatalogState, op: F) -> Result<T>
where
    F: FnOnce(&dyn BookStore) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|err| CatalogError::Task(err.to_string()))?
}

fn parse_id(raw: &str) -> Result<BookId> {
    raw.trim()
        .parse::<BookId>()
        .map_err(|_| CatalogError::InvalidId(raw.to_string()))
}

async fn list_books_handler(
    State(state): State<CatalogState>,
    query: Result<Query<BookQuery>, QueryRejection>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let Query(query) = query.map_err(ApiError::bad_request)?;
    let books = with_store(&state, move |store| store.list(&query))
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(books))
}

async fn create_book_handler(
    State(state): State<CatalogState>,
    payload: Result<Json<BookFields>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let Json(fields) = payload.map_err(ApiError::bad_request)?;
    let book = with_store(&state, move |store| store.create(fields))
        .await
        .map_err(ApiError::bad_request)?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book_handler(
    State(state): State<CatalogState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<BookFields>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let id = parse_id(&raw_id).map_err(ApiError::bad_request)?;
    let Json(fields) = payload.map_err(ApiError::bad_request)?;
    let book = with_store(&state, move |store| store.update(id, fields))
        .await
        .map_err(ApiError::bad_request)?;
    Ok(Json(book))
}

async fn delete_book_handler(
    State(state): State<CatalogState>,
    Path(raw_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&raw_id).map_err(ApiError::bad_request)?;
    let removed = with_store(&state, move |store| store.delete(id))
        .await
        .map_err(ApiError::bad_request)?;
    if !removed {
        debug!(id, "delete of unknown book reported as success");
    }
    Ok(Json(json!({ "success": true })))
}

async fn list_categories_handler(
    State(state): State<CatalogState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let categories = with_store(&state, |store| store.distinct_categories())
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(categories))
}
