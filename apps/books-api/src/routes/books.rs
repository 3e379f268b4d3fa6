//! Book API endpoints
//!
//! CRUD over the book collection:
//! - List books, optionally sorted by title
//! - Get a book by id
//! - Create, update and delete books

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::books::{Book, BookList, SortOrder};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for listing books
#[derive(Debug, Deserialize)]
pub struct ListParams {
    sorting: Option<String>,
}

/// Response carrying a created or updated book
#[derive(Serialize)]
pub struct BookResponse {
    pub message: String,
    pub book: Book,
}

/// Response for operations that only confirm
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Integer book id taken from the path
#[derive(Debug, Clone, Copy)]
pub struct BookId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for BookId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        raw.parse()
            .map(BookId)
            .map_err(|_| AppError::Validation(format!("Book id must be an integer, got {:?}", raw)))
    }
}

/// Title ordering taken from the `sorting` query parameter
#[derive(Debug, Clone, Copy)]
pub struct Sorting(pub Option<SortOrder>);

#[async_trait]
impl<S> FromRequestParts<S> for Sorting
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Query(params) = Query::<ListParams>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::Validation(e.body_text()))?;

        SortOrder::parse_param(params.sorting.as_deref())
            .map(Sorting)
            .map_err(AppError::Validation)
    }
}

/// JSON object request body
#[derive(Debug)]
pub struct BookFields(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for BookFields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        match value {
            Value::Object(fields) => Ok(BookFields(fields)),
            _ => Err(AppError::Validation(
                "Request body must be a JSON object".to_string(),
            )),
        }
    }
}

/// Create the books router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
}

/// List all books
async fn list_books(
    State(state): State<AppState>,
    Sorting(order): Sorting,
) -> Result<Json<BookList>> {
    let list = state.catalog().list(order).await?;
    Ok(Json(list))
}

/// Get a book by id
async fn get_book(State(state): State<AppState>, BookId(id): BookId) -> Result<Json<Book>> {
    let book = state.catalog().get(id).await?;
    Ok(Json(book))
}

/// Create a book
async fn create_book(
    State(state): State<AppState>,
    BookFields(fields): BookFields,
) -> Result<(StatusCode, Json<BookResponse>)> {
    let book = state.catalog().create(fields).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            message: "Book added".to_string(),
            book,
        }),
    ))
}

/// Update the title, author, genre or price of a book
async fn update_book(
    State(state): State<AppState>,
    BookId(id): BookId,
    BookFields(changes): BookFields,
) -> Result<Json<BookResponse>> {
    let book = state.catalog().update(id, &changes).await?;
    Ok(Json(BookResponse {
        message: "Book updated".to_string(),
        book,
    }))
}

/// Delete a book
async fn delete_book(
    State(state): State<AppState>,
    BookId(id): BookId,
) -> Result<Json<MessageResponse>> {
    state.catalog().delete(id).await?;
    Ok(Json(MessageResponse {
        message: format!("Book with id={} deleted", id),
    }))
}
