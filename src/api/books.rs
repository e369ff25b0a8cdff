//! Book (catalog) endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppResult, MessageResponse},
    models::{Book, BookQuery, CreateBook, PatchBook, ReplaceBook},
    AppState,
};

use super::{BookId, ValidatedJson};

/// Add a new book
pub async fn add_book(
    State(state): State<AppState>,
    ValidatedJson(data): ValidatedJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.catalog.add_book(&data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Get a book by ID
pub async fn get_book(
    State(state): State<AppState>,
    BookId(id): BookId,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// List all books
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Replace every editable field of a book
pub async fn replace_book(
    State(state): State<AppState>,
    BookId(id): BookId,
    ValidatedJson(data): ValidatedJson<ReplaceBook>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.replace_book(id, &data).await?;
    Ok(Json(book))
}

/// Update only the fields present in the body
pub async fn patch_book(
    State(state): State<AppState>,
    BookId(id): BookId,
    ValidatedJson(data): ValidatedJson<PatchBook>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.patch_book(id, &data).await?;
    Ok(Json(book))
}

/// Soft delete a book
pub async fn delete_book(
    State(state): State<AppState>,
    BookId(id): BookId,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.delete_book(id).await?;
    Ok(Json(MessageResponse::new("Book deleted successfully")))
}

/// Search books by title, author, genre, description and publication range
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.search_books(&query).await?;
    Ok(Json(books))
}

/// Count books
pub async fn count_books(State(state): State<AppState>) -> AppResult<Json<i64>> {
    let count = state.services.catalog.count_books().await?;
    Ok(Json(count))
}
