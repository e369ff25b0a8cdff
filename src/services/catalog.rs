//! Catalog management service

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, BookQuery, CreateBook, PatchBook, ReplaceBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn add_book(&self, data: &CreateBook) -> AppResult<Book> {
        let book = self.repository.books.create(data).await?;
        tracing::info!(book_id = book.id, "Book created");
        Ok(book)
    }

    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Replace title, author, published, edition, description and genre.
    /// A body id, when given, must agree with the path id.
    pub async fn replace_book(&self, id: i64, data: &ReplaceBook) -> AppResult<Book> {
        if let Some(body_id) = data.id {
            if body_id != id {
                return Err(AppError::BadRequest(format!(
                    "Book id in body ({}) does not match id in path ({})",
                    body_id, id
                )));
            }
        }

        let book = self.repository.books.replace(id, data).await?;
        tracing::info!(book_id = id, "Book replaced");
        Ok(book)
    }

    pub async fn patch_book(&self, id: i64, data: &PatchBook) -> AppResult<Book> {
        if data.is_empty() {
            tracing::debug!(book_id = id, "Empty patch, only touching updated_at");
        }

        let book = self.repository.books.patch(id, data).await?;
        tracing::info!(book_id = id, "Book patched");
        Ok(book)
    }

    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        self.repository.books.soft_delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let filter = parse_filter(query)?;
        self.repository.books.search(&filter).await
    }

    pub async fn count_books(&self) -> AppResult<i64> {
        self.repository.books.count().await
    }
}

/// Turn raw query parameters into a filter; empty values are dropped
pub fn parse_filter(query: &BookQuery) -> AppResult<BookFilter> {
    fn text(value: &Option<String>) -> Option<String> {
        value.as_ref().filter(|v| !v.is_empty()).cloned()
    }

    fn date(name: &str, value: &Option<String>) -> AppResult<Option<NaiveDate>> {
        match value.as_deref().filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| {
                    AppError::BadRequest(format!("Invalid `{}` date `{}`, expected YYYY-MM-DD", name, v))
                }),
        }
    }

    Ok(BookFilter {
        title: text(&query.title),
        author: text(&query.author),
        genre: text(&query.genre),
        description: text(&query.description),
        from: date("from", &query.from)?,
        to: date("to", &query.to)?,
    })
}
