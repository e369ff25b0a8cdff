//! Books repository for database operations.
//!
//! Every read carries an explicit `deleted_at IS NULL` predicate: a deleted
//! book is invisible to get, list, search, count, update, patch and delete.

use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::search::{search_query, BOOK_COLUMNS};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, CreateBook, PatchBook, ReplaceBook},
};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a new book and return it with its assigned id
    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let now = Utc::now();

        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, author, published, edition, description, genre_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&data.title)
        .bind(&data.author)
        .bind(data.published)
        .bind(data.edition)
        .bind(&data.description)
        .bind(&data.genre_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    /// Get a live book by id
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1 AND deleted_at IS NULL",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// List all live books in id order
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE deleted_at IS NULL ORDER BY id",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Overwrite every editable field of a live book
    pub async fn replace(&self, id: i64, data: &ReplaceBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET title = $1, author = $2, published = $3, edition = $4,
                description = $5, genre_name = $6, updated_at = $7
            WHERE id = $8 AND deleted_at IS NULL
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&data.title)
        .bind(&data.author)
        .bind(data.published)
        .bind(data.edition)
        .bind(&data.description)
        .bind(&data.genre_name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// Update only the fields present in `data`
    pub async fn patch(&self, id: i64, data: &PatchBook) -> AppResult<Book> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE books SET updated_at = ");
        builder.push_bind(Utc::now());

        macro_rules! set_field {
            ($field:expr, $column:literal) => {
                if let Some(ref value) = $field {
                    builder.push(concat!(", ", $column, " = ")).push_bind(value.clone());
                }
            };
        }

        set_field!(data.title, "title");
        set_field!(data.author, "author");
        set_field!(data.published, "published");
        set_field!(data.edition, "edition");
        set_field!(data.description, "description");
        set_field!(data.genre_name, "genre_name");

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(BOOK_COLUMNS);

        builder
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Soft delete: mark `deleted_at`, keep the row
    pub async fn soft_delete(&self, id: i64) -> AppResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE books SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Search live books matching every filter
    pub async fn search(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let books = search_query(filter)
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Count live books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
