//! Search query construction for books.
//!
//! Every filter becomes one `AND` predicate with a bound parameter; filters
//! that are absent or empty add nothing. Soft-deleted rows are always excluded.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Postgres, QueryBuilder};

use crate::models::BookFilter;

/// Columns selected for a `Book` row
pub const BOOK_COLUMNS: &str =
    "id, title, author, published, edition, description, genre_name, created_at, updated_at, deleted_at";

/// Build the search query for `filter`, ordered by id.
pub fn search_query(filter: &BookFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM books WHERE deleted_at IS NULL",
        BOOK_COLUMNS
    ));

    push_contains(&mut builder, "author", filter.author.as_deref());
    push_contains(&mut builder, "genre_name", filter.genre.as_deref());
    push_contains(&mut builder, "title", filter.title.as_deref());
    push_contains(&mut builder, "description", filter.description.as_deref());

    if let Some(from) = filter.from {
        builder.push(" AND published >= ").push_bind(start_of_day(from));
    }

    // `to` covers the whole day, so compare against the start of the next one
    if let Some(next_day) = filter.to.and_then(|to| to.succ_opt()) {
        builder.push(" AND published < ").push_bind(start_of_day(next_day));
    }

    builder.push(" ORDER BY id");
    builder
}

fn push_contains(builder: &mut QueryBuilder<'static, Postgres>, column: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        builder
            .push(format!(" AND {} ILIKE ", column))
            .push_bind(contains_pattern(value));
    }
}

/// `%value%` with LIKE wildcards in `value` escaped so they match literally
pub fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
