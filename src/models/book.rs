//! Book model and request payloads

use std::borrow::Cow;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Book record as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Publication date, always UTC
    pub published: Option<DateTime<Utc>>,
    pub edition: Option<i32>,
    pub description: Option<String>,
    pub genre_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. Rows with a value here are never returned by the API.
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create book request
///
/// `title` and `author` default to empty so that a missing field is reported
/// by validation alongside the other field errors.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBook {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "is required and must be at most 255 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "is required and must be at most 255 characters"))]
    pub author: String,
    #[serde(default, deserialize_with = "published_date::deserialize")]
    #[validate(custom(function = "not_in_future"))]
    pub published: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub edition: Option<i32>,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub genre_name: Option<String>,
}

/// Full update request: replaces every editable field.
///
/// `id` is optional; when present it must match the id in the path.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplaceBook {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "is required and must be at most 255 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "is required and must be at most 255 characters"))]
    pub author: String,
    #[serde(default, deserialize_with = "published_date::deserialize")]
    #[validate(custom(function = "not_in_future"))]
    pub published: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub edition: Option<i32>,
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub genre_name: Option<String>,
}

/// Partial update request.
///
/// An absent field is left untouched. For the nullable columns an explicit
/// `null` clears the stored value (`Some(None)`); `title` and `author` cannot
/// be null. Unknown field names are rejected at deserialization.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PatchBook {
    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 1, max = 255, message = "must be non-empty and at most 255 characters"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 1, max = 255, message = "must be non-empty and at most 255 characters"))]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "published_date::deserialize_patch")]
    #[validate(custom(function = "not_in_future"))]
    pub published: Option<Option<DateTime<Utc>>>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub edition: Option<i32>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub genre_name: Option<Option<String>>,
}

impl PatchBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.published.is_none()
            && self.edition.is_none()
            && self.description.is_none()
            && self.genre_name.is_none()
    }
}

/// A present field must carry a value; `null` is a deserialization error
fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn not_in_future(published: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *published > Utc::now() {
        let mut error = ValidationError::new("future_date");
        error.message = Some(Cow::Borrowed("must not be in the future"));
        return Err(error);
    }
    Ok(())
}

/// Search filters from the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    /// Inclusive lower bound on `published`, `YYYY-MM-DD`
    pub from: Option<String>,
    /// Inclusive upper bound on `published`, `YYYY-MM-DD`
    pub to: Option<String>,
}

/// Search filters after date parsing, consumed by the query builder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Published date parsing.
///
/// Accepts RFC 3339 timestamps with any offset, or a bare `YYYY-MM-DD` date
/// taken as midnight UTC. Everything is normalized to UTC and must fall in
/// years 1 to 9999.
pub mod published_date {
    use super::*;
    use serde::de::Error;

    const MIN_YEAR: i32 = 1;
    const MAX_YEAR: i32 = 9999;

    pub fn parse(value: &str) -> Result<DateTime<Utc>, String> {
        let parsed = match DateTime::parse_from_rfc3339(value) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(_) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
                .ok_or_else(|| {
                    format!(
                        "invalid date `{}`, expected RFC 3339 timestamp or YYYY-MM-DD",
                        value
                    )
                })?,
        };

        if !(MIN_YEAR..=MAX_YEAR).contains(&parsed.year()) {
            return Err(format!(
                "date `{}` is out of range, year must be between {} and {}",
                value, MIN_YEAR, MAX_YEAR
            ));
        }

        Ok(parsed)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.is_empty() => parse(&s).map(Some).map_err(D::Error::custom),
            _ => Ok(None),
        }
    }

    /// Wraps [`deserialize`] so that a present `null` becomes `Some(None)`
    pub fn deserialize_patch<'de, D>(
        deserializer: D,
    ) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize(deserializer).map(Some)
    }
}
