//! Integration tests.
//!
//! Tests marked `#[ignore]` need a scratch Postgres database:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

mod common;

mod books;
