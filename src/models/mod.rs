//! Data models for the library catalog

pub mod book;

pub use book::{Book, BookFilter, BookQuery, CreateBook, PatchBook, ReplaceBook};
