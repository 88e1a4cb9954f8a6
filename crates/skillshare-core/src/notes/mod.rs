//! Personal notes: owner-scoped create, read, search, update and delete.

pub mod service;

pub use service::{NoteRequest, NoteService};
