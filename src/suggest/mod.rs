//! Autocomplete suggestions over the in-memory catalog.
//!
//! `engine::suggest` is the single entry point; `trigram` holds the
//! index used by the ranked trigram mode.

pub mod engine;
pub mod trigram;

pub use engine::suggest;
