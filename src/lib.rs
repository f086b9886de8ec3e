//! Title and author autocomplete over the Project Gutenberg catalog.
//!
//! The catalog is loaded once into memory (`catalog`), queried by the
//! suggestion engine (`suggest`), and selections are turned into
//! gutenberg.org URLs (`redirect`). `server` exposes all of it over
//! HTTP and `cli` is the binary's entry point.

pub mod catalog;
pub mod cli;
pub mod models;
pub mod redirect;
pub mod server;
pub mod suggest;
