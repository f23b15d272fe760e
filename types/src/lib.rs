//! Core domain types for Lintra.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Everything here can be used from any layer of the
//! application: the diagnostic record and its display formatting, the
//! document chunker, and the backend/strategy tags chosen at construction.

mod chunk;
mod diagnostic;
mod model;

pub use chunk::{Chunk, DEFAULT_CHUNK_SIZE, chunk_lines};
pub use diagnostic::{Diagnostic, Severity, markdown_markup, pretty_text};
pub use model::{ModelParams, ProviderKind, SweepStrategy, TagParseError};
