//! Shared test support for the workspace crates.

pub mod catalog;

pub use catalog::{MockCatalog, RecordedRequest};
