#![warn(missing_docs)]
// Note: this overwrites the link in the README to point to the rust docs of the catalog crates.
//! [catalog_core]: https://docs.rs/catalog_core/latest/catalog_core/index.html
//! [catalog_file]: https://docs.rs/catalog_file/latest/catalog_file/index.html
//! [catalog_axum]: https://docs.rs/catalog_axum/latest/catalog_axum/index.html
#![doc = include_str!("../README.md")]

/// Core domain models for the catalog.
///
/// These are plain data structures: the canonical `Product` record, the
/// `Category` node used by the hierarchy index, and the load diagnostics
/// reported by storage adapters.
pub mod models;

/// Interface traits for the catalog.
///
/// This module contains the "ports" in the hexagonal architecture pattern.
/// Storage adapters (such as the file-backed cache) implement them, and the
/// HTTP layer consumes them without knowing where the records come from.
pub mod ports;

/// The tolerant ingestion pipeline: normalization, validation and record
/// construction, plus the batch codecs built on top of them.
pub mod ingest;

/// Derived views over a category collection.
pub mod hierarchy;
