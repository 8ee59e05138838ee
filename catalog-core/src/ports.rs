mod category;
mod codec;
mod observer;
mod product;

pub use category::CategoryRepository;
pub use codec::{Decoded, RecordCodec};
pub use observer::SnapshotObserver;
pub use product::ProductRepository;

use std::sync::Arc;

/// Base trait for catalog storage.
///
/// The ports are synchronous: population and reload block on file I/O, and
/// callers living on an async runtime are expected to hop onto a blocking
/// thread before calling in.
pub trait Repository: Send + Sync + 'static {
    /// The error type for failures in the underlying storage
    type Error: std::error::Error + Send + Sync + 'static;
}

/// The application wires a repository into the outer layers.
///
/// The repository is constructed explicitly at startup and handed out as a
/// shared pointer, so there is no hidden first-caller initialization.
pub trait Application: Send + Sync {
    /// The storage backing the catalog
    type Repository: ProductRepository + CategoryRepository;

    /// Get a handle to the repository
    fn repository(&self) -> Arc<Self::Repository>;
}
