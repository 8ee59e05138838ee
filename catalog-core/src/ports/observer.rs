use std::sync::Arc;

/// Something derived from a cached collection that must follow it.
///
/// A cache calls [`SnapshotObserver::replaced`] every time it publishes a new
/// collection (first population, reload or store), while it still holds its
/// writer guard. Observers drop whatever they had computed from the previous
/// collection.
pub trait SnapshotObserver<T>: Send + Sync {
    /// The collection has been replaced by `records`.
    fn replaced(&self, records: &Arc<[T]>);
}
