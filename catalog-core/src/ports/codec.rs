use crate::ingest::IngestError;

/// The outcome of decoding a batch.
///
/// Items that could not be turned into records are skipped and counted, so a
/// single bad entry never costs the rest of the batch.
#[derive(Debug)]
pub struct Decoded<T> {
    /// The records that were accepted, in input order
    pub records: Vec<T>,
    /// The number of items that were skipped
    pub rejected: usize,
}

/// The (de)serialization hooks of a file-backed collection.
pub trait RecordCodec<T>: Send + Sync {
    /// Produce the JSON document that is written to disk for `records`
    fn encode(&self, records: &[T]) -> Result<serde_json::Value, serde_json::Error>;

    /// Rebuild a collection from the JSON document read from disk.
    ///
    /// Only errors that make the whole document unusable are returned; items
    /// that fail individually are counted in [`Decoded::rejected`].
    fn decode(&self, document: serde_json::Value) -> Result<Decoded<T>, IngestError>;
}
