mod codec;
mod factory;
mod normalize;
mod validate;

pub use codec::{CategoryCodec, IngestMode, ProductCodec};
pub use factory::{ProductFactory, lenient_u32};
pub use normalize::{
    BOOL_KEY_MARKERS, BOOL_KEY_PREFIXES, CoercionRules, Normalizer, PRICE_KEYS, unwrap_envelope,
};
pub use validate::{ValidationContext, ValidationError, Violation, is_valid, validate};

use thiserror::Error;

/// Errors raised while turning a JSON document into records.
///
/// `MalformedEnvelope` and `UnsupportedSchema` concern the document as a
/// whole and abort a load. `InvalidRecord` concerns a single item; batch
/// loads count and skip it.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The document is a JSON string that does not itself contain JSON
    #[error("top-level JSON is a string but cannot be parsed: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// No product array could be located in the document
    #[error("unsupported JSON schema: expected {{data:[...]}}, {{data:\"[...]\"}} or [...]")]
    UnsupportedSchema,

    /// A single item could not be turned into a record
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] RecordError),
}

/// The ways in which a single item can fail to become a record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The item failed structural validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A field passed validation but cannot be stored in its final type
    #[error("field '{key}' cannot be stored as {expected}")]
    Coercion {
        /// The offending field
        key: &'static str,
        /// A description of the storage type
        expected: &'static str,
    },

    /// The item is a JSON string that does not itself contain JSON
    #[error("item is a string but cannot be parsed: {0}")]
    Undecodable(#[source] serde_json::Error),
}
