use super::{
    IngestError, Normalizer, ProductFactory, RecordError, ValidationContext, unwrap_envelope,
};
use crate::{
    models::{Category, Product},
    ports::{Decoded, RecordCodec},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Level, event};

/// Which factory entrypoint a product file is decoded through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Treat file contents like user submissions: `Create` validation and
    /// normalized sizes/colors. This suits files dropped in by upstream
    /// producers, which do not assign identifiers.
    #[default]
    Create,
    /// Treat file contents as records the catalog wrote itself: every item
    /// needs an identifier and arrays are taken verbatim.
    Internal,
}

/// Reads and writes product files.
///
/// Items pass through the [`Normalizer`] and then the [`ProductFactory`]
/// entrypoint picked by the [`IngestMode`]. Bad items are skipped and counted.
#[derive(Clone, Debug, Default)]
pub struct ProductCodec {
    normalizer: Normalizer,
    mode: IngestMode,
}

impl ProductCodec {
    /// A codec with the default coercion rules
    pub fn new(mode: IngestMode) -> Self {
        Self {
            normalizer: Normalizer::default(),
            mode,
        }
    }

    /// A codec with a custom normalizer
    pub fn with_normalizer(normalizer: Normalizer, mode: IngestMode) -> Self {
        Self { normalizer, mode }
    }

    /// The entrypoint items are built through
    pub fn mode(&self) -> IngestMode {
        self.mode
    }

    fn build(&self, item: Value) -> Result<Product, RecordError> {
        let item = self.normalizer.normalize_item(item)?;
        match self.mode {
            IngestMode::Create => ProductFactory::build(&item, ValidationContext::Create),
            // not `create_internal`: the batch wants the reason, and logs it once
            IngestMode::Internal => ProductFactory::build(&item, ValidationContext::InternalLoad),
        }
    }
}

impl RecordCodec<Product> for ProductCodec {
    fn encode(&self, records: &[Product]) -> Result<Value, serde_json::Error> {
        Ok(json!({ "data": serde_json::to_value(records)? }))
    }

    fn decode(&self, document: Value) -> Result<Decoded<Product>, IngestError> {
        let items = unwrap_envelope(document)?;
        let total = items.len();

        let mut records = Vec::with_capacity(total);
        let mut rejected = 0;
        for (index, item) in items.into_iter().enumerate() {
            match self.build(item) {
                Ok(product) => records.push(product),
                Err(err) => {
                    rejected += 1;
                    event!(
                        Level::WARN,
                        index,
                        err = err.to_string(),
                        "ignoring invalid product"
                    );
                }
            }
        }

        event!(
            Level::INFO,
            ok = records.len(),
            bad = rejected,
            total,
            "decoded products"
        );
        Ok(Decoded { records, rejected })
    }
}

/// Reads and writes category files.
///
/// Categories are plain serde records. Items with a zero identifier are
/// skipped, and a zero parent is read as no parent.
#[derive(Clone, Copy, Debug, Default)]
pub struct CategoryCodec;

impl CategoryCodec {
    fn build(item: Value) -> Result<Category, RecordError> {
        let item = match item {
            Value::String(text) => serde_json::from_str(&text).map_err(RecordError::Undecodable)?,
            other => other,
        };
        let mut category: Category =
            serde_json::from_value(item).map_err(RecordError::Undecodable)?;
        if category.id == 0 {
            return Err(RecordError::Coercion {
                key: "id",
                expected: "a non-zero identifier",
            });
        }
        category.parent_id = category.parent_id.filter(|parent| *parent != 0);
        Ok(category)
    }
}

impl RecordCodec<Category> for CategoryCodec {
    fn encode(&self, records: &[Category]) -> Result<Value, serde_json::Error> {
        serde_json::to_value(records)
    }

    fn decode(&self, document: Value) -> Result<Decoded<Category>, IngestError> {
        let items = unwrap_envelope(document)?;

        let mut records = Vec::with_capacity(items.len());
        let mut rejected = 0;
        for (index, item) in items.into_iter().enumerate() {
            match Self::build(item) {
                Ok(category) => records.push(category),
                Err(err) => {
                    rejected += 1;
                    event!(
                        Level::WARN,
                        index,
                        err = err.to_string(),
                        "ignoring invalid category"
                    );
                }
            }
        }

        event!(
            Level::INFO,
            ok = records.len(),
            bad = rejected,
            "decoded categories"
        );
        Ok(Decoded { records, rejected })
    }
}
