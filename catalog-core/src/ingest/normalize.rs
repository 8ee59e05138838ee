use super::{IngestError, RecordError};
use serde_json::{Map, Number, Value};
use tracing::{Level, event};

/// Key prefixes that mark an integer field as a boolean flag.
pub const BOOL_KEY_PREFIXES: &[&str] = &["is_", "has_", "can_"];

/// Key fragments that mark an integer field as a boolean flag.
pub const BOOL_KEY_MARKERS: &[&str] = &["enable", "enabled", "active", "visible", "featured", "boost"];

/// Keys whose string values are parsed into numbers.
pub const PRICE_KEYS: &[&str] = &["price", "price_with_shipping", "shipping_cost_usd", "original_price"];

const CONVERTED_PRICE: &str = "converted_price";
const ORIGINAL_PRICE: &str = "original_price";
const AVERAGE_RATING: &str = "average_rating";

/// The key heuristics driving the coercions.
///
/// The defaults are the `BOOL_KEY_*` and `PRICE_KEYS` constants; upstream
/// producers that invent new flag names can be accommodated by extending the
/// lists rather than the traversal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoercionRules {
    /// A lower-cased key starting with any of these is a flag
    pub bool_prefixes: Vec<String>,
    /// A lower-cased key containing any of these is a flag
    pub bool_markers: Vec<String>,
    /// Exact keys holding prices
    pub price_keys: Vec<String>,
}

impl Default for CoercionRules {
    fn default() -> Self {
        let owned = |keys: &[&str]| -> Vec<String> { keys.iter().map(|key| key.to_string()).collect() };
        Self {
            bool_prefixes: owned(BOOL_KEY_PREFIXES),
            bool_markers: owned(BOOL_KEY_MARKERS),
            price_keys: owned(PRICE_KEYS),
        }
    }
}

impl CoercionRules {
    /// Whether an integer under `key` should be read as a boolean
    pub fn is_bool_key(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.bool_prefixes
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
            || self
                .bool_markers
                .iter()
                .any(|marker| key.contains(marker.as_str()))
    }

    /// Whether a string under `key` should be read as a number
    pub fn is_price_key(&self, key: &str) -> bool {
        self.price_keys.iter().any(|price| price == key)
    }
}

/// Locate the array of items inside a document.
///
/// The document may itself be a JSON-encoded string. Three shapes are then
/// recognized, in order: a bare array, `{"data": [...]}`, and
/// `{"data": "<JSON-encoded array>"}`.
pub fn unwrap_envelope(document: Value) -> Result<Vec<Value>, IngestError> {
    let document = match document {
        Value::String(text) => serde_json::from_str(&text).map_err(IngestError::MalformedEnvelope)?,
        other => other,
    };

    match document {
        Value::Array(items) => Ok(items),
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::String(text)) => match serde_json::from_str(&text) {
                Ok(Value::Array(items)) => Ok(items),
                Ok(_) => Err(IngestError::UnsupportedSchema),
                Err(err) => {
                    event!(Level::DEBUG, err = err.to_string(), "data is not encoded JSON");
                    Err(IngestError::UnsupportedSchema)
                }
            },
            _ => Err(IngestError::UnsupportedSchema),
        },
        _ => Err(IngestError::UnsupportedSchema),
    }
}

/// Rewrites loosely-typed product JSON into canonical types.
///
/// Normalization never rejects anything on its own account: coercions that
/// do not apply leave the value as it was, and it is left to validation to
/// decide whether the result is acceptable. Running the normalizer over its
/// own output changes nothing.
#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    rules: CoercionRules,
}

impl Normalizer {
    /// Create a normalizer with custom key heuristics
    pub fn new(rules: CoercionRules) -> Self {
        Self { rules }
    }

    /// Normalize one item of a batch.
    ///
    /// An item that is a JSON-encoded string is decoded first; this is the
    /// only way normalization can fail.
    pub fn normalize_item(&self, item: Value) -> Result<Value, RecordError> {
        let mut item = match item {
            Value::String(text) => serde_json::from_str(&text).map_err(RecordError::Undecodable)?,
            other => other,
        };
        self.coerce(&mut item);
        Ok(item)
    }

    /// Apply the field coercions to an object, recursing into nested objects
    /// and into arrays of objects. Anything other than an object is left as is.
    pub fn coerce(&self, value: &mut Value) {
        if let Value::Object(fields) = value {
            self.coerce_fields(fields);
        }
    }

    fn coerce_fields(&self, fields: &mut Map<String, Value>) {
        for (key, value) in fields.iter_mut() {
            match value {
                Value::Object(nested) => {
                    self.coerce_fields(nested);
                    continue;
                }
                Value::Array(elements) => {
                    for element in elements.iter_mut() {
                        self.coerce(element);
                    }
                    continue;
                }
                _ => {}
            }

            if let Some(flag) = integer_flag(value) {
                if self.rules.is_bool_key(key) {
                    *value = Value::Bool(flag);
                    continue;
                }
            }

            // The canonical type of the converted price is text.
            if key == CONVERTED_PRICE {
                let text = match value {
                    Value::Null => Some(String::new()),
                    Value::Number(number) => Some(number.to_string()),
                    _ => None,
                };
                if let Some(text) = text {
                    *value = Value::String(text);
                }
                continue;
            }

            if value.is_string() && self.rules.is_price_key(key) {
                if let Some(number) = value.as_str().and_then(parse_price) {
                    *value = Value::Number(number);
                }
                continue;
            }

            if value.is_null() {
                if key == ORIGINAL_PRICE {
                    *value = Value::String(String::new());
                } else if key == AVERAGE_RATING {
                    *value = Value::from(0);
                }
            }
        }
    }
}

/// The truthiness of an integral number, or None for anything else
fn integer_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(|unsigned| unsigned != 0)
            .or_else(|| number.as_i64().map(|signed| signed != 0)),
        _ => None,
    }
}

fn parse_price(text: &str) -> Option<Number> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .and_then(Number::from_f64)
}
