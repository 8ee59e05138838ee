use super::{
    IngestError, RecordError,
    validate::{ValidationContext, check},
};
use crate::models::{CustomField, Product};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use serde_json::{Map, Value};
use tracing::{Level, event};

/// Builds [`Product`] records from normalized JSON.
///
/// There are two entrypoints and they deliberately disagree on how failures
/// are surfaced:
///
/// - [`ProductFactory::create`] is for user-submitted data and returns the
///   first problem to the caller.
/// - [`ProductFactory::create_internal`] is for records the catalog wrote
///   itself; a bad historical record is logged and comes back as `None` so
///   the surrounding load can carry on.
pub struct ProductFactory;

impl ProductFactory {
    /// Build a product from user-submitted JSON, failing fast.
    ///
    /// The JSON is validated in the `Create` context. Comma-joined entries in
    /// `sizes` and `colors` are split, trimmed, sorted and deduplicated, and
    /// the first token of each list is dropped.
    pub fn create(item: &Value) -> Result<Product, IngestError> {
        Self::build(item, ValidationContext::Create).map_err(|err| {
            event!(
                Level::ERROR,
                err = err.to_string(),
                json = item.to_string(),
                "failed to create product"
            );
            IngestError::InvalidRecord(err)
        })
    }

    /// Build a product from JSON read back from storage.
    ///
    /// The JSON is validated in the `InternalLoad` context and string arrays
    /// are taken as they are. Failures are logged and swallowed.
    pub fn create_internal(item: &Value) -> Option<Product> {
        match Self::build(item, ValidationContext::InternalLoad) {
            Ok(product) => Some(product),
            Err(err) => {
                event!(
                    Level::ERROR,
                    err = err.to_string(),
                    json = item.to_string(),
                    "skipping stored product"
                );
                None
            }
        }
    }

    pub(crate) fn build(item: &Value, context: ValidationContext) -> Result<Product, RecordError> {
        let fields = check(item, context)?;
        let from_user = context == ValidationContext::Create;

        let (sizes, colors) = if from_user {
            (
                submitted_tokens(fields, "sizes")?,
                submitted_tokens(fields, "colors")?,
            )
        } else {
            (strings(fields, "sizes")?, strings(fields, "colors")?)
        };

        Ok(Product {
            id: lenient_u32(fields.get("id"), 0),
            title: text(fields, "title")?,
            image_url: text(fields, "image_url")?,
            city_name: text(fields, "city_name")?,
            country_image_url: text(fields, "country_image_url")?,
            currency: text(fields, "currency")?,
            formatted_price: text(fields, "formatted_price")?,
            converted_price: text(fields, "converted_price")?,
            converted_price_value: number(fields, "converted_price_value")?,
            price_with_shipping_value: number(fields, "price_with_shipping_value")?,
            original_price: original_price(fields)?,
            average_rating: average_rating(fields)?,
            brand_id: Some(lenient_u32(fields.get("brand_id"), 0)).filter(|id| *id != 0),
            condition_name: text(fields, "condition_name")?,
            brand_name: text(fields, "brand_name")?,
            package_format_name: text(fields, "package_format_name")?,
            category_id: lenient_u32(fields.get("category_id"), 0),
            views: lenient_u32(fields.get("views"), 0),
            review_count: lenient_u32(fields.get("review_count"), 0),
            boost: flag(fields, "boost")?,
            sizes,
            colors,
            similar_products: identifiers(fields, "similar_products")?,
            images: strings(fields, "images")?,
            custom_fields: custom_fields(fields),
        })
    }
}

/// Read an unsigned identifier or counter, tolerating whatever upstream sends.
///
/// Integers, floats (truncated) and strings made only of digits are
/// accepted. Negative values become 0 and values past `u32::MAX` saturate.
/// Anything else, including a missing value, yields `default`.
pub fn lenient_u32(value: Option<&Value>, default: u32) -> u32 {
    match value {
        Some(Value::Number(number)) => {
            if let Some(unsigned) = number.as_u64() {
                u32::try_from(unsigned).unwrap_or(u32::MAX)
            } else if number.is_i64() {
                // as_u64 already took every non-negative integer
                0
            } else {
                // `as` truncates toward zero and saturates at both ends
                number.as_f64().map_or(default, |float| float as u32)
            }
        }
        Some(Value::String(digits))
            if !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit()) =>
        {
            // all digits, so the only way to fail is overflow
            digits
                .parse::<u64>()
                .ok()
                .and_then(|parsed| u32::try_from(parsed).ok())
                .unwrap_or(u32::MAX)
        }
        _ => default,
    }
}

fn text(fields: &Map<String, Value>, key: &'static str) -> Result<String, RecordError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(RecordError::Coercion {
            key,
            expected: "a string",
        }),
    }
}

fn number(fields: &Map<String, Value>, key: &'static str) -> Result<f64, RecordError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(number)) => Ok(number.as_f64().unwrap_or_default()),
        Some(_) => Err(RecordError::Coercion {
            key,
            expected: "a number",
        }),
    }
}

fn flag(fields: &Map<String, Value>, key: &'static str) -> Result<bool, RecordError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(Value::Number(number)) if number.is_u64() || number.is_i64() => {
            Ok(number.as_u64() != Some(0))
        }
        Some(_) => Err(RecordError::Coercion {
            key,
            expected: "a boolean",
        }),
    }
}

fn strings(fields: &Map<String, Value>, key: &'static str) -> Result<Vec<String>, RecordError> {
    let invalid = RecordError::Coercion {
        key,
        expected: "an array of strings",
    };
    match fields.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(elements)) => elements
            .iter()
            .map(|element| element.as_str().map(str::to_owned))
            .collect::<Option<Vec<_>>>()
            .ok_or(invalid),
        Some(_) => Err(invalid),
    }
}

/// Sizes and colors as submitted through the create path.
///
/// Entries may be comma-joined lists; everything is split, trimmed, sorted
/// and deduplicated. The smallest token is then discarded, whatever shape
/// the submission had: storefront forms send a header entry first.
fn submitted_tokens(
    fields: &Map<String, Value>,
    key: &'static str,
) -> Result<Vec<String>, RecordError> {
    let mut tokens: Vec<String> = strings(fields, key)?
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect();
    tokens.sort();
    tokens.dedup();

    // TODO: confirm with the storefront whether the header entry is still sent;
    // if not, this legacy drop can go.
    if !tokens.is_empty() {
        tokens.remove(0);
    }
    Ok(tokens)
}

fn identifiers(fields: &Map<String, Value>, key: &'static str) -> Result<Vec<u32>, RecordError> {
    let invalid = RecordError::Coercion {
        key,
        expected: "an array of unsigned 32-bit integers",
    };
    match fields.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(elements)) => {
            let ids = elements
                .iter()
                .map(|element| element.as_u64().and_then(|id| u32::try_from(id).ok()))
                .collect::<Option<IndexSet<u32, FxBuildHasher>>>()
                .ok_or(invalid)?;
            Ok(ids.into_iter().collect())
        }
        Some(_) => Err(invalid),
    }
}

fn original_price(fields: &Map<String, Value>) -> Result<Option<String>, RecordError> {
    match fields.get("original_price") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(price)) => Ok(Some(price.clone()).filter(|price| !price.is_empty())),
        // the normalizer turns numeric strings into numbers
        Some(Value::Number(price)) => Ok(Some(price.to_string())),
        Some(_) => Err(RecordError::Coercion {
            key: "original_price",
            expected: "a string",
        }),
    }
}

fn average_rating(fields: &Map<String, Value>) -> Result<Option<f64>, RecordError> {
    match fields.get("average_rating") {
        None | Some(Value::Null) => Ok(None),
        // a zero rating is what the normalizer substitutes for null
        Some(Value::Number(rating)) => Ok(rating.as_f64().filter(|rating| *rating != 0.0)),
        Some(_) => Err(RecordError::Coercion {
            key: "average_rating",
            expected: "a number",
        }),
    }
}

fn custom_fields(fields: &Map<String, Value>) -> Vec<CustomField> {
    let Some(Value::Array(entries)) = fields.get("custom_fields") else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Array(pair) => match pair.as_slice() {
                [Value::String(name), Value::String(value)] => Some(CustomField::new(name, value)),
                _ => None,
            },
            Value::Object(field) => match (field.get("name"), field.get("value")) {
                (Some(Value::String(name)), Some(Value::String(value))) => {
                    Some(CustomField::new(name, value))
                }
                _ => None,
            },
            _ => None,
        })
        .collect()
}
