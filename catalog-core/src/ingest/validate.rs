use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::{Level, event};

/// The situation a product is being validated in.
///
/// The required fields depend on where the JSON came from: a user creating a
/// product does not know its identifier yet, while anything already stored
/// must carry one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidationContext {
    /// A new product submitted by a user
    Create,
    /// An edit to an existing product
    Update,
    /// A product read back from the catalog's own storage
    InternalLoad,
    /// A diagnostic check, see [`is_valid`]
    Report,
}

impl fmt::Display for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::InternalLoad => "internal-load",
            Self::Report => "report",
        })
    }
}

/// A product failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid product ({context}): {violation}")]
pub struct ValidationError {
    /// The context the rules were applied in
    pub context: ValidationContext,
    /// The first rule that was broken
    pub violation: Violation,
}

/// The individual validation rules.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Violation {
    /// The item is not a JSON object
    #[error("item is not an object")]
    NotAnObject,
    /// A required string is missing, empty or not a string
    #[error("key '{0}' missing or empty (string)")]
    MissingString(&'static str),
    /// A required number is missing or not a number
    #[error("key '{0}' missing or invalid (number)")]
    MissingNumber(&'static str),
    /// A number that must be integral is not
    #[error("key '{0}' must be an integer")]
    NotInteger(&'static str),
    /// A number is below its minimum
    #[error("key '{key}' must be >= {min}")]
    BelowMinimum {
        /// The offending field
        key: &'static str,
        /// The inclusive minimum
        min: i64,
    },
    /// An optional field is present with the wrong type
    #[error("key '{key}' present but not {expected}")]
    WrongType {
        /// The offending field
        key: &'static str,
        /// A description of the accepted types
        expected: &'static str,
    },
}

const STRING_FIELDS: &[&str] = &[
    "title",
    "currency",
    "image_url",
    "city_name",
    "country_image_url",
    "formatted_price",
    "converted_price",
    "condition_name",
    "brand_name",
    "package_format_name",
];

const NUMBER_FIELDS: &[&str] = &[
    "views",
    "review_count",
    "converted_price_value",
    "price_with_shipping_value",
];

const ARRAY_FIELDS: &[&str] = &[
    "sizes",
    "colors",
    "images",
    "custom_fields",
    "similar_products",
];

/// Check the structure of a product against the rules of `context`.
///
/// The checks cover presence and types only; prices, ranges beyond the
/// identifier minimums and uniqueness are not looked at.
pub fn validate(item: &Value, context: ValidationContext) -> Result<(), ValidationError> {
    check(item, context).map(|_| ())
}

/// Run the rules outside any particular context, logging why an item is
/// rejected instead of returning the reason.
pub fn is_valid(item: &Value) -> bool {
    match validate(item, ValidationContext::Report) {
        Ok(()) => true,
        Err(err) => {
            event!(Level::WARN, reason = err.to_string(), "product rejected");
            false
        }
    }
}

/// Validate and hand back the fields of the object.
pub(crate) fn check(
    item: &Value,
    context: ValidationContext,
) -> Result<&Map<String, Value>, ValidationError> {
    let fail = |violation| ValidationError { context, violation };
    let fields = item.as_object().ok_or(fail(Violation::NotAnObject))?;

    if matches!(
        context,
        ValidationContext::Update | ValidationContext::InternalLoad
    ) {
        require_integer(fields, "id", 1).map_err(fail)?;
    }

    if context == ValidationContext::Create {
        require_string(fields, "title").map_err(fail)?;
        require_string(fields, "currency").map_err(fail)?;
        require_integer(fields, "category_id", 1).map_err(fail)?;
    }

    for &key in STRING_FIELDS {
        expect(fields, key, "a string", Value::is_string).map_err(fail)?;
    }
    for &key in NUMBER_FIELDS {
        expect(fields, key, "a number", Value::is_number).map_err(fail)?;
    }
    for &key in ARRAY_FIELDS {
        expect(fields, key, "an array", Value::is_array).map_err(fail)?;
    }
    expect(fields, "average_rating", "a number or null", |value| {
        value.is_number() || value.is_null()
    })
    .map_err(fail)?;
    expect(fields, "boost", "a boolean, 0 or 1", |value| {
        value.is_boolean() || value.as_u64().is_some_and(|flag| flag <= 1)
    })
    .map_err(fail)?;

    Ok(fields)
}

fn require_string(fields: &Map<String, Value>, key: &'static str) -> Result<(), Violation> {
    match fields.get(key).and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(()),
        _ => Err(Violation::MissingString(key)),
    }
}

fn require_integer(
    fields: &Map<String, Value>,
    key: &'static str,
    min: i64,
) -> Result<(), Violation> {
    let number = match fields.get(key) {
        Some(Value::Number(number)) => number,
        _ => return Err(Violation::MissingNumber(key)),
    };
    if !(number.is_i64() || number.is_u64()) {
        return Err(Violation::NotInteger(key));
    }
    // u64 values above i64::MAX are trivially above any minimum
    if number.as_i64().is_some_and(|value| value < min) {
        return Err(Violation::BelowMinimum { key, min });
    }
    Ok(())
}

fn expect(
    fields: &Map<String, Value>,
    key: &'static str,
    expected: &'static str,
    accepts: impl Fn(&Value) -> bool,
) -> Result<(), Violation> {
    match fields.get(key) {
        Some(value) if !accepts(value) => Err(Violation::WrongType { key, expected }),
        _ => Ok(()),
    }
}
