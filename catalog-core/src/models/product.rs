use serde::Serialize;

/// A free-form (name, value) pair attached to a product by the seller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct CustomField {
    /// The label of the field
    pub name: String,
    /// The value of the field
    pub value: String,
}

impl CustomField {
    /// Pair a name with a value
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The canonical product record.
///
/// Records are only ever produced by the ingestion pipeline
/// (see [`crate::ingest::ProductFactory`]) and are shared read-only once they
/// enter a cache. Counters are unsigned, and every optional field is either
/// absent or carries a meaningful value: an empty original price, a zero
/// rating or a zero brand id are all represented as `None`.
///
/// The `Serialize` implementation is the canonical projection: empty strings,
/// zero numerics, empty sequences and absent optionals are omitted, except
/// for `boost`, which is always emitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Product {
    /// The identifier of the product; 0 means not yet assigned
    #[serde(skip_serializing_if = "is_default")]
    pub id: u32,
    /// The display title
    #[serde(skip_serializing_if = "is_default")]
    pub title: String,
    /// The primary image
    #[serde(skip_serializing_if = "is_default")]
    pub image_url: String,
    /// The city the product ships from
    #[serde(skip_serializing_if = "is_default")]
    pub city_name: String,
    /// A flag image for the country the product ships from
    #[serde(skip_serializing_if = "is_default")]
    pub country_image_url: String,
    /// The currency code of the price fields
    #[serde(skip_serializing_if = "is_default")]
    pub currency: String,
    /// The human-formatted price
    #[serde(skip_serializing_if = "is_default")]
    pub formatted_price: String,
    /// The converted price, as text
    #[serde(skip_serializing_if = "is_default")]
    pub converted_price: String,
    /// The converted price, as a number
    #[serde(skip_serializing_if = "is_default")]
    pub converted_price_value: f64,
    /// The price including shipping
    #[serde(skip_serializing_if = "is_default")]
    pub price_with_shipping_value: f64,
    /// The price before any discount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<String>,
    /// The average review score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    /// The brand, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<u32>,
    /// The condition (new, used, ...)
    #[serde(skip_serializing_if = "is_default")]
    pub condition_name: String,
    /// The brand name
    #[serde(skip_serializing_if = "is_default")]
    pub brand_name: String,
    /// The packaging format
    #[serde(skip_serializing_if = "is_default")]
    pub package_format_name: String,
    /// The category the product is listed under
    #[serde(skip_serializing_if = "is_default")]
    pub category_id: u32,
    /// The number of views
    #[serde(skip_serializing_if = "is_default")]
    pub views: u32,
    /// The number of reviews
    #[serde(skip_serializing_if = "is_default")]
    pub review_count: u32,
    /// Whether the product is promoted
    pub boost: bool,
    /// Available sizes, sorted and deduplicated
    #[serde(skip_serializing_if = "is_default")]
    pub sizes: Vec<String>,
    /// Available colors, sorted and deduplicated
    #[serde(skip_serializing_if = "is_default")]
    pub colors: Vec<String>,
    /// Identifiers of related products, in first-seen order without repeats
    #[serde(skip_serializing_if = "is_default")]
    pub similar_products: Vec<u32>,
    /// Additional images
    #[serde(skip_serializing_if = "is_default")]
    pub images: Vec<String>,
    /// Seller-defined fields, in the order they were supplied
    #[serde(skip_serializing_if = "is_default")]
    pub custom_fields: Vec<CustomField>,
}

impl Product {
    /// The canonical JSON projection of this record.
    pub fn to_canonical_json(&self) -> serde_json::Value {
        // Serializing plain strings and numbers into a `Value` cannot fail.
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Whether an identifier has been assigned yet
    pub fn is_pending(&self) -> bool {
        self.id == 0
    }
}

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_projection_keeps_boost() {
        assert_eq!(Product::default().to_canonical_json(), json!({ "boost": false }));
    }

    #[test]
    fn test_projection_omits_defaults() {
        let product = Product {
            id: 7,
            title: "Lamp".to_owned(),
            currency: "USD".to_owned(),
            category_id: 3,
            average_rating: Some(4.5),
            views: 0,
            sizes: vec!["L".to_owned()],
            custom_fields: vec![CustomField::new("material", "brass")],
            ..Default::default()
        };

        assert_eq!(
            product.to_canonical_json(),
            json!({
                "id": 7,
                "title": "Lamp",
                "currency": "USD",
                "average_rating": 4.5,
                "category_id": 3,
                "boost": false,
                "sizes": ["L"],
                "custom_fields": [{ "name": "material", "value": "brass" }],
            })
        );
    }

    #[test]
    fn test_pending() {
        assert!(Product::default().is_pending());
        assert!(
            !Product {
                id: 1,
                ..Default::default()
            }
            .is_pending()
        );
    }
}
