use catalog_core::{
    ingest::{IngestMode, Normalizer, ProductCodec, ProductFactory, is_valid},
    ports::RecordCodec,
};
use rstest::*;
use serde_json::{Value, json};

/// A batch the way upstream scrapers actually send it: stringified
/// records, stringly-typed prices, integer flags and the odd broken entry.
#[fixture]
fn upstream_batch() -> Value {
    let stringified = json!({
        "title": "Desk lamp",
        "currency": "USD",
        "category_id": 3,
        "price": "24.00",
        "is_featured": 1,
    })
    .to_string();

    json!({
        "data": [
            stringified,
            {
                "title": "Wool rug",
                "currency": "EUR",
                "category_id": 4.0,
                "views": -12,
            },
            {
                "title": "Armchair",
                "currency": "EUR",
                "category_id": 5,
                "views": 1200.7,
                "review_count": 3.9,
                "original_price": null,
                "average_rating": null,
                "brand_id": 0,
                "similar_products": [9, 8, 9],
                "custom_fields": [["colour", "teal"], { "name": "legs", "value": "oak" }],
                "boost": 0,
            },
            { "title": "No currency", "category_id": 2 },
            "{ broken",
            {
                "title": "Shelf",
                "currency": "GBP",
                "category_id": 6,
                "images": ["a.jpg", null],
            },
        ]
    })
}

#[rstest]
fn test_batch_keeps_good_records(upstream_batch: Value) {
    let decoded = ProductCodec::new(IngestMode::Create)
        .decode(upstream_batch)
        .unwrap();

    // category 4.0 is not an integer, the fourth has no currency, the fifth
    // is not JSON and the last has a null image
    assert_eq!(decoded.rejected, 4);
    assert_eq!(decoded.records.len(), 2);

    let lamp = &decoded.records[0];
    assert_eq!(lamp.title, "Desk lamp");
    assert_eq!(lamp.category_id, 3);

    let chair = &decoded.records[1];
    assert_eq!(chair.views, 1200);
    assert_eq!(chair.review_count, 3);
    assert_eq!(chair.original_price, None);
    assert_eq!(chair.average_rating, None);
    assert_eq!(chair.brand_id, None);
    assert_eq!(chair.similar_products, vec![9, 8]);
    assert_eq!(chair.custom_fields.len(), 2);
    assert!(!chair.boost);
}

#[rstest]
fn test_canonical_projection_is_stable(upstream_batch: Value) {
    let codec = ProductCodec::new(IngestMode::Create);
    let decoded = codec.decode(upstream_batch).unwrap();

    // What the catalog writes is canonical: normalizing it changes nothing,
    // and every record still passes validation.
    let document = codec.encode(&decoded.records).unwrap();
    for item in document["data"].as_array().unwrap() {
        let normalized = Normalizer::default().normalize_item(item.clone()).unwrap();
        assert_eq!(&normalized, item);
        assert!(is_valid(item));
        assert!(ProductFactory::create(item).is_ok());
    }

    let again = codec.decode(document).unwrap();
    assert_eq!(again.rejected, 0);
    assert_eq!(again.records, decoded.records);
}

#[test]
fn test_create_and_internal_disagree_on_failure() {
    let submitted = json!({ "title": "Stool", "currency": "USD", "category_id": 2 });

    // user submissions are judged on their content
    assert!(ProductFactory::create(&submitted).is_ok());
    // stored records must carry an identifier; without one they are dropped
    // quietly rather than failing the load
    assert!(ProductFactory::create_internal(&submitted).is_none());

    let broken = json!({ "title": "Stool" });
    assert!(ProductFactory::create(&broken).is_err());
}

#[test]
fn test_canonical_json_omits_empty_fields() {
    let product = ProductFactory::create(&json!({
        "title": "Stool",
        "currency": "USD",
        "category_id": 2,
        "sizes": [],
        "average_rating": 0,
    }))
    .unwrap();

    assert_eq!(
        product.to_canonical_json(),
        json!({ "title": "Stool", "currency": "USD", "category_id": 2, "boost": false })
    );
}
