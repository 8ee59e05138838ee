//! REST API endpoints for the product collection.
//!
//! Besides plain read access, this module exposes the diagnostics of the
//! file-backed collection: where it lives, how the last load went, and what
//! the file actually starts with.

use crate::{ApiApplication, ApiError, api_error, blocking, config::AxumConfig};
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use catalog_core::{
    ingest::IngestError,
    models::{FilePreview, LoadSource, Product},
    ports::ProductRepository as _,
};
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::Arc;
use tracing::{Level, event};

/// Creates a router with product-related endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with("/", post(create_product::<T>), |route| {
            route.tag("products")
        })
        .api_route_with("/all", get(all_products::<T>), |route| {
            route.tag("products")
        })
        .api_route_with("/first", get(first_product::<T>), |route| {
            route.tag("products")
        })
        .api_route_with("/status", get(product_status::<T>), |route| {
            route.tag("products").tag("diagnostics")
        })
        .api_route_with("/reload", post(reload_products::<T>), |route| {
            route.tag("products").tag("diagnostics")
        })
        .api_route_with("/raw", get(raw_products::<T>), |route| {
            route.tag("products").tag("diagnostics")
        })
}

/// The whole product collection
#[derive(Serialize, JsonSchema)]
struct ProductList {
    /// The number of products
    count: usize,
    /// The products, in file order
    data: Arc<[Product]>,
}

/// The first product of the collection, or a marker that there is none
#[derive(Serialize, JsonSchema)]
#[serde(untagged)]
enum FirstProduct {
    /// The collection is not empty
    Sample {
        /// The first product
        sample: Product,
    },
    /// The collection is empty
    Empty {
        /// Always true
        empty: bool,
    },
}

/// Where the collection lives and how it was last loaded
#[derive(Serialize, JsonSchema)]
struct ProductStatus {
    /// The backing file
    path: String,
    /// The number of products held
    count: usize,
    /// The number of items accepted by the last load
    accepted: usize,
    /// The number of items skipped by the last load
    rejected: usize,
    /// Where the held products came from
    source: LoadSource,
    /// When the held products were loaded, in seconds since the unix epoch
    loaded_at: u64,
}

/// The outcome of a successful reload
#[derive(Serialize, JsonSchema)]
struct Reloaded {
    /// Always true
    reloaded: bool,
    /// The number of products now held
    count: usize,
    /// The number of items skipped
    rejected: usize,
}

/// Retrieve every product.
///
/// The first request populates the collection from its file.
///
/// # Returns
///
/// - `200 OK`: The products and their count
/// - `500 Internal Server Error`: The file could not be loaded
async fn all_products<T: ApiApplication>(
    State(app): State<T>,
) -> Result<Json<ProductList>, ApiError> {
    let data = blocking(&app, |db| db.get_products())
        .await?
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to load products")
        })?;

    Ok(Json(ProductList {
        count: data.len(),
        data,
    }))
}

/// Retrieve the first product.
///
/// Useful as a quick look at what the loader made of the file.
///
/// # Returns
///
/// - `200 OK`: `{"sample": ...}`, or `{"empty": true}` if there are no products
/// - `500 Internal Server Error`: The file could not be loaded
async fn first_product<T: ApiApplication>(
    State(app): State<T>,
) -> Result<Json<FirstProduct>, ApiError> {
    let data = blocking(&app, |db| db.get_products())
        .await?
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to load products")
        })?;

    Ok(Json(match data.first() {
        Some(sample) => FirstProduct::Sample {
            sample: sample.clone(),
        },
        None => FirstProduct::Empty { empty: true },
    }))
}

/// Report on the product collection.
///
/// # Returns
///
/// - `200 OK`: Location, size and load diagnostics of the collection
/// - `500 Internal Server Error`: The file could not be loaded
async fn product_status<T: ApiApplication>(
    State(app): State<T>,
) -> Result<Json<ProductStatus>, ApiError> {
    let (path, snapshot) = blocking(&app, |db| {
        let path = db.product_location();
        let snapshot = db
            .get_products()
            .and_then(|data| Ok((data.len(), db.product_report()?)));
        (path, snapshot)
    })
    .await?;

    let (count, report) = snapshot.map_err(|err| {
        event!(Level::ERROR, err = err.to_string());
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to load products from {path}"),
        )
    })?;

    Ok(Json(ProductStatus {
        path,
        count,
        accepted: report.accepted,
        rejected: report.rejected,
        source: report.source,
        loaded_at: report.loaded_at,
    }))
}

/// Re-read the product file.
///
/// The held collection is only replaced if the whole file could be read.
///
/// # Returns
///
/// - `200 OK`: The reload succeeded
/// - `500 Internal Server Error`: The file is missing or unusable; the
///   previous collection is still served
async fn reload_products<T: ApiApplication>(
    State(app): State<T>,
) -> Result<Json<Reloaded>, ApiError> {
    let report = blocking(&app, |db| db.reload_products())
        .await?
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })?;

    Ok(Json(Reloaded {
        reloaded: true,
        count: report.accepted,
        rejected: report.rejected,
    }))
}

/// Peek at the start of the product file.
///
/// # Returns
///
/// - `200 OK`: The path, leading bytes and total size of the file
/// - `500 Internal Server Error`: The file could not be read
async fn raw_products<T: ApiApplication>(
    State(app): State<T>,
    Extension(config): Extension<Arc<AxumConfig>>,
) -> Result<Json<FilePreview>, ApiError> {
    let max_bytes = config.raw_preview_bytes;
    blocking(&app, move |db| db.preview_products(max_bytes))
        .await?
        .map(Json)
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })
}

/// Create a product.
///
/// The submission goes through the same normalization as file contents, but
/// is validated strictly: the first problem is reported back and nothing is
/// stored. The identifier is assigned by the catalog.
///
/// # Request Body
///
/// A product as JSON. `title`, `currency` and `category_id` are required.
///
/// # Returns
///
/// - `201 Created`: The stored product
/// - `422 Unprocessable Entity`: The submission was rejected
/// - `500 Internal Server Error`: The product file could not be written
async fn create_product<T: ApiApplication>(
    State(app): State<T>,
    Json(item): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    blocking(&app, move |db| db.create_product(&item))
        .await?
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to store product")
        })?
        .map(|product| (StatusCode::CREATED, Json(product)))
        .map_err(|err: IngestError| api_error(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))
}
