//! REST API endpoints for the category tree.
//!
//! Top-level and leaf categories are derived from the `parent_id` links of
//! the collection and recomputed after a reload.

use crate::{ApiApplication, ApiError, api_error, blocking, config::AxumConfig};
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use catalog_core::{models::Category, ports::CategoryRepository as _};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Level, event};

/// Creates a router with category-related endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with("/all", get(all_categories::<T>), |route| {
            route.tag("categories")
        })
        .api_route_with("/top-level", get(top_level_categories::<T>), |route| {
            route.tag("categories")
        })
        .api_route_with("/leaves", get(leaf_categories::<T>), |route| {
            route.tag("categories")
        })
        .api_route_with("/reload", post(reload_categories::<T>), |route| {
            route.tag("categories").tag("diagnostics")
        })
}

/// A list of categories
#[derive(Serialize, JsonSchema)]
struct CategoryList {
    /// The number of categories in `data`
    count: usize,
    /// The categories, in file order
    data: Vec<Category>,
}

impl From<Vec<Category>> for CategoryList {
    fn from(data: Vec<Category>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

/// Pagination of the leaf categories.
///
/// Negative values are treated as zero.
#[derive(Deserialize, JsonSchema)]
struct PageQuery {
    /// The number of leaves to skip (default 0)
    offset: Option<i64>,
    /// The maximum number of leaves to return (default from configuration)
    limit: Option<i64>,
}

/// The outcome of a successful reload
#[derive(Serialize, JsonSchema)]
struct Reloaded {
    /// Always true
    reloaded: bool,
    /// The number of categories now held
    count: usize,
    /// The number of items skipped
    rejected: usize,
}

fn clamp(value: i64) -> usize {
    usize::try_from(value.max(0)).unwrap_or(usize::MAX)
}

fn load_failed(err: impl std::fmt::Display) -> ApiError {
    event!(Level::ERROR, err = err.to_string());
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to load categories")
}

/// Retrieve every category.
///
/// # Returns
///
/// - `200 OK`: The categories and their count
/// - `500 Internal Server Error`: The file could not be loaded
async fn all_categories<T: ApiApplication>(
    State(app): State<T>,
) -> Result<Json<CategoryList>, ApiError> {
    let data = blocking(&app, |db| db.get_categories())
        .await?
        .map_err(load_failed)?;
    Ok(Json(data.into()))
}

/// Retrieve the categories without a parent.
///
/// # Returns
///
/// - `200 OK`: The top-level categories and their count
/// - `500 Internal Server Error`: The file could not be loaded
async fn top_level_categories<T: ApiApplication>(
    State(app): State<T>,
) -> Result<Json<CategoryList>, ApiError> {
    let data = blocking(&app, |db| db.top_level_categories())
        .await?
        .map_err(load_failed)?;
    Ok(Json(data.into()))
}

/// Retrieve a page of the categories without children.
///
/// # Returns
///
/// - `200 OK`: The page and its length; empty if `offset` is past the end
/// - `500 Internal Server Error`: The file could not be loaded
async fn leaf_categories<T: ApiApplication>(
    State(app): State<T>,
    Extension(config): Extension<Arc<AxumConfig>>,
    Query(PageQuery { offset, limit }): Query<PageQuery>,
) -> Result<Json<CategoryList>, ApiError> {
    let offset = offset.map_or(0, clamp);
    let limit = limit.map_or(config.leaf_page_limit, clamp);
    let data = blocking(&app, move |db| db.leaf_categories(offset, limit))
        .await?
        .map_err(load_failed)?;
    Ok(Json(data.into()))
}

/// Re-read the category file.
///
/// Top-level and leaf categories are recomputed from the new collection.
///
/// # Returns
///
/// - `200 OK`: The reload succeeded
/// - `500 Internal Server Error`: The file is missing or unusable; the
///   previous collection is still served
async fn reload_categories<T: ApiApplication>(
    State(app): State<T>,
) -> Result<Json<Reloaded>, ApiError> {
    let report = blocking(&app, |db| db.reload_categories())
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
