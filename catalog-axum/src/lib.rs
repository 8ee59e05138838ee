#![warn(missing_docs)]
// Note: this overwrites the link in the README to point to the rust docs of the catalog-axum crate.
//! [catalog_core]: https://docs.rs/catalog_core/latest/catalog_core/index.html
//! [catalog_axum]: https://docs.rs/catalog_axum/latest/catalog_axum/index.html
#![doc = include_str!("../README.md")]

mod category_routes;
mod product_routes;

use aide::{
    axum::{ApiRouter, routing::get},
    openapi::OpenApi,
};
use axum::{Extension, Json, http::StatusCode};
use catalog_core::ports::Application;
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{Level, event};

mod openapi;
use openapi::{api_docs, docs_routes};

pub mod config;
use config::AxumConfig;

/// Response for the health check endpoint
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct HealthResponse {
    status: String,
}

/// Simple health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// The body of every failed request
#[derive(Serialize, JsonSchema)]
pub(crate) struct ErrorResponse {
    /// What went wrong
    error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Run a repository call on the blocking pool.
///
/// The repositories read and write files synchronously, which must not
/// happen on a runtime worker.
pub(crate) async fn blocking<T: ApiApplication, R: Send + 'static>(
    app: &T,
    call: impl FnOnce(&T::Repository) -> R + Send + 'static,
) -> Result<R, ApiError> {
    let repository = app.repository();
    tokio::task::spawn_blocking(move || call(&repository))
        .await
        .map_err(|err| {
            event!(Level::ERROR, err = err.to_string());
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "repository task failed")
        })
}

/// Construct the API router together with its OpenAPI description
pub fn build<T: ApiApplication>(state: T, config: AxumConfig) -> (axum::Router, Arc<OpenApi>) {
    let mut api = OpenApi::default();
    let router = ApiRouter::new()
        .api_route("/health", get(health_check))
        .nest("/products", product_routes::router())
        .nest("/categories", category_routes::router())
        .nest_api_service("/docs", docs_routes())
        .finish_api_with(&mut api, api_docs);

    let api = Arc::new(api);
    let router = router
        .layer(Extension(api.clone())) // Arc is very important here or you will face massive memory and performance issues
        .layer(Extension(Arc::new(config)))
        .layer(CorsLayer::permissive())
        .with_state(state);
    (router, api)
}

/// Construct a full API router with the given state and config
pub fn router<T: ApiApplication>(state: T, config: AxumConfig) -> axum::Router {
    build(state, config).0
}

/// Starts the HTTP server with the provided configuration
pub async fn start_server<T: ApiApplication>(
    config: AxumConfig,
    app: T,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    event!(
        Level::INFO,
        "Listening for requests on {}",
        listener.local_addr()?
    );

    let service = router(app, config);
    axum::serve(listener, service).await
}

/// Everything axum asks of router state, on top of [`Application`].
///
/// Handlers are generic over `T: ApiApplication` rather than repeating the
/// bounds; any cloneable, thread-safe application qualifies.
pub trait ApiApplication: Clone + Send + Sync + 'static + Application {}

impl<T: Clone + Send + Sync + 'static> ApiApplication for T where T: Application {}
