//! The OpenAPI description of the catalog routes, and a browsable page for it.

use aide::{
    axum::{ApiRouter, IntoApiResponse, routing::get},
    openapi::{OpenApi, Tag},
    transform::TransformOpenApi,
};
use axum::{
    Extension, Json,
    response::{Html, IntoResponse},
};
use std::sync::Arc;

/// The RapiDoc viewer, pointed at the JSON document served next to it
const DOCS_PAGE: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Catalog API</title>
    <script src="https://cdnjs.cloudflare.com/ajax/libs/rapidoc/9.3.8/rapidoc-min.js" integrity="sha512-0ES6eX4K9J1PrIEjIizv79dTlN5HwI2GW9Ku6ymb8dijMHF5CIplkS8N0iFJ/wl3GybCSqBJu8HDhiFkZRAf0g==" crossorigin="anonymous" referrerpolicy="no-referrer"></script>
  </head>
  <body>
    <rapi-doc spec-url="/docs/api.json" render-style="read" allow-try="true"></rapi-doc>
  </body>
</html>"#;

async fn docs_page() -> impl IntoApiResponse {
    Html(DOCS_PAGE).into_response()
}

async fn openapi_json(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}

/// `/` serves the viewer and `/api.json` the description itself.
pub(crate) fn docs_routes() -> ApiRouter {
    ApiRouter::new()
        .route("/", get(docs_page))
        .route("/api.json", get(openapi_json))
}

fn tag(name: &str, description: &str) -> Tag {
    Tag {
        name: name.into(),
        description: Some(description.into()),
        ..Default::default()
    }
}

/// Title, summary and tags of the generated description.
pub(crate) fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("Catalog API")
        .summary("Read access to a file-backed product and category catalog.")
        .description("Products and categories are loaded from JSON files on first use. Malformed records are skipped and counted; reload endpoints re-read the files without restarting the service.")
        .version("0.1")
        .tag(tag("products", "The product collection"))
        .tag(tag("categories", "The category tree and its derived views"))
        .tag(tag("diagnostics", "Load reports and raw file access"))
}
