use axum::http::StatusCode;
use axum_test::TestServer;
use catalog_axum::{config::AxumConfig, router};
use rstest::*;
use serde_json::{Value, json};

mod app;
use app::TestApp;

fn server(app: TestApp) -> TestServer {
    TestServer::new(router(app, AxumConfig::default())).unwrap()
}

#[fixture]
fn seeded() -> TestApp {
    TestApp::seeded()
}

// Repository calls run on the blocking pool, so the tests need a runtime
// with worker threads to spare.
#[rstest]
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_health(seeded: TestApp) {
    let response = server(seeded).get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok" }));
}

#[rstest]
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_products(seeded: TestApp) {
    let server = server(seeded);

    let all: Value = server.get("/products/all").await.json();
    assert_eq!(all["count"], 2);
    assert_eq!(all["data"][0]["title"], "Lamp");
    assert_eq!(all["data"][0]["converted_price"], "12");
    assert_eq!(all["data"][1]["boost"], true);

    let first: Value = server.get("/products/first").await.json();
    assert_eq!(first["sample"]["id"], 1);

    let status: Value = server.get("/products/status").await.json();
    assert_eq!(status["count"], 2);
    assert_eq!(status["accepted"], 2);
    assert_eq!(status["rejected"], 1);
    assert_eq!(status["source"], "file");
    assert!(status["path"].as_str().unwrap().ends_with("products.json"));
}

#[rstest]
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_empty_catalog() {
    let server = server(TestApp::new(None, None));

    server
        .get("/products/first")
        .await
        .assert_json(&json!({ "empty": true }));
    let status: Value = server.get("/products/status").await.json();
    assert_eq!(status["source"], "default");

    // reload insists on a file
    let response = server.post("/products/reload").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[rstest]
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_reload(seeded: TestApp) {
    let app = seeded.clone();
    let server = server(seeded);
    assert_eq!(server.get("/products/all").await.json::<Value>()["count"], 2);

    app.write(
        "products.json",
        json!([{ "id": 9, "title": "Desk", "currency": "EUR", "category_id": 6 }]),
    );
    server
        .post("/products/reload")
        .await
        .assert_json(&json!({ "reloaded": true, "count": 1, "rejected": 0 }));
    let all: Value = server.get("/products/all").await.json();
    assert_eq!(all["data"][0]["title"], "Desk");

    // a broken file leaves the collection alone
    app.write("products.json", json!({ "items": [] }));
    server
        .post("/products/reload")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(server.get("/products/all").await.json::<Value>()["count"], 1);
}

#[rstest]
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_raw(seeded: TestApp) {
    let app = seeded.clone();
    let server = server(seeded);
    let padding = "x".repeat(1000);
    app.write("products.json", json!({ "data": [], "padding": padding }));

    let raw: Value = server.get("/products/raw").await.json();
    assert_eq!(raw["head"].as_str().unwrap().len(), 400);
    assert!(raw["size"].as_u64().unwrap() > 1000);
}

#[rstest]
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_create(seeded: TestApp) {
    let server = server(seeded);

    let response = server
        .post("/products")
        .json(&json!({
            "title": "Chair",
            "currency": "USD",
            "category_id": 5,
            "sizes": ["Size, M, S"],
            "price": "10.5",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["id"], 3);
    assert_eq!(created["sizes"], json!(["S", "Size"]));

    let response = server
        .post("/products")
        .json(&json!({ "title": "Chair", "category_id": 5 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("currency"));

    assert_eq!(server.get("/products/all").await.json::<Value>()["count"], 3);
}

#[rstest]
#[case::defaults("", vec![3, 4, 5, 6, 7])]
#[case::tail("?offset=3&limit=10", vec![6, 7])]
#[case::past_end("?offset=5&limit=1", vec![])]
#[case::zero_limit("?offset=0&limit=0", vec![])]
#[case::negative_limit("?limit=-4", vec![])]
#[case::negative_offset("?offset=-2&limit=2", vec![3, 4])]
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_leaves(seeded: TestApp, #[case] query: &str, #[case] expected: Vec<u64>) {
    let page: Value = server(seeded)
        .get(&format!("/categories/leaves{query}"))
        .await
        .json();
    let ids: Vec<u64> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|category| category["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, expected);
    assert_eq!(page["count"], expected.len());
}

#[rstest]
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_categories(seeded: TestApp) {
    let app = seeded.clone();
    let server = server(seeded);

    let all: Value = server.get("/categories/all").await.json();
    assert_eq!(all["count"], 6);
    server
        .get("/categories/top-level")
        .await
        .assert_json(&json!({ "count": 1, "data": [{ "id": 1, "name": "Home" }] }));

    app.write(
        "categories.json",
        json!([{ "id": 1, "name": "Home" }, { "id": 2, "name": "Garden" }]),
    );
    server
        .post("/categories/reload")
        .await
        .assert_json(&json!({ "reloaded": true, "count": 2, "rejected": 0 }));
    let top: Value = server.get("/categories/top-level").await.json();
    assert_eq!(top["count"], 2);
    let leaves: Value = server.get("/categories/leaves").await.json();
    assert_eq!(leaves["count"], 2);
}

#[rstest]
#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_docs(seeded: TestApp) {
    let api: Value = server(seeded).get("/docs/api.json").await.json();
    assert_eq!(api["info"]["title"], "Catalog API");
    assert!(api["paths"]["/categories/leaves"].is_object());
}
