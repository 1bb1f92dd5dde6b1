//! Route registration: ledger endpoints, system endpoints and the static UI.

use std::path::Path;
use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use inward_ledger::LedgerStore;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers;

/// Application shared state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerStore>,
}

/// Build the complete router.
///
/// Paths without a route fall through to files under `static_dir`.
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    // System endpoints (no state needed).
    let system_routes = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    Router::new()
        .route("/submit", post(handlers::submit))
        .route("/download", get(handlers::download))
        .with_state(state)
        .merge(system_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "inwardd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use inward_ledger::model::{DEPARTMENT, ITEM_DESCRIPTION, SL_NO, TO_WHOM};
    use inward_ledger::{CellValue, XlsxStore, EXPORT_FILE_NAME};
    use tower::ServiceExt;

    use crate::handlers::{SAVED_MESSAGE, XLSX_CONTENT_TYPE};

    fn make_router() -> (Router, Arc<XlsxStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(XlsxStore::new(&dir.path().join(EXPORT_FILE_NAME)));
        let state = AppState {
            ledger: store.clone(),
        };
        let router = build_router(state, &dir.path().join("public"));
        (router, store, dir)
    }

    async fn submit(router: &Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/submit")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn submit_appends_row() {
        let (router, store, _dir) = make_router();

        let (status, body) = submit(
            &router,
            serde_json::json!({
                "personName": "Alice",
                "department": "IT",
                "item": ["Laptop"],
                "make": ["Dell"],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"message": SAVED_MESSAGE}));

        let ledger = store.load().unwrap();
        assert_eq!(ledger.len(), 1);
        let row = &ledger.rows[0];
        assert_eq!(row.get(SL_NO), Some(&CellValue::Number(1.0)));
        assert_eq!(row.get(TO_WHOM), Some(&CellValue::from("Alice")));
        assert_eq!(row.get(DEPARTMENT), Some(&CellValue::from("IT")));
        assert_eq!(row.get(ITEM_DESCRIPTION), Some(&CellValue::from("Laptop")));
    }

    #[tokio::test]
    async fn concurrent_submits_all_land() {
        let (router, store, _dir) = make_router();

        let calls = (0..2).map(|i| {
            let router = router.clone();
            tokio::spawn(async move {
                submit(&router, serde_json::json!({"personName": format!("p{}", i)})).await
            })
        });
        for call in calls.collect::<Vec<_>>() {
            let (status, _) = call.await.unwrap();
            assert_eq!(status, StatusCode::OK);
        }

        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn submit_without_json_content_type_appends_default_row() {
        let (router, store, _dir) = make_router();

        let req = Request::builder()
            .method("POST")
            .uri("/submit")
            .body(Body::from("personName=Alice"))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let ledger = store.load().unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.rows[0].get(TO_WHOM), Some(&CellValue::empty()));
    }

    #[tokio::test]
    async fn submit_malformed_json_is_bad_request() {
        let (router, store, _dir) = make_router();

        let req = Request::builder()
            .method("POST")
            .uri("/submit")
            .header("content-type", "application/json")
            .body(Body::from("{oops"))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn storage_failure_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        // The ledger path is a directory, so every read fails.
        let state = AppState {
            ledger: Arc::new(XlsxStore::new(dir.path())),
        };
        let router = build_router(state, &dir.path().join("public"));

        let (status, body) = submit(&router, serde_json::json!({})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("Server Error: "), "{message}");

        let req = Request::builder().uri("/download").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn download_serves_workbook() {
        let (router, store, _dir) = make_router();
        submit(&router, serde_json::json!({"personName": "Bob"})).await;

        let req = Request::builder().uri("/download").body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Inward_Ledger.xlsx\""
        );

        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        assert_eq!(bytes.as_ref(), std::fs::read(store.path()).unwrap().as_slice());
    }

    #[tokio::test]
    async fn download_initializes_missing_ledger() {
        let (router, store, _dir) = make_router();
        assert!(!store.path().exists());

        let req = Request::builder().uri("/download").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(store.path().is_file());
        assert!(store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn static_files_and_system_endpoints() {
        let (router, _store, dir) = make_router();
        let public = dir.path().join("public");
        std::fs::create_dir_all(&public).unwrap();
        std::fs::write(public.join("index.html"), "<form></form>").unwrap();

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(bytes.as_ref(), b"<form></form>");

        let req = Request::builder().uri("/missing.css").body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_headers_are_present() {
        let (router, _store, _dir) = make_router();

        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://example.com")
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
