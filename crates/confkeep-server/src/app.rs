//! Router assembly.
//!
//! Everything under `/api` sits behind the auth middleware. `/health` and the
//! optional static UI are public.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware as axum_mw;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::{AUTH_HEADER, auth_middleware};
use crate::routes;
use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
///
/// When `ui_dir` is given, unmatched non-API paths are served from it, with
/// `index.html` as the single-page-app fallback.
pub fn build_router(state: Arc<AppState>, ui_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .nest("/config", routes::config::router())
        .nest("/project", routes::project::router())
        .nest("/query", routes::query::router())
        .nest("/cookies", routes::cookies::router())
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ))
        .fallback(not_found);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(AUTH_HEADER),
        ]);

    let app = Router::new()
        .nest("/api", api)
        .merge(routes::health::router());

    let app = match ui_dir {
        Some(dir) => app.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => app.fallback(not_found),
    };

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

async fn not_found() -> Response {
    AppError::NotFound("Not Found".to_owned()).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use confkeep_core::cookie::CookieStore;
    use confkeep_core::project::ProjectStore;
    use confkeep_core::query::QueryGateway;
    use confkeep_storage::MemoryDocument;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::config::AuthSecret;

    const SECRET: &str = "s3cret";

    async fn make_app() -> Router {
        let pool = confkeep_storage::sqlite::open_in_memory().await.unwrap();
        let state = Arc::new(AppState {
            project_store: Arc::new(ProjectStore::new(Arc::new(MemoryDocument::new()))),
            query_gateway: Arc::new(QueryGateway::new(pool.clone())),
            cookie_store: Arc::new(CookieStore::new(pool)),
            auth_secret: AuthSecret::new(SECRET),
        });
        build_router(state, None)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTH_HEADER, SECRET);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn api_requires_secret() {
        let app = make_app().await;

        let response = app
            .clone()
            .oneshot(Request::get("/api/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/project")
                    .header(AUTH_HEADER, "wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::get("/api/project")
                    .header(header::AUTHORIZATION, format!("Bearer {SECRET}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = make_app().await;
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let app = make_app().await;
        let (status, body) = send(&app, "GET", "/nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Not Found");
    }

    #[tokio::test]
    async fn project_lifecycle() {
        let app = make_app().await;

        let (status, _) = send(&app, "POST", "/api/project", Some(json!({ "name": "demo" }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", "/api/project", Some(json!({ "name": "demo", "data": {} }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("already exists"));

        let (status, _) = send(
            &app,
            "PUT",
            "/api/project/demo",
            Some(json!({ "data": { "host": "10.0.0.1" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/api/project", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "demo": { "host": "10.0.0.1" } }));

        let (status, body) = send(&app, "DELETE", "/api/project/demo", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Project 'demo' deleted successfully");

        let (status, _) = send(&app, "DELETE", "/api/project/demo", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn project_validation() {
        let app = make_app().await;

        let (status, _) = send(&app, "POST", "/api/project", Some(json!({ "data": {} }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "POST", "/api/project", Some(json!({ "name": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "PUT", "/api/project/ghost", Some(json!({ "data": {} }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, "POST", "/api/project", Some(json!({ "name": "demo" }))).await;
        let (status, _) = send(&app, "PUT", "/api/project/demo", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_with_blank_data_starts_empty() {
        let app = make_app().await;
        for (name, data) in [("a", json!("")), ("b", json!(0)), ("c", json!(false)), ("d", json!(null))] {
            let (status, _) = send(&app, "POST", "/api/project", Some(json!({ "name": name, "data": data }))).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) = send(&app, "POST", "/api/project", Some(json!({ "name": "e", "data": [] }))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", "/api/project", None).await;
        assert_eq!(body, json!({ "a": {}, "b": {}, "c": {}, "d": {}, "e": [] }));
    }

    #[tokio::test]
    async fn config_replace_and_legacy_key_delete() {
        let app = make_app().await;
        let document = json!({ "projects": {}, "project": { "token": "abc" } });

        let (status, body) = send(&app, "POST", "/api/config", Some(document.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Config updated successfully");

        let (_, body) = send(&app, "GET", "/api/config", None).await;
        assert_eq!(body, document);

        let (status, body) = send(&app, "DELETE", "/api/config/token", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Key 'token' deleted successfully");

        let (status, _) = send(&app, "DELETE", "/api/config/token", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = make_app().await;
        let request = Request::post("/api/config")
            .header(AUTH_HEADER, SECRET)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ nope"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn query_dispatch() {
        let app = make_app().await;

        let (status, body) = send(&app, "POST", "/api/query", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "query parameter is required");

        let (status, body) = send(
            &app,
            "POST",
            "/api/query",
            Some(json!({ "query": "INSERT INTO cookies (project, key, value, updated_at) VALUES ('a', 'k', 'v', 't')" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Query executed successfully", "changes": 1 }));

        let (status, body) = send(
            &app,
            "POST",
            "/api/query",
            Some(json!({ "query": "  select project from cookies" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "results": [{ "project": "a" }] }));

        let (status, body) = send(&app, "POST", "/api/query", Some(json!({ "query": "SELEC 1" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("syntax error"));
    }

    #[tokio::test]
    async fn cookie_lifecycle() {
        let app = make_app().await;

        let (status, _) = send(&app, "POST", "/api/cookies", Some(json!({ "project": "siteA" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "POST",
            "/api/cookies",
            Some(json!({ "project": "siteA", "key": "session", "value": "abc123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].is_i64());

        let (status, body) = send(&app, "PUT", "/api/cookies/siteA", Some(json!({ "value": "xyz999" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changes"], 1);

        let (status, body) = send(&app, "GET", "/api/cookies/siteA", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["project"], "siteA");
        assert_eq!(body["key"], "session");
        assert_eq!(body["value"], "xyz999");
        assert!(body["updated_at"].is_string());

        let (status, _) = send(&app, "PUT", "/api/cookies/siteA", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "PUT", "/api/cookies/other", Some(json!({ "key": "k" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            "PUT",
            "/api/cookies/unknown-project",
            Some(json!({ "key": "k", "value": "v" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Cookie record created successfully");

        let (status, _) = send(&app, "GET", "/api/cookies/nobody", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn serves_ui_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>ui</html>").unwrap();

        let pool = confkeep_storage::sqlite::open_in_memory().await.unwrap();
        let state = Arc::new(AppState {
            project_store: Arc::new(ProjectStore::new(Arc::new(MemoryDocument::new()))),
            query_gateway: Arc::new(QueryGateway::new(pool.clone())),
            cookie_store: Arc::new(CookieStore::new(pool)),
            auth_secret: AuthSecret::new(SECRET),
        });
        let app = build_router(state, Some(dir.path()));

        let response = app
            .oneshot(Request::get("/some/client/route").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<html>ui</html>");
    }
}
