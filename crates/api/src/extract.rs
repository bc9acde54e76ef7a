//! Extractors whose rejections are [`AppError`]s.
//!
//! Axum's built-in extractors reject with plain-text bodies; these wrappers
//! keep every error response in the `{"detail": ...}` shape.

use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AppError;

/// JSON body in and out. Malformed bodies are 400.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string. Unparseable parameters are 400.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Path parameters. A segment that does not parse is 404.
#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
    };
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Deserialize)]
    struct Params {
        page: u32,
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/query",
                get(|Query(p): Query<Params>| async move { p.page.to_string() }),
            )
            .route(
                "/items/{id}",
                get(|Path(id): Path<i32>| async move { id.to_string() }),
            )
            .route(
                "/json",
                post(|Json(v): Json<serde_json::Value>| async move { v.to_string() }),
            )
    }

    async fn detail(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["detail"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_bad_query_is_json_400() {
        let response = app()
            .oneshot(Request::get("/query?page=abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!detail(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_bad_path_is_404() {
        let response = app()
            .oneshot(Request::get("/items/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let response = app()
            .oneshot(
                Request::post("/json")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
