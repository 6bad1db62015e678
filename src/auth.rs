//! API-key middleware. Installed in front of entity routes unless running in test mode.

use crate::config::ApiKeys;
use crate::error::AppError;
use crate::extractors::ApiKey;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Reject with 403 unless `api_key` matches the key configured for the request method.
pub async fn api_key_middleware(
    State(keys): State<Arc<ApiKeys>>,
    ApiKey(presented): ApiKey,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let method = request.method().clone();
    let allowed = match (keys.key_for(&method), presented.as_deref()) {
        (Some(expected), Some(given)) => expected == given,
        _ => false,
    };
    if !allowed {
        tracing::warn!(%method, path = %request.uri().path(), "rejected api key");
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Method, http::Request, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(keys: ApiKeys) -> Router {
        Router::new()
            .route("/item", get(|| async { "list" }).delete(|| async { "gone" }))
            .layer(middleware::from_fn_with_state(Arc::new(keys), api_key_middleware))
    }

    async fn status(app: Router, method: Method, uri: &str) -> StatusCode {
        let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn default_key_gates_every_method() {
        let keys = ApiKeys::new("s3cret");
        assert_eq!(status(app(keys.clone()), Method::GET, "/item").await, StatusCode::FORBIDDEN);
        assert_eq!(status(app(keys.clone()), Method::GET, "/item?api_key=nope").await, StatusCode::FORBIDDEN);
        assert_eq!(status(app(keys.clone()), Method::GET, "/item?api_key=s3cret").await, StatusCode::OK);
        assert_eq!(status(app(keys), Method::DELETE, "/item?api_key=s3cret").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn method_key_replaces_default_for_that_method() {
        let keys = ApiKeys::new("s3cret").with_method(Method::DELETE, "admin");
        assert_eq!(status(app(keys.clone()), Method::DELETE, "/item?api_key=s3cret").await, StatusCode::FORBIDDEN);
        assert_eq!(status(app(keys.clone()), Method::DELETE, "/item?api_key=admin").await, StatusCode::OK);
        assert_eq!(status(app(keys), Method::GET, "/item?api_key=admin").await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unkeyed_method_is_always_forbidden() {
        let keys = ApiKeys::default().with_method(Method::GET, "reader");
        assert_eq!(status(app(keys), Method::DELETE, "/item?api_key=reader").await, StatusCode::FORBIDDEN);
    }
}
