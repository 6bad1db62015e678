//! Extract the API key from the `api_key` query parameter.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use std::collections::HashMap;

/// Query parameter carrying the key.
pub const API_KEY_PARAM: &str = "api_key";

/// Extractor for the optional `api_key` query parameter. An unparseable query string counts as absent.
#[derive(Clone, Debug)]
pub struct ApiKey(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for ApiKey
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(mut params)| params.remove(API_KEY_PARAM))
            .filter(|s| !s.is_empty());
        Ok(ApiKey(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(uri: &str) -> Option<String> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        let ApiKey(key) = ApiKey::from_request_parts(&mut parts, &()).await.unwrap();
        key
    }

    #[tokio::test]
    async fn reads_key_among_other_params() {
        assert_eq!(extract("/item?offset=2&api_key=abc&limit=3").await.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn missing_or_empty_key_is_none() {
        assert_eq!(extract("/item").await, None);
        assert_eq!(extract("/item?api_key=").await, None);
    }
}
