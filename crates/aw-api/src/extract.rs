//! Request body extractors that answer failures with [`ApiError`] bodies.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor.
///
/// Behaves like [`axum::Json`] but rejects malformed bodies, wrong field
/// types and unknown enum values with a 400 `BAD_REQUEST` error body
/// instead of axum's plain-text 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// JSON body that may be left out entirely.
///
/// An empty body yields `None`. A body that is present must parse, whatever
/// its content type.
#[derive(Debug, Clone, Default)]
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(None));
        }

        let value = serde_json::from_slice(&bytes).map_err(|e| {
            ApiError::BadRequest(format!("Failed to parse the request body: {}", e))
        })?;
        Ok(OptionalJson(Some(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_api_json_parses_body() {
        let ApiJson(payload) =
            ApiJson::<Payload>::from_request(request(Some("application/json"), r#"{"name":"a"}"#), &())
                .await
                .unwrap();
        assert_eq!(payload.name, "a");
    }

    #[tokio::test]
    async fn test_api_json_rejections_are_bad_requests() {
        let wrong_type =
            ApiJson::<Payload>::from_request(request(Some("application/json"), r#"{"name":12}"#), &())
                .await
                .unwrap_err();
        assert!(matches!(wrong_type, ApiError::BadRequest(ref m) if m.contains("name")));

        let syntax =
            ApiJson::<Payload>::from_request(request(Some("application/json"), "{"), &())
                .await
                .unwrap_err();
        assert!(matches!(syntax, ApiError::BadRequest(_)));

        let no_content_type =
            ApiJson::<Payload>::from_request(request(None, r#"{"name":"a"}"#), &())
                .await
                .unwrap_err();
        assert!(matches!(no_content_type, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_optional_json() {
        let OptionalJson(empty) = OptionalJson::<Payload>::from_request(request(None, ""), &())
            .await
            .unwrap();
        assert!(empty.is_none());

        let OptionalJson(present) =
            OptionalJson::<Payload>::from_request(request(None, r#"{"name":"b"}"#), &())
                .await
                .unwrap();
        assert_eq!(present.unwrap().name, "b");

        let err = OptionalJson::<Payload>::from_request(request(None, r#"{"name":[]}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
