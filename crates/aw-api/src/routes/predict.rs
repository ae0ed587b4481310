//! AI text-generation proxy.

use axum::{extract::State, routing::post, Json, Router};
use tracing::{debug, warn};

use crate::dto::{ChatMessage, PredictChoice, PredictRequest, PredictResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Creates the predict route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}

/// Forwards the first message to the text generator.
#[utoipa::path(
    post,
    path = "/api/predict",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Generated text", body = PredictResponse),
        (status = 400, description = "Empty prompt", body = ErrorResponse),
        (status = 503, description = "Generator unreachable or not configured", body = ErrorResponse),
        (status = 500, description = "Generator failed", body = ErrorResponse)
    ),
    tag = "AI"
)]
pub async fn predict(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let prompt = request.prompt();
    if prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt must not be empty".to_string()));
    }

    let generator = state.text_generator.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Text generation is not configured".to_string())
    })?;

    debug!(model = generator.model(), prompt_len = prompt.len(), "Generating text");

    let content = match generator.generate(prompt).await {
        Ok(content) => {
            state.metrics.record_text_generation("success");
            content
        }
        Err(e) => {
            let outcome = if e.is_unreachable() {
                "unavailable"
            } else {
                "error"
            };
            state.metrics.record_text_generation(outcome);
            warn!(model = generator.model(), error = %e, "Text generation failed");
            return Err(e.into());
        }
    };

    Ok(Json(PredictResponse {
        choices: vec![PredictChoice {
            message: ChatMessage {
                role: Some("assistant".to_string()),
                content,
            },
        }],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestContext;
    use aw_connectors::{ConnectorError, MockTextGenerator};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::sync::Arc;

    fn request(content: &str) -> ApiJson<PredictRequest> {
        ApiJson(
            serde_json::from_value(serde_json::json!({
                "messages": [{ "content": content }]
            }))
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_predict_returns_generated_text() {
        let ctx = TestContext::new().await;
        let generator = MockTextGenerator::fixed("Cotton is a natural fibre.");
        let state = ctx
            .state
            .clone()
            .with_text_generator(Arc::new(generator.clone()));

        let Json(response) = predict(State(state), request("What is cotton?"))
            .await
            .unwrap();

        assert_eq!(response.choices[0].message.content, "Cotton is a natural fibre.");
        assert_eq!(generator.prompts().await, vec!["What is cotton?".to_string()]);
    }

    #[tokio::test]
    async fn test_predict_rejects_empty_prompt() {
        let ctx = TestContext::new().await;
        let state = ctx
            .state
            .clone()
            .with_text_generator(Arc::new(MockTextGenerator::echo()));

        let err = predict(State(state), request("   ")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_predict_maps_generator_failures() {
        let ctx = TestContext::new().await;

        let unreachable = ctx.state.clone().with_text_generator(Arc::new(
            MockTextGenerator::failing(ConnectorError::ConnectionFailed("refused".into())),
        ));
        let err = predict(State(unreachable), request("hi")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let broken = ctx.state.clone().with_text_generator(Arc::new(
            MockTextGenerator::failing(ConnectorError::RequestFailed("model missing".into())),
        ));
        let response = predict(State(broken), request("hi"))
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_predict_without_generator_is_unavailable() {
        let ctx = TestContext::new().await;
        let err = predict(State(ctx.state.clone()), request("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
