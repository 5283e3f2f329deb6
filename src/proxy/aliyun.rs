//! `POST /api/aliyun-proxy`: forwards a chat completion to DashScope.
//!
//! Request validation failures answer 400. Everything past validation,
//! including upstream errors, answers 200 with a [`ProxyEnvelope`] whose
//! `success` flag carries the outcome.

use super::ProxyState;
use crate::provider::aliyun::{AliyunProxyRequest, ProxyEnvelope};
use crate::provider::chat::{extract_content, ChatRequest, TRANSLATION_TEMPERATURE};
use crate::provider::{excerpt, FailureReason};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

#[derive(Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamError>,
}

#[derive(Deserialize)]
struct UpstreamError {
    message: Option<String>,
}

fn bad_request(message: &str) -> (StatusCode, Json<ProxyEnvelope>) {
    warn!("Rejected proxy request: {}", message);
    (
        StatusCode::BAD_REQUEST,
        Json(ProxyEnvelope::failure(FailureReason::Unknown, message)),
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn aliyun_proxy(
    State(state): State<ProxyState>,
    payload: Result<Json<AliyunProxyRequest>, JsonRejection>,
) -> (StatusCode, Json<ProxyEnvelope>) {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(&format!("Invalid request body: {}", rejection.body_text())),
    };

    let Some(api_key) = non_empty(request.api_key) else {
        return bad_request("API Key is required");
    };
    let Some(model) = non_empty(request.model) else {
        return bad_request("Model is required");
    };
    let user_prompt = request.user_prompt.unwrap_or_default();

    info!(
        "Aliyun proxy request: model {}, key {}***",
        model,
        api_key.chars().take(4).collect::<String>()
    );

    let body = ChatRequest::new(model, request.system_prompt.as_deref(), user_prompt)
        .with_temperature(TRANSLATION_TEMPERATURE);

    let response = match state
        .client
        .post(&state.upstream_url)
        .bearer_auth(&api_key)
        .json(&body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!("Upstream request failed: {}", e);
            return (
                StatusCode::OK,
                Json(ProxyEnvelope::failure(FailureReason::NetworkError, format!("Fetch error: {}", e))),
            );
        }
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to read upstream response: {}", e);
            return (
                StatusCode::OK,
                Json(
                    ProxyEnvelope::failure(FailureReason::NetworkError, format!("Fetch error: {}", e))
                        .with_status(status.as_u16()),
                ),
            );
        }
    };
    debug!("Upstream status {}, {} bytes", status, text.len());

    if !status.is_success() {
        let message = serde_json::from_str::<UpstreamErrorBody>(&text)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Unknown error from Aliyun API".to_string());
        warn!("Aliyun API error {}: {}", status, message);
        return (
            StatusCode::OK,
            Json(
                ProxyEnvelope::failure(FailureReason::from_status(status), message)
                    .with_status(status.as_u16()),
            ),
        );
    }

    let envelope = match extract_content(&text) {
        Ok(translated) => ProxyEnvelope::ok(translated),
        Err(_) => {
            error!("Unparseable Aliyun response");
            ProxyEnvelope::failure(
                FailureReason::MalformedResponse,
                "Invalid JSON response from Aliyun API",
            )
            .with_status(status.as_u16())
            .with_details(excerpt(&text))
        }
    };
    (StatusCode::OK, Json(envelope))
}
