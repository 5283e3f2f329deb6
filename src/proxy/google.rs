//! `POST /api/google-translate`: a stub that answers with the mock
//! translation instead of calling Google.

use crate::provider::mock::mock_translation;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Deserialize, Debug, Default)]
pub struct GoogleProxyRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
}

pub async fn google_translate(
    payload: Result<Json<GoogleProxyRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid request body: {}", rejection.body_text()) })),
            )
        }
    };

    let Some(text) = request.text.filter(|t| !t.is_empty()) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Text is required" })));
    };
    let Some(to) = request.to.filter(|t| !t.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Target language is required" })),
        );
    };

    info!(
        "Google translate stub: {} chars, {} -> {}",
        text.chars().count(),
        request.from.as_deref().unwrap_or("auto"),
        to
    );

    (StatusCode::OK, Json(json!({ "text": mock_translation(&text) })))
}
