//! Server-to-server notifications from the payment gateway.

use crate::{AppState, Error};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use domain::webhook::{self, WebhookEnvelope};
use log::*;

const X_VERIFY: &str = "x-verify";

/// POST /api/autopay/webhook
///
/// Verifies the notification's `X-VERIFY` claim before reading it. Once verified the
/// gateway always receives a 200, with `success: false` when the event could not be
/// decoded or recorded.
#[utoipa::path(
    post,
    path = "/api/autopay/webhook",
    request_body = WebhookEnvelope,
    responses(
        (status = 200, description = "Notification verified and acknowledged", body = webhook::WebhookAck),
        (status = 400, description = "Missing response data"),
        (status = 401, description = "Invalid signature")
    )
)]
pub async fn receive(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(envelope): Json<WebhookEnvelope>,
) -> Result<impl IntoResponse, Error> {
    debug!("Received gateway webhook");

    let header_claim = headers.get(X_VERIFY).and_then(|v| v.to_str().ok());
    let ack = webhook::handle_webhook(
        app_state.webhook_validator.as_ref(),
        app_state.event_sink.as_ref(),
        envelope,
        header_claim,
        Utc::now(),
    )
    .await?;

    Ok(Json(ack))
}
