//! Verification and dispatch of server-to-server gateway notifications.
//!
//! A notification is only decoded after its `X-VERIFY` claim checks out. From that
//! point on the gateway always gets an acknowledgement, even when the payload cannot
//! be read or the event cannot be recorded, so it does not keep redelivering.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gateway_auth::error::{webhook_error, WebhookErrorKind};
use gateway_auth::webhook::WebhookValidator;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{validation_error, Error};
use crate::gateway::autopay::envelope;
use crate::subscription::{EventStatus, SubscriptionEvent};

/// Body the gateway posts to the webhook endpoint.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct WebhookEnvelope {
    /// Base64-encoded JSON notification.
    pub response: Option<String>,
    /// `<hex>###<keyIndex>` signature over `response`.
    #[serde(rename = "xVerify")]
    pub x_verify: Option<String>,
}

/// Decoded notification payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub code: String,
    pub message: Option<String>,
    pub data: Option<Value>,
}

/// Acknowledgement returned to the gateway once the signature is verified.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WebhookAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    fn accepted() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: &Error) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Receives normalized events for persistence or fan-out.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn record(&self, event: SubscriptionEvent) -> Result<(), Error>;
}

/// Default sink: writes each event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventSink;

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn record(&self, event: SubscriptionEvent) -> Result<(), Error> {
        info!(
            "Subscription event {:?} for {} (code {}, amount {:?}, reason {:?})",
            event.status,
            event.entity_id.as_deref().unwrap_or("<unknown>"),
            event.code,
            event.amount_minor,
            event.reason
        );
        Ok(())
    }
}

/// Turn a decoded notification into the event it signals.
pub fn dispatch(notification: &Notification, received_at: DateTime<Utc>) -> SubscriptionEvent {
    let status = EventStatus::from_code(&notification.code);
    let data = notification.data.as_ref();
    let text = |name: &str| {
        data.and_then(|d| d.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let reason = match status {
        EventStatus::PaymentFailed => text("message").or_else(|| notification.message.clone()),
        _ => None,
    };

    SubscriptionEvent {
        entity_id: text("subscriptionId").or_else(|| text("merchantSubscriptionId")),
        transaction_id: text("transactionId"),
        merchant_transaction_id: text("merchantTransactionId"),
        status,
        code: notification.code.clone(),
        amount_minor: data.and_then(|d| d.get("amount")).and_then(Value::as_i64),
        reason,
        received_at,
    }
}

/// Verify, decode and record one notification.
///
/// The signature claim comes from the envelope's `xVerify`, falling back to the
/// `X-VERIFY` request header. A missing payload is a validation error and a bad
/// claim is a signature error; everything after verification yields an ack.
pub async fn handle_webhook(
    validator: &dyn WebhookValidator,
    sink: &dyn EventSink,
    envelope: WebhookEnvelope,
    header_claim: Option<&str>,
    received_at: DateTime<Utc>,
) -> Result<WebhookAck, Error> {
    let Some(payload) = envelope.response.filter(|r| !r.is_empty()) else {
        warn!("Webhook rejected: missing response data");
        return Err(validation_error("Missing response data"));
    };

    let claim = envelope
        .x_verify
        .as_deref()
        .or(header_claim)
        .ok_or_else(|| webhook_error(WebhookErrorKind::MissingSignature, "No X-VERIFY claim"))?;

    if !validator.validate(&payload, claim)? {
        return Err(webhook_error(WebhookErrorKind::InvalidSignature, "Invalid signature").into());
    }

    let notification: Notification = match envelope::decode(&payload) {
        Ok(notification) => notification,
        Err(err) => {
            warn!("Verified webhook payload could not be decoded: {err:?}");
            return Ok(WebhookAck::failed(&err));
        }
    };

    debug!("Webhook notification received with code {}", notification.code);
    let event = dispatch(&notification, received_at);
    if event.status == EventStatus::Unrecognized {
        info!("Unrecognized webhook event code: {}", notification.code);
    }

    match sink.record(event).await {
        Ok(()) => Ok(WebhookAck::accepted()),
        Err(err) => {
            error!("Failed to record webhook event: {err:?}");
            Ok(WebhookAck::failed(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use gateway_auth::credentials::Credentials;
    use gateway_auth::webhook::XVerifyWebhookValidator;
    use serde_json::json;
    use std::sync::Mutex;

    const SECRET: &str = "secret";

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<SubscriptionEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn record(&self, event: SubscriptionEvent) -> Result<(), Error> {
            if self.fail {
                return Err(crate::error::Error {
                    source: None,
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                        "store unavailable".to_string(),
                    )),
                });
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn validator() -> XVerifyWebhookValidator {
        let credentials = Credentials::from_parts(
            Some("MERCHANT".to_string()),
            Some("client-id".to_string()),
            Some(SECRET.to_string()),
            None,
            1,
        )
        .unwrap();
        XVerifyWebhookValidator::from_credentials(&credentials)
    }

    fn signed(notification: Value) -> WebhookEnvelope {
        let response = STANDARD.encode(notification.to_string());
        let x_verify = format!("{}###1", validator().expected_digest(&response));
        WebhookEnvelope {
            response: Some(response),
            x_verify: Some(x_verify),
        }
    }

    fn payment_success() -> Value {
        json!({
            "code": "PAYMENT_SUCCESS",
            "message": "Your payment is successful.",
            "data": {
                "transactionId": "T123",
                "merchantTransactionId": "REC1",
                "subscriptionId": "MS1",
                "amount": 10000
            }
        })
    }

    #[tokio::test]
    async fn test_valid_notification_is_recorded() {
        let sink = RecordingSink::default();
        let ack = handle_webhook(&validator(), &sink, signed(payment_success()), None, Utc::now())
            .await
            .unwrap();

        assert_eq!(ack, WebhookAck::accepted());
        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, EventStatus::PaymentSucceeded);
        assert_eq!(events[0].entity_id.as_deref(), Some("MS1"));
        assert_eq!(events[0].amount_minor, Some(10000));
    }

    #[tokio::test]
    async fn test_tampered_payload_is_rejected_before_decoding() {
        let sink = RecordingSink::default();
        let mut envelope = signed(payment_success());
        let mut payload = envelope.response.take().unwrap();
        let last = if payload.ends_with('A') { "B" } else { "A" };
        payload.replace_range(payload.len() - 1.., last);
        envelope.response = Some(payload);

        let err = handle_webhook(&validator(), &sink, envelope, None, Utc::now())
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Signature)
        );
        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_response_is_validation_error() {
        let err = handle_webhook(
            &validator(),
            &LoggingEventSink,
            WebhookEnvelope::default(),
            None,
            Utc::now(),
        )
        .await
        .unwrap_err();

        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_claim_falls_back_to_header() {
        let mut envelope = signed(payment_success());
        let claim = envelope.x_verify.take().unwrap();

        let ack = handle_webhook(
            &validator(),
            &LoggingEventSink,
            envelope.clone(),
            Some(&claim),
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(ack.success);

        let err = handle_webhook(&validator(), &LoggingEventSink, envelope, None, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Signature)
        );
    }

    #[tokio::test]
    async fn test_unrecognized_code_is_still_acknowledged() {
        let sink = RecordingSink::default();
        let ack = handle_webhook(
            &validator(),
            &sink,
            signed(json!({"code": "MANDATE_REVOKED_SOMEHOW", "data": {}})),
            None,
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(ack.success);
        assert_eq!(
            sink.events.lock().unwrap()[0].status,
            EventStatus::Unrecognized
        );
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_acknowledged_with_error() {
        let response = STANDARD.encode("not json");
        let x_verify = format!("{}###1", validator().expected_digest(&response));
        let envelope = WebhookEnvelope {
            response: Some(response),
            x_verify: Some(x_verify),
        };

        let ack = handle_webhook(&validator(), &LoggingEventSink, envelope, None, Utc::now())
            .await
            .unwrap();

        assert!(!ack.success);
        assert!(ack.error.is_some());
    }

    #[tokio::test]
    async fn test_sink_failure_is_acknowledged_with_error() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let ack = handle_webhook(&validator(), &sink, signed(payment_success()), None, Utc::now())
            .await
            .unwrap();

        assert!(!ack.success);
        assert!(ack.error.unwrap().contains("store unavailable"));
    }

    #[test]
    fn test_dispatch_failed_payment_carries_reason() {
        let notification = Notification {
            code: "PAYMENT_DECLINED".to_string(),
            message: Some("Declined by bank".to_string()),
            data: Some(json!({"subscriptionId": "MS9", "transactionId": "T9"})),
        };
        let event = dispatch(&notification, Utc::now());

        assert_eq!(event.status, EventStatus::PaymentFailed);
        assert_eq!(event.reason.as_deref(), Some("Declined by bank"));
        assert_eq!(event.transaction_id.as_deref(), Some("T9"));
        assert_eq!(event.amount_minor, None);
    }
}
