//! Where to send the customer's browser after the gateway hands it back.

use log::*;
use serde::Deserialize;
use serde_json::Value;
use urlencoding::encode;

use crate::error::{validation_error, Error};
use crate::gateway::autopay::envelope;

#[derive(Debug, Deserialize)]
struct CallbackPayload {
    #[serde(default)]
    code: String,
    message: Option<String>,
    data: Option<Value>,
}

/// Map a base64 callback payload onto a local page.
///
/// Success codes go to `/success`, payment failures to `/failure` with the gateway
/// message as reason, and anything else to `/pending` with the raw code.
pub fn redirect_location(response: Option<&str>) -> Result<String, Error> {
    let response = response
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| validation_error("Missing response data"))?;
    let payload: CallbackPayload = envelope::decode(response)?;

    let location = match payload.code.as_str() {
        "SUCCESS" | "PAYMENT_SUCCESS" => {
            let subscription_id = payload
                .data
                .as_ref()
                .and_then(|d| d.get("subscriptionId"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            info!("Callback reports success for subscription {}", subscription_id);
            format!("/success?subscriptionId={}", encode(subscription_id))
        }
        "PAYMENT_ERROR" | "PAYMENT_DECLINED" => {
            let reason = payload.message.unwrap_or_default();
            warn!("Callback reports failed payment: {}", reason);
            format!("/failure?reason={}", encode(&reason))
        }
        code => {
            debug!("Callback reports pending or other state: {}", code);
            format!("/pending?status={}", encode(code))
        }
    };
    Ok(location)
}
