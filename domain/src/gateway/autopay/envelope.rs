//! Base64 JSON envelopes used by signed calls, notifications and redirects.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{decode_error, DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};

/// Body of every signed POST: `{"request": "<base64 JSON>"}`.
#[derive(Debug, Serialize)]
pub struct SignedEnvelope {
    pub request: String,
}

/// Serialize `payload` to JSON and base64-encode it.
pub fn encode<T: Serialize>(payload: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(payload).map_err(|err| Error {
        source: Some(Box::new(err)),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
            "Failed to serialize gateway payload".to_string(),
        )),
    })?;
    Ok(STANDARD.encode(json))
}

/// Base64-decode `encoded` and parse the JSON inside it.
pub fn decode<T: DeserializeOwned>(encoded: &str) -> Result<T, Error> {
    let bytes = STANDARD.decode(encoded.trim())?;
    serde_json::from_slice(&bytes).map_err(decode_error)
}

/// When a signed response carries a base64 `response` field, attach its decoded
/// JSON as `decoded` alongside the original fields.
pub fn attach_decoded(mut body: Value) -> Result<Value, Error> {
    let Some(encoded) = body.get("response").and_then(Value::as_str) else {
        return Ok(body);
    };

    let decoded: Value = decode(encoded).map_err(|err| {
        warn!("Gateway returned an undecodable response field: {err:?}");
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::External(ExternalErrorKind::InvalidResponse),
        }
    })?;

    if let Value::Object(fields) = &mut body {
        fields.insert("decoded".to_string(), decoded);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_then_decode_preserves_payload() {
        let payload = json!({"merchantId": "MERCHANT", "amount": 10000});
        let encoded = encode(&payload).unwrap();

        assert_eq!(decode::<Value>(&encoded).unwrap(), payload);
    }

    #[test]
    fn test_encode_is_standard_base64_of_compact_json() {
        assert_eq!(encode(&json!({"a": 1})).unwrap(), "eyJhIjoxfQ==");
    }

    #[test]
    fn test_decode_rejects_bad_base64_and_bad_json() {
        let err = decode::<Value>("not base64!").unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Decode)
        );

        let not_json = STANDARD.encode("plain text");
        let err = decode::<Value>(&not_json).unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Decode)
        );
    }

    #[test]
    fn test_attach_decoded_adds_field() {
        let inner = STANDARD.encode(r#"{"code":"SUCCESS"}"#);
        let body = attach_decoded(json!({"success": true, "response": inner})).unwrap();

        assert_eq!(body["decoded"]["code"], "SUCCESS");
        assert_eq!(body["success"], true);
    }

    #[test]
    fn test_attach_decoded_leaves_plain_body_alone() {
        let body = json!({"success": true});
        assert_eq!(attach_decoded(body.clone()).unwrap(), body);
    }

    #[test]
    fn test_attach_decoded_flags_corrupt_field_as_invalid_response() {
        let err = attach_decoded(json!({"response": "%%%"})).unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::InvalidResponse)
        );
    }
}
