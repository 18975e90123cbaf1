//! Inbound interactivity requests: signature check and payload decoding.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::types::InteractionPayload;
use crate::{Result, SlackError};

/// Requests older (or newer) than this are refused as possible replays.
pub const MAX_CLOCK_SKEW_SECS: i64 = 60 * 5;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

type HmacSha256 = Hmac<Sha256>;

/// Check `X-Slack-Signature` against the raw request body.
///
/// `signature` is `v0=<hex hmac>` over `v0:{timestamp}:{body}`; `now` is the
/// current unix time in seconds.
pub fn verify_signature(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now: i64,
) -> Result<()> {
    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SlackError::Signature(format!("bad timestamp '{timestamp}'")))?;
    if now.abs_diff(ts) > MAX_CLOCK_SKEW_SECS.unsigned_abs() {
        return Err(SlackError::Signature("timestamp outside allowed window".into()));
    }

    let hex_sig = signature
        .strip_prefix("v0=")
        .ok_or_else(|| SlackError::Signature("unsupported signature version".into()))?;
    let expected =
        hex::decode(hex_sig).map_err(|_| SlackError::Signature("signature is not hex".into()))?;

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|e| SlackError::Signature(e.to_string()))?;
    mac.update(b"v0:");
    mac.update(timestamp.trim().as_bytes());
    mac.update(b":");
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SlackError::Signature("signature mismatch".into()))
}

/// Compute the `v0=` signature for a body. Useful to callers that need to
/// sign test traffic.
pub fn sign(signing_secret: &str, timestamp: i64, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|e| SlackError::Signature(e.to_string()))?;
    mac.update(format!("v0:{timestamp}:").as_bytes());
    mac.update(body);
    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

#[derive(Deserialize)]
struct Form {
    payload: String,
}

/// Decode an `application/x-www-form-urlencoded` body with a JSON `payload`
/// field.
pub fn parse_form(body: &[u8]) -> Result<InteractionPayload> {
    let form: Form =
        serde_urlencoded::from_bytes(body).map_err(|e| SlackError::Payload(e.to_string()))?;
    Ok(serde_json::from_str(&form.payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

    #[test]
    fn signed_body_verifies() {
        let body = b"payload=%7B%7D";
        let sig = sign(SECRET, 1_531_420_618, body).unwrap();
        verify_signature(SECRET, "1531420618", body, &sig, 1_531_420_618 + 10).unwrap();
    }

    #[test]
    fn tampered_body_fails() {
        let sig = sign(SECRET, 1_000, b"payload=a").unwrap();
        let err = verify_signature(SECRET, "1000", b"payload=b", &sig, 1_000).unwrap_err();
        assert!(matches!(err, SlackError::Signature(_)));
    }

    #[test]
    fn stale_timestamp_fails() {
        let sig = sign(SECRET, 1_000, b"x").unwrap();
        let err =
            verify_signature(SECRET, "1000", b"x", &sig, 1_000 + MAX_CLOCK_SKEW_SECS + 1).unwrap_err();
        assert!(matches!(err, SlackError::Signature(_)));
    }

    #[test]
    fn extreme_timestamps_are_outside_window() {
        for ts in [i64::MIN, i64::MAX] {
            let err =
                verify_signature(SECRET, &ts.to_string(), b"x", "v0=00", 1_700_000_000).unwrap_err();
            assert!(matches!(err, SlackError::Signature(_)), "{ts}");
        }
    }

    #[test]
    fn malformed_signature_fails() {
        for sig in ["v1=abcd", "v0=not-hex", "abcd"] {
            let err = verify_signature(SECRET, "1000", b"x", sig, 1_000).unwrap_err();
            assert!(matches!(err, SlackError::Signature(_)), "{sig}");
        }
    }

    #[test]
    fn parse_form_block_actions() {
        let json = r#"{
            "type": "block_actions",
            "user": {"id": "U1", "username": "alice"},
            "channel": {"id": "C1", "name": "deploys"},
            "response_url": "https://hooks.slack.com/actions/T/1/x",
            "actions": [{"action_id": "approve", "value": "{\"org_id\":\"o\",\"approval_id\":\"a\"}", "type": "button"}]
        }"#;
        let body = serde_urlencoded::to_string([("payload", json)]).unwrap();
        let payload = parse_form(body.as_bytes()).unwrap();
        assert!(payload.is_block_actions());
        assert_eq!(payload.user_name(), Some("alice"));
        assert_eq!(payload.actions.len(), 1);
        assert_eq!(payload.actions[0].action_id, "approve");
        assert!(payload.actions[0].value.as_deref().unwrap().contains("approval_id"));
    }

    #[test]
    fn parse_form_without_payload_field() {
        let err = parse_form(b"other=1").unwrap_err();
        assert!(matches!(err, SlackError::Payload(_)));
    }
}
