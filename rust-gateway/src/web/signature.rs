//! Webhook signature verification.
//!
//! Signal senders sign the raw request body with HMAC-SHA256 under the shared
//! `ALPHAGATE_HMAC_SECRET` and send the hex digest in `X-Hub-Signature`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded body signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// Compute the hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign_body(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("webhook_signing_invalid_key");
            return None;
        }
    };
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a webhook body signature.
///
/// Returns `true` only when `signature` is the hex HMAC-SHA256 of `body`
/// under `secret`. An absent, empty, non-hex or mismatching signature all
/// produce the same `false`, and the digest comparison is constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: Option<&str>) -> bool {
    let signature = signature.map(str::trim).unwrap_or_default();

    if secret.is_empty() || signature.is_empty() {
        warn!(
            has_signature = !signature.is_empty(),
            body_length = body.len(),
            "webhook_signature_missing"
        );
        return false;
    }

    let provided = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!(signature_length = signature.len(), "webhook_signature_malformed");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("webhook_signature_invalid_key");
            return false;
        }
    };
    mac.update(body);

    // verify_slice compares in constant time and rejects wrong lengths
    let valid = mac.verify_slice(&provided).is_ok();

    if !valid {
        warn!(
            signature_length = signature.len(),
            body_length = body.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"signal":"buy"}"#;
    const SECRET: &str = "s3cr3t";
    const EXPECTED: &str = "55bd892dc6d96ebf48b833c93f2b85e98acbd151948dad31c1198cf08ef526a4";

    #[test]
    fn test_sign_body_known_vector() {
        assert_eq!(sign_body(SECRET, BODY).as_deref(), Some(EXPECTED));
    }

    #[test]
    fn test_verify_signature_valid() {
        assert!(verify_signature(SECRET, BODY, Some(EXPECTED)));
    }

    #[test]
    fn test_verify_signature_accepts_uppercase_hex() {
        assert!(verify_signature(SECRET, BODY, Some(&EXPECTED.to_uppercase())));
    }

    #[test]
    fn test_verify_signature_missing_or_empty() {
        assert!(!verify_signature(SECRET, BODY, None));
        assert!(!verify_signature(SECRET, BODY, Some("")));
        assert!(!verify_signature(SECRET, BODY, Some("   ")));
    }

    #[test]
    fn test_verify_signature_of_empty_string_rejected() {
        let empty_sig = sign_body(SECRET, b"").unwrap();
        assert!(!verify_signature(SECRET, BODY, Some(&empty_sig)));
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let sig = sign_body("other-secret", BODY).unwrap();
        assert!(!verify_signature(SECRET, BODY, Some(&sig)));
    }

    #[test]
    fn test_verify_signature_altered_body() {
        assert!(!verify_signature(SECRET, br#"{"signal":"sell"}"#, Some(EXPECTED)));
    }

    #[test]
    fn test_verify_signature_malformed() {
        assert!(!verify_signature(SECRET, BODY, Some("not-hex")));
        assert!(!verify_signature(SECRET, BODY, Some(&EXPECTED[..32])));
        assert!(!verify_signature(SECRET, BODY, Some(&format!("{}00", EXPECTED))));
    }

    #[test]
    fn test_verify_signature_empty_secret() {
        let sig = sign_body("", BODY).unwrap();
        assert!(!verify_signature("", BODY, Some(&sig)));
    }

    #[test]
    fn test_roundtrip_over_varied_bodies() {
        let bodies: [&[u8]; 4] = [b"", b"x", b"{\"dust\":true}", &[0u8, 255, 10, 13]];
        for body in bodies {
            let sig = sign_body("k", body).unwrap();
            assert!(verify_signature("k", body, Some(&sig)));
        }
    }
}
