//! `X-Hub-Signature-256` verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

type HmacSha256 = Hmac<Sha256>;

/// Computes the `sha256=<hex>` signature of a raw body.
///
/// Returns `None` when no app secret is configured.
#[must_use]
pub fn sign_payload(app_secret: &str, body: &[u8]) -> Option<String> {
    if app_secret.is_empty() {
        return None;
    }
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Verifies a raw body against the signature header value.
///
/// Comparison is constant-time.
#[must_use]
pub fn verify_signature(app_secret: &str, signature_header: Option<&str>, body: &[u8]) -> bool {
    if app_secret.is_empty() {
        return false;
    }
    let signature = signature_header.unwrap_or("").trim();
    let Some(signature) = signature.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"object":"page","entry":[]}"#;

    #[test]
    fn test_signature_round_trip() {
        let header = sign_payload("app-secret", BODY).unwrap();
        assert!(header.starts_with("sha256="));
        assert!(verify_signature("app-secret", Some(&header), BODY));
    }

    #[test]
    fn test_signature_rejects_tampered_body() {
        let header = sign_payload("app-secret", BODY).unwrap();
        assert!(!verify_signature("app-secret", Some(&header), b"{}"));
    }

    #[test]
    fn test_signature_rejects_missing_or_malformed_header() {
        assert!(!verify_signature("app-secret", None, BODY));
        assert!(!verify_signature("app-secret", Some("sha1=abcd"), BODY));
        assert!(!verify_signature("app-secret", Some("sha256=zz"), BODY));
    }

    #[test]
    fn test_signature_requires_secret() {
        assert!(sign_payload("", BODY).is_none());
        let header = sign_payload("app-secret", BODY).unwrap();
        assert!(!verify_signature("", Some(&header), BODY));
    }
}
