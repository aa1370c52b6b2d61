//! HMAC-SHA256 signatures for deposit callbacks.
//!
//! The signature is the lowercase hex HMAC-SHA256 of `{transaction_id}:{status}:{reference_id}`
//! keyed with the configured callback secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign a callback payload. Returns lowercase hex.
pub fn sign_callback(payload: &str, secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature against `payload`. Comparison is constant-time.
pub fn verify_callback(payload: &str, signature: &str, secret: &str) -> bool {
    let Ok(signature) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let payload = "9f0c1d2e-0000-4000-8000-000000000000:success:VNP123";
        let signature = sign_callback(payload, "gateway-secret").unwrap();

        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(verify_callback(payload, &signature, "gateway-secret"));
        assert!(verify_callback(payload, &signature.to_uppercase(), "gateway-secret"));
    }

    #[test]
    fn test_rejects_tampering() {
        let payload = "id:success:ref";
        let signature = sign_callback(payload, "gateway-secret").unwrap();

        assert!(!verify_callback("id:failed:ref", &signature, "gateway-secret"));
        assert!(!verify_callback(payload, &signature, "other-secret"));
        assert!(!verify_callback(payload, "not-hex", "gateway-secret"));
        assert!(!verify_callback(payload, "", "gateway-secret"));
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        let signature = sign_callback("what do ya want for nothing?", "Jefe").unwrap();
        assert_eq!(signature, "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843");
    }
}
