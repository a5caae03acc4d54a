//! Deploy webhook signature verification.
//!
//! Signatures use the `X-Hub-Signature-256` format: `sha256=` followed by the
//! hex HMAC-SHA256 of the raw request body under the shared secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const PREFIX: &str = "sha256=";

/// Check `signature` against the body. Comparison is constant time.
///
/// An empty secret, a missing prefix or non-hex digest never verifies.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Some(digest_hex) = signature.strip_prefix(PREFIX) else {
        return false;
    };
    let Ok(digest) = hex::decode(digest_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&digest).is_ok()
}

/// Constant-time equality for bearer tokens.
///
/// Both sides are run through HMAC under a fixed key so the comparison
/// does not leak the expected token's length.
pub fn tokens_match(expected: &str, provided: &str) -> bool {
    let digest = |value: &str| {
        let mut mac = HmacSha256::new_from_slice(b"quire-admin-token").ok()?;
        mac.update(value.as_bytes());
        Some(mac)
    };
    let (Some(expected), Some(provided)) = (digest(expected), digest(provided)) else {
        return false;
    };
    provided.verify_slice(&expected.finalize().into_bytes()).is_ok()
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("{PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"ref":"refs/heads/main"}"#;

    #[test]
    fn test_round_trip_verifies() {
        let sig = sign("hook-secret", BODY);
        assert!(verify_signature("hook-secret", BODY, &sig));
    }

    #[test]
    fn test_single_byte_mutations_rejected() {
        let sig = sign("hook-secret", BODY);

        let mut body = BODY.to_vec();
        body[3] ^= 0x01;
        assert!(!verify_signature("hook-secret", &body, &sig));

        let mut tampered = sig.clone().into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'0' { b'1' } else { b'0' };
        assert!(!verify_signature("hook-secret", BODY, std::str::from_utf8(&tampered).unwrap()));

        assert!(!verify_signature("hook-secreT", BODY, &sig));
    }

    #[test]
    fn test_prefix_required() {
        let sig = sign("hook-secret", BODY);
        let bare = sig.trim_start_matches(PREFIX);
        assert!(!verify_signature("hook-secret", BODY, bare));
        assert!(!verify_signature("hook-secret", BODY, &format!("sha1={bare}")));
    }

    #[test]
    fn test_empty_secret_never_verifies() {
        let sig = sign("", BODY);
        assert!(!verify_signature("", BODY, &sig));
    }

    #[test]
    fn test_garbage_signature() {
        assert!(!verify_signature("s", BODY, "sha256=not-hex"));
        assert!(!verify_signature("s", BODY, "sha256="));
        assert!(!verify_signature("s", BODY, ""));
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("admin-key", "admin-key"));
        assert!(!tokens_match("admin-key", "admin-kez"));
        assert!(!tokens_match("admin-key", ""));
    }
}
