//! Signed reviewer cookie
//!
//! The astrologer name from the last submission is remembered in a cookie so
//! the review form can prefill it. The cookie value is
//! `<hex(name)>.<sha256(name + ":" + secret)>`; a value whose signature does
//! not match the configured secret is treated as absent.

use sha2::{Digest, Sha256};

/// Cookie name carrying the signed reviewer name
pub const REVIEWER_COOKIE: &str = "mira_reviewer";

/// Calculate the signature of a reviewer name
///
/// # Examples
///
/// ```
/// use mira_common::reviewer::calculate_signature;
///
/// let sig = calculate_signature("Asha", "secret");
/// assert_eq!(sig.len(), 64);
/// assert_ne!(sig, calculate_signature("Asha", "other-secret"));
/// ```
pub fn calculate_signature(name: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b":");
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Produce the cookie value for a reviewer name
pub fn sign_reviewer(name: &str, secret: &str) -> String {
    format!("{}.{}", hex::encode(name), calculate_signature(name, secret))
}

/// Recover the reviewer name from a cookie value, or `None` if it was tampered with
pub fn verify_reviewer(value: &str, secret: &str) -> Option<String> {
    let (encoded, signature) = value.split_once('.')?;
    let name = String::from_utf8(hex::decode(encoded).ok()?).ok()?;
    if name.is_empty() || calculate_signature(&name, secret) != signature {
        return None;
    }
    Some(name)
}

/// Find the reviewer cookie in a `Cookie` request header
pub fn reviewer_from_cookie_header(header: &str, secret: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == REVIEWER_COOKIE)
        .and_then(|(_, value)| verify_reviewer(value, secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let cookie = sign_reviewer("Pandit Ravi Shankar", "k");
        assert_eq!(verify_reviewer(&cookie, "k").as_deref(), Some("Pandit Ravi Shankar"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let cookie = sign_reviewer("Ravi", "k");
        assert_eq!(verify_reviewer(&cookie, "other"), None);
    }

    #[test]
    fn test_tampered_name_rejected() {
        let cookie = sign_reviewer("Ravi", "k");
        let (_, sig) = cookie.split_once('.').unwrap();
        let forged = format!("{}.{}", hex::encode("Mallory"), sig);
        assert_eq!(verify_reviewer(&forged, "k"), None);
    }

    #[test]
    fn test_malformed_values_rejected() {
        assert_eq!(verify_reviewer("", "k"), None);
        assert_eq!(verify_reviewer("zz.abc", "k"), None);
        assert_eq!(verify_reviewer("abc", "k"), None);
        assert_eq!(verify_reviewer("abc.def", "k"), None);
    }

    #[test]
    fn test_non_ascii_name() {
        let cookie = sign_reviewer("ज्योतिषी", "k");
        assert_eq!(verify_reviewer(&cookie, "k").as_deref(), Some("ज्योतिषी"));
    }

    #[test]
    fn test_cookie_header_lookup() {
        let cookie = sign_reviewer("Asha", "k");
        let header = format!("theme=dark; {}={}; other=1", REVIEWER_COOKIE, cookie);
        assert_eq!(reviewer_from_cookie_header(&header, "k").as_deref(), Some("Asha"));
        assert_eq!(reviewer_from_cookie_header("theme=dark", "k"), None);
    }
}
