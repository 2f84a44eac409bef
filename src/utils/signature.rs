// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// 负载签名
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadSignatures {
    /// HMAC-SHA1 十六进制
    pub sha1: String,
    /// HMAC-SHA256 十六进制
    pub sha256: String,
}

impl PayloadSignatures {
    /// 对请求体计算两种签名，密钥为空时返回 `None`
    pub fn compute(secret: &str, body: &[u8]) -> Option<Self> {
        if secret.is_empty() {
            return None;
        }
        Some(Self {
            sha1: sign_sha1(secret.as_bytes(), body),
            sha256: sign_sha256(secret.as_bytes(), body),
        })
    }
}

/// HMAC-SHA1 签名，返回小写十六进制
pub fn sign_sha1(secret: &[u8], body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha1::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// HMAC-SHA256 签名，返回小写十六进制
pub fn sign_sha256(secret: &[u8], body: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures_are_deterministic() {
        let first = sign_sha256(b"s3cr3t", br#"{"a":1}"#);
        let second = sign_sha256(b"s3cr3t", br#"{"a":1}"#);
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));

        let sha1 = sign_sha1(b"s3cr3t", br#"{"a":1}"#);
        assert_eq!(sha1.len(), 40);
    }

    #[test]
    fn test_one_byte_changes_both_signatures() {
        let a = PayloadSignatures::compute("s3cr3t", br#"{"a":1}"#).unwrap();
        let b = PayloadSignatures::compute("s3cr3t", br#"{"a":2}"#).unwrap();
        assert_ne!(a.sha1, b.sha1);
        assert_ne!(a.sha256, b.sha256);
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            sign_sha256(b"Jefe", b"what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_empty_secret_has_no_signature() {
        assert!(PayloadSignatures::compute("", b"body").is_none());
    }
}
