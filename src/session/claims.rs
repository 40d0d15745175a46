use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried in the payload segment of a JWT bearer token
///
/// The signature is not verified; this is for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject, the account email for this service
    pub sub: Option<String>,

    /// Expiry as seconds since the Unix epoch
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode the claims of a `header.payload.signature` token
    ///
    /// Returns `None` for opaque (non-JWT) tokens.
    pub fn decode(token: &str) -> Option<Self> {
        let mut segments = token.split('.');
        let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() {
            return None;
        }

        // Some issuers keep the padding
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// Tokens without an `exp` claim never expire
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map(|at| at <= now).unwrap_or(false)
    }
}

/// Shorten a token for log output
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{}… ({} chars)", prefix, token.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_jwt_claims() {
        let token = make_token(r#"{"sub":"learner@example.com","exp":1700000000}"#);
        let claims = TokenClaims::decode(&token).unwrap();

        assert_eq!(claims.sub.as_deref(), Some("learner@example.com"));
        assert_eq!(claims.exp, Some(1_700_000_000));
        assert_eq!(
            claims.expires_at().unwrap().to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
    }

    #[test]
    fn test_expiry_check() {
        let claims = TokenClaims {
            sub: None,
            exp: Some(1_000),
        };
        let before = Utc.timestamp_opt(999, 0).unwrap();
        let after = Utc.timestamp_opt(1_001, 0).unwrap();

        assert!(!claims.is_expired(before));
        assert!(claims.is_expired(after));

        let no_exp = TokenClaims { sub: None, exp: None };
        assert!(!no_exp.is_expired(after));
    }

    #[test]
    fn test_opaque_token_has_no_claims() {
        assert_eq!(TokenClaims::decode("plain-opaque-token"), None);
        assert_eq!(TokenClaims::decode("a.b"), None);
        assert_eq!(TokenClaims::decode("a.!!!.c"), None);
    }

    #[test]
    fn test_redact_keeps_prefix_only() {
        assert_eq!(redact("abcdefghijkl"), "abcdef… (12 chars)");
    }
}
