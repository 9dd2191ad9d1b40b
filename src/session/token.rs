use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionTokenHeader {
    pub alg: String,
    pub typ: String,
}

impl SessionTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims carried by a session token: the bound user id plus issue/expiry
/// timestamps (unix seconds).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Create an HS256 signed session token (JWT).
///
/// # Errors
///
/// Returns an error if claims/header JSON cannot be encoded or the MAC cannot
/// be keyed.
pub fn sign_hs256(secret: &[u8], claims: &SessionClaims) -> Result<String, Error> {
    let header = SessionTokenHeader::hs256();
    let header_b64 = b64e_json(&header)?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::Key)?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = Base64UrlUnpadded::encode_string(&signature);

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify an HS256 session token and return its claims.
///
/// `now` is the unix timestamp the expiry is checked against.
///
/// # Errors
///
/// Returns an error if the token is malformed, signed with another algorithm
/// or key, or expired.
pub fn verify_hs256(secret: &[u8], token: &str, now: i64) -> Result<SessionClaims, Error> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(Error::TokenFormat);
    };

    let header: SessionTokenHeader = b64d_json(header_b64)?;
    if header.alg != "HS256" {
        return Err(Error::UnsupportedAlg(header.alg));
    }

    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature = Base64UrlUnpadded::decode_vec(signature_b64).map_err(|_| Error::Base64)?;

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::Key)?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| Error::InvalidSignature)?;

    let claims: SessionClaims = b64d_json(claims_b64)?;
    if claims.exp <= now {
        return Err(Error::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"secretTesting";

    fn claims_at(now: i64) -> SessionClaims {
        SessionClaims {
            user_id: "5d81b2ba-6f0b-44f3-a5d8-3e1fdfdbf2ea".to_string(),
            iat: now,
            exp: now + 10,
        }
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let now = 1_700_000_000;
        let claims = claims_at(now);
        let token = sign_hs256(SECRET, &claims).expect("sign");

        let decoded = verify_hs256(SECRET, &token, now).expect("verify");
        assert_eq!(decoded, claims);
        assert_eq!(decoded.exp - decoded.iat, 10);
    }

    #[test]
    fn test_claims_wire_field_is_user_id() {
        let json = serde_json::to_string(&claims_at(0)).expect("encode");
        assert!(json.contains("\"userId\""));
        assert!(!json.contains("user_id"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = 1_700_000_000;
        let token = sign_hs256(SECRET, &claims_at(now)).expect("sign");

        // Expiry is exclusive: a token is dead at exactly `exp`.
        assert!(matches!(
            verify_hs256(SECRET, &token, now + 10),
            Err(Error::Expired)
        ));
        assert!(verify_hs256(SECRET, &token, now + 9).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = 1_700_000_000;
        let token = sign_hs256(SECRET, &claims_at(now)).expect("sign");

        assert!(matches!(
            verify_hs256(b"otherSecret", &token, now),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let now = 1_700_000_000;
        let token = sign_hs256(SECRET, &claims_at(now)).expect("sign");
        let mut segments: Vec<&str> = token.split('.').collect();

        let mut forged = claims_at(now);
        forged.user_id = "someone-else".to_string();
        let forged_b64 = b64e_json(&forged).expect("encode");
        segments[1] = &forged_b64;
        let forged_token = segments.join(".");

        assert!(matches!(
            verify_hs256(SECRET, &forged_token, now),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert!(matches!(
            verify_hs256(SECRET, "definitely-not-a-jwt", 0),
            Err(Error::TokenFormat)
        ));
        assert!(matches!(
            verify_hs256(SECRET, "a.b.c.d", 0),
            Err(Error::TokenFormat)
        ));
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let now = 1_700_000_000;
        let header = SessionTokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        };
        let token = format!(
            "{}.{}.",
            b64e_json(&header).expect("encode"),
            b64e_json(&claims_at(now)).expect("encode")
        );

        assert!(matches!(
            verify_hs256(SECRET, &token, now),
            Err(Error::UnsupportedAlg(alg)) if alg == "none"
        ));
    }
}
