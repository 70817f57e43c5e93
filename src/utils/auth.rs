use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UploadClaims {
    #[serde(default)]
    pub sub: Option<Value>, // user_id, string or numeric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<usize>,
}

impl UploadClaims {
    /// Subject claim rendered as text. `null` and `""` count as missing,
    /// numeric identifiers are accepted as-is.
    pub fn subject(&self) -> Option<String> {
        match self.sub.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

pub fn create_upload_token(user_id: &str, secret: &str, ttl: Duration) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?
        .timestamp();

    let claims = UploadClaims {
        sub: Some(Value::from(user_id)),
        exp: Some(expiration as usize),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

/// Verifies an HMAC-signed upload token. Tokens signed with any other algorithm
/// family are rejected, expiry is enforced when present.
pub fn validate_upload_token(token: &str, secret: &str) -> Result<UploadClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.required_spec_claims.clear();
    validation.validate_aud = false; // Tokens are minted by the auth provider with its own audience

    let token_data = decode::<UploadClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_cycle() {
        let secret = "test_secret";
        let token = create_upload_token("user_123", secret, Duration::hours(1)).unwrap();
        let claims = validate_upload_token(&token, secret).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("user_123"));
    }

    #[test]
    fn test_wrong_secret() {
        let token = create_upload_token("user_123", "a", Duration::hours(1)).unwrap();
        assert!(validate_upload_token(&token, "b").is_err());
    }

    #[test]
    fn test_expired_token() {
        let token = create_upload_token("user_123", "s", Duration::hours(-2)).unwrap();
        assert!(validate_upload_token(&token, "s").is_err());
    }

    #[test]
    fn test_hs512_and_missing_exp_accepted() {
        let claims = UploadClaims {
            sub: Some(Value::from("u")),
            exp: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"s"),
        )
        .unwrap();
        let decoded = validate_upload_token(&token, "s").unwrap();
        assert_eq!(decoded.subject().as_deref(), Some("u"));
    }

    #[test]
    fn test_empty_subject() {
        for sub in [Value::from(""), Value::Null] {
            let claims = UploadClaims {
                sub: Some(sub),
                exp: None,
            };
            assert_eq!(claims.subject(), None);
        }
    }

    #[test]
    fn test_numeric_subject() {
        let claims: UploadClaims = serde_json::from_str(r#"{"sub": 12345}"#).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("12345"));
    }
}
