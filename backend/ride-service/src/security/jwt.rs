/// HS256 bearer tokens carrying the user id and e-mail
use crate::error::Result;
use crate::models::UserId;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    /// E-mail of the account
    pub sub: String,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: UserId, email: &str) -> Result<String> {
        let claims = Claims {
            id: user_id,
            sub: email.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new("test-secret", 120);
        let token = issuer.issue(42, "driver@mail.com").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.sub, "driver@mail.com");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenIssuer::new("one", 120).issue(1, "a@b.c").unwrap();
        let result = TokenIssuer::new("two", 120).verify(&token);
        assert!(matches!(result, Err(AppError::Token(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Well past the default 60s leeway
        let token = TokenIssuer::new("secret", -10).issue(1, "a@b.c").unwrap();
        assert!(TokenIssuer::new("secret", 120).verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = TokenIssuer::new("secret", 120);
        assert!(issuer.verify("not-a-token").is_err());
    }
}
