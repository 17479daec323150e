//! Access and refresh tokens.
//!
//! Both are HS256 JWTs signed with `auth.jwt_secret`. A `typ` claim keeps a
//! refresh token from being accepted as an access token and vice versa. Every
//! token carries a unique `jti` so a refresh token can be revoked on logout.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use sharecal_core::config::AuthConfig;

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: uuid::Uuid,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub typ: TokenType,
}

impl Claims {
    /// Expiry as a timestamp. Falls back to the epoch for out-of-range values.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub access_expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// ## Errors
    /// Returns `InvalidConfiguration` if the secret is empty or a TTL is not positive.
    pub fn new(config: &AuthConfig) -> ServiceResult<Self> {
        if config.jwt_secret.is_empty() {
            return Err(ServiceError::InvalidConfiguration(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }
        if config.access_token_ttl_minutes <= 0 || config.refresh_token_ttl_days <= 0 {
            return Err(ServiceError::InvalidConfiguration(
                "token lifetimes must be positive".to_string(),
            ));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days),
        })
    }

    /// ## Summary
    /// Mints an access/refresh pair for a user.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if signing fails.
    pub fn issue_pair(&self, user_id: uuid::Uuid, now: DateTime<Utc>) -> ServiceResult<TokenPair> {
        let (access, access_expires_at) = self.issue(user_id, TokenType::Access, now)?;
        let (refresh, _) = self.issue(user_id, TokenType::Refresh, now)?;
        Ok(TokenPair {
            access,
            refresh,
            access_expires_at,
        })
    }

    /// ## Summary
    /// Mints a single access token.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if signing fails.
    pub fn issue_access(
        &self,
        user_id: uuid::Uuid,
        now: DateTime<Utc>,
    ) -> ServiceResult<(String, DateTime<Utc>)> {
        self.issue(user_id, TokenType::Access, now)
    }

    fn issue(
        &self,
        user_id: uuid::Uuid,
        typ: TokenType,
        now: DateTime<Utc>,
    ) -> ServiceResult<(String, DateTime<Utc>)> {
        let ttl = match typ {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let expires_at = now + ttl;
        let claims = Claims {
            sub: user_id,
            jti: uuid::Uuid::new_v4().simple().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            typ,
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::InvalidConfiguration(format!("Failed to sign token: {e}")))?;
        Ok((token, expires_at))
    }

    /// ## Summary
    /// Verifies signature, expiry and token type.
    ///
    /// ## Errors
    /// Returns `AuthenticationError` for any invalid, expired or mistyped token.
    pub fn verify(&self, token: &str, expected: TokenType) -> ServiceResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected token");
                ServiceError::AuthenticationError("Token is invalid or expired".to_string())
            })?;

        if data.claims.typ != expected {
            return Err(ServiceError::AuthenticationError(
                "Wrong token type".to_string(),
            ));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            access_token_ttl_minutes: 60,
            refresh_token_ttl_days: 7,
        })
        .unwrap()
    }

    #[test]
    fn pair_verifies_with_matching_types() {
        let issuer = issuer();
        let user_id = uuid::Uuid::now_v7();
        let pair = issuer.issue_pair(user_id, Utc::now()).unwrap();

        let access = issuer.verify(&pair.access, TokenType::Access).unwrap();
        let refresh = issuer.verify(&pair.refresh, TokenType::Refresh).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(refresh.sub, user_id);
        assert_ne!(access.jti, refresh.jti);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let issuer = issuer();
        let pair = issuer.issue_pair(uuid::Uuid::now_v7(), Utc::now()).unwrap();
        assert!(issuer.verify(&pair.refresh, TokenType::Access).is_err());
        assert!(issuer.verify(&pair.access, TokenType::Refresh).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let issuer = issuer();
        let issued = Utc::now() - Duration::hours(2);
        let (token, _) = issuer.issue_access(uuid::Uuid::now_v7(), issued).unwrap();
        assert!(matches!(
            issuer.verify(&token, TokenType::Access),
            Err(ServiceError::AuthenticationError(_))
        ));
    }

    #[test]
    fn foreign_signature_rejected() {
        let other = TokenIssuer::new(&AuthConfig {
            jwt_secret: "other-secret".to_string(),
            access_token_ttl_minutes: 60,
            refresh_token_ttl_days: 7,
        })
        .unwrap();
        let (token, _) = other.issue_access(uuid::Uuid::now_v7(), Utc::now()).unwrap();
        assert!(issuer().verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        let result = TokenIssuer::new(&AuthConfig {
            jwt_secret: String::new(),
            access_token_ttl_minutes: 60,
            refresh_token_ttl_days: 7,
        });
        assert!(matches!(result, Err(ServiceError::InvalidConfiguration(_))));
    }
}
