//! Google ID-token verification via the `tokeninfo` endpoint.

use serde::Deserialize;

use sharecal_db::db::enums::SocialProvider;

use super::{SocialProfile, SocialVerifier, provider_error};
use crate::error::{ServiceError, ServiceResult};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

pub struct GoogleVerifier {
    client: reqwest::Client,
    client_id: Option<String>,
}

impl GoogleVerifier {
    #[must_use]
    pub fn new(client: reqwest::Client, client_id: Option<String>) -> Self {
        Self { client, client_id }
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    iss: String,
    aud: Option<String>,
    email: Option<String>,
    // tokeninfo reports booleans as strings
    email_verified: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

/// ## Summary
/// Validates a `tokeninfo` payload and extracts the profile.
///
/// ## Errors
/// Returns `AuthenticationError` on a malformed payload, an unknown issuer, or
/// an audience mismatch when `client_id` is set.
pub fn parse_token_info(
    payload: serde_json::Value,
    client_id: Option<&str>,
) -> ServiceResult<SocialProfile> {
    let info: TokenInfo = serde_json::from_value(payload.clone())
        .map_err(|e| ServiceError::AuthenticationError(format!("Invalid google token: {e}")))?;

    if !ISSUERS.contains(&info.iss.as_str()) {
        return Err(ServiceError::AuthenticationError(
            "Wrong token issuer".to_string(),
        ));
    }
    if let Some(expected) = client_id
        && info.aud.as_deref() != Some(expected)
    {
        return Err(ServiceError::AuthenticationError(
            "Token was issued for another client".to_string(),
        ));
    }

    Ok(SocialProfile {
        social_id: info.sub,
        email: info.email.map(|e| e.trim().to_lowercase()),
        email_verified: info.email_verified.as_deref() == Some("true"),
        first_name: info.given_name.unwrap_or_default(),
        last_name: info.family_name.unwrap_or_default(),
        avatar_url: info.picture.filter(|p| !p.is_empty()),
        extra: payload,
    })
}

fn tokeninfo_url(token: &str) -> ServiceResult<reqwest::Url> {
    reqwest::Url::parse_with_params(TOKENINFO_URL, &[("id_token", token)])
        .map_err(|e| ServiceError::InvalidConfiguration(format!("tokeninfo URL: {e}")))
}

#[salvo::async_trait]
impl SocialVerifier for GoogleVerifier {
    #[tracing::instrument(skip(self, token))]
    async fn verify(&self, token: &str) -> ServiceResult<SocialProfile> {
        let payload = self
            .client
            .get(tokeninfo_url(token)?)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| provider_error(SocialProvider::Google, &e))?
            .json::<serde_json::Value>()
            .await
            .map_err(|e| provider_error(SocialProvider::Google, &e))?;

        parse_token_info(payload, self.client_id.as_deref())
    }
}
