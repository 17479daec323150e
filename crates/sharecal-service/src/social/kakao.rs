//! Kakao access-token verification via the user profile endpoint.

use serde::Deserialize;

use sharecal_db::db::enums::SocialProvider;

use super::{SocialProfile, SocialVerifier, provider_error};
use crate::error::{ServiceError, ServiceResult};

const USER_ME_URL: &str = "https://kapi.kakao.com/v2/user/me";

pub struct KakaoVerifier {
    client: reqwest::Client,
}

impl KakaoVerifier {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct UserMe {
    id: i64,
    #[serde(default)]
    kakao_account: KakaoAccount,
}

#[derive(Debug, Default, Deserialize)]
struct KakaoAccount {
    email: Option<String>,
    #[serde(default)]
    is_email_verified: bool,
    #[serde(default)]
    profile: KakaoProfile,
}

#[derive(Debug, Default, Deserialize)]
struct KakaoProfile {
    nickname: Option<String>,
    profile_image_url: Option<String>,
}

/// ## Summary
/// Extracts the profile from a `/v2/user/me` payload.
///
/// ## Errors
/// Returns `AuthenticationError` when the payload has no numeric `id`.
pub fn parse_user_me(payload: serde_json::Value) -> ServiceResult<SocialProfile> {
    let me: UserMe = serde_json::from_value(payload.clone())
        .map_err(|e| ServiceError::AuthenticationError(format!("Invalid kakao token: {e}")))?;

    let account = me.kakao_account;
    Ok(SocialProfile {
        social_id: me.id.to_string(),
        email: account.email.map(|e| e.trim().to_lowercase()),
        email_verified: account.is_email_verified,
        first_name: account.profile.nickname.unwrap_or_default(),
        last_name: String::new(),
        avatar_url: account.profile.profile_image_url.filter(|p| !p.is_empty()),
        extra: payload,
    })
}

#[salvo::async_trait]
impl SocialVerifier for KakaoVerifier {
    #[tracing::instrument(skip(self, token))]
    async fn verify(&self, token: &str) -> ServiceResult<SocialProfile> {
        let payload = self
            .client
            .get(USER_ME_URL)
            .bearer_auth(token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| provider_error(SocialProvider::Kakao, &e))?
            .json::<serde_json::Value>()
            .await
            .map_err(|e| provider_error(SocialProvider::Kakao, &e))?;

        parse_user_me(payload)
    }
}
