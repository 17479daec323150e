//! External identity verification for social login.
//!
//! A verifier exchanges a provider-issued token for a [`SocialProfile`]. HTTP
//! calls go through `reqwest`; payload parsing is kept in pure functions.

pub mod google;
pub mod kakao;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use sharecal_core::config::SocialConfig;
use sharecal_db::db::enums::SocialProvider;

use crate::error::{ServiceError, ServiceResult};

/// Identity facts returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SocialProfile {
    pub social_id: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    /// Raw provider payload, stored on the social account.
    pub extra: serde_json::Value,
}

#[salvo::async_trait]
pub trait SocialVerifier: Send + Sync {
    /// ## Errors
    /// Returns `AuthenticationError` when the token is rejected or the provider
    /// cannot be reached.
    async fn verify(&self, token: &str) -> ServiceResult<SocialProfile>;
}

/// Enabled verifiers keyed by provider.
#[derive(Clone, Default)]
pub struct SocialVerifiers {
    verifiers: HashMap<SocialProvider, Arc<dyn SocialVerifier>>,
}

impl std::fmt::Debug for SocialVerifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialVerifiers")
            .field("providers", &self.verifiers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SocialVerifiers {
    /// ## Summary
    /// Builds the verifiers enabled by configuration. Google is always available;
    /// its audience is checked only when a client ID is configured.
    #[must_use]
    pub fn from_config(config: &SocialConfig, client: reqwest::Client) -> Self {
        let mut verifiers = Self::default();
        verifiers.register(
            SocialProvider::Google,
            Arc::new(google::GoogleVerifier::new(
                client.clone(),
                config.google_client_id.clone(),
            )),
        );
        if config.kakao_enabled {
            verifiers.register(
                SocialProvider::Kakao,
                Arc::new(kakao::KakaoVerifier::new(client)),
            );
        }
        verifiers
    }

    pub fn register(&mut self, provider: SocialProvider, verifier: Arc<dyn SocialVerifier>) {
        self.verifiers.insert(provider, verifier);
    }

    /// ## Errors
    /// Returns `ValidationError` if the provider is not enabled.
    pub fn get(&self, provider: SocialProvider) -> ServiceResult<&dyn SocialVerifier> {
        self.verifiers
            .get(&provider)
            .map(Arc::as_ref)
            .ok_or_else(|| ServiceError::invalid(format!("Unsupported social provider: {provider}")))
    }
}

/// Maps a transport or HTTP-status failure to an authentication error.
pub(crate) fn provider_error(provider: SocialProvider, error: &reqwest::Error) -> ServiceError {
    tracing::warn!(%provider, %error, "Social token verification request failed");
    ServiceError::AuthenticationError(format!("Invalid {provider} token"))
}
