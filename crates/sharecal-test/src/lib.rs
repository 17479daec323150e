//! Integration test support for the calendar-sharing backend.
//!
//! Re-exports the workspace crates under one roof so the tests in
//! `tests/integration` can reach every layer through `sharecal_test::`.

pub use sharecal_app as app;
pub use sharecal_core as core;
pub use sharecal_db as db;
pub use sharecal_service as service;

pub mod fixtures {
    //! Collaborators that replace network-backed services in tests.

    use sharecal_service::error::{ServiceError, ServiceResult};
    use sharecal_service::social::{SocialProfile, SocialVerifier};

    /// Accepts tokens of the form `<social_id>` or `<social_id>:<email>` and
    /// rejects everything starting with `bad`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct StaticVerifier;

    #[salvo::async_trait]
    impl SocialVerifier for StaticVerifier {
        async fn verify(&self, token: &str) -> ServiceResult<SocialProfile> {
            if token.starts_with("bad") {
                return Err(ServiceError::AuthenticationError(
                    "Invalid kakao token".to_string(),
                ));
            }
            let (social_id, email) = match token.split_once(':') {
                Some((id, email)) => (id, Some(email.to_string())),
                None => (token, None),
            };
            Ok(SocialProfile {
                social_id: social_id.to_string(),
                email_verified: email.is_some(),
                email,
                first_name: "Social".to_string(),
                extra: serde_json::json!({ "id": social_id }),
                ..SocialProfile::default()
            })
        }
    }
}
