//! Long-lived collaborators shared by all requests.

use std::sync::Arc;

use salvo::async_trait;

use sharecal_core::config::Settings;
use sharecal_core::error::CoreError;
use sharecal_service::auth::jwt::TokenIssuer;
use sharecal_service::calendar::invitation::InvitationMailer;
use sharecal_service::error::ServiceResult;
use sharecal_service::mail::{EmailDispatcher, dispatcher_from_config};
use sharecal_service::social::SocialVerifiers;

use crate::error::AppResult;

/// Token issuer, provider verifiers and the mail dispatcher.
#[derive(Clone)]
pub struct AppServices {
    pub issuer: TokenIssuer,
    pub verifiers: SocialVerifiers,
    pub mailer: Arc<dyn EmailDispatcher>,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("verifiers", &self.verifiers)
            .finish_non_exhaustive()
    }
}

impl AppServices {
    /// ## Summary
    /// Builds the services selected by configuration. One HTTP client is shared
    /// by the social verifiers and the HTTP mail relay.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` for an unusable JWT secret or mail setup.
    pub fn from_settings(settings: &Settings, client: &reqwest::Client) -> ServiceResult<Self> {
        Ok(Self {
            issuer: TokenIssuer::new(&settings.auth)?,
            verifiers: SocialVerifiers::from_config(&settings.social, client.clone()),
            mailer: dispatcher_from_config(&settings.mail, client.clone())?,
        })
    }

    /// Mailer view used by the invitation workflow.
    #[must_use]
    pub fn invitation_mailer<'a>(&'a self, settings: &'a Settings) -> InvitationMailer<'a> {
        InvitationMailer {
            dispatcher: self.mailer.as_ref(),
            from: &settings.mail.from,
            app: &settings.app,
        }
    }
}

pub struct ServicesHandler {
    pub services: Arc<AppServices>,
}

#[async_trait]
impl salvo::Handler for ServicesHandler {
    #[tracing::instrument(skip_all)]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.services));
    }
}

/// ## Errors
/// Returns an error if the services were not injected.
pub fn get_services_from_depot(depot: &salvo::Depot) -> AppResult<Arc<AppServices>> {
    depot
        .obtain::<Arc<AppServices>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Services not found in depot").into())
}
