//! Outbound email.
//!
//! Delivery is best-effort: callers use [`send_best_effort`], which logs a
//! failed send at `warn` and reports it as `false` instead of an error.

pub mod http;
pub mod log;
pub mod memory;
pub mod templates;

use std::sync::Arc;

use sharecal_core::config::{MailConfig, MailMethod};

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[salvo::async_trait]
pub trait EmailDispatcher: Send + Sync {
    /// ## Errors
    /// Returns an error if the message could not be handed off for delivery.
    async fn send(&self, message: &EmailMessage) -> ServiceResult<()>;
}

/// ## Summary
/// Builds the dispatcher selected by `mail.method`.
///
/// ## Errors
/// Returns `InvalidConfiguration` if the HTTP method is selected without an endpoint.
pub fn dispatcher_from_config(
    config: &MailConfig,
    client: reqwest::Client,
) -> ServiceResult<Arc<dyn EmailDispatcher>> {
    match config.method {
        MailMethod::Log => Ok(Arc::new(log::LogDispatcher)),
        MailMethod::Http => {
            let http = config.http.as_ref().ok_or_else(|| {
                ServiceError::InvalidConfiguration(
                    "mail.http must be set when mail.method = \"http\"".to_string(),
                )
            })?;
            Ok(Arc::new(http::HttpDispatcher::new(
                client,
                http.endpoint.clone(),
                http.api_key.clone(),
            )))
        }
    }
}

/// ## Summary
/// Sends a message, swallowing failures. Returns whether the send succeeded.
#[tracing::instrument(skip(dispatcher, message), fields(to = %message.to))]
pub async fn send_best_effort(dispatcher: &dyn EmailDispatcher, message: &EmailMessage) -> bool {
    match dispatcher.send(message).await {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(%error, subject = %message.subject, "Email delivery failed");
            false
        }
    }
}
