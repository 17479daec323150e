use super::{EmailDispatcher, EmailMessage};
use crate::error::ServiceResult;

/// Writes messages to the log instead of delivering them.
pub struct LogDispatcher;

#[salvo::async_trait]
impl EmailDispatcher for LogDispatcher {
    async fn send(&self, message: &EmailMessage) -> ServiceResult<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "Email (log delivery)"
        );
        Ok(())
    }
}
