use super::{EmailDispatcher, EmailMessage};
use crate::error::{ServiceError, ServiceResult};

/// Posts each message as JSON to a mail relay.
pub struct HttpDispatcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpDispatcher {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[salvo::async_trait]
impl EmailDispatcher for HttpDispatcher {
    #[tracing::instrument(skip(self, message), fields(endpoint = %self.endpoint))]
    async fn send(&self, message: &EmailMessage) -> ServiceResult<()> {
        let mut request = self.client.post(&self.endpoint).json(message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::DeliveryError(format!("relay unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::DeliveryError(format!(
                "relay responded with {status}"
            )));
        }

        tracing::debug!(to = %message.to, "Email handed to relay");
        Ok(())
    }
}
