use std::sync::{Arc, Mutex};

use super::{EmailDispatcher, EmailMessage};
use crate::error::{ServiceError, ServiceResult};

/// Keeps sent messages in memory. Can be switched to fail every send.
#[derive(Clone, Default)]
pub struct MemoryDispatcher {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }
}

#[salvo::async_trait]
impl EmailDispatcher for MemoryDispatcher {
    async fn send(&self, message: &EmailMessage) -> ServiceResult<()> {
        if self.failing.lock().is_ok_and(|flag| *flag) {
            return Err(ServiceError::DeliveryError("delivery disabled".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_poisoned| ServiceError::InvariantViolation("mail outbox poisoned"))?
            .push(message.clone());
        Ok(())
    }
}
