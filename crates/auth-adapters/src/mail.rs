use async_trait::async_trait;
use domains::{ConfirmationMessage, DomainResult, Mailer};

/// Development mailer: writes the message to the log instead of sending it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from_address: String,
}

impl LogMailer {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation_code(&self, message: ConfirmationMessage) -> DomainResult<()> {
        tracing::info!(
            from = %self.from_address,
            to = %message.to,
            username = %message.username,
            code = %message.code,
            "confirmation code mail"
        );
        Ok(())
    }
}
