use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Outbound email. Failures are reported to the caller, which logs them;
/// they never abort the business operation that triggered the email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError>;
}

/// Sender that records each email in the log instead of speaking SMTP.
pub struct LogMailer {
    from_address: String,
    enabled: bool,
}

impl LogMailer {
    pub fn new(from_address: impl Into<String>, enabled: bool) -> Self {
        Self {
            from_address: from_address.into(),
            enabled,
        }
    }
}

#[async_trait]
impl EmailSender for LogMailer {
    #[tracing::instrument(skip(self, body))]
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        if !self.enabled {
            tracing::debug!(to, subject, "Email delivery disabled, skipping");
            return Ok(());
        }
        if !to.contains('@') {
            return Err(EmailError::InvalidRecipient(to.to_string()));
        }
        tracing::info!(
            from = %self.from_address,
            to,
            subject,
            bytes = body.len(),
            "Email sent"
        );
        Ok(())
    }
}
