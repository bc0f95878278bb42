use async_trait::async_trait;

use crate::error::ServiceError;

/// Delivers out-of-band messages to users.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), ServiceError>;
}

/// Writes notifications to the log instead of sending them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), ServiceError> {
        tracing::info!(recipient, subject, body, "📧 Notification");
        Ok(())
    }
}
