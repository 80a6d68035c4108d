//! Notification delivery boundary.

use async_trait::async_trait;
use tracing::info;

use crate::Result;

/// Delivers rendered text to a subscriber.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `text` to `subscriber_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RsiwatchError::Delivery`](crate::RsiwatchError::Delivery)
    /// if the message could not be delivered.
    async fn notify(&self, subscriber_id: &str, text: &str) -> Result<()>;
}

/// Writes notifications to the log instead of delivering them.
///
/// Used when no chat transport is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subscriber_id: &str, text: &str) -> Result<()> {
        info!(subscriber = subscriber_id, "{text}");
        Ok(())
    }
}
