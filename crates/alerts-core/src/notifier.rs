//! Notification delivery seam

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::settings::NotificationSettings;
use crate::types::{Alert, Channel};

/// Delivers a fired alert over one channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        channel: Channel,
        alert: &Alert,
        settings: &NotificationSettings,
    ) -> Result<()>;
}

/// Writes deliveries to the log instead of contacting a gateway
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(
        &self,
        channel: Channel,
        alert: &Alert,
        settings: &NotificationSettings,
    ) -> Result<()> {
        let recipients = match channel {
            Channel::Email => settings.email_recipients.join(", "),
            Channel::Sms => settings.sms_recipients.join(", "),
            Channel::Dashboard | Channel::App => "all operators".to_string(),
        };
        if recipients.is_empty() {
            warn!(
                channel = channel.as_str(),
                alert_id = %alert.id,
                "No recipients configured, notification skipped"
            );
            return Ok(());
        }
        info!(
            channel = channel.as_str(),
            alert_id = %alert.id,
            priority = alert.priority.as_str(),
            "Notify {}: {}",
            recipients,
            alert.title
        );
        Ok(())
    }
}
