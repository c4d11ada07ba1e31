//! Notification settings

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use validator::ValidateEmail;

use crate::error::{AlertError, Result};
use crate::types::{AlertPriority, Channel};

static SMS_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid regex"));

/// Which channels deliver notifications, to whom, and from what priority up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub channels: BTreeSet<Channel>,
    #[serde(default)]
    pub email_recipients: Vec<String>,
    #[serde(default)]
    pub sms_recipients: Vec<String>,
    pub minimum_priority: AlertPriority,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            channels: BTreeSet::from([Channel::Dashboard, Channel::App]),
            email_recipients: Vec::new(),
            sms_recipients: Vec::new(),
            minimum_priority: AlertPriority::Medium,
        }
    }
}

impl NotificationSettings {
    /// Add the channel if absent, remove it if present. Returns whether it is now enabled.
    pub fn toggle_channel(&mut self, channel: Channel) -> bool {
        if self.channels.remove(&channel) {
            false
        } else {
            self.channels.insert(channel);
            true
        }
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }

    /// Channels a template may notify on right now for an alert of `priority`
    pub fn deliverable(&self, requested: &[Channel], priority: AlertPriority) -> Vec<Channel> {
        if priority < self.minimum_priority {
            return Vec::new();
        }
        requested
            .iter()
            .copied()
            .filter(|c| self.is_enabled(*c))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for address in &self.email_recipients {
            if !address.validate_email() {
                fields
                    .entry("emailRecipients".to_string())
                    .or_default()
                    .push(format!("'{}' is not a valid email address", address));
            }
        }
        for number in &self.sms_recipients {
            let compact: String = number.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
            if !SMS_NUMBER_REGEX.is_match(&compact) {
                fields
                    .entry("smsRecipients".to_string())
                    .or_default()
                    .push(format!("'{}' is not a valid phone number", number));
            }
        }
        if self.is_enabled(Channel::Email) && self.email_recipients.is_empty() {
            fields
                .entry("emailRecipients".to_string())
                .or_default()
                .push("Email is enabled but has no recipients".to_string());
        }
        if self.is_enabled(Channel::Sms) && self.sms_recipients.is_empty() {
            fields
                .entry("smsRecipients".to_string())
                .or_default()
                .push("SMS is enabled but has no recipients".to_string());
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(AlertError::Validation(fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_restores_channels() {
        let mut settings = NotificationSettings::default();
        let original = settings.channels.clone();

        assert!(settings.toggle_channel(Channel::Email));
        assert!(!settings.toggle_channel(Channel::Email));
        assert_eq!(settings.channels, original);

        assert!(!settings.toggle_channel(Channel::App));
        assert!(settings.toggle_channel(Channel::App));
        assert_eq!(settings.channels, original);
    }

    #[test]
    fn deliverable_respects_minimum_priority_and_enabled_set() {
        let settings = NotificationSettings::default();
        let requested = [Channel::Email, Channel::Dashboard, Channel::App];
        assert_eq!(
            settings.deliverable(&requested, AlertPriority::High),
            vec![Channel::Dashboard, Channel::App]
        );
        assert!(settings.deliverable(&requested, AlertPriority::Low).is_empty());
    }

    #[test]
    fn recipients_are_checked() {
        let mut settings = NotificationSettings::default();
        settings.toggle_channel(Channel::Sms);
        settings.email_recipients = vec!["ops@hospital.org".to_string(), "nope".to_string()];
        match settings.validate().unwrap_err() {
            AlertError::Validation(fields) => {
                assert_eq!(fields["emailRecipients"].len(), 1);
                assert!(fields.contains_key("smsRecipients"));
            }
            other => panic!("unexpected error: {other}"),
        }

        settings.sms_recipients = vec!["+1 555-010-9999".to_string()];
        settings.email_recipients.pop();
        assert!(settings.validate().is_ok());
    }
}
