//! Alert service: alert lifecycle, templates, evaluation and notification

use chrono::Utc;
use medinet_infra_common::{EventBus, EventSubscription};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::editor::validate_draft;
use crate::error::{AlertError, Result};
use crate::events::AlertEvent;
use crate::notifier::{LoggingNotifier, Notifier};
use crate::settings::NotificationSettings;
use crate::store::{AlertStore, InMemoryAlertStore};
use crate::types::{
    Alert, AlertCondition, AlertFilter, AlertPriority, AlertStatus, AlertTemplate, Channel, MetricReading,
    NewAlert, TemplateDraft,
};

#[derive(Clone)]
pub struct AlertService {
    store: Arc<dyn AlertStore>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<RwLock<NotificationSettings>>,
    events: EventBus<AlertEvent>,
}

impl AlertService {
    pub fn new(
        store: Arc<dyn AlertStore>,
        notifier: Arc<dyn Notifier>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            settings: Arc::new(RwLock::new(settings)),
            events: EventBus::new("alerts"),
        }
    }

    /// In-memory store, log-only notifier, default settings
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryAlertStore::new()),
            Arc::new(LoggingNotifier),
            NotificationSettings::default(),
        )
    }

    pub fn subscribe(&self) -> EventSubscription<AlertEvent> {
        self.events.subscribe()
    }

    // ---- alerts ----

    /// Raise an alert by hand; it starts `pending`
    pub async fn raise(&self, new: NewAlert) -> Result<Alert> {
        let mut fields = BTreeMap::new();
        if new.title.trim().is_empty() {
            fields.insert("title".to_string(), vec!["Title is required".to_string()]);
        }
        if new.message.trim().is_empty() {
            fields.insert("message".to_string(), vec!["Message is required".to_string()]);
        }
        if !fields.is_empty() {
            return Err(AlertError::Validation(fields));
        }

        let alert = Alert {
            id: Uuid::new_v4().to_string(),
            title: new.title.trim().to_string(),
            message: new.message.trim().to_string(),
            kind: new.kind,
            priority: new.priority,
            hospital_id: new.hospital_id,
            template_id: None,
            status: AlertStatus::Pending,
            created_at: Utc::now(),
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
        };
        self.store_alert(alert.clone()).await?;
        Ok(alert)
    }

    pub async fn get_alert(&self, id: &str) -> Result<Alert> {
        self.store
            .get_alert(id)
            .await?
            .ok_or_else(|| AlertError::AlertNotFound(id.to_string()))
    }

    /// Matching alerts, newest first
    pub async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self
            .store
            .list_alerts()
            .await?
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    pub async fn acknowledge(&self, id: &str, by: Option<String>) -> Result<Alert> {
        self.transition(id, AlertStatus::Acknowledged, by).await
    }

    pub async fn resolve(&self, id: &str) -> Result<Alert> {
        self.transition(id, AlertStatus::Resolved, None).await
    }

    pub async fn dismiss(&self, id: &str) -> Result<Alert> {
        self.transition(id, AlertStatus::Dismissed, None).await
    }

    /// Open (pending or acknowledged) alerts per priority; every priority is present
    pub async fn open_counts(&self) -> Result<BTreeMap<AlertPriority, usize>> {
        let mut counts: BTreeMap<AlertPriority, usize> =
            AlertPriority::ALL.iter().map(|p| (*p, 0)).collect();
        for alert in self.store.list_alerts().await? {
            if alert.status.is_open() {
                *counts.entry(alert.priority).or_default() += 1;
            }
        }
        Ok(counts)
    }

    async fn transition(&self, id: &str, to: AlertStatus, by: Option<String>) -> Result<Alert> {
        let alert = self.get_alert(id).await?;
        if !alert.status.can_transition_to(to) {
            return Err(AlertError::InvalidTransition {
                from: alert.status.to_string(),
                to: to.to_string(),
            });
        }
        if !self
            .store
            .transition_alert(id, alert.status, to, Utc::now(), by)
            .await?
        {
            return Err(AlertError::InvalidTransition {
                from: alert.status.to_string(),
                to: to.to_string(),
            });
        }

        info!("Alert {} {} -> {}", id, alert.status, to);
        self.events.publish(AlertEvent::StatusChanged {
            alert_id: id.to_string(),
            status: to,
        });
        self.get_alert(id).await
    }

    async fn store_alert(&self, alert: Alert) -> Result<()> {
        let id = alert.id.clone();
        let priority = alert.priority;
        let template_id = alert.template_id.clone();
        self.store.insert_alert(alert).await?;
        info!("Alert {} raised ({})", id, priority);
        self.events.publish(AlertEvent::Raised {
            alert_id: id,
            priority,
            template_id,
        });
        Ok(())
    }

    // ---- templates ----

    pub async fn create_template(&self, draft: TemplateDraft) -> Result<AlertTemplate> {
        validate_draft(&draft)?;
        let now = Utc::now();
        let template = AlertTemplate {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            title: draft.title.trim().to_string(),
            message: draft.message.trim().to_string(),
            kind: draft.kind,
            priority: draft.priority,
            condition: AlertCondition {
                metric: draft.condition.metric.trim().to_string(),
                ..draft.condition
            },
            channels: dedup_channels(draft.channels),
            enabled: draft.enabled,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_template(template.clone()).await?;
        info!("Alert template '{}' created ({})", template.name, template.id);
        Ok(template)
    }

    pub async fn update_template(&self, id: &str, draft: TemplateDraft) -> Result<AlertTemplate> {
        validate_draft(&draft)?;
        let existing = self.get_template(id).await?;
        let template = AlertTemplate {
            id: existing.id,
            name: draft.name.trim().to_string(),
            title: draft.title.trim().to_string(),
            message: draft.message.trim().to_string(),
            kind: draft.kind,
            priority: draft.priority,
            condition: AlertCondition {
                metric: draft.condition.metric.trim().to_string(),
                ..draft.condition
            },
            channels: dedup_channels(draft.channels),
            enabled: draft.enabled,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        if !self.store.update_template(template.clone()).await? {
            return Err(AlertError::TemplateNotFound(id.to_string()));
        }
        info!("Alert template '{}' updated", template.name);
        Ok(template)
    }

    pub async fn delete_template(&self, id: &str) -> Result<()> {
        if !self.store.delete_template(id).await? {
            return Err(AlertError::TemplateNotFound(id.to_string()));
        }
        info!("Alert template {} deleted", id);
        Ok(())
    }

    pub async fn get_template(&self, id: &str) -> Result<AlertTemplate> {
        self.store
            .get_template(id)
            .await?
            .ok_or_else(|| AlertError::TemplateNotFound(id.to_string()))
    }

    pub async fn list_templates(&self) -> Result<Vec<AlertTemplate>> {
        self.store.list_templates().await
    }

    /// Fire an alert for every enabled template whose condition holds for the reading
    pub async fn evaluate(&self, reading: &MetricReading) -> Result<Vec<Alert>> {
        let metric = reading.metric.trim();
        let templates: Vec<AlertTemplate> = self
            .store
            .list_templates()
            .await?
            .into_iter()
            .filter(|t| t.enabled && t.condition.metric == metric && t.condition.holds(reading.value))
            .collect();
        debug!(
            "Reading {}={} matched {} template(s)",
            metric,
            reading.value,
            templates.len()
        );

        let mut fired = Vec::with_capacity(templates.len());
        for template in templates {
            let alert = Alert {
                id: Uuid::new_v4().to_string(),
                title: render(&template.title, reading),
                message: render(&template.message, reading),
                kind: template.kind,
                priority: template.priority,
                hospital_id: reading.hospital_id.clone(),
                template_id: Some(template.id.clone()),
                status: AlertStatus::Pending,
                created_at: Utc::now(),
                acknowledged_at: None,
                acknowledged_by: None,
                resolved_at: None,
            };
            self.store_alert(alert.clone()).await?;
            self.deliver(&alert, &template.channels).await;
            fired.push(alert);
        }
        Ok(fired)
    }

    async fn deliver(&self, alert: &Alert, requested: &[Channel]) {
        let settings = self.settings.read().clone();
        let channels = settings.deliverable(requested, alert.priority);
        if channels.is_empty() {
            debug!("Alert {} not delivered: no eligible channel", alert.id);
            return;
        }
        for channel in channels {
            if let Err(e) = self.notifier.notify(channel, alert, &settings).await {
                warn!("Delivery of alert {} over {} failed: {}", alert.id, channel, e);
            }
        }
    }

    // ---- notification settings ----

    pub fn settings(&self) -> NotificationSettings {
        self.settings.read().clone()
    }

    pub fn update_settings(&self, settings: NotificationSettings) -> Result<NotificationSettings> {
        settings.validate()?;
        *self.settings.write() = settings.clone();
        info!("Notification settings updated");
        Ok(settings)
    }

    /// Flip one channel on or off and return the resulting settings
    pub fn toggle_channel(&self, channel: Channel) -> NotificationSettings {
        let mut settings = self.settings.write();
        let enabled = settings.toggle_channel(channel);
        info!("Notification channel {} {}", channel, if enabled { "enabled" } else { "disabled" });
        settings.clone()
    }
}

fn dedup_channels(mut channels: Vec<Channel>) -> Vec<Channel> {
    channels.sort();
    channels.dedup();
    channels
}

/// Substitute `{metric}` and `{value}` placeholders
fn render(text: &str, reading: &MetricReading) -> String {
    text.replace("{metric}", &reading.metric)
        .replace("{value}", &reading.value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertType, ConditionType};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(Channel, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(
            &self,
            channel: Channel,
            alert: &Alert,
            _settings: &NotificationSettings,
        ) -> Result<()> {
            self.sent.lock().push((channel, alert.id.clone()));
            Ok(())
        }
    }

    fn draft(kind: ConditionType, threshold: f64, secondary: Option<f64>) -> TemplateDraft {
        TemplateDraft {
            name: "Fever".to_string(),
            title: "Fever on {metric}".to_string(),
            message: "Reading {value}".to_string(),
            kind: AlertType::PatientVitals,
            priority: AlertPriority::High,
            condition: AlertCondition {
                metric: "temperature".to_string(),
                kind,
                threshold,
                secondary_threshold: secondary,
            },
            channels: vec![Channel::Dashboard, Channel::Email, Channel::Dashboard],
            enabled: true,
        }
    }

    fn reading(value: f64) -> MetricReading {
        MetricReading {
            metric: "temperature".to_string(),
            value,
            hospital_id: Some("h-1".to_string()),
        }
    }

    fn service_with(notifier: Arc<RecordingNotifier>) -> AlertService {
        AlertService::new(
            Arc::new(InMemoryAlertStore::new()),
            notifier,
            NotificationSettings::default(),
        )
    }

    #[tokio::test]
    async fn between_band_fires_once_and_notifies_enabled_channels() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service_with(notifier.clone());
        let template = service
            .create_template(draft(ConditionType::Between, 38.0, Some(40.0)))
            .await
            .unwrap();
        assert_eq!(template.channels, vec![Channel::Email, Channel::Dashboard]);

        assert!(service.evaluate(&reading(37.2)).await.unwrap().is_empty());
        let fired = service.evaluate(&reading(39.5)).await.unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].title, "Fever on temperature");
        assert_eq!(fired[0].message, "Reading 39.5");
        assert_eq!(fired[0].template_id.as_deref(), Some(template.id.as_str()));

        // email is not enabled in the default settings
        let sent = notifier.sent.lock().clone();
        assert_eq!(sent, vec![(Channel::Dashboard, fired[0].id.clone())]);
    }

    #[tokio::test]
    async fn disabled_or_other_metric_templates_do_not_fire() {
        let service = AlertService::in_memory();
        let mut off = draft(ConditionType::Greater, 38.0, None);
        off.enabled = false;
        service.create_template(off).await.unwrap();
        service
            .create_template(draft(ConditionType::Greater, 38.0, None))
            .await
            .unwrap();

        let other = MetricReading {
            metric: "spo2".to_string(),
            value: 99.0,
            hospital_id: None,
        };
        assert!(service.evaluate(&other).await.unwrap().is_empty());
        assert_eq!(service.evaluate(&reading(39.0)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn low_priority_alerts_are_stored_but_not_delivered() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service_with(notifier.clone());
        let mut quiet = draft(ConditionType::Less, 90.0, None);
        quiet.priority = AlertPriority::Low;
        service.create_template(quiet).await.unwrap();

        assert_eq!(service.evaluate(&reading(85.0)).await.unwrap().len(), 1);
        assert!(notifier.sent.lock().is_empty());
        assert_eq!(service.list_alerts(&AlertFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lifecycle_rejects_going_back() {
        let service = AlertService::in_memory();
        let alert = service
            .raise(NewAlert {
                title: "Generator test".to_string(),
                message: "Backup generator on load".to_string(),
                kind: AlertType::Equipment,
                priority: AlertPriority::Medium,
                hospital_id: None,
            })
            .await
            .unwrap();

        let acked = service
            .acknowledge(&alert.id, Some("nurse.kim".to_string()))
            .await
            .unwrap();
        assert_eq!(acked.status, AlertStatus::Acknowledged);
        assert_eq!(acked.acknowledged_by.as_deref(), Some("nurse.kim"));
        assert!(acked.acknowledged_at.is_some());

        let resolved = service.resolve(&alert.id).await.unwrap();
        assert!(resolved.resolved_at.is_some());

        let err = service.acknowledge(&alert.id, None).await.unwrap_err();
        assert!(matches!(err, AlertError::InvalidTransition { .. }));
        assert!(service.dismiss(&alert.id).await.is_err());
    }

    #[tokio::test]
    async fn pending_alert_can_be_dismissed_but_not_resolved() {
        let service = AlertService::in_memory();
        let alert = service
            .raise(NewAlert {
                title: "Door ajar".to_string(),
                message: "Pharmacy door open".to_string(),
                kind: AlertType::Security,
                priority: AlertPriority::Critical,
                hospital_id: Some("h-2".to_string()),
            })
            .await
            .unwrap();
        assert!(service.resolve(&alert.id).await.is_err());
        assert_eq!(
            service.dismiss(&alert.id).await.unwrap().status,
            AlertStatus::Dismissed
        );
        let counts = service.open_counts().await.unwrap();
        assert_eq!(counts[&AlertPriority::Critical], 0);
    }

    #[tokio::test]
    async fn filter_by_search_and_priority() {
        let service = AlertService::in_memory();
        for (title, priority) in [
            ("Oxygen low", AlertPriority::Critical),
            ("Bed capacity", AlertPriority::Medium),
            ("oxygen sensor fault", AlertPriority::Low),
        ] {
            service
                .raise(NewAlert {
                    title: title.to_string(),
                    message: "check ward 3".to_string(),
                    kind: AlertType::Resource,
                    priority,
                    hospital_id: None,
                })
                .await
                .unwrap();
        }

        let filter = AlertFilter {
            search: Some("OXYGEN".to_string()),
            ..Default::default()
        };
        assert_eq!(service.list_alerts(&filter).await.unwrap().len(), 2);

        let filter = AlertFilter {
            search: Some("oxygen".to_string()),
            priority: Some(AlertPriority::Critical),
            ..Default::default()
        };
        let found = service.list_alerts(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Oxygen low");
    }

    #[tokio::test]
    async fn template_update_and_delete() {
        let service = AlertService::in_memory();
        let created = service
            .create_template(draft(ConditionType::Greater, 38.0, None))
            .await
            .unwrap();

        let mut changed = draft(ConditionType::Greater, 39.0, None);
        changed.name = "Fever (strict)".to_string();
        let updated = service.update_template(&created.id, changed).await.unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.condition.threshold, 39.0);

        service.delete_template(&created.id).await.unwrap();
        assert!(service.get_template(&created.id).await.unwrap_err().is_not_found());
        assert!(service.delete_template(&created.id).await.is_err());
    }

    #[test]
    fn settings_toggle_and_update() {
        let service = AlertService::in_memory();
        let before = service.settings();
        service.toggle_channel(Channel::Sms);
        service.toggle_channel(Channel::Sms);
        assert_eq!(service.settings(), before);

        let mut bad = before.clone();
        bad.email_recipients = vec!["not-an-email".to_string()];
        assert!(service.update_settings(bad).is_err());
        assert_eq!(service.settings(), before);
    }
}
