//! Alert persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{Alert, AlertStatus, AlertTemplate};

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert_alert(&self, alert: Alert) -> Result<()>;
    async fn get_alert(&self, id: &str) -> Result<Option<Alert>>;
    async fn list_alerts(&self) -> Result<Vec<Alert>>;
    /// Apply `to` only when the alert is currently `from`
    async fn transition_alert(
        &self,
        id: &str,
        from: AlertStatus,
        to: AlertStatus,
        at: DateTime<Utc>,
        by: Option<String>,
    ) -> Result<bool>;

    async fn insert_template(&self, template: AlertTemplate) -> Result<()>;
    async fn get_template(&self, id: &str) -> Result<Option<AlertTemplate>>;
    async fn list_templates(&self) -> Result<Vec<AlertTemplate>>;
    /// `false` when no template with that id exists
    async fn update_template(&self, template: AlertTemplate) -> Result<bool>;
    async fn delete_template(&self, id: &str) -> Result<bool>;
}

#[derive(Clone, Default)]
pub struct InMemoryAlertStore {
    alerts: Arc<DashMap<String, Alert>>,
    templates: Arc<DashMap<String, AlertTemplate>>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn insert_alert(&self, alert: Alert) -> Result<()> {
        self.alerts.insert(alert.id.clone(), alert);
        Ok(())
    }

    async fn get_alert(&self, id: &str) -> Result<Option<Alert>> {
        Ok(self.alerts.get(id).map(|e| e.clone()))
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>> {
        Ok(self.alerts.iter().map(|e| e.clone()).collect())
    }

    async fn transition_alert(
        &self,
        id: &str,
        from: AlertStatus,
        to: AlertStatus,
        at: DateTime<Utc>,
        by: Option<String>,
    ) -> Result<bool> {
        match self.alerts.get_mut(id) {
            Some(mut alert) if alert.status == from => {
                alert.apply_status(to, at, by);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_template(&self, template: AlertTemplate) -> Result<()> {
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    async fn get_template(&self, id: &str) -> Result<Option<AlertTemplate>> {
        Ok(self.templates.get(id).map(|e| e.clone()))
    }

    async fn list_templates(&self) -> Result<Vec<AlertTemplate>> {
        let mut templates: Vec<AlertTemplate> = self.templates.iter().map(|e| e.clone()).collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn update_template(&self, template: AlertTemplate) -> Result<bool> {
        match self.templates.get_mut(&template.id) {
            Some(mut entry) => {
                *entry = template;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_template(&self, id: &str) -> Result<bool> {
        Ok(self.templates.remove(id).is_some())
    }
}
