//! Alert template editor.
//!
//! Holds the in-progress field values of a template and shapes them into a
//! [`TemplateDraft`]. The secondary threshold only exists for `between`
//! conditions: selecting any other condition type clears it.

use std::collections::{BTreeMap, BTreeSet};
use validator::Validate;

use crate::error::{AlertError, Result};
use crate::types::{
    AlertCondition, AlertPriority, AlertTemplate, AlertType, Channel, ConditionType, TemplateDraft,
};

#[derive(Debug, Validate)]
struct TemplateText<'a> {
    #[validate(length(min = 1, max = 100, message = "Name is required (max 100 characters)"))]
    name: &'a str,
    #[validate(length(min = 1, max = 200, message = "Title is required (max 200 characters)"))]
    title: &'a str,
    #[validate(length(min = 1, max = 2000, message = "Message is required (max 2000 characters)"))]
    message: &'a str,
    #[validate(length(min = 1, message = "Metric is required"))]
    metric: &'a str,
}

/// Check a draft regardless of where it came from
pub fn validate_draft(draft: &TemplateDraft) -> Result<()> {
    let mut fields: BTreeMap<String, Vec<String>> = match (TemplateText {
        name: draft.name.trim(),
        title: draft.title.trim(),
        message: draft.message.trim(),
        metric: draft.condition.metric.trim(),
    })
    .validate()
    {
        Ok(()) => BTreeMap::new(),
        Err(errors) => match AlertError::from(errors) {
            AlertError::Validation(fields) => fields,
            _ => BTreeMap::new(),
        },
    };

    let condition = &draft.condition;
    if !condition.threshold.is_finite() {
        fields
            .entry("threshold".to_string())
            .or_default()
            .push("Threshold must be a number".to_string());
    }
    match (condition.kind, condition.secondary_threshold) {
        (ConditionType::Between, None) => fields
            .entry("secondaryThreshold".to_string())
            .or_default()
            .push("Upper threshold is required for between".to_string()),
        (ConditionType::Between, Some(high)) if !(high.is_finite() && condition.threshold <= high) => {
            fields
                .entry("secondaryThreshold".to_string())
                .or_default()
                .push("Upper threshold must not be below the lower threshold".to_string())
        }
        (ConditionType::Between, Some(_)) => {}
        (_, Some(_)) => fields
            .entry("secondaryThreshold".to_string())
            .or_default()
            .push("Upper threshold is only used by between".to_string()),
        (_, None) => {}
    }

    if draft.channels.is_empty() {
        fields
            .entry("channels".to_string())
            .or_default()
            .push("Select at least one channel".to_string());
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(AlertError::Validation(fields))
    }
}

#[derive(Debug, Clone)]
pub struct TemplateEditor {
    pub name: String,
    pub title: String,
    pub message: String,
    pub kind: AlertType,
    pub priority: AlertPriority,
    pub metric: String,
    pub threshold: f64,
    pub enabled: bool,
    condition_type: ConditionType,
    secondary_threshold: Option<f64>,
    channels: BTreeSet<Channel>,
}

impl Default for TemplateEditor {
    fn default() -> Self {
        Self {
            name: String::new(),
            title: String::new(),
            message: String::new(),
            kind: AlertType::System,
            priority: AlertPriority::Medium,
            metric: String::new(),
            threshold: 0.0,
            enabled: true,
            condition_type: ConditionType::Greater,
            secondary_threshold: None,
            channels: BTreeSet::from([Channel::Dashboard]),
        }
    }
}

impl TemplateEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing template
    pub fn from_template(template: &AlertTemplate) -> Self {
        Self {
            name: template.name.clone(),
            title: template.title.clone(),
            message: template.message.clone(),
            kind: template.kind,
            priority: template.priority,
            metric: template.condition.metric.clone(),
            threshold: template.condition.threshold,
            enabled: template.enabled,
            condition_type: template.condition.kind,
            secondary_threshold: template.condition.secondary_threshold,
            channels: template.channels.iter().copied().collect(),
        }
    }

    pub fn condition_type(&self) -> ConditionType {
        self.condition_type
    }

    pub fn set_condition_type(&mut self, kind: ConditionType) {
        self.condition_type = kind;
        if kind != ConditionType::Between {
            self.secondary_threshold = None;
        }
    }

    /// Whether the upper threshold field applies
    pub fn shows_secondary_threshold(&self) -> bool {
        self.condition_type == ConditionType::Between
    }

    pub fn secondary_threshold(&self) -> Option<f64> {
        self.secondary_threshold
    }

    pub fn set_secondary_threshold(&mut self, value: f64) -> Result<()> {
        if !self.shows_secondary_threshold() {
            return Err(AlertError::InvalidValue(format!(
                "secondary threshold is not used by '{}' conditions",
                self.condition_type
            )));
        }
        self.secondary_threshold = Some(value);
        Ok(())
    }

    /// Add the channel if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle_channel(&mut self, channel: Channel) -> bool {
        if self.channels.remove(&channel) {
            false
        } else {
            self.channels.insert(channel);
            true
        }
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.channels.iter().copied().collect()
    }

    pub fn build(&self) -> Result<TemplateDraft> {
        let draft = TemplateDraft {
            name: self.name.trim().to_string(),
            title: self.title.trim().to_string(),
            message: self.message.trim().to_string(),
            kind: self.kind,
            priority: self.priority,
            condition: AlertCondition {
                metric: self.metric.trim().to_string(),
                kind: self.condition_type,
                threshold: self.threshold,
                secondary_threshold: self.secondary_threshold,
            },
            channels: self.channels(),
            enabled: self.enabled,
        };
        validate_draft(&draft)?;
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> TemplateEditor {
        let mut editor = TemplateEditor::new();
        editor.name = "Fever watch".to_string();
        editor.title = "High temperature".to_string();
        editor.message = "Temperature reached {value}".to_string();
        editor.metric = "temperature".to_string();
        editor.threshold = 38.0;
        editor
    }

    #[test]
    fn between_reveals_secondary_threshold() {
        let mut editor = filled();
        assert!(!editor.shows_secondary_threshold());
        editor.set_condition_type(ConditionType::Between);
        assert!(editor.shows_secondary_threshold());

        for kind in [ConditionType::Greater, ConditionType::Less, ConditionType::Equal] {
            editor.set_condition_type(kind);
            assert!(!editor.shows_secondary_threshold());
        }
    }

    #[test]
    fn leaving_between_clears_secondary_threshold() {
        let mut editor = filled();
        editor.set_condition_type(ConditionType::Between);
        editor.set_secondary_threshold(40.0).unwrap();
        editor.set_condition_type(ConditionType::Less);
        assert_eq!(editor.secondary_threshold(), None);
        assert!(editor.set_secondary_threshold(1.0).is_err());
        assert!(editor.build().is_ok());
    }

    #[test]
    fn toggling_channel_twice_restores_selection() {
        let mut editor = filled();
        let before = editor.channels();
        assert!(editor.toggle_channel(Channel::Sms));
        assert!(!editor.toggle_channel(Channel::Sms));
        assert_eq!(editor.channels(), before);

        assert!(!editor.toggle_channel(Channel::Dashboard));
        assert!(editor.toggle_channel(Channel::Dashboard));
        assert_eq!(editor.channels(), before);
    }

    #[test]
    fn build_reports_every_problem() {
        let mut editor = TemplateEditor::new();
        editor.toggle_channel(Channel::Dashboard);
        editor.set_condition_type(ConditionType::Between);
        editor.threshold = 10.0;
        editor.set_secondary_threshold(5.0).unwrap();

        match editor.build().unwrap_err() {
            AlertError::Validation(fields) => {
                for field in ["name", "title", "message", "metric", "channels", "secondaryThreshold"] {
                    assert!(fields.contains_key(field), "missing {field}");
                }
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn between_requires_upper_bound() {
        let mut editor = filled();
        editor.set_condition_type(ConditionType::Between);
        assert!(editor.build().is_err());
        editor.set_secondary_threshold(40.0).unwrap();
        let draft = editor.build().unwrap();
        assert_eq!(draft.condition.secondary_threshold, Some(40.0));
    }

    #[test]
    fn round_trips_through_template() {
        let draft = {
            let mut editor = filled();
            editor.toggle_channel(Channel::Email);
            editor.build().unwrap()
        };
        let template = AlertTemplate {
            id: "t-1".to_string(),
            name: draft.name.clone(),
            title: draft.title.clone(),
            message: draft.message.clone(),
            kind: draft.kind,
            priority: draft.priority,
            condition: draft.condition.clone(),
            channels: draft.channels.clone(),
            enabled: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(TemplateEditor::from_template(&template).build().unwrap(), draft);
    }
}
