//! Alert domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AlertError;

/// Tolerance used by the `equal` condition
pub const EQUAL_TOLERANCE: f64 = 1e-9;

macro_rules! string_enum {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = AlertError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(AlertError::InvalidValue(format!("{} '{}'", $what, other))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    PatientVitals,
    Resource,
    Equipment,
    System,
    Security,
}

string_enum!(AlertType, "alert type", {
    PatientVitals => "patient_vitals",
    Resource => "resource",
    Equipment => "equipment",
    System => "system",
    Security => "security",
});

/// Ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertPriority {
    pub const ALL: [AlertPriority; 4] = [
        AlertPriority::Low,
        AlertPriority::Medium,
        AlertPriority::High,
        AlertPriority::Critical,
    ];
}

string_enum!(AlertPriority, "alert priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Acknowledged,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    /// Not yet resolved or dismissed
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Acknowledged)
    }

    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Acknowledged)
                | (Self::Pending, Self::Dismissed)
                | (Self::Acknowledged, Self::Resolved)
                | (Self::Acknowledged, Self::Dismissed)
        )
    }
}

string_enum!(AlertStatus, "alert status", {
    Pending => "pending",
    Acknowledged => "acknowledged",
    Resolved => "resolved",
    Dismissed => "dismissed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Dashboard,
    App,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Email, Channel::Sms, Channel::Dashboard, Channel::App];
}

string_enum!(Channel, "notification channel", {
    Email => "email",
    Sms => "sms",
    Dashboard => "dashboard",
    App => "app",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Greater,
    Less,
    Equal,
    Between,
}

string_enum!(ConditionType, "condition type", {
    Greater => "greater",
    Less => "less",
    Equal => "equal",
    Between => "between",
});

/// Threshold rule on a named metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCondition {
    pub metric: String,
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub threshold: f64,
    /// Upper bound, only meaningful for `between`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_threshold: Option<f64>,
}

impl AlertCondition {
    /// Whether a reading satisfies the condition. `between` is inclusive.
    pub fn holds(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self.kind {
            ConditionType::Greater => value > self.threshold,
            ConditionType::Less => value < self.threshold,
            ConditionType::Equal => (value - self.threshold).abs() <= EQUAL_TOLERANCE,
            ConditionType::Between => match self.secondary_threshold {
                Some(high) => value >= self.threshold && value <= high,
                None => false,
            },
        }
    }
}

/// A fired or manually raised alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub priority: AlertPriority,
    pub hospital_id: Option<String>,
    pub template_id: Option<String>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Record a status change and its timestamps. Callers check the transition first.
    pub fn apply_status(&mut self, status: AlertStatus, at: DateTime<Utc>, by: Option<String>) {
        match status {
            AlertStatus::Acknowledged => {
                self.acknowledged_at = Some(at);
                self.acknowledged_by = by;
            }
            AlertStatus::Resolved => self.resolved_at = Some(at),
            AlertStatus::Pending | AlertStatus::Dismissed => {}
        }
        self.status = status;
    }
}

/// Payload for raising an alert by hand
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub priority: AlertPriority,
    #[serde(default)]
    pub hospital_id: Option<String>,
}

/// Reusable alert rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertTemplate {
    pub id: String,
    pub name: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub priority: AlertPriority,
    pub condition: AlertCondition,
    pub channels: Vec<Channel>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated template content, produced by the editor or posted to the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    pub name: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub priority: AlertPriority,
    pub condition: AlertCondition,
    pub channels: Vec<Channel>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A metric value to evaluate against templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricReading {
    pub metric: String,
    pub value: f64,
    #[serde(default)]
    pub hospital_id: Option<String>,
}

/// Alert listing filter; `search` matches title or message, case-insensitive
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub priority: Option<AlertPriority>,
    #[serde(rename = "type")]
    pub kind: Option<AlertType>,
    pub search: Option<String>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        if self.status.is_some_and(|s| alert.status != s) {
            return false;
        }
        if self.priority.is_some_and(|p| alert.priority != p) {
            return false;
        }
        if self.kind.is_some_and(|k| alert.kind != k) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                alert.title.to_lowercase().contains(&term)
                    || alert.message.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(kind: ConditionType, threshold: f64, secondary: Option<f64>) -> AlertCondition {
        AlertCondition {
            metric: "heart_rate".to_string(),
            kind,
            threshold,
            secondary_threshold: secondary,
        }
    }

    #[test]
    fn conditions() {
        assert!(condition(ConditionType::Greater, 120.0, None).holds(121.0));
        assert!(!condition(ConditionType::Greater, 120.0, None).holds(120.0));
        assert!(condition(ConditionType::Less, 90.0, None).holds(85.5));
        assert!(condition(ConditionType::Equal, 0.0, None).holds(0.0));
        assert!(!condition(ConditionType::Greater, 1.0, None).holds(f64::NAN));

        let band = condition(ConditionType::Between, 38.0, Some(40.0));
        assert!(band.holds(38.0));
        assert!(band.holds(39.2));
        assert!(band.holds(40.0));
        assert!(!band.holds(40.1));
        assert!(!condition(ConditionType::Between, 38.0, None).holds(39.0));
    }

    #[test]
    fn alert_lifecycle() {
        use AlertStatus::*;
        assert!(Pending.can_transition_to(Acknowledged));
        assert!(Pending.can_transition_to(Dismissed));
        assert!(Acknowledged.can_transition_to(Resolved));
        assert!(!Pending.can_transition_to(Resolved));
        assert!(!Resolved.can_transition_to(Acknowledged));
        assert!(!Dismissed.can_transition_to(Pending));
    }

    #[test]
    fn condition_serializes_type_and_hides_empty_secondary() {
        let json = serde_json::to_value(condition(ConditionType::Less, 90.0, None)).unwrap();
        assert_eq!(json["type"], "less");
        assert!(json.get("secondaryThreshold").is_none());
    }

    #[test]
    fn parse_values() {
        assert_eq!("patient_vitals".parse::<AlertType>().unwrap(), AlertType::PatientVitals);
        assert_eq!("sms".parse::<Channel>().unwrap(), Channel::Sms);
        assert!("pager".parse::<Channel>().is_err());
        assert!(AlertPriority::Critical > AlertPriority::High);
    }
}
