//! # MediNet Alerts-Core
//!
//! Alerts, reusable alert templates and notification settings.
//!
//! - [`AlertService`] owns the alert lifecycle
//!   (`pending → acknowledged → resolved | dismissed`, `pending → dismissed`),
//!   template CRUD, metric evaluation and the notification settings.
//! - [`TemplateEditor`] shapes form input into a validated [`TemplateDraft`].
//! - [`Notifier`] is the delivery seam; [`LoggingNotifier`] only logs.
//!
//! A fired alert is delivered over every channel enabled in both its template
//! and the [`NotificationSettings`], provided its priority reaches the
//! settings' minimum.
//!
//! ```rust
//! use medinet_alerts_core::{AlertService, MetricReading, TemplateEditor, ConditionType};
//!
//! # async fn example() -> medinet_alerts_core::Result<()> {
//! let service = AlertService::in_memory();
//!
//! let mut editor = TemplateEditor::new();
//! editor.name = "SpO2 low".to_string();
//! editor.title = "Low oxygen saturation".to_string();
//! editor.message = "SpO2 at {value}%".to_string();
//! editor.metric = "spo2".to_string();
//! editor.set_condition_type(ConditionType::Less);
//! editor.threshold = 92.0;
//! service.create_template(editor.build()?).await?;
//!
//! let fired = service
//!     .evaluate(&MetricReading { metric: "spo2".to_string(), value: 88.0, hospital_id: None })
//!     .await?;
//! assert_eq!(fired.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod editor;
pub mod error;
pub mod events;
pub mod notifier;
pub mod service;
pub mod settings;
pub mod store;
pub mod types;

pub use editor::{validate_draft, TemplateEditor};
pub use error::{AlertError, Result};
pub use events::AlertEvent;
pub use notifier::{LoggingNotifier, Notifier};
pub use service::AlertService;
pub use settings::NotificationSettings;
pub use store::{AlertStore, InMemoryAlertStore};
pub use types::*;
