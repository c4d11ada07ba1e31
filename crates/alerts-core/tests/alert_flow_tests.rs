//! Template authoring through to alert resolution

use pretty_assertions::assert_eq;

use medinet_alerts_core::*;

fn vitals_editor() -> TemplateEditor {
    let mut editor = TemplateEditor::new();
    editor.name = "Tachycardia".to_string();
    editor.title = "Heart rate out of range".to_string();
    editor.message = "Heart rate {value} bpm".to_string();
    editor.kind = AlertType::PatientVitals;
    editor.priority = AlertPriority::Critical;
    editor.metric = "heart_rate".to_string();
    editor
}

#[tokio::test]
async fn authored_template_fires_and_alert_is_worked_to_resolution() {
    let service = AlertService::in_memory();
    let mut events = service.subscribe();

    let mut editor = vitals_editor();
    editor.set_condition_type(ConditionType::Between);
    editor.threshold = 130.0;
    editor.set_secondary_threshold(220.0).unwrap();
    editor.toggle_channel(Channel::App);
    let template = service.create_template(editor.build().unwrap()).await.unwrap();
    assert_eq!(template.channels, vec![Channel::Dashboard, Channel::App]);

    let fired = service
        .evaluate(&MetricReading {
            metric: "heart_rate".to_string(),
            value: 150.0,
            hospital_id: Some("h-1".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(fired.len(), 1);
    let alert = &fired[0];
    assert_eq!(alert.message, "Heart rate 150 bpm");
    assert_eq!(alert.hospital_id.as_deref(), Some("h-1"));

    assert_eq!(
        events.recv().await.unwrap(),
        AlertEvent::Raised {
            alert_id: alert.id.clone(),
            priority: AlertPriority::Critical,
            template_id: Some(template.id.clone()),
        }
    );

    let open = service.open_counts().await.unwrap();
    assert_eq!(open[&AlertPriority::Critical], 1);

    service.acknowledge(&alert.id, Some("dr.ng".to_string())).await.unwrap();
    let resolved = service.resolve(&alert.id).await.unwrap();
    assert_eq!(resolved.status, AlertStatus::Resolved);
    assert!(matches!(
        service.acknowledge(&alert.id, None).await.unwrap_err(),
        AlertError::InvalidTransition { .. }
    ));

    let open = service.open_counts().await.unwrap();
    assert_eq!(open[&AlertPriority::Critical], 0);
}

#[tokio::test]
async fn editing_a_template_keeps_between_bounds_consistent() {
    let service = AlertService::in_memory();
    let mut editor = vitals_editor();
    editor.set_condition_type(ConditionType::Between);
    editor.threshold = 40.0;
    editor.set_secondary_threshold(60.0).unwrap();
    let template = service.create_template(editor.build().unwrap()).await.unwrap();

    let mut editor = TemplateEditor::from_template(&template);
    assert!(editor.shows_secondary_threshold());
    editor.set_condition_type(ConditionType::Less);
    assert!(!editor.shows_secondary_threshold());
    let updated = service
        .update_template(&template.id, editor.build().unwrap())
        .await
        .unwrap();

    assert_eq!(updated.condition.kind, ConditionType::Less);
    assert_eq!(updated.condition.secondary_threshold, None);
}

#[tokio::test]
async fn api_drafts_are_validated_like_editor_output() {
    let service = AlertService::in_memory();
    let draft = TemplateDraft {
        name: "Bad band".to_string(),
        title: "t".to_string(),
        message: "m".to_string(),
        kind: AlertType::System,
        priority: AlertPriority::Low,
        condition: AlertCondition {
            metric: "cpu".to_string(),
            kind: ConditionType::Between,
            threshold: 90.0,
            secondary_threshold: Some(10.0),
        },
        channels: vec![],
        enabled: true,
    };
    match service.create_template(draft).await.unwrap_err() {
        AlertError::Validation(fields) => {
            assert!(fields.contains_key("secondaryThreshold"));
            assert!(fields.contains_key("channels"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
