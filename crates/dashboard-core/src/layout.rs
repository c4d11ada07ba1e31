//! Ordered, toggleable sections of the overview page.
//!
//! Moves swap a section with its neighbour; moving the first section up or
//! the last one down changes nothing. Every effective change is reported to
//! the optional `on_change` callback with the new order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

fn visible_by_default() -> bool {
    true
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Callback receiving the section order after a change
pub type LayoutCallback = Arc<dyn Fn(&[Section]) + Send + Sync>;

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionLayout {
    sections: Vec<Section>,
    #[serde(skip)]
    on_change: Option<LayoutCallback>,
}

impl SectionLayout {
    pub fn new(sections: Vec<Section>) -> Result<Self> {
        let layout = Self {
            sections,
            on_change: None,
        };
        layout.check_unique()?;
        Ok(layout)
    }

    /// The sections the overview page ships with
    pub fn overview() -> Self {
        Self {
            sections: vec![
                Section::new("network-status", "Network Status"),
                Section::new("ambulance-fleet", "Ambulance Fleet"),
                Section::new("pending-requests", "Pending Requests"),
                Section::new("active-routes", "Active Routes"),
                Section::new("alerts", "Alerts"),
                Section::new("resources", "Resources"),
            ],
            on_change: None,
        }
    }

    pub fn on_change(&mut self, callback: impl Fn(&[Section]) + Send + Sync + 'static) {
        self.on_change = Some(Arc::new(callback));
    }

    pub(crate) fn take_callback(&mut self) -> Option<LayoutCallback> {
        self.on_change.take()
    }

    pub(crate) fn set_callback(&mut self, callback: Option<LayoutCallback>) {
        self.on_change = callback;
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn visible_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.visible)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.id.as_str()).collect()
    }

    /// Returns whether the order changed
    pub fn move_up(&mut self, id: &str) -> Result<bool> {
        let index = self.position(id)?;
        if index == 0 {
            return Ok(false);
        }
        self.sections.swap(index, index - 1);
        self.changed();
        Ok(true)
    }

    /// Returns whether the order changed
    pub fn move_down(&mut self, id: &str) -> Result<bool> {
        let index = self.position(id)?;
        if index + 1 >= self.sections.len() {
            return Ok(false);
        }
        self.sections.swap(index, index + 1);
        self.changed();
        Ok(true)
    }

    pub fn move_section(&mut self, id: &str, direction: Direction) -> Result<bool> {
        match direction {
            Direction::Up => self.move_up(id),
            Direction::Down => self.move_down(id),
        }
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) -> Result<bool> {
        let index = self.position(id)?;
        if self.sections[index].visible == visible {
            return Ok(false);
        }
        self.sections[index].visible = visible;
        self.changed();
        Ok(true)
    }

    pub(crate) fn check_unique(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.id.as_str()) {
                return Err(DashboardError::DuplicateSection(section.id.clone()));
            }
        }
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.sections
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| DashboardError::SectionNotFound(id.to_string()))
    }

    fn changed(&self) {
        debug!("Overview layout now {:?}", self.ids());
        if let Some(callback) = &self.on_change {
            callback(&self.sections);
        }
    }
}

impl PartialEq for SectionLayout {
    fn eq(&self, other: &Self) -> bool {
        self.sections == other.sections
    }
}

impl fmt::Debug for SectionLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionLayout")
            .field("sections", &self.sections)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn layout() -> SectionLayout {
        SectionLayout::new(vec![
            Section::new("a", "A"),
            Section::new("b", "B"),
            Section::new("c", "C"),
        ])
        .unwrap()
    }

    #[test]
    fn first_down_then_up_restores_order() {
        let mut layout = layout();
        assert!(layout.move_down("a").unwrap());
        assert_eq!(layout.ids(), vec!["b", "a", "c"]);
        assert!(layout.move_up("a").unwrap());
        assert_eq!(layout.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn moves_at_edges_are_no_ops() {
        let mut layout = layout();
        assert!(!layout.move_up("a").unwrap());
        assert!(!layout.move_down("c").unwrap());
        assert_eq!(layout.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_section_is_an_error() {
        let mut layout = layout();
        assert!(matches!(
            layout.move_up("zzz"),
            Err(DashboardError::SectionNotFound(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = SectionLayout::new(vec![Section::new("a", "A"), Section::new("a", "Again")]);
        assert!(matches!(result, Err(DashboardError::DuplicateSection(_))));
    }

    #[test]
    fn on_change_sees_new_order_only_for_effective_changes() {
        let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
        let mut layout = layout();
        let sink = seen.clone();
        layout.on_change(move |sections| {
            sink.lock()
                .push(sections.iter().map(|s| s.id.clone()).collect());
        });

        layout.move_up("a").unwrap();
        layout.move_down("b").unwrap();
        layout.set_visible("c", false).unwrap();
        layout.set_visible("c", false).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], vec!["a", "c", "b"]);
        assert_eq!(layout.visible_sections().count(), 2);
    }

    #[test]
    fn serializes_as_plain_list() {
        let json = serde_json::to_value(layout()).unwrap();
        assert_eq!(json[1]["id"], "b");
        let back: SectionLayout = serde_json::from_value(json).unwrap();
        assert_eq!(back, layout());
    }
}
