//! Configuration for dispatch-core

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Assumed mean ambulance speed used by the direct planner
    pub average_speed_kmh: f64,
    /// Multiplier from straight-line to road distance
    pub road_factor: f64,
    /// Event bus buffer per subscriber
    pub event_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            average_speed_kmh: 60.0,
            road_factor: 1.3,
            event_capacity: 256,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.average_speed_kmh.is_finite() && self.average_speed_kmh > 0.0) {
            return Err(DispatchError::Config(format!(
                "average_speed_kmh must be positive, got {}",
                self.average_speed_kmh
            )));
        }
        if !(self.road_factor.is_finite() && self.road_factor >= 1.0) {
            return Err(DispatchError::Config(format!(
                "road_factor must be at least 1.0, got {}",
                self.road_factor
            )));
        }
        Ok(())
    }
}
