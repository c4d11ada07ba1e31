//! Route planning seam.
//!
//! The console never computed routes itself; distance and travel time come
//! from a [`RoutePlanner`]. [`DirectRoutePlanner`] is the built-in estimate:
//! great-circle legs stretched by a road factor at a constant speed.

use async_trait::async_trait;

use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::types::Coordinates;

/// Origin hospital → pickup → destination hospital
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    pub origin: Coordinates,
    pub pickup: Coordinates,
    pub destination: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePlan {
    pub distance_km: f64,
    pub duration_minutes: u32,
}

#[async_trait]
pub trait RoutePlanner: Send + Sync {
    async fn plan(&self, leg: &RouteLeg) -> Result<RoutePlan>;
}

#[derive(Debug, Clone)]
pub struct DirectRoutePlanner {
    average_speed_kmh: f64,
    road_factor: f64,
}

impl DirectRoutePlanner {
    pub fn new(average_speed_kmh: f64, road_factor: f64) -> Self {
        Self {
            average_speed_kmh,
            road_factor,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.average_speed_kmh, config.road_factor)
    }
}

#[async_trait]
impl RoutePlanner for DirectRoutePlanner {
    async fn plan(&self, leg: &RouteLeg) -> Result<RoutePlan> {
        for point in [leg.origin, leg.pickup, leg.destination] {
            if !point.is_valid() {
                return Err(DispatchError::Planner(format!(
                    "invalid coordinates ({}, {})",
                    point.lat, point.lng
                )));
            }
        }

        let straight = leg.origin.distance_km(&leg.pickup) + leg.pickup.distance_km(&leg.destination);
        let distance_km = (straight * self.road_factor * 10.0).round() / 10.0;
        let minutes = (distance_km / self.average_speed_kmh * 60.0).ceil() as u32;

        Ok(RoutePlan {
            distance_km,
            duration_minutes: minutes.max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_point_takes_one_minute() {
        let p = Coordinates::new(10.0, 10.0);
        let plan = DirectRoutePlanner::new(60.0, 1.3)
            .plan(&RouteLeg { origin: p, pickup: p, destination: p })
            .await
            .unwrap();
        assert_eq!(plan.distance_km, 0.0);
        assert_eq!(plan.duration_minutes, 1);
    }

    #[tokio::test]
    async fn duration_follows_speed() {
        // one degree of latitude is ~111.2 km
        let leg = RouteLeg {
            origin: Coordinates::new(0.0, 0.0),
            pickup: Coordinates::new(1.0, 0.0),
            destination: Coordinates::new(1.0, 0.0),
        };
        let plan = DirectRoutePlanner::new(60.0, 1.0).plan(&leg).await.unwrap();
        assert!((plan.distance_km - 111.2).abs() < 0.1);
        assert_eq!(plan.duration_minutes, 112);
    }

    #[tokio::test]
    async fn rejects_invalid_coordinates() {
        let leg = RouteLeg {
            origin: Coordinates::new(0.0, 0.0),
            pickup: Coordinates::new(0.0, 200.0),
            destination: Coordinates::new(0.0, 0.0),
        };
        let err = DirectRoutePlanner::new(60.0, 1.3).plan(&leg).await.unwrap_err();
        assert!(matches!(err, DispatchError::Planner(_)));
    }
}
