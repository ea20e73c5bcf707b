use serde::{Deserialize, Serialize};

use super::{LatLon, haversine_km};
use crate::errors::PreItvError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workshop {
    pub name: String,
    pub address: String,
    pub location: LatLon,
    /// Whether the workshop is an official inspection (ITV) station
    #[serde(default)]
    pub inspection_station: bool,
}

/// Looks up workshops around a point.
pub trait WorkshopDirectory {
    /// Workshops within `radius_km` of `point`, nearest first, each paired
    /// with its distance in kilometres.
    fn workshops_near(
        &self,
        point: LatLon,
        radius_km: f64,
    ) -> Result<Vec<(Workshop, f64)>, PreItvError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkshops {
    workshops: Vec<Workshop>,
}

impl InMemoryWorkshops {
    pub fn new(workshops: Vec<Workshop>) -> Self {
        Self { workshops }
    }

    pub fn add(&mut self, workshop: Workshop) {
        self.workshops.push(workshop);
    }
}

impl WorkshopDirectory for InMemoryWorkshops {
    fn workshops_near(
        &self,
        point: LatLon,
        radius_km: f64,
    ) -> Result<Vec<(Workshop, f64)>, PreItvError> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(PreItvError::invalid_input(
                "radius_km",
                format!("must be a non-negative number, got {}", radius_km),
            ));
        }
        let mut nearby: Vec<(Workshop, f64)> = self
            .workshops
            .iter()
            .map(|workshop| (workshop, haversine_km(point, workshop.location)))
            .filter(|(_, distance)| *distance <= radius_km)
            .map(|(workshop, distance)| (workshop.clone(), distance))
            .collect();
        nearby.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(nearby)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workshop(name: &str, lat: f64, lon: f64) -> Workshop {
        Workshop {
            name: name.to_string(),
            address: String::new(),
            location: LatLon::new(lat, lon),
            inspection_station: false,
        }
    }

    #[test]
    fn test_nearest_first_within_radius() {
        let directory = InMemoryWorkshops::new(vec![
            workshop("Far", 40.60, -3.70),
            workshop("Near", 40.42, -3.70),
            workshop("Other city", 41.38, 2.17),
        ]);
        let found = directory
            .workshops_near(LatLon::new(40.4168, -3.7038), 25.0)
            .unwrap();
        let names: Vec<&str> = found.iter().map(|(w, _)| w.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far"]);
        assert!(found[0].1 < found[1].1);
    }

    #[test]
    fn test_negative_radius_rejected() {
        let directory = InMemoryWorkshops::default();
        assert!(
            directory
                .workshops_near(LatLon::new(0.0, 0.0), -1.0)
                .is_err()
        );
    }
}
