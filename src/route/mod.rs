// Route planning: distances, trip duration and fuel cost

use log::debug;
use serde::{Deserialize, Serialize};
use uom::si::f64::{Length, Time};
use uom::si::length::kilometer;
use uom::si::time::{hour, minute};

use crate::errors::PreItvError;

pub mod fuel;
pub mod geocode;
pub mod workshops;

pub use fuel::{
    FuelEstimate, FuelStation, StationOffer, cheapest_on_route, liters_and_cost, load_feed_file,
    parse_decimal_comma,
};
pub use geocode::{Gazetteer, Geocoder};
pub use workshops::{InMemoryWorkshops, Workshop, WorkshopDirectory};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Maximum spacing between consecutive points of an estimated route.
pub const POLYLINE_STEP_KM: f64 = 5.0;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: LatLon, b: LatLon) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// The point a `fraction` of the way from `a` to `b` along the great circle.
pub fn great_circle_point(a: LatLon, b: LatLon, fraction: f64) -> LatLon {
    let angle = haversine_km(a, b) / EARTH_RADIUS_KM;
    if angle < f64::EPSILON {
        return a;
    }
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let wa = ((1.0 - fraction) * angle).sin() / angle.sin();
    let wb = (fraction * angle).sin() / angle.sin();

    let x = wa * lat1.cos() * lon1.cos() + wb * lat2.cos() * lon2.cos();
    let y = wa * lat1.cos() * lon1.sin() + wb * lat2.cos() * lon2.sin();
    let z = wa * lat1.sin() + wb * lat2.sin();
    LatLon::new(
        z.atan2((x * x + y * y).sqrt()).to_degrees(),
        y.atan2(x).to_degrees(),
    )
}

/// Points along the great circle from `a` to `b`, both included, no more than
/// `step_km` apart.
pub fn great_circle_polyline(a: LatLon, b: LatLon, step_km: f64) -> Vec<LatLon> {
    let distance = haversine_km(a, b);
    let segments = if step_km > 0.0 {
        (distance / step_km).ceil().max(1.0) as usize
    } else {
        1
    };
    let mut points = Vec::with_capacity(segments + 1);
    points.push(a);
    points.extend((1..segments).map(|i| great_circle_point(a, b, i as f64 / segments as f64)));
    points.push(b);
    points
}

/// A computed driving route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance: Length,
    pub duration: Time,
    /// Points along the route, origin first
    pub polyline: Vec<LatLon>,
}

impl RouteSummary {
    pub fn distance_km(&self) -> f64 {
        self.distance.get::<kilometer>()
    }

    pub fn duration_min(&self) -> f64 {
        self.duration.get::<minute>()
    }
}

/// Computes driving routes between two points.
pub trait RouteService {
    fn compute_route(&self, origin: LatLon, destination: LatLon)
    -> Result<RouteSummary, PreItvError>;
}

/// Offline route estimate from the great-circle distance.
///
/// The distance is stretched by `road_factor` to approximate the road network
/// and driven at a constant `average_speed_kmh`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightLineRouter {
    pub road_factor: f64,
    pub average_speed_kmh: f64,
}

impl Default for StraightLineRouter {
    fn default() -> Self {
        Self {
            road_factor: 1.25,
            average_speed_kmh: 80.0,
        }
    }
}

impl RouteService for StraightLineRouter {
    fn compute_route(
        &self,
        origin: LatLon,
        destination: LatLon,
    ) -> Result<RouteSummary, PreItvError> {
        if !(self.road_factor >= 1.0 && self.average_speed_kmh > 0.0) {
            return Err(PreItvError::RouteUnavailable {
                reason: format!(
                    "invalid router settings (road factor {}, speed {} km/h)",
                    self.road_factor, self.average_speed_kmh
                ),
            });
        }
        let straight_km = haversine_km(origin, destination);
        if straight_km < f64::EPSILON {
            return Err(PreItvError::RouteUnavailable {
                reason: "origin and destination are the same point".to_string(),
            });
        }

        let distance_km = straight_km * self.road_factor;
        let hours = distance_km / self.average_speed_kmh;
        debug!(
            "Estimated route {} -> {}: {:.1} km in {:.2} h",
            origin, destination, distance_km, hours
        );

        Ok(RouteSummary {
            distance: Length::new::<kilometer>(distance_km),
            duration: Time::new::<hour>(hours),
            polyline: great_circle_polyline(origin, destination, POLYLINE_STEP_KM),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MADRID: LatLon = LatLon {
        lat: 40.4168,
        lon: -3.7038,
    };
    const BARCELONA: LatLon = LatLon {
        lat: 41.3851,
        lon: 2.1734,
    };

    #[test]
    fn test_haversine_madrid_barcelona() {
        let distance = haversine_km(MADRID, BARCELONA);
        assert!((distance - 505.0).abs() < 5.0, "got {}", distance);
        assert!((haversine_km(BARCELONA, MADRID) - distance).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_same_point() {
        assert_eq!(haversine_km(MADRID, MADRID), 0.0);
    }

    #[test]
    fn test_straight_line_route() {
        let router = StraightLineRouter {
            road_factor: 1.2,
            average_speed_kmh: 100.0,
        };
        let route = router.compute_route(MADRID, BARCELONA).unwrap();
        let expected_km = haversine_km(MADRID, BARCELONA) * 1.2;
        assert!((route.distance_km() - expected_km).abs() < 1e-6);
        assert!((route.duration_min() - expected_km / 100.0 * 60.0).abs() < 1e-6);
        assert_eq!(route.polyline.first(), Some(&MADRID));
        assert_eq!(route.polyline.last(), Some(&BARCELONA));
        assert!(
            route
                .polyline
                .windows(2)
                .all(|pair| haversine_km(pair[0], pair[1]) <= POLYLINE_STEP_KM + 1e-6)
        );
    }

    #[test]
    fn test_great_circle_point() {
        let midpoint = great_circle_point(MADRID, BARCELONA, 0.5);
        let to_start = haversine_km(MADRID, midpoint);
        let to_end = haversine_km(midpoint, BARCELONA);
        assert!((to_start - to_end).abs() < 1e-6);
        assert!((to_start + to_end - haversine_km(MADRID, BARCELONA)).abs() < 1e-6);
        assert_eq!(great_circle_point(MADRID, MADRID, 0.5), MADRID);
    }

    #[test]
    fn test_short_polyline_keeps_endpoints() {
        let near = LatLon::new(40.42, -3.70);
        assert_eq!(
            great_circle_polyline(MADRID, near, POLYLINE_STEP_KM),
            vec![MADRID, near]
        );
    }

    #[test]
    fn test_route_to_same_point_fails() {
        let result = StraightLineRouter::default().compute_route(MADRID, MADRID);
        assert!(matches!(result, Err(PreItvError::RouteUnavailable { .. })));
    }

    #[test]
    fn test_invalid_router_settings() {
        let router = StraightLineRouter {
            road_factor: 1.0,
            average_speed_kmh: 0.0,
        };
        assert!(router.compute_route(MADRID, BARCELONA).is_err());
    }
}
