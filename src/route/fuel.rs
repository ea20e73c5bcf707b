use std::{fs, path::Path};

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{LatLon, haversine_km};
use crate::errors::PreItvError;

/// Fuel needed for a trip and what it costs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelEstimate {
    pub liters: f64,
    pub cost: f64,
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn non_negative(field: &str, value: f64) -> Result<f64, PreItvError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PreItvError::invalid_input(
            field,
            format!("must be a non-negative number, got {}", value),
        ))
    }
}

/// Liters consumed and their cost over `distance_km`, both rounded to two
/// decimals.
pub fn liters_and_cost(
    distance_km: f64,
    consumption_per_100km: f64,
    price_per_liter: f64,
) -> Result<FuelEstimate, PreItvError> {
    let distance_km = non_negative("distance_km", distance_km)?;
    let consumption = non_negative("consumption_per_100km", consumption_per_100km)?;
    let price = non_negative("price_per_liter", price_per_liter)?;

    let liters = distance_km * consumption / 100.0;
    Ok(FuelEstimate {
        liters: round_cents(liters),
        cost: round_cents(liters * price),
    })
}

/// Parse a price such as "1,579" as published by Spanish fuel price feeds.
pub fn parse_decimal_comma(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse::<f64>().ok()
}

/// A fuel station with its price for the fuel being compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelStation {
    pub brand: String,
    pub address: String,
    pub town: String,
    pub location: LatLon,
    /// Price per liter, `None` when the station does not sell this fuel
    pub price: Option<f64>,
}

impl FuelStation {
    /// Build a station from one record of the Spanish government price feed,
    /// where coordinates and prices are decimal-comma strings and the price
    /// field is named `Precio <fuel_label>`.
    ///
    /// Records without usable coordinates yield `None`.
    pub fn from_feed_record(record: &serde_json::Value, fuel_label: &str) -> Option<Self> {
        let text = |key: &str| record.get(key).and_then(|v| v.as_str()).unwrap_or_default();
        let lat = parse_decimal_comma(text("Latitud"))?;
        let lon = parse_decimal_comma(text("Longitud (WGS84)"))?;
        Some(Self {
            brand: text("Rótulo").to_string(),
            address: text("Dirección").to_string(),
            town: text("Municipio").to_string(),
            location: LatLon::new(lat, lon),
            price: parse_decimal_comma(text(&format!("Precio {}", fuel_label))),
        })
    }
}

/// Load stations from a saved copy of the price feed: either the full
/// response object with a `ListaEESSPrecio` array or the bare array.
pub fn load_feed_file(path: &Path, fuel_label: &str) -> Result<Vec<FuelStation>, PreItvError> {
    let content = fs::read_to_string(path).map_err(|e| PreItvError::DataFileError {
        path: path.display().to_string(),
        source: e,
    })?;
    let feed: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| PreItvError::DataParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    let records = feed
        .get("ListaEESSPrecio")
        .unwrap_or(&feed)
        .as_array()
        .cloned()
        .unwrap_or_default();

    let stations: Vec<FuelStation> = records
        .iter()
        .filter_map(|record| FuelStation::from_feed_record(record, fuel_label))
        .collect();
    debug!(
        "Loaded {} of {} stations from {:?}",
        stations.len(),
        records.len(),
        path
    );
    Ok(stations)
}

/// A station close enough to the route, with its price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationOffer {
    pub station: FuelStation,
    pub price: f64,
}

/// The cheapest stations within `max_distance_km` of any point on `route`.
///
/// Stations without a price are skipped. Results are sorted by ascending
/// price and truncated to `limit`.
pub fn cheapest_on_route(
    stations: &[FuelStation],
    route: &[LatLon],
    max_distance_km: f64,
    limit: usize,
) -> Vec<StationOffer> {
    stations
        .iter()
        .filter_map(|station| {
            let price = station.price.filter(|price| price.is_finite() && *price >= 0.0)?;
            route
                .iter()
                .any(|point| haversine_km(station.location, *point) <= max_distance_km)
                .then(|| StationOffer {
                    station: station.clone(),
                    price,
                })
        })
        .sorted_by(|a, b| a.price.total_cmp(&b.price))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(brand: &str, lat: f64, lon: f64, price: Option<f64>) -> FuelStation {
        FuelStation {
            brand: brand.to_string(),
            address: String::new(),
            town: String::new(),
            location: LatLon::new(lat, lon),
            price,
        }
    }

    #[test]
    fn test_liters_and_cost() {
        let estimate = liters_and_cost(200.0, 6.5, 1.65).unwrap();
        assert_eq!(estimate.liters, 13.0);
        assert_eq!(estimate.cost, 21.45);
    }

    #[test]
    fn test_zero_distance() {
        let estimate = liters_and_cost(0.0, 6.5, 1.65).unwrap();
        assert_eq!(estimate, FuelEstimate { liters: 0.0, cost: 0.0 });
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert!(liters_and_cost(-1.0, 6.5, 1.65).is_err());
        assert!(liters_and_cost(10.0, -6.5, 1.65).is_err());
        assert!(liters_and_cost(10.0, 6.5, f64::NAN).is_err());
    }

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_decimal_comma("1,579"), Some(1.579));
        assert_eq!(parse_decimal_comma(" 1.6 "), Some(1.6));
        assert_eq!(parse_decimal_comma(""), None);
        assert_eq!(parse_decimal_comma("n/a"), None);
    }

    #[test]
    fn test_feed_record() {
        let record = serde_json::json!({
            "Rótulo": "REPSOL",
            "Dirección": "CALLE MAYOR 1",
            "Municipio": "Madrid",
            "Latitud": "40,416775",
            "Longitud (WGS84)": "-3,703790",
            "Precio Gasolina 95 E5": "1,579",
            "Precio Gasoleo A": ""
        });

        let petrol = FuelStation::from_feed_record(&record, "Gasolina 95 E5").unwrap();
        assert_eq!(petrol.brand, "REPSOL");
        assert_eq!(petrol.price, Some(1.579));
        assert!((petrol.location.lat - 40.416775).abs() < 1e-9);

        let diesel = FuelStation::from_feed_record(&record, "Gasoleo A").unwrap();
        assert_eq!(diesel.price, None);

        let no_coords = serde_json::json!({ "Rótulo": "X" });
        assert!(FuelStation::from_feed_record(&no_coords, "Gasoleo A").is_none());
    }

    #[test]
    fn test_station_midway_along_route_is_offered() {
        use crate::route::{RouteService, StraightLineRouter, great_circle_point};

        let madrid = LatLon::new(40.4168, -3.7038);
        let zaragoza = LatLon::new(41.6488, -0.8891);
        let route = StraightLineRouter::default()
            .compute_route(madrid, zaragoza)
            .unwrap();
        let midway = great_circle_point(madrid, zaragoza, 0.5);

        let stations = vec![
            station("MIDWAY", midway.lat, midway.lon, Some(1.20)),
            station("FAR", 43.0, -8.0, Some(1.10)),
        ];
        let offers = cheapest_on_route(&stations, &route.polyline, 5.0, 5);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].station.brand, "MIDWAY");
        assert_eq!(offers[0].price, 1.20);
    }

    #[test]
    fn test_load_feed_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"ListaEESSPrecio": [{{"Rótulo": "A", "Latitud": "40,0", "Longitud (WGS84)": "-3,0", "Precio Gasoleo A": "1,45"}}]}}"#
        )
        .unwrap();
        let stations = load_feed_file(file.path(), "Gasoleo A").unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].price, Some(1.45));
    }

    #[test]
    fn test_cheapest_on_route() {
        let route = vec![LatLon::new(40.4168, -3.7038), LatLon::new(41.3851, 2.1734)];
        let stations = vec![
            station("Expensive", 40.42, -3.70, Some(1.79)),
            station("Cheap", 41.38, 2.17, Some(1.49)),
            station("NoPrice", 40.41, -3.71, None),
            station("FarAway", 37.38, -5.98, Some(1.19)),
            station("Middle", 40.41, -3.69, Some(1.59)),
        ];

        let offers = cheapest_on_route(&stations, &route, 5.0, 2);
        let brands: Vec<&str> = offers.iter().map(|o| o.station.brand.as_str()).collect();
        assert_eq!(brands, vec!["Cheap", "Middle"]);
        assert_eq!(offers[0].price, 1.49);
    }
}
