use std::{collections::BTreeMap, fs, path::Path};

use log::{debug, info};

use super::LatLon;
use crate::errors::PreItvError;

/// Approximate coordinates of Spanish provincial capitals and large cities.
const SPANISH_CITIES: &[(&str, f64, f64)] = &[
    ("Almería", 36.834, -2.463),
    ("Sevilla", 37.3886, -5.9823),
    ("Córdoba", 37.8847, -4.7791),
    ("Granada", 37.1765, -3.5986),
    ("Málaga", 36.719, -4.420),
    ("Huelva", 37.2614, -6.9447),
    ("Jaén", 37.7796, -3.7849),
    ("Cádiz", 36.5271, -6.2886),
    ("Madrid", 40.4168, -3.7038),
    ("Barcelona", 41.3851, 2.1734),
    ("Valencia", 39.4699, -0.3763),
    ("Alicante", 38.3452, -0.4810),
    ("Bilbao", 43.2630, -2.9349),
    ("San Sebastián", 43.3183, -1.9812),
    ("Vitoria", 42.8460, -2.6726),
    ("Zaragoza", 41.6488, -0.8891),
    ("Oviedo", 43.3619, -5.8494),
    ("Gijón", 43.5322, -5.6611),
    ("Santander", 43.4623, -3.8099),
    ("Logroño", 42.4668, -2.4446),
    ("Pamplona", 42.8125, -1.6458),
    ("Burgos", 42.3439, -3.6969),
    ("León", 42.5987, -5.5671),
    ("Salamanca", 40.9701, -5.6635),
    ("Valladolid", 41.6523, -4.7245),
    ("Toledo", 39.8628, -4.0273),
    ("Cuenca", 40.0704, -2.1374),
    ("Ciudad Real", 38.9869, -3.9272),
    ("Albacete", 38.9943, -1.8575),
    ("Murcia", 37.9922, -1.1307),
    ("Palma de Mallorca", 39.5696, 2.6502),
    ("Las Palmas", 28.1235, -15.4363),
    ("Santa Cruz de Tenerife", 28.4682, -16.2546),
    ("Badajoz", 38.8794, -6.9709),
    ("Cáceres", 39.4753, -6.3722),
];

/// Resolves a place name to coordinates.
pub trait Geocoder {
    fn geocode(&self, city: &str) -> Option<LatLon>;
}

/// A named list of city coordinates.
///
/// Lookups ignore case and surrounding whitespace. The list can be edited and
/// persisted as a JSON object mapping each name to `[lat, lon]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gazetteer {
    cities: BTreeMap<String, LatLon>,
}

fn city_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Gazetteer {
    pub fn spain() -> Self {
        let mut gazetteer = Self::default();
        for (name, lat, lon) in SPANISH_CITIES {
            gazetteer
                .cities
                .insert(name.to_string(), LatLon::new(*lat, *lon));
        }
        gazetteer
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PreItvError> {
        let content = fs::read_to_string(path).map_err(|e| PreItvError::DataFileError {
            path: path.display().to_string(),
            source: e,
        })?;
        let raw: BTreeMap<String, (f64, f64)> =
            serde_json::from_str(&content).map_err(|e| PreItvError::DataParseError {
                path: path.display().to_string(),
                source: e,
            })?;
        debug!("Loaded {} cities from {:?}", raw.len(), path);
        Ok(Self {
            cities: raw
                .into_iter()
                .map(|(name, (lat, lon))| (name, LatLon::new(lat, lon)))
                .collect(),
        })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), PreItvError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PreItvError::DataFileError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let raw: BTreeMap<&str, (f64, f64)> = self
            .cities
            .iter()
            .map(|(name, point)| (name.as_str(), (point.lat, point.lon)))
            .collect();
        let file = fs::File::create(path).map_err(|e| PreItvError::DataFileError {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::to_writer_pretty(file, &raw)
            .map_err(|e| PreItvError::ConfigSerializeError { source: e })
    }

    /// City names in alphabetical order.
    pub fn list(&self) -> Vec<(&str, LatLon)> {
        self.cities
            .iter()
            .map(|(name, point)| (name.as_str(), *point))
            .collect()
    }

    fn find_name(&self, city: &str) -> Option<&String> {
        let key = city_key(city);
        self.cities.keys().find(|name| city_key(name) == key)
    }

    pub fn add_city(&mut self, name: &str, point: LatLon) -> Result<(), PreItvError> {
        if name.trim().is_empty() {
            return Err(PreItvError::invalid_input("city", "must not be empty"));
        }
        if let Some(existing) = self.find_name(name) {
            return Err(PreItvError::invalid_input(
                "city",
                format!("{} already exists", existing),
            ));
        }
        info!("Adding city {} at {}", name.trim(), point);
        self.cities.insert(name.trim().to_string(), point);
        Ok(())
    }

    pub fn update_city(&mut self, name: &str, point: LatLon) -> Result<(), PreItvError> {
        let existing = self
            .find_name(name)
            .cloned()
            .ok_or_else(|| PreItvError::CityNotFound {
                city: name.to_string(),
            })?;
        self.cities.insert(existing, point);
        Ok(())
    }

    pub fn remove_city(&mut self, name: &str) -> Result<LatLon, PreItvError> {
        let existing = self
            .find_name(name)
            .cloned()
            .ok_or_else(|| PreItvError::CityNotFound {
                city: name.to_string(),
            })?;
        self.cities
            .remove(&existing)
            .ok_or(PreItvError::CityNotFound { city: existing })
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl Geocoder for Gazetteer {
    fn geocode(&self, city: &str) -> Option<LatLon> {
        self.find_name(city)
            .and_then(|name| self.cities.get(name))
            .copied()
    }
}
