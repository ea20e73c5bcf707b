use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    checklist::RuleTable, errors::PreItvError, history::JsonLinesHistory,
    route::StraightLineRouter, vehicle::FuelType,
};

const CONFIG_DIR_NAME: &str = "preitv";
const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_CONSUMPTION_L_100KM: f64 = 6.5;
pub const DEFAULT_FUEL_PRICE_PER_LITER: f64 = 1.65;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub default_consumption_l_100km: f64,
    pub default_fuel_price_per_liter: f64,
    pub road_factor: f64,
    pub average_speed_kmh: f64,
    /// Replaces the built-in maintenance rule table
    pub rules_file: Option<PathBuf>,
    /// Replaces the built-in city list
    pub gazetteer_file: Option<PathBuf>,
    /// JSON map of make to model names
    pub models_file: Option<PathBuf>,
    pub history_dir: Option<PathBuf>,
    /// Only recommend the Petrol ignition service from this mileage on
    pub petrol_ignition_min_km: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let router = StraightLineRouter::default();
        Self {
            default_consumption_l_100km: DEFAULT_CONSUMPTION_L_100KM,
            default_fuel_price_per_liter: DEFAULT_FUEL_PRICE_PER_LITER,
            road_factor: router.road_factor,
            average_speed_kmh: router.average_speed_kmh,
            rules_file: None,
            gazetteer_file: None,
            models_file: None,
            history_dir: None,
            petrol_ignition_min_km: None,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf, PreItvError> {
        Ok(dirs::config_dir()
            .ok_or(PreItvError::NoConfigDir)?
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Load the user's config file, `None` when there is none yet.
    pub fn from_local_file() -> Result<Option<Self>, PreItvError> {
        Self::from_file(&Self::config_path()?)
    }

    pub fn from_file(config_path: &std::path::Path) -> Result<Option<Self>, PreItvError> {
        if !config_path.exists() {
            debug!("No config file at {:?}, using defaults", config_path);
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| PreItvError::ConfigIOError { source: e })?;
        serde_json::from_reader(file)
            .map(Some)
            .map_err(|e| PreItvError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), PreItvError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), PreItvError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PreItvError::ConfigIOError { source: e })?;
        }
        let file = std::fs::File::create(config_path)
            .map_err(|e| PreItvError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| PreItvError::ConfigSerializeError { source: e })
    }

    /// The rule table this config selects, with the Petrol gate applied.
    pub fn rule_table(&self) -> Result<RuleTable, PreItvError> {
        let table = match &self.rules_file {
            Some(path) => RuleTable::from_json_file(path)?,
            None => RuleTable::standard().clone(),
        };
        Ok(match self.petrol_ignition_min_km {
            Some(gate_km) => table.with_fuel_gate(FuelType::Petrol, gate_km),
            None => table,
        })
    }

    pub fn router(&self) -> StraightLineRouter {
        StraightLineRouter {
            road_factor: self.road_factor,
            average_speed_kmh: self.average_speed_kmh,
        }
    }

    pub fn history_dir(&self) -> Result<PathBuf, PreItvError> {
        match &self.history_dir {
            Some(dir) => Ok(dir.clone()),
            None => JsonLinesHistory::default_storage_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::Trigger;

    #[test]
    fn test_missing_file_yields_none() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(
            AppConfig::from_file(&dir.path().join("config.json")).unwrap(),
            None
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("preitv").join("config.json");
        let config = AppConfig {
            petrol_ignition_min_km: Some(40_000),
            default_fuel_price_per_liter: 1.49,
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap(), Some(config));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"road_factor": 1.4}"#).unwrap();
        let config = AppConfig::from_file(&path).unwrap().unwrap();
        assert_eq!(config.road_factor, 1.4);
        assert_eq!(config.default_consumption_l_100km, DEFAULT_CONSUMPTION_L_100KM);
    }

    #[test]
    fn test_rule_table_applies_petrol_gate() {
        let config = AppConfig {
            petrol_ignition_min_km: Some(40_000),
            ..AppConfig::default()
        };
        let table = config.rule_table().unwrap();
        assert!(table.rules.iter().any(|rule| rule.trigger
            == Trigger::Fuel {
                fuel: FuelType::Petrol,
                min_km: Some(40_000)
            }));
    }
}
