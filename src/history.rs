// Per-user history of checklists and routes

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{errors::PreItvError, vehicle::FuelType};

/// What the user searched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Vehicle {
        make: String,
        model: String,
        registration_year: i32,
        mileage_km: u32,
        fuel_type: FuelType,
        task_count: usize,
    },
    Route {
        origin: String,
        destination: String,
        distance_km: f64,
        duration_min: f64,
        liters: f64,
        cost: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub recorded_at: DateTime<Utc>,
    pub entry: HistoryEntry,
}

impl HistoryRecord {
    pub fn now(entry: HistoryEntry) -> Self {
        Self {
            recorded_at: Utc::now(),
            entry,
        }
    }
}

/// Usage summary over a user's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub vehicles: usize,
    pub routes: usize,
    /// Mean liters per route, `None` without routes
    pub mean_liters: Option<f64>,
    /// Mean fuel cost per route, `None` without routes
    pub mean_cost: Option<f64>,
}

impl HistoryStats {
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        let mut stats = Self::default();
        let (mut liters_sum, mut cost_sum) = (0.0, 0.0);
        for record in records {
            match &record.entry {
                HistoryEntry::Vehicle { .. } => stats.vehicles += 1,
                HistoryEntry::Route { liters, cost, .. } => {
                    stats.routes += 1;
                    liters_sum += liters;
                    cost_sum += cost;
                }
            }
        }
        if stats.routes > 0 {
            let routes = stats.routes as f64;
            stats.mean_liters = Some(liters_sum / routes);
            stats.mean_cost = Some(cost_sum / routes);
        }
        stats
    }
}

/// Trait defining the interface for persisted search history
pub trait HistoryStore {
    /// Append a record to the user's history
    fn save_search(&mut self, user_id: &str, record: &HistoryRecord) -> Result<(), PreItvError>;

    /// All records of the user, oldest first
    fn load_history(&self, user_id: &str) -> Result<Vec<HistoryRecord>, PreItvError>;
}

fn check_user_id(user_id: &str) -> Result<(), PreItvError> {
    if user_id.trim().is_empty() {
        return Err(PreItvError::invalid_input("user_id", "must not be empty"));
    }
    Ok(())
}

/// History kept as one JSON-lines file per user.
pub struct JsonLinesHistory {
    storage_path: PathBuf,
}

impl JsonLinesHistory {
    /// Create a store rooted at `storage_path`, creating the directory if needed
    pub fn new(storage_path: PathBuf) -> Result<Self, PreItvError> {
        if !storage_path.exists() {
            fs::create_dir_all(&storage_path)
                .map_err(|e| PreItvError::HistoryIOError { source: e })?;
        }
        Ok(Self { storage_path })
    }

    pub fn new_default() -> Result<Self, PreItvError> {
        Self::new(Self::default_storage_path()?)
    }

    pub fn default_storage_path() -> Result<PathBuf, PreItvError> {
        let app_data_dir = dirs::data_dir().ok_or(PreItvError::NoConfigDir)?;
        Ok(app_data_dir.join("preitv").join("history"))
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Normalize a user id into a safe file name
    fn normalize_user_id(user_id: &str) -> String {
        user_id
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect()
    }

    fn file_path_for_user(&self, user_id: &str) -> PathBuf {
        self.storage_path
            .join(format!("{}.jsonl", Self::normalize_user_id(user_id)))
    }
}

impl HistoryStore for JsonLinesHistory {
    fn save_search(&mut self, user_id: &str, record: &HistoryRecord) -> Result<(), PreItvError> {
        check_user_id(user_id)?;
        let path = self.file_path_for_user(user_id);
        serde_jsonlines::append_json_lines(&path, [record])
            .map_err(|e| PreItvError::HistoryIOError { source: e })?;
        debug!("Appended history record to {:?}", path);
        Ok(())
    }

    fn load_history(&self, user_id: &str) -> Result<Vec<HistoryRecord>, PreItvError> {
        check_user_id(user_id)?;
        let path = self.file_path_for_user(user_id);
        if !path.exists() {
            debug!("No history file for user at {:?}", path);
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines(&path)
            .map_err(|e| PreItvError::HistoryIOError { source: e })?
            .collect::<Result<Vec<HistoryRecord>, std::io::Error>>()
            .map_err(|e| PreItvError::HistoryIOError { source: e })
    }
}

/// History kept in memory only, for tests and anonymous sessions.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    records: HashMap<String, Vec<HistoryRecord>>,
}

impl HistoryStore for InMemoryHistory {
    fn save_search(&mut self, user_id: &str, record: &HistoryRecord) -> Result<(), PreItvError> {
        check_user_id(user_id)?;
        self.records
            .entry(user_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn load_history(&self, user_id: &str) -> Result<Vec<HistoryRecord>, PreItvError> {
        check_user_id(user_id)?;
        Ok(self.records.get(user_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_record(origin: &str) -> HistoryRecord {
        HistoryRecord::now(HistoryEntry::Route {
            origin: origin.to_string(),
            destination: "Madrid".to_string(),
            distance_km: 390.0,
            duration_min: 240.0,
            liters: 25.35,
            cost: 41.83,
        })
    }

    fn vehicle_record() -> HistoryRecord {
        HistoryRecord::now(HistoryEntry::Vehicle {
            make: "Seat".to_string(),
            model: "Ibiza".to_string(),
            registration_year: 2018,
            mileage_km: 90_000,
            fuel_type: FuelType::Petrol,
            task_count: 9,
        })
    }

    #[test]
    fn test_stats_of_empty_history() {
        assert_eq!(HistoryStats::from_records(&[]), HistoryStats::default());
        assert_eq!(HistoryStats::from_records(&[]).mean_cost, None);
    }

    #[test]
    fn test_stats_count_and_average() {
        let mut store = InMemoryHistory::default();
        store.save_search("ana", &vehicle_record()).unwrap();
        store.save_search("ana", &route_record("Sevilla")).unwrap();
        let mut cheaper = route_record("Toledo");
        if let HistoryEntry::Route { liters, cost, .. } = &mut cheaper.entry {
            *liters = 4.65;
            *cost = 8.17;
        }
        store.save_search("ana", &cheaper).unwrap();

        let stats = HistoryStats::from_records(&store.load_history("ana").unwrap());
        assert_eq!(stats.vehicles, 1);
        assert_eq!(stats.routes, 2);
        assert!((stats.mean_liters.unwrap() - 15.0).abs() < 1e-9);
        assert!((stats.mean_cost.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_without_routes() {
        let stats = HistoryStats::from_records(&[vehicle_record(), vehicle_record()]);
        assert_eq!(stats.vehicles, 2);
        assert_eq!(stats.routes, 0);
        assert_eq!(stats.mean_liters, None);
    }

    #[test]
    fn test_in_memory_history_keeps_users_apart() {
        let mut store = InMemoryHistory::default();
        store.save_search("ana", &route_record("Sevilla")).unwrap();
        store.save_search("luis", &route_record("Bilbao")).unwrap();

        assert_eq!(store.load_history("ana").unwrap().len(), 1);
        assert!(store.load_history("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_empty_user_id_rejected() {
        let mut store = InMemoryHistory::default();
        assert!(store.save_search("  ", &route_record("Sevilla")).is_err());
        assert!(store.load_history("").is_err());
    }

    #[test]
    fn test_normalize_user_id() {
        assert_eq!(
            JsonLinesHistory::normalize_user_id("Ana.Garcia@example.com"),
            "ana_garcia_example_com"
        );
    }

    #[test]
    fn test_missing_history_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonLinesHistory::new(dir.path().join("history")).unwrap();
        assert!(store.load_history("ana").unwrap().is_empty());
    }
}
