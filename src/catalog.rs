// Vehicle makes and models lookup

use std::{collections::HashMap, fs, path::Path};

use itertools::Itertools;
use log::debug;

use crate::errors::PreItvError;

/// Makes with commercial presence in the European market.
const EUROPEAN_MAKES: &[&str] = &[
    // European volume brands
    "Alfa Romeo", "Audi", "BMW", "Citroen", "Dacia", "Fiat", "Ford", "Mercedes-Benz", "Opel",
    "Peugeot", "Renault", "SEAT", "Skoda", "Volkswagen", "Volvo",
    // European premium and sports
    "Aston Martin", "Bentley", "Bugatti", "Ferrari", "Jaguar", "Lamborghini", "Land Rover",
    "Lotus", "Maserati", "McLaren", "Mini", "Porsche", "Rolls-Royce",
    // Smaller European brands
    "Cupra", "DS", "Smart",
    // Japanese
    "Honda", "Infiniti", "Lexus", "Mazda", "Mitsubishi", "Nissan", "Subaru", "Suzuki", "Toyota",
    // Korean
    "Hyundai", "Kia", "Genesis",
    // American
    "Chevrolet", "Chrysler", "Dodge", "Jeep", "Tesla",
    // Chinese and emerging brands with official distribution
    "BYD", "MG", "Polestar",
];

/// Source of vehicle makes and models offered to the user.
pub trait VehicleCatalog {
    /// All known makes, sorted and without duplicates
    fn list_makes(&self) -> Result<Vec<String>, PreItvError>;

    /// Models for a make, sorted and without duplicates. Unknown makes yield
    /// an empty list.
    fn list_models(&self, make: &str) -> Result<Vec<String>, PreItvError>;
}

/// Catalog backed by in-memory data.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    makes: Vec<String>,
    models: HashMap<String, Vec<String>>,
}

impl StaticCatalog {
    pub fn new(makes: Vec<String>, models: HashMap<String, Vec<String>>) -> Self {
        Self { makes, models }
    }

    /// The European-market make list with no models attached.
    pub fn european() -> Self {
        Self::new(
            EUROPEAN_MAKES.iter().map(|make| make.to_string()).collect(),
            HashMap::new(),
        )
    }

    /// Attach models from a JSON object mapping each make to its model names.
    ///
    /// Makes only present in the file are added to the make list.
    pub fn with_models_file(mut self, path: &Path) -> Result<Self, PreItvError> {
        let content = fs::read_to_string(path).map_err(|e| PreItvError::DataFileError {
            path: path.display().to_string(),
            source: e,
        })?;
        let models: HashMap<String, Vec<String>> =
            serde_json::from_str(&content).map_err(|e| PreItvError::DataParseError {
                path: path.display().to_string(),
                source: e,
            })?;
        debug!("Loaded models for {} makes from {:?}", models.len(), path);
        for (make, make_models) in models {
            self.add_models(&make, make_models);
        }
        Ok(self)
    }

    pub fn add_models(&mut self, make: &str, models: Vec<String>) {
        if !self
            .makes
            .iter()
            .any(|known| known.eq_ignore_ascii_case(make))
        {
            self.makes.push(make.to_string());
        }
        self.models
            .entry(make.to_lowercase())
            .or_default()
            .extend(models);
    }
}

impl VehicleCatalog for StaticCatalog {
    fn list_makes(&self) -> Result<Vec<String>, PreItvError> {
        Ok(self
            .makes
            .iter()
            .map(|make| make.trim().to_string())
            .filter(|make| !make.is_empty())
            .sorted()
            .dedup()
            .collect())
    }

    fn list_models(&self, make: &str) -> Result<Vec<String>, PreItvError> {
        Ok(self
            .models
            .get(&make.trim().to_lowercase())
            .map(|models| {
                models
                    .iter()
                    .map(|model| model.trim().to_string())
                    .filter(|model| !model.is_empty())
                    .sorted()
                    .dedup()
                    .collect()
            })
            .unwrap_or_default())
    }
}
