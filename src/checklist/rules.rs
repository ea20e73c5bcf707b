use std::{fs, path::Path, sync::LazyLock};

use serde::{Deserialize, Serialize};

use super::Category;
use crate::{errors::PreItvError, vehicle::FuelType};

/// The condition under which a maintenance rule fires.
///
/// Rules are evaluated in stages: every mileage rule first, then age rules,
/// then the fuel-specific rules, then make-specific rules. Within a stage
/// rules are ordered by ascending threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires when the odometer reading is at or above `min_km`
    Mileage { min_km: u32 },
    /// Fires when the vehicle is at least `min_years` old
    Age { min_years: u32 },
    /// Fires for one fuel type, optionally gated on a mileage threshold
    Fuel {
        fuel: FuelType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_km: Option<u32>,
    },
    /// Fires for one vehicle make (case-insensitive)
    Make { make: String },
}

/// The facts a rule table is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct VehicleFacts<'a> {
    pub age_years: u32,
    pub mileage_km: u32,
    pub fuel_type: FuelType,
    pub make: Option<&'a str>,
}

impl Trigger {
    pub fn fires(&self, facts: &VehicleFacts<'_>) -> bool {
        match self {
            Trigger::Mileage { min_km } => facts.mileage_km >= *min_km,
            Trigger::Age { min_years } => facts.age_years >= *min_years,
            Trigger::Fuel { fuel, min_km } => {
                *fuel == facts.fuel_type && min_km.is_none_or(|km| facts.mileage_km >= km)
            }
            Trigger::Make { make } => facts
                .make
                .is_some_and(|candidate| candidate.trim().eq_ignore_ascii_case(make.trim())),
        }
    }

    /// Evaluation stage: mileage, age, fuel, make.
    pub(crate) fn stage(&self) -> u8 {
        match self {
            Trigger::Mileage { .. } => 0,
            Trigger::Age { .. } => 1,
            Trigger::Fuel { .. } => 2,
            Trigger::Make { .. } => 3,
        }
    }

    pub(crate) fn threshold(&self) -> u32 {
        match self {
            Trigger::Mileage { min_km } => *min_km,
            Trigger::Age { min_years } => *min_years,
            Trigger::Fuel { min_km, .. } => min_km.unwrap_or(0),
            Trigger::Make { .. } => 0,
        }
    }
}

/// A threshold-triggered maintenance recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRule {
    pub trigger: Trigger,
    /// Task text shown to the user, also the deduplication key
    pub task: String,
    pub category: Category,
    /// Estimated workshop cost in euros
    #[serde(default)]
    pub estimated_cost: f64,
}

impl MaintenanceRule {
    fn new(trigger: Trigger, task: &str, category: Category, estimated_cost: f64) -> Self {
        Self {
            trigger,
            task: task.to_string(),
            category,
            estimated_cost,
        }
    }
}

/// The single, versioned table of maintenance rules.
///
/// Custom tables can be loaded from JSON; the order of rules in the file does
/// not affect the order of the generated checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    pub version: u32,
    pub rules: Vec<MaintenanceRule>,
}

static STANDARD_TABLE: LazyLock<RuleTable> = LazyLock::new(RuleTable::build_standard);

impl RuleTable {
    /// The built-in rule table.
    pub fn standard() -> &'static RuleTable {
        &STANDARD_TABLE
    }

    fn build_standard() -> RuleTable {
        use Category::*;
        use Trigger as T;

        let rules = vec![
            // Mileage bands
            MaintenanceRule::new(
                T::Mileage { min_km: 5_000 },
                "Check oil level, leaks and tyres to avoid premature wear",
                Mileage,
                25.0,
            ),
            MaintenanceRule::new(
                T::Mileage { min_km: 10_000 },
                "Wheel alignment, balancing and tyre rotation to keep the car stable",
                Mileage,
                60.0,
            ),
            MaintenanceRule::new(
                T::Mileage { min_km: 15_000 },
                "Change oil and filter, check brakes and battery",
                Mileage,
                120.0,
            ),
            MaintenanceRule::new(
                T::Mileage { min_km: 30_000 },
                "Replace brake pads and inspect discs",
                Mileage,
                150.0,
            ),
            MaintenanceRule::new(
                T::Mileage { min_km: 60_000 },
                "Replace air and fuel filters, inspect timing belt",
                Mileage,
                180.0,
            ),
            MaintenanceRule::new(
                T::Mileage { min_km: 80_000 },
                "Replace coolant and inspect water pump",
                Mileage,
                90.0,
            ),
            MaintenanceRule::new(
                T::Mileage { min_km: 100_000 },
                "Replace timing belt and inspect cooling system",
                Mileage,
                450.0,
            ),
            // Age bands
            MaintenanceRule::new(
                T::Age { min_years: 4 },
                "Check lights, indicators and suspension (ITV requirements)",
                Age,
                40.0,
            ),
            MaintenanceRule::new(
                T::Age { min_years: 8 },
                "Full inspection of brakes, steering and chassis",
                Age,
                120.0,
            ),
            // Fuel specific
            MaintenanceRule::new(
                T::Fuel {
                    fuel: FuelType::Petrol,
                    min_km: None,
                },
                "Replace spark plugs and check ignition",
                FuelSpecific,
                90.0,
            ),
            MaintenanceRule::new(
                T::Fuel {
                    fuel: FuelType::Diesel,
                    min_km: None,
                },
                "Check diesel particulate filter (DPF) and injection",
                FuelSpecific,
                140.0,
            ),
            MaintenanceRule::new(
                T::Fuel {
                    fuel: FuelType::Hybrid,
                    min_km: None,
                },
                "Check hybrid battery and electric system",
                FuelSpecific,
                80.0,
            ),
            MaintenanceRule::new(
                T::Fuel {
                    fuel: FuelType::Electric,
                    min_km: None,
                },
                "Check traction battery and charging system",
                FuelSpecific,
                90.0,
            ),
            // Make specific
            MaintenanceRule::new(
                T::Make {
                    make: "Volkswagen".to_string(),
                },
                "Check DSG gearbox service record",
                Other,
                60.0,
            ),
            MaintenanceRule::new(
                T::Make {
                    make: "Alfa Romeo".to_string(),
                },
                "Check electrical connectors and dashboard warning lights",
                Other,
                45.0,
            ),
            MaintenanceRule::new(
                T::Make {
                    make: "Tesla".to_string(),
                },
                "Inspect suspension arms and tyre wear on the rear axle",
                Other,
                70.0,
            ),
        ];

        RuleTable { version: 1, rules }
    }

    /// Load and validate a rule table from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, PreItvError> {
        let content = fs::read_to_string(path).map_err(|e| PreItvError::DataFileError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json_str(&content).map_err(|e| match e {
            PreItvError::DataParseError { source, .. } => PreItvError::DataParseError {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, PreItvError> {
        let table: RuleTable =
            serde_json::from_str(content).map_err(|e| PreItvError::DataParseError {
                path: "<inline>".to_string(),
                source: e,
            })?;
        table.validate()?;
        Ok(table)
    }

    /// Reject tables with empty task text or costs that are negative or not finite.
    pub fn validate(&self) -> Result<(), PreItvError> {
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.task.trim().is_empty() {
                return Err(PreItvError::InvalidRuleTable {
                    reason: format!("rule #{} has empty task text", idx),
                });
            }
            if !rule.estimated_cost.is_finite() || rule.estimated_cost < 0.0 {
                return Err(PreItvError::InvalidRuleTable {
                    reason: format!(
                        "rule '{}' has invalid estimated cost {}",
                        rule.task, rule.estimated_cost
                    ),
                });
            }
        }
        Ok(())
    }

    /// Gate every rule for `fuel` on a minimum mileage.
    ///
    /// Used to reproduce the variant where the Petrol ignition rule is only
    /// emitted from the 40,000 km band on.
    pub fn with_fuel_gate(mut self, fuel: FuelType, gate_km: u32) -> Self {
        for rule in &mut self.rules {
            if let Trigger::Fuel {
                fuel: rule_fuel,
                min_km,
            } = &mut rule.trigger
            {
                if *rule_fuel == fuel {
                    *min_km = Some(gate_km);
                }
            }
        }
        self
    }
}
