use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{errors::PreItvError, vehicle::FuelType, vehicle::VehicleProfile};

pub mod milestone;
pub mod rules;


pub use milestone::summarize_next_milestone;
pub use rules::{MaintenanceRule, RuleTable, Trigger, VehicleFacts};

/// Mileage at which wear-sensitive tasks become orange.
pub const ORANGE_MILEAGE_KM: u32 = 50_000;
/// Mileage at which wear-sensitive tasks become red.
pub const RED_MILEAGE_KM: u32 = 60_000;

/// Word prefixes that mark a task as wear-sensitive, in English and Spanish.
///
/// Matching is deliberately narrower than a substring search: a keyword only
/// counts at the start of a word, so "coil" or "motoroil" never escalate.
const HIGH_WEAR_KEYWORDS: [&str; 8] = [
    "belt", "correa", "pad", "pastilla", "brake", "freno", "oil", "aceite",
];

/// Categories of maintenance tasks.
///
/// The declaration order is the order in which grouped checklists are
/// rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Triggered by a mileage band
    Mileage,
    /// Triggered by vehicle age
    Age,
    /// Triggered by the fuel or powertrain type
    FuelSpecific,
    /// Anything else, e.g. make-specific checks
    Other,
}

impl Category {
    pub const ORDER: [Category; 4] = [
        Category::Mileage,
        Category::Age,
        Category::FuelSpecific,
        Category::Other,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Mileage => write!(f, "Mileage"),
            Category::Age => write!(f, "Age"),
            Category::FuelSpecific => write!(f, "Fuel specific"),
            Category::Other => write!(f, "Other"),
        }
    }
}

/// Traffic-light severity of a task. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyColor {
    Green,
    Orange,
    Red,
}

impl std::fmt::Display for UrgencyColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrgencyColor::Green => f.pad("green"),
            UrgencyColor::Orange => f.pad("orange"),
            UrgencyColor::Red => f.pad("red"),
        }
    }
}

/// A single checklist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub task: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<UrgencyColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

/// Output shape selection for checklist generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChecklistOptions {
    /// Regroup entries in the fixed category order
    pub grouped: bool,
    /// Attach urgency colors and cost estimates
    pub annotate: bool,
}

/// The ordered, deduplicated list of recommendations for one vehicle.
///
/// A result is never updated in place; a new one is generated for every
/// request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistResult {
    pub items: Vec<Recommendation>,
}

impl ChecklistResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Plain task texts in checklist order.
    pub fn tasks(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.task.as_str()).collect()
    }

    pub fn contains_task(&self, task: &str) -> bool {
        self.items.iter().any(|item| item.task == task)
    }

    /// Entries grouped by category in the fixed category order. Categories
    /// without entries are omitted.
    pub fn groups(&self) -> Vec<(Category, Vec<&Recommendation>)> {
        Category::ORDER
            .iter()
            .filter_map(|category| {
                let entries: Vec<&Recommendation> = self
                    .items
                    .iter()
                    .filter(|item| item.category == *category)
                    .collect();
                (!entries.is_empty()).then_some((*category, entries))
            })
            .collect()
    }

    /// Sum of the per-task estimates. Entries without an estimate count as zero.
    pub fn total_estimated_cost(&self) -> f64 {
        self.items
            .iter()
            .filter_map(|item| item.estimated_cost)
            .sum()
    }

    /// The most severe urgency color in the checklist, if annotated.
    pub fn highest_urgency(&self) -> Option<UrgencyColor> {
        self.items.iter().filter_map(|item| item.urgency).max()
    }
}

/// Whether a task text refers to a wear-sensitive component.
///
/// Matches whole words starting with one of the keywords, so "brakes" and
/// "pastillas" match while "coil" does not.
pub fn is_high_wear(task: &str) -> bool {
    task.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| {
            HIGH_WEAR_KEYWORDS
                .iter()
                .any(|keyword| word.starts_with(keyword))
        })
}

/// Urgency of a task at the given mileage. Only wear-sensitive tasks escalate.
pub fn urgency_for(task: &str, mileage_km: u32) -> UrgencyColor {
    if !is_high_wear(task) {
        return UrgencyColor::Green;
    }
    if mileage_km >= RED_MILEAGE_KM {
        UrgencyColor::Red
    } else if mileage_km >= ORANGE_MILEAGE_KM {
        UrgencyColor::Orange
    } else {
        UrgencyColor::Green
    }
}

impl RuleTable {
    /// Evaluate every rule against `facts` and build the checklist.
    ///
    /// Fired rules are ordered by stage (mileage, age, fuel, make) and then by
    /// ascending threshold, and deduplicated by task text keeping the first
    /// occurrence.
    pub fn evaluate(&self, facts: &VehicleFacts<'_>, options: ChecklistOptions) -> ChecklistResult {
        let mut items: Vec<Recommendation> = self
            .rules
            .iter()
            .filter(|rule| rule.trigger.fires(facts))
            .sorted_by_key(|rule| (rule.trigger.stage(), rule.trigger.threshold()))
            .unique_by(|rule| rule.task.clone())
            .map(|rule| Recommendation {
                task: rule.task.clone(),
                category: rule.category,
                urgency: options
                    .annotate
                    .then(|| urgency_for(&rule.task, facts.mileage_km)),
                estimated_cost: options.annotate.then_some(rule.estimated_cost),
            })
            .collect();

        if options.grouped {
            // stable, so the evaluation order survives within each category
            items.sort_by_key(|item| item.category);
        }

        debug!(
            "Generated {} checklist tasks from rule table v{} (age {}, {} km, {})",
            items.len(),
            self.version,
            facts.age_years,
            facts.mileage_km,
            facts.fuel_type
        );

        ChecklistResult { items }
    }

    /// Validate a profile, derive its age and evaluate, including make rules.
    pub fn evaluate_profile(
        &self,
        profile: &VehicleProfile,
        current_year: i32,
        options: ChecklistOptions,
    ) -> Result<ChecklistResult, PreItvError> {
        let age_years = profile.age_years_at(current_year)?;
        let facts = VehicleFacts {
            age_years,
            mileage_km: profile.mileage_km,
            fuel_type: profile.fuel_type,
            make: Some(profile.make.as_str()),
        };
        Ok(self.evaluate(&facts, options))
    }
}

/// Build the checklist for a vehicle from the built-in rule table.
pub fn generate_checklist(
    age_years: u32,
    mileage_km: u32,
    fuel_type: FuelType,
    options: ChecklistOptions,
) -> ChecklistResult {
    let facts = VehicleFacts {
        age_years,
        mileage_km,
        fuel_type,
        make: None,
    };
    RuleTable::standard().evaluate(&facts, options)
}

/// Build the checklist for a full vehicle profile from the built-in rule
/// table. Make-specific rules only fire through this entry point.
pub fn generate_for_profile(
    profile: &VehicleProfile,
    current_year: i32,
    options: ChecklistOptions,
) -> Result<ChecklistResult, PreItvError> {
    RuleTable::standard().evaluate_profile(profile, current_year, options)
}
