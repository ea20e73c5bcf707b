// Vehicle attributes entered by the user

use std::str::FromStr;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::errors::PreItvError;

/// Earliest registration year accepted for a profile.
pub const MIN_REGISTRATION_YEAR: i32 = 1980;

/// Fuel or powertrain type of a vehicle.
///
/// Exactly one fuel-specific rule set is evaluated per checklist, selected
/// by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
}

impl FuelType {
    pub const ALL: [FuelType; 4] = [
        FuelType::Petrol,
        FuelType::Diesel,
        FuelType::Hybrid,
        FuelType::Electric,
    ];
}

impl std::fmt::Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuelType::Petrol => write!(f, "Petrol"),
            FuelType::Diesel => write!(f, "Diesel"),
            FuelType::Hybrid => write!(f, "Hybrid"),
            FuelType::Electric => write!(f, "Electric"),
        }
    }
}

impl FromStr for FuelType {
    type Err = PreItvError;

    /// Accepts English and Spanish names, case-insensitive, with or without accents.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "petrol" | "gasoline" | "gasolina" => Ok(FuelType::Petrol),
            "diesel" | "diésel" => Ok(FuelType::Diesel),
            "hybrid" | "hibrido" | "híbrido" => Ok(FuelType::Hybrid),
            "electric" | "ev" | "electrico" | "eléctrico" => Ok(FuelType::Electric),
            _ => Err(PreItvError::UnknownFuelType {
                value: value.to_string(),
            }),
        }
    }
}

/// The vehicle a checklist is generated for.
///
/// A profile only lives for the duration of one interaction. Construction
/// validates what can be checked without a clock; the registration year is
/// checked against the current year when the age is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub make: String,
    pub model: String,
    pub registration_year: i32,
    pub mileage_km: u32,
    pub fuel_type: FuelType,
}

impl VehicleProfile {
    pub fn new(
        make: &str,
        model: &str,
        registration_year: i32,
        mileage_km: i64,
        fuel_type: FuelType,
    ) -> Result<Self, PreItvError> {
        if make.trim().is_empty() {
            return Err(PreItvError::invalid_input("make", "must not be empty"));
        }
        if registration_year < MIN_REGISTRATION_YEAR {
            return Err(PreItvError::invalid_input(
                "registration_year",
                format!(
                    "must be {} or later, got {}",
                    MIN_REGISTRATION_YEAR, registration_year
                ),
            ));
        }
        if mileage_km < 0 {
            return Err(PreItvError::invalid_input(
                "mileage_km",
                format!("must not be negative, got {}", mileage_km),
            ));
        }
        let mileage_km = u32::try_from(mileage_km).map_err(|_| {
            PreItvError::invalid_input("mileage_km", format!("{} is out of range", mileage_km))
        })?;

        Ok(Self {
            make: make.trim().to_string(),
            model: model.trim().to_string(),
            registration_year,
            mileage_km,
            fuel_type,
        })
    }

    /// Age in whole years relative to `current_year`.
    ///
    /// A registration year after `current_year` is rejected. Fields are public,
    /// so an out-of-range year set after construction is reported, not wrapped.
    pub fn age_years_at(&self, current_year: i32) -> Result<u32, PreItvError> {
        if self.registration_year > current_year {
            return Err(PreItvError::invalid_input(
                "registration_year",
                format!(
                    "{} is after the current year {}",
                    self.registration_year, current_year
                ),
            ));
        }
        current_year
            .checked_sub(self.registration_year)
            .and_then(|age| u32::try_from(age).ok())
            .ok_or_else(|| {
                PreItvError::invalid_input(
                    "registration_year",
                    format!("{} is out of range", self.registration_year),
                )
            })
    }

    /// Age in whole years according to the local clock.
    pub fn age_years(&self) -> Result<u32, PreItvError> {
        self.age_years_at(current_year())
    }
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuel_type_parsing() {
        assert_eq!("Petrol".parse::<FuelType>().unwrap(), FuelType::Petrol);
        assert_eq!("gasolina".parse::<FuelType>().unwrap(), FuelType::Petrol);
        assert_eq!("Diésel".parse::<FuelType>().unwrap(), FuelType::Diesel);
        assert_eq!(" HÍBRIDO ".parse::<FuelType>().unwrap(), FuelType::Hybrid);
        assert_eq!("ev".parse::<FuelType>().unwrap(), FuelType::Electric);
        assert_eq!("Eléctrico".parse::<FuelType>().unwrap(), FuelType::Electric);
    }

    #[test]
    fn test_unknown_fuel_type_is_rejected() {
        let err = "hydrogen".parse::<FuelType>().unwrap_err();
        assert!(matches!(err, PreItvError::UnknownFuelType { value } if value == "hydrogen"));
    }

    #[test]
    fn test_negative_mileage_is_rejected() {
        let result = VehicleProfile::new("Seat", "Ibiza", 2018, -1, FuelType::Petrol);
        assert!(matches!(
            result,
            Err(PreItvError::InvalidUserInput { field, .. }) if field == "mileage_km"
        ));
    }

    #[test]
    fn test_empty_make_is_rejected() {
        assert!(VehicleProfile::new("  ", "Ibiza", 2018, 1000, FuelType::Petrol).is_err());
    }

    #[test]
    fn test_age_derivation() {
        let profile = VehicleProfile::new("Seat", "Ibiza", 2018, 90_000, FuelType::Petrol).unwrap();
        assert_eq!(profile.age_years_at(2025).unwrap(), 7);
        assert_eq!(profile.age_years_at(2018).unwrap(), 0);
    }

    #[test]
    fn test_registration_year_before_floor_is_rejected() {
        for year in [i32::MIN, -5, 0, MIN_REGISTRATION_YEAR - 1] {
            let result = VehicleProfile::new("Seat", "Ibiza", year, 0, FuelType::Petrol);
            assert!(matches!(
                result,
                Err(PreItvError::InvalidUserInput { field, .. }) if field == "registration_year"
            ));
        }
        assert!(
            VehicleProfile::new("Seat", "Ibiza", MIN_REGISTRATION_YEAR, 0, FuelType::Petrol)
                .is_ok()
        );
    }

    #[test]
    fn test_age_does_not_overflow() {
        let mut profile = VehicleProfile::new("Seat", "Ibiza", 2018, 0, FuelType::Petrol).unwrap();
        profile.registration_year = i32::MIN;
        assert!(matches!(
            profile.age_years_at(2025),
            Err(PreItvError::InvalidUserInput { field, .. }) if field == "registration_year"
        ));
        assert!(profile.age_years_at(i32::MAX).is_err());
    }

    #[test]
    fn test_future_registration_year_is_rejected() {
        let profile = VehicleProfile::new("Seat", "Ibiza", 2030, 0, FuelType::Petrol).unwrap();
        assert!(matches!(
            profile.age_years_at(2025),
            Err(PreItvError::InvalidUserInput { field, .. }) if field == "registration_year"
        ));
    }
}
