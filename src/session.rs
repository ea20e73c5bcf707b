// Request handlers over a caller-owned session state

use log::{info, warn};

use crate::{
    catalog::{StaticCatalog, VehicleCatalog},
    checklist::{ChecklistOptions, ChecklistResult, RuleTable},
    config::AppConfig,
    errors::PreItvError,
    history::{HistoryEntry, HistoryRecord, HistoryStore, JsonLinesHistory},
    route::{FuelEstimate, Gazetteer, Geocoder, RouteService, RouteSummary, liters_and_cost},
    vehicle::VehicleProfile,
};

/// A planned trip with its fuel estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub origin: String,
    pub destination: String,
    pub route: RouteSummary,
    pub fuel: FuelEstimate,
}

/// Everything one user interaction remembers between requests.
///
/// The state is owned by the caller: every handler takes it by value and
/// returns the updated state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub last_vehicle: Option<VehicleProfile>,
    pub last_checklist: Option<ChecklistResult>,
    pub last_route: Option<RoutePlan>,
    /// Records made or loaded during this session, oldest first
    pub history: Vec<HistoryRecord>,
}

/// Front door of the library: holds the rule table and the collaborators.
pub struct Advisor {
    rules: RuleTable,
    catalog: Box<dyn VehicleCatalog>,
    geocoder: Box<dyn Geocoder>,
    router: Box<dyn RouteService>,
    history: Box<dyn HistoryStore>,
    default_consumption_l_100km: f64,
    default_fuel_price_per_liter: f64,
}

impl Advisor {
    pub fn new(
        rules: RuleTable,
        catalog: Box<dyn VehicleCatalog>,
        geocoder: Box<dyn Geocoder>,
        router: Box<dyn RouteService>,
        history: Box<dyn HistoryStore>,
    ) -> Self {
        Self {
            rules,
            catalog,
            geocoder,
            router,
            history,
            default_consumption_l_100km: crate::config::DEFAULT_CONSUMPTION_L_100KM,
            default_fuel_price_per_liter: crate::config::DEFAULT_FUEL_PRICE_PER_LITER,
        }
    }

    /// Build an advisor with the offline collaborators selected by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, PreItvError> {
        let rules = config.rule_table()?;
        let catalog = match &config.models_file {
            Some(path) => StaticCatalog::european().with_models_file(path)?,
            None => StaticCatalog::european(),
        };
        let geocoder = match &config.gazetteer_file {
            Some(path) => Gazetteer::from_json_file(path)?,
            None => Gazetteer::spain(),
        };
        let history = JsonLinesHistory::new(config.history_dir()?)?;
        info!(
            "Advisor ready with rule table v{} ({} rules)",
            rules.version,
            rules.rules.len()
        );

        Ok(Self::new(
            rules,
            Box::new(catalog),
            Box::new(geocoder),
            Box::new(config.router()),
            Box::new(history),
        )
        .with_fuel_defaults(
            config.default_consumption_l_100km,
            config.default_fuel_price_per_liter,
        ))
    }

    pub fn with_fuel_defaults(mut self, consumption_l_100km: f64, price_per_liter: f64) -> Self {
        self.default_consumption_l_100km = consumption_l_100km;
        self.default_fuel_price_per_liter = price_per_liter;
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn list_makes(&self) -> Result<Vec<String>, PreItvError> {
        self.catalog.list_makes()
    }

    pub fn list_models(&self, make: &str) -> Result<Vec<String>, PreItvError> {
        self.catalog.list_models(make)
    }

    /// Generate the checklist for `profile` and remember it in the session.
    pub fn check_vehicle(
        &mut self,
        mut state: SessionState,
        profile: VehicleProfile,
        current_year: i32,
        options: ChecklistOptions,
        user_id: Option<&str>,
    ) -> Result<SessionState, PreItvError> {
        let checklist = self.rules.evaluate_profile(&profile, current_year, options)?;

        let record = HistoryRecord::now(HistoryEntry::Vehicle {
            make: profile.make.clone(),
            model: profile.model.clone(),
            registration_year: profile.registration_year,
            mileage_km: profile.mileage_km,
            fuel_type: profile.fuel_type,
            task_count: checklist.len(),
        });
        self.record(&mut state, user_id, record);

        state.last_vehicle = Some(profile);
        state.last_checklist = Some(checklist);
        Ok(state)
    }

    /// Geocode both cities, compute the route and its fuel cost.
    ///
    /// Consumption and price fall back to the advisor's defaults.
    pub fn plan_route(
        &mut self,
        mut state: SessionState,
        origin: &str,
        destination: &str,
        consumption_l_100km: Option<f64>,
        price_per_liter: Option<f64>,
        user_id: Option<&str>,
    ) -> Result<SessionState, PreItvError> {
        let origin_point = self
            .geocoder
            .geocode(origin)
            .ok_or_else(|| PreItvError::CityNotFound {
                city: origin.to_string(),
            })?;
        let destination_point =
            self.geocoder
                .geocode(destination)
                .ok_or_else(|| PreItvError::CityNotFound {
                    city: destination.to_string(),
                })?;

        let route = self.router.compute_route(origin_point, destination_point)?;
        let fuel = liters_and_cost(
            route.distance_km(),
            consumption_l_100km.unwrap_or(self.default_consumption_l_100km),
            price_per_liter.unwrap_or(self.default_fuel_price_per_liter),
        )?;

        let record = HistoryRecord::now(HistoryEntry::Route {
            origin: origin.trim().to_string(),
            destination: destination.trim().to_string(),
            distance_km: route.distance_km(),
            duration_min: route.duration_min(),
            liters: fuel.liters,
            cost: fuel.cost,
        });
        self.record(&mut state, user_id, record);

        state.last_route = Some(RoutePlan {
            origin: origin.trim().to_string(),
            destination: destination.trim().to_string(),
            route,
            fuel,
        });
        Ok(state)
    }

    /// Replace the session history with what the store holds for the user.
    pub fn refresh_history(
        &self,
        mut state: SessionState,
        user_id: &str,
    ) -> Result<SessionState, PreItvError> {
        state.history = self.history.load_history(user_id)?;
        Ok(state)
    }

    /// Keep the record in the session and persist it for signed-in users.
    /// A failing store does not fail the request.
    fn record(&mut self, state: &mut SessionState, user_id: Option<&str>, record: HistoryRecord) {
        if let Some(user_id) = user_id {
            if let Err(e) = self.history.save_search(user_id, &record) {
                warn!("Could not save history record, continuing: {}", e);
            }
        }
        state.history.push(record);
    }
}
