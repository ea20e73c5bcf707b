use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{debug, error};

use preitv::{
    Advisor, ChecklistOptions, ChecklistResult, FuelType, PreItvError, SessionState,
    VehicleProfile,
    config::AppConfig,
    history::{HistoryEntry, HistoryRecord, HistoryStats},
    route::{Gazetteer, cheapest_on_route, load_feed_file},
    session::RoutePlan,
    summarize_next_milestone,
    vehicle::current_year,
};

/// Stations farther than this from the route are not offered.
const STATION_MAX_DISTANCE_KM: f64 = 5.0;
const STATION_LIMIT: usize = 5;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pre-inspection checklist for a vehicle
    Checklist {
        #[arg(long)]
        make: String,
        #[arg(long, default_value = "")]
        model: String,
        /// Registration year
        #[arg(short, long)]
        year: i32,
        /// Odometer reading in km
        #[arg(short, long, allow_negative_numbers = true)]
        km: i64,
        /// Petrol, Diesel, Hybrid or Electric (Spanish names accepted)
        #[arg(short, long)]
        fuel: FuelType,
        /// Group tasks by category
        #[arg(short, long)]
        grouped: bool,
        /// Show urgency colors and estimated costs
        #[arg(short, long)]
        annotate: bool,
        /// Print the checklist as JSON
        #[arg(long)]
        json: bool,
        /// Save the search to this user's history
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Next maintenance milestone for a mileage
    Milestone {
        #[arg(short, long)]
        km: u32,
    },
    /// Trip distance, duration and fuel cost between two cities
    Route {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Consumption in L/100 km
        #[arg(short, long)]
        consumption: Option<f64>,
        /// Fuel price per liter
        #[arg(short, long)]
        price: Option<f64>,
        /// Saved fuel price feed to look for the cheapest stations on the way
        #[arg(long)]
        stations: Option<PathBuf>,
        /// Fuel name as used in the price feed
        #[arg(long, default_value = "Gasolina 95 E5")]
        station_fuel: String,
        #[arg(short, long)]
        user: Option<String>,
    },
    /// List known vehicle makes
    Makes,
    /// List known models of a make
    Models {
        #[arg(long)]
        make: String,
    },
    /// List known cities
    Cities,
    /// Show a user's saved searches
    History {
        #[arg(short, long)]
        user: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig, PreItvError> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_local_file()?,
    };
    Ok(config.unwrap_or_default())
}

fn print_checklist(checklist: &ChecklistResult, options: ChecklistOptions) {
    let print_item = |item: &preitv::Recommendation| match (item.urgency, item.estimated_cost) {
        (Some(urgency), Some(cost)) => {
            println!("  [{:>6}] {} (~{:.0} EUR)", urgency, item.task, cost)
        }
        _ => println!("  - {}", item.task),
    };

    if checklist.is_empty() {
        println!("  Nothing to check yet for this vehicle.");
    } else if options.grouped {
        for (category, items) in checklist.groups() {
            println!("{}:", category);
            items.into_iter().for_each(print_item);
        }
    } else {
        checklist.items.iter().for_each(print_item);
    }

    if options.annotate {
        println!(
            "Estimated total: {:.0} EUR",
            checklist.total_estimated_cost()
        );
    }
}

fn print_route(plan: &RoutePlan) {
    println!(
        "{} -> {}: {:.1} km, {:.0} min, {:.2} L, {:.2} EUR",
        plan.origin,
        plan.destination,
        plan.route.distance_km(),
        plan.route.duration_min(),
        plan.fuel.liters,
        plan.fuel.cost
    );
}

fn print_history_record(record: &HistoryRecord) {
    let when = record.recorded_at.format("%Y-%m-%d %H:%M");
    match &record.entry {
        HistoryEntry::Vehicle {
            make,
            model,
            registration_year,
            mileage_km,
            fuel_type,
            task_count,
        } => println!(
            "{} checklist {} {} ({}, {} km, {}): {} tasks",
            when, make, model, registration_year, mileage_km, fuel_type, task_count
        ),
        HistoryEntry::Route {
            origin,
            destination,
            distance_km,
            cost,
            ..
        } => println!(
            "{} route {} -> {}: {:.1} km, {:.2} EUR",
            when, origin, destination, distance_km, cost
        ),
    }
}

fn print_history_stats(stats: &HistoryStats) {
    println!("{} checklists, {} routes", stats.vehicles, stats.routes);
    if let (Some(liters), Some(cost)) = (stats.mean_liters, stats.mean_cost) {
        println!("Average per route: {:.2} L, {:.2} EUR", liters, cost);
    }
}

fn run(cli: Args) -> Result<(), PreItvError> {
    let config = load_config(cli.config.as_ref())?;
    debug!("Using config {:?}", config);

    match cli.command {
        Commands::Checklist {
            make,
            model,
            year,
            km,
            fuel,
            grouped,
            annotate,
            json,
            user,
        } => {
            let mut advisor = Advisor::from_config(&config)?;
            let profile = VehicleProfile::new(&make, &model, year, km, fuel)?;
            let options = ChecklistOptions { grouped, annotate };
            let state = advisor.check_vehicle(
                SessionState::default(),
                profile.clone(),
                current_year(),
                options,
                user.as_deref(),
            )?;
            let checklist = state.last_checklist.unwrap_or_default();

            if json {
                let output = serde_json::to_string_pretty(&checklist)
                    .map_err(|e| PreItvError::ConfigSerializeError { source: e })?;
                println!("{}", output);
            } else {
                println!(
                    "Pre-ITV checklist for {} {} ({}, {} km, {}):",
                    profile.make,
                    profile.model,
                    profile.registration_year,
                    profile.mileage_km,
                    profile.fuel_type
                );
                print_checklist(&checklist, options);
                println!("{}", summarize_next_milestone(profile.mileage_km));
            }
        }
        Commands::Milestone { km } => println!("{}", summarize_next_milestone(km)),
        Commands::Route {
            from,
            to,
            consumption,
            price,
            stations,
            station_fuel,
            user,
        } => {
            let mut advisor = Advisor::from_config(&config)?;
            let state = advisor.plan_route(
                SessionState::default(),
                &from,
                &to,
                consumption,
                price,
                user.as_deref(),
            )?;
            if let Some(plan) = &state.last_route {
                print_route(plan);

                if let Some(feed) = stations {
                    let all_stations = load_feed_file(&feed, &station_fuel)?;
                    let offers = cheapest_on_route(
                        &all_stations,
                        &plan.route.polyline,
                        STATION_MAX_DISTANCE_KM,
                        STATION_LIMIT,
                    );
                    if offers.is_empty() {
                        println!("No {} stations near the route.", station_fuel);
                    }
                    for offer in offers {
                        println!(
                            "  {:.3} EUR/L {} ({}, {})",
                            offer.price,
                            offer.station.brand,
                            offer.station.address,
                            offer.station.town
                        );
                    }
                }
            }
        }
        Commands::Makes => {
            let advisor = Advisor::from_config(&config)?;
            advisor
                .list_makes()?
                .iter()
                .for_each(|make| println!("{}", make));
        }
        Commands::Models { make } => {
            let advisor = Advisor::from_config(&config)?;
            let models = advisor.list_models(&make)?;
            if models.is_empty() {
                println!("No models known for {}.", make);
            }
            models.iter().for_each(|model| println!("{}", model));
        }
        Commands::Cities => {
            let gazetteer = match &config.gazetteer_file {
                Some(path) => Gazetteer::from_json_file(path)?,
                None => Gazetteer::spain(),
            };
            for (name, point) in gazetteer.list() {
                println!("{} {}", name, point);
            }
        }
        Commands::History { user } => {
            let advisor = Advisor::from_config(&config)?;
            let state = advisor.refresh_history(SessionState::default(), &user)?;
            if state.history.is_empty() {
                println!("No saved searches for {}.", user);
            }
            state.history.iter().for_each(print_history_record);
            print_history_stats(&HistoryStats::from_records(&state.history));
        }
    }
    Ok(())
}

fn main() {
    colog::init();

    let cli = Args::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Could not complete the request: {}. Please try again.", e);
        std::process::exit(1);
    }
}
