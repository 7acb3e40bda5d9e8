//! Route planner - geocodes a list of stops, orders them around their
//! time windows and prints a time-annotated itinerary with map links.

mod cli;
mod config;
mod defaults;
mod services;
mod types;

use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, PlanArgs, RoutesAction};
use crate::config::Config;
use crate::services::export::{render_itinerary, write_itinerary_csv};
use crate::services::geocoding::{create_geocoder, geocode_stops, Geocoder};
use crate::services::map_links::plan_links;
use crate::services::planner::plan_route;
use crate::services::route_store::{JsonRouteStore, RouteStore, SavedRoute};
use crate::services::stop_import::{parse_address_lines, read_stop_csv};
use crate::types::time::{parse_time_of_day, time_to_minutes};
use crate::types::{GeoPoint, PlanOptions, RoutePlan};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "planner.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // stderr for the console so stdout stays clean for itineraries and JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,route_planner=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;

    let result = match cli.command {
        Command::Plan(args) => run_plan(&config, args).await,
        Command::Routes { action } => run_routes(&config, action),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn resolve_start(args: &PlanArgs, geocoder: &dyn Geocoder) -> Result<GeoPoint> {
    if let Some(raw) = &args.start {
        return GeoPoint::parse(raw).with_context(|| format!("Invalid start point '{}' (expected lat,lng)", raw));
    }
    let address = args
        .start_address
        .as_deref()
        .context("Either --start or --start-address is required")?;
    let found = geocoder
        .geocode(address)
        .await
        .with_context(|| format!("Failed to geocode start address '{}'", address))?
        .with_context(|| format!("Start address '{}' not found", address))?;
    if !found.is_exact() {
        warn!("Start address '{}' matched only approximately ({})", address, found.display_name);
    }
    Ok(found.location)
}

async fn run_plan(config: &Config, args: PlanArgs) -> Result<()> {
    let default_dwell = args.dwell.unwrap_or(config.default_dwell_minutes);

    let mut stops = if let Some(path) = &args.csv {
        let delimiter = u8::try_from(args.delimiter).context("Delimiter must be a single-byte character")?;
        let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        read_stop_csv(file, delimiter, default_dwell)?
    } else if let Some(path) = &args.addresses {
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        parse_address_lines(&text, default_dwell)
    } else {
        anyhow::bail!("Either --csv or --addresses is required");
    };
    info!("Loaded {} stops", stops.len());

    let geocoder = create_geocoder(&config.geocoder)?;
    let start = resolve_start(&args, geocoder.as_ref()).await?;
    let summary = geocode_stops(geocoder.as_ref(), &mut stops).await;
    if !summary.unresolved.is_empty() {
        let missing: Vec<&str> = summary.unresolved.iter().map(|&i| stops[i].address.as_str()).collect();
        anyhow::bail!("Could not geocode {} stop(s): {}", missing.len(), missing.join("; "));
    }

    let start_time = match &args.start_time {
        Some(raw) => parse_time_of_day(raw).with_context(|| format!("Invalid start time '{}' (expected HH:MM)", raw))?,
        None => config.start_time,
    };
    let start_minutes = time_to_minutes(start_time);
    let speed = args.speed.unwrap_or(config.average_speed_kmh);

    let options = PlanOptions {
        enforce_windows: !args.no_enforce_windows,
        circular_return_to_start: args.circular,
        apply_distance_local_search: args.two_opt,
        keep_input_order: args.as_typed,
    };
    if options.apply_distance_local_search && stops.iter().any(|s| s.has_window()) {
        warn!("2-opt ignores time windows; some windows may be missed");
    }

    let plan = plan_route(&stops, start, start_minutes, speed, &options)?;
    print_plan(&plan, args.json)?;

    if let Some(path) = &args.export {
        let file = fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_itinerary_csv(file, &plan)?;
        info!("Itinerary written to {}", path.display());
    }

    if let Some(name) = args.save {
        let store = JsonRouteStore::new(&config.routes_dir);
        store.save(&SavedRoute {
            name,
            saved_at: Utc::now(),
            start,
            start_time_minutes: plan.start_time_minutes,
            average_speed_kmh: speed,
            options,
            stops,
            plan: Some(plan),
        })?;
    }

    Ok(())
}

fn print_plan(plan: &RoutePlan, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plan).context("Failed to serialize plan")?);
        return Ok(());
    }

    print!("{}", render_itinerary(plan));
    let links = plan_links(plan);
    if !links.is_empty() {
        println!();
        for (i, link) in links.iter().enumerate() {
            println!("Map {}/{}: {}", i + 1, links.len(), link);
        }
    }
    Ok(())
}

fn run_routes(config: &Config, action: RoutesAction) -> Result<()> {
    let store = JsonRouteStore::new(&config.routes_dir);

    match action {
        RoutesAction::List => {
            let names = store.list()?;
            if names.is_empty() {
                println!("No saved routes in {}", store.dir().display());
            }
            for name in names {
                println!("{}", name);
            }
        }
        RoutesAction::Show { name } => {
            let route = store
                .load(&name)?
                .with_context(|| format!("No saved route named '{}'", name))?;
            let plan = match route.plan {
                Some(plan) => plan,
                None => plan_route(
                    &route.stops,
                    route.start,
                    route.start_time_minutes,
                    route.average_speed_kmh,
                    &route.options,
                )?,
            };
            println!("{} (saved {})", route.name, route.saved_at.format("%Y-%m-%d %H:%M"));
            print_plan(&plan, false)?;
        }
        RoutesAction::Delete { name } => {
            if store.delete(&name)? {
                println!("Deleted '{}'", name);
            } else {
                anyhow::bail!("No saved route named '{}'", name);
            }
        }
    }

    Ok(())
}
