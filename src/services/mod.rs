//! Business logic services

pub mod export;
pub mod geo;
pub mod geocoding;
pub mod greedy;
pub mod map_links;
pub mod nominatim;
pub mod planner;
pub mod route_store;
pub mod simulator;
pub mod stop_import;
pub mod two_opt;
