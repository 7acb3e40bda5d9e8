//! Type definitions

pub mod geo;
pub mod route;
pub mod stop;
pub mod time;

pub use geo::*;
pub use route::*;
pub use stop::*;
