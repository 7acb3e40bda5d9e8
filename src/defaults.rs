use chrono::NaiveTime;

pub const DEFAULT_DWELL_MINUTES: u32 = 10;

pub const DEFAULT_SPEED_KMH: f64 = 40.0;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim allows 1 req/s; stay well below it
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1500;

pub const DEFAULT_CIRCUIT_BREAKER_THRESHOLD: u32 = 3;

pub const DEFAULT_CIRCUIT_BREAKER_RECOVERY_SECS: u64 = 300;

pub const DEFAULT_ROUTES_DIR: &str = "./routes";

pub fn default_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).expect("valid static default start time")
}
