use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub status_tick_seconds: u64,
    pub preparing_after_seconds: i64,
    pub on_the_way_after_seconds: i64,
    pub delivered_after_seconds: i64,
    pub route_waypoints: usize,
    pub route_jitter_degrees: f64,
    pub average_speed_kmh: f64,
    pub base_prep_minutes: f64,
    pub min_travel_minutes: f64,
    pub max_travel_minutes: f64,
    pub min_route_eta_minutes: f64,
    pub default_lat: f64,
    pub default_lng: f64,
    pub perturb_radius_km: f64,
    pub snapshot_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            status_tick_seconds: 5,
            preparing_after_seconds: 60,
            on_the_way_after_seconds: 120,
            delivered_after_seconds: 720,
            route_waypoints: 8,
            route_jitter_degrees: 0.0005,
            average_speed_kmh: 50.0,
            base_prep_minutes: 10.0,
            min_travel_minutes: 5.0,
            max_travel_minutes: 60.0,
            min_route_eta_minutes: 15.0,
            default_lat: 28.6139,
            default_lng: 77.2090,
            perturb_radius_km: 4.0,
            snapshot_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            status_tick_seconds: parse_or_default("STATUS_TICK_SECONDS", defaults.status_tick_seconds)?,
            preparing_after_seconds: parse_or_default(
                "PREPARING_AFTER_SECONDS",
                defaults.preparing_after_seconds,
            )?,
            on_the_way_after_seconds: parse_or_default(
                "ON_THE_WAY_AFTER_SECONDS",
                defaults.on_the_way_after_seconds,
            )?,
            delivered_after_seconds: parse_or_default(
                "DELIVERED_AFTER_SECONDS",
                defaults.delivered_after_seconds,
            )?,
            route_waypoints: parse_or_default("ROUTE_WAYPOINTS", defaults.route_waypoints)?,
            route_jitter_degrees: parse_or_default("ROUTE_JITTER_DEGREES", defaults.route_jitter_degrees)?,
            average_speed_kmh: parse_or_default("AVERAGE_SPEED_KMH", defaults.average_speed_kmh)?,
            base_prep_minutes: parse_or_default("BASE_PREP_MINUTES", defaults.base_prep_minutes)?,
            min_travel_minutes: parse_or_default("MIN_TRAVEL_MINUTES", defaults.min_travel_minutes)?,
            max_travel_minutes: parse_or_default("MAX_TRAVEL_MINUTES", defaults.max_travel_minutes)?,
            min_route_eta_minutes: parse_or_default(
                "MIN_ROUTE_ETA_MINUTES",
                defaults.min_route_eta_minutes,
            )?,
            default_lat: parse_or_default("DEFAULT_LAT", defaults.default_lat)?,
            default_lng: parse_or_default("DEFAULT_LNG", defaults.default_lng)?,
            perturb_radius_km: parse_or_default("PERTURB_RADIUS_KM", defaults.perturb_radius_km)?,
            snapshot_dir: env::var("SNAPSHOT_DIR").ok().filter(|dir| !dir.trim().is_empty()),
        };

        if config.status_tick_seconds == 0 {
            return Err(AppError::Config("STATUS_TICK_SECONDS must be > 0".to_string()));
        }
        if config.event_buffer_size == 0 {
            return Err(AppError::Config("EVENT_BUFFER_SIZE must be > 0".to_string()));
        }

        Ok(config)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
