pub mod checkout;
pub mod eta;
pub mod lifecycle;
pub mod route;
pub mod snapshot;
pub mod ticker;
pub mod tracker;

use crate::config::Config;
use crate::error::AppError;
use crate::models::coordinate::Coordinate;

use self::checkout::DurationPolicy;
use self::eta::EtaEstimator;
use self::lifecycle::PhaseThresholds;
use self::route::RouteSynthesizer;

/// Validated tracking parameters shared by every request.
#[derive(Debug, Clone)]
pub struct Engine {
    pub thresholds: PhaseThresholds,
    pub synthesizer: RouteSynthesizer,
    pub eta: EtaEstimator,
    pub durations: DurationPolicy,
    pub default_destination: Coordinate,
    pub perturb_radius_km: f64,
}

impl Engine {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let thresholds = PhaseThresholds::from_seconds(
            config.preparing_after_seconds,
            config.on_the_way_after_seconds,
            config.delivered_after_seconds,
        )?;
        let synthesizer = RouteSynthesizer::new(config.route_waypoints, config.route_jitter_degrees)?;
        let eta = EtaEstimator::new(config.average_speed_kmh, config.min_route_eta_minutes)?;
        let durations = DurationPolicy::new(
            config.base_prep_minutes,
            config.average_speed_kmh,
            config.min_travel_minutes,
            config.max_travel_minutes,
        )?;
        let default_destination = Coordinate::new(config.default_lat, config.default_lng)
            .map_err(|err| AppError::Config(format!("invalid default destination: {err}")))?;

        if !(config.perturb_radius_km.is_finite() && config.perturb_radius_km > checkout::MIN_PERTURB_KM) {
            return Err(AppError::Config(format!(
                "PERTURB_RADIUS_KM must be greater than {} km",
                checkout::MIN_PERTURB_KM
            )));
        }

        Ok(Self {
            thresholds,
            synthesizer,
            eta,
            durations,
            default_destination,
            perturb_radius_km: config.perturb_radius_km,
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            thresholds: PhaseThresholds::default(),
            synthesizer: RouteSynthesizer::default(),
            eta: EtaEstimator::default(),
            durations: DurationPolicy::default(),
            default_destination: Coordinate {
                lat: 28.6139,
                lng: 77.2090,
            },
            perturb_radius_km: 4.0,
        }
    }
}
