use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, AppError> {
        let point = Self { lat, lng };
        point.validate()?;
        Ok(point)
    }

    /// Rejects non-finite values and anything outside lat [-90, 90], lng [-180, 180].
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(AppError::BadRequest(format!(
                "coordinate ({}, {}) is not finite",
                self.lat, self.lng
            )));
        }

        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::BadRequest(format!(
                "latitude {} out of range [-90, 90]",
                self.lat
            )));
        }

        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(AppError::BadRequest(format!(
                "longitude {} out of range [-180, 180]",
                self.lng
            )));
        }

        Ok(())
    }
}
