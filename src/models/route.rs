use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::geo::coincident;
use crate::models::coordinate::Coordinate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    Synthesized,
    External,
}

/// Ordered waypoints from origin to destination. Always holds at least two points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RouteRecord")]
pub struct Route {
    points: Vec<Coordinate>,
    source: RouteSource,
}

#[derive(Deserialize)]
struct RouteRecord {
    points: Vec<Coordinate>,
    source: RouteSource,
}

impl TryFrom<RouteRecord> for Route {
    type Error = AppError;

    fn try_from(record: RouteRecord) -> Result<Self, Self::Error> {
        if record.points.len() < 2 {
            return Err(AppError::BadRequest(format!(
                "route needs at least 2 points, got {}",
                record.points.len()
            )));
        }

        for point in &record.points {
            point.validate()?;
        }

        Ok(Self {
            points: record.points,
            source: record.source,
        })
    }
}

impl Route {
    pub(crate) fn synthesized(points: Vec<Coordinate>) -> Self {
        debug_assert!(points.len() >= 2);
        Self {
            points,
            source: RouteSource::Synthesized,
        }
    }

    /// Accepts a path from a routing collaborator if it runs from `origin` to `destination`.
    pub fn external(
        points: Vec<Coordinate>,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> Result<Self, AppError> {
        if points.len() < 2 {
            return Err(AppError::BadRequest(format!(
                "route needs at least 2 points, got {}",
                points.len()
            )));
        }

        for point in &points {
            point.validate()?;
        }

        let (first, last) = (&points[0], &points[points.len() - 1]);
        if !coincident(first, origin) || !coincident(last, destination) {
            return Err(AppError::BadRequest(
                "route endpoints do not match origin and destination".to_string(),
            ));
        }

        Ok(Self {
            points,
            source: RouteSource::External,
        })
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn source(&self) -> RouteSource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Coordinate {
        self.points[0]
    }

    pub fn last(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }
}
