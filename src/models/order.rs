use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::coincident;
use crate::models::coordinate::Coordinate;
use crate::models::route::Route;

/// Longest delivery window any order may carry.
pub const MAX_EXPECTED_DURATION_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Ordered,
    Preparing,
    OnTheWay,
    Delivered,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Ordered => "Ordered",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::OnTheWay => "On the way",
            OrderStatus::Delivered => "Delivered",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Ordered => "ordered",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OnTheWay => "on_the_way",
            OrderStatus::Delivered => "delivered",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    Upi,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Driver {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub restaurant: String,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub placed_at: DateTime<Utc>,
    pub expected_duration_seconds: i64,
    pub status: OrderStatus,
    pub route: Route,
    pub driver: Driver,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub payment_method: PaymentMethod,
}

impl Order {
    /// Saturates at the far end of the calendar instead of overflowing.
    pub fn estimated_completion(&self) -> DateTime<Utc> {
        Duration::try_seconds(self.expected_duration_seconds)
            .and_then(|window| self.placed_at.checked_add_signed(window))
            .unwrap_or(if self.expected_duration_seconds < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
    }

    /// Checks a record that did not come through checkout, e.g. one restored from a blob.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=MAX_EXPECTED_DURATION_SECONDS).contains(&self.expected_duration_seconds) {
            return Err(AppError::BadRequest(format!(
                "expected duration {}s is outside 1..={MAX_EXPECTED_DURATION_SECONDS}s",
                self.expected_duration_seconds
            )));
        }

        self.origin.validate()?;
        self.destination.validate()?;

        if !coincident(&self.route.first(), &self.origin)
            || !coincident(&self.route.last(), &self.destination)
        {
            return Err(AppError::BadRequest(
                "route endpoints do not match origin and destination".to_string(),
            ));
        }

        Ok(())
    }
}
