use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};

/// Elapsed-time boundaries between statuses, measured from `placed_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseThresholds {
    preparing_after: Duration,
    on_the_way_after: Duration,
    delivered_after: Duration,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            preparing_after: Duration::minutes(1),
            on_the_way_after: Duration::minutes(2),
            delivered_after: Duration::minutes(12),
        }
    }
}

impl PhaseThresholds {
    pub fn new(
        preparing_after: Duration,
        on_the_way_after: Duration,
        delivered_after: Duration,
    ) -> Result<Self, AppError> {
        if preparing_after <= Duration::zero() {
            return Err(AppError::Config(
                "preparing threshold must be positive".to_string(),
            ));
        }

        if !(preparing_after < on_the_way_after && on_the_way_after < delivered_after) {
            return Err(AppError::Config(format!(
                "status thresholds must be strictly increasing, got {}s / {}s / {}s",
                preparing_after.num_seconds(),
                on_the_way_after.num_seconds(),
                delivered_after.num_seconds()
            )));
        }

        Ok(Self {
            preparing_after,
            on_the_way_after,
            delivered_after,
        })
    }

    pub fn from_seconds(preparing: i64, on_the_way: i64, delivered: i64) -> Result<Self, AppError> {
        let seconds = |value: i64| {
            Duration::try_seconds(value)
                .ok_or_else(|| AppError::Config(format!("phase threshold {value}s is out of range")))
        };
        Self::new(seconds(preparing)?, seconds(on_the_way)?, seconds(delivered)?)
    }

    pub fn preparing_after(&self) -> Duration {
        self.preparing_after
    }

    pub fn on_the_way_after(&self) -> Duration {
        self.on_the_way_after
    }

    pub fn delivered_after(&self) -> Duration {
        self.delivered_after
    }

    /// Status implied by `now`. Clock skew (`now < placed_at`) counts as zero elapsed.
    pub fn status_at(
        &self,
        placed_at: DateTime<Utc>,
        estimated_completion: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> OrderStatus {
        let elapsed = (now - placed_at).max(Duration::zero());
        let window_elapsed = now >= estimated_completion;

        if elapsed >= self.delivered_after || window_elapsed {
            OrderStatus::Delivered
        } else if elapsed >= self.on_the_way_after {
            OrderStatus::OnTheWay
        } else if elapsed >= self.preparing_after {
            OrderStatus::Preparing
        } else {
            OrderStatus::Ordered
        }
    }

    pub fn advance(&self, order: &Order, now: DateTime<Utc>) -> OrderStatus {
        self.status_at(order.placed_at, order.estimated_completion(), now)
    }
}

pub fn is_terminal(status: OrderStatus) -> bool {
    status == OrderStatus::Delivered
}

/// Status to persist when `computed` is observed over a cached `current`; never regresses.
pub fn commit(current: OrderStatus, computed: OrderStatus) -> OrderStatus {
    current.max(computed)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{commit, is_terminal, PhaseThresholds};
    use crate::models::order::OrderStatus;

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn follows_default_phase_boundaries() {
        let thresholds = PhaseThresholds::default();
        let completion = t0() + Duration::minutes(12);

        let at = |seconds: i64| thresholds.status_at(t0(), completion, t0() + Duration::seconds(seconds));

        assert_eq!(at(0), OrderStatus::Ordered);
        assert_eq!(at(30), OrderStatus::Ordered);
        assert_eq!(at(60), OrderStatus::Preparing);
        assert_eq!(at(90), OrderStatus::Preparing);
        assert_eq!(at(120), OrderStatus::OnTheWay);
        assert_eq!(at(180), OrderStatus::OnTheWay);
        assert_eq!(at(719), OrderStatus::OnTheWay);
        assert_eq!(at(720), OrderStatus::Delivered);
        assert_eq!(at(780), OrderStatus::Delivered);
    }

    #[test]
    fn status_never_regresses() {
        let thresholds = PhaseThresholds::default();
        let completion = t0() + Duration::minutes(20);

        let mut previous = OrderStatus::Ordered;
        for seconds in (-120..3_600).step_by(7) {
            let status = thresholds.status_at(t0(), completion, t0() + Duration::seconds(seconds));
            assert!(status >= previous);
            previous = status;
        }
        assert_eq!(previous, OrderStatus::Delivered);
    }

    #[test]
    fn clock_skew_is_ordered() {
        let thresholds = PhaseThresholds::default();
        let status = thresholds.status_at(
            t0(),
            t0() + Duration::minutes(12),
            t0() - Duration::minutes(5),
        );
        assert_eq!(status, OrderStatus::Ordered);
    }

    #[test]
    fn elapsed_window_delivers_before_last_threshold() {
        let thresholds = PhaseThresholds::default();
        let completion = t0() + Duration::minutes(5);

        assert_eq!(
            thresholds.status_at(t0(), completion, t0() + Duration::minutes(5)),
            OrderStatus::Delivered
        );
    }

    #[test]
    fn degenerate_window_is_delivered_immediately() {
        let thresholds = PhaseThresholds::default();
        assert_eq!(thresholds.status_at(t0(), t0(), t0()), OrderStatus::Delivered);
    }

    #[test]
    fn rejects_unordered_thresholds() {
        assert!(PhaseThresholds::from_seconds(60, 60, 720).is_err());
        assert!(PhaseThresholds::from_seconds(60, 800, 720).is_err());
        assert!(PhaseThresholds::from_seconds(0, 120, 720).is_err());
        assert!(PhaseThresholds::from_seconds(30, 90, 600).is_ok());
    }

    #[test]
    fn out_of_range_thresholds_are_config_errors() {
        assert!(PhaseThresholds::from_seconds(60, 120, i64::MAX).is_err());
    }

    #[test]
    fn only_delivered_is_terminal() {
        assert!(!is_terminal(OrderStatus::Ordered));
        assert!(!is_terminal(OrderStatus::Preparing));
        assert!(!is_terminal(OrderStatus::OnTheWay));
        assert!(is_terminal(OrderStatus::Delivered));
    }

    #[test]
    fn commit_keeps_later_status() {
        assert_eq!(commit(OrderStatus::OnTheWay, OrderStatus::Preparing), OrderStatus::OnTheWay);
        assert_eq!(commit(OrderStatus::Ordered, OrderStatus::Preparing), OrderStatus::Preparing);
    }
}
