//! Report rate limiting
//!
//! The settings document carries `temp_interval` and `humidity_interval`, but the
//! 1.x firmware never consulted them: every violating iteration re-posted. Both
//! behaviours are available here, chosen explicitly through [`ReportPolicy`].
//!
//! ## Interval Gating
//!
//! ```text
//! t=0s    temp 30 °C  -> POST (first report)
//! t=10s   temp 31 °C  -> suppressed (10s < temp_interval 60s)
//! t=61s   temp 30 °C  -> POST
//! ```
//!
//! Only successful reports start a new interval, so a report that failed in
//! transit is retried on the next violating tick.

use serde::{Deserialize, Serialize};

use crate::readings::Metric;
use crate::thresholds::Thresholds;
use crate::time::{elapsed_ms, secs_to_ms, Timestamp};

/// When a violation is reported again
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ReportPolicy {
    /// Report on every violating tick
    EveryViolation,

    /// Report a metric again only after its interval has passed.
    ///
    /// Temperature and humidity use the server intervals; sound has no server
    /// interval and uses the local one.
    Interval {
        /// Seconds between repeated sound reports
        #[serde(default)]
        sound_interval_secs: f32,
    },
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self::EveryViolation
    }
}

/// Tracks the last successful report per metric
#[derive(Debug, Clone)]
pub struct ReportGate {
    policy: ReportPolicy,
    last_report: [Option<Timestamp>; 3],
}

impl ReportGate {
    /// Create a gate with no history
    pub fn new(policy: ReportPolicy) -> Self {
        Self {
            policy,
            last_report: [None; 3],
        }
    }

    /// Active policy
    pub fn policy(&self) -> ReportPolicy {
        self.policy
    }

    /// Minimum gap between two reports of `metric`, in milliseconds
    pub fn interval_ms(&self, metric: Metric, thresholds: &Thresholds) -> u64 {
        match self.policy {
            ReportPolicy::EveryViolation => 0,
            ReportPolicy::Interval {
                sound_interval_secs,
            } => thresholds
                .report_interval_ms(metric)
                .unwrap_or_else(|| secs_to_ms(sound_interval_secs)),
        }
    }

    /// True when a violation of `metric` at `now` should be posted
    pub fn should_report(&self, metric: Metric, now: Timestamp, thresholds: &Thresholds) -> bool {
        match self.last_report[metric.index()] {
            None => true,
            Some(last) => elapsed_ms(last, now) >= self.interval_ms(metric, thresholds),
        }
    }

    /// Remember a successful report
    pub fn record(&mut self, metric: Metric, now: Timestamp) {
        self.last_report[metric.index()] = Some(now);
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.last_report = [None; 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> Thresholds {
        Thresholds {
            max_temp: 26.0,
            min_temp: 18.0,
            max_humidity: 70.0,
            min_humidity: 20.0,
            max_sound: 500.0,
            temp_interval: 60.0,
            humidity_interval: 30.0,
        }
    }

    #[test]
    fn every_violation_never_suppresses() {
        let mut gate = ReportGate::new(ReportPolicy::EveryViolation);
        gate.record(Metric::Temperature, 1000);

        assert!(gate.should_report(Metric::Temperature, 1000, &thresholds()));
        assert!(gate.should_report(Metric::Temperature, 1001, &thresholds()));
    }

    #[test]
    fn interval_uses_server_values() {
        let mut gate = ReportGate::new(ReportPolicy::Interval { sound_interval_secs: 5.0 });
        let t = thresholds();

        assert!(gate.should_report(Metric::Temperature, 0, &t));
        gate.record(Metric::Temperature, 0);
        gate.record(Metric::Humidity, 0);

        assert!(!gate.should_report(Metric::Temperature, 59_999, &t));
        assert!(gate.should_report(Metric::Temperature, 60_000, &t));
        assert!(gate.should_report(Metric::Humidity, 30_000, &t));
    }

    #[test]
    fn sound_uses_local_interval() {
        let mut gate = ReportGate::new(ReportPolicy::Interval { sound_interval_secs: 5.0 });
        gate.record(Metric::Sound, 10_000);

        assert!(!gate.should_report(Metric::Sound, 14_000, &thresholds()));
        assert!(gate.should_report(Metric::Sound, 15_000, &thresholds()));
    }

    #[test]
    fn metrics_are_independent() {
        let mut gate = ReportGate::new(ReportPolicy::Interval { sound_interval_secs: 5.0 });
        gate.record(Metric::Temperature, 0);

        assert!(gate.should_report(Metric::Humidity, 1, &thresholds()));
        assert!(gate.should_report(Metric::Sound, 1, &thresholds()));

        gate.reset();
        assert!(gate.should_report(Metric::Temperature, 1, &thresholds()));
    }

    #[test]
    fn policy_config_shape() {
        let policy: ReportPolicy =
            serde_json::from_str(r#"{"policy":"interval","sound_interval_secs":15}"#).unwrap();
        assert_eq!(policy, ReportPolicy::Interval { sound_interval_secs: 15.0 });

        let policy: ReportPolicy = serde_json::from_str(r#"{"policy":"every_violation"}"#).unwrap();
        assert_eq!(policy, ReportPolicy::EveryViolation);
    }
}
