//! Control Loop
//!
//! ## Overview
//!
//! The [`Monitor`] owns every piece of device state: the sensors, the telemetry
//! API (which in turn owns the network link and the socket), the indicator lamps,
//! the clock, and the current thresholds. Nothing is global; the top-level process
//! builds one monitor and drives it.
//!
//! ## States
//!
//! ```text
//!                initialize() ok
//! Uninitialized ─────────────────▶ Running ──tick()──▶ Running
//!       │
//!       │ initialize() fails (link or settings)
//!       ▼
//!     Halted ──tick()──▶ Halted   (no-op)
//! ```
//!
//! ## One Tick
//!
//! 1. Re-fetch thresholds if a refresh interval is configured and due
//! 2. Read climate and sound
//! 3. Compare against the thresholds
//! 4. POST one body per violating metric the [`ReportGate`] lets through
//! 5. Drive the lamps: red on any violation, green when everything was read and
//!    in range
//!
//! A failed report or sensor read is logged and recorded in the [`TickReport`];
//! the loop keeps going.

use heapless::Vec;
use log::{debug, error, info, warn};

use crate::config::{DeviceConfig, WifiCredentials};
use crate::errors::{ApiError, InitError, SensorError};
use crate::evaluation::{evaluate, Violation, Violations};
use crate::link::{self, NetworkLink, RetryPolicy};
use crate::policy::{ReportGate, ReportPolicy};
use crate::readings::{Metric, SensorReading, SoundLevel};
use crate::sensors::{Indicator, Indicators, SensorSource};
use crate::thresholds::{SoundComparison, Thresholds};
use crate::time::{elapsed_ms, Clock, Timestamp, MS_PER_SECOND};

/// The settings/telemetry server as seen by the control loop
pub trait TelemetryApi {
    /// Network link the requests travel over
    type Link: NetworkLink;

    /// Access the link, used for association during initialisation
    fn link(&mut self) -> &mut Self::Link;

    /// `GET` the threshold set for this device
    fn fetch_settings(&mut self) -> Result<Thresholds, ApiError>;

    /// `POST` one violation, returning the HTTP status on success
    fn report(&mut self, violation: &Violation) -> Result<u16, ApiError>;
}

/// Lifecycle state of the control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Not yet associated, no thresholds
    Uninitialized,
    /// Thresholds loaded, ticking
    Running,
    /// Initialisation failed; ticks do nothing
    Halted,
}

/// Loop behaviour derived from the device configuration
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Network credentials
    pub credentials: WifiCredentials,
    /// Association retry policy
    pub retry: RetryPolicy,
    /// Log link details
    pub verbose: bool,
    /// Sound comparison mode
    pub sound: SoundComparison,
    /// Re-report policy
    pub reporting: ReportPolicy,
    /// Threshold refresh period, `None` to fetch only at startup
    pub settings_refresh_ms: Option<u64>,
}

impl From<&DeviceConfig> for MonitorSettings {
    fn from(config: &DeviceConfig) -> Self {
        Self {
            credentials: config.wifi.clone(),
            retry: config.link,
            verbose: config.verbose,
            sound: config.sound,
            reporting: config.reporting,
            settings_refresh_ms: config
                .settings_refresh_secs
                .map(|secs| u64::from(secs) * MS_PER_SECOND),
        }
    }
}

/// Result of posting one violation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOutcome {
    /// Metric that was reported
    pub metric: Metric,
    /// HTTP status or the failure
    pub result: Result<u16, ApiError>,
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Clock time at the start of the tick
    pub at: Timestamp,
    /// Threshold refresh attempted this tick, if any
    pub refresh: Option<Result<(), ApiError>>,
    /// Climate reading or why it failed
    pub climate: Result<SensorReading, SensorError>,
    /// Sound level or why it failed
    pub sound: Result<SoundLevel, SensorError>,
    /// Every metric found outside its band
    pub violations: Violations,
    /// Reports actually sent
    pub reports: Vec<ReportOutcome, 3>,
    /// Violations held back by the report policy
    pub suppressed: Vec<Metric, 3>,
}

impl TickReport {
    /// True when any metric was out of range
    pub fn in_alert(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Number of sensors that could not be read
    pub fn sensor_faults(&self) -> usize {
        usize::from(self.climate.is_err()) + usize::from(self.sound.is_err())
    }

    /// Reports that did not go through
    pub fn failed_reports(&self) -> impl Iterator<Item = &ReportOutcome> {
        self.reports.iter().filter(|r| r.result.is_err())
    }
}

/// The sample-compare-report loop
pub struct Monitor<S, A, I, C> {
    sensors: S,
    api: A,
    indicators: I,
    clock: C,
    settings: MonitorSettings,
    state: MonitorState,
    thresholds: Option<Thresholds>,
    gate: ReportGate,
    last_settings_fetch: Timestamp,
}

impl<S, A, I, C> Monitor<S, A, I, C>
where
    S: SensorSource,
    A: TelemetryApi,
    I: Indicators,
    C: Clock,
{
    /// Assemble a monitor; nothing happens until [`Monitor::initialize`]
    pub fn new(sensors: S, api: A, indicators: I, clock: C, settings: MonitorSettings) -> Self {
        let gate = ReportGate::new(settings.reporting);
        Self {
            sensors,
            api,
            indicators,
            clock,
            settings,
            state: MonitorState::Uninitialized,
            thresholds: None,
            gate,
            last_settings_fetch: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Thresholds in use, once initialised
    pub fn thresholds(&self) -> Option<&Thresholds> {
        self.thresholds.as_ref()
    }

    /// The telemetry API
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The indicator lamps
    pub fn indicators(&self) -> &I {
        &self.indicators
    }

    /// Join the network and fetch the thresholds.
    ///
    /// Any failure is fatal: the monitor moves to [`MonitorState::Halted`] and every
    /// later tick is a no-op. Calling this again once running returns the current
    /// thresholds without doing any I/O.
    pub fn initialize(&mut self) -> Result<Thresholds, InitError> {
        match self.state {
            MonitorState::Running => {
                if let Some(thresholds) = self.thresholds {
                    return Ok(thresholds);
                }
            }
            MonitorState::Halted => return Err(InitError::Halted),
            MonitorState::Uninitialized => {}
        }

        match self.bring_up() {
            Ok(thresholds) => {
                info!("Thresholds loaded: {:?}", thresholds);
                self.thresholds = Some(thresholds);
                self.last_settings_fetch = self.clock.now();
                self.state = MonitorState::Running;
                Ok(thresholds)
            }
            Err(err) => {
                error!("Initialisation failed, halting: {}", err);
                self.halt();
                Err(err)
            }
        }
    }

    fn bring_up(&mut self) -> Result<Thresholds, InitError> {
        link::associate(
            self.api.link(),
            &self.settings.credentials,
            &self.settings.retry,
            &mut self.clock,
            self.settings.verbose,
        )?;
        Ok(self.api.fetch_settings()?)
    }

    /// Stop for good: lamps to alert, ticks become no-ops
    pub fn halt(&mut self) {
        self.state = MonitorState::Halted;
        self.indicators.set(Indicator::Ok, false);
        self.indicators.set(Indicator::Alert, true);
    }

    /// Run one iteration of the loop.
    ///
    /// Returns `None` without touching any hardware unless the monitor is running.
    pub fn tick(&mut self) -> Option<TickReport> {
        if self.state != MonitorState::Running {
            return None;
        }

        let at = self.clock.now();
        let refresh = self.refresh_settings_if_due(at);
        let thresholds = self.thresholds?;

        let climate = self.sensors.read_climate();
        let sound = self.sensors.read_sound();
        let violations = evaluate(&thresholds, climate.ok(), sound.ok(), &self.settings.sound);

        let mut reports = Vec::new();
        let mut suppressed = Vec::new();
        for violation in &violations {
            if !self.gate.should_report(violation.metric, at, &thresholds) {
                debug!("Holding back {} report, interval not elapsed", violation.metric);
                let _ = suppressed.push(violation.metric);
                continue;
            }

            let result = self.api.report(violation);
            match result {
                Ok(status) => {
                    info!(
                        "Reported {} = {} outside [{}, {}] (HTTP {})",
                        violation.metric, violation.value, violation.min, violation.max, status
                    );
                    self.gate.record(violation.metric, at);
                }
                Err(err) => warn!("Failed to report {}: {}", violation.metric, err),
            }
            let _ = reports.push(ReportOutcome {
                metric: violation.metric,
                result,
            });
        }

        let alert = !violations.is_empty();
        let all_read = climate.is_ok() && sound.is_ok();
        self.indicators.set(Indicator::Alert, alert);
        self.indicators.set(Indicator::Ok, !alert && all_read);

        Some(TickReport {
            at,
            refresh,
            climate,
            sound,
            violations,
            reports,
            suppressed,
        })
    }

    fn refresh_settings_if_due(&mut self, now: Timestamp) -> Option<Result<(), ApiError>> {
        let period = self.settings.settings_refresh_ms?;
        if elapsed_ms(self.last_settings_fetch, now) < period {
            return None;
        }

        // a failed refresh waits a full period before the next try
        self.last_settings_fetch = now;
        match self.api.fetch_settings() {
            Ok(thresholds) => {
                if self.thresholds != Some(thresholds) {
                    info!("Thresholds updated: {:?}", thresholds);
                }
                self.thresholds = Some(thresholds);
                Some(Ok(()))
            }
            Err(err) => {
                warn!("Threshold refresh failed, keeping previous set: {}", err);
                Some(Err(err))
            }
        }
    }

    /// Tick every `poll_interval_ms` until `max_ticks` ticks ran or the monitor
    /// stops running. Returns the number of ticks executed.
    pub fn run(&mut self, poll_interval_ms: u32, max_ticks: Option<u64>) -> u64 {
        let mut ticks = 0;
        while max_ticks.map_or(true, |max| ticks < max) {
            if self.tick().is_none() {
                break;
            }
            ticks += 1;
            self.clock.delay_ms(poll_interval_ms);
        }
        ticks
    }

    /// Take the monitor apart
    pub fn into_parts(self) -> (S, A, I, C) {
        (self.sensors, self.api, self.indicators, self.clock)
    }
}
