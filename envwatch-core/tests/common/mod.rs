//! Common fakes for the control loop integration tests
//!
//! Every hardware and network seam gets a scripted stand-in that records what the
//! loop did with it.

#![allow(dead_code)]

use std::collections::VecDeque;

use envwatch_core::{
    ApiError, Indicator, Indicators, LinkStatus, Metric, NetworkLink, SensorError,
    SensorReading, SensorSource, SoundLevel, TelemetryApi, Thresholds, Violation,
    WifiCredentials,
};

/// The threshold document used throughout the examples
pub const SETTINGS_BODY: &str = r#"{"max_temp":26,"min_temp":18,"max_humidity":70,"min_humidity":20,"max_sound":500,"temp_interval":60,"humidity_interval":60}"#;

pub fn thresholds() -> Thresholds {
    Thresholds::from_json(SETTINGS_BODY).expect("example settings parse")
}

/// Link that connects on the n-th attempt (never when `connect_on` is `None`)
pub struct FakeLink {
    pub status: LinkStatus,
    pub connect_on: Option<u32>,
    pub attempts: u32,
    pub firmware_ok: bool,
}

impl FakeLink {
    pub fn connecting_on(attempt: u32) -> Self {
        Self {
            status: LinkStatus::Idle,
            connect_on: Some(attempt),
            attempts: 0,
            firmware_ok: true,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            connect_on: None,
            ..Self::connecting_on(1)
        }
    }
}

impl NetworkLink for FakeLink {
    fn status(&self) -> LinkStatus {
        self.status
    }

    fn begin(&mut self, _credentials: &WifiCredentials) -> LinkStatus {
        self.attempts += 1;
        self.status = if Some(self.attempts) == self.connect_on {
            LinkStatus::Connected
        } else {
            LinkStatus::ConnectFailed
        };
        self.status
    }

    fn firmware_current(&self) -> bool {
        self.firmware_ok
    }
}

/// Settings server stand-in that records every POST body
pub struct FakeApi {
    pub link: FakeLink,
    pub settings: VecDeque<Result<Thresholds, ApiError>>,
    pub last_settings: Result<Thresholds, ApiError>,
    pub report_results: VecDeque<Result<u16, ApiError>>,
    pub fetches: u32,
    pub posts: Vec<(Metric, String)>,
}

impl FakeApi {
    pub fn new(link: FakeLink, settings: Result<Thresholds, ApiError>) -> Self {
        Self {
            link,
            settings: VecDeque::new(),
            last_settings: settings,
            report_results: VecDeque::new(),
            fetches: 0,
            posts: Vec::new(),
        }
    }

    /// Queue settings answers served before falling back to the last one
    pub fn then_settings(mut self, result: Result<Thresholds, ApiError>) -> Self {
        self.settings.push_back(result);
        self
    }

    /// Queue report answers; unqueued reports succeed with 200
    pub fn then_report(mut self, result: Result<u16, ApiError>) -> Self {
        self.report_results.push_back(result);
        self
    }

    pub fn bodies(&self) -> Vec<&str> {
        self.posts.iter().map(|(_, body)| body.as_str()).collect()
    }
}

impl TelemetryApi for FakeApi {
    type Link = FakeLink;

    fn link(&mut self) -> &mut FakeLink {
        &mut self.link
    }

    fn fetch_settings(&mut self) -> Result<Thresholds, ApiError> {
        self.fetches += 1;
        if let Some(next) = self.settings.pop_front() {
            self.last_settings = next;
        }
        self.last_settings
    }

    fn report(&mut self, violation: &Violation) -> Result<u16, ApiError> {
        self.posts.push((violation.metric, violation.to_json_body()));
        self.report_results.pop_front().unwrap_or(Ok(200))
    }
}

/// Sensors that replay a script, repeating the last entry once it runs out
pub struct ScriptedSensors {
    climate: VecDeque<Result<SensorReading, SensorError>>,
    sound: VecDeque<Result<SoundLevel, SensorError>>,
}

impl ScriptedSensors {
    pub fn steady(temperature: f32, humidity: f32, sound: u16) -> Self {
        Self::new(
            vec![Ok(SensorReading::new(temperature, humidity))],
            vec![Ok(SoundLevel(sound))],
        )
    }

    pub fn new(
        climate: Vec<Result<SensorReading, SensorError>>,
        sound: Vec<Result<SoundLevel, SensorError>>,
    ) -> Self {
        Self {
            climate: climate.into(),
            sound: sound.into(),
        }
    }
}

fn next<T: Copy>(script: &mut VecDeque<T>) -> T {
    if script.len() > 1 {
        script.pop_front().expect("script not empty")
    } else {
        *script.front().expect("script not empty")
    }
}

impl SensorSource for ScriptedSensors {
    fn read_climate(&mut self) -> Result<SensorReading, SensorError> {
        next(&mut self.climate)
    }

    fn read_sound(&mut self) -> Result<SoundLevel, SensorError> {
        next(&mut self.sound)
    }
}

/// Lamps that remember their current state
#[derive(Debug, Default)]
pub struct RecordingIndicators {
    pub ok: bool,
    pub alert: bool,
    pub changes: usize,
}

impl Indicators for RecordingIndicators {
    fn set(&mut self, indicator: Indicator, on: bool) {
        self.changes += 1;
        match indicator {
            Indicator::Ok => self.ok = on,
            Indicator::Alert => self.alert = on,
        }
    }
}
