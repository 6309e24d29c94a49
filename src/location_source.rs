use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;

use crate::coordinate::Coordinate;

#[derive(Clone, Debug, PartialEq)]
pub struct LocationSample {
    pub coordinate: Coordinate,
    /// Radius in meters.
    pub accuracy: Option<f64>,
    pub timestamp_ms: Option<i64>,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        LocationSample {
            coordinate: Coordinate::new(latitude, longitude),
            accuracy: None,
            timestamp_ms: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub maximum_age: Duration,
    pub timeout: Duration,
}

// The messages are shown to the user as is.
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LocationError {
    #[error("Please allow location access in your settings.")]
    PermissionDenied,
    #[error("Location information is unavailable.")]
    PositionUnavailable,
    #[error("Location request timed out. Please try again.")]
    Timeout,
    #[error("Location access denied or not available.")]
    Unknown(i32),
}

impl From<i32> for LocationError {
    fn from(code: i32) -> Self {
        match code {
            1 => LocationError::PermissionDenied,
            2 => LocationError::PositionUnavailable,
            3 => LocationError::Timeout,
            code => LocationError::Unknown(code),
        }
    }
}

impl LocationError {
    pub fn code(&self) -> i32 {
        match self {
            LocationError::PermissionDenied => 1,
            LocationError::PositionUnavailable => 2,
            LocationError::Timeout => 3,
            LocationError::Unknown(code) => *code,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WatchId(pub u32);

pub type LocationEvent = Result<LocationSample, LocationError>;

/// A device position stream. Updates of a subscription are pulled one at a
/// time with `next_event`; `clear_watch` ends the subscription and drops
/// whatever it had pending.
pub trait LocationSource {
    fn watch_position(&mut self, options: PositionOptions) -> Result<WatchId, LocationError>;
    fn next_event(&mut self, watch_id: WatchId) -> Option<LocationEvent>;
    fn clear_watch(&mut self, watch_id: WatchId);
    fn current_position(&mut self, options: PositionOptions) -> Result<LocationSample, LocationError>;
}

/// Plays back recorded events. Every subscription continues where the
/// previous one stopped.
pub struct ReplayLocationSource {
    events: VecDeque<LocationEvent>,
    next_watch_id: u32,
    active_watch: Option<WatchId>,
    watch_error: Option<LocationError>,
}

impl ReplayLocationSource {
    pub fn new(events: impl IntoIterator<Item = LocationEvent>) -> Self {
        ReplayLocationSource {
            events: events.into_iter().collect(),
            next_watch_id: 1,
            active_watch: None,
            watch_error: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<LocationEvent>::new())
    }

    pub fn from_samples(samples: impl IntoIterator<Item = LocationSample>) -> Self {
        Self::new(samples.into_iter().map(Ok))
    }

    /// Makes every `watch_position` call fail, e.g. to mimic a user who
    /// denied access.
    pub fn fail_watch_with(mut self, error: LocationError) -> Self {
        self.watch_error = Some(error);
        self
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }

    pub fn active_watch(&self) -> Option<WatchId> {
        self.active_watch
    }
}

impl LocationSource for ReplayLocationSource {
    fn watch_position(&mut self, options: PositionOptions) -> Result<WatchId, LocationError> {
        if let Some(error) = self.watch_error {
            return Err(error);
        }
        let watch_id = WatchId(self.next_watch_id);
        self.next_watch_id += 1;
        self.active_watch = Some(watch_id);
        debug!(
            "[location_source] watch {:?} started, options: {:?}",
            watch_id, options
        );
        Ok(watch_id)
    }

    fn next_event(&mut self, watch_id: WatchId) -> Option<LocationEvent> {
        if self.active_watch != Some(watch_id) {
            return None;
        }
        self.events.pop_front()
    }

    fn clear_watch(&mut self, watch_id: WatchId) {
        if self.active_watch == Some(watch_id) {
            debug!("[location_source] watch {:?} cleared", watch_id);
            self.active_watch = None;
        }
    }

    fn current_position(&mut self, _options: PositionOptions) -> Result<LocationSample, LocationError> {
        match self.events.front() {
            Some(Ok(sample)) => Ok(sample.clone()),
            Some(Err(error)) => Err(*error),
            None => Err(LocationError::PositionUnavailable),
        }
    }
}
