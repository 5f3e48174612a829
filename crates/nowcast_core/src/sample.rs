use chrono::{DateTime, Timelike, Utc};

use crate::FEATURES;

/// One recorded observation: the submitted reading plus the UTC time of day
/// at which it was recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    value: f64,
    hour: u8,
    minute: u8,
}

impl Sample {
    /// Stamps `value` with the hour and minute of `at`.
    pub fn at(value: f64, at: DateTime<Utc>) -> Self {
        Self {
            value,
            // chrono guarantees hour < 24 and minute < 60
            hour: at.hour() as u8,
            minute: at.minute() as u8,
        }
    }

    /// Stamps `value` with the current wall-clock time.
    pub fn now(value: f64) -> Self {
        Self::at(value, Utc::now())
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Model features in input order: `[value, hour, minute]`.
    pub fn features(&self) -> [f32; FEATURES] {
        [self.value as f32, self.hour as f32, self.minute as f32]
    }
}
