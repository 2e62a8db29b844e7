// src/cadence/schedule.rs

use chrono::{DateTime, Timelike, Utc};

use crate::config::LoopSection;

/// When the job is due: at every `every_minutes` boundary of the UTC clock,
/// once `settle_seconds` have passed in that minute (so the candle that just
/// closed is final).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseSchedule {
    every_minutes: u32,
    settle_seconds: u32,
}

impl CloseSchedule {
    pub fn new(every_minutes: u32, settle_seconds: u32) -> Self {
        Self {
            every_minutes: every_minutes.max(1),
            settle_seconds,
        }
    }

    pub fn from_config(cadence: &LoopSection) -> Self {
        Self::new(cadence.every_minutes, cadence.settle_seconds)
    }

    pub fn is_close(&self, now: DateTime<Utc>) -> bool {
        now.minute() % self.every_minutes == 0 && now.second() >= self.settle_seconds
    }

    /// Identifies the minute `now` falls in; a close fires once per slot.
    pub fn slot(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(60)
    }

    pub fn every_minutes(&self) -> u32 {
        self.every_minutes
    }

    pub fn settle_seconds(&self) -> u32 {
        self.settle_seconds
    }
}
