//! System clock adapter.
//!
//! Wall-clock time for trigger windows and run boundaries.  Sampling
//! deadlines use `std::time::Instant` inside the runner instead, so a clock
//! step never stretches or skips a sample.

use chrono::{DateTime, Utc};

use crate::app::ports::ClockPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
