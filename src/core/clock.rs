//! Clocks for the engine
//!
//! The engine reads time only through `mockable::Clock`, always on the UTC
//! basis. `ManualClock` is a settable clock for deterministic replays and
//! tests of cart expiry and due dates.

use chrono::{DateTime, Duration, Local, Utc};
use mockable::{Clock, DefaultClock};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared clock handle held by the engine
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// The wall clock
pub fn system_clock() -> SharedClock {
    Arc::new(DefaultClock)
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        *self.0.lock() += delta;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock() = now;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}
