#![allow(dead_code)]
use std::cell::Cell;

use chrono::{DateTime, TimeDelta, Utc};
use pms5003::{framing::encode, stream::Clock, Measurement};

/// Measurement with every field set to `x`.
pub fn measurement(x: u16) -> Measurement {
    Measurement::from_fields([x; Measurement::NUM_FIELDS])
}

/// Concatenated frames for `measurements`.
pub fn frames(measurements: &[Measurement]) -> Vec<u8> {
    measurements.iter().flat_map(encode).collect()
}

/// Clock that returns the scripted times in order, repeating the last one.
pub struct ScriptedClock {
    times: Vec<DateTime<Utc>>,
    idx: Cell<usize>,
}

impl ScriptedClock {
    /// Times are given in seconds from the unix epoch.
    pub fn new(secs: &[i64]) -> Self {
        ScriptedClock {
            times: secs
                .iter()
                .map(|s| DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(*s))
                .collect(),
            idx: Cell::new(0),
        }
    }
}

impl Clock for ScriptedClock {
    fn now(&self) -> DateTime<Utc> {
        let idx = self.idx.get();
        self.idx.set(idx + 1);
        self.times[idx.min(self.times.len() - 1)]
    }
}
