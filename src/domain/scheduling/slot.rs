//! Candidate interview time ranges.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, ValidationError};

/// Identity of a slot: its exact start instant.
///
/// Two slots with the same start are the same slot, whatever their end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotKey(Timestamp);

impl SlotKey {
    pub fn start(&self) -> Timestamp {
        self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate interview time range supplied by the interviewer.
///
/// Long availability windows are split into duration-sized slots before they
/// reach the domain; a `Slot` is always one bookable meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Slot {
    /// Creates a slot, rejecting empty or inverted ranges.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if !end.is_after(&start) {
            return Err(ValidationError::invalid_format(
                "slot",
                format!("end {} must be after start {}", end, start),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn key(&self) -> SlotKey {
        SlotKey(self.start)
    }

    pub fn duration_minutes(&self) -> i64 {
        self.end.duration_since(&self.start).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(hour: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap())
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(Slot::new(ts(10), ts(9)).is_err());
        assert!(Slot::new(ts(10), ts(10)).is_err());
    }

    #[test]
    fn key_ignores_end_time() {
        let short = Slot::new(ts(10), ts(11)).unwrap();
        let long = Slot::new(ts(10), ts(12)).unwrap();
        assert_eq!(short.key(), long.key());
        assert_ne!(short, long);
    }

    #[test]
    fn duration_in_minutes() {
        assert_eq!(Slot::new(ts(9), ts(11)).unwrap().duration_minutes(), 120);
    }
}
