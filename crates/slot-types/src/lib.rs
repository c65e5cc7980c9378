use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

pub mod rpc;
pub mod schedule;

pub use rpc::{RpcError, RpcErrorData, RpcRequest, RpcResponse};
pub use schedule::{Reception, ScheduleBySlot, ScheduleInfo, ScheduleOfDay, SlotEntry};

/// Format used for the slot identity string (in emails and the status file).
pub const SLOT_KEY_FORMAT: &str = "%Y-%m-%d %H:%M";

// ============================================================================
// Slot
// ============================================================================

/// A single open appointment, as wall-clock time without a timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    pub start: NaiveDateTime,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognised slot start time: {0:?}")]
pub struct SlotParseError(pub String);

impl Slot {
    pub fn new(start: NaiveDateTime) -> Self {
        Slot { start }
    }

    /// Parse a remote `startTime`.
    ///
    /// RFC 3339 values keep their local wall-clock time and drop the offset,
    /// so `2025-01-05T09:00:00+03:00` becomes `2025-01-05 09:00`.
    pub fn parse_start_time(raw: &str) -> Result<Self, SlotParseError> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Slot::new(dt.naive_local()));
        }

        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(Slot::new)
            .ok_or_else(|| SlotParseError(raw.to_string()))
    }

    /// Identity string of this slot. Novelty is decided on this value.
    pub fn key(&self) -> String {
        self.start.format(SLOT_KEY_FORMAT).to_string()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.format(SLOT_KEY_FORMAT))
    }
}

// ============================================================================
// Notification status
// ============================================================================

/// Persisted record of slots already notified, keyed by doctor name.
///
/// Serialized as `{ "doctor": ["2025-01-05 09:00", ...], ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationStatus(pub BTreeMap<String, BTreeSet<String>>);

impl NotificationStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots already notified for `doctor`, `None` if the doctor was never notified.
    pub fn notified(&self, doctor: &str) -> Option<&BTreeSet<String>> {
        self.0.get(doctor)
    }

    /// True if every key is already recorded for `doctor`.
    pub fn contains_all<'a, I>(&self, doctor: &str, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self.0.get(doctor) {
            Some(known) => keys.into_iter().all(|k| known.contains(k)),
            None => keys.into_iter().next().is_none(),
        }
    }

    /// Union `keys` into the doctor's set. Returns whether anything was added.
    pub fn merge<I>(&mut self, doctor: &str, keys: I) -> bool
    where
        I: IntoIterator<Item = String>,
    {
        let entry = self.0.entry(doctor.to_string()).or_default();
        let before = entry.len();
        entry.extend(keys);
        entry.len() != before
    }

    pub fn doctors(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
