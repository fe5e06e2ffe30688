//! Core domain types for the Carebloom care calendar.
//!
//! This module defines the fundamental types used throughout the system:
//! - Identifiers for patients and events
//! - Wall-clock times of day
//! - Care events and the drafts caregivers submit
//! - Daily templates and their archetypes

use crate::{Error, Result};
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of the patient who owns a set of events
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PatientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PatientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event identifier
///
/// Caregiver-entered events get a millisecond timestamp such as
/// `1718000000000`. Template events get `<patient>:<YYYY-MM-DD>:<ordinal>`.
/// Plain JSON numbers from older caches and backends are accepted on read.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for EventId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EventId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id = s.trim();
        if id.is_empty() {
            return Err(Error::InvalidEvent("event id must not be empty".into()));
        }
        Ok(EventId::new(id))
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => EventId(id),
            RawId::Number(id) => EventId::from(id),
        })
    }
}

// ============================================================================
// Time of day
// ============================================================================

/// A wall-clock time of day with minute precision, written `HH:MM`
///
/// No timezone: times are local to the care recipient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(NaiveTime::MIN);

    /// Build from hour and minute, `None` if out of range
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(ClockTime)
    }

    /// Minutes elapsed since midnight
    pub fn minutes_since_midnight(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        // Seconds are dropped so comparisons work at minute granularity
        NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
            .map(ClockTime)
            .unwrap_or(ClockTime(time))
    }
}

impl FromStr for ClockTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(ClockTime)
            .map_err(|e| Error::InvalidTime(format!("{:?} is not HH:MM: {}", s, e)))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Event classification
// ============================================================================

/// Kind of care activity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Medication,
    Appointment,
    #[default]
    Activity,
    Reminder,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Medication => "medication",
            EventType::Appointment => "appointment",
            EventType::Activity => "activity",
            EventType::Reminder => "reminder",
        }
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "medication" | "med" => Ok(EventType::Medication),
            "appointment" => Ok(EventType::Appointment),
            "activity" => Ok(EventType::Activity),
            "reminder" => Ok(EventType::Reminder),
            other => Err(Error::InvalidEvent(format!("unknown event type {:?}", other))),
        }
    }
}

/// Urgency of an event
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(Error::InvalidEvent(format!("unknown priority {:?}", other))),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// A scheduled care activity for one patient on one date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CareEvent {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: EventType,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub date: NaiveDate,
    pub patient_id: PatientId,
    /// Generated from a daily template rather than entered by a caregiver
    #[serde(default)]
    pub recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver_notes: Option<String>,
}

/// Fields a caregiver fills in to add an event
#[derive(Clone, Debug, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub kind: EventType,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub priority: Priority,
}

impl EventDraft {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.title, self.start_time, self.end_time)
    }
}

// ============================================================================
// Templates
// ============================================================================

/// One entry of a patient's standing daily routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventArchetype {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: EventType,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default)]
    pub priority: Priority,
}

impl EventArchetype {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.title, self.start_time, self.end_time)
    }
}

/// Ordered list of archetypes making up a patient's day
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DailyTemplate {
    archetypes: Vec<EventArchetype>,
}

impl DailyTemplate {
    pub fn new(archetypes: Vec<EventArchetype>) -> Self {
        Self { archetypes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn archetypes(&self) -> &[EventArchetype] {
        &self.archetypes
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

fn validate_fields(title: &str, start: ClockTime, end: ClockTime) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidEvent("title must not be empty".into()));
    }
    if start > end {
        return Err(Error::InvalidEvent(format!(
            "start time {} is after end time {}",
            start, end
        )));
    }
    Ok(())
}
