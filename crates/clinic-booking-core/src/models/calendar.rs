//! Doctor availability calendar models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical wall-clock format for slot boundaries.
pub const TIME_FORMAT: &str = "%H:%M";

/// Seconds in a day; the exclusive bound of a slot ending at midnight.
const END_OF_DAY_SECS: u32 = 24 * 60 * 60;

/// Canonical storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Malformed date, time or time-slot input.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// A bookable interval on one day of a doctor's calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Stable identifier assigned when the slot is created
    pub slot_id: String,
    /// Start boundary ("HH:MM"), unique within the day
    pub start_time: String,
    /// End boundary ("HH:MM"), exclusive
    pub end_time: String,
    /// Held by an active appointment
    pub is_booked: bool,
}

impl Slot {
    /// Create a new, free slot for the given range.
    pub fn new(range: &TimeRange) -> Self {
        Self {
            slot_id: uuid::Uuid::new_v4().to_string(),
            start_time: range.start_str(),
            end_time: range.end_str(),
            is_booked: false,
        }
    }

    /// Parse the stored boundaries back into a range.
    pub fn range(&self) -> Result<TimeRange, ValidationError> {
        TimeRange::parse(&self.start_time, &self.end_time)
    }
}

/// All slots of one doctor on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    /// UTC calendar date
    pub date: NaiveDate,
    /// Slots ordered by start time
    pub slots: Vec<Slot>,
}

impl DayAvailability {
    /// Slots that can still be booked.
    pub fn free_slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|slot| !slot.is_booked)
    }

}

/// A doctor's full availability, ordered by date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorCalendar {
    pub doctor_id: String,
    pub days: Vec<DayAvailability>,
}

impl DoctorCalendar {
    /// Group `(date, slot)` pairs into days, sorting days by date and slots by start.
    pub fn from_slots(doctor_id: String, slots: Vec<(NaiveDate, Slot)>) -> Self {
        let mut days: Vec<DayAvailability> = Vec::new();

        for (date, slot) in slots {
            match days.iter_mut().find(|day| day.date == date) {
                Some(day) => day.slots.push(slot),
                None => days.push(DayAvailability {
                    date,
                    slots: vec![slot],
                }),
            }
        }

        days.sort_by_key(|day| day.date);
        for day in &mut days {
            day.slots.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        }

        Self { doctor_id, days }
    }

    /// Total number of unbooked slots across all days.
    pub fn free_slot_count(&self) -> usize {
        self.days.iter().map(|day| day.free_slots().count()).sum()
    }
}

/// Half-open `[start, end)` interval within a single day.
///
/// An `end` of 00:00 means the end of the day, so "23:30 - 00:00" is the
/// last half hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Build a range, rejecting empty or inverted intervals.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        let range = Self { start, end };
        if start == end || range.start_secs() >= range.end_secs() {
            return Err(ValidationError(format!(
                "slot start {} must be before end {}",
                start.format(TIME_FORMAT),
                end.format(TIME_FORMAT)
            )));
        }
        Ok(range)
    }

    /// Parse explicit "HH:MM" boundaries.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    /// Parse a combined label such as "09:00 - 09:30".
    ///
    /// Accepts `-` or `–` as the separator, with or without surrounding spaces.
    pub fn parse_slot(time_slot: &str) -> Result<Self, ValidationError> {
        let (start, end) = time_slot
            .split_once(|c: char| c == '-' || c == '–')
            .ok_or_else(|| {
                ValidationError(format!(
                    "time slot {:?} must look like \"HH:MM - HH:MM\"",
                    time_slot
                ))
            })?;
        Self::parse(start, end)
    }

    /// True if the two ranges share any instant.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_secs() < other.end_secs() && other.start_secs() < self.end_secs()
    }

    fn start_secs(&self) -> u32 {
        self.start.num_seconds_from_midnight()
    }

    fn end_secs(&self) -> u32 {
        match self.end.num_seconds_from_midnight() {
            0 => END_OF_DAY_SECS,
            secs => secs,
        }
    }

    pub fn start_str(&self) -> String {
        self.start.format(TIME_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(TIME_FORMAT).to_string()
    }

    /// Human-readable label, e.g. "09:00 - 09:30".
    pub fn label(&self) -> String {
        format!("{} - {}", self.start_str(), self.end_str())
    }
}

/// Parse an "HH:MM" wall-clock time.
pub fn parse_time(input: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .map_err(|_| ValidationError(format!("invalid time {:?}, expected HH:MM", trimmed)))
}

/// Normalize a client-supplied date or timestamp to a UTC calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (converted to UTC first) and
/// zone-less `YYYY-MM-DDTHH:MM[:SS[.f]]`, which are taken as UTC.
pub fn normalize_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc).date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(timestamp.date());
        }
    }

    Err(ValidationError(format!("invalid date {:?}", trimmed)))
}

/// Storage key for a calendar date.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
