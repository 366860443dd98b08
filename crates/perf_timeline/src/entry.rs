//! Timing entries and the host delivery object.
//!
//! Hosts hand entries over as loosely structured JSON values. They are
//! converted to [`TimingEntry`] exactly once, at the boundary, so the rest
//! of the crate works with a fully typed record.

use crate::error::TimelineResult;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An entry as the host represents it.
pub type RawEntry = Value;

/// Classification tag of a timing entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryType {
    /// A named point in time
    Mark,
    /// A completed measurement between two marks
    Measure,
    /// First paint / first contentful paint
    Paint,
    /// Document navigation timing
    Navigation,
    /// Resource fetch timing
    Resource,
    /// Task that blocked the event loop for a long time
    LongTask,
    /// Delay of the first user input
    FirstInput,
    /// Largest contentful paint candidate
    LargestContentfulPaint,
    /// Layout shift score sample
    LayoutShift,
    /// Any tag this crate does not know about
    Other(String),
}

impl EntryType {
    /// The host string tag for this type.
    pub fn as_str(&self) -> &str {
        match self {
            EntryType::Mark => "mark",
            EntryType::Measure => "measure",
            EntryType::Paint => "paint",
            EntryType::Navigation => "navigation",
            EntryType::Resource => "resource",
            EntryType::LongTask => "longtask",
            EntryType::FirstInput => "first-input",
            EntryType::LargestContentfulPaint => "largest-contentful-paint",
            EntryType::LayoutShift => "layout-shift",
            EntryType::Other(tag) => tag,
        }
    }

    /// Whether this tag marks a completed measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self, EntryType::Measure)
    }
}

impl From<&str> for EntryType {
    fn from(tag: &str) -> Self {
        match tag {
            "mark" => EntryType::Mark,
            "measure" => EntryType::Measure,
            "paint" => EntryType::Paint,
            "navigation" => EntryType::Navigation,
            "resource" => EntryType::Resource,
            "longtask" => EntryType::LongTask,
            "first-input" => EntryType::FirstInput,
            "largest-contentful-paint" => EntryType::LargestContentfulPaint,
            "layout-shift" => EntryType::LayoutShift,
            other => EntryType::Other(other.to_string()),
        }
    }
}

impl From<String> for EntryType {
    fn from(tag: String) -> Self {
        match EntryType::from(tag.as_str()) {
            EntryType::Other(_) => EntryType::Other(tag),
            known => known,
        }
    }
}

impl From<EntryType> for String {
    fn from(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingEntry {
    /// Entry name (mark name, metric name, paint name, ...)
    pub name: String,
    /// Classification tag
    pub entry_type: EntryType,
    /// Start time in milliseconds on the host clock
    pub start_time: f64,
    /// Duration in milliseconds; zero for point entries
    #[serde(default)]
    pub duration: f64,
}

impl TimingEntry {
    /// Create a new entry.
    pub fn new(
        name: impl Into<String>,
        entry_type: EntryType,
        start_time: f64,
        duration: f64,
    ) -> Self {
        Self {
            name: name.into(),
            entry_type,
            start_time,
            duration,
        }
    }

    /// Create a zero-duration mark entry.
    pub fn mark(name: impl Into<String>, start_time: f64) -> Self {
        Self::new(name, EntryType::Mark, start_time, 0.0)
    }

    /// Create a measure entry spanning `start_time..end_time`.
    pub fn measure(name: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self::new(name, EntryType::Measure, start_time, end_time - start_time)
    }

    /// Validate and convert a host entry.
    pub fn from_raw(raw: &RawEntry) -> TimelineResult<Self> {
        let entry = TimingEntry::deserialize(raw)?;
        if !entry.start_time.is_finite() || !entry.duration.is_finite() {
            return Err(serde_json::Error::custom(format!(
                "entry '{}' carries a non-finite timestamp",
                entry.name
            ))
            .into());
        }
        Ok(entry)
    }

    /// Convert back into the host representation.
    pub fn to_raw(&self) -> RawEntry {
        serde_json::json!({
            "name": self.name,
            "entryType": self.entry_type.as_str(),
            "startTime": self.start_time,
            "duration": self.duration,
        })
    }

    /// End time in milliseconds.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// A batch of entries as delivered to an observer callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryList {
    entries: Vec<RawEntry>,
}

impl EntryList {
    /// Wrap a host batch.
    pub fn new(entries: Vec<RawEntry>) -> Self {
        Self { entries }
    }

    /// Entries in host order.
    pub fn entries(&self) -> &[RawEntry] {
        &self.entries
    }

    /// Entries whose `entryType` equals `tag`.
    pub fn entries_by_type(&self, tag: &str) -> Vec<&RawEntry> {
        self.entries
            .iter()
            .filter(|e| e.get("entryType").and_then(Value::as_str) == Some(tag))
            .collect()
    }

    /// Number of entries in the batch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert the whole batch, failing on the first malformed entry.
    pub fn to_timing_entries(&self) -> TimelineResult<Vec<TimingEntry>> {
        self.entries.iter().map(TimingEntry::from_raw).collect()
    }

    /// Take the raw entries.
    pub fn into_raw(self) -> Vec<RawEntry> {
        self.entries
    }
}

impl From<Vec<TimingEntry>> for EntryList {
    fn from(entries: Vec<TimingEntry>) -> Self {
        Self::new(entries.iter().map(TimingEntry::to_raw).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimelineError;
    use serde_json::json;

    #[test]
    fn test_entry_type_tags() {
        assert_eq!(EntryType::from("paint"), EntryType::Paint);
        assert_eq!(EntryType::from("longtask"), EntryType::LongTask);
        assert_eq!(EntryType::from("element"), EntryType::Other("element".to_string()));
        assert_eq!(String::from(EntryType::FirstInput), "first-input");
        assert!(EntryType::Measure.is_measure());
        assert!(!EntryType::Mark.is_measure());
    }

    #[test]
    fn test_from_raw_paint_entry() {
        let raw = json!({
            "name": "first-contentful-paint",
            "entryType": "paint",
            "startTime": 412.5,
            "duration": 0
        });

        let entry = TimingEntry::from_raw(&raw).unwrap();
        assert_eq!(entry.name, "first-contentful-paint");
        assert_eq!(entry.entry_type, EntryType::Paint);
        assert_eq!(entry.start_time, 412.5);
        assert_eq!(entry.duration, 0.0);
    }

    #[test]
    fn test_from_raw_defaults_duration() {
        let raw = json!({ "name": "mark_x_start", "entryType": "mark", "startTime": 3.0 });
        let entry = TimingEntry::from_raw(&raw).unwrap();
        assert_eq!(entry.duration, 0.0);
    }

    #[test]
    fn test_from_raw_rejects_missing_fields() {
        let raw = json!({ "name": "first-paint", "startTime": 10.0 });
        let err = TimingEntry::from_raw(&raw).unwrap_err();
        assert!(matches!(err, TimelineError::MalformedEntry(_)));

        let raw = json!({ "name": "first-paint", "entryType": "paint", "startTime": "soon" });
        assert!(TimingEntry::from_raw(&raw).is_err());
    }

    #[test]
    fn test_to_raw_matches_host_shape() {
        let entry = TimingEntry::measure("load", 100.0, 250.5);
        let raw = entry.to_raw();

        assert_eq!(raw["entryType"], "measure");
        assert_eq!(raw["startTime"], 100.0);
        assert_eq!(raw["duration"], 150.5);
        assert_eq!(TimingEntry::from_raw(&raw).unwrap(), entry);
    }

    #[test]
    fn test_entry_list_filters_by_type() {
        let list = EntryList::from(vec![
            TimingEntry::new("first-paint", EntryType::Paint, 10.0, 0.0),
            TimingEntry::mark("mark_a_start", 11.0),
            TimingEntry::new("first-contentful-paint", EntryType::Paint, 12.0, 0.0),
        ]);

        assert_eq!(list.len(), 3);
        assert_eq!(list.entries_by_type("paint").len(), 2);

        let typed = list.to_timing_entries().unwrap();
        assert_eq!(typed[0].name, "first-paint");
        assert_eq!(typed[2].name, "first-contentful-paint");
    }

    #[test]
    fn test_entry_list_fails_on_malformed_member() {
        let list = EntryList::new(vec![
            TimingEntry::mark("ok", 1.0).to_raw(),
            json!({ "entryType": "paint" }),
        ]);
        assert!(list.to_timing_entries().is_err());
    }
}
