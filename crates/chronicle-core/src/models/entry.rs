use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::constants::{NO_RESPONSE, TIME_LABEL_FORMAT, UNKNOWN_TIME};

/// Stable identity for a history entry for the lifetime of a session.
///
/// Assigned when an entry is hydrated or appended and never persisted, so the
/// stored format stays a plain list of turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One conversation turn. Serializes to the persisted schema; reading goes
/// through [`ChatEntry::from_value`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub query: String,
    /// Absent on legacy entries. New entries always carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatEntry {
    /// Build a fresh entry stamped with the current instant.
    ///
    /// An empty or missing response is replaced by [`NO_RESPONSE`].
    /// Timestamps are kept at millisecond precision so they survive a
    /// round trip through the ISO-8601 form unchanged.
    pub fn new(query: impl Into<String>, response: Option<&str>) -> Self {
        let response = response
            .filter(|r| !r.is_empty())
            .unwrap_or(NO_RESPONSE)
            .to_string();

        Self {
            query: query.into(),
            response: Some(response),
            timestamp: Some(Utc::now().trunc_subsecs(3)),
        }
    }

    /// Validate one element of a persisted list.
    ///
    /// Returns `None` unless the element is an object with a non-empty string
    /// `query`. A non-string `response` is treated as absent; a missing or
    /// unparseable `timestamp` is treated as absent.
    ///
    /// This is a read-only view: the element itself is kept by
    /// [`HistoryItem::hydrated`] and written back unchanged.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let query = obj
            .get("query")
            .and_then(Value::as_str)
            .filter(|q| !q.is_empty())?;

        let response = obj
            .get("response")
            .and_then(Value::as_str)
            .map(str::to_string);

        let timestamp = obj
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);

        Some(Self {
            query: query.to_string(),
            response,
            timestamp,
        })
    }

    /// Response text to hand to the conversation view.
    pub fn response_or_default(&self) -> &str {
        self.response
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(NO_RESPONSE)
    }

    /// Human-readable time label in local time, or [`UNKNOWN_TIME`].
    pub fn time_label(&self) -> String {
        match self.timestamp {
            Some(ts) => ts.with_timezone(&Local).format(TIME_LABEL_FORMAT).to_string(),
            None => UNKNOWN_TIME.to_string(),
        }
    }
}

/// Accepts RFC 3339, a bare date (midnight UTC) and a date-time without
/// offset (local time).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|dt| Local.from_local_datetime(&dt).earliest())
        .map(|ts| ts.with_timezone(&Utc))
}

/// An entry paired with its session identity.
///
/// Items hydrated from storage keep the stored element verbatim and are
/// written back from it, so fields this crate does not interpret survive a
/// rewrite of the list.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    pub id: EntryId,
    pub entry: ChatEntry,
    stored: Option<Box<RawValue>>,
}

impl HistoryItem {
    pub fn new(entry: ChatEntry) -> Self {
        Self {
            id: EntryId::new(),
            entry,
            stored: None,
        }
    }

    /// Validate a stored element. `None` when it has no usable `query`.
    pub fn hydrated(stored: Box<RawValue>) -> Option<Self> {
        let value: Value = serde_json::from_str(stored.get()).ok()?;
        let entry = ChatEntry::from_value(&value)?;
        Some(Self {
            id: EntryId::new(),
            entry,
            stored: Some(stored),
        })
    }

    /// The element exactly as it was read, for hydrated items.
    pub fn stored(&self) -> Option<&str> {
        self.stored.as_deref().map(RawValue::get)
    }
}

impl PartialEq for HistoryItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.entry == other.entry && self.stored() == other.stored()
    }
}

impl Eq for HistoryItem {}

impl Serialize for HistoryItem {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.stored {
            Some(raw) => raw.serialize(serializer),
            None => self.entry.serialize(serializer),
        }
    }
}
