//! Generic flat records and their timing metadata.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Operation carried by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// The entity or link exists; refresh its TTL.
    Upsert,
    /// The entity or link is gone; expire it immediately.
    Delete,
}

impl Method {
    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First and last instants (Unix seconds) an object was observed.
///
/// `first <= last` holds for every window; construction clamps `first`
/// down to `last` when the inputs are out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservedWindow {
    first: i64,
    last: i64,
}

impl ObservedWindow {
    /// Create a window from first/last observed instants.
    #[must_use]
    pub const fn new(first: i64, last: i64) -> Self {
        if first <= last {
            Self { first, last }
        } else {
            Self { first: last, last }
        }
    }

    /// A window observed exactly once, at `instant`.
    #[must_use]
    pub const fn at(instant: i64) -> Self {
        Self {
            first: instant,
            last: instant,
        }
    }

    /// First observed instant.
    #[must_use]
    pub const fn first(&self) -> i64 {
        self.first
    }

    /// Last observed instant.
    #[must_use]
    pub const fn last(&self) -> i64 {
        self.last
    }

    /// The window extended to `now`. Never moves `last` backwards.
    #[must_use]
    pub fn refreshed(self, now: i64) -> Self {
        Self {
            first: self.first,
            last: self.last.max(now),
        }
    }

    /// Timestamp for a record built at `now` from this window.
    ///
    /// Never earlier than the last observed instant.
    #[must_use]
    pub fn record_timestamp(self, now: i64) -> i64 {
        now.max(self.last)
    }
}

/// A flat record: ordered field name → text value, plus a timestamp.
///
/// Field names are static so every record of a kind shares one schema.
/// Setting an existing field replaces its value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericRecord {
    timestamp: i64,
    fields: Vec<(&'static str, String)>,
}

impl GenericRecord {
    /// Create an empty record.
    #[must_use]
    pub const fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            fields: Vec::new(),
        }
    }

    /// Create an empty record with room for `capacity` fields.
    #[must_use]
    pub fn with_capacity(timestamp: i64, capacity: usize) -> Self {
        Self {
            timestamp,
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Set a field, replacing any previous value under the same name.
    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Record timestamp in Unix seconds.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// Fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.fields.iter().map(|(name, value)| (*name, value.as_str()))
    }
}

struct Contents<'a>(&'a [(&'static str, String)]);

impl Serialize for Contents<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for GenericRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GenericRecord", 2)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("contents", &Contents(&self.fields))?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_clamps_out_of_order_inputs() {
        let window = ObservedWindow::new(200, 100);
        assert_eq!(window.first(), 100);
        assert_eq!(window.last(), 100);
    }

    #[test]
    fn window_refresh_is_monotonic() {
        let window = ObservedWindow::new(100, 200);
        assert_eq!(window.refreshed(300).last(), 300);
        assert_eq!(window.refreshed(150).last(), 200);
        assert_eq!(window.refreshed(300).first(), 100);
    }

    #[test]
    fn record_timestamp_never_precedes_last_observed() {
        let window = ObservedWindow::new(100, 200);
        assert_eq!(window.record_timestamp(150), 200);
        assert_eq!(window.record_timestamp(250), 250);
    }

    #[test]
    fn set_replaces_in_place() {
        let mut record = GenericRecord::new(1);
        record.set("a", "1");
        record.set("b", "2");
        record.set("a", "3");
        assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some("3"));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn record_serializes_in_field_order() {
        let mut record = GenericRecord::new(42);
        record.set("zeta", "z");
        record.set("alpha", "");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"timestamp":42,"contents":{"zeta":"z","alpha":""}}"#);
    }

    #[test]
    fn method_wire_names() {
        assert_eq!(Method::Upsert.to_string(), "upsert");
        assert_eq!(serde_json::to_string(&Method::Delete).unwrap(), "\"delete\"");
    }
}
