//! Event types for timeline layout.
//!
//! An [`Event`] is a single calendar entry for one day. Packing turns it into a
//! [`PackedEvent`], the same entry plus the pixel geometry a timeline view
//! needs to draw it.

use chrono::{Duration, NaiveDateTime};
use serde::{ser, Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::io::Read;

/// Duration assumed for events that have no end.
pub const DEFAULT_EVENT_HOURS: i64 = 1;

/// Caller-defined fields carried through layout untouched.
pub type Fields = Map<String, Value>;

/// A calendar entry with a start, an optional end and arbitrary extra data.
///
/// The payload `T` is flattened on (de)serialization, so with the default
/// [`Fields`] any unknown JSON keys survive a pack round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<T = Fields> {
    /// Inclusive start (wall-clock time).
    #[serde(with = "timestamp")]
    pub start: NaiveDateTime,

    /// Exclusive end. Defaults to one hour after `start` when absent.
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<NaiveDateTime>,

    /// Caller payload.
    #[serde(flatten)]
    pub data: T,
}

impl<T> Event<T> {
    /// Create an event carrying `data`.
    pub fn new(start: NaiveDateTime, end: Option<NaiveDateTime>, data: T) -> Self {
        Self { start, end, data }
    }

    /// The end used for layout: the explicit end, or `start` plus one hour.
    pub fn end_or_default(&self) -> NaiveDateTime {
        self.end
            .unwrap_or_else(|| self.start + Duration::hours(DEFAULT_EVENT_HOURS))
    }

    /// Whether the two events share any moment in time.
    ///
    /// Back-to-back events, where one ends exactly as the other starts, do
    /// not overlap.
    pub fn overlaps<U>(&self, other: &Event<U>) -> bool {
        intervals_overlap(
            (self.start, self.end_or_default()),
            (other.start, other.end_or_default()),
        )
    }
}

impl<T: Default> Event<T> {
    /// Create an event spanning `start..end` with an empty payload.
    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::new(start, Some(end), T::default())
    }

    /// Create an event with no explicit end and an empty payload.
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self::new(start, None, T::default())
    }
}

/// Open-interval overlap test: `a.end > b.start && a.start < b.end`.
pub fn intervals_overlap(
    a: (NaiveDateTime, NaiveDateTime),
    b: (NaiveDateTime, NaiveDateTime),
) -> bool {
    a.1 > b.0 && a.0 < b.1
}

/// An event after packing, positioned in pixels relative to the event area.
///
/// Serializes as the input event with `top`, `height`, `left`, `width` and
/// `index` set on it; payload keys with those names are overwritten.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackedEvent<T = Fields> {
    /// The input event, unchanged.
    #[serde(flatten)]
    pub event: Event<T>,

    /// Distance from the top of the visible day.
    pub top: f64,

    /// Vertical extent, proportional to the event's duration.
    pub height: f64,

    /// Distance from the left edge of the event area.
    pub left: f64,

    /// Horizontal extent, gutter already subtracted.
    pub width: f64,

    /// Position of the event in the list given to the packer.
    pub index: usize,

    /// Column the event was assigned within its overlap group.
    #[serde(skip)]
    pub column: usize,

    /// Number of columns the event stretches across, starting at `column`.
    #[serde(skip)]
    pub column_span: usize,

    /// Number of columns in the event's overlap group.
    #[serde(skip)]
    pub column_count: usize,
}

impl<T: Serialize> Serialize for PackedEvent<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut fields = match serde_json::to_value(&self.event).map_err(ser::Error::custom)? {
            Value::Object(fields) => fields,
            other => {
                return Err(ser::Error::custom(format!(
                    "event must serialize to an object, got {other}"
                )))
            }
        };
        fields.insert("top".into(), self.top.into());
        fields.insert("height".into(), self.height.into());
        fields.insert("left".into(), self.left.into());
        fields.insert("width".into(), self.width.into());
        fields.insert("index".into(), self.index.into());
        fields.serialize(serializer)
    }
}

impl<T> PackedEvent<T> {
    /// Right edge of the block.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge of the block.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Drop the geometry and return the input event.
    pub fn into_event(self) -> Event<T> {
        self.event
    }
}

/// Read a JSON array of events.
pub fn read_events<R: Read>(mut reader: R) -> Result<Vec<Event>, EventParseError> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(EventParseError::Io)?;
    serde_json::from_str(&content).map_err(EventParseError::Parse)
}

/// Errors that can occur when reading events.
#[derive(Debug, thiserror::Error)]
pub enum EventParseError {
    /// I/O error reading input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is not a JSON array of events.
    #[error("Invalid events: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Timestamp parsing and the serde adapters used by [`Event`].
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Format used when writing timestamps. The fraction is only written
    /// when non-zero.
    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    /// Wall-clock layouts accepted on input. `%.f` also matches no fraction.
    const ACCEPTED: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    /// Error for a timestamp that matches none of the accepted layouts.
    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("invalid timestamp '{0}': expected YYYY-MM-DD HH:MM[:SS] or RFC 3339")]
    pub struct TimestampError(pub String);

    /// Parse a timestamp.
    ///
    /// RFC 3339 values keep their wall-clock time; the offset is dropped.
    pub fn parse(raw: &str) -> Result<NaiveDateTime, TimestampError> {
        let raw = raw.trim();
        ACCEPTED
            .iter()
            .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.naive_local())
            })
            .ok_or_else(|| TimestampError(raw.to_string()))
    }

    /// Format a timestamp the way it is written back out.
    pub fn format(ts: &NaiveDateTime) -> String {
        ts.format(FORMAT).to_string()
    }

    pub fn serialize<S: Serializer>(
        ts: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    /// Adapters for `Option<NaiveDateTime>`.
    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            ts: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => super::serialize(ts, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw))
                .transpose()
                .map_err(de::Error::custom)
        }
    }
}
