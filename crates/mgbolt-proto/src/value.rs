//! The dynamically-typed value algebra exchanged over the wire.
//!
//! Two parallel representations exist. [`DecodedValue`] is produced only by
//! the decoder: strings, list/map backing storage, and struct fields all
//! live in the [`Arena`](crate::arena::Arena) of the message that produced
//! them, so decoding a record allocates nothing from the global heap.
//! [`Value`] is the owned, `'static` counterpart applications use to build
//! query parameters, and is what [`DecodedValue::to_owned`] produces when a
//! caller needs to retain a value past the next inbound read.

use indexmap::IndexMap;

use crate::errors::ProtocolError;

/// An arena-borrowed node: `(id, labels, properties)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedNode<'a> {
    /// Server-assigned identifier. Not stable across restarts.
    pub id: i64,
    /// Labels attached to the node.
    pub labels: &'a [&'a str],
    /// Property map.
    pub properties: &'a [(&'a str, DecodedValue<'a>)],
}

/// An arena-borrowed relationship: `(id, start, end, type, properties)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedRelationship<'a> {
    /// Server-assigned identifier.
    pub id: i64,
    /// Identifier of the start node.
    pub start_id: i64,
    /// Identifier of the end node.
    pub end_id: i64,
    /// Relationship type name.
    pub rel_type: &'a str,
    /// Property map.
    pub properties: &'a [(&'a str, DecodedValue<'a>)],
}

/// An arena-borrowed relationship detached from its endpoints, as carried
/// inside a [`DecodedPath`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedUnboundRelationship<'a> {
    /// Server-assigned identifier.
    pub id: i64,
    /// Relationship type name.
    pub rel_type: &'a str,
    /// Property map.
    pub properties: &'a [(&'a str, DecodedValue<'a>)],
}

/// An arena-borrowed path: alternating nodes and relationships.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedPath<'a> {
    /// Every distinct node touched by the path.
    pub nodes: &'a [DecodedNode<'a>],
    /// Every distinct relationship touched by the path, direction-agnostic.
    pub relationships: &'a [DecodedUnboundRelationship<'a>],
    /// Alternating `(relationship_index, node_index)` pairs describing
    /// traversal order and direction; a negative relationship index means
    /// the relationship is traversed against its natural direction (encoded
    /// as `-(index + 1)`).
    pub sequence: &'a [i64],
}

/// A value decoded from the wire, borrowing its backing storage from a
/// message's [`Arena`](crate::arena::Arena).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedValue<'a> {
    /// Absence of a value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// IEEE-754 double. Equality follows `f64`'s own `PartialEq`, so a
    /// `Float(NaN)` is unequal to every other value including itself; this
    /// matches the upstream client rather than normalizing NaN away.
    Float(f64),
    /// UTF-8 string.
    String(&'a str),
    /// Ordered list of values.
    List(&'a [DecodedValue<'a>]),
    /// Ordered, duplicate-free string-keyed map.
    Map(&'a [(&'a str, DecodedValue<'a>)]),
    /// Graph node.
    Node(DecodedNode<'a>),
    /// Graph relationship.
    Relationship(DecodedRelationship<'a>),
    /// Relationship detached from its endpoints.
    UnboundRelationship(DecodedUnboundRelationship<'a>),
    /// Graph path.
    Path(DecodedPath<'a>),
    /// Calendar date, as a day offset from the Unix epoch.
    Date {
        /// Days since 1970-01-01.
        days: i64,
    },
    /// Time of day with a UTC offset.
    Time {
        /// Nanoseconds since midnight.
        nanoseconds: i64,
        /// Offset from UTC, in seconds.
        tz_offset_seconds: i32,
    },
    /// Time of day with no associated offset.
    LocalTime {
        /// Nanoseconds since midnight.
        nanoseconds: i64,
    },
    /// Instant with a UTC offset.
    DateTime {
        /// Seconds since the Unix epoch.
        seconds: i64,
        /// Nanoseconds within the second.
        nanoseconds: i32,
        /// Offset from UTC, in minutes.
        tz_offset_minutes: i32,
    },
    /// Instant with a named time zone.
    DateTimeZoneId {
        /// Seconds since the Unix epoch.
        seconds: i64,
        /// Nanoseconds within the second.
        nanoseconds: i32,
        /// IANA time zone identifier.
        tz_id: &'a str,
    },
    /// Instant with no associated zone or offset.
    LocalDateTime {
        /// Seconds since the Unix epoch.
        seconds: i64,
        /// Nanoseconds within the second.
        nanoseconds: i32,
    },
    /// Calendar-aware duration.
    Duration {
        /// Whole months.
        months: i64,
        /// Whole days, independent of months.
        days: i64,
        /// Whole seconds, independent of days.
        seconds: i64,
        /// Nanoseconds within the second.
        nanoseconds: i32,
    },
    /// Point in a 2D coordinate system.
    Point2D {
        /// Spatial reference identifier.
        srid: i64,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },
    /// Point in a 3D coordinate system.
    Point3D {
        /// Spatial reference identifier.
        srid: i64,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
        /// Z coordinate.
        z: f64,
    },
    /// A struct whose signature byte was not recognized. Preserved so that
    /// forward-compatible servers don't force a hard decode failure; the raw
    /// fields are kept for inspection but cannot be re-encoded.
    Unknown {
        /// The struct's signature byte.
        signature: u8,
        /// The struct's fields, decoded as values.
        fields: &'a [DecodedValue<'a>],
    },
}

impl<'a> DecodedValue<'a> {
    /// Deep-copies this value into an owned [`Value`] with no arena
    /// dependency, safe to retain past the arena's next reset.
    #[must_use]
    pub fn to_owned_value(&self) -> Value {
        match *self {
            DecodedValue::Null => Value::Null,
            DecodedValue::Bool(b) => Value::Bool(b),
            DecodedValue::Integer(i) => Value::Integer(i),
            DecodedValue::Float(f) => Value::Float(f),
            DecodedValue::String(s) => Value::String(s.to_owned()),
            DecodedValue::List(items) => {
                Value::List(items.iter().map(DecodedValue::to_owned_value).collect())
            }
            DecodedValue::Map(entries) => {
                let mut map = ValueMap::with_capacity(entries.len());
                for &(k, ref v) in entries {
                    // Decoded maps are already duplicate-free; insertion here
                    // cannot fail.
                    let _ = map.insert(k.to_owned(), v.to_owned_value());
                }
                Value::Map(map)
            }
            DecodedValue::Node(n) => Value::Node(Node {
                id: n.id,
                labels: n.labels.iter().map(|l| (*l).to_owned()).collect(),
                properties: owned_props(n.properties),
            }),
            DecodedValue::Relationship(r) => Value::Relationship(Relationship {
                id: r.id,
                start_id: r.start_id,
                end_id: r.end_id,
                rel_type: r.rel_type.to_owned(),
                properties: owned_props(r.properties),
            }),
            DecodedValue::UnboundRelationship(r) => {
                Value::UnboundRelationship(UnboundRelationship {
                    id: r.id,
                    rel_type: r.rel_type.to_owned(),
                    properties: owned_props(r.properties),
                })
            }
            DecodedValue::Path(p) => Value::Path(Path {
                nodes: p
                    .nodes
                    .iter()
                    .map(|n| Node {
                        id: n.id,
                        labels: n.labels.iter().map(|l| (*l).to_owned()).collect(),
                        properties: owned_props(n.properties),
                    })
                    .collect(),
                relationships: p
                    .relationships
                    .iter()
                    .map(|r| UnboundRelationship {
                        id: r.id,
                        rel_type: r.rel_type.to_owned(),
                        properties: owned_props(r.properties),
                    })
                    .collect(),
                sequence: p.sequence.to_vec(),
            }),
            DecodedValue::Date { days } => Value::Date { days },
            DecodedValue::Time {
                nanoseconds,
                tz_offset_seconds,
            } => Value::Time {
                nanoseconds,
                tz_offset_seconds,
            },
            DecodedValue::LocalTime { nanoseconds } => Value::LocalTime { nanoseconds },
            DecodedValue::DateTime {
                seconds,
                nanoseconds,
                tz_offset_minutes,
            } => Value::DateTime {
                seconds,
                nanoseconds,
                tz_offset_minutes,
            },
            DecodedValue::DateTimeZoneId {
                seconds,
                nanoseconds,
                tz_id,
            } => Value::DateTimeZoneId {
                seconds,
                nanoseconds,
                tz_id: tz_id.to_owned(),
            },
            DecodedValue::LocalDateTime {
                seconds,
                nanoseconds,
            } => Value::LocalDateTime {
                seconds,
                nanoseconds,
            },
            DecodedValue::Duration {
                months,
                days,
                seconds,
                nanoseconds,
            } => Value::Duration {
                months,
                days,
                seconds,
                nanoseconds,
            },
            DecodedValue::Point2D { srid, x, y } => Value::Point2D { srid, x, y },
            DecodedValue::Point3D { srid, x, y, z } => Value::Point3D { srid, x, y, z },
            DecodedValue::Unknown { signature, fields } => Value::Unknown {
                signature,
                fields: fields.iter().map(DecodedValue::to_owned_value).collect(),
            },
        }
    }
}

fn owned_props(entries: &[(&str, DecodedValue<'_>)]) -> ValueMap {
    let mut map = ValueMap::with_capacity(entries.len());
    for &(k, ref v) in entries {
        let _ = map.insert(k.to_owned(), v.to_owned_value());
    }
    map
}

/// An order-preserving, string-keyed map that rejects duplicate-key inserts
/// rather than silently overwriting, matching the protocol's map invariant.
///
/// Backed by [`indexmap::IndexMap`] for its preserved insertion order and
/// O(1) lookup; [`ValueMap::insert`] adds the duplicate-key check
/// `IndexMap` itself does not enforce.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    inner: IndexMap<String, Value>,
}

impl PartialEq for ValueMap {
    /// Compares entries pairwise in iteration order. `IndexMap`'s own
    /// derived equality is order-insensitive; this map's equality must be
    /// order-sensitive to match the protocol's ordered-map invariant.
    fn eq(&self, other: &Self) -> bool {
        self.inner.iter().eq(other.inner.iter())
    }
}

impl ValueMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: IndexMap::new(),
        }
    }

    /// Creates an empty map with room for `capacity` entries before
    /// reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts `key` and `value`, failing without modifying the map if
    /// `key` is already present.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::DuplicateKey`] if `key` is already present.
    pub fn insert(&mut self, key: String, value: Value) -> Result<(), ProtocolError> {
        if self.inner.contains_key(&key) {
            return Err(ProtocolError::DuplicateKey);
        }
        self.inner.insert(key, value);
        Ok(())
    }

    /// Looks up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// An owned graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Server-assigned identifier.
    pub id: i64,
    /// Labels attached to the node.
    pub labels: Vec<String>,
    /// Property map.
    pub properties: ValueMap,
}

/// An owned graph relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Server-assigned identifier.
    pub id: i64,
    /// Identifier of the start node.
    pub start_id: i64,
    /// Identifier of the end node.
    pub end_id: i64,
    /// Relationship type name.
    pub rel_type: String,
    /// Property map.
    pub properties: ValueMap,
}

/// An owned relationship detached from its endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct UnboundRelationship {
    /// Server-assigned identifier.
    pub id: i64,
    /// Relationship type name.
    pub rel_type: String,
    /// Property map.
    pub properties: ValueMap,
}

/// An owned graph path.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Every distinct node touched by the path.
    pub nodes: Vec<Node>,
    /// Every distinct relationship touched by the path, direction-agnostic.
    pub relationships: Vec<UnboundRelationship>,
    /// Alternating `(relationship_index, node_index)` pairs, see
    /// [`DecodedPath::sequence`].
    pub sequence: Vec<i64>,
}

/// An owned, `'static` value, used to build query parameters and to retain
/// decoded results past their originating arena's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// IEEE-754 double; NaN is unequal to everything, see
    /// [`DecodedValue::Float`].
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Ordered, duplicate-free string-keyed map.
    Map(ValueMap),
    /// Graph node.
    Node(Node),
    /// Graph relationship.
    Relationship(Relationship),
    /// Relationship detached from its endpoints.
    UnboundRelationship(UnboundRelationship),
    /// Graph path.
    Path(Path),
    /// Calendar date, as a day offset from the Unix epoch.
    Date {
        /// Days since 1970-01-01.
        days: i64,
    },
    /// Time of day with a UTC offset.
    Time {
        /// Nanoseconds since midnight.
        nanoseconds: i64,
        /// Offset from UTC, in seconds.
        tz_offset_seconds: i32,
    },
    /// Time of day with no associated offset.
    LocalTime {
        /// Nanoseconds since midnight.
        nanoseconds: i64,
    },
    /// Instant with a UTC offset.
    DateTime {
        /// Seconds since the Unix epoch.
        seconds: i64,
        /// Nanoseconds within the second.
        nanoseconds: i32,
        /// Offset from UTC, in minutes.
        tz_offset_minutes: i32,
    },
    /// Instant with a named time zone.
    DateTimeZoneId {
        /// Seconds since the Unix epoch.
        seconds: i64,
        /// Nanoseconds within the second.
        nanoseconds: i32,
        /// IANA time zone identifier.
        tz_id: String,
    },
    /// Instant with no associated zone or offset.
    LocalDateTime {
        /// Seconds since the Unix epoch.
        seconds: i64,
        /// Nanoseconds within the second.
        nanoseconds: i32,
    },
    /// Calendar-aware duration.
    Duration {
        /// Whole months.
        months: i64,
        /// Whole days, independent of months.
        days: i64,
        /// Whole seconds, independent of days.
        seconds: i64,
        /// Nanoseconds within the second.
        nanoseconds: i32,
    },
    /// Point in a 2D coordinate system.
    Point2D {
        /// Spatial reference identifier.
        srid: i64,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },
    /// Point in a 3D coordinate system.
    Point3D {
        /// Spatial reference identifier.
        srid: i64,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
        /// Z coordinate.
        z: f64,
    },
    /// A struct whose signature byte was not recognized at decode time.
    Unknown {
        /// The struct's signature byte.
        signature: u8,
        /// The struct's fields.
        fields: Vec<Value>,
    },
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodedValue, Value, ValueMap};

    #[test]
    fn value_map_rejects_duplicate_keys() {
        let mut map = ValueMap::new();
        map.insert("a".to_owned(), Value::Integer(1)).unwrap();
        let err = map.insert("a".to_owned(), Value::Integer(2)).unwrap_err();
        assert_eq!(map.get("a"), Some(&Value::Integer(1)));
        assert_eq!(err.to_string(), "duplicate key in map");
    }

    #[test]
    fn decoded_value_to_owned_value_round_trips_scalars() {
        let decoded = DecodedValue::String("hi");
        assert_eq!(decoded.to_owned_value(), Value::String("hi".to_owned()));
    }

    #[test]
    fn nan_is_never_equal_even_to_itself() {
        let a = DecodedValue::Float(f64::NAN);
        let b = DecodedValue::Float(f64::NAN);
        assert_ne!(a, b);
    }
}
