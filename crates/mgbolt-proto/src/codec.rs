//! Encoding owned [`Value`]s and decoding [`DecodedValue`]s to/from the wire.
//!
//! Encoding always picks the smallest marker that represents a given value
//! (tiny-size containers and tiny integers before falling back to 8/16/32-bit
//! sized forms), matching the upstream client's minimal-encoding behavior.
//! Decoding allocates every string, list, map, and struct field out of the
//! [`Arena`] supplied by the caller rather than the global heap.

use bytes::{Buf, BufMut};

use crate::arena::Arena;
use crate::errors::{ProtocolError, Result};
use crate::marker;
use crate::value::{
    DecodedNode, DecodedPath, DecodedRelationship, DecodedUnboundRelationship, DecodedValue,
    Value, ValueMap,
};

/// Encodes `value` onto `dst` using the minimal marker that represents it.
///
/// # Errors
///
/// Returns [`ProtocolError::SizeOutOfRange`] if a string, list, map, or
/// struct is too large to be size-prefixed by the protocol's 32-bit length
/// fields. Returns [`ProtocolError::InvalidValueKind`] for a value kind the
/// server only ever sends and never accepts as input: `Node`, `Relationship`,
/// `UnboundRelationship`, `Path`, `Time`, `DateTime`, `DateTimeZoneId`,
/// `Point2D`, and `Point3D`.
pub fn encode_value(value: &Value, dst: &mut impl BufMut) -> Result<()> {
    match value {
        Value::Null => dst.put_u8(marker::NULL),
        Value::Bool(false) => dst.put_u8(marker::FALSE),
        Value::Bool(true) => dst.put_u8(marker::TRUE),
        Value::Integer(i) => encode_integer(*i, dst),
        Value::Float(f) => {
            dst.put_u8(marker::FLOAT64);
            dst.put_f64(*f);
        }
        Value::String(s) => encode_string(s, dst)?,
        Value::List(items) => {
            encode_container_header(
                items.len(),
                marker::TINY_LIST_LO,
                marker::TINY_LIST_HI,
                marker::LIST_8,
                marker::LIST_16,
                marker::LIST_32,
                "list",
                dst,
            )?;
            for item in items {
                encode_value(item, dst)?;
            }
        }
        Value::Map(map) => encode_map(map, dst)?,
        Value::Node(_) => return Err(ProtocolError::InvalidValueKind { kind: "Node" }),
        Value::Relationship(_) => {
            return Err(ProtocolError::InvalidValueKind {
                kind: "Relationship",
            });
        }
        Value::UnboundRelationship(_) => {
            return Err(ProtocolError::InvalidValueKind {
                kind: "UnboundRelationship",
            });
        }
        Value::Path(_) => return Err(ProtocolError::InvalidValueKind { kind: "Path" }),
        Value::Date { days } => {
            encode_struct_header(1, marker::signature::DATE, dst)?;
            encode_value(&Value::Integer(*days), dst)?;
        }
        Value::Time { .. } => return Err(ProtocolError::InvalidValueKind { kind: "Time" }),
        Value::LocalTime { nanoseconds } => {
            encode_struct_header(1, marker::signature::LOCAL_TIME, dst)?;
            encode_value(&Value::Integer(*nanoseconds), dst)?;
        }
        Value::DateTime { .. } => {
            return Err(ProtocolError::InvalidValueKind { kind: "DateTime" });
        }
        Value::DateTimeZoneId { .. } => {
            return Err(ProtocolError::InvalidValueKind {
                kind: "DateTimeZoneId",
            });
        }
        Value::LocalDateTime {
            seconds,
            nanoseconds,
        } => {
            encode_struct_header(2, marker::signature::LOCAL_DATE_TIME, dst)?;
            encode_value(&Value::Integer(*seconds), dst)?;
            encode_value(&Value::Integer(i64::from(*nanoseconds)), dst)?;
        }
        Value::Duration {
            months,
            days,
            seconds,
            nanoseconds,
        } => {
            encode_struct_header(4, marker::signature::DURATION, dst)?;
            encode_value(&Value::Integer(*months), dst)?;
            encode_value(&Value::Integer(*days), dst)?;
            encode_value(&Value::Integer(*seconds), dst)?;
            encode_value(&Value::Integer(i64::from(*nanoseconds)), dst)?;
        }
        Value::Point2D { .. } => {
            return Err(ProtocolError::InvalidValueKind { kind: "Point2D" });
        }
        Value::Point3D { .. } => {
            return Err(ProtocolError::InvalidValueKind { kind: "Point3D" });
        }
        Value::Unknown { signature, fields } => {
            encode_struct_header(fields.len(), *signature, dst)?;
            for field in fields {
                encode_value(field, dst)?;
            }
        }
    }
    Ok(())
}

fn encode_integer(i: i64, dst: &mut impl BufMut) {
    if (marker::TINY_INT_MIN..=marker::TINY_INT_MAX).contains(&i) {
        dst.put_i8(i as i8);
    } else if let Ok(i8v) = i8::try_from(i) {
        dst.put_u8(marker::INT8);
        dst.put_i8(i8v);
    } else if let Ok(i16v) = i16::try_from(i) {
        dst.put_u8(marker::INT16);
        dst.put_i16(i16v);
    } else if let Ok(i32v) = i32::try_from(i) {
        dst.put_u8(marker::INT32);
        dst.put_i32(i32v);
    } else {
        dst.put_u8(marker::INT64);
        dst.put_i64(i);
    }
}

fn encode_string(s: &str, dst: &mut impl BufMut) -> Result<()> {
    let bytes = s.as_bytes();
    encode_container_header(
        bytes.len(),
        marker::TINY_STRING_LO,
        marker::TINY_STRING_HI,
        marker::STRING_8,
        marker::STRING_16,
        marker::STRING_32,
        "string",
        dst,
    )?;
    dst.put_slice(bytes);
    Ok(())
}

fn encode_map(map: &ValueMap, dst: &mut impl BufMut) -> Result<()> {
    encode_container_header(
        map.len(),
        marker::TINY_MAP_LO,
        marker::TINY_MAP_HI,
        marker::MAP_8,
        marker::MAP_16,
        marker::MAP_32,
        "map",
        dst,
    )?;
    for (k, v) in map.iter() {
        encode_string(k, dst)?;
        encode_value(v, dst)?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn encode_container_header(
    len: usize,
    tiny_lo: u8,
    tiny_hi: u8,
    sized_8: u8,
    sized_16: u8,
    sized_32: u8,
    context: &'static str,
    dst: &mut impl BufMut,
) -> Result<()> {
    let tiny_span = usize::from(tiny_hi - tiny_lo);
    if len <= tiny_span {
        dst.put_u8(tiny_lo + len as u8);
    } else if let Ok(n) = u8::try_from(len) {
        dst.put_u8(sized_8);
        dst.put_u8(n);
    } else if let Ok(n) = u16::try_from(len) {
        dst.put_u8(sized_16);
        dst.put_u16(n);
    } else if let Ok(n) = u32::try_from(len) {
        dst.put_u8(sized_32);
        dst.put_u32(n);
    } else {
        return Err(ProtocolError::SizeOutOfRange {
            size: len as u64,
            context,
        });
    }
    Ok(())
}

fn encode_struct_header(field_count: usize, signature: u8, dst: &mut impl BufMut) -> Result<()> {
    if field_count <= usize::from(marker::TINY_STRUCT_HI - marker::TINY_STRUCT_LO) {
        dst.put_u8(marker::TINY_STRUCT_LO + field_count as u8);
    } else if let Ok(n) = u8::try_from(field_count) {
        dst.put_u8(marker::STRUCT_8);
        dst.put_u8(n);
    } else if let Ok(n) = u16::try_from(field_count) {
        dst.put_u8(marker::STRUCT_16);
        dst.put_u16(n);
    } else {
        return Err(ProtocolError::SizeOutOfRange {
            size: field_count as u64,
            context: "struct",
        });
    }
    dst.put_u8(signature);
    Ok(())
}

/// Decodes one value from `src`, allocating backing storage for strings,
/// lists, maps, and struct fields out of `arena`.
///
/// # Errors
///
/// Returns a [`ProtocolError`] if `src` is exhausted before a full value is
/// read, a marker or struct signature is unrecognized, a string is not
/// valid UTF-8, or a struct's field count does not match its signature.
pub fn decode_value<'a>(src: &mut impl Buf, arena: &'a Arena) -> Result<DecodedValue<'a>> {
    let marker = read_u8(src, "marker")?;
    decode_from_marker(marker, src, arena)
}

#[allow(clippy::too_many_lines)]
fn decode_from_marker<'a>(
    marker: u8,
    src: &mut impl Buf,
    arena: &'a Arena,
) -> Result<DecodedValue<'a>> {
    match marker {
        0x00..=0x7F => Ok(DecodedValue::Integer(i64::from(marker as i8))),
        0xF0..=0xFF => Ok(DecodedValue::Integer(i64::from(marker as i8))),
        marker::NULL => Ok(DecodedValue::Null),
        marker::FALSE => Ok(DecodedValue::Bool(false)),
        marker::TRUE => Ok(DecodedValue::Bool(true)),
        marker::FLOAT64 => Ok(DecodedValue::Float(read_f64(src)?)),
        marker::INT8 => Ok(DecodedValue::Integer(i64::from(read_i8(src)?))),
        marker::INT16 => Ok(DecodedValue::Integer(i64::from(read_i16(src)?))),
        marker::INT32 => Ok(DecodedValue::Integer(i64::from(read_i32(src)?))),
        marker::INT64 => Ok(DecodedValue::Integer(read_i64(src)?)),
        marker::TINY_STRING_LO..=marker::TINY_STRING_HI => {
            decode_string(usize::from(marker - marker::TINY_STRING_LO), src, arena)
        }
        marker::STRING_8 => {
            let n = usize::from(read_u8(src, "string length")?);
            decode_string(n, src, arena)
        }
        marker::STRING_16 => {
            let n = usize::from(read_u16(src, "string length")?);
            decode_string(n, src, arena)
        }
        marker::STRING_32 => {
            let n = read_u32(src, "string length")? as usize;
            decode_string(n, src, arena)
        }
        marker::TINY_LIST_LO..=marker::TINY_LIST_HI => {
            decode_list(usize::from(marker - marker::TINY_LIST_LO), src, arena)
        }
        marker::LIST_8 => {
            let n = usize::from(read_u8(src, "list length")?);
            decode_list(n, src, arena)
        }
        marker::LIST_16 => {
            let n = usize::from(read_u16(src, "list length")?);
            decode_list(n, src, arena)
        }
        marker::LIST_32 => {
            let n = read_u32(src, "list length")? as usize;
            decode_list(n, src, arena)
        }
        marker::TINY_MAP_LO..=marker::TINY_MAP_HI => {
            decode_map(usize::from(marker - marker::TINY_MAP_LO), src, arena)
        }
        marker::MAP_8 => {
            let n = usize::from(read_u8(src, "map length")?);
            decode_map(n, src, arena)
        }
        marker::MAP_16 => {
            let n = usize::from(read_u16(src, "map length")?);
            decode_map(n, src, arena)
        }
        marker::MAP_32 => {
            let n = read_u32(src, "map length")? as usize;
            decode_map(n, src, arena)
        }
        marker::TINY_STRUCT_LO..=marker::TINY_STRUCT_HI => {
            let n = usize::from(marker - marker::TINY_STRUCT_LO);
            decode_struct(n, src, arena)
        }
        marker::STRUCT_8 => {
            let n = usize::from(read_u8(src, "struct field count")?);
            decode_struct(n, src, arena)
        }
        marker::STRUCT_16 => {
            let n = usize::from(read_u16(src, "struct field count")?);
            decode_struct(n, src, arena)
        }
        other => Err(ProtocolError::UnknownMarker { marker: other }),
    }
}

fn decode_string<'a>(len: usize, src: &mut impl Buf, arena: &'a Arena) -> Result<DecodedValue<'a>> {
    require_remaining(src, len, "string body")?;
    let mut bytes = vec![0_u8; len];
    src.copy_to_slice(&mut bytes);
    let s = core::str::from_utf8(&bytes)?;
    Ok(DecodedValue::String(arena.alloc_str(s)))
}

fn decode_list<'a>(len: usize, src: &mut impl Buf, arena: &'a Arena) -> Result<DecodedValue<'a>> {
    let mut items = arena.alloc_vec::<DecodedValue<'a>>(len);
    for _ in 0..len {
        items.push(decode_value(src, arena)?);
    }
    Ok(DecodedValue::List(items.into_bump_slice()))
}

fn decode_map<'a>(len: usize, src: &mut impl Buf, arena: &'a Arena) -> Result<DecodedValue<'a>> {
    let mut entries = arena.alloc_vec::<(&'a str, DecodedValue<'a>)>(len);
    for _ in 0..len {
        let key = decode_value(src, arena)?;
        let DecodedValue::String(key) = key else {
            return Err(ProtocolError::UnknownMarker { marker: 0 });
        };
        if entries.iter().any(|(k, _)| *k == key) {
            return Err(ProtocolError::DuplicateKey);
        }
        let value = decode_value(src, arena)?;
        entries.push((key, value));
    }
    Ok(DecodedValue::Map(entries.into_bump_slice()))
}

fn decode_struct<'a>(
    field_count: usize,
    src: &mut impl Buf,
    arena: &'a Arena,
) -> Result<DecodedValue<'a>> {
    let signature = read_u8(src, "struct signature")?;
    let expect = |expected: usize| -> Result<()> {
        if field_count == expected {
            Ok(())
        } else {
            Err(ProtocolError::FieldCountMismatch {
                signature,
                expected,
                actual: field_count,
            })
        }
    };
    match signature {
        marker::signature::NODE => {
            expect(3)?;
            let id = decode_integer_field(src, arena)?;
            let labels = decode_string_list(src, arena)?;
            let properties = decode_property_map(src, arena)?;
            Ok(DecodedValue::Node(DecodedNode {
                id,
                labels,
                properties,
            }))
        }
        marker::signature::RELATIONSHIP => {
            expect(5)?;
            let id = decode_integer_field(src, arena)?;
            let start_id = decode_integer_field(src, arena)?;
            let end_id = decode_integer_field(src, arena)?;
            let rel_type = decode_string_field(src, arena)?;
            let properties = decode_property_map(src, arena)?;
            Ok(DecodedValue::Relationship(DecodedRelationship {
                id,
                start_id,
                end_id,
                rel_type,
                properties,
            }))
        }
        marker::signature::UNBOUND_RELATIONSHIP => {
            expect(3)?;
            let id = decode_integer_field(src, arena)?;
            let rel_type = decode_string_field(src, arena)?;
            let properties = decode_property_map(src, arena)?;
            Ok(DecodedValue::UnboundRelationship(
                DecodedUnboundRelationship {
                    id,
                    rel_type,
                    properties,
                },
            ))
        }
        marker::signature::PATH => {
            expect(3)?;
            let nodes_val = decode_value(src, arena)?;
            let DecodedValue::List(node_vals) = nodes_val else {
                return Err(ProtocolError::UnknownSignature { signature });
            };
            let mut nodes = arena.alloc_vec::<DecodedNode<'a>>(node_vals.len());
            for v in node_vals {
                let DecodedValue::Node(n) = v else {
                    return Err(ProtocolError::UnknownSignature { signature });
                };
                nodes.push(*n);
            }
            let rels_val = decode_value(src, arena)?;
            let DecodedValue::List(rel_vals) = rels_val else {
                return Err(ProtocolError::UnknownSignature { signature });
            };
            let mut relationships = arena.alloc_vec::<DecodedUnboundRelationship<'a>>(rel_vals.len());
            for v in rel_vals {
                let DecodedValue::UnboundRelationship(r) = v else {
                    return Err(ProtocolError::UnknownSignature { signature });
                };
                relationships.push(*r);
            }
            let seq_val = decode_value(src, arena)?;
            let DecodedValue::List(seq_vals) = seq_val else {
                return Err(ProtocolError::UnknownSignature { signature });
            };
            let mut sequence = arena.alloc_vec::<i64>(seq_vals.len());
            for v in seq_vals {
                let DecodedValue::Integer(i) = v else {
                    return Err(ProtocolError::UnknownSignature { signature });
                };
                sequence.push(*i);
            }
            Ok(DecodedValue::Path(DecodedPath {
                nodes: nodes.into_bump_slice(),
                relationships: relationships.into_bump_slice(),
                sequence: sequence.into_bump_slice(),
            }))
        }
        marker::signature::DATE => {
            expect(1)?;
            Ok(DecodedValue::Date {
                days: decode_integer_field(src, arena)?,
            })
        }
        marker::signature::TIME => {
            expect(2)?;
            let nanoseconds = decode_integer_field(src, arena)?;
            let tz_offset_seconds = decode_integer_field(src, arena)? as i32;
            Ok(DecodedValue::Time {
                nanoseconds,
                tz_offset_seconds,
            })
        }
        marker::signature::LOCAL_TIME => {
            expect(1)?;
            Ok(DecodedValue::LocalTime {
                nanoseconds: decode_integer_field(src, arena)?,
            })
        }
        marker::signature::DATE_TIME => {
            expect(3)?;
            let seconds = decode_integer_field(src, arena)?;
            let nanoseconds = decode_integer_field(src, arena)? as i32;
            let tz_offset_minutes = decode_integer_field(src, arena)? as i32;
            Ok(DecodedValue::DateTime {
                seconds,
                nanoseconds,
                tz_offset_minutes,
            })
        }
        marker::signature::DATE_TIME_ZONE_ID => {
            expect(3)?;
            let seconds = decode_integer_field(src, arena)?;
            let nanoseconds = decode_integer_field(src, arena)? as i32;
            let tz_id = decode_string_field(src, arena)?;
            Ok(DecodedValue::DateTimeZoneId {
                seconds,
                nanoseconds,
                tz_id,
            })
        }
        marker::signature::LOCAL_DATE_TIME => {
            expect(2)?;
            let seconds = decode_integer_field(src, arena)?;
            let nanoseconds = decode_integer_field(src, arena)? as i32;
            Ok(DecodedValue::LocalDateTime {
                seconds,
                nanoseconds,
            })
        }
        marker::signature::DURATION => {
            expect(4)?;
            let months = decode_integer_field(src, arena)?;
            let days = decode_integer_field(src, arena)?;
            let seconds = decode_integer_field(src, arena)?;
            let nanoseconds = decode_integer_field(src, arena)? as i32;
            Ok(DecodedValue::Duration {
                months,
                days,
                seconds,
                nanoseconds,
            })
        }
        marker::signature::POINT_2D => {
            expect(3)?;
            let srid = decode_integer_field(src, arena)?;
            let x = decode_float_field(src, arena)?;
            let y = decode_float_field(src, arena)?;
            Ok(DecodedValue::Point2D { srid, x, y })
        }
        marker::signature::POINT_3D => {
            expect(4)?;
            let srid = decode_integer_field(src, arena)?;
            let x = decode_float_field(src, arena)?;
            let y = decode_float_field(src, arena)?;
            let z = decode_float_field(src, arena)?;
            Ok(DecodedValue::Point3D { srid, x, y, z })
        }
        other => {
            let mut fields = arena.alloc_vec::<DecodedValue<'a>>(field_count);
            for _ in 0..field_count {
                fields.push(decode_value(src, arena)?);
            }
            Ok(DecodedValue::Unknown {
                signature: other,
                fields: fields.into_bump_slice(),
            })
        }
    }
}

fn decode_integer_field(src: &mut impl Buf, arena: &Arena) -> Result<i64> {
    match decode_value(src, arena)? {
        DecodedValue::Integer(i) => Ok(i),
        _ => Err(ProtocolError::UnknownMarker { marker: 0 }),
    }
}

fn decode_float_field(src: &mut impl Buf, arena: &Arena) -> Result<f64> {
    match decode_value(src, arena)? {
        DecodedValue::Float(f) => Ok(f),
        DecodedValue::Integer(i) => Ok(i as f64),
        _ => Err(ProtocolError::UnknownMarker { marker: 0 }),
    }
}

fn decode_string_field<'a>(src: &mut impl Buf, arena: &'a Arena) -> Result<&'a str> {
    match decode_value(src, arena)? {
        DecodedValue::String(s) => Ok(s),
        _ => Err(ProtocolError::UnknownMarker { marker: 0 }),
    }
}

fn decode_string_list<'a>(src: &mut impl Buf, arena: &'a Arena) -> Result<&'a [&'a str]> {
    match decode_value(src, arena)? {
        DecodedValue::List(items) => {
            let mut out = arena.alloc_vec::<&'a str>(items.len());
            for item in items {
                let DecodedValue::String(s) = item else {
                    return Err(ProtocolError::UnknownMarker { marker: 0 });
                };
                out.push(s);
            }
            Ok(out.into_bump_slice())
        }
        _ => Err(ProtocolError::UnknownMarker { marker: 0 }),
    }
}

fn decode_property_map<'a>(
    src: &mut impl Buf,
    arena: &'a Arena,
) -> Result<&'a [(&'a str, DecodedValue<'a>)]> {
    match decode_value(src, arena)? {
        DecodedValue::Map(entries) => Ok(entries),
        _ => Err(ProtocolError::UnknownMarker { marker: 0 }),
    }
}

fn require_remaining(src: &impl Buf, needed: usize, context: &'static str) -> Result<()> {
    if src.remaining() < needed {
        return Err(ProtocolError::UnexpectedEof { context });
    }
    Ok(())
}

fn read_u8(src: &mut impl Buf, context: &'static str) -> Result<u8> {
    require_remaining(src, 1, context)?;
    Ok(src.get_u8())
}

fn read_i8(src: &mut impl Buf) -> Result<i8> {
    require_remaining(src, 1, "int8 body")?;
    Ok(src.get_i8())
}

fn read_u16(src: &mut impl Buf, context: &'static str) -> Result<u16> {
    require_remaining(src, 2, context)?;
    Ok(src.get_u16())
}

fn read_i16(src: &mut impl Buf) -> Result<i16> {
    require_remaining(src, 2, "int16 body")?;
    Ok(src.get_i16())
}

fn read_u32(src: &mut impl Buf, context: &'static str) -> Result<u32> {
    require_remaining(src, 4, context)?;
    Ok(src.get_u32())
}

fn read_i32(src: &mut impl Buf) -> Result<i32> {
    require_remaining(src, 4, "int32 body")?;
    Ok(src.get_i32())
}

fn read_i64(src: &mut impl Buf) -> Result<i64> {
    require_remaining(src, 8, "int64 body")?;
    Ok(src.get_i64())
}

fn read_f64(src: &mut impl Buf) -> Result<f64> {
    require_remaining(src, 8, "float body")?;
    Ok(src.get_f64())
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::{decode_value, encode_value};
    use crate::arena::Arena;
    use crate::value::{Value, ValueMap};

    fn round_trip(value: &Value) -> Value {
        let mut buf = BytesMut::new();
        encode_value(value, &mut buf).unwrap();
        let arena = Arena::new();
        let mut src = buf.freeze();
        let decoded = decode_value(&mut src, &arena).unwrap();
        decoded.to_owned_value()
    }

    #[test]
    fn round_trips_tiny_int() {
        assert_eq!(round_trip(&Value::Integer(42)), Value::Integer(42));
    }

    #[test]
    fn round_trips_negative_tiny_int() {
        assert_eq!(round_trip(&Value::Integer(-10)), Value::Integer(-10));
    }

    #[test]
    fn round_trips_string() {
        let v = Value::String("hello, graph".to_owned());
        assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn round_trips_nested_list_and_map() {
        let mut map = ValueMap::new();
        map.insert("a".to_owned(), Value::Integer(1)).unwrap();
        map.insert(
            "b".to_owned(),
            Value::List(vec![Value::Bool(true), Value::Null]),
        )
        .unwrap();
        let v = Value::Map(map);
        assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn round_trips_date_local_time_local_date_time_and_duration() {
        let values = [
            Value::Date { days: 19_000 },
            Value::LocalTime { nanoseconds: 123 },
            Value::LocalDateTime {
                seconds: 1,
                nanoseconds: 2,
            },
            Value::Duration {
                months: 1,
                days: 2,
                seconds: 3,
                nanoseconds: 4,
            },
        ];
        for v in values {
            assert_eq!(round_trip(&v), v);
        }
    }

    #[test]
    fn rejects_encoding_server_only_value_kinds() {
        let rejected = [
            Value::Time {
                nanoseconds: 0,
                tz_offset_seconds: 0,
            },
            Value::DateTime {
                seconds: 0,
                nanoseconds: 0,
                tz_offset_minutes: 0,
            },
            Value::DateTimeZoneId {
                seconds: 0,
                nanoseconds: 0,
                tz_id: "UTC".to_owned(),
            },
            Value::Point2D {
                srid: 0,
                x: 0.0,
                y: 0.0,
            },
            Value::Point3D {
                srid: 0,
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
        ];
        for v in rejected {
            let mut buf = BytesMut::new();
            assert!(matches!(
                encode_value(&v, &mut buf),
                Err(crate::errors::ProtocolError::InvalidValueKind { .. })
            ));
        }
    }

    proptest! {
        #[test]
        fn round_trips_arbitrary_integer(i in any::<i64>()) {
            prop_assert_eq!(round_trip(&Value::Integer(i)), Value::Integer(i));
        }

        #[test]
        fn round_trips_arbitrary_string(s in ".*") {
            prop_assert_eq!(round_trip(&Value::String(s.clone())), Value::String(s));
        }

        #[test]
        fn encodes_small_ints_as_a_single_byte(i in -16_i64..=127) {
            let mut buf = BytesMut::new();
            encode_value(&Value::Integer(i), &mut buf).unwrap();
            prop_assert_eq!(buf.len(), 1);
        }
    }
}
