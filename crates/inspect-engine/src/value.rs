//! Extracted field values and their canonical string form

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Type of a field as declared in a field table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Unsigned 64-bit integer
    Uint64,
    /// Boolean
    Bool,
    /// Text
    String,
    /// Relative time (duration)
    RelTime,
    /// Absolute time
    AbsTime,
    /// IPv4 or IPv6 address
    IpAddr,
}

/// A typed value produced by an extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Unsigned integer
    U64(u64),
    /// Boolean
    Bool(bool),
    /// Text
    String(String),
    /// Relative time
    RelTime(Duration),
    /// Absolute time, nanoseconds since the Unix epoch
    AbsTime(u64),
    /// IP address
    IpAddr(IpAddr),
    /// Several values for one field
    List(Vec<FieldValue>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::U64(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::RelTime(d) => write!(f, "{}", d.as_nanos()),
            FieldValue::AbsTime(ns) => {
                let secs = (*ns / 1_000_000_000) as i64;
                let nanos = (*ns % 1_000_000_000) as u32;
                match DateTime::<Utc>::from_timestamp(secs, nanos) {
                    Some(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::Nanos, true)),
                    None => write!(f, "{}", ns),
                }
            }
            FieldValue::IpAddr(addr) => write!(f, "{}", addr),
            FieldValue::List(values) => {
                f.write_str("(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Byte range inside the raw event data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    /// Byte offset of the first byte
    pub start: u32,
    /// Number of bytes
    pub length: u32,
}

impl Offset {
    /// Create an offset from a start position and a length
    ///
    /// Positions beyond `u32::MAX` saturate.
    pub fn new(start: usize, length: usize) -> Self {
        Self {
            start: u32::try_from(start).unwrap_or(u32::MAX),
            length: u32::try_from(length).unwrap_or(u32::MAX),
        }
    }
}

/// One raw value returned by an extraction pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedValue {
    /// The value
    pub value: FieldValue,
    /// Where it came from in the event data, if known
    pub offset: Option<Offset>,
}

impl ExtractedValue {
    /// A value with no location information
    pub fn new(value: FieldValue) -> Self {
        Self {
            value,
            offset: None,
        }
    }

    /// A value located at `start..start + length` in the event data
    pub fn at(value: FieldValue, start: usize, length: usize) -> Self {
        Self {
            value,
            offset: Some(Offset::new(start, length)),
        }
    }
}

/// Render a set of extracted values the way a single field is printed
///
/// Returns `None` when there are no values.
pub fn render_values(values: &[ExtractedValue]) -> Option<String> {
    match values {
        [] => None,
        [single] => Some(single.value.to_string()),
        many => Some(
            FieldValue::List(many.iter().map(|v| v.value.clone()).collect()).to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(FieldValue::U64(42).to_string(), "42");
        assert_eq!(FieldValue::Bool(false).to_string(), "false");
        assert_eq!(FieldValue::String("abc".into()).to_string(), "abc");
        assert_eq!(
            FieldValue::RelTime(Duration::from_micros(3)).to_string(),
            "3000"
        );
        assert_eq!(
            FieldValue::IpAddr(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))).to_string(),
            "10.0.0.1"
        );
    }

    #[test]
    fn test_abstime_rendering() {
        let ts = 1_700_000_000_123_456_789;
        assert_eq!(
            FieldValue::AbsTime(ts).to_string(),
            "2023-11-14T22:13:20.123456789Z"
        );
    }

    #[test]
    fn test_offset_saturates() {
        assert_eq!(Offset::new(3, 4), Offset { start: 3, length: 4 });
        let huge = u32::MAX as usize + 10;
        assert_eq!(
            Offset::new(huge, 1),
            Offset {
                start: u32::MAX,
                length: 1
            }
        );
        assert_eq!(Offset::new(0, huge).length, u32::MAX);
    }

    #[test]
    fn test_list_rendering() {
        let values = vec![
            ExtractedValue::new(FieldValue::U64(1)),
            ExtractedValue::new(FieldValue::String("two".into())),
        ];
        assert_eq!(render_values(&values).as_deref(), Some("(1,two)"));
        assert_eq!(render_values(&values[..1]).as_deref(), Some("1"));
        assert_eq!(render_values(&[]), None);
    }
}
