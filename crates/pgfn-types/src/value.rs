use std::fmt;

use crate::{Float8Array, Point, TimestampTz, Varlena, format_float8};

/// Type tags used in function signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DatumType {
    Bool,
    Int4,
    Int8,
    Float8,
    Text,
    Point,
    TimestampTz,
    Float8Array,
}

impl DatumType {
    /// The host's SQL name for this type.
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int4 => "integer",
            Self::Int8 => "bigint",
            Self::Float8 => "double precision",
            Self::Text => "text",
            Self::Point => "point",
            Self::TimestampTz => "timestamp with time zone",
            Self::Float8Array => "double precision[]",
        }
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A typed argument or result crossing the function-call boundary.
///
/// This replaces the host's opaque calling convention: adapters map host
/// arguments onto `Datum`s and results back. `Null` is a value, not an
/// error.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Datum {
    /// SQL NULL.
    Null,
    /// `boolean`.
    Bool(bool),
    /// `integer` (32-bit).
    Int4(i32),
    /// `bigint` (64-bit).
    Int8(i64),
    /// `double precision`.
    Float8(f64),
    /// `text`, as a varlena buffer.
    Text(Varlena),
    /// `point`.
    Point(Point),
    /// `timestamp with time zone`.
    TimestampTz(TimestampTz),
    /// `double precision[]`.
    Float8Array(Float8Array),
}

impl Datum {
    /// The type of this value, `None` for NULL.
    pub const fn datum_type(&self) -> Option<DatumType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(DatumType::Bool),
            Self::Int4(_) => Some(DatumType::Int4),
            Self::Int8(_) => Some(DatumType::Int8),
            Self::Float8(_) => Some(DatumType::Float8),
            Self::Text(_) => Some(DatumType::Text),
            Self::Point(_) => Some(DatumType::Point),
            Self::TimestampTz(_) => Some(DatumType::TimestampTz),
            Self::Float8Array(_) => Some(DatumType::Float8Array),
        }
    }

    /// Type name for diagnostics ("null" for NULL).
    pub const fn type_name(&self) -> &'static str {
        match self.datum_type() {
            Some(t) => t.sql_name(),
            None => "null",
        }
    }

    /// Returns true if this is a NULL value.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub const fn as_int4(&self) -> Option<i32> {
        match self {
            Self::Int4(i) => Some(*i),
            _ => None,
        }
    }

    pub const fn as_int8(&self) -> Option<i64> {
        match self {
            Self::Int8(i) => Some(*i),
            _ => None,
        }
    }

    pub const fn as_float8(&self) -> Option<f64> {
        match self {
            Self::Float8(f) => Some(*f),
            _ => None,
        }
    }

    pub const fn as_text(&self) -> Option<&Varlena> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_point(&self) -> Option<Point> {
        match self {
            Self::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub const fn as_timestamptz(&self) -> Option<TimestampTz> {
        match self {
            Self::TimestampTz(t) => Some(*t),
            _ => None,
        }
    }

    pub const fn as_float8_array(&self) -> Option<&Float8Array> {
        match self {
            Self::Float8Array(a) => Some(a),
            _ => None,
        }
    }

    /// The host's text output form of this value, `None` for NULL.
    ///
    /// This is what a query result hands back when a column is read as
    /// text: `t`/`f` for booleans, shortest round-trip digits for floats,
    /// the raw payload for text.
    pub fn to_text_output(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some((if *b { "t" } else { "f" }).to_owned()),
            Self::Int4(i) => Some(i.to_string()),
            Self::Int8(i) => Some(i.to_string()),
            Self::Float8(f) => Some(format_float8(*f)),
            Self::Text(v) => Some(v.to_text_lossy().into_owned()),
            Self::Point(p) => Some(p.to_string()),
            Self::TimestampTz(t) => Some(t.to_string()),
            Self::Float8Array(a) => Some(a.to_text_output()),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Text(v) => write!(f, "'{}'", v.to_text_lossy().replace('\'', "''")),
            other => f.write_str(&other.to_text_output().unwrap_or_default()),
        }
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Datum {
    fn from(i: i32) -> Self {
        Self::Int4(i)
    }
}

impl From<i64> for Datum {
    fn from(i: i64) -> Self {
        Self::Int8(i)
    }
}

impl From<f64> for Datum {
    fn from(f: f64) -> Self {
        Self::Float8(f)
    }
}

impl From<Varlena> for Datum {
    fn from(v: Varlena) -> Self {
        Self::Text(v)
    }
}

impl From<Point> for Datum {
    fn from(p: Point) -> Self {
        Self::Point(p)
    }
}

impl From<TimestampTz> for Datum {
    fn from(t: TimestampTz) -> Self {
        Self::TimestampTz(t)
    }
}

impl From<Float8Array> for Datum {
    fn from(a: Float8Array) -> Self {
        Self::Float8Array(a)
    }
}

impl<T: Into<Self>> From<Option<T>> for Datum {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn text(s: &str) -> Datum {
        Datum::Text(Varlena::from_text(s).unwrap())
    }

    #[test]
    fn null_properties() {
        let v = Datum::Null;
        assert!(v.is_null());
        assert_eq!(v.datum_type(), None);
        assert_eq!(v.type_name(), "null");
        assert_eq!(v.to_text_output(), None);
        assert_eq!(v.to_string(), "NULL");
    }

    #[test]
    fn typed_accessors() {
        assert_eq!(Datum::Int4(7).as_int4(), Some(7));
        assert_eq!(Datum::Int4(7).as_int8(), None);
        assert_eq!(Datum::Int8(-9).as_int8(), Some(-9));
        assert_eq!(Datum::Float8(1.5).as_float8(), Some(1.5));
        assert_eq!(Datum::Bool(true).as_bool(), Some(true));
        let t = text("abc");
        assert_eq!(t.as_text().map(Varlena::payload), Some(&b"abc"[..]));
        assert_eq!(
            Datum::Point(Point::new(1.0, 2.0)).as_point(),
            Some(Point::new(1.0, 2.0))
        );
        let arr = Datum::Float8Array(Float8Array::from_slice(&[1.0]));
        assert!(arr.as_float8_array().is_some());
    }

    #[test]
    fn type_names() {
        assert_eq!(Datum::Int4(1).type_name(), "integer");
        assert_eq!(Datum::Int8(1).type_name(), "bigint");
        assert_eq!(text("x").type_name(), "text");
        assert_eq!(
            Datum::Float8Array(Float8Array::empty()).type_name(),
            "double precision[]"
        );
        assert_eq!(
            DatumType::TimestampTz.to_string(),
            "timestamp with time zone"
        );
    }

    #[test]
    fn text_output() {
        assert_eq!(Datum::Bool(false).to_text_output().as_deref(), Some("f"));
        assert_eq!(Datum::Int8(42).to_text_output().as_deref(), Some("42"));
        assert_eq!(Datum::Float8(6.0).to_text_output().as_deref(), Some("6"));
        assert_eq!(Datum::Float8(0.1).to_text_output().as_deref(), Some("0.1"));
        assert_eq!(text("héllo").to_text_output().as_deref(), Some("héllo"));
        let arr = Datum::Float8Array(Float8Array::from_slice(&[1.0, 2.0]));
        assert_eq!(arr.to_text_output().as_deref(), Some("{1,2}"));
    }

    #[test]
    fn display_quotes_text() {
        assert_eq!(text("it's").to_string(), "'it''s'");
        assert_eq!(Datum::Int4(-3).to_string(), "-3");
    }

    #[test]
    fn from_conversions() {
        assert_eq!(Datum::from(1_i32), Datum::Int4(1));
        assert_eq!(Datum::from(1_i64), Datum::Int8(1));
        assert_eq!(Datum::from(true), Datum::Bool(true));
        assert_eq!(Datum::from(None::<i64>), Datum::Null);
        assert_eq!(Datum::from(Some(2.0_f64)), Datum::Float8(2.0));
    }

    #[test]
    fn serde_round_trip() {
        let values = vec![
            Datum::Null,
            Datum::Int4(1),
            text("abc"),
            Datum::Float8Array(Float8Array::new(vec![2, 1], vec![1.0, 2.0]).unwrap()),
            Datum::TimestampTz(TimestampTz::from_pg_micros(12)),
        ];
        let json = serde_json::to_string(&values).unwrap();
        let back: Vec<Datum> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
