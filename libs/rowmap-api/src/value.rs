use std::borrow::Cow;
use std::fmt;

use base64::Engine as _;
use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

/// Raw column value as handed out by a row source.
///
/// Borrowed variants live as long as the row they were read from; the engine
/// never holds one across `next_row`.
///
/// Strategy by type:
/// - Scalars (Int64, UInt64, Float, Bool): eager, cost ~0
/// - Decimal: `(unscaled, scale)`, no float rounding on the way in
/// - Temporal: fixed epoch-relative integers, UTC
/// - String, Bytes: `Cow` (zero-copy when the source allows it)
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    /// `(value, scale)`: `12345, 2` is `123.45`.
    Decimal(i128, u8),
    /// Microseconds since the Unix epoch, UTC.
    Timestamp(i64),
    /// Days since the Unix epoch.
    Date(i32),
    /// Microseconds since midnight.
    Time(i64),
    String(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
}

impl<'a> Value<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Variant name, used in coercion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int64(_) => "Int64",
            Value::UInt64(_) => "UInt64",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::Decimal(..) => "Decimal",
            Value::Timestamp(_) => "Timestamp",
            Value::Date(_) => "Date",
            Value::Time(_) => "Time",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
        }
    }

    /// Re-borrow without cloning string or byte payloads.
    pub fn as_borrowed(&self) -> Value<'_> {
        match self {
            Value::String(s) => Value::String(Cow::Borrowed(s.as_ref())),
            Value::Bytes(b) => Value::Bytes(Cow::Borrowed(b.as_ref())),
            Value::Null => Value::Null,
            Value::Bool(v) => Value::Bool(*v),
            Value::Int64(v) => Value::Int64(*v),
            Value::UInt64(v) => Value::UInt64(*v),
            Value::Float32(v) => Value::Float32(*v),
            Value::Float64(v) => Value::Float64(*v),
            Value::Decimal(v, s) => Value::Decimal(*v, *s),
            Value::Timestamp(v) => Value::Timestamp(*v),
            Value::Date(v) => Value::Date(*v),
            Value::Time(v) => Value::Time(*v),
        }
    }

    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::String(s) => Value::String(Cow::Owned(s.into_owned())),
            Value::Bytes(b) => Value::Bytes(Cow::Owned(b.into_owned())),
            Value::Null => Value::Null,
            Value::Bool(v) => Value::Bool(v),
            Value::Int64(v) => Value::Int64(v),
            Value::UInt64(v) => Value::UInt64(v),
            Value::Float32(v) => Value::Float32(v),
            Value::Float64(v) => Value::Float64(v),
            Value::Decimal(v, s) => Value::Decimal(v, s),
            Value::Timestamp(v) => Value::Timestamp(v),
            Value::Date(v) => Value::Date(v),
            Value::Time(v) => Value::Time(v),
        }
    }

    pub fn text(s: impl Into<Cow<'a, str>>) -> Self {
        Value::String(s.into())
    }
}

impl Value<'static> {
    /// Map a JSON scalar onto a value. Arrays and objects have no column
    /// representation and come back as `None`.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int64(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Value::UInt64(u))
                } else {
                    n.as_f64().map(Value::Float64)
                }
            }
            serde_json::Value::String(s) => Some(Value::String(Cow::Owned(s.clone()))),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Temporal helpers shared with coercion
// ---------------------------------------------------------------------------

pub(crate) fn timestamp_to_datetime(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros)
}

pub(crate) fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_CE_DAYS)?)
}

pub(crate) fn micros_to_time(micros: i64) -> Option<NaiveTime> {
    if micros < 0 {
        return None;
    }
    let secs = u32::try_from(micros / 1_000_000).ok()?;
    let nanos = u32::try_from((micros % 1_000_000) * 1_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

pub(crate) fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_CE_DAYS
}

pub(crate) fn datetime_to_micros(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_micros()
}

fn write_decimal(f: &mut fmt::Formatter<'_>, value: i128, scale: u8) -> fmt::Result {
    if scale == 0 {
        return write!(f, "{value}");
    }
    let digits = value.unsigned_abs().to_string();
    let scale = usize::from(scale);
    let sign = if value < 0 { "-" } else { "" };
    if digits.len() > scale {
        let (int, frac) = digits.split_at(digits.len() - scale);
        write!(f, "{sign}{int}.{frac}")
    } else {
        write!(f, "{sign}0.{digits:0>scale$}")
    }
}

/// Text rendering used by the scalar collector and `String` coercion.
///
/// Null renders as the empty string; temporal values as ISO 8601; bytes as
/// standard base64.
impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Decimal(v, scale) => write_decimal(f, *v, *scale),
            Value::Timestamp(us) => match timestamp_to_datetime(*us) {
                Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                None => write!(f, "{us}"),
            },
            Value::Date(days) => match days_to_date(*days) {
                Some(d) => write!(f, "{}", d.format("%Y-%m-%d")),
                None => write!(f, "{days}"),
            },
            Value::Time(us) => match micros_to_time(*us) {
                Some(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
                None => write!(f, "{us}"),
            },
            Value::String(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&base64::engine::general_purpose::STANDARD.encode(b)),
        }
    }
}
