use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::CoercionError;
use crate::value::{Value, days_to_date, micros_to_time, timestamp_to_datetime};

/// Declared type of an entity member, as seen by the coercer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Char,
    Text,
    Bytes,
    Date,
    Time,
    DateTime,
    Timestamp,
    /// User type with its own `Coerce` impl.
    Custom(&'static str),
    /// Nested entity or any other type the coercer does not handle.
    /// Members of this type are never assigned.
    Composite(&'static str),
}

impl TargetType {
    pub const fn name(&self) -> &'static str {
        match self {
            TargetType::Bool => "bool",
            TargetType::I8 => "i8",
            TargetType::I16 => "i16",
            TargetType::I32 => "i32",
            TargetType::I64 => "i64",
            TargetType::Isize => "isize",
            TargetType::U8 => "u8",
            TargetType::U16 => "u16",
            TargetType::U32 => "u32",
            TargetType::U64 => "u64",
            TargetType::Usize => "usize",
            TargetType::F32 => "f32",
            TargetType::F64 => "f64",
            TargetType::Char => "char",
            TargetType::Text => "String",
            TargetType::Bytes => "Vec<u8>",
            TargetType::Date => "NaiveDate",
            TargetType::Time => "NaiveTime",
            TargetType::DateTime => "NaiveDateTime",
            TargetType::Timestamp => "DateTime<Utc>",
            TargetType::Custom(name) | TargetType::Composite(name) => *name,
        }
    }

    pub const fn is_composite(&self) -> bool {
        matches!(self, TargetType::Composite(_))
    }
}

fn default_date_formats() -> Vec<String> {
    ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"].map(String::from).to_vec()
}

fn default_datetime_formats() -> Vec<String> {
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y/%m/%d %H:%M:%S"]
        .map(String::from)
        .to_vec()
}

fn default_time_formats() -> Vec<String> {
    ["%H:%M:%S%.f", "%H:%M"].map(String::from).to_vec()
}

/// Text formats tried, in order, when a `String` value targets a temporal
/// member. Formats use `chrono::format::strftime` syntax.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct CoerceOptions {
    pub date_formats: Vec<String>,
    pub datetime_formats: Vec<String>,
    pub time_formats: Vec<String>,
}

impl Default for CoerceOptions {
    fn default() -> Self {
        Self {
            date_formats: default_date_formats(),
            datetime_formats: default_datetime_formats(),
            time_formats: default_time_formats(),
        }
    }
}

/// Conversion from a raw column value into a member's declared type.
///
/// `#[derive(Entity)]` calls this for every scalar member. `Option<T>`
/// unwraps to `T`; nulls never reach `coerce` because the materializer skips
/// them.
pub trait Coerce: Sized {
    const TARGET: TargetType;
    const NULLABLE: bool = false;

    fn coerce(value: &Value<'_>, opts: &CoerceOptions) -> Result<Self, CoercionError>;
}

fn mismatch(value: &Value<'_>, to: TargetType) -> CoercionError {
    CoercionError::new(value.kind(), to.name())
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Round half to even, the way integral conversions of fractional values
/// behave in most database drivers.
fn float_to_integer(v: f64) -> Option<i128> {
    if !v.is_finite() {
        return None;
    }
    let rounded = v.round_ties_even();
    if rounded.abs() >= 1.0e38 {
        return None;
    }
    Some(rounded as i128)
}

fn decimal_to_integer(value: i128, scale: u8) -> i128 {
    let Some(div) = 10i128.checked_pow(u32::from(scale)) else {
        return 0;
    };
    let quotient = value / div;
    let twice_rem = (value % div).unsigned_abs() * 2;
    let div = div.unsigned_abs();
    if twice_rem > div || (twice_rem == div && quotient % 2 != 0) {
        quotient + value.signum()
    } else {
        quotient
    }
}

fn to_integer(value: &Value<'_>, to: TargetType) -> Result<i128, CoercionError> {
    match value {
        Value::Bool(b) => Ok(i128::from(*b)),
        Value::Int64(v) => Ok(i128::from(*v)),
        Value::UInt64(v) => Ok(i128::from(*v)),
        Value::Float32(v) => float_to_integer(f64::from(*v))
            .ok_or_else(|| mismatch(value, to).with_detail(format_args!("{v} is not representable"))),
        Value::Float64(v) => float_to_integer(*v)
            .ok_or_else(|| mismatch(value, to).with_detail(format_args!("{v} is not representable"))),
        Value::Decimal(v, scale) => Ok(decimal_to_integer(*v, *scale)),
        Value::String(s) => s.trim().parse::<i128>().map_err(|e| mismatch(value, to).with_detail(e)),
        _ => Err(mismatch(value, to)),
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $target:ident),* $(,)?) => {$(
        impl Coerce for $ty {
            const TARGET: TargetType = TargetType::$target;

            fn coerce(value: &Value<'_>, _opts: &CoerceOptions) -> Result<Self, CoercionError> {
                let wide = to_integer(value, Self::TARGET)?;
                <$ty>::try_from(wide).map_err(|_| {
                    mismatch(value, Self::TARGET).with_detail(format_args!("{wide} is out of range"))
                })
            }
        }
    )*};
}

impl_integer! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
}

fn to_float(value: &Value<'_>, to: TargetType) -> Result<f64, CoercionError> {
    match value {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Int64(v) => Ok(*v as f64),
        Value::UInt64(v) => Ok(*v as f64),
        Value::Float32(v) => Ok(f64::from(*v)),
        Value::Float64(v) => Ok(*v),
        Value::Decimal(v, scale) => Ok(*v as f64 / 10f64.powi(i32::from(*scale))),
        Value::String(s) => s.trim().parse::<f64>().map_err(|e| mismatch(value, to).with_detail(e)),
        _ => Err(mismatch(value, to)),
    }
}

impl Coerce for f64 {
    const TARGET: TargetType = TargetType::F64;

    fn coerce(value: &Value<'_>, _opts: &CoerceOptions) -> Result<Self, CoercionError> {
        to_float(value, Self::TARGET)
    }
}

impl Coerce for f32 {
    const TARGET: TargetType = TargetType::F32;

    fn coerce(value: &Value<'_>, _opts: &CoerceOptions) -> Result<Self, CoercionError> {
        match value {
            Value::Float32(v) => Ok(*v),
            Value::String(s) => s
                .trim()
                .parse::<f32>()
                .map_err(|e| mismatch(value, Self::TARGET).with_detail(e)),
            _ => to_float(value, Self::TARGET).map(|v| v as f32),
        }
    }
}

impl Coerce for bool {
    const TARGET: TargetType = TargetType::Bool;

    fn coerce(value: &Value<'_>, _opts: &CoerceOptions) -> Result<Self, CoercionError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int64(v) => Ok(*v != 0),
            Value::UInt64(v) => Ok(*v != 0),
            Value::Float32(v) => Ok(*v != 0.0),
            Value::Float64(v) => Ok(*v != 0.0),
            Value::Decimal(v, _) => Ok(*v != 0),
            Value::String(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(mismatch(value, Self::TARGET).with_detail(format_args!("{s:?} is not a boolean")))
                }
            }
            _ => Err(mismatch(value, Self::TARGET)),
        }
    }
}

// ---------------------------------------------------------------------------
// Text and binary
// ---------------------------------------------------------------------------

impl Coerce for String {
    const TARGET: TargetType = TargetType::Text;

    fn coerce(value: &Value<'_>, _opts: &CoerceOptions) -> Result<Self, CoercionError> {
        Ok(value.to_string())
    }
}

impl Coerce for char {
    const TARGET: TargetType = TargetType::Char;

    fn coerce(value: &Value<'_>, _opts: &CoerceOptions) -> Result<Self, CoercionError> {
        let code = match value {
            Value::String(s) => {
                let mut chars = s.chars();
                return match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(mismatch(value, Self::TARGET).with_detail("expected exactly one character")),
                };
            }
            Value::Int64(v) => u32::try_from(*v).ok(),
            Value::UInt64(v) => u32::try_from(*v).ok(),
            _ => return Err(mismatch(value, Self::TARGET)),
        };
        code.and_then(char::from_u32)
            .ok_or_else(|| mismatch(value, Self::TARGET).with_detail("not a unicode scalar value"))
    }
}

impl Coerce for Vec<u8> {
    const TARGET: TargetType = TargetType::Bytes;

    fn coerce(value: &Value<'_>, _opts: &CoerceOptions) -> Result<Self, CoercionError> {
        match value {
            Value::Bytes(b) => Ok(b.to_vec()),
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            _ => Err(mismatch(value, Self::TARGET)),
        }
    }
}

// ---------------------------------------------------------------------------
// Temporal
// ---------------------------------------------------------------------------

fn parse_date_only(s: &str, opts: &CoerceOptions) -> Option<NaiveDate> {
    opts.date_formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

fn parse_datetime(s: &str, opts: &CoerceOptions) -> Option<NaiveDateTime> {
    opts.datetime_formats
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| parse_date_only(s, opts).map(|d| d.and_time(NaiveTime::MIN)))
}

fn to_datetime(value: &Value<'_>, opts: &CoerceOptions, to: TargetType) -> Result<NaiveDateTime, CoercionError> {
    let parsed = match value {
        Value::Timestamp(us) => timestamp_to_datetime(*us).map(|dt| dt.naive_utc()),
        Value::Date(days) => days_to_date(*days).map(|d| d.and_time(NaiveTime::MIN)),
        Value::String(s) => parse_datetime(s.trim(), opts),
        _ => return Err(mismatch(value, to)),
    };
    parsed.ok_or_else(|| mismatch(value, to).with_detail("no matching datetime format or out of range"))
}

impl Coerce for NaiveDateTime {
    const TARGET: TargetType = TargetType::DateTime;

    fn coerce(value: &Value<'_>, opts: &CoerceOptions) -> Result<Self, CoercionError> {
        to_datetime(value, opts, Self::TARGET)
    }
}

impl Coerce for DateTime<Utc> {
    const TARGET: TargetType = TargetType::Timestamp;

    fn coerce(value: &Value<'_>, opts: &CoerceOptions) -> Result<Self, CoercionError> {
        to_datetime(value, opts, Self::TARGET).map(|dt| dt.and_utc())
    }
}

impl Coerce for NaiveDate {
    const TARGET: TargetType = TargetType::Date;

    fn coerce(value: &Value<'_>, opts: &CoerceOptions) -> Result<Self, CoercionError> {
        let parsed = match value {
            Value::Date(days) => days_to_date(*days),
            Value::Timestamp(us) => timestamp_to_datetime(*us).map(|dt| dt.date_naive()),
            Value::String(s) => {
                let s = s.trim();
                parse_date_only(s, opts).or_else(|| parse_datetime(s, opts).map(|dt| dt.date()))
            }
            _ => return Err(mismatch(value, Self::TARGET)),
        };
        parsed.ok_or_else(|| mismatch(value, Self::TARGET).with_detail("no matching date format or out of range"))
    }
}

impl Coerce for NaiveTime {
    const TARGET: TargetType = TargetType::Time;

    fn coerce(value: &Value<'_>, opts: &CoerceOptions) -> Result<Self, CoercionError> {
        let parsed = match value {
            Value::Time(us) => micros_to_time(*us),
            Value::Timestamp(us) => timestamp_to_datetime(*us).map(|dt| dt.time()),
            Value::String(s) => {
                let s = s.trim();
                opts.time_formats
                    .iter()
                    .find_map(|f| NaiveTime::parse_from_str(s, f).ok())
            }
            _ => return Err(mismatch(value, Self::TARGET)),
        };
        parsed.ok_or_else(|| mismatch(value, Self::TARGET).with_detail("no matching time format or out of range"))
    }
}

// ---------------------------------------------------------------------------
// Optional members
// ---------------------------------------------------------------------------

impl<T: Coerce> Coerce for Option<T> {
    const TARGET: TargetType = T::TARGET;
    const NULLABLE: bool = true;

    fn coerce(value: &Value<'_>, opts: &CoerceOptions) -> Result<Self, CoercionError> {
        if value.is_null() {
            return Ok(None);
        }
        T::coerce(value, opts).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{date_to_days, datetime_to_micros};

    fn coerce<T: Coerce>(value: Value<'_>) -> Result<T, CoercionError> {
        T::coerce(&value, &CoerceOptions::default())
    }

    #[test]
    fn integers_widen_and_narrow_with_range_checks() {
        assert_eq!(coerce::<i64>(Value::Int64(42)).unwrap(), 42);
        assert_eq!(coerce::<u8>(Value::UInt64(255)).unwrap(), 255);
        assert_eq!(coerce::<i16>(Value::Int64(-300)).unwrap(), -300);

        let err = coerce::<u8>(Value::Int64(256)).unwrap_err();
        assert_eq!((err.from, err.to), ("Int64", "u8"));
        assert!(coerce::<u32>(Value::Int64(-1)).is_err());
    }

    #[test]
    fn fractional_values_round_half_to_even() {
        assert_eq!(coerce::<i32>(Value::Float64(2.5)).unwrap(), 2);
        assert_eq!(coerce::<i32>(Value::Float64(3.5)).unwrap(), 4);
        assert_eq!(coerce::<i32>(Value::Float64(-2.6)).unwrap(), -3);
        assert_eq!(coerce::<i64>(Value::Decimal(250, 2)).unwrap(), 2);
        assert_eq!(coerce::<i64>(Value::Decimal(351, 2)).unwrap(), 4);
        assert_eq!(coerce::<i64>(Value::Decimal(-150, 2)).unwrap(), -2);
        assert!(coerce::<i64>(Value::Float64(f64::NAN)).is_err());
    }

    #[test]
    fn text_parses_into_numbers() {
        assert_eq!(coerce::<i32>(Value::text(" 17 ")).unwrap(), 17);
        assert_eq!(coerce::<f64>(Value::text("1.25")).unwrap(), 1.25);
        assert_eq!(coerce::<f32>(Value::text("0.5")).unwrap(), 0.5);

        let err = coerce::<i32>(Value::text("abc")).unwrap_err();
        assert_eq!((err.from, err.to), ("String", "i32"));
        assert!(err.detail.is_some());
    }

    #[test]
    fn decimal_into_float() {
        assert_eq!(coerce::<f64>(Value::Decimal(12345, 2)).unwrap(), 123.45);
    }

    #[test]
    fn booleans_from_numbers_and_text() {
        assert!(coerce::<bool>(Value::Int64(7)).unwrap());
        assert!(!coerce::<bool>(Value::UInt64(0)).unwrap());
        assert!(coerce::<bool>(Value::text("TRUE")).unwrap());
        assert!(!coerce::<bool>(Value::text(" false ")).unwrap());
        assert!(coerce::<bool>(Value::text("yes")).is_err());
        assert_eq!(coerce::<i32>(Value::Bool(true)).unwrap(), 1);
    }

    #[test]
    fn strings_accept_any_value() {
        assert_eq!(coerce::<String>(Value::Int64(5)).unwrap(), "5");
        assert_eq!(coerce::<String>(Value::Bool(false)).unwrap(), "false");
        assert_eq!(coerce::<String>(Value::text("x")).unwrap(), "x");
    }

    #[test]
    fn chars_need_exactly_one() {
        assert_eq!(coerce::<char>(Value::text("a")).unwrap(), 'a');
        assert_eq!(coerce::<char>(Value::Int64(65)).unwrap(), 'A');
        assert!(coerce::<char>(Value::text("ab")).is_err());
        assert!(coerce::<char>(Value::text("")).is_err());
    }

    #[test]
    fn bytes_from_blob_or_text() {
        assert_eq!(coerce::<Vec<u8>>(Value::Bytes(b"\x01\x02"[..].into())).unwrap(), vec![1, 2]);
        assert_eq!(coerce::<Vec<u8>>(Value::text("hi")).unwrap(), b"hi".to_vec());
        assert!(coerce::<Vec<u8>>(Value::Int64(1)).is_err());
    }

    #[test]
    fn temporal_values_from_native_variants() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let dt = date.and_hms_opt(23, 59, 58).unwrap();

        assert_eq!(coerce::<NaiveDate>(Value::Date(date_to_days(date))).unwrap(), date);
        assert_eq!(coerce::<NaiveDate>(Value::Timestamp(datetime_to_micros(dt))).unwrap(), date);
        assert_eq!(coerce::<NaiveDateTime>(Value::Timestamp(datetime_to_micros(dt))).unwrap(), dt);
        assert_eq!(
            coerce::<NaiveDateTime>(Value::Date(date_to_days(date))).unwrap(),
            date.and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            coerce::<DateTime<Utc>>(Value::Timestamp(datetime_to_micros(dt))).unwrap(),
            dt.and_utc()
        );
        assert_eq!(
            coerce::<NaiveTime>(Value::Time(45_296_000_000)).unwrap(),
            NaiveTime::from_hms_opt(12, 34, 56).unwrap()
        );
    }

    #[test]
    fn temporal_values_from_text() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(coerce::<NaiveDate>(Value::text("2024-02-29")).unwrap(), date);
        assert_eq!(coerce::<NaiveDate>(Value::text("02/29/2024")).unwrap(), date);
        assert_eq!(coerce::<NaiveDate>(Value::text("2024-02-29 08:00:00")).unwrap(), date);

        let dt = date.and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(coerce::<NaiveDateTime>(Value::text("2024-02-29 08:30:00")).unwrap(), dt);
        assert_eq!(coerce::<NaiveDateTime>(Value::text("2024-02-29T08:30:00")).unwrap(), dt);
        assert_eq!(
            coerce::<DateTime<Utc>>(Value::text("2024-02-29T10:30:00+02:00")).unwrap(),
            dt.and_utc()
        );
        assert_eq!(
            coerce::<NaiveTime>(Value::text("08:30")).unwrap(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap()
        );

        assert!(coerce::<NaiveDate>(Value::text("not a date")).is_err());
        assert!(coerce::<NaiveDate>(Value::Int64(20240229)).is_err());
    }

    #[test]
    fn custom_formats_replace_defaults() {
        let opts = CoerceOptions {
            date_formats: vec!["%d.%m.%Y".to_string()],
            datetime_formats: Vec::new(),
            time_formats: Vec::new(),
        };
        let parsed = NaiveDate::coerce(&Value::text("01.02.2024"), &opts).unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert!(NaiveDate::coerce(&Value::text("2024-02-01"), &opts).is_err());
    }

    #[test]
    fn optional_targets_unwrap_to_the_primitive() {
        assert_eq!(<Option<i32> as Coerce>::TARGET, TargetType::I32);
        assert!(<Option<i32> as Coerce>::NULLABLE);
        assert!(!<i32 as Coerce>::NULLABLE);
        assert_eq!(coerce::<Option<i32>>(Value::text("9")).unwrap(), Some(9));
        assert_eq!(coerce::<Option<i32>>(Value::Null).unwrap(), None);
        assert!(coerce::<Option<i32>>(Value::text("nine")).is_err());
    }
}
