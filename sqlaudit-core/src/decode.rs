use crate::{Error, Result};
use arrow_array::array::Array;
use arrow_schema::{DataType, TimeUnit};
use chrono::{DateTime, Utc};

/// A trait to decode values from an Arrow array.
pub trait Decode: Sized {
    /// Decode the value at the given index.
    ///
    /// # Panics
    /// Panics if the value cannot be decoded, see [Decode::try_decode] for a non-panicking version.
    fn decode(array: &dyn Array, index: usize) -> Self {
        match Self::try_decode(array, index) {
            Ok(value) => value,
            Err(e) => panic!("Unable to decode the value at index {} (reason: {})", index, e),
        }
    }

    fn try_decode(array: &dyn Array, index: usize) -> Result<Self>;
}

/// Returns whether the value at the given index is null.
///
/// This is a helper function to work around the surprising behavior `is_null` method in the Arrow `Array` trait which
/// will always return `false` for a [arrow_array::NullArray].
pub fn is_null(array: &dyn Array, index: usize) -> bool {
    if array.is_null(index) {
        true
    } else {
        array.as_any().downcast_ref::<arrow_array::NullArray>().is_some()
    }
}

fn downcast<'a, T: 'static>(array: &'a dyn Array, expected: &str) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::InvalidType { expected: expected.to_string(), actual: array.data_type().to_string() })
}

macro_rules! impl_decode {
    ($type:ty, $array_type:ident) => {
        impl Decode for $type {
            fn try_decode(array: &dyn Array, index: usize) -> Result<Self> {
                if index >= array.len() {
                    return Err(Error::OutOfBounds { index });
                }
                let array = downcast::<arrow_array::$array_type>(array, stringify!($array_type))?;
                Ok(array.value(index).into())
            }
        }
    };
}

impl_decode!(i8, Int8Array);
impl_decode!(i16, Int16Array);
impl_decode!(i32, Int32Array);
impl_decode!(i64, Int64Array);
impl_decode!(u8, UInt8Array);
impl_decode!(u16, UInt16Array);
impl_decode!(u32, UInt32Array);
impl_decode!(u64, UInt64Array);
impl_decode!(f32, Float32Array);
impl_decode!(f64, Float64Array);
impl_decode!(String, StringArray);
impl_decode!(Vec<u8>, BinaryArray);

/// Decoding a boolean from a {{arrow_array::Array}}
///
/// This implementation will try to decode a boolean from a {{arrow_array::BooleanArray}} or an
/// {{arrow_array::Int64Array}} in order to support databases that store booleans as integers such as SQLite.
impl Decode for bool {
    fn try_decode(array: &dyn Array, index: usize) -> Result<Self> {
        if index >= array.len() {
            return Err(Error::OutOfBounds { index });
        }
        match array.data_type() {
            DataType::Boolean => Ok(downcast::<arrow_array::BooleanArray>(array, "Boolean")?.value(index)),
            DataType::Int64 => Ok(downcast::<arrow_array::Int64Array>(array, "Int64")?.value(index) != 0),
            _ => Err(Error::InvalidType { expected: "Boolean".to_string(), actual: array.data_type().to_string() }),
        }
    }
}

fn out_of_range(value: i64, unit: &str) -> Error {
    Error::InternalError { error: format!("Out of range datetime: {}{}.", value, unit).into() }
}

/// Decoding a DateTime from {{arrow_array::Array}}
///
/// Besides timestamps, integers are decoded as seconds since the UNIX epoch and strings are expected to be either
/// RFC 3339 dates or dates such as '2024-09-05 05:04:47' (the format used by SQLite `CURRENT_TIMESTAMP`).
impl Decode for DateTime<Utc> {
    fn try_decode(array: &dyn Array, index: usize) -> Result<Self> {
        if index >= array.len() {
            return Err(Error::OutOfBounds { index });
        }
        match array.data_type() {
            DataType::Timestamp(TimeUnit::Second, _) => {
                let secs = downcast::<arrow_array::TimestampSecondArray>(array, "Timestamp")?.value(index);
                DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| out_of_range(secs, "s"))
            }
            DataType::Timestamp(TimeUnit::Millisecond, _) => {
                let ms = downcast::<arrow_array::TimestampMillisecondArray>(array, "Timestamp")?.value(index);
                DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| out_of_range(ms, "ms"))
            }
            DataType::Timestamp(TimeUnit::Microsecond, _) => {
                let micros = downcast::<arrow_array::TimestampMicrosecondArray>(array, "Timestamp")?.value(index);
                DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(|| out_of_range(micros, "us"))
            }
            DataType::Timestamp(TimeUnit::Nanosecond, _) => {
                let nanos = downcast::<arrow_array::TimestampNanosecondArray>(array, "Timestamp")?.value(index);
                Ok(DateTime::<Utc>::from_timestamp_nanos(nanos))
            }
            DataType::Int64 => {
                let secs = downcast::<arrow_array::Int64Array>(array, "Int64")?.value(index);
                DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| out_of_range(secs, "s"))
            }
            DataType::Utf8 => {
                let str = downcast::<arrow_array::StringArray>(array, "Utf8")?.value(index);
                if str.len() == 19 {
                    match chrono::NaiveDateTime::parse_from_str(str, "%Y-%m-%d %H:%M:%S") {
                        Ok(datetime) => Ok(DateTime::from_naive_utc_and_offset(datetime, Utc)),
                        Err(e) => Err(Error::InternalError { error: e.into() }),
                    }
                } else {
                    match DateTime::parse_from_rfc3339(str) {
                        Ok(datetime) => Ok(datetime.with_timezone(&Utc)),
                        Err(e) => Err(Error::InternalError { error: e.into() }),
                    }
                }
            }
            _ => Err(Error::InvalidType { expected: "Timestamp".to_string(), actual: array.data_type().to_string() }),
        }
    }
}
