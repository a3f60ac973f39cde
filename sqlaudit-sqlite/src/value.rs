use rusqlite::types::ToSqlOutput;
use sqlaudit_core::values::{ArrayElementType, Value};
use std::rc::Rc;

/// Converting a `Value` to a `rusqlite::ToSql`.
///
/// Using an adapter is necessary to work around
/// [E0117](https://doc.rust-lang.org/error_codes/E0117.html) that prevents
/// implementing `rusqlite::ToSql` for `Value` directly.
pub(crate) struct Adapter<'a>(pub &'a Value);

impl rusqlite::ToSql for Adapter<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self.0 {
            Value::Array(array) => {
                let elements = array.elements().iter().map(to_sqlite_value).collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(ToSqlOutput::Array(Rc::new(elements)))
            }
            value => Ok(ToSqlOutput::Owned(to_sqlite_value(value)?)),
        }
    }
}

fn to_sqlite_value(value: &Value) -> rusqlite::Result<rusqlite::types::Value> {
    use rusqlite::types::Value as SqliteValue;
    match value {
        Value::Null => Ok(SqliteValue::Null),
        Value::Bool(value) => Ok(SqliteValue::Integer(*value as i64)),
        Value::Int8(value) => Ok(SqliteValue::Integer(*value as i64)),
        Value::Int16(value) => Ok(SqliteValue::Integer(*value as i64)),
        Value::Int32(value) => Ok(SqliteValue::Integer(*value as i64)),
        Value::Int64(value) => Ok(SqliteValue::Integer(*value)),
        Value::UInt8(value) => Ok(SqliteValue::Integer(*value as i64)),
        Value::UInt16(value) => Ok(SqliteValue::Integer(*value as i64)),
        Value::UInt32(value) => Ok(SqliteValue::Integer(*value as i64)),
        Value::UInt64(value) => match i64::try_from(*value) {
            Ok(value) => Ok(SqliteValue::Integer(value)),
            Err(e) => Err(rusqlite::Error::ToSqlConversionFailure(Box::new(e))),
        },
        Value::Float32(value) => Ok(SqliteValue::Real(*value as f64)),
        Value::Float64(value) => Ok(SqliteValue::Real(*value)),
        Value::String(value) => Ok(SqliteValue::Text(value.clone())),
        Value::Blob(value) => Ok(SqliteValue::Blob(value.clone())),
        Value::Array(_) => Err(rusqlite::Error::ToSqlConversionFailure("Nested arrays are not supported".into())),
    }
}

/// Resolve a type name into the type it stands for, following the SQLite type affinity rules.
///
/// See [Determination Of Column Affinity](https://www.sqlite.org/datatype3.html#determination_of_column_affinity).
/// Names that would get the `NUMERIC` affinity are not recognized since they don't tell how values are stored.
pub(crate) fn type_affinity(type_name: &str) -> Option<ArrayElementType> {
    let type_name = type_name.to_uppercase();
    if type_name.contains("INT") {
        Some(ArrayElementType::Integer)
    } else if type_name.contains("CHAR") || type_name.contains("CLOB") || type_name.contains("TEXT") {
        Some(ArrayElementType::Text)
    } else if type_name.contains("BLOB") {
        Some(ArrayElementType::Blob)
    } else if type_name.contains("REAL") || type_name.contains("FLOA") || type_name.contains("DOUB") {
        Some(ArrayElementType::Real)
    } else if type_name.contains("BOOL") {
        Some(ArrayElementType::Boolean)
    } else {
        None
    }
}
