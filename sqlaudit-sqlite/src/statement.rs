use crate::errors::driver_error;
use crate::value::{type_affinity, Adapter};
use crate::{SqliteOptionsRef, GENERATED_KEY_COLUMN};
use arrow_array::builder::{BinaryBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow_array::{ArrayRef, Int64Array, NullArray, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use rusqlite::types::{Type, Value as SqliteValue, ValueRef};
use sqlaudit_core::driver::{DriverStatement, KeyRetrieval, Result};
use sqlaudit_core::parameters::Parameters;
use sqlaudit_core::values::ArrayElementType;
use sqlaudit_core::Error;
use std::sync::Arc;

pub(crate) struct SqliteStatement<'c> {
    inner: rusqlite::Statement<'c>,
    conn: &'c rusqlite::Connection,
    options: SqliteOptionsRef,
    key_retrieval: KeyRetrieval,
    is_insert: bool,
    generated_key: Option<i64>,
}

impl<'c> SqliteStatement<'c> {
    pub(crate) fn new(
        inner: rusqlite::Statement<'c>,
        conn: &'c rusqlite::Connection,
        options: SqliteOptionsRef,
        sql: &str,
        key_retrieval: KeyRetrieval,
    ) -> Self {
        let keyword = sql.split_whitespace().next().unwrap_or_default().to_uppercase();
        Self {
            inner,
            conn,
            options,
            key_retrieval,
            is_insert: keyword == "INSERT" || keyword == "REPLACE",
            generated_key: None,
        }
    }

    /// The data types of the columns as declared in the schema.
    ///
    /// Expressions have no declared type, their type will be inferred from the first non-null value returned.
    fn declared_types(&self) -> Vec<DataType> {
        self.inner
            .columns()
            .iter()
            .map(|column| match column.decl_type().and_then(type_affinity) {
                Some(ArrayElementType::Integer) | Some(ArrayElementType::Boolean) => DataType::Int64,
                Some(ArrayElementType::Real) => DataType::Float64,
                Some(ArrayElementType::Text) => DataType::Utf8,
                Some(ArrayElementType::Blob) => DataType::Binary,
                None => DataType::Null,
            })
            .collect()
    }
}

impl DriverStatement for SqliteStatement<'_> {
    fn bind(&mut self, parameters: Parameters) -> Result<()> {
        let expected = self.inner.parameter_count();
        match parameters {
            Parameters::Positional(values) => {
                if expected != values.len() {
                    return Err(Error::InvalidParameterCount { expected, actual: values.len() }.into());
                }
                // The valid values for the index in `raw_bind_parameter` begin at `1`.
                for (index, value) in values.iter().enumerate() {
                    self.inner.raw_bind_parameter(index + 1, Adapter(value)).map_err(driver_error)?;
                }
                Ok(())
            }
        }
    }

    fn execute(&mut self) -> Result<u64> {
        self.generated_key = None;
        let previous_rowid = self.conn.last_insert_rowid();
        let affected_rows = self.inner.raw_execute().map_err(driver_error)?;
        if self.key_retrieval == KeyRetrieval::Generated && affected_rows > 0 {
            // A rowid can be reused after a delete, the leading keyword covers that case for plain inserts.
            let rowid = self.conn.last_insert_rowid();
            if rowid != previous_rowid || self.is_insert {
                self.generated_key = Some(rowid);
            }
        }
        Ok(affected_rows as u64)
    }

    fn query<'s>(&'s mut self) -> Result<Box<dyn Iterator<Item = Result<RecordBatch>> + 's>> {
        let names = self.inner.column_names().iter().map(|name| name.to_string()).collect();
        let data_types = self.declared_types();
        Ok(Box::new(SqliteRows {
            inner: self.inner.raw_query(),
            max_batch_rows: self.options.max_batch_rows,
            names,
            data_types,
        }))
    }

    fn generated_keys<'s>(&'s mut self) -> Result<Box<dyn Iterator<Item = Result<RecordBatch>> + 's>> {
        if self.key_retrieval != KeyRetrieval::Generated {
            return Err(Error::GeneratedKeysNotRequested.into());
        }
        match self.generated_key {
            Some(key) => {
                let schema = Arc::new(Schema::new(vec![Field::new(GENERATED_KEY_COLUMN, DataType::Int64, false)]));
                let batch = RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![key])) as ArrayRef])?;
                Ok(Box::new(std::iter::once(Ok(batch))))
            }
            None => Ok(Box::new(std::iter::empty())),
        }
    }

    fn expanded_sql(&self) -> Option<String> {
        self.inner.expanded_sql()
    }
}

struct SqliteRows<'s> {
    inner: rusqlite::Rows<'s>,
    max_batch_rows: usize,
    names: Vec<String>,
    data_types: Vec<DataType>,
}

impl SqliteRows<'_> {
    fn append_row(columns: &mut [ColumnBuilder], row: &rusqlite::Row<'_>) -> Result<()> {
        for (index, column) in columns.iter_mut().enumerate() {
            column.append(row.get_ref(index).map_err(driver_error)?)?;
        }
        Ok(())
    }

    fn finish(&mut self, columns: Vec<ColumnBuilder>) -> Result<RecordBatch> {
        // A column promoted while building this batch keeps its type in the following ones.
        self.data_types = columns.iter().map(ColumnBuilder::data_type).collect();
        let fields: Vec<Field> = self
            .names
            .iter()
            .zip(self.data_types.iter())
            .map(|(name, data_type)| Field::new(name, data_type.clone(), true))
            .collect();
        let arrays: Vec<ArrayRef> = columns.into_iter().map(ColumnBuilder::finish).collect();
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}

impl Iterator for SqliteRows<'_> {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Result<RecordBatch>> {
        let mut columns: Vec<ColumnBuilder> = self.data_types.iter().map(ColumnBuilder::new).collect();
        let mut row_num = 0;
        while row_num < self.max_batch_rows {
            match self.inner.next() {
                Ok(Some(row)) => {
                    if let Err(error) = Self::append_row(&mut columns, row) {
                        return Some(Err(error));
                    }
                    row_num += 1;
                }
                Ok(None) => break,
                Err(error) => return Some(Err(driver_error(error).into())),
            }
        }
        match row_num {
            0 => None,
            _ => Some(self.finish(columns)),
        }
    }
}

/// Accumulates the values of a column for a record batch.
///
/// A `Null` column only counts its values until the first non-null one tells its actual type. A column whose values
/// don't fit its type is widened, see [ColumnBuilder::widen].
enum ColumnBuilder {
    Null(usize),
    Int64(Int64Builder),
    Float64(Float64Builder),
    Utf8(StringBuilder),
    Binary(BinaryBuilder),
}

impl ColumnBuilder {
    fn new(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int64 => ColumnBuilder::Int64(Int64Builder::new()),
            DataType::Float64 => ColumnBuilder::Float64(Float64Builder::new()),
            DataType::Utf8 => ColumnBuilder::Utf8(StringBuilder::new()),
            DataType::Binary => ColumnBuilder::Binary(BinaryBuilder::new()),
            _ => ColumnBuilder::Null(0),
        }
    }

    fn data_type(&self) -> DataType {
        match self {
            ColumnBuilder::Null(_) => DataType::Null,
            ColumnBuilder::Int64(_) => DataType::Int64,
            ColumnBuilder::Float64(_) => DataType::Float64,
            ColumnBuilder::Utf8(_) => DataType::Utf8,
            ColumnBuilder::Binary(_) => DataType::Binary,
        }
    }

    /// Replace a `Null` column by a column of the given type holding the same number of nulls.
    fn promote(sqlite_type: Type, nulls: usize) -> Self {
        let mut builder = match sqlite_type {
            Type::Integer => ColumnBuilder::Int64(Int64Builder::new()),
            Type::Real => ColumnBuilder::Float64(Float64Builder::new()),
            Type::Text => ColumnBuilder::Utf8(StringBuilder::new()),
            Type::Blob => ColumnBuilder::Binary(BinaryBuilder::new()),
            Type::Null => return ColumnBuilder::Null(nulls),
        };
        for _ in 0..nulls {
            builder.append_null();
        }
        builder
    }

    fn append_null(&mut self) {
        match self {
            ColumnBuilder::Null(nulls) => *nulls += 1,
            ColumnBuilder::Int64(builder) => builder.append_null(),
            ColumnBuilder::Float64(builder) => builder.append_null(),
            ColumnBuilder::Utf8(builder) => builder.append_null(),
            ColumnBuilder::Binary(builder) => builder.append_null(),
        }
    }

    fn append(&mut self, value: ValueRef<'_>) -> Result<()> {
        if let ColumnBuilder::Null(nulls) = *self {
            *self = Self::promote(value.data_type(), nulls);
        }
        match (self, value) {
            (builder, ValueRef::Null) => builder.append_null(),
            (ColumnBuilder::Int64(builder), ValueRef::Integer(value)) => builder.append_value(value),
            (ColumnBuilder::Float64(builder), ValueRef::Integer(value)) => builder.append_value(value as f64),
            (ColumnBuilder::Float64(builder), ValueRef::Real(value)) => builder.append_value(value),
            (ColumnBuilder::Utf8(builder), ValueRef::Text(value)) => builder.append_value(std::str::from_utf8(value)?),
            (ColumnBuilder::Utf8(builder), ValueRef::Integer(value)) => builder.append_value(value.to_string()),
            (ColumnBuilder::Utf8(builder), ValueRef::Real(value)) => builder.append_value(value.to_string()),
            (ColumnBuilder::Binary(builder), ValueRef::Blob(value)) => builder.append_value(value),
            (ColumnBuilder::Binary(builder), ValueRef::Text(value)) => builder.append_value(value),
            (ColumnBuilder::Binary(builder), ValueRef::Integer(value)) => builder.append_value(value.to_string()),
            (ColumnBuilder::Binary(builder), ValueRef::Real(value)) => builder.append_value(value.to_string()),
            (builder, value) => {
                builder.widen(value.data_type())?;
                return builder.append(value);
            }
        }
        Ok(())
    }

    /// Change the type of a column that received a value its current type cannot hold.
    ///
    /// SQLite does not enforce declared types, so integers widen to floats and any other conflict falls back to text,
    /// or to binary when blobs are involved. The values already appended are converted.
    fn widen(&mut self, sqlite_type: Type) -> Result<()> {
        let data_type = match (&*self, sqlite_type) {
            (ColumnBuilder::Int64(_), Type::Real) => DataType::Float64,
            (ColumnBuilder::Binary(_), _) | (_, Type::Blob) => DataType::Binary,
            _ => DataType::Utf8,
        };
        let values = self.take_values();
        *self = ColumnBuilder::new(&data_type);
        for value in values.iter() {
            self.append(ValueRef::from(value))?;
        }
        Ok(())
    }

    fn take_values(&mut self) -> Vec<SqliteValue> {
        match std::mem::replace(self, ColumnBuilder::Null(0)) {
            ColumnBuilder::Null(nulls) => vec![SqliteValue::Null; nulls],
            ColumnBuilder::Int64(mut builder) => {
                builder.finish().iter().map(|value| value.map_or(SqliteValue::Null, SqliteValue::Integer)).collect()
            }
            ColumnBuilder::Float64(mut builder) => {
                builder.finish().iter().map(|value| value.map_or(SqliteValue::Null, SqliteValue::Real)).collect()
            }
            ColumnBuilder::Utf8(mut builder) => builder
                .finish()
                .iter()
                .map(|value| value.map_or(SqliteValue::Null, |value| SqliteValue::Text(value.to_string())))
                .collect(),
            ColumnBuilder::Binary(mut builder) => builder
                .finish()
                .iter()
                .map(|value| value.map_or(SqliteValue::Null, |value| SqliteValue::Blob(value.to_vec())))
                .collect(),
        }
    }

    fn finish(self) -> ArrayRef {
        match self {
            ColumnBuilder::Null(nulls) => Arc::new(NullArray::new(nulls)),
            ColumnBuilder::Int64(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Float64(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Utf8(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Binary(mut builder) => Arc::new(builder.finish()),
        }
    }
}
