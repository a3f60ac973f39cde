use crate::row::Row;
use crate::Result;
use arrow_array::RecordBatch;
use std::sync::Arc;

/// A cursor over the rows returned by a query.
///
/// The rows are read from the record batches produced by the driver, a new batch is only fetched once all the rows of
/// the previous one have been returned.
pub struct Rows<'i> {
    last_record_batch: Option<Arc<RecordBatch>>,
    iterator: Box<dyn Iterator<Item = Result<RecordBatch>> + 'i>,
    index_in_batch: usize,
}

impl<'i> From<Box<dyn Iterator<Item = Result<RecordBatch>> + 'i>> for Rows<'i> {
    fn from(iterator: Box<dyn Iterator<Item = Result<RecordBatch>> + 'i>) -> Self {
        Rows { last_record_batch: None, iterator, index_in_batch: 0 }
    }
}

impl Rows<'_> {
    /// Get the next row if any, and drop the cursor.
    ///
    /// Returns `Ok(None)` if the query returned no rows.
    pub fn first(mut self) -> Result<Option<Row>> {
        self.next().transpose()
    }
}

/// An iterator over the rows returned by a query.
impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        while self.last_record_batch.is_none() {
            // First call or we've exhausted the last batch.
            match self.iterator.next() {
                // Drivers may produce empty batches, they are skipped.
                Some(Ok(record_batch)) if record_batch.num_rows() == 0 => continue,
                Some(Ok(record_batch)) => {
                    self.index_in_batch = 0;
                    self.last_record_batch = Some(Arc::new(record_batch));
                }
                // An error occurred while fetching the next batch.
                Some(Err(e)) => return Some(Err(e)),
                // No more batches available.
                None => return None,
            }
        }
        let last_record_batch = self.last_record_batch.clone()?;
        let row = Row::new(last_record_batch.clone(), self.index_in_batch);
        self.index_in_batch += 1;
        if self.index_in_batch >= last_record_batch.num_rows() {
            // we've exhausted the current batch
            self.last_record_batch = None;
        }
        Some(Ok(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use arrow_array::Int64Array;
    use arrow_schema::{DataType, Field, Schema};

    fn batch(values: Vec<i64>) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        Ok(RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(values))])?)
    }

    #[test]
    fn test_rows_across_batches() {
        let batches = vec![batch(vec![1, 2]), batch(vec![]), batch(vec![3])];
        let iterator: Box<dyn Iterator<Item = Result<RecordBatch>>> = Box::new(batches.into_iter());
        let ids: Vec<i64> = Rows::from(iterator).map(|row| row.unwrap().get::<_, i64>("id")).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_rows_error() {
        let batches = vec![batch(vec![1]), Err(Error::NotFound)];
        let iterator: Box<dyn Iterator<Item = Result<RecordBatch>>> = Box::new(batches.into_iter());
        let mut rows = Rows::from(iterator);
        assert_eq!(rows.next().unwrap().unwrap().get::<_, i64>(0), 1);
        assert!(matches!(rows.next(), Some(Err(Error::NotFound))));
    }

    #[test]
    fn test_rows_first() {
        let iterator: Box<dyn Iterator<Item = Result<RecordBatch>>> = Box::new(std::iter::once(batch(vec![7, 8])));
        assert_eq!(Rows::from(iterator).first().unwrap().unwrap().get::<_, i64>(0), 7);
        let iterator: Box<dyn Iterator<Item = Result<RecordBatch>>> = Box::new(std::iter::empty());
        assert!(Rows::from(iterator).first().unwrap().is_none());
    }
}
