//! Categorical dataset snapshot as delivered by the host
//!
//! Columns are bound to their meaning by position, not by name: the host's
//! field wells fill column 0 with the row identity, 1 with the start time,
//! 2 with the end time, 3 with the label, 4 with the style class and the
//! optional 5 with the lane group. Unlike a record batch, nothing here
//! guarantees equal column lengths; the mapper checks that.

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;
use tl_core::ColumnSource;

/// Meaning of a positionally bound column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    RowId,
    StartTime,
    EndTime,
    Label,
    StyleClass,
    Group,
}

impl ColumnRole {
    /// Roles every dataset must carry, in binding order
    pub const RECOGNIZED: [ColumnRole; 5] = [
        ColumnRole::RowId,
        ColumnRole::StartTime,
        ColumnRole::EndTime,
        ColumnRole::Label,
        ColumnRole::StyleClass,
    ];

    /// Column position the role is bound to
    pub fn position(self) -> usize {
        match self {
            ColumnRole::RowId => 0,
            ColumnRole::StartTime => 1,
            ColumnRole::EndTime => 2,
            ColumnRole::Label => 3,
            ColumnRole::StyleClass => 4,
            ColumnRole::Group => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnRole::RowId => "rowId",
            ColumnRole::StartTime => "startTime",
            ColumnRole::EndTime => "endTime",
            ColumnRole::Label => "label",
            ColumnRole::StyleClass => "styleClass",
            ColumnRole::Group => "group",
        }
    }
}

/// One column of the snapshot
#[derive(Debug, Clone)]
pub struct DatasetColumn {
    pub source: ColumnSource,
    pub values: ArrayRef,
}

impl DatasetColumn {
    pub fn new(source: ColumnSource, values: ArrayRef) -> Self {
        Self { source, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read-only snapshot of the host's categorical dataset
#[derive(Debug, Clone, Default)]
pub struct CategoricalView {
    columns: Vec<DatasetColumn>,
}

impl CategoricalView {
    pub fn new(columns: Vec<DatasetColumn>) -> Self {
        Self { columns }
    }

    /// Build a snapshot from named arrays, in binding order
    pub fn from_arrays<I, S>(arrays: I) -> Self
    where
        I: IntoIterator<Item = (S, ArrayRef)>,
        S: Into<String>,
    {
        let columns = arrays
            .into_iter()
            .enumerate()
            .map(|(index, (name, values))| DatasetColumn::new(ColumnSource::new(name, index), values))
            .collect();
        Self { columns }
    }

    /// Build a snapshot from a record batch, binding its columns in schema order
    pub fn from_record_batch(batch: &RecordBatch) -> Self {
        let schema = batch.schema();
        Self::from_arrays(
            schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, values)| (field.name().clone(), values.clone())),
        )
    }

    pub fn columns(&self) -> &[DatasetColumn] {
        &self.columns
    }

    /// Column bound to `role`, if the host supplied it
    pub fn column(&self, role: ColumnRole) -> Option<&DatasetColumn> {
        self.columns.get(role.position())
    }

    /// Row count according to the identity column
    pub fn row_count(&self) -> usize {
        self.column(ColumnRole::RowId).map(DatasetColumn::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_positional_binding() {
        let view = CategoricalView::from_arrays(vec![
            ("Id", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("Start", Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef),
        ]);

        let id = view.column(ColumnRole::RowId).unwrap();
        assert_eq!(id.source.display_name, "Id");
        assert_eq!(id.source.index, 0);
        assert_eq!(view.column(ColumnRole::StartTime).unwrap().source.index, 1);
        assert!(view.column(ColumnRole::Label).is_none());
        assert_eq!(view.row_count(), 2);
    }

    #[test]
    fn test_from_record_batch() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Order", DataType::Int64, false),
            Field::new("Label", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![7])),
                Arc::new(StringArray::from(vec![Some("x")])),
            ],
        )
        .unwrap();

        let view = CategoricalView::from_record_batch(&batch);
        assert_eq!(view.columns().len(), 2);
        assert_eq!(view.columns()[1].source.query_name, "Label");
        assert_eq!(view.row_count(), 1);
    }

    #[test]
    fn test_empty_view() {
        let view = CategoricalView::default();
        assert_eq!(view.row_count(), 0);
        assert!(view.column(ColumnRole::RowId).is_none());
    }
}
