//! Row mapper: categorical dataset snapshot to timeline items

use indexmap::IndexSet;
use tl_core::SelectionHandleFactory;
use tracing::debug;

use crate::config::{MappingPlaceholders, NullConfig};
use crate::dataset::{CategoricalView, ColumnRole, DatasetColumn};
use crate::item::{Group, Item, MappedTimeline};
use crate::temporal::{read_temporal_column, read_text_column};
use crate::DataError;

/// Maps every row of a snapshot to exactly one item, in row order
#[derive(Debug, Clone, Default)]
pub struct RowMapper {
    nulls: NullConfig,
    placeholders: MappingPlaceholders,
}

/// Recognized columns after shape validation
struct BoundColumns<'a> {
    row_id: &'a DatasetColumn,
    start: &'a DatasetColumn,
    end: &'a DatasetColumn,
    label: &'a DatasetColumn,
    style_class: &'a DatasetColumn,
    group: Option<&'a DatasetColumn>,
    rows: usize,
}

impl RowMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_null_config(mut self, nulls: NullConfig) -> Self {
        self.nulls = nulls;
        self
    }

    pub fn with_placeholders(mut self, placeholders: MappingPlaceholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Map a snapshot, requesting one selection handle per row from `factory`
    ///
    /// The output depends only on the rows: the same snapshot always yields the
    /// same items in the same order.
    pub fn map(
        &self,
        dataset: &CategoricalView,
        factory: &dyn SelectionHandleFactory,
    ) -> Result<MappedTimeline, DataError> {
        let columns = Self::bind(dataset)?;

        let ids = read_text_column(&columns.row_id.values, &self.nulls)?;
        let starts = read_temporal_column(&columns.start.values, &self.nulls)?;
        let ends = read_temporal_column(&columns.end.values, &self.nulls)?;
        let labels = read_text_column(&columns.label.values, &self.nulls)?;
        let styles = read_text_column(&columns.style_class.values, &self.nulls)?;
        let groups = match columns.group {
            Some(column) => read_text_column(&column.values, &self.nulls)?,
            None => vec![None; columns.rows],
        };

        let mut lanes: IndexSet<String> = IndexSet::new();
        let mut items = Vec::with_capacity(columns.rows);

        let rows = ids
            .into_iter()
            .zip(starts)
            .zip(ends)
            .zip(labels)
            .zip(styles)
            .zip(groups)
            .enumerate();

        for (row, (((((id, start), end), label), style_class), group)) in rows {
            if let Some(group) = &group {
                lanes.insert(group.clone());
            }

            items.push(Item {
                id: id.unwrap_or_else(|| self.placeholders.id_for(row)),
                start,
                end,
                content: label.unwrap_or_else(|| self.placeholders.label.clone()),
                style_class: style_class.unwrap_or_else(|| self.placeholders.style_class.clone()),
                group,
                row,
                selection: factory.for_row(&columns.row_id.source, row),
            });
        }

        let mapped = MappedTimeline {
            items,
            groups: lanes
                .into_iter()
                .map(|id| Group { content: id.clone(), id })
                .collect(),
        };

        debug!(
            "Mapped {} rows into {} lanes ({} with invalid range)",
            mapped.items.len(),
            mapped.groups.len(),
            mapped.invalid_range_count()
        );

        Ok(mapped)
    }

    /// Check that the recognized columns are present and equally long
    fn bind(dataset: &CategoricalView) -> Result<BoundColumns<'_>, DataError> {
        let column = move |role: ColumnRole| {
            dataset
                .column(role)
                .ok_or_else(|| DataError::MissingInput(format!("no '{}' column", role.name())))
        };

        let bound = BoundColumns {
            row_id: column(ColumnRole::RowId)?,
            start: column(ColumnRole::StartTime)?,
            end: column(ColumnRole::EndTime)?,
            label: column(ColumnRole::Label)?,
            style_class: column(ColumnRole::StyleClass)?,
            group: dataset.column(ColumnRole::Group),
            rows: dataset.row_count(),
        };

        let checked = [bound.start, bound.end, bound.label, bound.style_class]
            .into_iter()
            .chain(bound.group);
        for column in checked {
            if column.len() != bound.rows {
                return Err(DataError::ShapeMismatch {
                    column: column.source.display_name.clone(),
                    expected: bound.rows,
                    actual: column.len(),
                });
            }
        }

        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::TimeValue;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tl_core::RowSelectionFactory;

    fn strings(values: Vec<Option<&str>>) -> ArrayRef {
        Arc::new(StringArray::from(values))
    }

    fn orders(n: usize) -> CategoricalView {
        let ids: Vec<i64> = (1..=n as i64).collect();
        let starts: Vec<String> = (0..n).map(|i| format!("2024-01-01T{:02}:00", i)).collect();
        let ends: Vec<String> = (0..n).map(|i| format!("2024-01-01T{:02}:30", i)).collect();
        let labels: Vec<String> = (1..=n).map(|i| format!("Order {}", i)).collect();
        let styles: Vec<String> = (0..n).map(|i| format!("style-{}", i % 2)).collect();

        CategoricalView::from_arrays(vec![
            ("Id", Arc::new(Int64Array::from(ids)) as ArrayRef),
            ("Start", Arc::new(StringArray::from(starts)) as ArrayRef),
            ("End", Arc::new(StringArray::from(ends)) as ArrayRef),
            ("Label", Arc::new(StringArray::from(labels)) as ArrayRef),
            ("Style", Arc::new(StringArray::from(styles)) as ArrayRef),
        ])
    }

    #[test]
    fn test_maps_rows_pointwise_in_order() {
        let mapped = RowMapper::new().map(&orders(4), &RowSelectionFactory::new()).unwrap();

        assert_eq!(mapped.items.len(), 4);
        assert!(mapped.groups.is_empty());
        for (row, item) in mapped.items.iter().enumerate() {
            assert_eq!(item.row, row);
            assert_eq!(item.id, (row + 1).to_string());
            assert_eq!(item.content, format!("Order {}", row + 1));
            assert_eq!(item.style_class, format!("style-{}", row % 2));
            assert_eq!(item.selection.key(), format!("Id#{}", row));
            assert!(item.has_valid_range());
        }
    }

    #[test]
    fn test_single_order_scenario() {
        let view = CategoricalView::from_arrays(vec![
            ("Id", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
            ("Start", strings(vec![Some("2024-01-01T00:00")])),
            ("End", strings(vec![Some("2024-01-01T02:00")])),
            ("Label", strings(vec![Some("Order 1")])),
            ("Style", strings(vec![Some("a")])),
        ]);
        let mapped = RowMapper::new().map(&view, &RowSelectionFactory::new()).unwrap();

        assert_eq!(mapped.items.len(), 1);
        let item = &mapped.items[0];
        assert_eq!(item.id, "1");
        assert_eq!(item.content, "Order 1");
        assert_eq!(item.style_class, "a");
        assert_eq!(item.start, TimeValue::At(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(item.end, TimeValue::At(Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap()));
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let view = orders(5);
        let factory = RowSelectionFactory::new();
        let first = RowMapper::new().map(&view, &factory).unwrap();
        let second = RowMapper::new().map(&view, &factory).unwrap();
        assert_eq!(first.items, second.items);
    }

    #[test]
    fn test_empty_dataset_maps_to_no_items() {
        let mapped = RowMapper::new().map(&orders(0), &RowSelectionFactory::new()).unwrap();
        assert!(mapped.items.is_empty());
        assert!(mapped.groups.is_empty());
    }

    #[test]
    fn test_missing_values_keep_the_row() {
        let view = CategoricalView::from_arrays(vec![
            ("Id", strings(vec![None, Some("b")])),
            ("Start", strings(vec![Some("2024-01-01T00:00"), Some("later")])),
            ("End", strings(vec![None, Some("2024-01-01T03:00")])),
            ("Label", strings(vec![None, Some("B")])),
            ("Style", strings(vec![Some("null"), None])),
        ]);
        let mapped = RowMapper::new().map(&view, &RowSelectionFactory::new()).unwrap();

        assert_eq!(mapped.items.len(), 2);
        let first = &mapped.items[0];
        assert_eq!(first.id, "row-0");
        assert_eq!(first.content, "(blank)");
        assert_eq!(first.style_class, "");
        assert_eq!(first.end, TimeValue::Missing);
        assert!(!first.has_valid_range());

        let second = &mapped.items[1];
        assert_eq!(second.start, TimeValue::Malformed("later".into()));
        assert_eq!(mapped.invalid_range_count(), 2);
    }

    #[test]
    fn test_groups_in_first_appearance_order() {
        let mut columns: Vec<(String, ArrayRef)> = orders(4)
            .columns()
            .iter()
            .map(|c| (c.source.display_name.clone(), c.values.clone()))
            .collect();
        columns.push((
            "Truck".to_string(),
            strings(vec![Some("Truck 2"), Some("Truck 1"), None, Some("Truck 2")]),
        ));
        let view = CategoricalView::from_arrays(columns);

        let mapped = RowMapper::new().map(&view, &RowSelectionFactory::new()).unwrap();
        let lanes: Vec<&str> = mapped.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(lanes, vec!["Truck 2", "Truck 1"]);
        assert_eq!(mapped.items[2].group, None);
        assert_eq!(mapped.items[3].group.as_deref(), Some("Truck 2"));
    }

    #[test]
    fn test_missing_column_is_missing_input() {
        let view = CategoricalView::from_arrays(vec![
            ("Id", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
            ("Start", strings(vec![Some("2024-01-01")])),
        ]);
        let err = RowMapper::new().map(&view, &RowSelectionFactory::new()).unwrap_err();
        assert!(matches!(err, DataError::MissingInput(_)));
    }

    #[test]
    fn test_unequal_columns_are_shape_mismatch() {
        let view = CategoricalView::from_arrays(vec![
            ("Id", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("Start", strings(vec![Some("2024-01-01"), Some("2024-01-02")])),
            ("End", strings(vec![Some("2024-01-02")])),
            ("Label", strings(vec![Some("a"), Some("b")])),
            ("Style", strings(vec![Some("x"), Some("y")])),
        ]);
        match RowMapper::new().map(&view, &RowSelectionFactory::new()) {
            Err(DataError::ShapeMismatch { column, expected, actual }) => {
                assert_eq!(column, "End");
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
    }
}
