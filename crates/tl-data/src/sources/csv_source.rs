//! CSV loading into a categorical snapshot
//!
//! Every column is loaded as text in header order, so the file's column
//! order decides the positional binding. Short records are padded with nulls.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use csv::ReaderBuilder;
use tracing::info;

use crate::dataset::CategoricalView;
use crate::DataError;

/// Load a CSV file from disk
pub fn load_csv_path(path: &Path) -> Result<CategoricalView, DataError> {
    let file = File::open(path)?;
    let view = load_csv(BufReader::new(file))?;
    info!(
        "Loaded {} rows and {} columns from {}",
        view.row_count(),
        view.columns().len(),
        path.display()
    );
    Ok(view)
}

/// Load CSV text with a header row
pub fn load_csv<R: Read>(reader: R) -> Result<CategoricalView, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        for (index, column) in cells.iter_mut().enumerate() {
            column.push(record.get(index).map(str::to_string));
        }
    }

    Ok(CategoricalView::from_arrays(
        headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| (name, Arc::new(StringArray::from(values)) as ArrayRef)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnRole;
    use crate::mapper::RowMapper;
    use tl_core::RowSelectionFactory;

    const ORDERS: &str = "\
id,start,end,label,style,truck
1,2024-01-01T00:00,2024-01-01T02:00,Order 1,late,Truck 1
2,2024-01-01T01:00,2024-01-01T05:00,Order 2,,Truck 2
3,2024-01-01T03:00
";

    #[test]
    fn test_load_csv_columns() {
        let view = load_csv(ORDERS.as_bytes()).unwrap();
        assert_eq!(view.columns().len(), 6);
        assert_eq!(view.row_count(), 3);
        assert_eq!(view.column(ColumnRole::Group).unwrap().source.display_name, "truck");
    }

    #[test]
    fn test_short_record_is_padded_and_mapped() {
        let view = load_csv(ORDERS.as_bytes()).unwrap();
        let mapped = RowMapper::new().map(&view, &RowSelectionFactory::new()).unwrap();

        assert_eq!(mapped.items.len(), 3);
        assert_eq!(mapped.items[1].style_class, "");
        assert_eq!(mapped.items[2].content, "(blank)");
        assert!(!mapped.items[2].has_valid_range());
        assert_eq!(mapped.groups.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = load_csv_path(Path::new("/nonexistent/orders.csv")).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }
}
