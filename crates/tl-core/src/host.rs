//! Host boundary: the selection infrastructure supplied by the embedding platform
//!
//! The visual never invents row identities. It asks the host for one
//! [`SelectionHandle`] per row while mapping, carries the handle unchanged
//! through rendering, and hands it back when the user clicks an item.

use std::fmt;
use std::sync::Arc;

/// Describes one column of a categorical dataset as the host knows it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnSource {
    /// Name shown to the user
    pub display_name: String,

    /// Stable query name the host uses to address the column
    pub query_name: String,

    /// Position of the column in the dataset
    pub index: usize,
}

impl ColumnSource {
    /// Create a column source whose query name equals its display name
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            query_name: name,
            index,
        }
    }
}

/// Opaque host-issued token identifying a row for selection purposes
///
/// Only the host interprets the key. Equality is key equality, so a handle
/// survives cloning and round trips through element bindings unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionHandle {
    key: Arc<str>,
}

impl SelectionHandle {
    /// Wrap a host key. Meant to be called by host implementations only.
    pub fn from_host_key(key: impl Into<Arc<str>>) -> Self {
        Self { key: key.into() }
    }

    /// The host key this handle wraps
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for SelectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Issues one selection handle per row during mapping
pub trait SelectionHandleFactory: Send + Sync {
    /// Handle for `row` of the dataset, identified through its identity column
    fn for_row(&self, column: &ColumnSource, row: usize) -> SelectionHandle;
}

/// Receives selection requests triggered by clicks
///
/// Whether a request replaces, toggles, or extends the current selection is
/// up to the host.
pub trait SelectionManager: Send + Sync {
    fn request_select(&self, handle: &SelectionHandle);
}

/// Factory keying handles by the identity column's query name and row index
#[derive(Debug, Clone, Default)]
pub struct RowSelectionFactory {
    prefix: Option<String>,
}

impl RowSelectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every key, e.g. with a host instance name
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

impl SelectionHandleFactory for RowSelectionFactory {
    fn for_row(&self, column: &ColumnSource, row: usize) -> SelectionHandle {
        let key = match &self.prefix {
            Some(prefix) => format!("{}/{}#{}", prefix, column.query_name, row),
            None => format!("{}#{}", column.query_name, row),
        };
        SelectionHandle::from_host_key(key)
    }
}

impl<T: SelectionHandleFactory + ?Sized> SelectionHandleFactory for Arc<T> {
    fn for_row(&self, column: &ColumnSource, row: usize) -> SelectionHandle {
        (**self).for_row(column, row)
    }
}

impl<T: SelectionManager + ?Sized> SelectionManager for Arc<T> {
    fn request_select(&self, handle: &SelectionHandle) {
        (**self).request_select(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_factory_keys() {
        let column = ColumnSource::new("Orders.Id", 0);
        let factory = RowSelectionFactory::new();
        assert_eq!(factory.for_row(&column, 3).key(), "Orders.Id#3");

        let prefixed = RowSelectionFactory::new().with_prefix("visual-1");
        assert_eq!(prefixed.for_row(&column, 0).key(), "visual-1/Orders.Id#0");
    }

    #[test]
    fn test_handle_identity_survives_clone() {
        let handle = SelectionHandle::from_host_key("row#7");
        let copy = handle.clone();
        assert_eq!(handle, copy);
        assert_eq!(copy.to_string(), "row#7");
    }
}
