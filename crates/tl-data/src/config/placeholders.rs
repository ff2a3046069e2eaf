//! Placeholders substituted for missing cells
//!
//! Rows with missing values are still mapped so the item count always matches
//! the host's row count.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingPlaceholders {
    /// Prefix of the generated id; the row index is appended
    pub id_prefix: String,
    pub label: String,
    pub style_class: String,
}

impl Default for MappingPlaceholders {
    fn default() -> Self {
        Self {
            id_prefix: "row-".to_string(),
            label: "(blank)".to_string(),
            style_class: String::new(),
        }
    }
}

impl MappingPlaceholders {
    pub fn id_for(&self, row: usize) -> String {
        format!("{}{}", self.id_prefix, row)
    }
}
