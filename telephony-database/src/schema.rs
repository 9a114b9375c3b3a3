/*!
 Destination column sets used to filter imported fields.

 The set of valid columns for a table family varies by device and OS version,
 so an import run probes the destination store once per family and silently
 drops any field the destination does not know. Identifier and computed
 columns are excluded up front so the destination assigns fresh values.
*/

use std::collections::HashSet;

/// Columns never copied into SMS or MMS rows; the destination assigns both
pub const MESSAGE_EXCLUDED_COLUMNS: &[&str] = &["_id", "thread_id"];

/// Columns never copied into MMS part rows
pub const PART_EXCLUDED_COLUMNS: &[&str] = &["_id", "mid", "_data", "_count"];

/// Keys never copied into MMS address rows
pub const ADDRESS_EXCLUDED_KEYS: &[&str] = &["_id", "_count", "msg_id", "display_name"];

/// Columns never copied into call log rows
pub const CALL_EXCLUDED_COLUMNS: &[&str] = &["_id", "_count", "voicemail_uri"];

/// Columns never copied into contact data rows
pub const CONTACT_DATA_EXCLUDED_COLUMNS: &[&str] =
    &["_id", "_count", "raw_contact_id", "contact_id"];

/// Columns never copied into blocked number rows
pub const BLOCKED_EXCLUDED_COLUMNS: &[&str] = &["_id"];

/// The set of column names a destination table family accepts.
///
/// Filtering against a `SchemaSet` is a projection, not validation: unknown
/// fields are dropped without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSet {
    columns: HashSet<String>,
}

impl SchemaSet {
    /// Build a schema set from probed column names, dropping `excluded`
    pub fn new(columns: impl IntoIterator<Item = String>, excluded: &[&str]) -> Self {
        SchemaSet {
            columns: columns
                .into_iter()
                .filter(|column| !excluded.contains(&column.as_str()))
                .collect(),
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
