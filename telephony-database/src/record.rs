/*!
 The in-memory representation of exported and imported rows.

 A [`Record`] is an open map of column name to string value plus an optional
 binary payload. Rows of every table family (SMS, MMS, addresses, parts, call
 log, contacts, blocked numbers) pass through this one shape; column semantics
 are never interpreted. The family shells ([`MessageRecord`], [`ContactRecord`])
 hold the nested child rows that the document format stores under reserved
 structural keys.
*/

use std::collections::BTreeMap;

use crate::schema::SchemaSet;

// Structural keys reserved by the document format
/// Key holding the sender address object of an MMS message
pub const SENDER_ADDRESS: &str = "sender_address";
/// Key holding the recipient address array of an MMS message
pub const RECIPIENT_ADDRESSES: &str = "recipient_addresses";
/// Key holding the part array of an MMS message
pub const PARTS: &str = "parts";
/// Key holding the raw contact array of a contact
pub const RAW_CONTACTS: &str = "raw_contacts";
/// Key holding the data row array of a raw contact
pub const CONTACTS_DATA: &str = "contacts_data";
/// Key holding a base64 binary payload
pub const BINARY_DATA: &str = "binary_data";

// Enrichment and reconciliation column names
/// Resolved contact name attached to exported rows
pub const DISPLAY_NAME: &str = "display_name";
/// Conversation identifier column, remapped on import
pub const THREAD_ID: &str = "thread_id";
/// Column present only on MMS rows; its presence decides the message family
pub const MMS_TYPE_MARKER: &str = "m_type";
/// MMS address type code marking the sender (PduHeaders.FROM)
pub const PDU_HEADERS_FROM: &str = "137";
/// Call type code for voicemail entries, which are never imported
pub const VOICEMAIL_TYPE: &str = "4";

const STRUCTURAL_KEYS: &[&str] = &[
    SENDER_ADDRESS,
    RECIPIENT_ADDRESSES,
    PARTS,
    RAW_CONTACTS,
    CONTACTS_DATA,
    BINARY_DATA,
];

/// `true` if `key` is reserved for nested child rows or binary payloads
/// rather than a scalar column
pub fn is_structural_key(key: &str) -> bool {
    STRUCTURAL_KEYS.contains(&key)
}

/// One row of any table, as string-valued columns plus an optional binary
/// payload. Null columns are omitted, never stored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, String>,
    binary: Option<Vec<u8>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing any previous value
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// The column's value, or an empty string when the column is absent
    pub fn get_or_empty(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<String> {
        self.fields.remove(column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate the columns in sorted order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Drop every column not present in `schema`
    pub fn project(&mut self, schema: &SchemaSet) {
        self.fields.retain(|column, _| schema.contains(column));
    }

    /// Drop the listed columns
    pub fn strip(&mut self, columns: &[&str]) {
        self.fields.retain(|column, _| !columns.contains(&column.as_str()));
    }

    pub fn set_binary(&mut self, data: Vec<u8>) {
        self.binary = Some(data);
    }

    pub fn binary(&self) -> Option<&[u8]> {
        self.binary.as_deref()
    }

    pub fn take_binary(&mut self) -> Option<Vec<u8>> {
        self.binary.take()
    }
}

/// A message row together with its nested address and part rows.
///
/// SMS messages carry scalar metadata only; MMS messages additionally carry
/// zero or one sender address, recipient addresses, and ordered parts. A part
/// record may hold the part's decoded binary content.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub metadata: Record,
    pub sender_address: Option<Record>,
    pub recipient_addresses: Vec<Record>,
    pub parts: Vec<Record>,
}

impl MessageRecord {
    pub fn new(metadata: Record) -> Self {
        MessageRecord {
            metadata,
            sender_address: None,
            recipient_addresses: Vec::new(),
            parts: Vec::new(),
        }
    }

    /// MMS rows are distinguished by the presence of the `m_type` column
    pub fn is_mms(&self) -> bool {
        self.metadata.contains(MMS_TYPE_MARKER)
    }
}

/// A contact row with its raw contacts, each carrying its data rows
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub metadata: Record,
    pub raw_contacts: Vec<RawContact>,
}

impl ContactRecord {
    pub fn new(metadata: Record) -> Self {
        ContactRecord {
            metadata,
            raw_contacts: Vec::new(),
        }
    }
}

/// One raw contact row and its data rows. A data row's binary payload holds
/// the contents of a blob column, e.g. a contact photo.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawContact {
    pub metadata: Record,
    pub data: Vec<Record>,
}

impl RawContact {
    pub fn new(metadata: Record) -> Self {
        RawContact {
            metadata,
            data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        record::{is_structural_key, MessageRecord, Record, MMS_TYPE_MARKER, PARTS},
        schema::SchemaSet,
    };

    fn sample_record() -> Record {
        let mut record = Record::new();
        record.insert("address", "+15558675309");
        record.insert("body", "hello");
        record.insert("date", "1660000000000");
        record
    }

    #[test]
    fn can_insert_and_get() {
        let record = sample_record();
        assert_eq!(record.get("body"), Some("hello"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.get_or_empty("missing"), "");
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn can_replace_value() {
        let mut record = sample_record();
        record.insert("body", "goodbye");
        assert_eq!(record.get("body"), Some("goodbye"));
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn can_project_against_schema() {
        let mut record = sample_record();
        record.insert("computed_thing", "1");
        let schema = SchemaSet::new(
            ["address", "body", "date"].map(String::from),
            &[],
        );
        record.project(&schema);
        assert_eq!(record.len(), 3);
        assert!(!record.contains("computed_thing"));
    }

    #[test]
    fn can_strip_columns() {
        let mut record = sample_record();
        record.strip(&["address", "date"]);
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("body"), Some("hello"));
    }

    #[test]
    fn can_hold_binary() {
        let mut record = sample_record();
        assert!(record.binary().is_none());
        record.set_binary(vec![0, 1, 2]);
        assert_eq!(record.binary(), Some([0u8, 1, 2].as_slice()));
        assert_eq!(record.take_binary(), Some(vec![0, 1, 2]));
        assert!(record.binary().is_none());
    }

    #[test]
    fn can_detect_mms() {
        let mut message = MessageRecord::new(sample_record());
        assert!(!message.is_mms());
        message.metadata.insert(MMS_TYPE_MARKER, "132");
        assert!(message.is_mms());
    }

    #[test]
    fn can_recognize_structural_keys() {
        assert!(is_structural_key(PARTS));
        assert!(is_structural_key("binary_data"));
        assert!(!is_structural_key("thread_id"));
        assert!(!is_structural_key("body"));
    }
}
