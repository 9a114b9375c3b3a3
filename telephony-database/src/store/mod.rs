/*!
 The abstract device store consumed by the export walkers and import
 reconcilers.

 A store is a queryable, insertable relational surface: forward row cursors
 per table family, child lookups keyed by parent identifier, inserts that
 yield the newly assigned row identifier (or `None` on refusal), and the
 handful of probes reconciliation needs (column sets, duplicate checks,
 thread id assignment, contact name lookup). [`device::DeviceStore`] is the
 SQLite-backed implementation.
*/

use std::collections::BTreeSet;

use crate::{error::store::StoreError, record::Record};

pub mod device;

/// Flow control returned by a row visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

/// Callback receiving one row at a time from a forward cursor
pub type RowVisitor<'a> = dyn FnMut(Record) -> Result<Visit, StoreError> + 'a;

/// Read access to the SMS and MMS tables and their child tables
pub trait MessageSource {
    fn sms_count(&self, selection: Option<&str>) -> Result<u64, StoreError>;
    /// Walk SMS rows in cursor order, optionally filtered by a selection clause
    fn visit_sms(&self, selection: Option<&str>, visit: &mut RowVisitor) -> Result<(), StoreError>;
    fn mms_count(&self, selection: Option<&str>) -> Result<u64, StoreError>;
    fn visit_mms(&self, selection: Option<&str>, visit: &mut RowVisitor) -> Result<(), StoreError>;
    /// Address rows joined to one MMS message
    fn mms_addresses(&self, message_id: &str) -> Result<Vec<Record>, StoreError>;
    /// Part rows joined to one MMS message, in ascending sequence order
    fn mms_parts(&self, message_id: &str) -> Result<Vec<Record>, StoreError>;
    /// The binary content of one part
    fn part_data(&self, part_id: &str) -> Result<Vec<u8>, StoreError>;
}

/// Write access to the SMS and MMS tables and their child tables
pub trait MessageSink {
    fn sms_columns(&self) -> Result<Vec<String>, StoreError>;
    fn mms_columns(&self) -> Result<Vec<String>, StoreError>;
    fn part_columns(&self) -> Result<Vec<String>, StoreError>;
    /// Insert a parent SMS row; `None` means the store refused the row
    fn insert_sms(&self, record: &Record) -> Result<Option<i64>, StoreError>;
    fn insert_mms(&self, record: &Record) -> Result<Option<i64>, StoreError>;
    fn insert_mms_address(&self, message_id: i64, record: &Record)
        -> Result<Option<i64>, StoreError>;
    fn insert_mms_part(&self, message_id: i64, record: &Record)
        -> Result<Option<i64>, StoreError>;
    /// Write a part's binary content through its content stream
    fn write_part_data(&self, part_id: i64, data: &[u8]) -> Result<(), StoreError>;
    /// Map a participant address set to a stable conversation identifier,
    /// creating one if the set has never been seen
    fn get_or_create_thread_id(&self, addresses: &BTreeSet<String>) -> Result<i64, StoreError>;
    fn sms_exists(
        &self,
        address: &str,
        kind: &str,
        date: &str,
        body: &str,
    ) -> Result<bool, StoreError>;
    fn mms_exists(
        &self,
        date: &str,
        msg_box: &str,
        m_id: Option<&str>,
        content_location: Option<&str>,
    ) -> Result<bool, StoreError>;
}

/// Read access to the call log
pub trait CallSource {
    fn call_count(&self) -> Result<u64, StoreError>;
    fn visit_calls(&self, visit: &mut RowVisitor) -> Result<(), StoreError>;
}

/// Write access to the call log
pub trait CallSink {
    fn call_columns(&self) -> Result<Vec<String>, StoreError>;
    fn insert_call(&self, record: &Record) -> Result<Option<i64>, StoreError>;
    fn call_exists(&self, number: &str, kind: &str, date: &str) -> Result<bool, StoreError>;
}

/// Read access to contacts, raw contacts, and contact data rows
pub trait ContactSource {
    fn contact_count(&self) -> Result<u64, StoreError>;
    fn visit_contacts(&self, visit: &mut RowVisitor) -> Result<(), StoreError>;
    fn raw_contacts(&self, contact_id: &str) -> Result<Vec<Record>, StoreError>;
    fn contact_data(&self, raw_contact_id: &str) -> Result<Vec<Record>, StoreError>;
}

/// Write access to raw contacts and contact data rows
pub trait ContactSink {
    fn contact_data_columns(&self) -> Result<Vec<String>, StoreError>;
    /// Insert a fresh raw contact with no account affiliation
    fn insert_raw_contact(&self) -> Result<Option<i64>, StoreError>;
    fn insert_contact_data(
        &self,
        raw_contact_id: i64,
        record: &Record,
    ) -> Result<Option<i64>, StoreError>;
}

/// Read access to the blocked number table
pub trait BlockedNumberSource {
    fn blocked_count(&self) -> Result<u64, StoreError>;
    fn visit_blocked_numbers(&self, visit: &mut RowVisitor) -> Result<(), StoreError>;
}

/// Write access to the blocked number table
pub trait BlockedNumberSink {
    fn blocked_number_columns(&self) -> Result<Vec<String>, StoreError>;
    fn insert_blocked_number(&self, record: &Record) -> Result<Option<i64>, StoreError>;
}

/// Phone number to contact display name resolution
pub trait ContactLookup {
    fn display_name(&self, address: &str) -> Result<Option<String>, StoreError>;
}
