/*!
 The SQLite-backed device store.

 Holds the synthetic telephony schema (messages, addresses, parts and their
 binary content, call log, contacts, blocked numbers, conversation threads)
 and implements every store trait over it. Row values of any SQLite type
 surface as strings; blob columns surface through the record's binary side
 channel. Part content is streamed through SQLite's incremental blob API.
*/

use std::{
    collections::BTreeSet,
    io::{Read, Write},
    path::Path,
};

use rusqlite::{
    params, params_from_iter, types::ValueRef, Connection, DatabaseName, OpenFlags,
    OptionalExtension, Row, ToSql,
};

use crate::{
    error::store::StoreError,
    record::Record,
    store::{
        BlockedNumberSink, BlockedNumberSource, CallSink, CallSource, ContactLookup, ContactSink,
        ContactSource, MessageSink, MessageSource, RowVisitor, Visit,
    },
};

// Table names
/// SMS table name
pub const SMS: &str = "sms";
/// MMS table name
pub const MMS: &str = "mms";
/// MMS address table name
pub const MMS_ADDR: &str = "addr";
/// MMS part table name
pub const MMS_PART: &str = "part";
/// Part binary content table name
pub const PART_DATA: &str = "part_data";
/// Call log table name
pub const CALLS: &str = "calls";
/// Contact table name
pub const CONTACTS: &str = "contacts";
/// Raw contact table name
pub const RAW_CONTACTS_TABLE: &str = "raw_contacts";
/// Contact data table name
pub const CONTACT_DATA: &str = "contact_data";
/// Blocked number table name
pub const BLOCKED_NUMBERS: &str = "blocked_numbers";
/// Conversation thread table name
pub const THREADS: &str = "threads";

/// Mime type of phone number data rows, used for display name lookups
pub const MIMETYPE_PHONE: &str = "vnd.android.cursor.item/phone_v2";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sms (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id INTEGER,
    address TEXT,
    person INTEGER,
    date INTEGER,
    date_sent INTEGER DEFAULT 0,
    protocol INTEGER,
    read INTEGER DEFAULT 0,
    status INTEGER DEFAULT -1,
    type INTEGER,
    reply_path_present INTEGER,
    subject TEXT,
    body TEXT,
    service_center TEXT,
    locked INTEGER DEFAULT 0,
    sub_id INTEGER DEFAULT -1,
    error_code INTEGER DEFAULT 0,
    seen INTEGER DEFAULT 0
);
CREATE TABLE IF NOT EXISTS mms (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id INTEGER,
    date INTEGER,
    date_sent INTEGER DEFAULT 0,
    msg_box INTEGER,
    read INTEGER DEFAULT 0,
    m_id TEXT,
    sub TEXT,
    sub_cs INTEGER,
    ct_t TEXT,
    ct_l TEXT,
    exp INTEGER,
    m_cls TEXT,
    m_type INTEGER,
    v INTEGER,
    m_size INTEGER,
    pri INTEGER,
    rr INTEGER,
    rpt_a INTEGER,
    resp_st INTEGER,
    st INTEGER,
    tr_id TEXT,
    retr_st INTEGER,
    retr_txt TEXT,
    retr_txt_cs INTEGER,
    read_status INTEGER,
    ct_cls INTEGER,
    resp_txt TEXT,
    d_tm INTEGER,
    d_rpt INTEGER,
    locked INTEGER DEFAULT 0,
    sub_id INTEGER DEFAULT -1,
    seen INTEGER DEFAULT 0,
    text_only INTEGER DEFAULT 0
);
CREATE TABLE IF NOT EXISTS addr (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    msg_id INTEGER NOT NULL,
    contact_id INTEGER,
    address TEXT,
    type INTEGER,
    charset INTEGER
);
CREATE TABLE IF NOT EXISTS part (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    mid INTEGER NOT NULL,
    seq INTEGER DEFAULT 0,
    ct TEXT,
    name TEXT,
    chset INTEGER,
    cd TEXT,
    fn TEXT,
    cid TEXT,
    cl TEXT,
    ctt_s INTEGER,
    ctt_t TEXT,
    text TEXT,
    _data TEXT
);
CREATE TABLE IF NOT EXISTS part_data (
    part_id INTEGER PRIMARY KEY,
    data BLOB NOT NULL
);
CREATE TABLE IF NOT EXISTS calls (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    number TEXT,
    date INTEGER,
    duration INTEGER DEFAULT 0,
    type INTEGER,
    new INTEGER DEFAULT 1,
    name TEXT,
    numbertype INTEGER,
    numberlabel TEXT,
    countryiso TEXT,
    voicemail_uri TEXT,
    geocoded_location TEXT,
    is_read INTEGER,
    subscription_id INTEGER DEFAULT -1
);
CREATE TABLE IF NOT EXISTS contacts (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    display_name TEXT,
    starred INTEGER DEFAULT 0,
    times_contacted INTEGER DEFAULT 0,
    last_time_contacted INTEGER,
    has_phone_number INTEGER DEFAULT 0,
    lookup TEXT,
    photo_id INTEGER
);
CREATE TABLE IF NOT EXISTS raw_contacts (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id INTEGER,
    account_name TEXT,
    account_type TEXT,
    starred INTEGER DEFAULT 0,
    deleted INTEGER DEFAULT 0,
    custom_ringtone TEXT
);
CREATE TABLE IF NOT EXISTS contact_data (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    raw_contact_id INTEGER NOT NULL,
    mimetype TEXT,
    is_primary INTEGER DEFAULT 0,
    data1 TEXT,
    data2 TEXT,
    data3 TEXT,
    data4 TEXT,
    data5 TEXT,
    data6 TEXT,
    data7 TEXT,
    data8 TEXT,
    data9 TEXT,
    data10 TEXT,
    data11 TEXT,
    data12 TEXT,
    data13 TEXT,
    data14 TEXT,
    data15 BLOB
);
CREATE TABLE IF NOT EXISTS blocked_numbers (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    original_number TEXT,
    e164_number TEXT
);
CREATE TABLE IF NOT EXISTS threads (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    recipient_key TEXT NOT NULL UNIQUE,
    date INTEGER DEFAULT 0,
    message_count INTEGER DEFAULT 0
);
";

/// Convert one cursor row into a record, omitting nulls
fn record_from_row(row: &Row, columns: &[String]) -> Result<Record, StoreError> {
    let mut record = Record::new();
    for (index, column) in columns.iter().enumerate() {
        match row.get_ref(index).map_err(StoreError::Sqlite)? {
            ValueRef::Null => {}
            ValueRef::Integer(value) => record.insert(column.as_str(), value.to_string()),
            ValueRef::Real(value) => record.insert(column.as_str(), value.to_string()),
            ValueRef::Text(value) => {
                record.insert(column.as_str(), String::from_utf8_lossy(value));
            }
            ValueRef::Blob(value) => {
                // A record carries at most one binary payload
                if record.binary().is_none() {
                    record.set_binary(value.to_vec());
                }
            }
        }
    }
    Ok(record)
}

/// A device telephony store backed by a SQLite database
pub struct DeviceStore {
    db: Connection,
}

impl DeviceStore {
    /// Open an existing store read-only, e.g. as an export source
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        match Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY) {
            Ok(db) => Ok(DeviceStore { db }),
            Err(why) => Err(StoreError::CannotConnect(format!(
                "Unable to read device store at {}: {why}",
                path.display()
            ))),
        }
    }

    /// Open a store read-write, creating any missing tables, e.g. as an
    /// import destination
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        match Connection::open(path) {
            Ok(db) => {
                db.execute_batch(SCHEMA).map_err(StoreError::Sqlite)?;
                Ok(DeviceStore { db })
            }
            Err(why) => Err(StoreError::CannotConnect(format!(
                "Unable to open device store at {}: {why}",
                path.display()
            ))),
        }
    }

    /// Open a fresh in-memory store with the full schema
    pub fn open_in_memory() -> Result<Self, StoreError> {
        match Connection::open_in_memory() {
            Ok(db) => {
                db.execute_batch(SCHEMA).map_err(StoreError::Sqlite)?;
                Ok(DeviceStore { db })
            }
            Err(why) => Err(StoreError::CannotConnect(format!(
                "Unable to open in-memory device store: {why}"
            ))),
        }
    }

    /// Remove every row matching `selection` (or all rows) from a table
    pub fn delete(&self, table: &str, selection: Option<&str>) -> Result<usize, StoreError> {
        let mut sql = format!("DELETE FROM {table}");
        if let Some(clause) = selection.map(str::trim).filter(|clause| !clause.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        self.db.execute(&sql, []).map_err(StoreError::Sqlite)
    }

    /// Insert a row for test setup and seeding; columns beyond the record's
    /// fields are the store's to default
    pub fn seed(&self, table: &str, record: &Record) -> Result<i64, StoreError> {
        match self.insert_fields(table, record, &[])? {
            Some(id) => Ok(id),
            None => Err(StoreError::BadRowId(format!("empty seed row for {table}"))),
        }
    }

    fn table_columns(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let statement = self
            .db
            .prepare(&format!("SELECT * FROM {table} LIMIT 0"))
            .map_err(StoreError::Sqlite)?;
        Ok(statement
            .column_names()
            .iter()
            .map(|column| column.to_string())
            .collect())
    }

    fn count_rows(&self, table: &str, selection: Option<&str>) -> Result<u64, StoreError> {
        let mut sql = format!("SELECT COUNT(*) FROM {table}");
        if let Some(clause) = selection.map(str::trim).filter(|clause| !clause.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        self.db
            .query_row(&sql, [], |row| row.get::<_, i64>(0))
            .map(|count| count as u64)
            .map_err(StoreError::Sqlite)
    }

    fn visit_table(
        &self,
        table: &str,
        selection: Option<&str>,
        order_by: Option<&str>,
        visit: &mut RowVisitor,
    ) -> Result<(), StoreError> {
        let mut sql = format!("SELECT * FROM {table}");
        if let Some(clause) = selection.map(str::trim).filter(|clause| !clause.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        if let Some(order) = order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        let mut statement = self.db.prepare(&sql).map_err(StoreError::Sqlite)?;
        let columns: Vec<String> = statement
            .column_names()
            .iter()
            .map(|column| column.to_string())
            .collect();
        let mut rows = statement.query([]).map_err(StoreError::Sqlite)?;
        while let Some(row) = rows.next().map_err(StoreError::Sqlite)? {
            let record = record_from_row(row, &columns)?;
            if let Visit::Stop = visit(record)? {
                break;
            }
        }
        Ok(())
    }

    fn child_rows(
        &self,
        table: &str,
        key_column: &str,
        parent_id: &str,
        order_by: Option<&str>,
    ) -> Result<Vec<Record>, StoreError> {
        let mut sql = format!("SELECT * FROM {table} WHERE {key_column} = ?1");
        if let Some(order) = order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        let mut statement = self.db.prepare(&sql).map_err(StoreError::Sqlite)?;
        let columns: Vec<String> = statement
            .column_names()
            .iter()
            .map(|column| column.to_string())
            .collect();
        let mut rows = statement
            .query(params![parent_id])
            .map_err(StoreError::Sqlite)?;
        let mut found = Vec::new();
        while let Some(row) = rows.next().map_err(StoreError::Sqlite)? {
            found.push(record_from_row(row, &columns)?);
        }
        Ok(found)
    }

    fn insert_fields(
        &self,
        table: &str,
        record: &Record,
        extra: &[(&str, &dyn ToSql)],
    ) -> Result<Option<i64>, StoreError> {
        let fields: Vec<(&str, &str)> = record.fields().collect();
        let mut columns: Vec<&str> = Vec::new();
        let mut values: Vec<&dyn ToSql> = Vec::new();
        for (column, value) in &fields {
            columns.push(*column);
            values.push(value);
        }
        for &(column, value) in extra {
            columns.push(column);
            values.push(value);
        }
        if columns.is_empty() {
            return Ok(None);
        }
        let placeholders: Vec<String> = (1..=columns.len()).map(|index| format!("?{index}")).collect();
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        self.db
            .execute(&sql, params_from_iter(values))
            .map_err(StoreError::Sqlite)?;
        Ok(Some(self.db.last_insert_rowid()))
    }

    fn row_id(id: &str) -> Result<i64, StoreError> {
        id.parse::<i64>()
            .map_err(|_| StoreError::BadRowId(id.to_string()))
    }
}

impl MessageSource for DeviceStore {
    fn sms_count(&self, selection: Option<&str>) -> Result<u64, StoreError> {
        self.count_rows(SMS, selection)
    }

    fn visit_sms(&self, selection: Option<&str>, visit: &mut RowVisitor) -> Result<(), StoreError> {
        self.visit_table(SMS, selection, None, visit)
    }

    fn mms_count(&self, selection: Option<&str>) -> Result<u64, StoreError> {
        self.count_rows(MMS, selection)
    }

    fn visit_mms(&self, selection: Option<&str>, visit: &mut RowVisitor) -> Result<(), StoreError> {
        self.visit_table(MMS, selection, None, visit)
    }

    fn mms_addresses(&self, message_id: &str) -> Result<Vec<Record>, StoreError> {
        self.child_rows(MMS_ADDR, "msg_id", message_id, None)
    }

    fn mms_parts(&self, message_id: &str) -> Result<Vec<Record>, StoreError> {
        // Parts must come back in sequence order to preserve part ordering
        self.child_rows(MMS_PART, "mid", message_id, Some("seq ASC"))
    }

    fn part_data(&self, part_id: &str) -> Result<Vec<u8>, StoreError> {
        let row_id = Self::row_id(part_id)?;
        let mut blob = self
            .db
            .blob_open(DatabaseName::Main, PART_DATA, "data", row_id, true)
            .map_err(StoreError::Sqlite)?;
        let mut data = Vec::with_capacity(blob.size() as usize);
        blob.read_to_end(&mut data)
            .map_err(|why| StoreError::CannotConnect(format!("Failed to read part data: {why}")))?;
        Ok(data)
    }
}

impl MessageSink for DeviceStore {
    fn sms_columns(&self) -> Result<Vec<String>, StoreError> {
        self.table_columns(SMS)
    }

    fn mms_columns(&self) -> Result<Vec<String>, StoreError> {
        self.table_columns(MMS)
    }

    fn part_columns(&self) -> Result<Vec<String>, StoreError> {
        self.table_columns(MMS_PART)
    }

    fn insert_sms(&self, record: &Record) -> Result<Option<i64>, StoreError> {
        self.insert_fields(SMS, record, &[])
    }

    fn insert_mms(&self, record: &Record) -> Result<Option<i64>, StoreError> {
        self.insert_fields(MMS, record, &[])
    }

    fn insert_mms_address(
        &self,
        message_id: i64,
        record: &Record,
    ) -> Result<Option<i64>, StoreError> {
        self.insert_fields(MMS_ADDR, record, &[("msg_id", &message_id)])
    }

    fn insert_mms_part(&self, message_id: i64, record: &Record) -> Result<Option<i64>, StoreError> {
        self.insert_fields(MMS_PART, record, &[("mid", &message_id)])
    }

    fn write_part_data(&self, part_id: i64, data: &[u8]) -> Result<(), StoreError> {
        self.db
            .execute(
                &format!("INSERT OR REPLACE INTO {PART_DATA} (part_id, data) VALUES (?1, ZEROBLOB(?2))"),
                params![part_id, data.len() as i64],
            )
            .map_err(StoreError::Sqlite)?;
        let mut blob = self
            .db
            .blob_open(DatabaseName::Main, PART_DATA, "data", part_id, false)
            .map_err(StoreError::Sqlite)?;
        blob.write_all(data)
            .map_err(|why| StoreError::CannotConnect(format!("Failed to write part data: {why}")))?;
        drop(blob);
        // The store assigns the part's data reference when content is written,
        // so a later export sees which parts carry binary content
        self.db
            .execute(
                &format!("UPDATE {MMS_PART} SET _data = ?1 WHERE _id = ?2"),
                params![format!("part/{part_id}"), part_id],
            )
            .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    fn get_or_create_thread_id(&self, addresses: &BTreeSet<String>) -> Result<i64, StoreError> {
        // The key is the sorted participant set, so any ordering of the same
        // addresses resolves to the same thread
        let key = addresses
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>()
            .join("|");
        let existing: Option<i64> = self
            .db
            .query_row(
                &format!("SELECT _id FROM {THREADS} WHERE recipient_key = ?1"),
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::Sqlite)?;
        if let Some(id) = existing {
            return Ok(id);
        }
        self.db
            .execute(
                &format!("INSERT INTO {THREADS} (recipient_key) VALUES (?1)"),
                params![key],
            )
            .map_err(StoreError::Sqlite)?;
        Ok(self.db.last_insert_rowid())
    }

    fn sms_exists(
        &self,
        address: &str,
        kind: &str,
        date: &str,
        body: &str,
    ) -> Result<bool, StoreError> {
        let mut statement = self
            .db
            .prepare(&format!(
                "SELECT _id FROM {SMS} WHERE address = ?1 AND type = ?2 AND date = ?3 AND body = ?4"
            ))
            .map_err(StoreError::Sqlite)?;
        statement
            .exists(params![address, kind, date, body])
            .map_err(StoreError::Sqlite)
    }

    fn mms_exists(
        &self,
        date: &str,
        msg_box: &str,
        m_id: Option<&str>,
        content_location: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut sql = format!("SELECT _id FROM {MMS} WHERE date = ?1 AND msg_box = ?2");
        let mut values: Vec<&dyn ToSql> = vec![&date, &msg_box];
        if let Some(m_id) = &m_id {
            sql.push_str(" AND m_id = ?3");
            values.push(m_id);
        } else if let Some(location) = &content_location {
            sql.push_str(" AND ct_l = ?3");
            values.push(location);
        }
        let mut statement = self.db.prepare(&sql).map_err(StoreError::Sqlite)?;
        statement
            .exists(params_from_iter(values))
            .map_err(StoreError::Sqlite)
    }
}

impl CallSource for DeviceStore {
    fn call_count(&self) -> Result<u64, StoreError> {
        self.count_rows(CALLS, None)
    }

    fn visit_calls(&self, visit: &mut RowVisitor) -> Result<(), StoreError> {
        self.visit_table(CALLS, None, None, visit)
    }
}

impl CallSink for DeviceStore {
    fn call_columns(&self) -> Result<Vec<String>, StoreError> {
        self.table_columns(CALLS)
    }

    fn insert_call(&self, record: &Record) -> Result<Option<i64>, StoreError> {
        self.insert_fields(CALLS, record, &[])
    }

    fn call_exists(&self, number: &str, kind: &str, date: &str) -> Result<bool, StoreError> {
        let mut statement = self
            .db
            .prepare(&format!(
                "SELECT _id FROM {CALLS} WHERE number = ?1 AND type = ?2 AND date = ?3"
            ))
            .map_err(StoreError::Sqlite)?;
        statement
            .exists(params![number, kind, date])
            .map_err(StoreError::Sqlite)
    }
}

impl ContactSource for DeviceStore {
    fn contact_count(&self) -> Result<u64, StoreError> {
        self.count_rows(CONTACTS, None)
    }

    fn visit_contacts(&self, visit: &mut RowVisitor) -> Result<(), StoreError> {
        self.visit_table(CONTACTS, None, None, visit)
    }

    fn raw_contacts(&self, contact_id: &str) -> Result<Vec<Record>, StoreError> {
        self.child_rows(RAW_CONTACTS_TABLE, "contact_id", contact_id, None)
    }

    fn contact_data(&self, raw_contact_id: &str) -> Result<Vec<Record>, StoreError> {
        self.child_rows(CONTACT_DATA, "raw_contact_id", raw_contact_id, None)
    }
}

impl ContactSink for DeviceStore {
    fn contact_data_columns(&self) -> Result<Vec<String>, StoreError> {
        self.table_columns(CONTACT_DATA)
    }

    fn insert_raw_contact(&self) -> Result<Option<i64>, StoreError> {
        self.db
            .execute(
                &format!("INSERT INTO {RAW_CONTACTS_TABLE} DEFAULT VALUES"),
                [],
            )
            .map_err(StoreError::Sqlite)?;
        Ok(Some(self.db.last_insert_rowid()))
    }

    fn insert_contact_data(
        &self,
        raw_contact_id: i64,
        record: &Record,
    ) -> Result<Option<i64>, StoreError> {
        // The blob side channel lands in the schema's blob column
        match record.binary() {
            Some(data) => {
                let mut scalars = record.clone();
                scalars.remove("data15");
                self.insert_fields(
                    CONTACT_DATA,
                    &scalars,
                    &[("raw_contact_id", &raw_contact_id), ("data15", &data)],
                )
            }
            None => {
                self.insert_fields(CONTACT_DATA, record, &[("raw_contact_id", &raw_contact_id)])
            }
        }
    }
}

impl BlockedNumberSource for DeviceStore {
    fn blocked_count(&self) -> Result<u64, StoreError> {
        self.count_rows(BLOCKED_NUMBERS, None)
    }

    fn visit_blocked_numbers(&self, visit: &mut RowVisitor) -> Result<(), StoreError> {
        self.visit_table(BLOCKED_NUMBERS, None, None, visit)
    }
}

impl BlockedNumberSink for DeviceStore {
    fn blocked_number_columns(&self) -> Result<Vec<String>, StoreError> {
        self.table_columns(BLOCKED_NUMBERS)
    }

    fn insert_blocked_number(&self, record: &Record) -> Result<Option<i64>, StoreError> {
        self.insert_fields(BLOCKED_NUMBERS, record, &[])
    }
}

impl ContactLookup for DeviceStore {
    fn display_name(&self, address: &str) -> Result<Option<String>, StoreError> {
        self.db
            .query_row(
                &format!(
                    "SELECT c.display_name FROM {CONTACT_DATA} d \
                     JOIN {RAW_CONTACTS_TABLE} r ON d.raw_contact_id = r._id \
                     JOIN {CONTACTS} c ON r.contact_id = c._id \
                     WHERE d.mimetype = ?1 AND d.data1 = ?2 AND c.display_name NOT NULL \
                     LIMIT 1"
                ),
                params![MIMETYPE_PHONE, address],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }
}
