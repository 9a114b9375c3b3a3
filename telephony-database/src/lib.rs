/*!
 This library serializes a device telephony store (SMS and MMS messages, call
 log, contacts, blocked numbers) to portable JSON / NDJSON documents and
 reconstructs a store from them.

 The export walkers stream rows out of a [`store::MessageSource`]-style trait
 and assemble nested records; the import reconcilers replay records against a
 [`store::MessageSink`]-style trait, filtering unknown columns, remapping
 conversation identifiers, and tolerating per-record failures. The
 [`store::device::DeviceStore`] is the bundled SQLite implementation of those
 traits.
*/

pub mod cancel;
pub mod codec;
pub mod error;
pub mod export;
pub mod import;
pub mod options;
pub mod progress;
pub mod record;
pub mod schema;
pub mod store;
pub mod util;

pub use {
    cancel::CancelToken,
    export::{export_blocked_numbers, export_call_log, export_contacts, export_messages},
    import::{import_blocked_numbers, import_call_log, import_contacts, import_messages},
    options::{ExportOptions, ImportOptions},
    progress::{FamilyTotal, MessageTotals, Progress},
    record::{ContactRecord, MessageRecord, RawContact, Record},
    schema::SchemaSet,
    store::device::DeviceStore,
};
