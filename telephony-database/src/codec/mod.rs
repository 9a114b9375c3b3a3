/*!
 The streaming document codec.

 Serializes sequences of records as a 2-space indented JSON array (messages,
 call log, contacts) or as newline-delimited JSON objects (blocked numbers),
 and parses the same shapes back, one record at a time. Neither direction ever
 materializes the whole document: the writer holds at most one assembled
 record, the reader is a forward-only cursor over the byte stream.
*/

pub mod convert;
pub mod ndjson;
pub mod reader;
pub mod writer;

pub use ndjson::BLOCKED_NUMBERS_ENTRY;
pub use reader::JsonArrayReader;
pub use writer::JsonArrayWriter;
