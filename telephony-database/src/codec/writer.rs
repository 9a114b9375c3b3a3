/*!
 The forward-only document writer.

 Emits a 2-space indented JSON array one record at a time. Only the record
 currently being written is held in memory; everything already emitted has
 been handed to the underlying writer.
*/

use std::io::Write;

use serde_json::{Map, Value};

use crate::{
    codec::convert::{contact_to_json, message_to_json, record_to_json},
    error::codec::CodecError,
    record::{ContactRecord, MessageRecord, Record},
};

/// Streams records into a JSON array on the underlying writer
#[derive(Debug)]
pub struct JsonArrayWriter<W: Write> {
    out: W,
    started: bool,
    wrote_element: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn new(out: W) -> Self {
        JsonArrayWriter {
            out,
            started: false,
            wrote_element: false,
        }
    }

    /// Append one object to the array
    pub fn write_object(&mut self, object: &Map<String, Value>) -> Result<(), CodecError> {
        let rendered = serde_json::to_string_pretty(object).map_err(CodecError::Parse)?;
        if !self.started {
            self.out.write_all(b"[").map_err(CodecError::Io)?;
            self.started = true;
        }
        if self.wrote_element {
            self.out.write_all(b",").map_err(CodecError::Io)?;
        }
        self.out.write_all(b"\n  ").map_err(CodecError::Io)?;
        // Shift the rendered object one level deeper; JSON escapes newlines
        // inside strings, so every raw newline here is formatting
        self.out
            .write_all(rendered.replace('\n', "\n  ").as_bytes())
            .map_err(CodecError::Io)?;
        self.wrote_element = true;
        Ok(())
    }

    pub fn write_record(&mut self, record: &Record) -> Result<(), CodecError> {
        self.write_object(&record_to_json(record))
    }

    pub fn write_message(&mut self, message: &MessageRecord) -> Result<(), CodecError> {
        self.write_object(&message_to_json(message))
    }

    pub fn write_contact(&mut self, contact: &ContactRecord) -> Result<(), CodecError> {
        self.write_object(&contact_to_json(contact))
    }

    /// Close the array and flush the underlying writer
    pub fn finish(&mut self) -> Result<(), CodecError> {
        if !self.started {
            self.out.write_all(b"[]").map_err(CodecError::Io)?;
            self.started = true;
        } else if self.wrote_element {
            self.out.write_all(b"\n]").map_err(CodecError::Io)?;
        } else {
            self.out.write_all(b"]").map_err(CodecError::Io)?;
        }
        self.out.flush().map_err(CodecError::Io)
    }
}
