/*!
 Newline-delimited JSON framing for records inside an archive entry.

 The blocked numbers export stores one compact JSON object per line in a zip
 entry; each line stands alone and round-trips independently of its siblings.
*/

use std::io::Write;

use serde_json::{Map, Value};

use crate::{
    codec::convert::record_to_json,
    error::codec::CodecError,
    record::Record,
};

/// Name of the archive entry holding the blocked number lines
pub const BLOCKED_NUMBERS_ENTRY: &str = "blocked_numbers.ndjson";

/// Write one record as a compact JSON object followed by a newline
pub fn write_line<W: Write>(out: &mut W, record: &Record) -> Result<(), CodecError> {
    serde_json::to_writer(&mut *out, &Value::Object(record_to_json(record)))
        .map_err(CodecError::Parse)?;
    out.write_all(b"\n").map_err(CodecError::Io)
}

/// Parse one NDJSON line into its raw object form
pub fn parse_line(line: &str) -> Result<Map<String, Value>, CodecError> {
    match serde_json::from_str::<Value>(line).map_err(CodecError::Parse)? {
        Value::Object(map) => Ok(map),
        _ => Err(CodecError::NotAnObject("line".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        codec::{
            convert::record_from_json,
            ndjson::{parse_line, write_line},
        },
        record::Record,
    };

    fn sample_record() -> Record {
        let mut record = Record::new();
        record.insert("original_number", "555-867-5309");
        record.insert("e164_number", "+15558675309");
        record
    }

    #[test]
    fn lines_round_trip() {
        let record = sample_record();
        let mut out = Vec::new();
        write_line(&mut out, &record).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert!(!text.trim_end().contains('\n'));

        let parsed = record_from_json(parse_line(text.trim_end()).unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn rejects_non_object_line() {
        assert!(parse_line("[1, 2]").is_err());
        assert!(parse_line("not json").is_err());
    }
}
