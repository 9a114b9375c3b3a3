/*!
 Errors that can happen when encoding or decoding backup documents
*/

use std::fmt::{Display, Formatter, Result};

/// Errors that can happen when encoding or decoding backup documents
#[derive(Debug)]
pub enum CodecError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    NotAnArray,
    NotAnObject(String),
    UnexpectedByte(char),
    UnexpectedEof,
    Base64(base64::DecodeError),
}

impl Display for CodecError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            CodecError::Io(why) => write!(fmt, "Failed to read document: {why}"),
            CodecError::Parse(why) => write!(fmt, "Error parsing JSON: {why}"),
            CodecError::NotAnArray => {
                write!(fmt, "Expected a JSON array at the top level of the document")
            }
            CodecError::NotAnObject(key) => {
                write!(fmt, "Expected a JSON object under `{key}`")
            }
            CodecError::UnexpectedByte(byte) => {
                write!(fmt, "Unexpected character in document: `{byte}`")
            }
            CodecError::UnexpectedEof => write!(fmt, "Document ended unexpectedly"),
            CodecError::Base64(why) => write!(fmt, "Invalid base64 binary data: {why}"),
        }
    }
}
