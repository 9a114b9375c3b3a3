/*!
 Errors that can happen when importing data into a device store
*/

use std::fmt::{Display, Formatter, Result};

use crate::error::{codec::CodecError, store::StoreError};

/// Errors that can happen when importing data into a device store
#[derive(Debug)]
pub enum ImportError {
    Store(StoreError),
    Codec(CodecError),
    Io(std::io::Error),
    Zip(zip::result::ZipError),
    MissingArchiveEntry(String),
}

impl Display for ImportError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            ImportError::Store(why) => write!(fmt, "{why}"),
            ImportError::Codec(why) => write!(fmt, "{why}"),
            ImportError::Io(why) => write!(fmt, "Failed to read import file: {why}"),
            ImportError::Zip(why) => write!(fmt, "Failed to read archive: {why}"),
            ImportError::MissingArchiveEntry(name) => write!(
                fmt,
                "Can't find `{name}`; make sure the provided file is a zip archive in the correct format"
            ),
        }
    }
}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        ImportError::Store(err)
    }
}

impl From<CodecError> for ImportError {
    fn from(err: CodecError) -> Self {
        ImportError::Codec(err)
    }
}
