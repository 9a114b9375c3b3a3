/*!
 Errors that can happen when exporting data from a device store
*/

use std::fmt::{Display, Formatter, Result};

use crate::error::{codec::CodecError, store::StoreError};

/// Errors that can happen when exporting data from a device store
#[derive(Debug)]
pub enum ExportError {
    Store(StoreError),
    Codec(CodecError),
    Io(std::io::Error),
    Zip(zip::result::ZipError),
}

impl Display for ExportError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            ExportError::Store(why) => write!(fmt, "{why}"),
            ExportError::Codec(why) => write!(fmt, "{why}"),
            ExportError::Io(why) => write!(fmt, "Failed to write export file: {why}"),
            ExportError::Zip(why) => write!(fmt, "Failed to write archive: {why}"),
        }
    }
}

impl From<StoreError> for ExportError {
    fn from(err: StoreError) -> Self {
        ExportError::Store(err)
    }
}

impl From<CodecError> for ExportError {
    fn from(err: CodecError) -> Self {
        ExportError::Codec(err)
    }
}
