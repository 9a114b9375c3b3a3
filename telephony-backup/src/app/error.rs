/*!
Errors that can happen during the application's runtime
*/

use std::fmt::{Display, Formatter, Result};

use telephony_database::error::{
    export::ExportError, import::ImportError, store::StoreError,
};

/// Errors that can happen during the application's runtime
#[derive(Debug)]
pub enum RuntimeError {
    InvalidOptions(String),
    DatabaseError(StoreError),
    ExportError(ExportError),
    ImportError(ImportError),
    DiskError(std::io::Error),
}

impl Display for RuntimeError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            RuntimeError::InvalidOptions(why) => write!(fmt, "Invalid options!\n{why}"),
            RuntimeError::DatabaseError(why) => write!(fmt, "{why}"),
            RuntimeError::ExportError(why) => write!(fmt, "{why}"),
            RuntimeError::ImportError(why) => write!(fmt, "{why}"),
            RuntimeError::DiskError(why) => write!(fmt, "{why}"),
        }
    }
}
