/*!
 Errors that can happen when reading from or writing to a device store
*/

use std::fmt::{Display, Formatter, Result};

/// Errors that can happen when reading from or writing to a device store
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    CannotConnect(String),
    BadRowId(String),
}

impl Display for StoreError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            StoreError::Sqlite(why) => write!(fmt, "Database error: {why}"),
            StoreError::CannotConnect(why) => write!(fmt, "{why}"),
            StoreError::BadRowId(why) => write!(fmt, "Invalid row identifier: {why}"),
        }
    }
}
