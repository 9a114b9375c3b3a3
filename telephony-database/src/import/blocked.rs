/*!
 The blocked number import reconciler.

 Reads NDJSON lines from the archive's `blocked_numbers.ndjson` entry. An
 archive without that entry is rejected with a distinguished error; a
 malformed line is fatal like any other parse error.
*/

use std::io::{BufRead, BufReader, Read, Seek};

use tracing::{debug, info, warn};
use zip::{result::ZipError, ZipArchive};

use crate::{
    cancel::CancelToken,
    codec::{convert, ndjson, BLOCKED_NUMBERS_ENTRY},
    error::import::ImportError,
    options::ImportOptions,
    progress::{FamilyTotal, Progress},
    schema::{SchemaSet, BLOCKED_EXCLUDED_COLUMNS},
    store::BlockedNumberSink,
};

/// Import blocked numbers from a zip archive
pub fn import_blocked_numbers<S, R>(
    store: &S,
    input: R,
    options: &ImportOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<FamilyTotal, ImportError>
where
    S: BlockedNumberSink,
    R: Read + Seek,
{
    let schema = SchemaSet::new(store.blocked_number_columns()?, BLOCKED_EXCLUDED_COLUMNS);
    let mut archive = ZipArchive::new(input).map_err(ImportError::Zip)?;
    let entry = match archive.by_name(BLOCKED_NUMBERS_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(ImportError::MissingArchiveEntry(
                BLOCKED_NUMBERS_ENTRY.to_string(),
            ));
        }
        Err(why) => return Err(ImportError::Zip(why)),
    };

    info!("Importing blocked numbers");
    let mut total = FamilyTotal::default();
    let mut prog = Progress::indeterminate();
    prog.set_message("Importing blocked numbers".to_string());
    progress(prog.clone());

    for line in BufReader::new(entry).lines() {
        let line = line.map_err(ImportError::Io)?;
        if line.trim().is_empty() {
            continue;
        }
        if Some(total.count) == options.max_records {
            debug!("Skipping blocked number record");
            continue;
        }
        if cancel.is_cancelled() {
            total.cancelled = true;
            break;
        }
        let mut record = convert::record_from_json(ndjson::parse_line(&line)?)
            .map_err(ImportError::Codec)?;
        record.project(&schema);
        match store.insert_blocked_number(&record) {
            Ok(Some(_)) => {
                total.count += 1;
                prog.advance(format!("Imported {} blocked numbers", total.count));
                progress(prog.clone());
            }
            Ok(None) => warn!("Blocked number insert failed!"),
            Err(why) => warn!("Blocked number insert failed: {why}"),
        }
    }
    Ok(total)
}
