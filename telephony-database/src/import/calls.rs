/*!
 The call log import reconciler.

 Flat replay with projection: internal columns are stripped, rows without a
 number and voicemail entries are skipped, and optional deduplication matches
 on the (number, type, date) tuple.
*/

use std::io::BufRead;

use tracing::{debug, info, warn};

use crate::{
    cancel::CancelToken,
    codec::{convert, JsonArrayReader},
    error::import::ImportError,
    options::ImportOptions,
    progress::{FamilyTotal, Progress},
    record::VOICEMAIL_TYPE,
    schema::{SchemaSet, CALL_EXCLUDED_COLUMNS},
    store::CallSink,
};

/// Import call log entries from a JSON array document
pub fn import_call_log<S, R>(
    store: &S,
    input: R,
    options: &ImportOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<FamilyTotal, ImportError>
where
    S: CallSink,
    R: BufRead,
{
    info!("Importing call log");
    let schema = SchemaSet::new(store.call_columns()?, CALL_EXCLUDED_COLUMNS);
    let mut total = FamilyTotal::default();
    let mut prog = Progress::indeterminate();
    prog.set_message("Importing call log".to_string());
    progress(prog.clone());

    for element in JsonArrayReader::new(input) {
        let element = element.map_err(ImportError::Codec)?;
        if cancel.is_cancelled() {
            total.cancelled = true;
            break;
        }
        if Some(total.count) == options.max_records {
            debug!("Skipping call record");
            continue;
        }
        let mut record = convert::record_from_json(element).map_err(ImportError::Codec)?;
        record.project(&schema);
        if !record.contains("number") || record.get("type") == Some(VOICEMAIL_TYPE) {
            continue;
        }
        if options.deduplication {
            match store.call_exists(
                record.get_or_empty("number"),
                record.get_or_empty("type"),
                record.get_or_empty("date"),
            ) {
                Ok(true) => {
                    debug!("Duplicate call - skipping");
                    continue;
                }
                Ok(false) => {}
                Err(why) => {
                    warn!("Call duplicate check failed: {why}");
                    continue;
                }
            }
        }
        match store.insert_call(&record) {
            Ok(Some(_)) => {
                total.count += 1;
                prog.advance(format!("Imported {} calls", total.count));
                progress(prog.clone());
            }
            Ok(None) => warn!("Call insert failed!"),
            Err(why) => warn!("Call insert failed: {why}"),
        }
    }
    Ok(total)
}
