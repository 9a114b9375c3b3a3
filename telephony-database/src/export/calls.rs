/*!
 The call log export walker.

 Flat row-to-record mapping plus a resolved display name for the caller
 number. The call log's own cached name column may be stale, so the current
 resolution is attached alongside it.
*/

use std::io::Write;

use tracing::info;

use crate::{
    cancel::CancelToken,
    codec::JsonArrayWriter,
    error::export::ExportError,
    options::ExportOptions,
    progress::{FamilyTotal, Progress},
    record::DISPLAY_NAME,
    store::{CallSource, ContactLookup, Visit},
    util::names::DisplayNameCache,
};

/// Export the call log as a JSON array
pub fn export_call_log<S, W>(
    store: &S,
    out: W,
    options: &ExportOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<FamilyTotal, ExportError>
where
    S: CallSource + ContactLookup,
    W: Write,
{
    info!("Exporting call log");
    let mut writer = JsonArrayWriter::new(out);
    let mut names = DisplayNameCache::new();

    let total = store.call_count()?;
    let mut prog = Progress::new(total);
    progress(prog.clone());

    let mut count = 0u64;
    let mut cancelled = false;
    let mut failure: Option<ExportError> = None;
    store.visit_calls(&mut |mut record| {
        if cancel.is_cancelled() {
            cancelled = true;
            return Ok(Visit::Stop);
        }
        let number = record.get("number").map(str::to_string);
        if let Some(number) = number {
            if let Some(name) = names.resolve(store, &number) {
                record.insert(DISPLAY_NAME, name);
            }
        }
        if let Err(why) = writer.write_record(&record) {
            failure = Some(ExportError::Codec(why));
            return Ok(Visit::Stop);
        }
        count += 1;
        prog.advance(format!("Exported {count} of {total} calls"));
        progress(prog.clone());
        if Some(count) == options.max_records {
            return Ok(Visit::Stop);
        }
        Ok(Visit::Continue)
    })?;

    if let Some(why) = failure {
        return Err(why);
    }
    writer.finish()?;
    Ok(FamilyTotal { count, cancelled })
}
