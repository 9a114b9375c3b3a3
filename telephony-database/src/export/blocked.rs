/*!
 The blocked number export walker.

 Flat records, no enrichment, framed as one JSON object per line inside a zip
 archive entry.
*/

use std::io::{Seek, Write};

use tracing::info;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{
    cancel::CancelToken,
    codec::{ndjson, BLOCKED_NUMBERS_ENTRY},
    error::export::ExportError,
    options::ExportOptions,
    progress::{FamilyTotal, Progress},
    store::{BlockedNumberSource, Visit},
};

/// Export blocked numbers as NDJSON lines inside a zip archive
pub fn export_blocked_numbers<S, W>(
    store: &S,
    out: W,
    options: &ExportOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<FamilyTotal, ExportError>
where
    S: BlockedNumberSource,
    W: Write + Seek,
{
    info!("Exporting blocked numbers");
    let mut zip = ZipWriter::new(out);
    zip.start_file(
        BLOCKED_NUMBERS_ENTRY,
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
    )
    .map_err(ExportError::Zip)?;

    let total = store.blocked_count()?;
    let mut prog = Progress::new(total);
    progress(prog.clone());

    let mut count = 0u64;
    let mut cancelled = false;
    let mut failure: Option<ExportError> = None;
    store.visit_blocked_numbers(&mut |record| {
        if cancel.is_cancelled() {
            cancelled = true;
            return Ok(Visit::Stop);
        }
        if let Err(why) = ndjson::write_line(&mut zip, &record) {
            failure = Some(ExportError::Codec(why));
            return Ok(Visit::Stop);
        }
        count += 1;
        prog.advance(format!("Exported {count} of {total} blocked numbers"));
        progress(prog.clone());
        if Some(count) == options.max_records {
            return Ok(Visit::Stop);
        }
        Ok(Visit::Continue)
    })?;

    if let Some(why) = failure {
        return Err(why);
    }
    let mut inner = zip.finish().map_err(ExportError::Zip)?;
    inner.flush().map_err(ExportError::Io)?;
    Ok(FamilyTotal { count, cancelled })
}
