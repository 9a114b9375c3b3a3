/*!
 The contact export walker.

 Three-level nesting: each contact row is joined with its raw contact rows,
 and each raw contact with its data rows. Blob-valued data columns surface as
 the data record's binary payload and are embedded as base64.
*/

use std::io::Write;

use tracing::info;

use crate::{
    cancel::CancelToken,
    codec::JsonArrayWriter,
    error::{export::ExportError, store::StoreError},
    options::ExportOptions,
    progress::{FamilyTotal, Progress},
    record::{ContactRecord, RawContact, Record},
    store::{ContactSource, Visit},
};

/// Join one contact row with its raw contact and data rows
fn assemble_contact<S: ContactSource>(
    store: &S,
    record: Record,
) -> Result<ContactRecord, StoreError> {
    let contact_id = record.get("_id").map(str::to_string);
    let mut contact = ContactRecord::new(record);
    let Some(contact_id) = contact_id else {
        return Ok(contact);
    };
    for raw_record in store.raw_contacts(&contact_id)? {
        let raw_id = raw_record.get("_id").map(str::to_string);
        let mut raw = RawContact::new(raw_record);
        if let Some(raw_id) = raw_id {
            raw.data = store.contact_data(&raw_id)?;
        }
        contact.raw_contacts.push(raw);
    }
    Ok(contact)
}

/// Export contacts as a JSON array of nested contact objects
pub fn export_contacts<S, W>(
    store: &S,
    out: W,
    options: &ExportOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<FamilyTotal, ExportError>
where
    S: ContactSource,
    W: Write,
{
    info!("Exporting contacts");
    let mut writer = JsonArrayWriter::new(out);

    let total = store.contact_count()?;
    let mut prog = Progress::new(total);
    progress(prog.clone());

    let mut count = 0u64;
    let mut cancelled = false;
    let mut failure: Option<ExportError> = None;
    store.visit_contacts(&mut |record| {
        if cancel.is_cancelled() {
            cancelled = true;
            return Ok(Visit::Stop);
        }
        let contact = match assemble_contact(store, record) {
            Ok(contact) => contact,
            Err(why) => {
                failure = Some(ExportError::Store(why));
                return Ok(Visit::Stop);
            }
        };
        if let Err(why) = writer.write_contact(&contact) {
            failure = Some(ExportError::Codec(why));
            return Ok(Visit::Stop);
        }
        count += 1;
        prog.advance(format!("Exported {count} of {total} contacts"));
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
