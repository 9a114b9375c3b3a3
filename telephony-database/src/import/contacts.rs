/*!
 The contact import reconciler.

 Each imported raw contact becomes a fresh raw contact row with no account
 affiliation; its data rows follow with the new raw contact identifier
 back-referenced and any binary payload restored to the blob column. The
 contact aggregate itself is the destination's to rebuild.
*/

use std::io::BufRead;

use tracing::{debug, info, warn};

use crate::{
    cancel::CancelToken,
    codec::{convert, JsonArrayReader},
    error::import::ImportError,
    options::ImportOptions,
    progress::{FamilyTotal, Progress},
    schema::{SchemaSet, CONTACT_DATA_EXCLUDED_COLUMNS},
    store::ContactSink,
};

/// Import contacts from a JSON array document.
///
/// The returned count is the number of raw contacts recreated.
pub fn import_contacts<S, R>(
    store: &S,
    input: R,
    options: &ImportOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<FamilyTotal, ImportError>
where
    S: ContactSink,
    R: BufRead,
{
    info!("Importing contacts");
    let schema = SchemaSet::new(store.contact_data_columns()?, CONTACT_DATA_EXCLUDED_COLUMNS);
    let mut total = FamilyTotal::default();
    let mut prog = Progress::indeterminate();
    prog.set_message("Importing contacts".to_string());
    progress(prog.clone());

    for element in JsonArrayReader::new(input) {
        let element = element.map_err(ImportError::Codec)?;
        if cancel.is_cancelled() {
            total.cancelled = true;
            break;
        }
        if Some(total.count) == options.max_records {
            debug!("Skipping contact record");
            continue;
        }
        let contact = convert::contact_from_json(element).map_err(ImportError::Codec)?;
        for raw in contact.raw_contacts {
            if Some(total.count) == options.max_records {
                break;
            }
            let raw_id = match store.insert_raw_contact() {
                Ok(Some(id)) => id,
                Ok(None) => {
                    warn!("Raw contact insert failed!");
                    continue;
                }
                Err(why) => {
                    warn!("Raw contact insert failed: {why}");
                    continue;
                }
            };
            for mut data in raw.data {
                data.project(&schema);
                match store.insert_contact_data(raw_id, &data) {
                    Ok(Some(_)) => {}
                    Ok(None) => warn!("Contact data insert failed!"),
                    Err(why) => warn!("Contact data insert failed: {why}"),
                }
            }
            total.count += 1;
            prog.advance(format!("Imported {} contacts", total.count));
            progress(prog.clone());
        }
    }
    Ok(total)
}
