/*!
 The message import reconciler.

 Replays a message document against the device store. Each element is
 classified as SMS or MMS by its `m_type` marker, projected against the
 destination's column set, rethreaded through the run's conversation
 identifier map, optionally deduplicated, and inserted parent-first with MMS
 address and part rows following under the new parent identifier.
*/

use std::{
    collections::{BTreeSet, HashMap},
    io::BufRead,
};

use tracing::{debug, info, warn};

use crate::{
    cancel::CancelToken,
    codec::{convert, JsonArrayReader},
    error::import::ImportError,
    options::ImportOptions,
    progress::{MessageTotals, Progress},
    record::{MessageRecord, Record, THREAD_ID},
    schema::{SchemaSet, ADDRESS_EXCLUDED_KEYS, MESSAGE_EXCLUDED_COLUMNS, PART_EXCLUDED_COLUMNS},
    store::MessageSink,
};

/// Import SMS and MMS messages from a JSON array document.
///
/// Returns the per-family counts of successfully inserted parent rows;
/// `cancelled` is set when the run stopped on a cancellation request. A parse
/// error aborts the run; whatever was inserted before it remains.
pub fn import_messages<S, R>(
    store: &S,
    input: R,
    options: &ImportOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<MessageTotals, ImportError>
where
    S: MessageSink,
    R: BufRead,
{
    info!("Importing messages");
    let sms_schema = SchemaSet::new(store.sms_columns()?, MESSAGE_EXCLUDED_COLUMNS);
    let mms_schema = SchemaSet::new(store.mms_columns()?, MESSAGE_EXCLUDED_COLUMNS);
    let part_schema = SchemaSet::new(store.part_columns()?, PART_EXCLUDED_COLUMNS);

    let mut thread_ids: HashMap<String, String> = HashMap::new();
    let mut totals = MessageTotals::default();
    let mut prog = Progress::indeterminate();
    prog.set_message("Importing messages".to_string());
    progress(prog.clone());

    for element in JsonArrayReader::new(input) {
        let element = element.map_err(ImportError::Codec)?;
        if cancel.is_cancelled() {
            totals.cancelled = true;
            break;
        }
        let message = convert::message_from_json(element).map_err(ImportError::Codec)?;
        if message.is_mms() {
            import_mms(
                store,
                message,
                &mms_schema,
                &part_schema,
                &mut thread_ids,
                options,
                &mut totals,
                &mut prog,
                progress,
            );
        } else {
            import_sms(
                store,
                message,
                &sms_schema,
                &mut thread_ids,
                options,
                &mut totals,
                &mut prog,
                progress,
            );
        }
    }
    Ok(totals)
}

/// Resolve the record's conversation identifier.
///
/// A source thread id already seen this run maps to its recorded destination
/// id. Otherwise the store assigns one for the participant set, and the
/// source-to-destination mapping is recorded so every later message sharing
/// the source id lands in the same conversation.
fn resolve_thread_id<S: MessageSink>(
    store: &S,
    metadata: &mut Record,
    old_thread_id: Option<String>,
    participants: &BTreeSet<String>,
    thread_ids: &mut HashMap<String, String>,
) -> bool {
    let mapped = old_thread_id
        .as_ref()
        .and_then(|old| thread_ids.get(old).cloned());
    match mapped {
        Some(mapped) => metadata.insert(THREAD_ID, mapped),
        None => {
            let new_thread_id = match store.get_or_create_thread_id(participants) {
                Ok(id) => id,
                Err(why) => {
                    warn!("Failed to assign a thread for imported message: {why}");
                    return false;
                }
            };
            metadata.insert(THREAD_ID, new_thread_id.to_string());
            if let Some(old) = old_thread_id {
                if !old.is_empty() {
                    thread_ids.insert(old, new_thread_id.to_string());
                }
            }
        }
    }
    true
}

#[allow(clippy::too_many_arguments)]
fn import_sms<S: MessageSink>(
    store: &S,
    message: MessageRecord,
    schema: &SchemaSet,
    thread_ids: &mut HashMap<String, String>,
    options: &ImportOptions,
    totals: &mut MessageTotals,
    prog: &mut Progress,
    progress: &mut dyn FnMut(Progress),
) {
    if !options.sms || Some(totals.sms) == options.max_records {
        debug!("Skipping SMS record");
        return;
    }
    let mut metadata = message.metadata;
    if options.deduplication {
        match store.sms_exists(
            metadata.get_or_empty("address"),
            metadata.get_or_empty("type"),
            metadata.get_or_empty("date"),
            metadata.get_or_empty("body"),
        ) {
            Ok(true) => {
                debug!("Duplicate SMS - skipping");
                return;
            }
            Ok(false) => {}
            Err(why) => {
                warn!("SMS duplicate check failed: {why}");
                return;
            }
        }
    }

    let old_thread_id = metadata.get(THREAD_ID).map(str::to_string);
    metadata.project(schema);

    let mut participants = BTreeSet::new();
    if let Some(address) = metadata.get("address") {
        participants.insert(address.to_string());
    }
    if !resolve_thread_id(store, &mut metadata, old_thread_id, &participants, thread_ids) {
        return;
    }

    match store.insert_sms(&metadata) {
        Ok(Some(_)) => {
            totals.sms += 1;
            prog.advance(format!(
                "Imported {} SMS and {} MMS messages",
                totals.sms, totals.mms
            ));
            progress(prog.clone());
        }
        Ok(None) => warn!("SMS insert failed!"),
        Err(why) => warn!("SMS insert failed: {why}"),
    }
}

#[allow(clippy::too_many_arguments)]
fn import_mms<S: MessageSink>(
    store: &S,
    message: MessageRecord,
    schema: &SchemaSet,
    part_schema: &SchemaSet,
    thread_ids: &mut HashMap<String, String>,
    options: &ImportOptions,
    totals: &mut MessageTotals,
    prog: &mut Progress,
    progress: &mut dyn FnMut(Progress),
) {
    if !options.mms || Some(totals.mms) == options.max_records {
        debug!("Skipping MMS record");
        return;
    }
    let MessageRecord {
        mut metadata,
        sender_address,
        recipient_addresses,
        parts,
    } = message;

    if options.deduplication {
        let m_id = metadata.get("m_id").filter(|value| !value.is_empty());
        let content_location = metadata.get("ct_l").filter(|value| !value.is_empty());
        match store.mms_exists(
            metadata.get_or_empty("date"),
            metadata.get_or_empty("msg_box"),
            m_id,
            content_location,
        ) {
            Ok(true) => {
                debug!("Duplicate MMS - skipping");
                return;
            }
            Ok(false) => {}
            Err(why) => {
                warn!("MMS duplicate check failed: {why}");
                return;
            }
        }
    }

    // Merge the sender and recipients into one address set
    let mut addresses: Vec<Record> = Vec::new();
    if let Some(mut sender) = sender_address {
        sender.strip(ADDRESS_EXCLUDED_KEYS);
        if !addresses.contains(&sender) {
            addresses.push(sender);
        }
    }
    for mut recipient in recipient_addresses {
        recipient.strip(ADDRESS_EXCLUDED_KEYS);
        if !addresses.contains(&recipient) {
            addresses.push(recipient);
        }
    }

    let old_thread_id = metadata.get(THREAD_ID).map(str::to_string);
    metadata.project(schema);

    let participants: BTreeSet<String> = addresses
        .iter()
        .filter_map(|address| address.get("address"))
        .map(str::to_string)
        .collect();
    if !resolve_thread_id(store, &mut metadata, old_thread_id, &participants, thread_ids) {
        return;
    }

    let message_id = match store.insert_mms(&metadata) {
        Ok(Some(id)) => id,
        Ok(None) => {
            warn!("MMS insert failed!");
            return;
        }
        Err(why) => {
            warn!("MMS insert failed: {why}");
            return;
        }
    };
    totals.mms += 1;
    prog.advance(format!(
        "Imported {} SMS and {} MMS messages",
        totals.sms, totals.mms
    ));
    progress(prog.clone());

    for address in &addresses {
        match store.insert_mms_address(message_id, address) {
            Ok(Some(_)) => {}
            Ok(None) => warn!("MMS address insert failed!"),
            Err(why) => warn!("MMS address insert failed: {why}"),
        }
    }

    // Parts keep their file order; each sub-insert fails independently of the
    // parent row
    for mut part in parts {
        let binary = part.take_binary();
        part.project(part_schema);
        match store.insert_mms_part(message_id, &part) {
            Ok(Some(part_id)) => {
                if options.include_binary_data {
                    if let Some(data) = binary {
                        if let Err(why) = store.write_part_data(part_id, &data) {
                            warn!("Failed to write binary data for MMS part {part_id}: {why}");
                        }
                    }
                }
            }
            Ok(None) => warn!("MMS part insert failed! Part metadata: {part:?}"),
            Err(why) => warn!("MMS part insert failed: {why}"),
        }
    }
}
