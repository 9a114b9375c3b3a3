/*!
 The message export walker.

 Writes SMS and MMS rows into one JSON array. SMS rows are flat; MMS rows are
 joined with their address and part child tables, with part binary content
 fetched and embedded when enabled. Sender and recipient addresses are
 enriched with resolved display names.
*/

use std::io::Write;

use tracing::{info, warn};

use crate::{
    cancel::CancelToken,
    codec::JsonArrayWriter,
    error::{export::ExportError, store::StoreError},
    options::ExportOptions,
    progress::{MessageTotals, Progress},
    record::{MessageRecord, Record, DISPLAY_NAME, PDU_HEADERS_FROM},
    store::{ContactLookup, MessageSource, Visit},
    util::{
        filters::{message_selection, MessageFamily},
        names::DisplayNameCache,
    },
};

use super::Walk;

/// Export SMS and MMS messages as one JSON array.
///
/// Returns the per-family counts; `cancelled` is set when the run stopped on
/// a cancellation request, with the counts reflecting the records already
/// written.
pub fn export_messages<S, W>(
    store: &S,
    out: W,
    options: &ExportOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<MessageTotals, ExportError>
where
    S: MessageSource + ContactLookup,
    W: Write,
{
    let mut writer = JsonArrayWriter::new(out);
    let mut names = DisplayNameCache::new();
    let mut totals = MessageTotals::default();

    if options.sms {
        info!("Exporting SMS messages");
        match sms_to_json(store, &mut writer, &mut names, options, cancel, progress)? {
            Walk::Complete(count) => totals.sms = count,
            Walk::Cancelled(count) => {
                totals.sms = count;
                totals.cancelled = true;
            }
        }
    }
    if options.mms && !totals.cancelled {
        info!("Exporting MMS messages");
        match mms_to_json(store, &mut writer, &mut names, options, cancel, progress)? {
            Walk::Complete(count) => totals.mms = count,
            Walk::Cancelled(count) => {
                totals.mms = count;
                totals.cancelled = true;
            }
        }
    }
    writer.finish()?;
    Ok(totals)
}

fn sms_to_json<S, W>(
    store: &S,
    writer: &mut JsonArrayWriter<W>,
    names: &mut DisplayNameCache,
    options: &ExportOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<Walk, ExportError>
where
    S: MessageSource + ContactLookup,
    W: Write,
{
    let selection = message_selection(options.active_filters(), MessageFamily::Sms);
    let total = store.sms_count(selection.as_deref())?;
    let mut prog = Progress::new(total);
    progress(prog.clone());

    let mut count = 0u64;
    let mut cancelled = false;
    let mut failure: Option<ExportError> = None;
    store.visit_sms(selection.as_deref(), &mut |mut record| {
        if cancel.is_cancelled() {
            cancelled = true;
            return Ok(Visit::Stop);
        }
        let address = record.get("address").map(str::to_string);
        if let Some(address) = address {
            if let Some(name) = names.resolve(store, &address) {
                record.insert(DISPLAY_NAME, name);
            }
        }
        if let Err(why) = writer.write_record(&record) {
            failure = Some(ExportError::Codec(why));
            return Ok(Visit::Stop);
        }
        count += 1;
        prog.advance(format!("Exported {count} of {total} SMS messages"));
        progress(prog.clone());
        if Some(count) == options.max_records {
            return Ok(Visit::Stop);
        }
        Ok(Visit::Continue)
    })?;

    match failure {
        Some(why) => Err(why),
        None if cancelled => Ok(Walk::Cancelled(count)),
        None => Ok(Walk::Complete(count)),
    }
}

/// Join one MMS row with its address and part rows and enrich it
fn assemble_mms<S>(
    store: &S,
    names: &mut DisplayNameCache,
    options: &ExportOptions,
    record: Record,
) -> Result<MessageRecord, StoreError>
where
    S: MessageSource + ContactLookup,
{
    let message_id = record.get("_id").map(str::to_string);
    let mut message = MessageRecord::new(record);
    let Some(message_id) = message_id else {
        return Ok(message);
    };

    for mut address in store.mms_addresses(&message_id)? {
        let value = address.get("address").map(str::to_string);
        if let Some(value) = value {
            if let Some(name) = names.resolve(store, &value) {
                address.insert(DISPLAY_NAME, name);
            }
        }
        if address.get("type") == Some(PDU_HEADERS_FROM) {
            // The first sender-typed row wins; any others are dropped
            if message.sender_address.is_none() {
                message.sender_address = Some(address);
            }
        } else {
            message.recipient_addresses.push(address);
        }
    }

    for mut part in store.mms_parts(&message_id)? {
        if options.include_binary_data && part.get("_data").is_some() {
            let part_id = part.get("_id").map(str::to_string);
            if let Some(part_id) = part_id {
                match store.part_data(&part_id) {
                    Ok(data) => part.set_binary(data),
                    Err(why) => {
                        warn!("Error accessing binary data for MMS message part {part_id}: {why}");
                    }
                }
            }
        }
        message.parts.push(part);
    }
    Ok(message)
}

fn mms_to_json<S, W>(
    store: &S,
    writer: &mut JsonArrayWriter<W>,
    names: &mut DisplayNameCache,
    options: &ExportOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(Progress),
) -> Result<Walk, ExportError>
where
    S: MessageSource + ContactLookup,
    W: Write,
{
    let selection = message_selection(options.active_filters(), MessageFamily::Mms);
    let total = store.mms_count(selection.as_deref())?;
    let mut prog = Progress::new(total);
    progress(prog.clone());

    let mut count = 0u64;
    let mut cancelled = false;
    let mut failure: Option<ExportError> = None;
    store.visit_mms(selection.as_deref(), &mut |record| {
        if cancel.is_cancelled() {
            cancelled = true;
            return Ok(Visit::Stop);
        }
        let message = match assemble_mms(store, names, options, record) {
            Ok(message) => message,
            Err(why) => {
                failure = Some(ExportError::Store(why));
                return Ok(Visit::Stop);
            }
        };
        if let Err(why) = writer.write_message(&message) {
            failure = Some(ExportError::Codec(why));
            return Ok(Visit::Stop);
        }
        count += 1;
        prog.advance(format!("Exported {count} of {total} MMS messages"));
        progress(prog.clone());
        if Some(count) == options.max_records {
            return Ok(Visit::Stop);
        }
        Ok(Visit::Continue)
    })?;

    match failure {
        Some(why) => Err(why),
        None if cancelled => Ok(Walk::Cancelled(count)),
        None => Ok(Walk::Complete(count)),
    }
}
