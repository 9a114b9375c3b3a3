/*!
 Conversions between records and their JSON object form.

 Every scalar value round-trips as a string; the codec performs no type
 coercion. Binary payloads are carried as base64 under the `binary_data` key,
 encoded without padding or line breaks so decoded bytes survive unchanged.
*/

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde_json::{Map, Value};

use crate::{
    error::codec::CodecError,
    record::{
        ContactRecord, MessageRecord, RawContact, Record, BINARY_DATA, CONTACTS_DATA, PARTS,
        RAW_CONTACTS, RECIPIENT_ADDRESSES, SENDER_ADDRESS,
    },
};

/// Standard-alphabet base64, emitted without padding, decoded with or without
pub(crate) const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Render a record as a JSON object: scalar fields first, then `binary_data`
pub fn record_to_json(record: &Record) -> Map<String, Value> {
    let mut map = Map::new();
    for (column, value) in record.fields() {
        map.insert(column.to_string(), Value::String(value.to_string()));
    }
    if let Some(data) = record.binary() {
        map.insert(BINARY_DATA.to_string(), Value::String(BASE64.encode(data)));
    }
    map
}

/// Render a message as a JSON object: scalars, then the structural slots in
/// their fixed order
pub fn message_to_json(message: &MessageRecord) -> Map<String, Value> {
    let mut map = record_to_json(&message.metadata);
    if let Some(sender) = &message.sender_address {
        map.insert(
            SENDER_ADDRESS.to_string(),
            Value::Object(record_to_json(sender)),
        );
    }
    if !message.recipient_addresses.is_empty() {
        map.insert(
            RECIPIENT_ADDRESSES.to_string(),
            Value::Array(
                message
                    .recipient_addresses
                    .iter()
                    .map(|address| Value::Object(record_to_json(address)))
                    .collect(),
            ),
        );
    }
    if !message.parts.is_empty() {
        map.insert(
            PARTS.to_string(),
            Value::Array(
                message
                    .parts
                    .iter()
                    .map(|part| Value::Object(record_to_json(part)))
                    .collect(),
            ),
        );
    }
    map
}

/// Render a contact as a JSON object with its nested raw contact rows
pub fn contact_to_json(contact: &ContactRecord) -> Map<String, Value> {
    let mut map = record_to_json(&contact.metadata);
    if !contact.raw_contacts.is_empty() {
        map.insert(
            RAW_CONTACTS.to_string(),
            Value::Array(
                contact
                    .raw_contacts
                    .iter()
                    .map(|raw| {
                        let mut raw_map = record_to_json(&raw.metadata);
                        if !raw.data.is_empty() {
                            raw_map.insert(
                                CONTACTS_DATA.to_string(),
                                Value::Array(
                                    raw.data
                                        .iter()
                                        .map(|data| Value::Object(record_to_json(data)))
                                        .collect(),
                                ),
                            );
                        }
                        Value::Object(raw_map)
                    })
                    .collect(),
            ),
        );
    }
    map
}

/// Store one parsed key into a record: `binary_data` decodes into the binary
/// side channel, nulls vanish, everything else becomes a string
fn scalar_into(record: &mut Record, key: String, value: Value) -> Result<(), CodecError> {
    if key == BINARY_DATA {
        if let Value::String(encoded) = value {
            record.set_binary(BASE64.decode(encoded.as_bytes()).map_err(CodecError::Base64)?);
        }
        return Ok(());
    }
    match value {
        Value::Null => {}
        Value::String(text) => record.insert(key, text),
        // Numbers, booleans, and any nested shape no exporter produces are
        // retained verbatim as their JSON text
        other => record.insert(key, other.to_string()),
    }
    Ok(())
}

/// Parse a flat JSON object into a record
pub fn record_from_json(map: Map<String, Value>) -> Result<Record, CodecError> {
    let mut record = Record::new();
    for (key, value) in map {
        scalar_into(&mut record, key, value)?;
    }
    Ok(record)
}

fn as_object(key: &str, value: Value) -> Result<Map<String, Value>, CodecError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CodecError::NotAnObject(key.to_string())),
    }
}

fn as_objects(key: &str, value: Value) -> Result<Vec<Map<String, Value>>, CodecError> {
    match value {
        Value::Array(items) => items.into_iter().map(|item| as_object(key, item)).collect(),
        _ => Err(CodecError::NotAnObject(key.to_string())),
    }
}

/// Parse a message object, routing the structural slots into the shell
pub fn message_from_json(map: Map<String, Value>) -> Result<MessageRecord, CodecError> {
    let mut message = MessageRecord::default();
    for (key, value) in map {
        match key.as_str() {
            SENDER_ADDRESS => {
                message.sender_address = Some(record_from_json(as_object(&key, value)?)?);
            }
            RECIPIENT_ADDRESSES => {
                for address in as_objects(&key, value)? {
                    message.recipient_addresses.push(record_from_json(address)?);
                }
            }
            PARTS => {
                for part in as_objects(&key, value)? {
                    message.parts.push(record_from_json(part)?);
                }
            }
            _ => scalar_into(&mut message.metadata, key, value)?,
        }
    }
    Ok(message)
}

/// Parse a contact object and its nested raw contact and data rows
pub fn contact_from_json(map: Map<String, Value>) -> Result<ContactRecord, CodecError> {
    let mut contact = ContactRecord::default();
    for (key, value) in map {
        match key.as_str() {
            RAW_CONTACTS => {
                for raw_map in as_objects(&key, value)? {
                    let mut raw = RawContact::default();
                    for (raw_key, raw_value) in raw_map {
                        if raw_key == CONTACTS_DATA {
                            for data in as_objects(&raw_key, raw_value)? {
                                raw.data.push(record_from_json(data)?);
                            }
                        } else {
                            scalar_into(&mut raw.metadata, raw_key, raw_value)?;
                        }
                    }
                    contact.raw_contacts.push(raw);
                }
            }
            _ => scalar_into(&mut contact.metadata, key, value)?,
        }
    }
    Ok(contact)
}
