//! End-to-end export and import round trips between two in-memory device
//! stores.

use std::io::Cursor;

use telephony_database::{
    export::{export_blocked_numbers, export_call_log, export_contacts, export_messages},
    import::{import_blocked_numbers, import_call_log, import_contacts, import_messages},
    record::Record,
    store::{
        BlockedNumberSource, CallSource, ContactSource, MessageSink, MessageSource, Visit,
    },
    CancelToken, DeviceStore, ExportOptions, ImportOptions, Progress,
};

fn sink() -> impl FnMut(Progress) {
    |_progress| {}
}

fn record(fields: &[(&str, &str)]) -> Record {
    let mut record = Record::new();
    for (column, value) in fields {
        record.insert(*column, *value);
    }
    record
}

fn collect_sms(store: &DeviceStore) -> Vec<Record> {
    let mut rows = Vec::new();
    store
        .visit_sms(None, &mut |row| {
            rows.push(row);
            Ok(Visit::Continue)
        })
        .unwrap();
    rows
}

fn collect_mms(store: &DeviceStore) -> Vec<Record> {
    let mut rows = Vec::new();
    store
        .visit_mms(None, &mut |row| {
            rows.push(row);
            Ok(Visit::Continue)
        })
        .unwrap();
    rows
}

fn collect_calls(store: &DeviceStore) -> Vec<Record> {
    let mut rows = Vec::new();
    store
        .visit_calls(&mut |row| {
            rows.push(row);
            Ok(Visit::Continue)
        })
        .unwrap();
    rows
}

fn collect_blocked(store: &DeviceStore) -> Vec<Record> {
    let mut rows = Vec::new();
    store
        .visit_blocked_numbers(&mut |row| {
            rows.push(row);
            Ok(Visit::Continue)
        })
        .unwrap();
    rows
}

/// Build a source store with 3 SMS (two sharing a thread) and 2 MMS, one
/// carrying parts with and without binary content
fn seeded_message_store() -> DeviceStore {
    let store = DeviceStore::open_in_memory().unwrap();

    store
        .seed(
            "sms",
            &record(&[
                ("thread_id", "1"),
                ("address", "+15550001111"),
                ("date", "1660000000000"),
                ("type", "1"),
                ("body", "first"),
            ]),
        )
        .unwrap();
    store
        .seed(
            "sms",
            &record(&[
                ("thread_id", "1"),
                ("address", "+15550001111"),
                ("date", "1660000001000"),
                ("type", "2"),
                ("body", "second"),
            ]),
        )
        .unwrap();
    store
        .seed(
            "sms",
            &record(&[
                ("thread_id", "2"),
                ("address", "+15550002222"),
                ("date", "1660000002000"),
                ("type", "1"),
                ("body", "third"),
            ]),
        )
        .unwrap();

    // MMS with a sender, two recipients, and three parts: binary, text-only,
    // and empty binary
    let mms_one = store
        .seed(
            "mms",
            &record(&[
                ("thread_id", "3"),
                ("date", "1660000010"),
                ("msg_box", "1"),
                ("m_type", "132"),
                ("ct_t", "application/vnd.wap.multipart.related"),
            ]),
        )
        .unwrap();
    store
        .seed(
            "addr",
            &record(&[
                ("msg_id", &mms_one.to_string()),
                ("address", "+15550003333"),
                ("type", "137"),
                ("charset", "106"),
            ]),
        )
        .unwrap();
    store
        .seed(
            "addr",
            &record(&[
                ("msg_id", &mms_one.to_string()),
                ("address", "+15550004444"),
                ("type", "151"),
                ("charset", "106"),
            ]),
        )
        .unwrap();
    store
        .seed(
            "addr",
            &record(&[
                ("msg_id", &mms_one.to_string()),
                ("address", "+15550005555"),
                ("type", "151"),
                ("charset", "106"),
            ]),
        )
        .unwrap();
    let part_binary = store
        .seed(
            "part",
            &record(&[
                ("mid", &mms_one.to_string()),
                ("seq", "0"),
                ("ct", "image/png"),
                ("cl", "image0"),
            ]),
        )
        .unwrap();
    let payload: Vec<u8> = (0u8..=255).collect();
    store.write_part_data(part_binary, &payload).unwrap();
    store
        .seed(
            "part",
            &record(&[
                ("mid", &mms_one.to_string()),
                ("seq", "1"),
                ("ct", "text/plain"),
                ("text", "picture attached"),
            ]),
        )
        .unwrap();
    let part_empty = store
        .seed(
            "part",
            &record(&[
                ("mid", &mms_one.to_string()),
                ("seq", "2"),
                ("ct", "application/octet-stream"),
            ]),
        )
        .unwrap();
    store.write_part_data(part_empty, &[]).unwrap();

    // MMS with no parts and no addresses
    store
        .seed(
            "mms",
            &record(&[
                ("thread_id", "4"),
                ("date", "1660000020"),
                ("msg_box", "2"),
                ("m_type", "128"),
            ]),
        )
        .unwrap();

    store
}

#[test]
fn messages_round_trip() {
    let source = seeded_message_store();
    let mut document = Vec::new();
    let exported = export_messages(
        &source,
        &mut document,
        &ExportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(exported.sms, 3);
    assert_eq!(exported.mms, 2);
    assert!(!exported.cancelled);

    let destination = DeviceStore::open_in_memory().unwrap();
    let imported = import_messages(
        &destination,
        Cursor::new(&document),
        &ImportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(imported.sms, 3);
    assert_eq!(imported.mms, 2);
    assert!(!imported.cancelled);

    let sms = collect_sms(&destination);
    assert_eq!(sms.len(), 3);
    let bodies: Vec<&str> = sms.iter().filter_map(|row| row.get("body")).collect();
    assert_eq!(bodies, ["first", "second", "third"]);

    let mms = collect_mms(&destination);
    assert_eq!(mms.len(), 2);

    // The multipart message kept its parts in order, and the binary payloads
    // are byte-identical after the base64 round trip
    let full = mms
        .iter()
        .find(|row| row.get("m_type") == Some("132"))
        .unwrap();
    let parts = destination.mms_parts(full.get("_id").unwrap()).unwrap();
    assert_eq!(parts.len(), 3);
    let sequence: Vec<&str> = parts.iter().filter_map(|part| part.get("seq")).collect();
    assert_eq!(sequence, ["0", "1", "2"]);

    let payload: Vec<u8> = (0u8..=255).collect();
    assert_eq!(
        destination.part_data(parts[0].get("_id").unwrap()).unwrap(),
        payload
    );
    assert_eq!(
        destination.part_data(parts[2].get("_id").unwrap()).unwrap(),
        Vec::<u8>::new()
    );

    // The address set came through: one sender row and two recipient rows
    let addresses = destination
        .mms_addresses(full.get("_id").unwrap())
        .unwrap();
    assert_eq!(addresses.len(), 3);
    let senders: Vec<&Record> = addresses
        .iter()
        .filter(|address| address.get("type") == Some("137"))
        .collect();
    assert_eq!(senders.len(), 1);
    assert_eq!(senders[0].get("address"), Some("+15550003333"));
}

#[test]
fn sms_threads_are_remapped_consistently() {
    let source = seeded_message_store();
    let mut document = Vec::new();
    export_messages(
        &source,
        &mut document,
        &ExportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();

    let destination = DeviceStore::open_in_memory().unwrap();
    import_messages(
        &destination,
        Cursor::new(&document),
        &ImportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();

    let sms = collect_sms(&destination);
    let thread_of = |body: &str| {
        sms.iter()
            .find(|row| row.get("body") == Some(body))
            .and_then(|row| row.get("thread_id"))
            .map(str::to_string)
            .unwrap()
    };
    // Messages that shared a source thread share a destination thread
    assert_eq!(thread_of("first"), thread_of("second"));
    // A different participant lands in a different thread
    assert_ne!(thread_of("first"), thread_of("third"));
}

#[test]
fn display_names_are_attached_on_export_and_dropped_on_import() {
    let source = seeded_message_store();
    let contact_id = source
        .seed("contacts", &record(&[("display_name", "Jess Example")]))
        .unwrap();
    let raw_id = source
        .seed(
            "raw_contacts",
            &record(&[("contact_id", &contact_id.to_string())]),
        )
        .unwrap();
    source
        .seed(
            "contact_data",
            &record(&[
                ("raw_contact_id", &raw_id.to_string()),
                ("mimetype", "vnd.android.cursor.item/phone_v2"),
                ("data1", "+15550001111"),
            ]),
        )
        .unwrap();

    let mut document = Vec::new();
    export_messages(
        &source,
        &mut document,
        &ExportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    let text = String::from_utf8(document.clone()).unwrap();
    assert!(text.contains("\"display_name\": \"Jess Example\""));

    // The enrichment is not a destination column, so it projects away
    let destination = DeviceStore::open_in_memory().unwrap();
    let imported = import_messages(
        &destination,
        Cursor::new(&document),
        &ImportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(imported.sms, 3);
    for row in collect_sms(&destination) {
        assert!(!row.contains("display_name"));
    }
}

#[test]
fn call_log_round_trips() {
    let source = DeviceStore::open_in_memory().unwrap();
    source
        .seed(
            "calls",
            &record(&[
                ("number", "+15550001111"),
                ("date", "1660000000000"),
                ("duration", "35"),
                ("type", "2"),
            ]),
        )
        .unwrap();
    source
        .seed(
            "calls",
            &record(&[
                ("number", "+15550002222"),
                ("date", "1660000001000"),
                ("duration", "0"),
                ("type", "3"),
            ]),
        )
        .unwrap();

    let mut document = Vec::new();
    let exported = export_call_log(
        &source,
        &mut document,
        &ExportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(exported.count, 2);

    let destination = DeviceStore::open_in_memory().unwrap();
    let imported = import_call_log(
        &destination,
        Cursor::new(&document),
        &ImportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(imported.count, 2);

    let calls = collect_calls(&destination);
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|row| !row.contains("display_name")));
}

#[test]
fn contacts_round_trip_with_photo_blob() {
    let source = DeviceStore::open_in_memory().unwrap();
    let contact_id = source
        .seed(
            "contacts",
            &record(&[("display_name", "Jess Example"), ("has_phone_number", "1")]),
        )
        .unwrap();
    let raw_id = source
        .seed(
            "raw_contacts",
            &record(&[
                ("contact_id", &contact_id.to_string()),
                ("account_name", "jess@example.com"),
                ("account_type", "com.example"),
            ]),
        )
        .unwrap();
    source
        .seed(
            "contact_data",
            &record(&[
                ("raw_contact_id", &raw_id.to_string()),
                ("mimetype", "vnd.android.cursor.item/phone_v2"),
                ("data1", "+15550001111"),
                ("data2", "2"),
            ]),
        )
        .unwrap();
    let photo_id = source
        .seed(
            "contact_data",
            &record(&[
                ("raw_contact_id", &raw_id.to_string()),
                ("mimetype", "vnd.android.cursor.item/photo"),
            ]),
        )
        .unwrap();
    let photo: Vec<u8> = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
    {
        // Stash the photo in the blob column directly
        use telephony_database::store::ContactSink;
        let mut data = record(&[("mimetype", "vnd.android.cursor.item/photo")]);
        data.set_binary(photo.clone());
        source.delete("contact_data", Some(&format!("_id = {photo_id}"))).unwrap();
        source.insert_contact_data(raw_id, &data).unwrap().unwrap();
    }

    let mut document = Vec::new();
    let exported = export_contacts(
        &source,
        &mut document,
        &ExportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(exported.count, 1);

    let destination = DeviceStore::open_in_memory().unwrap();
    let imported = import_contacts(
        &destination,
        Cursor::new(&document),
        &ImportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(imported.count, 1);

    let raws = destination.raw_contacts("").unwrap();
    assert!(raws.is_empty());
    // Imported raw contacts have no account affiliation and no aggregate
    let mut all_raws = Vec::new();
    destination
        .visit_contacts(&mut |row| {
            all_raws.push(row);
            Ok(Visit::Continue)
        })
        .unwrap();
    assert!(all_raws.is_empty());

    let data_rows = destination.contact_data("1").unwrap();
    assert_eq!(data_rows.len(), 2);
    let photo_row = data_rows
        .iter()
        .find(|row| row.get("mimetype") == Some("vnd.android.cursor.item/photo"))
        .unwrap();
    assert_eq!(photo_row.binary(), Some(photo.as_slice()));
    let phone_row = data_rows
        .iter()
        .find(|row| row.get("mimetype") == Some("vnd.android.cursor.item/phone_v2"))
        .unwrap();
    assert_eq!(phone_row.get("data1"), Some("+15550001111"));
    assert_eq!(phone_row.get("data2"), Some("2"));
}

#[test]
fn blocked_numbers_round_trip_through_archive() {
    let source = DeviceStore::open_in_memory().unwrap();
    source
        .seed(
            "blocked_numbers",
            &record(&[
                ("original_number", "555-867-5309"),
                ("e164_number", "+15558675309"),
            ]),
        )
        .unwrap();
    source
        .seed(
            "blocked_numbers",
            &record(&[("original_number", "555-000-0000")]),
        )
        .unwrap();

    let mut archive = Cursor::new(Vec::new());
    let exported = export_blocked_numbers(
        &source,
        &mut archive,
        &ExportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(exported.count, 2);

    archive.set_position(0);
    let destination = DeviceStore::open_in_memory().unwrap();
    let imported = import_blocked_numbers(
        &destination,
        archive,
        &ImportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(imported.count, 2);

    let rows = collect_blocked(&destination);
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .any(|row| row.get("e164_number") == Some("+15558675309")));
}

#[test]
fn message_filters_select_rows_on_export() {
    use telephony_database::util::filters::{FilterOperator, MessageFilter};

    let source = seeded_message_store();
    let mut options = ExportOptions::default();
    options.mms = false;
    options.message_filtering = true;
    options.message_filters.push(MessageFilter {
        column: "sms.type".to_string(),
        operator: FilterOperator::Equal,
        value: "2".to_string(),
        active: true,
    });

    let mut document = Vec::new();
    let exported = export_messages(
        &source,
        &mut document,
        &options,
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(exported.sms, 1);
    let text = String::from_utf8(document).unwrap();
    assert!(text.contains("\"body\": \"second\""));
    assert!(!text.contains("\"body\": \"first\""));
}
