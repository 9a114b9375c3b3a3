//! Import reconciliation behavior: schema projection, thread remapping,
//! deduplication, record caps, cancellation, and malformed documents.

use std::io::Cursor;

use telephony_database::{
    error::import::ImportError,
    import::{import_blocked_numbers, import_call_log, import_messages},
    record::Record,
    store::{MessageSource, Visit},
    CancelToken, DeviceStore, ImportOptions, Progress,
};

fn sink() -> impl FnMut(Progress) {
    |_progress| {}
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

fn import_message_document(
    store: &DeviceStore,
    document: &str,
    options: &ImportOptions,
) -> telephony_database::MessageTotals {
    import_messages(
        store,
        Cursor::new(document.as_bytes()),
        options,
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap()
}

#[test]
fn unknown_columns_project_away_without_error() {
    let store = DeviceStore::open_in_memory().unwrap();
    let document = r#"[
      {
        "address": "+15550001111",
        "body": "hello",
        "date": "1660000000000",
        "type": "1",
        "some_vendor_extension": "surprise",
        "sub_id": "3"
      }
    ]"#;
    let totals = import_message_document(&store, document, &ImportOptions::default());
    assert_eq!(totals.sms, 1);

    let rows = collect_sms(&store);
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].contains("some_vendor_extension"));
    assert_eq!(rows[0].get("sub_id"), Some("3"));
}

#[test]
fn importing_twice_is_idempotent_projection() {
    // Projection is a pure filter: the same document imports the same way
    // every time
    let store = DeviceStore::open_in_memory().unwrap();
    let document = r#"[{"address": "+15550001111", "body": "x", "unknown_column": "1"}]"#;
    import_message_document(&store, document, &ImportOptions::default());
    import_message_document(&store, document, &ImportOptions::default());
    assert_eq!(collect_sms(&store).len(), 2);
}

#[test]
fn shared_source_threads_map_to_one_destination_thread() {
    let store = DeviceStore::open_in_memory().unwrap();
    // The first message's participant set decides the thread; the later
    // messages carry the same source thread_id but name other participants
    let document = r#"[
      {"thread_id": "7", "address": "+15550001111", "body": "a", "type": "1"},
      {"thread_id": "7", "address": "+15559999999", "body": "b", "type": "1"},
      {
        "thread_id": "7",
        "m_type": "132",
        "date": "1660000010",
        "msg_box": "1",
        "recipient_addresses": [
          {"address": "+15558888888", "type": "151"}
        ]
      },
      {"thread_id": "8", "address": "+15550001111", "body": "c", "type": "1"}
    ]"#;
    let totals = import_message_document(&store, document, &ImportOptions::default());
    assert_eq!(totals.sms, 3);
    assert_eq!(totals.mms, 1);

    let sms = collect_sms(&store);
    let thread_of = |body: &str| {
        sms.iter()
            .find(|row| row.get("body") == Some(body))
            .and_then(|row| row.get("thread_id"))
            .map(str::to_string)
            .unwrap()
    };
    assert_eq!(thread_of("a"), thread_of("b"));

    let mut mms_thread = None;
    store
        .visit_mms(None, &mut |row| {
            mms_thread = row.get("thread_id").map(str::to_string);
            Ok(Visit::Continue)
        })
        .unwrap();
    assert_eq!(mms_thread.as_deref(), Some(thread_of("a").as_str()));

    // A different source thread with the same participant reuses the
    // participant-set thread, because the set is the store's key
    assert_eq!(thread_of("c"), thread_of("a"));
}

#[test]
fn message_deduplication_skips_existing_rows() {
    let store = DeviceStore::open_in_memory().unwrap();
    let document = r#"[
      {"address": "+15550001111", "body": "hello", "date": "1660000000000", "type": "1"}
    ]"#;
    let mut options = ImportOptions::default();
    options.deduplication = true;

    let first = import_message_document(&store, document, &options);
    assert_eq!(first.sms, 1);
    let second = import_message_document(&store, document, &options);
    assert_eq!(second.sms, 0);
    assert_eq!(collect_sms(&store).len(), 1);

    options.deduplication = false;
    let third = import_message_document(&store, document, &options);
    assert_eq!(third.sms, 1);
    assert_eq!(collect_sms(&store).len(), 2);
}

#[test]
fn call_deduplication_matches_number_type_date() {
    let store = DeviceStore::open_in_memory().unwrap();
    let document = r#"[
      {"number": "+15550001111", "type": "2", "date": "1660000000000", "duration": "10"},
      {"number": "+15550002222", "type": "1", "date": "1660000001000", "duration": "20"}
    ]"#;
    let mut options = ImportOptions::default();
    options.deduplication = true;

    let run = |options: &ImportOptions| {
        import_call_log(
            &store,
            Cursor::new(document.as_bytes()),
            options,
            &CancelToken::new(),
            &mut sink(),
        )
        .unwrap()
    };

    assert_eq!(run(&options).count, 2);
    // A second pass inserts nothing new
    assert_eq!(run(&options).count, 0);

    // Without deduplication the rows double
    options.deduplication = false;
    assert_eq!(run(&options).count, 2);
}

#[test]
fn calls_without_numbers_and_voicemail_entries_are_skipped() {
    let store = DeviceStore::open_in_memory().unwrap();
    let document = r#"[
      {"type": "1", "date": "1660000000000"},
      {"number": "+15550001111", "type": "4", "date": "1660000001000"},
      {"number": "+15550001111", "type": "1", "date": "1660000002000"}
    ]"#;
    let totals = import_call_log(
        &store,
        Cursor::new(document.as_bytes()),
        &ImportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    )
    .unwrap();
    assert_eq!(totals.count, 1);
}

#[test]
fn record_cap_truncates_each_family() {
    let store = DeviceStore::open_in_memory().unwrap();
    let document = r#"[
      {"address": "+1", "body": "a"},
      {"address": "+2", "body": "b"},
      {"address": "+3", "body": "c"},
      {"m_type": "132", "date": "1", "msg_box": "1"},
      {"m_type": "132", "date": "2", "msg_box": "1"},
      {"m_type": "132", "date": "3", "msg_box": "1"}
    ]"#;
    let mut options = ImportOptions::default();
    options.max_records = Some(2);
    let totals = import_message_document(&store, document, &options);
    // Each family stops counting at the cap; the rest of the stream is
    // skipped without error
    assert_eq!(totals.sms, 2);
    assert_eq!(totals.mms, 2);
    assert!(!totals.cancelled);
    assert_eq!(collect_sms(&store).len(), 2);
}

#[test]
fn family_toggles_skip_records_without_counting() {
    let store = DeviceStore::open_in_memory().unwrap();
    let document = r#"[
      {"address": "+1", "body": "a"},
      {"m_type": "132", "date": "1", "msg_box": "1"}
    ]"#;
    let mut options = ImportOptions::default();
    options.sms = false;
    let totals = import_message_document(&store, document, &options);
    assert_eq!(totals.sms, 0);
    assert_eq!(totals.mms, 1);
    assert!(collect_sms(&store).is_empty());
}

#[test]
fn cancellation_stops_cleanly_with_partial_totals() {
    let store = DeviceStore::open_in_memory().unwrap();
    let document = r#"[
      {"address": "+1", "body": "a"},
      {"address": "+2", "body": "b"},
      {"address": "+3", "body": "c"}
    ]"#;
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let mut progress = move |progress: Progress| {
        if progress.current >= 1 {
            trigger.cancel();
        }
    };
    let totals = import_messages(
        &store,
        Cursor::new(document.as_bytes()),
        &ImportOptions::default(),
        &cancel,
        &mut progress,
    )
    .unwrap();
    assert!(totals.cancelled);
    assert_eq!(totals.sms, 1);
    assert_eq!(collect_sms(&store).len(), 1);
}

#[test]
fn non_array_document_fails_fast_with_nothing_inserted() {
    let store = DeviceStore::open_in_memory().unwrap();
    let result = import_messages(
        &store,
        Cursor::new(b"{\"address\": \"+1\"}".as_slice()),
        &ImportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    );
    assert!(matches!(result, Err(ImportError::Codec(_))));
    assert!(collect_sms(&store).is_empty());
}

#[test]
fn malformed_tail_keeps_the_valid_prefix() {
    // Rows inserted before the parse failure remain; the error still aborts
    // the run
    let store = DeviceStore::open_in_memory().unwrap();
    let document = "[{\"address\": \"+1\", \"body\": \"a\"}, {\"address\": ";
    let result = import_messages(
        &store,
        Cursor::new(document.as_bytes()),
        &ImportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    );
    assert!(result.is_err());
    assert_eq!(collect_sms(&store).len(), 1);
}

#[test]
fn archive_without_the_expected_entry_is_rejected() {
    use std::io::Write;
    use zip::{write::SimpleFileOptions, ZipWriter};

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        zip.start_file("something_else.ndjson", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"{}\n").unwrap();
        zip.finish().unwrap();
    }
    buffer.set_position(0);

    let store = DeviceStore::open_in_memory().unwrap();
    let result = import_blocked_numbers(
        &store,
        buffer,
        &ImportOptions::default(),
        &CancelToken::new(),
        &mut sink(),
    );
    assert!(matches!(result, Err(ImportError::MissingArchiveEntry(_))));
}
