//! Integration tests for the mailbox crate
//!
//! These drive the facade end to end against the in-memory service, with
//! credentials and tokens loaded from files the way the CLI loads them.

use base64::prelude::*;
use mailbox::gmail::api::{GmailMessage, Header, Label as ApiLabel, MessageBody, MessagePart};
use mailbox::{
    AccessToken, Credentials, FetchError, FetchOptions, FetchedMessage, InMemoryMailbox, Label,
    Mailbox, MessageFormat, MessageId, SessionRejected, decode_message, get_header_value,
    label_sort_order, message_text, summarize,
};
use tempfile::TempDir;

/// Helper to create a stored message with headers and a plain text body
fn make_message(id: &str, subject: &str, body: &str) -> GmailMessage {
    GmailMessage {
        id: id.to_string(),
        thread_id: format!("thread-{}", id),
        label_ids: Some(vec!["INBOX".to_string(), "UNREAD".to_string()]),
        snippet: body.chars().take(20).collect(),
        internal_date: Some("1700000000000".to_string()),
        payload: Some(MessagePart {
            mime_type: Some("text/plain".to_string()),
            headers: Some(vec![
                Header::new("From", "Test User <test@example.com>"),
                Header::new("Subject", subject),
            ]),
            body: Some(MessageBody {
                data: Some(BASE64_URL_SAFE_NO_PAD.encode(body)),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Write credentials and token files and load them back
fn load_config(dir: &TempDir) -> (Credentials, AccessToken) {
    let creds_path = dir.path().join("credentials.json");
    std::fs::write(
        &creds_path,
        r#"{
            "installed": {
                "client_id": "client.apps.googleusercontent.com",
                "client_secret": "secret",
                "redirect_uris": ["http://localhost"]
            }
        }"#,
    )
    .unwrap();

    let token_path = dir.path().join("token.json");
    std::fs::write(
        &token_path,
        r#"{ "access_token": "ya29.valid", "token_type": "Bearer" }"#,
    )
    .unwrap();

    (
        Credentials::from_file(&creds_path).unwrap(),
        AccessToken::from_file(&token_path).unwrap(),
    )
}

fn ids(ids: &[&str]) -> Vec<MessageId> {
    ids.iter().map(|id| MessageId::new(*id)).collect()
}

#[test]
fn test_batch_with_missing_message() {
    let dir = TempDir::new().unwrap();
    let (creds, token) = load_config(&dir);

    let service = InMemoryMailbox::new();
    service.insert_message(make_message("m1", "First", "hello one"));
    service.insert_message(make_message("m3", "Third", "hello three"));
    let mailbox = Mailbox::new(service);

    let results = mailbox
        .get_messages(&creds, &token, &ids(&["m1", "m2", "m3"]))
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(matches!(&results[0], FetchedMessage::Found(m) if m.id == "m1"));
    match &results[1] {
        FetchedMessage::Missing(missing) => {
            assert_eq!(missing.id.as_str(), "m2");
            assert!(missing.to_string().contains("m2"));
        }
        FetchedMessage::Found(_) => panic!("m2 should be missing"),
    }
    assert!(matches!(&results[2], FetchedMessage::Found(m) if m.id == "m3"));
}

#[test]
fn test_permuted_input_permutes_output() {
    let dir = TempDir::new().unwrap();
    let (creds, token) = load_config(&dir);

    let service = InMemoryMailbox::new();
    for id in ["a", "c", "e"] {
        service.insert_message(make_message(id, id, id));
    }
    let mailbox = Mailbox::new(service);

    let forward = ["a", "b", "c", "d", "e"];
    let reversed = ["e", "d", "c", "b", "a"];

    let describe = |results: Vec<FetchedMessage>| -> Vec<String> {
        results
            .into_iter()
            .map(|r| match r {
                FetchedMessage::Found(m) => format!("found:{}", m.id),
                FetchedMessage::Missing(m) => format!("missing:{}", m.id),
            })
            .collect()
    };

    let mut first = describe(mailbox.get_messages(&creds, &token, &ids(&forward)).unwrap());
    let second = describe(mailbox.get_messages(&creds, &token, &ids(&reversed)).unwrap());

    first.reverse();
    assert_eq!(first, second);
}

#[test]
fn test_duplicates_are_fetched_each_time() {
    let dir = TempDir::new().unwrap();
    let (creds, token) = load_config(&dir);

    let service = InMemoryMailbox::new();
    service.insert_message(make_message("m1", "Dup", "dup"));
    let mailbox = Mailbox::new(service);

    let results = mailbox
        .get_messages(&creds, &token, &ids(&["m1", "m1"]))
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(FetchedMessage::is_found));
    assert_eq!(mailbox.service().request_count(), 2);
}

#[test]
fn test_empty_batch_is_precondition_failure() {
    let dir = TempDir::new().unwrap();
    let (creds, token) = load_config(&dir);
    let mailbox = Mailbox::new(InMemoryMailbox::new());

    let err = mailbox.get_messages(&creds, &token, &[]).unwrap_err();
    assert_eq!(
        err.downcast_ref::<FetchError>(),
        Some(&FetchError::NoIdentifiers)
    );
    assert_eq!(mailbox.service().request_count(), 0);
}

#[test]
fn test_invalid_token_propagates() {
    let dir = TempDir::new().unwrap();
    let (creds, _) = load_config(&dir);

    let service = InMemoryMailbox::new();
    service.accept_only_token("ya29.valid");
    service.insert_message(make_message("m1", "Hi", "hi"));
    let mailbox = Mailbox::new(service);

    let stale = AccessToken::new("ya29.stale");
    let err = mailbox
        .get_messages(&creds, &stale, &ids(&["m1"]))
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<SessionRejected>(),
        Some(&SessionRejected { status: 401 })
    );

    assert!(mailbox.list_labels(&creds, &stale).is_err());
}

#[test]
fn test_inbox_then_fetch_and_read() {
    let dir = TempDir::new().unwrap();
    let (creds, token) = load_config(&dir);

    let service = InMemoryMailbox::new();
    service.insert_message(make_message("m1", "Hello", "hello world"));
    let mut read = make_message("m2", "Old", "already read");
    read.label_ids = Some(vec!["INBOX".to_string()]);
    service.insert_message(read);
    let mailbox = Mailbox::new(service);

    let refs = mailbox.inbox(&creds, &token).unwrap();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].id, "m1");

    let ids: Vec<MessageId> = refs.iter().map(|r| MessageId::new(&r.id)).collect();
    let results = mailbox.get_messages(&creds, &token, &ids).unwrap();
    let message = results[0].as_message().unwrap();

    let headers = message.payload.as_ref().unwrap().headers();
    assert_eq!(get_header_value("Subject", headers), Some("Hello"));
    assert_eq!(
        get_header_value("From", headers),
        Some("Test User <test@example.com>")
    );
    assert_eq!(get_header_value("Missing", headers), None);
    assert_eq!(message_text(message).as_deref(), Some("hello world"));

    let summary = summarize(message);
    assert_eq!(summary.from.unwrap().email, "test@example.com");
    assert_eq!(summary.subject, "Hello");
}

#[test]
fn test_decode_round_trip() {
    let encoded = BASE64_URL_SAFE_NO_PAD.encode("hello world");
    assert_eq!(decode_message(&encoded).as_deref(), Some("hello world"));
}

#[test]
fn test_concurrent_batch_matches_sequential() {
    let dir = TempDir::new().unwrap();
    let (creds, token) = load_config(&dir);

    let service = InMemoryMailbox::new();
    for i in (0..20).step_by(2) {
        service.insert_message(make_message(&format!("m{}", i), "s", "b"));
    }
    service.fail_with_status("m4", 503);
    let mailbox = Mailbox::new(service);

    let input: Vec<MessageId> = (0..20).map(|i| MessageId::new(format!("m{}", i))).collect();
    let sequential = mailbox.get_messages(&creds, &token, &input).unwrap();
    let options = FetchOptions::default()
        .with_concurrency(5)
        .with_format(MessageFormat::Minimal);
    let concurrent = mailbox
        .get_messages_with(&creds, &token, &input, &options)
        .unwrap();

    assert_eq!(sequential.len(), concurrent.len());
    for (s, c) in sequential.iter().zip(&concurrent) {
        assert_eq!(s.is_found(), c.is_found());
    }
    assert_eq!(concurrent[4].as_missing().unwrap().status, 503);
    assert!(concurrent[0].as_message().unwrap().payload.is_none());
}

#[test]
fn test_delete_and_labels() {
    let dir = TempDir::new().unwrap();
    let (creds, token) = load_config(&dir);

    let service = InMemoryMailbox::new();
    service.insert_message(make_message("m1", "Bye", "bye"));
    service.insert_label(ApiLabel {
        id: "Label_1".to_string(),
        name: "Receipts".to_string(),
        label_type: Some("user".to_string()),
        messages_total: None,
        messages_unread: None,
    });
    service.insert_label(ApiLabel {
        id: "INBOX".to_string(),
        name: "INBOX".to_string(),
        label_type: Some("system".to_string()),
        messages_total: Some(1),
        messages_unread: Some(1),
    });
    let mailbox = Mailbox::new(service);

    let mut labels: Vec<Label> = mailbox
        .list_labels(&creds, &token)
        .unwrap()
        .into_iter()
        .map(Label::from)
        .collect();
    labels.sort_by_key(|l| label_sort_order(l.id.as_str()));
    assert_eq!(labels[0].id.as_str(), "INBOX");
    assert!(labels[0].is_system);
    assert_eq!(labels[1].name, "Receipts");

    let id = MessageId::new("m1");
    assert_eq!(mailbox.delete(&creds, &token, &id).unwrap().status, 204);
    assert_eq!(mailbox.delete(&creds, &token, &id).unwrap().status, 404);
    assert!(!mailbox.service().contains(&id));
}
