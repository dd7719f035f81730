//! Helpers for consuming fetched messages
//!
//! Header lookup, base64url body decoding, and flattening a Gmail message
//! into a `MessageSummary`.

use base64::prelude::*;
use chrono::{TimeZone, Utc};

use super::api::{GmailMessage, Header, MessagePart};
use crate::models::{EmailAddress, MessageId, MessageSummary};

/// Value of the first header named exactly `name` (case-sensitive)
pub fn get_header_value<'a>(name: &str, headers: &'a [Header]) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.as_str())
}

/// Decode a base64url body payload into text
///
/// Gmail uses URL-safe base64 but padding can vary, so several decoders are
/// tried. Invalid UTF-8 is replaced rather than rejected. Returns None only
/// when no decoder accepts the input.
pub fn decode_message(data: &str) -> Option<String> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};

    let decoders: &[&base64::engine::GeneralPurpose] =
        &[&BASE64_URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];

    decoders
        .iter()
        .find_map(|decoder| decoder.decode(data.trim()).ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// First text/plain body in the message, decoded
pub fn message_text(message: &GmailMessage) -> Option<String> {
    let payload = message.payload.as_ref()?;
    find_body(payload, "text/plain").or_else(|| {
        // Single-part messages sometimes carry no useful mime type
        payload
            .parts
            .is_none()
            .then(|| body_data(payload))
            .flatten()
            .and_then(decode_message)
    })
}

/// First text/html body in the message, decoded
pub fn message_html(message: &GmailMessage) -> Option<String> {
    find_body(message.payload.as_ref()?, "text/html")
}

/// Flatten a fetched message for display
pub fn summarize(message: &GmailMessage) -> MessageSummary {
    let headers = message
        .payload
        .as_ref()
        .map(MessagePart::headers)
        .unwrap_or(&[]);

    let received_at = message
        .internal_date
        .as_deref()
        .and_then(|d| d.parse::<i64>().ok())
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single());

    MessageSummary {
        id: MessageId::new(&message.id),
        thread_id: message.thread_id.clone(),
        from: get_header_value("From", headers).map(EmailAddress::parse),
        to: get_header_value("To", headers)
            .map(EmailAddress::parse_list)
            .unwrap_or_default(),
        subject: get_header_value("Subject", headers)
            .unwrap_or_default()
            .to_string(),
        snippet: decode_html_entities(&message.snippet),
        received_at,
        label_ids: message.label_ids.clone().unwrap_or_default(),
    }
}

/// Depth-first search of the part tree for a body with the given mime type
fn find_body(part: &MessagePart, mime_prefix: &str) -> Option<String> {
    if part
        .mime_type
        .as_ref()
        .is_some_and(|m| m.starts_with(mime_prefix))
        && let Some(text) = body_data(part).and_then(decode_message)
    {
        return Some(text);
    }

    part.parts
        .as_deref()?
        .iter()
        .find_map(|child| find_body(child, mime_prefix))
}

fn body_data(part: &MessagePart) -> Option<&str> {
    part.body.as_ref()?.data.as_deref()
}

/// Decode HTML entities in snippet text
fn decode_html_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
