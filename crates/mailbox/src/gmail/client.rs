//! Gmail API HTTP client
//!
//! Implements `MailboxService` over the Gmail REST API.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use url::Url;

use super::api::{GmailMessage, Label, ListLabelsResponse, ListMessagesResponse};
use super::{MailboxService, MessageFilter, MessageFormat, ServiceResponse, Session};
use crate::error::SessionRejected;
use crate::models::MessageId;

/// Gmail API client acting for the authenticated user ("me")
#[derive(Debug, Clone)]
pub struct GmailApi {
    base_url: String,
}

impl Default for GmailApi {
    fn default() -> Self {
        Self::new()
    }
}

impl GmailApi {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Largest page the list endpoint accepts
    const MAX_PAGE_SIZE: usize = 500;

    /// Cap on a single get-message body (raw format carries attachments)
    const MAX_MESSAGE_BYTES: u64 = 64 * 1024 * 1024;

    /// Create a client for the public Gmail API
    pub fn new() -> Self {
        Self::with_base_url(Self::BASE_URL)
    }

    /// Create a client for an alternate endpoint (proxies, test servers)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/users/me/{}", self.base_url, path))
            .with_context(|| format!("Invalid Gmail API URL for {}", path))
    }

    fn message_endpoint(&self, id: &MessageId) -> Result<Url> {
        self.endpoint(&format!("messages/{}", urlencoding::encode(id.as_str())))
    }

    fn list_messages_url(
        &self,
        filter: &MessageFilter,
        page_token: Option<&str>,
    ) -> Result<Url> {
        let mut pairs: Vec<(&str, String)> = filter
            .label_ids
            .iter()
            .map(|label| ("labelIds", label.clone()))
            .collect();
        if let Some(max) = filter.max_results {
            pairs.push(("maxResults", max.clamp(1, Self::MAX_PAGE_SIZE).to_string()));
        }
        if let Some(token) = page_token {
            pairs.push(("pageToken", token.to_string()));
        }

        let mut url = self.endpoint("messages")?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

/// Error for a non-2xx status on a call that has no per-item outcome
fn status_error(status: u16, action: &str) -> anyhow::Error {
    if SessionRejected::is_rejection(status) {
        SessionRejected { status }.into()
    } else {
        anyhow!("Failed to {}: HTTP {}", action, status)
    }
}

impl MailboxService for GmailApi {
    fn list_labels(&self, session: &Session) -> Result<Vec<Label>> {
        let url = self.endpoint("labels")?;
        debug!("GET {}", url);

        let response = ureq::get(url.as_str())
            .header("Authorization", session.authorization_header())
            .call();

        match response {
            Ok(mut resp) => {
                let list: ListLabelsResponse = resp
                    .body_mut()
                    .read_json()
                    .context("Failed to parse labels response")?;
                Ok(list.labels.unwrap_or_default())
            }
            Err(ureq::Error::StatusCode(status)) => Err(status_error(status, "list labels")),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to send list labels request")),
        }
    }

    fn list_messages(
        &self,
        session: &Session,
        filter: &MessageFilter,
        page_token: Option<&str>,
    ) -> Result<ListMessagesResponse> {
        let url = self.list_messages_url(filter, page_token)?;
        debug!("GET {}", url);

        let response = ureq::get(url.as_str())
            .header("Authorization", session.authorization_header())
            .call();

        match response {
            Ok(mut resp) => resp
                .body_mut()
                .read_json()
                .context("Failed to parse list messages response"),
            Err(ureq::Error::StatusCode(status)) => Err(status_error(status, "list messages")),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to send list messages request")),
        }
    }

    fn delete_message(&self, session: &Session, id: &MessageId) -> Result<ServiceResponse<()>> {
        let url = self.message_endpoint(id)?;
        debug!("DELETE {}", url);

        let response = ureq::delete(url.as_str())
            .header("Authorization", session.authorization_header())
            .call();

        match response {
            Ok(resp) => Ok(ServiceResponse::ok(resp.status().as_u16(), ())),
            Err(ureq::Error::StatusCode(status)) if SessionRejected::is_rejection(status) => {
                Err(SessionRejected { status }.into())
            }
            Err(ureq::Error::StatusCode(status)) => Ok(ServiceResponse::status_only(status)),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to send delete message request")),
        }
    }

    fn get_message(
        &self,
        session: &Session,
        id: &MessageId,
        format: MessageFormat,
    ) -> Result<ServiceResponse<GmailMessage>> {
        let mut url = self.message_endpoint(id)?;
        url.query_pairs_mut().append_pair("format", format.as_str());
        debug!("GET {}", url);

        let response = ureq::get(url.as_str())
            .header("Authorization", session.authorization_header())
            .call();

        match response {
            Ok(mut resp) => {
                let status = resp.status().as_u16();
                // A body cut off in transit fails the call; only a body that
                // arrived whole but doesn't parse is a per-message failure.
                let body = resp
                    .body_mut()
                    .with_config()
                    .limit(Self::MAX_MESSAGE_BYTES)
                    .read_to_vec()
                    .context("Failed to read get message response")?;

                match serde_json::from_slice::<GmailMessage>(&body) {
                    Ok(message) => Ok(ServiceResponse::ok(status, message)),
                    Err(e) => {
                        warn!("Unparseable message body for {}: {}", id, e);
                        Ok(ServiceResponse::status_only(status))
                    }
                }
            }
            Err(ureq::Error::StatusCode(status)) if SessionRejected::is_rejection(status) => {
                Err(SessionRejected { status }.into())
            }
            Err(ureq::Error::StatusCode(status)) => Ok(ServiceResponse::status_only(status)),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to send get message request")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccessToken, Credentials};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn session() -> Session {
        let creds =
            Credentials::new("id", "secret", vec!["http://localhost".to_string()]).unwrap();
        Session::new(&creds, &AccessToken::new("tok"))
    }

    /// Answer one request on a local port with `response`, verbatim.
    /// The handle yields the request head the client sent.
    fn serve_once(response: String) -> (GmailApi, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/gmail/v1/", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (GmailApi::with_base_url(base_url), handle)
    }

    fn reply(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    fn get(api: &GmailApi) -> Result<ServiceResponse<GmailMessage>> {
        api.get_message(&session(), &MessageId::new("m1"), MessageFormat::Full)
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = GmailApi::with_base_url("http://localhost:9000/gmail/v1/");
        assert_eq!(api.base_url(), "http://localhost:9000/gmail/v1");
    }

    #[test]
    fn test_message_endpoint_encodes_id() {
        let api = GmailApi::new();
        let url = api.message_endpoint(&MessageId::new("a/b c")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/a%2Fb%20c"
        );
    }

    #[test]
    fn test_list_messages_url() {
        let api = GmailApi::new();
        let filter = MessageFilter::inbox().with_max_results(1000);
        let url = api.list_messages_url(&filter, Some("next")).unwrap();
        assert_eq!(
            url.query(),
            Some("labelIds=INBOX&labelIds=UNREAD&maxResults=500&pageToken=next")
        );
    }

    #[test]
    fn test_list_messages_url_without_filter() {
        let api = GmailApi::new();
        let url = api
            .list_messages_url(&MessageFilter::default(), None)
            .unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_status_error() {
        let err = status_error(403, "list labels");
        assert_eq!(
            err.downcast_ref::<SessionRejected>(),
            Some(&SessionRejected { status: 403 })
        );

        let err = status_error(500, "list labels");
        assert_eq!(err.to_string(), "Failed to list labels: HTTP 500");
    }

    #[test]
    fn test_get_message_found() {
        let (api, server) = serve_once(reply(
            "200 OK",
            r#"{"id":"m1","threadId":"t1","snippet":"hi"}"#,
        ));

        let response = get(&api).unwrap();
        assert!(response.is_success());
        assert_eq!(response.data.unwrap().thread_id, "t1");

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /gmail/v1/users/me/messages/m1?format=full "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer tok"));
    }

    #[test]
    fn test_get_message_not_found_has_no_data() {
        let (api, server) = serve_once(reply("404 Not Found", r#"{"error":{"code":404}}"#));

        let response = get(&api).unwrap();
        assert_eq!(response.status, 404);
        assert!(response.data.is_none());
        server.join().unwrap();
    }

    #[test]
    fn test_get_message_rejected_session() {
        for (status_line, status) in [("401 Unauthorized", 401), ("403 Forbidden", 403)] {
            let (api, server) = serve_once(reply(status_line, "{}"));

            let err = get(&api).unwrap_err();
            assert_eq!(
                err.downcast_ref::<SessionRejected>(),
                Some(&SessionRejected { status })
            );
            server.join().unwrap();
        }
    }

    #[test]
    fn test_get_message_unparseable_body_has_no_data() {
        let (api, server) = serve_once(reply("200 OK", "<html>not json</html>"));

        let response = get(&api).unwrap();
        assert_eq!(response.status, 200);
        assert!(response.data.is_none());
        assert!(!response.is_success());
        server.join().unwrap();
    }

    #[test]
    fn test_get_message_truncated_body_is_an_error() {
        let body = r#"{"id":"m1","threadId":"t1"}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len() + 10,
            body
        );
        let (api, server) = serve_once(response);

        let err = get(&api).unwrap_err();
        assert!(err.downcast_ref::<SessionRejected>().is_none());
        assert!(format!("{:#}", err).contains("Failed to read get message response"));
        server.join().unwrap();
    }

    #[test]
    fn test_delete_message_statuses() {
        let (api, server) = serve_once(
            "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string(),
        );
        let response = api.delete_message(&session(), &MessageId::new("m1")).unwrap();
        assert_eq!(response, ServiceResponse::ok(204, ()));
        assert!(server.join().unwrap().starts_with("DELETE /gmail/v1/users/me/messages/m1 "));

        let (api, server) = serve_once(reply("404 Not Found", "{}"));
        let response = api.delete_message(&session(), &MessageId::new("m1")).unwrap();
        assert_eq!(response, ServiceResponse::status_only(404));
        server.join().unwrap();

        let (api, server) = serve_once(reply("403 Forbidden", "{}"));
        let err = api
            .delete_message(&session(), &MessageId::new("m1"))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<SessionRejected>(),
            Some(&SessionRejected { status: 403 })
        );
        server.join().unwrap();
    }
}
