use std::time::Duration;

use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Settings;

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
}

/// Credentials for authenticated calls. Passed explicitly to every call that
/// needs them; nothing is stored process-wide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub cookies: Vec<(String, String)>,
}

impl Session {
    /// Parse a `Cookie` header style string: `name=value; other=value`.
    pub fn from_cookie_header(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect();
        Session { cookies }
    }

    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Raw markup retrieval. Implementations decide retry, timeout and
/// cancellation; the extractors only ever see the returned text.
pub trait Transport {
    fn fetch(&self, url: &str) -> Result<String, TransportError>;

    fn fetch_authenticated(&self, url: &str, session: &Session) -> Result<String, TransportError>;

    fn post_authenticated(
        &self,
        url: &str,
        form: &[(&str, &str)],
        session: &Session,
    ) -> Result<String, TransportError>;
}

/// Blocking reqwest transport. Rate limiting and server errors are retried
/// with exponential backoff.
pub struct HttpTransport {
    http: HttpClient,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Result<Self, TransportError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(HttpTransport {
            http,
            user_agent: settings.user_agent.clone(),
        })
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<String, TransportError> {
        let request = request.header(USER_AGENT, &self.user_agent);
        for attempt in 0..MAX_RETRIES {
            let Some(retry) = request.try_clone() else {
                break;
            };
            let response = retry.send()?;
            let status = response.status();
            if !(status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()) {
                return finish(response, url);
            }
            let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
            warn!(
                "HTTP {} on {} (attempt {}/{}), backing off {:.1}s",
                status.as_u16(),
                url,
                attempt + 1,
                MAX_RETRIES,
                backoff.as_secs_f64()
            );
            std::thread::sleep(backoff);
        }
        finish(request.send()?, url)
    }
}

fn finish(response: Response, url: &str) -> Result<String, TransportError> {
    let status = response.status();
    debug!(url, status = status.as_u16(), "response");
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text()?)
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<String, TransportError> {
        self.send(self.http.get(url), url)
    }

    fn fetch_authenticated(&self, url: &str, session: &Session) -> Result<String, TransportError> {
        let request = self.http.get(url).header(COOKIE, session.cookie_header());
        self.send(request, url)
    }

    fn post_authenticated(
        &self,
        url: &str,
        form: &[(&str, &str)],
        session: &Session,
    ) -> Result<String, TransportError> {
        let request = self
            .http
            .post(url)
            .header(COOKIE, session.cookie_header())
            .form(form);
        self.send(request, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_roundtrip() {
        let session = Session::from_cookie_header("freeman=abc123; sid=xyz ; =junk; novalue");
        assert_eq!(
            session.cookies,
            vec![
                ("freeman".to_string(), "abc123".to_string()),
                ("sid".to_string(), "xyz".to_string()),
            ]
        );
        assert_eq!(session.cookie_header(), "freeman=abc123; sid=xyz");
    }

    #[test]
    fn empty_cookie_header() {
        assert!(Session::from_cookie_header("").cookies.is_empty());
    }
}
