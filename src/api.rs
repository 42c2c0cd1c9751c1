// API client module: a small blocking HTTP client that forwards each
// operator query to the ledis server as a raw POST body. The server's
// protocol is opaque here; whatever it answers is handed back as text.

use crate::error::{ClientError, Result};
use reqwest::blocking::{Client, Response};
use std::error::Error as _;
use std::io;
use std::time::Duration;
use tracing::{debug, warn};

/// Address of the ledis server. Not configurable.
pub const SERVER_URL: &str = "http://127.0.0.1:8080/";

/// Result of one round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The server answered, whatever the status.
    Response { status: u16, body: String },
    /// The server could not be reached, or dropped the connection.
    ConnectionError,
}

/// Anything that can carry one query to the server. The prompt loop only
/// talks to this trait, so tests can swap in a scripted fake.
pub trait Transport {
    fn query(&self, body: &str) -> Result<Outcome>;
}

/// Blocking client bound to a single target URL.
pub struct LedisClient {
    client: Client,
    url: String,
}

impl LedisClient {
    /// Create a client for the local ledis server at `SERVER_URL`.
    pub fn local() -> Result<Self> {
        Self::new(SERVER_URL)
    }

    /// Create a client for an explicit target URL.
    ///
    /// No request timeout is set and idle connections are not kept, so
    /// every query opens its own connection and a stalled server stalls
    /// the caller.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .map_err(ClientError::Build)?;
        Ok(LedisClient {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn send(&self, body: &str) -> reqwest::Result<Response> {
        self.client.post(&self.url).body(body.to_owned()).send()
    }

    fn request_error(&self, source: reqwest::Error) -> ClientError {
        ClientError::Request {
            url: self.url.clone(),
            source,
        }
    }
}

impl Transport for LedisClient {
    /// POST `body` verbatim and classify what came back. Only connection
    /// failures are folded into `Outcome::ConnectionError`; every other
    /// transport failure is returned as an error.
    fn query(&self, body: &str) -> Result<Outcome> {
        debug!(len = body.len(), "sending query");
        let res = match self.send(body) {
            Ok(res) => res,
            Err(err) if is_connection_failure(&err) => {
                warn!(error = %err, "connection failed");
                return Ok(Outcome::ConnectionError);
            }
            Err(err) => return Err(self.request_error(err)),
        };

        let status = res.status().as_u16();
        debug!(status, "received response");
        match res.text() {
            Ok(body) => Ok(Outcome::Response { status, body }),
            Err(err) if is_connection_failure(&err) => {
                warn!(error = %err, "connection dropped while reading body");
                Ok(Outcome::ConnectionError)
            }
            Err(err) => Err(self.request_error(err)),
        }
    }
}

/// True when the connection to the server could not be established or was
/// torn down under us (refused, unreachable, reset, aborted, or closed by
/// the server before it sent a reply).
pub fn is_connection_failure(err: &reqwest::Error) -> bool {
    if err.is_connect() {
        return true;
    }
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_closed() {
                return true;
            }
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if is_connection_kind(io_err.kind()) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

fn is_connection_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_kinds_are_recognised() {
        assert!(is_connection_kind(io::ErrorKind::ConnectionRefused));
        assert!(is_connection_kind(io::ErrorKind::ConnectionReset));
        assert!(is_connection_kind(io::ErrorKind::BrokenPipe));
        assert!(!is_connection_kind(io::ErrorKind::TimedOut));
        assert!(!is_connection_kind(io::ErrorKind::InvalidData));
    }

    #[test]
    fn local_ignores_the_environment() {
        std::env::set_var("LEDIS_URL", "http://10.9.9.9:1/");
        let api = LedisClient::local().unwrap();
        std::env::remove_var("LEDIS_URL");
        assert_eq!(api.url(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn new_keeps_the_target_url() {
        let api = LedisClient::new("http://127.0.0.1:9999/").unwrap();
        assert_eq!(api.url(), "http://127.0.0.1:9999/");
    }
}
