//! HTTP response body as a transfer source.
//!
//! [`HttpSource::open`] issues the GET and checks the response head before
//! any byte reaches the destination. Redirects are never followed.

use std::pin::Pin;

use bytes::Bytes;
use filedrop_transfer::{ChunkSource, SourceError, SourceFuture, StreamSource};
use futures_util::{Stream, TryStreamExt};
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use tracing::{debug, warn};

type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, SourceError>> + Send>>;

/// Streams the body of a successful GET response.
pub struct HttpSource {
    body: StreamSource<BodyStream>,
    status: StatusCode,
}

impl HttpSource {
    /// Builds a client suitable for [`open`](Self::open): redirects are
    /// reported as responses instead of being followed.
    pub fn client() -> Result<reqwest::Client, SourceError> {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SourceError::Network(format!("failed to build HTTP client: {e}")))
    }

    /// Sends a GET for `url` and validates the response status.
    ///
    /// Use a client from [`client`](Self::client); a client that follows
    /// redirects hides them from this check.
    pub async fn open(client: &reqwest::Client, url: &str) -> Result<Self, SourceError> {
        let target = redact(url);
        let response = client.get(url).send().await.map_err(|e| {
            SourceError::Network(format!("request to {target} failed: {}", e.without_url()))
        })?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("<no location>")
                .to_string();
            warn!(url = %target, %status, location = %redact(&location), "refusing redirect");
            return Err(SourceError::RedirectRefused(location));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::PROXY_AUTHENTICATION_REQUIRED
        {
            warn!(url = %target, %status, "authentication required");
            return Err(SourceError::AuthRequired(status.as_u16()));
        }
        if !status.is_success() {
            warn!(url = %target, %status, "unexpected response status");
            return Err(SourceError::Status(status.as_u16()));
        }

        let length = response.content_length();
        debug!(url = %target, %status, content_length = ?length, "response accepted");

        let stream: BodyStream = Box::pin(
            response
                .bytes_stream()
                .map_err(|e| SourceError::Network(format!("response body: {}", e.without_url()))),
        );
        Ok(Self {
            body: StreamSource::new(stream).with_size_hint(length),
            status,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Scheme, host, port and path of `url`. Credentials, query and fragment are
/// dropped so the result is safe to log.
fn redact(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("");
            match parsed.port() {
                Some(port) => format!("{}://{host}:{port}{}", parsed.scheme(), parsed.path()),
                None => format!("{}://{host}{}", parsed.scheme(), parsed.path()),
            }
        }
        Err(_) => "<invalid url>".to_string(),
    }
}

impl ChunkSource for HttpSource {
    fn read_chunk<'a>(&'a mut self, buf: &'a mut [u8]) -> SourceFuture<'a> {
        self.body.read_chunk(buf)
    }

    fn size_hint(&self) -> Option<u64> {
        self.body.size_hint()
    }
}
