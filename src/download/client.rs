//! HTTP client wrapper for index pages, inventories and byte ranges.
//!
//! This module provides the [`HttpClient`] struct. It is the retry fetch
//! executor every discovery call goes through, and it knows the three request
//! shapes the rest of the crate needs: plain `GET` (must be 200), `HEAD` for a
//! dataset's total length, and a multi-range `GET` (must be 206) streamed
//! straight into an output sink.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_LENGTH, RANGE};
use reqwest::{Client, Response, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, USER_AGENT};
use super::error::DownloadError;
use super::retry::FetchStrategy;

/// An inclusive span of bytes within a remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub first: u64,
    /// Last byte offset, inclusive.
    pub last: u64,
}

impl ByteRange {
    /// Builds the inclusive range covering `extent` bytes from `offset`.
    ///
    /// Returns `None` for a zero extent, which no inclusive range can express.
    #[must_use]
    pub fn from_extent(offset: u64, extent: u64) -> Option<Self> {
        let last = offset.checked_add(extent)?.checked_sub(1)?;
        (extent > 0).then_some(Self {
            first: offset,
            last,
        })
    }

    /// Number of bytes covered.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.last - self.first + 1
    }

    /// Always false; a `ByteRange` covers at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Formats a `Range` header value listing every span in order.
///
/// ```
/// use aonui_core::download::{ByteRange, range_header};
///
/// let ranges = [ByteRange { first: 0, last: 199 }, ByteRange { first: 400, last: 599 }];
/// assert_eq!(range_header(&ranges), "bytes=0-199,400-599");
/// ```
#[must_use]
pub fn range_header(ranges: &[ByteRange]) -> String {
    let specs: Vec<String> = ranges
        .iter()
        .map(|r| format!("{}-{}", r.first, r.last))
        .collect();
    format!("bytes={}", specs.join(","))
}

/// Dataset lengths and byte offsets refer to the uncompressed file, so
/// length probes and ranged requests must not negotiate a content coding.
const IDENTITY_ENCODING: &str = "identity";

/// HTTP client used for all remote access.
///
/// Designed to be created once and cloned into download tasks; clones share
/// the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with the default connect timeout.
    ///
    /// No overall request timeout is set on the client: ranged transfers are
    /// bounded by [`FetchStrategy::fetch_timeout`] instead.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::new_with_connect_timeout(CONNECT_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with an explicit connect timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_connect_timeout(connect_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .gzip(true)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Fetches `url`, retrying per `strategy` until the server answers 200.
    ///
    /// Any other status and any network-level failure count as a failed
    /// attempt. Attempts are separated by a fixed sleep of
    /// [`FetchStrategy::retry_sleep`].
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::RetriesExhausted`] wrapping the last failure
    /// once [`FetchStrategy::attempts`] attempts have failed.
    #[instrument(skip(self, strategy), fields(url = %url))]
    pub async fn fetch(&self, url: &Url, strategy: &FetchStrategy) -> Result<Response, DownloadError> {
        let max_attempts = strategy.attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, max_attempts, "fetching");

            match self.get_ok(url).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "fetch attempt failed");
                    if attempt >= max_attempts {
                        return Err(DownloadError::retries_exhausted(url.as_str(), attempt, e));
                    }
                    tokio::time::sleep(strategy.retry_sleep()).await;
                }
            }
        }
    }

    /// Fetches `url` with retries and returns the body as text.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`fetch`](Self::fetch), or
    /// [`DownloadError::Network`] if the body cannot be read.
    pub async fn fetch_text(&self, url: &Url, strategy: &FetchStrategy) -> Result<String, DownloadError> {
        let response = self.fetch(url, strategy).await?;
        response
            .text()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))
    }

    /// Single `GET` returning the body as text; the server must answer 200.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::HttpStatus`] for any other status and
    /// [`DownloadError::Network`]/[`DownloadError::Timeout`] on transport failure.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn get_text(&self, url: &Url) -> Result<String, DownloadError> {
        let response = self.get_ok(url).await?;
        response
            .text()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))
    }

    /// Issues a `HEAD` request and returns the advertised Content-Length.
    ///
    /// The header is read directly: a `HEAD` response carries no body, so the
    /// body size hint is useless here.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::HttpStatus`] unless the server answers 200 and
    /// [`DownloadError::MissingLength`] if no usable Content-Length is present.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn content_length(&self, url: &Url) -> Result<u64, DownloadError> {
        let response = self
            .client
            .head(url.clone())
            .header(ACCEPT_ENCODING, IDENTITY_ENCODING)
            .send()
            .await
            .map_err(|e| map_send_error(url, e))?;

        if response.status() != StatusCode::OK {
            return Err(DownloadError::http_status(url.as_str(), response.status().as_u16()));
        }

        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .ok_or_else(|| DownloadError::missing_length(url.as_str()))
    }

    /// Requests `ranges` of `url` in one multi-range `GET` and streams the
    /// 206 body into `writer`.
    ///
    /// The whole operation, from connect to the last body byte, must finish
    /// within `deadline`. On expiry the in-flight request is dropped, which
    /// closes its connection; bytes already handed to `writer` stay there and
    /// the caller is expected to discard them.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::HttpStatus`] unless the server answers 206,
    /// [`DownloadError::Timeout`] when the deadline expires,
    /// [`DownloadError::Write`] when `writer` fails.
    #[instrument(skip(self, ranges, writer), fields(url = %url, ranges = ranges.len()))]
    pub async fn fetch_ranges<W>(
        &self,
        url: &Url,
        ranges: &[ByteRange],
        writer: &mut W,
        deadline: Duration,
    ) -> Result<u64, DownloadError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        match tokio::time::timeout(deadline, self.fetch_ranges_inner(url, ranges, writer)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(deadline_secs = deadline.as_secs_f64(), "ranged fetch timed out");
                Err(DownloadError::timeout(url.as_str()))
            }
        }
    }

    async fn fetch_ranges_inner<W>(
        &self,
        url: &Url,
        ranges: &[ByteRange],
        writer: &mut W,
    ) -> Result<u64, DownloadError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let response = self
            .client
            .get(url.clone())
            .header(RANGE, range_header(ranges))
            .header(ACCEPT_ENCODING, IDENTITY_ENCODING)
            .send()
            .await
            .map_err(|e| map_send_error(url, e))?;

        if response.status() != StatusCode::PARTIAL_CONTENT {
            return Err(DownloadError::http_status(url.as_str(), response.status().as_u16()));
        }

        stream_to_writer(response, url, writer).await
    }

    /// Sends a single `GET` and fails on anything but 200.
    async fn get_ok(&self, url: &Url) -> Result<Response, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| map_send_error(url, e))?;

        if response.status() != StatusCode::OK {
            return Err(DownloadError::http_status(url.as_str(), response.status().as_u16()));
        }

        Ok(response)
    }

}

fn map_send_error(url: &Url, e: reqwest::Error) -> DownloadError {
    if e.is_timeout() {
        DownloadError::timeout(url.as_str())
    } else {
        DownloadError::network(url.as_str(), e)
    }
}

/// Streams a response body into `writer`, returning bytes written.
async fn stream_to_writer<W>(response: Response, url: &Url, writer: &mut W) -> Result<u64, DownloadError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url.as_str(), e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::write(url.as_str(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::write(url.as_str(), e))?;

    Ok(bytes_written)
}
