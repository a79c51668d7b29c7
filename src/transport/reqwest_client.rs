//! [`Client`] backed by `reqwest`.

use std::sync::mpsc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::io::{ReaderStream, SyncIoBridge};

use super::Client;
use crate::body::Body;
use crate::error::{RequestError, TransportError};
use crate::execution::Progress;
use crate::http::headers::CACHE_CONTROL;
use crate::http::{HeaderWrite, Headers, Request, Response};

/// Bodies longer than this, or of unknown length, are streamed rather than buffered.
const BUFFER_LIMIT: u64 = 64 * 1024;

/// Blocking task copying a streamed request body into the connection.
type BodyWriter = JoinHandle<(Box<dyn Body>, Result<u64, RequestError>)>;

/// Build a `reqwest::Client` suitable for [`ReqwestClient`].
///
/// Redirects are disabled because the redirect interceptor follows them.
pub fn build_reqwest_client(
    connect_timeout: Duration,
    user_agent: Option<&str>,
) -> Result<reqwest::Client, TransportError> {
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(connect_timeout);

    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent);
    }

    builder
        .build()
        .map_err(|e| TransportError::Http(format!("Failed to create HTTP client: {e}")))
}

/// Transport over a `reqwest::Client` driven by a Tokio runtime.
///
/// Blocking calls spawn the exchange on the runtime and wait for it, so they
/// must come from a thread that is not driving that runtime.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    handle: Handle,
}

impl ReqwestClient {
    pub fn new(client: reqwest::Client, handle: Handle) -> Self {
        Self { client, handle }
    }

    pub fn with_connect_timeout(handle: Handle, connect_timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self::new(build_reqwest_client(connect_timeout, None)?, handle))
    }

    fn build_request(
        &self,
        request: &mut Request,
    ) -> Result<(reqwest::Request, Option<BodyWriter>), TransportError> {
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .map_err(|e| TransportError::Http(format!("Invalid method: {e}")))?;

        let mut headers = HeaderMap::new();
        let mut invalid = None;
        request.headers().for_each_wire_line(|mode, name, value| {
            if invalid.is_some() {
                return;
            }
            let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
                invalid = Some(format!("Invalid header name '{name}'"));
                return;
            };
            let Ok(header_value) = HeaderValue::from_str(value) else {
                invalid = Some(format!("Invalid header value for '{name}'"));
                return;
            };
            match mode {
                HeaderWrite::Set => {
                    headers.insert(header_name, header_value);
                }
                HeaderWrite::Add => {
                    headers.append(header_name, header_value);
                }
            }
        });
        if let Some(message) = invalid {
            return Err(TransportError::Http(message));
        }
        if request.execution_options().use_http_cache == Some(false)
            && !request.headers().contains(CACHE_CONTROL)
        {
            headers.insert(reqwest::header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }

        let mut prepared = self
            .client
            .request(method, request.url().clone())
            .headers(headers)
            .timeout(request.execution_options().timeout_read)
            .build()?;

        if request.body().is_empty() {
            return Ok((prepared, None));
        }
        let total = request.body().length();
        let progress = request.execution_options().request_progress.clone();
        match total {
            Some(length) if length <= BUFFER_LIMIT => {
                let buffer = encode_body(request.body_mut(), total, &progress)?;
                *prepared.body_mut() = Some(buffer.into());
                Ok((prepared, None))
            }
            _ => {
                if let Some(length) = total {
                    prepared
                        .headers_mut()
                        .entry(reqwest::header::CONTENT_LENGTH)
                        .or_insert(HeaderValue::from(length));
                }
                let (body, writer) = self.stream_body(request.take_body(), total, progress);
                *prepared.body_mut() = Some(body);
                Ok((prepared, Some(writer)))
            }
        }
    }

    /// Pipe `body` to the server from a blocking worker.
    ///
    /// The writer hands the body back once the server side of the pipe is done
    /// with it. A length-less body goes out with chunked transfer encoding.
    fn stream_body(
        &self,
        mut body: Box<dyn Body>,
        total: Option<u64>,
        progress: Progress,
    ) -> (reqwest::Body, BodyWriter) {
        let (sink, source) = tokio::io::duplex(BUFFER_LIMIT as usize);
        let handle = self.handle.clone();
        let writer = self.handle.spawn_blocking(move || {
            let mut sink = SyncIoBridge::new_with_handle(sink, handle);
            let result =
                body.write_to_with_progress(&mut sink, &mut |written| progress.invoke(written, total));
            tracing::trace!(target: "courier::transport", ?total, ok = result.is_ok(), "request body streamed");
            (body, result)
        });
        (reqwest::Body::wrap_stream(ReaderStream::new(source)), writer)
    }
}

/// Write the request body into memory, reporting request progress.
fn encode_body(
    body: &mut dyn Body,
    total: Option<u64>,
    progress: &Progress,
) -> Result<Vec<u8>, TransportError> {
    let mut buffer = Vec::with_capacity(total.unwrap_or(0) as usize);
    body.write_to_with_progress(&mut buffer, &mut |written| progress.invoke(written, total))
        .map_err(into_transport)?;
    Ok(buffer)
}

fn into_transport(error: RequestError) -> TransportError {
    match error {
        RequestError::TransportError { source, .. } => source,
        other => TransportError::Io(std::io::Error::other(other.to_string())),
    }
}

fn is_broken_pipe(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::TransportError { source: TransportError::Io(e), .. }
            if e.kind() == std::io::ErrorKind::BrokenPipe
    )
}

/// Wait for a streaming body writer and fold its failure into `result`.
///
/// A broken pipe only means the exchange stopped reading, so the exchange's
/// own result stands. An interrupted exchange does not wait for the writer.
async fn settle(
    writer: Option<BodyWriter>,
    result: Result<Response, TransportError>,
) -> (Option<Box<dyn Body>>, Result<Response, TransportError>) {
    let Some(writer) = writer else {
        return (None, result);
    };
    if matches!(&result, Err(e) if e.is_interruption()) {
        return (None, result);
    }
    match writer.await {
        Ok((body, Err(e))) if !is_broken_pipe(&e) => (Some(body), Err(into_transport(e))),
        Ok((body, _)) => (Some(body), result),
        Err(e) => (
            None,
            result.and(Err(TransportError::Io(std::io::Error::other(format!(
                "request body writer failed: {e}"
            ))))),
        ),
    }
}

async fn exchange(
    client: reqwest::Client,
    request: reqwest::Request,
    progress: Progress,
) -> Result<Response, TransportError> {
    let mut response = client.execute(request).await?;

    let url = response.url().clone();
    let status = response.status();
    let mut headers = Headers::new();
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            headers.append(name.as_str(), value);
        }
    }
    let content_length = response.content_length();

    let mut data = Vec::with_capacity(content_length.unwrap_or(0).min(1 << 20) as usize);
    while let Some(chunk) = response.chunk().await? {
        data.extend_from_slice(&chunk);
        progress.invoke(data.len() as u64, content_length);
    }

    tracing::trace!(target: "courier::transport", status = status.as_u16(), %url, bytes = data.len(), "exchange finished");

    Ok(Response::new(url, status.as_u16())
        .with_message(status.canonical_reason().unwrap_or_default())
        .with_headers(headers)
        .with_content_length(content_length)
        .with_bytes(data))
}

#[async_trait]
impl Client for ReqwestClient {
    fn execute(&self, request: &mut Request) -> Result<Response, TransportError> {
        let (prepared, writer) = self.build_request(request)?;
        let progress = request.execution_options().response_progress.clone();
        let cancel = request.cancel_handle().clone();
        let client = self.client.clone();

        let (tx, rx) = mpsc::channel();
        self.handle.spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(TransportError::Interrupted),
                result = exchange(client, prepared, progress) => result,
            };
            let _ = tx.send(settle(writer, result).await);
        });
        // a dropped sender means the runtime went away mid-exchange
        let (body, result) = rx
            .recv()
            .unwrap_or((None, Err(TransportError::Interrupted)));
        if let Some(body) = body {
            request.set_body(body);
        }
        result
    }

    async fn execute_async(&self, request: &mut Request) -> Result<Response, TransportError> {
        let (prepared, writer) = self.build_request(request)?;
        let progress = request.execution_options().response_progress.clone();
        let cancel = request.cancel_handle().clone();

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(TransportError::Interrupted),
            result = exchange(self.client.clone(), prepared, progress) => result,
        };
        let (body, result) = settle(writer, result).await;
        if let Some(body) = body {
            request.set_body(body);
        }
        result
    }
}
