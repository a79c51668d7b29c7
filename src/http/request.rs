use std::fmt;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use super::capabilities::Capabilities;
use super::headers::{CONTENT_TYPE, Headers};
use super::method::Method;
use super::parameters::{ParamValue, Parameters};
use super::response::Response;
use crate::body::{Body, BodyLength, BodySource, DefaultBody, RepeatableBody, representation};
use crate::execution::ExecutionOptions;
use crate::utils::CancelHandle;
use crate::utils::mime::{OCTET_STREAM, guess_mime_from_path};

/// User value attached with [`Request::tag`].
struct Tag<T>(T);

/// An HTTP request under construction or in flight.
///
/// Requests are created by a [`Manager`](crate::Manager), which seeds the
/// execution options, then configured with the consuming builder methods
/// below and finally executed blocking, with callbacks or awaited.
pub struct Request {
    method: Method,
    url: Url,
    headers: Headers,
    parameters: Parameters,
    body: Box<dyn Body>,
    capabilities: Capabilities,
    options: ExecutionOptions,
}

impl Request {
    pub fn new(method: Method, url: Url, options: ExecutionOptions) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            parameters: Parameters::new(),
            body: Box::new(DefaultBody::empty()),
            capabilities: Capabilities::new(),
            options,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Last Content-Type value, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get_last(CONTENT_TYPE)
    }

    /// Replace the values of a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn header_values<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.headers.set_all(name, values);
        self
    }

    /// Add a value to a header, keeping existing values.
    pub fn append_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    pub fn take_parameters(&mut self) -> Parameters {
        std::mem::take(&mut self.parameters)
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    pub fn body(&self) -> &dyn Body {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> &mut dyn Body {
        self.body.as_mut()
    }

    pub fn set_body(&mut self, body: Box<dyn Body>) {
        self.body = body;
    }

    /// Take the body out, leaving an empty one behind.
    pub fn take_body(&mut self) -> Box<dyn Body> {
        std::mem::replace(&mut self.body, Box::new(DefaultBody::empty()))
    }

    pub fn with_body(mut self, body: Box<dyn Body>) -> Self {
        self.body = body;
        self
    }

    /// Wrap the current body so it can be written more than once.
    pub fn make_body_repeatable(&mut self) {
        let body = self.take_body();
        self.body = Box::new(RepeatableBody::new(body));
    }

    /// Use `bytes` as a repeatable body.
    pub fn body_bytes(self, bytes: impl Into<Bytes>) -> Self {
        self.with_body(Box::new(RepeatableBody::new(Box::new(
            DefaultBody::from_bytes(bytes),
        ))))
    }

    /// Use `content` as a repeatable body, defaulting Content-Type to plain text.
    pub fn body_string(mut self, content: impl Into<String>) -> Self {
        if !self.headers.contains(CONTENT_TYPE) {
            self.headers.set(CONTENT_TYPE, "text/plain; charset=UTF-8");
        }
        self.body_bytes(content.into())
    }

    /// Stream the body from a file opened at send time. Content-Type is
    /// guessed from the file name when unset.
    pub fn body_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !self.headers.contains(CONTENT_TYPE) {
            let content_type = guess_mime_from_path(&path).unwrap_or_else(|| OCTET_STREAM.to_string());
            self.headers.set(CONTENT_TYPE, content_type);
        }
        self.with_body(Box::new(DefaultBody::from_file(path)))
    }

    /// Stream the body from `reader`. Repeatable bodies are buffered on first write.
    pub fn body_reader<R>(self, reader: R, length: Option<u64>, repeatable: bool) -> Self
    where
        R: Read + Send + 'static,
    {
        let body = DefaultBody::from_reader(reader, length);
        self.with_boxed(Box::new(body), repeatable)
    }

    /// Stream the body from a deferred source.
    pub fn body_source(
        self,
        source: BodySource,
        calculate_length: Option<BodyLength>,
        repeatable: bool,
    ) -> Self {
        let body = DefaultBody::from_source(source, calculate_length);
        self.with_boxed(Box::new(body), repeatable)
    }

    fn with_boxed(self, body: Box<dyn Body>, repeatable: bool) -> Self {
        if repeatable {
            self.with_body(Box::new(RepeatableBody::new(body)))
        } else {
            self.with_body(body)
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn capabilities_mut(&mut self) -> &mut Capabilities {
        &mut self.capabilities
    }

    /// Attach a user value, retrievable with [`Request::get_tag`].
    pub fn tag<T: Send + 'static>(mut self, value: T) -> Self {
        self.capabilities.insert(Tag(value));
        self
    }

    pub fn get_tag<T: 'static>(&self) -> Option<&T> {
        self.capabilities.get::<Tag<T>>().map(|tag| &tag.0)
    }

    pub fn execution_options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn execution_options_mut(&mut self) -> &mut ExecutionOptions {
        &mut self.options
    }

    /// Handle that cancels this request and any redirect it follows.
    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.options.cancel
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn timeout_read(mut self, timeout: Duration) -> Self {
        self.options.timeout_read = timeout;
        self
    }

    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.options.allow_redirects = Some(allow);
        self
    }

    pub fn use_http_cache(mut self, use_cache: bool) -> Self {
        self.options.use_http_cache = Some(use_cache);
        self
    }

    /// Replace the response validator.
    pub fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Response) -> bool + Send + Sync + 'static,
    {
        self.options.response_validator = Arc::new(validator);
        self
    }

    /// Accept only status codes inside `range`.
    pub fn valid_status(self, range: RangeInclusive<u16>) -> Self {
        self.validate(move |response| range.contains(&response.status_code()))
    }

    pub fn request_progress<F>(mut self, handler: F) -> Self
    where
        F: Fn(u64, Option<u64>) + Send + Sync + 'static,
    {
        self.options.request_progress.add(Arc::new(handler));
        self
    }

    pub fn response_progress<F>(mut self, handler: F) -> Self
    where
        F: Fn(u64, Option<u64>) + Send + Sync + 'static,
    {
        self.options.response_progress.add(Arc::new(handler));
        self
    }

    /// Register a callback run when the request is interrupted.
    pub fn interrupt<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.options.interrupt_callbacks.push(Arc::new(callback));
        self
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--> {} {}", self.method, self.url)?;
        writeln!(
            f,
            "Body : {}",
            representation::summary_of(self.body.as_ref(), self.content_type())
        )?;
        writeln!(f, "Headers : ({})", self.headers.len())?;
        write!(f, "{}", self.headers)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}
