use std::fmt;

use bytes::Bytes;
use url::Url;

use super::headers::{CONTENT_TYPE, Headers};
use crate::body::{Body, DefaultBody, representation};
use crate::error::RequestError;

/// A received HTTP response.
pub struct Response {
    url: Url,
    status_code: u16,
    response_message: String,
    headers: Headers,
    content_length: Option<u64>,
    body: Box<dyn Body>,
}

impl Response {
    pub fn new(url: Url, status_code: u16) -> Self {
        Self {
            url,
            status_code,
            response_message: String::new(),
            headers: Headers::new(),
            content_length: None,
            body: Box::new(DefaultBody::empty()),
        }
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.response_message = message.into();
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_content_length(mut self, length: Option<u64>) -> Self {
        self.content_length = length;
        self
    }

    pub fn with_body(mut self, body: Box<dyn Body>) -> Self {
        self.body = body;
        self
    }

    /// In-memory body; also sets the content length when none is known.
    pub fn with_bytes(self, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let length = self.content_length.or(Some(bytes.len() as u64));
        self.with_content_length(length)
            .with_body(Box::new(DefaultBody::from_bytes(bytes)))
    }

    /// Final URL of the exchange, after any redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Reason phrase sent with the status line.
    pub fn response_message(&self) -> &str {
        &self.response_message
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Values of the named header.
    pub fn header(&self, name: &str) -> &[String] {
        self.headers.get(name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get_last(CONTENT_TYPE)
    }

    /// Advertised content length, falling back to the body's own length.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length.or_else(|| self.body.length())
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

    pub fn take_body(&mut self) -> Box<dyn Body> {
        std::mem::replace(&mut self.body, Box::new(DefaultBody::empty()))
    }

    /// The whole body in memory. The body stays readable afterwards.
    pub fn data(&mut self) -> Result<Bytes, RequestError> {
        self.body.to_byte_array()
    }

    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.status_code)
    }

    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<-- {} {}", self.status_code, self.url)?;
        writeln!(f, "Response : {}", self.response_message)?;
        match self.content_length() {
            Some(length) => writeln!(f, "Length : {length}")?,
            None => writeln!(f, "Length : unknown")?,
        }
        writeln!(
            f,
            "Body : {}",
            representation::summary_of(self.body.as_ref(), self.content_type())
        )?;
        writeln!(f, "Headers : ({})", self.headers.len())?;
        write!(f, "{}", self.headers)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("url", &self.url.as_str())
            .field("status_code", &self.status_code)
            .field("response_message", &self.response_message)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .field("body", &self.body)
            .finish()
    }
}
