//! Request and response bodies.
//!
//! A [`Body`] wraps a byte source that may only be readable once. Reading it
//! through [`Body::write_to`] or [`Body::to_stream`] consumes single-use
//! sources; [`Body::to_byte_array`] materializes the content in memory so it
//! stays readable afterwards.

mod default;
mod repeatable;
pub mod representation;

pub use default::{BodyLength, BodySource, DefaultBody};
pub use repeatable::RepeatableBody;

use std::io::{Read, Write};

use bytes::Bytes;

use crate::error::RequestError;

/// Readable stream handed out by [`Body::to_stream`].
pub type BodyStream = Box<dyn Read + Send>;

/// Progress hook invoked with the cumulative number of bytes written.
pub type CopyProgress<'a> = &'a mut dyn FnMut(u64);

/// Abstract content of a request or response.
pub trait Body: Send {
    /// Read the whole content into memory.
    ///
    /// After this call the body is backed by the returned bytes and can be
    /// read again. Fails with a state error if the body was consumed.
    fn to_byte_array(&mut self) -> Result<Bytes, RequestError>;

    /// Hand out the backing stream. Single-use sources become consumed.
    fn to_stream(&mut self) -> Result<BodyStream, RequestError>;

    /// Copy the content into `sink`, reporting cumulative progress.
    ///
    /// Flushes the sink before returning the number of bytes written. The body
    /// is consumed afterwards unless it is empty.
    fn write_to_with_progress(
        &mut self,
        sink: &mut dyn Write,
        on_progress: CopyProgress<'_>,
    ) -> Result<u64, RequestError>;

    /// Copy the content into `sink`.
    fn write_to(&mut self, sink: &mut dyn Write) -> Result<u64, RequestError> {
        self.write_to_with_progress(sink, &mut |_| {})
    }

    /// True for the empty body or a body of known length zero.
    fn is_empty(&self) -> bool;

    fn is_consumed(&self) -> bool;

    /// Content length, when known.
    fn length(&self) -> Option<u64>;

    /// Human readable rendition of the body for logging and debugging.
    fn as_string(&mut self, content_type: Option<&str>) -> String {
        representation::representation_of(self, content_type)
    }
}

impl std::fmt::Debug for dyn Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("length", &self.length())
            .field("empty", &self.is_empty())
            .field("consumed", &self.is_consumed())
            .finish()
    }
}
