use std::io::Write;

use bytes::Bytes;

use super::{Body, BodyStream, CopyProgress, DefaultBody};
use crate::error::RequestError;

/// A [`Body`] that can be written any number of times.
///
/// The wrapped body is read into memory on first write; after each write it
/// is replaced with a fresh in-memory body holding the same bytes.
pub struct RepeatableBody {
    body: Box<dyn Body>,
}

impl RepeatableBody {
    pub fn new(body: Box<dyn Body>) -> Self {
        Self { body }
    }

    pub fn into_inner(self) -> Box<dyn Body> {
        self.body
    }
}

impl Body for RepeatableBody {
    fn to_byte_array(&mut self) -> Result<Bytes, RequestError> {
        self.body.to_byte_array()
    }

    fn to_stream(&mut self) -> Result<BodyStream, RequestError> {
        let bytes = self.body.to_byte_array()?;
        let stream = self.body.to_stream()?;
        self.body = Box::new(DefaultBody::from_bytes(bytes));
        Ok(stream)
    }

    fn write_to_with_progress(
        &mut self,
        sink: &mut dyn Write,
        on_progress: CopyProgress<'_>,
    ) -> Result<u64, RequestError> {
        let bytes = self.body.to_byte_array()?;
        let written = self.body.write_to_with_progress(sink, on_progress)?;
        self.body = Box::new(DefaultBody::from_bytes(bytes));
        Ok(written)
    }

    fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    fn is_consumed(&self) -> bool {
        self.body.is_consumed()
    }

    fn length(&self) -> Option<u64> {
        self.body.length()
    }
}
