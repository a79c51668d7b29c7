use std::cell::OnceCell;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Write};
use std::path::PathBuf;

use bytes::Bytes;

use super::{Body, BodyStream, CopyProgress};
use crate::error::RequestError;

/// Deferred producer of the backing stream, invoked at most once.
pub type BodySource = Box<dyn FnOnce() -> io::Result<BodyStream> + Send>;

/// Deferred length calculator. Negative results mean "unknown".
pub type BodyLength = Box<dyn Fn() -> i64 + Send>;

const COPY_BUFFER_SIZE: usize = 8 * 1024;

enum Source {
    Empty,
    Deferred(BodySource),
    Memory(Bytes),
    Consumed,
}

/// The standard [`Body`] implementation.
///
/// Backed either by nothing, by in-memory bytes or by a deferred stream
/// producer. Writing it out consumes it; reading it into memory rebinds it to
/// the bytes that were read.
pub struct DefaultBody {
    source: Source,
    calculate_length: Option<BodyLength>,
    length: OnceCell<Option<u64>>,
}

impl DefaultBody {
    pub fn empty() -> Self {
        Self {
            source: Source::Empty,
            calculate_length: None,
            length: OnceCell::from(Some(0)),
        }
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let length = bytes.len() as u64;
        Self {
            source: Source::Memory(bytes),
            calculate_length: None,
            length: OnceCell::from(Some(length)),
        }
    }

    pub fn from_string(content: impl Into<String>) -> Self {
        Self::from_bytes(content.into())
    }

    /// Body over a lazily opened stream. `calculate_length` is evaluated at
    /// most once, the first time the length is asked for.
    pub fn from_source(source: BodySource, calculate_length: Option<BodyLength>) -> Self {
        Self {
            source: Source::Deferred(source),
            calculate_length,
            length: OnceCell::new(),
        }
    }

    /// Body over an already opened reader.
    pub fn from_reader<R>(reader: R, length: Option<u64>) -> Self
    where
        R: Read + Send + 'static,
    {
        let calculate: Option<BodyLength> =
            length.map(|n| Box::new(move || n as i64) as BodyLength);
        Self::from_source(Box::new(move || Ok(Box::new(reader) as BodyStream)), calculate)
    }

    /// Body over a file that is opened when the body is first read.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let metadata_path = path.clone();
        Self::from_source(
            Box::new(move || Ok(Box::new(File::open(path)?) as BodyStream)),
            Some(Box::new(move || {
                std::fs::metadata(&metadata_path)
                    .map(|m| m.len() as i64)
                    .unwrap_or(-1)
            })),
        )
    }

    fn open(&mut self) -> Result<BodyStream, RequestError> {
        match std::mem::replace(&mut self.source, Source::Consumed) {
            Source::Empty => {
                self.source = Source::Empty;
                Ok(Box::new(io::empty()))
            }
            Source::Memory(bytes) => Ok(Box::new(Cursor::new(bytes))),
            Source::Deferred(produce) => Ok(produce()?),
            Source::Consumed => Err(RequestError::consumed()),
        }
    }
}

impl Default for DefaultBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl Body for DefaultBody {
    fn to_byte_array(&mut self) -> Result<Bytes, RequestError> {
        match &self.source {
            Source::Empty => return Ok(Bytes::new()),
            Source::Memory(bytes) => return Ok(bytes.clone()),
            Source::Consumed => return Err(RequestError::consumed()),
            Source::Deferred(_) => {}
        }

        let capacity = self.length().unwrap_or(32) as usize;
        let mut buffer = Vec::with_capacity(capacity);
        self.write_to(&mut buffer)?;

        let bytes = Bytes::from(buffer);
        self.length = OnceCell::from(Some(bytes.len() as u64));
        self.source = Source::Memory(bytes.clone());
        Ok(bytes)
    }

    fn to_stream(&mut self) -> Result<BodyStream, RequestError> {
        let stream = self.open()?;
        Ok(Box::new(BufReader::new(stream)))
    }

    fn write_to_with_progress(
        &mut self,
        sink: &mut dyn Write,
        on_progress: CopyProgress<'_>,
    ) -> Result<u64, RequestError> {
        let mut stream = self.open()?;
        let mut buffer = [0u8; COPY_BUFFER_SIZE];
        let mut written = 0u64;
        loop {
            let read = match stream.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            sink.write_all(&buffer[..read])?;
            written += read as u64;
            on_progress(written);
        }
        sink.flush()?;
        Ok(written)
    }

    fn is_empty(&self) -> bool {
        matches!(self.source, Source::Empty) || self.length() == Some(0)
    }

    fn is_consumed(&self) -> bool {
        matches!(self.source, Source::Consumed)
    }

    fn length(&self) -> Option<u64> {
        *self.length.get_or_init(|| {
            self.calculate_length
                .as_ref()
                .map(|calculate| calculate())
                .filter(|n| *n >= 0)
                .map(|n| n as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn stream_body(content: &'static [u8]) -> DefaultBody {
        DefaultBody::from_reader(Cursor::new(content), Some(content.len() as u64))
    }

    #[test]
    fn empty_body_is_empty_and_stays_readable() {
        let mut body = DefaultBody::empty();
        assert!(body.is_empty());
        assert_eq!(body.length(), Some(0));
        let mut sink = Vec::new();
        assert_eq!(body.write_to(&mut sink).unwrap(), 0);
        assert!(!body.is_consumed());
        assert!(body.to_byte_array().unwrap().is_empty());
    }

    #[test]
    fn writing_a_stream_body_twice_fails() {
        let mut body = stream_body(b"hello");
        let mut sink = Vec::new();
        assert_eq!(body.write_to(&mut sink).unwrap(), 5);
        assert_eq!(sink, b"hello");
        assert!(body.is_consumed());

        let err = body.write_to(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, RequestError::StateError(_)));
    }

    #[test]
    fn memory_body_is_consumed_by_writing() {
        let mut body = DefaultBody::from_string("abc");
        body.write_to(&mut Vec::new()).unwrap();
        assert!(body.is_consumed());
        assert!(body.to_byte_array().is_err());
    }

    #[test]
    fn to_byte_array_rebinds_to_memory() {
        let mut body = stream_body(b"payload");
        assert_eq!(&body.to_byte_array().unwrap()[..], b"payload");
        assert_eq!(&body.to_byte_array().unwrap()[..], b"payload");
        assert!(!body.is_consumed());

        let mut sink = Vec::new();
        body.write_to(&mut sink).unwrap();
        assert_eq!(sink, b"payload");
    }

    #[test]
    fn to_stream_consumes() {
        let mut body = stream_body(b"xyz");
        let mut content = String::new();
        body.to_stream().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "xyz");
        assert!(body.is_consumed());
        assert!(body.to_stream().is_err());
    }

    #[test]
    fn negative_length_means_unknown() {
        let body = DefaultBody::from_source(
            Box::new(|| Ok(Box::new(Cursor::new(b"a".to_vec())) as BodyStream)),
            Some(Box::new(|| -1)),
        );
        assert_eq!(body.length(), None);
        assert!(!body.is_empty());
    }

    #[test]
    fn length_is_computed_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let body = DefaultBody::from_source(
            Box::new(|| Ok(Box::new(io::empty()) as BodyStream)),
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                3
            })),
        );
        assert_eq!(body.length(), Some(3));
        assert_eq!(body.length(), Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn progress_is_cumulative() {
        let content = vec![7u8; COPY_BUFFER_SIZE * 2 + 10];
        let mut body = DefaultBody::from_reader(Cursor::new(content.clone()), None);
        let mut reports = Vec::new();
        let written = body
            .write_to_with_progress(&mut Vec::new(), &mut |n| reports.push(n))
            .unwrap();
        assert_eq!(written, content.len() as u64);
        assert_eq!(reports.last().copied(), Some(written));
        assert!(reports.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn file_body_reads_lazily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"on disk").unwrap();
        let mut body = DefaultBody::from_file(file.path());
        assert_eq!(body.length(), Some(7));
        assert_eq!(&body.to_byte_array().unwrap()[..], b"on disk");
    }
}
