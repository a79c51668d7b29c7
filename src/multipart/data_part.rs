use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use bytes::Bytes;

use crate::body::BodyStream;
use crate::utils::mime::{OCTET_STREAM, guess_mime_from_path};

enum PartSource {
    File(PathBuf),
    Reader(Option<Box<dyn Read + Send>>),
    Inline(Bytes),
}

/// One file or blob section of a multipart body.
pub struct DataPart {
    name: String,
    filename: Option<String>,
    content_type: String,
    content_length: Option<u64>,
    source: PartSource,
}

impl DataPart {
    /// A part streamed from a file.
    ///
    /// The field name defaults to the file stem, the filename to the file name
    /// and the content type is guessed from the extension.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filename = path
            .file_name()
            .map(|file_name| file_name.to_string_lossy().into_owned());
        let content_type = guess_mime_from_path(&path).unwrap_or_else(|| OCTET_STREAM.to_string());
        let content_length = std::fs::metadata(&path).ok().map(|m| m.len());
        Self {
            name,
            filename,
            content_type,
            content_length,
            source: PartSource::File(path),
        }
    }

    /// A part streamed from an arbitrary reader. The reader is read once.
    pub fn blob<R>(reader: R, name: impl Into<String>) -> Self
    where
        R: Read + Send + 'static,
    {
        let name = name.into();
        Self {
            filename: Some(name.clone()),
            name,
            content_type: OCTET_STREAM.to_string(),
            content_length: None,
            source: PartSource::Reader(Some(Box::new(reader))),
        }
    }

    /// A textual part held in memory.
    pub fn inline(content: impl Into<String>, name: impl Into<String>) -> Self {
        let content: String = content.into();
        Self {
            name: name.into(),
            filename: None,
            content_type: "text/plain; charset=UTF-8".to_string(),
            content_length: Some(content.len() as u64),
            source: PartSource::Inline(Bytes::from(content)),
        }
    }

    /// A binary part held in memory.
    pub fn bytes(content: impl Into<Bytes>, name: impl Into<String>) -> Self {
        let content = content.into();
        let name = name.into();
        Self {
            filename: Some(name.clone()),
            name,
            content_type: OCTET_STREAM.to_string(),
            content_length: Some(content.len() as u64),
            source: PartSource::Inline(content),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_content_length(mut self, length: Option<u64>) -> Self {
        self.content_length = length;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// `Content-Disposition` value for this part.
    pub fn content_disposition(&self) -> String {
        match &self.filename {
            Some(filename) => format!(
                "form-data; name=\"{}\"; filename=\"{}\"",
                escape_field(&self.name),
                escape_field(filename)
            ),
            None => format!("form-data; name=\"{}\"", escape_field(&self.name)),
        }
    }

    /// Open the part's content.
    pub(crate) fn open(&mut self) -> io::Result<BodyStream> {
        match &mut self.source {
            PartSource::File(path) => Ok(Box::new(File::open(path)?)),
            PartSource::Inline(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            PartSource::Reader(reader) => reader.take().ok_or_else(|| {
                io::Error::other(format!("data part `{}` was already read", self.name))
            }),
        }
    }
}

impl fmt::Debug for DataPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPart")
            .field("name", &self.name)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Escape a quoted header field value: `"` becomes `%22`, CR `%0D`, LF `%0A`.
pub fn escape_field(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            other => escaped.push(other),
        }
    }
    escaped
}
