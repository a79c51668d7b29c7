use std::io::{self, BufWriter, Write};

use bytes::Bytes;

use super::data_part::{DataPart, escape_field};
use crate::body::{Body, BodyStream, CopyProgress, DefaultBody};
use crate::error::RequestError;
use crate::http::parameters::{Parameters, flatten};

const CRLF: &str = "\r\n";

/// Streaming `multipart/form-data` encoder.
///
/// Writes every parameter as a text section, then every data part, then the
/// closing boundary. Like other single-use bodies it can be written once;
/// reading it into memory keeps it readable.
pub struct MultipartBody {
    boundary: String,
    parameters: Vec<(String, String)>,
    parts: Vec<DataPart>,
    materialized: Option<DefaultBody>,
    consumed: bool,
}

impl MultipartBody {
    pub fn new(boundary: impl Into<String>, parameters: &Parameters, parts: Vec<DataPart>) -> Self {
        Self {
            boundary: boundary.into(),
            parameters: flatten(parameters),
            parts,
            materialized: None,
            consumed: false,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    fn parameter_section(&self, name: &str, value: &str) -> String {
        format!(
            "--{}{CRLF}Content-Disposition: form-data; name=\"{}\"{CRLF}Content-Type: text/plain; charset=UTF-8{CRLF}{CRLF}{}{CRLF}",
            self.boundary,
            escape_field(name),
            value
        )
    }

    fn part_header(&self, part: &DataPart) -> String {
        format!(
            "--{}{CRLF}Content-Disposition: {}{CRLF}Content-Type: {}{CRLF}{CRLF}",
            self.boundary,
            part.content_disposition(),
            part.content_type()
        )
    }

    fn trailer(&self) -> String {
        format!("--{}--{CRLF}", self.boundary)
    }

    fn encode(&mut self, sink: &mut dyn Write, on_progress: CopyProgress<'_>) -> io::Result<u64> {
        let mut writer = BufWriter::new(sink);
        let mut written = 0u64;

        for (name, value) in &self.parameters {
            let section = self.parameter_section(name, value);
            writer.write_all(section.as_bytes())?;
            written += section.len() as u64;
            on_progress(written);
        }

        let mut parts = std::mem::take(&mut self.parts);
        for part in &mut parts {
            let header = self.part_header(part);
            writer.write_all(header.as_bytes())?;
            written += header.len() as u64;

            let mut content = part.open()?;
            written += io::copy(&mut content, &mut writer)?;

            writer.write_all(CRLF.as_bytes())?;
            written += CRLF.len() as u64;
            on_progress(written);
        }
        self.parts = parts;

        let trailer = self.trailer();
        writer.write_all(trailer.as_bytes())?;
        written += trailer.len() as u64;
        writer.flush()?;
        on_progress(written);
        Ok(written)
    }
}

impl Body for MultipartBody {
    fn to_byte_array(&mut self) -> Result<Bytes, RequestError> {
        if let Some(body) = self.materialized.as_mut() {
            return body.to_byte_array();
        }
        let mut buffer = Vec::with_capacity(self.length().unwrap_or(1024) as usize);
        self.write_to(&mut buffer)?;
        let bytes = Bytes::from(buffer);
        self.materialized = Some(DefaultBody::from_bytes(bytes.clone()));
        Ok(bytes)
    }

    fn to_stream(&mut self) -> Result<BodyStream, RequestError> {
        self.to_byte_array()?;
        match self.materialized.as_mut() {
            Some(body) => body.to_stream(),
            None => Err(RequestError::consumed()),
        }
    }

    fn write_to_with_progress(
        &mut self,
        sink: &mut dyn Write,
        on_progress: CopyProgress<'_>,
    ) -> Result<u64, RequestError> {
        if let Some(body) = self.materialized.as_mut() {
            return body.write_to_with_progress(sink, on_progress);
        }
        if self.consumed {
            return Err(RequestError::consumed());
        }
        self.consumed = true;
        Ok(self.encode(sink, on_progress)?)
    }

    fn is_empty(&self) -> bool {
        self.materialized.as_ref().is_some_and(Body::is_empty)
    }

    fn is_consumed(&self) -> bool {
        match &self.materialized {
            Some(body) => body.is_consumed(),
            None => self.consumed,
        }
    }

    /// Exact encoded size, or `None` when any part's length is unknown.
    fn length(&self) -> Option<u64> {
        if let Some(body) = &self.materialized {
            return body.length();
        }
        let parameters: u64 = self
            .parameters
            .iter()
            .map(|(name, value)| self.parameter_section(name, value).len() as u64)
            .sum();
        let mut total = parameters + self.trailer().len() as u64;
        for part in &self.parts {
            total += self.part_header(part).len() as u64 + part.content_length()? + CRLF.len() as u64;
        }
        Some(total)
    }
}

/// Extract the boundary parameter of a multipart Content-Type.
pub fn boundary_of(content_type: &str) -> Option<String> {
    let (_, rest) = content_type.split_once("boundary=")?;
    let boundary = rest.split(';').next().unwrap_or_default().trim().trim_matches('"');
    (!boundary.is_empty()).then(|| boundary.to_string())
}
