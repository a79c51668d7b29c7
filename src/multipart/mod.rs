//! `multipart/form-data` uploads.
//!
//! Enabling multipart on a request sets a Content-Type with a fresh boundary
//! and registers lazily evaluated [`DataPart`]s. The body is assembled when the
//! request is sent, after request interceptors ran, from the parameters, the
//! parts and the boundary found in the final Content-Type header.

mod data_part;
mod encoder;

pub use data_part::{DataPart, escape_field};
pub use encoder::{MultipartBody, boundary_of};

use crate::error::RequestError;
use crate::http::Request;
use crate::http::headers::CONTENT_TYPE;

/// Lazily evaluated data part.
pub type LazyDataPart = Box<dyn FnOnce(&Request) -> DataPart + Send>;

/// Per-request multipart state.
#[derive(Default)]
pub struct MultipartParts {
    parts: Vec<LazyDataPart>,
}

impl MultipartParts {
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Whether a Content-Type denotes a multipart form.
pub fn is_multipart(content_type: &str) -> bool {
    content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
}

/// Fresh boundary token.
pub fn generate_boundary() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl Request {
    /// Turn this request into a multipart upload.
    pub fn multipart(mut self) -> Self {
        if !self.capabilities().contains::<MultipartParts>() {
            self.capabilities_mut().insert(MultipartParts::default());
            let content_type = format!("multipart/form-data; boundary={}", generate_boundary());
            self.headers_mut().set(CONTENT_TYPE, content_type);
        }
        self
    }

    pub fn is_multipart(&self) -> bool {
        self.capabilities().contains::<MultipartParts>()
    }

    /// Add a data part, enabling multipart if needed.
    pub fn data_part(self, part: DataPart) -> Self {
        self.lazy_data_part(Box::new(move |_| part))
    }

    /// Add a data part computed from the request when the body is built.
    pub fn lazy_data_part(self, part: LazyDataPart) -> Self {
        let mut request = self.multipart();
        if let Some(state) = request.capabilities_mut().get_mut::<MultipartParts>() {
            state.parts.push(part);
        }
        request
    }

    /// Assemble the multipart body, if this is a multipart request whose body
    /// was not built yet. Parameters move into the body.
    pub fn prepare_body(&mut self) -> Result<(), RequestError> {
        let Some(state) = self.capabilities_mut().remove::<MultipartParts>() else {
            return Ok(());
        };
        let body = self.encode_multipart(state)?;
        self.set_body(Box::new(body));
        Ok(())
    }

    fn encode_multipart(&mut self, state: MultipartParts) -> Result<MultipartBody, RequestError> {
        let content_type = self.content_type().unwrap_or_default().to_string();
        let Some(boundary) = boundary_of(&content_type) else {
            return Err(RequestError::BoundaryMissing { content_type });
        };
        let request: &Request = self;
        let parts: Vec<DataPart> = state.parts.into_iter().map(|part| part(request)).collect();
        let parameters = self.take_parameters();
        tracing::trace!(
            target: "courier::multipart",
            %boundary,
            parts = parts.len(),
            parameters = parameters.len(),
            "assembling multipart body"
        );
        Ok(MultipartBody::new(boundary, &parameters, parts))
    }
}
