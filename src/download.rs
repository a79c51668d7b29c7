//! Downloading response bodies to files.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use crate::body::{Body, DefaultBody};
use crate::http::Request;

/// Where a download request writes its response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDestination {
    path: PathBuf,
}

impl DownloadDestination {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Request {
    /// Write the response body to `destination` once received.
    ///
    /// The response body is rebound to the file, so deserializers read it from
    /// disk. If the request is interrupted the partial file is removed.
    pub fn download(mut self, destination: impl Into<PathBuf>) -> Self {
        let path = destination.into();
        self.capabilities_mut().insert(DownloadDestination { path: path.clone() });

        let partial = path.clone();
        self = self.interrupt(move |_| match std::fs::remove_file(&partial) {
            Ok(()) => {
                tracing::debug!(target: "courier::download", path = %partial.display(), "removed partial download");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(target: "courier::download", path = %partial.display(), error = %e, "failed to remove partial download");
            }
        });

        self.execution_options_mut()
            .append_response_transformer(move |_, mut response| {
                let mut file = BufWriter::new(File::create(&path)?);
                let written = response.body_mut().write_to(&mut file)?;
                tracing::debug!(target: "courier::download", path = %path.display(), bytes = written, "download written");
                Ok(response.with_body(Box::new(DefaultBody::from_file(path.clone()))))
            });
        self
    }

    pub fn is_download(&self) -> bool {
        self.capabilities().contains::<DownloadDestination>()
    }

    pub fn download_destination(&self) -> Option<&Path> {
        self.capabilities()
            .get::<DownloadDestination>()
            .map(DownloadDestination::path)
    }
}
