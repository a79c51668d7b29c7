//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use courier::body::Body;
use courier::{Client, Manager, Request, Response, TransportError};

/// Answers with the request body, echoing the request Content-Type.
#[derive(Debug, Default)]
pub struct EchoClient;

impl Client for EchoClient {
    fn execute(&self, request: &mut Request) -> Result<Response, TransportError> {
        let mut body = Vec::new();
        request
            .body_mut()
            .write_to(&mut body)
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let mut response = Response::new(request.url().clone(), 200).with_message("OK");
        if let Some(content_type) = request.content_type() {
            response = response.with_header("Content-Type", content_type);
        }
        Ok(response.with_bytes(body))
    }
}

/// Blocks every exchange until the request is cancelled or the gate opens.
#[derive(Debug, Default)]
pub struct GatedClient {
    open: AtomicBool,
    entered: AtomicUsize,
}

impl GatedClient {
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    /// Number of exchanges that reached the transport.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    /// Wait until `count` exchanges reached the transport.
    pub fn wait_for_entries(&self, count: usize) {
        while self.entered() < count {
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

impl Client for GatedClient {
    fn execute(&self, request: &mut Request) -> Result<Response, TransportError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        loop {
            if request.cancel_handle().is_cancelled() {
                return Err(TransportError::Interrupted);
            }
            if self.open.load(Ordering::SeqCst) {
                return Ok(Response::new(request.url().clone(), 200).with_bytes(&b"released"[..]));
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

/// Manager over `client` with its own worker runtime for callback executions.
pub fn manager_over(client: Arc<dyn Client>) -> Manager {
    Manager::builder()
        .with_base_path("https://courier.test")
        .with_client(client)
        .build()
        .unwrap()
}
