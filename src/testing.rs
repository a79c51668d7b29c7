//! In-memory transport and manager helpers for unit tests.

use std::sync::{Arc, Mutex};

use url::Url;

use crate::Manager;
use crate::error::TransportError;
use crate::execution::InlineExecutor;
use crate::http::{Headers, Method, Request, Response};
use crate::transport::Client;

/// What the mock transport saw for one exchange.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Vec<u8>,
}

type Responder = Box<dyn Fn(&RecordedRequest) -> Result<Response, TransportError> + Send + Sync>;

/// Transport that records requests and answers from a closure.
pub struct MockClient {
    responder: Responder,
    calls: Mutex<Vec<RecordedRequest>>,
}

impl MockClient {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Response + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(move |recorded| Ok(respond(recorded))),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing<F>(error: F) -> Self
    where
        F: Fn() -> TransportError + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(move |_| Err(error())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl Client for MockClient {
    fn execute(&self, request: &mut Request) -> Result<Response, TransportError> {
        if request.cancel_handle().is_cancelled() {
            return Err(TransportError::Interrupted);
        }
        let mut body = Vec::new();
        request
            .body_mut()
            .write_to(&mut body)
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let recorded = RecordedRequest {
            method: request.method(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body,
        };
        self.calls.lock().unwrap().push(recorded.clone());

        let response = (self.responder)(&recorded)?;
        Ok(response.with_url(recorded.url))
    }
}

/// Response with an in-memory body. The URL is replaced by the mock client.
pub fn respond_with(status: u16, body: &str) -> Response {
    let url = Url::parse("http://mock.invalid/").unwrap();
    Response::new(url, status).with_bytes(body.as_bytes().to_vec())
}

/// Manager whose transport answers every request with a copy of `template`.
pub fn manager_with(mut template: Response) -> Manager {
    let status = template.status_code();
    let message = template.response_message().to_string();
    let headers = template.headers().clone();
    let bytes = template.data().unwrap();
    manager_with_client(Arc::new(MockClient::new(move |_| {
        Response::new(Url::parse("http://mock.invalid/").unwrap(), status)
            .with_message(message.clone())
            .with_headers(headers.clone())
            .with_bytes(bytes.clone())
    })))
}

/// Manager over `client`, running everything on the calling thread.
pub fn manager_with_client(client: Arc<MockClient>) -> Manager {
    Manager::builder()
        .with_client(client)
        .with_executor(Arc::new(InlineExecutor))
        .build()
        .unwrap()
}
