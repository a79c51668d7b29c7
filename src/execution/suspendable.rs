//! Async execution.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::task::RequestTask;
use crate::deserialize::{
    ByteArrayDeserializer, JsonDeserializer, ResponseDeserializable, ResponseOf,
    StringDeserializer,
};
use crate::error::{RequestError, TransportError};
use crate::http::{Request, Response};

/// Suspending execution.
///
/// Cancelling the request's handle while the exchange is pending resolves the
/// future with an interruption error and runs the interrupt callbacks.
impl Request {
    /// Await the raw response.
    pub async fn await_raw(self) -> Result<Response, RequestError> {
        let mut request = RequestTask::prepare(self)?;
        let cancel = request.cancel_handle().clone();
        let client = Arc::clone(&request.execution_options().client);

        let sent = match RequestTask::ensure_not_cancelled(&request) {
            Ok(()) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(TransportError::Interrupted),
                    result = client.execute_async(&mut request) => result,
                }
            }
            Err(e) => return RequestTask::conclude(&request, Err(e)),
        };

        let result = match sent {
            Ok(response) => RequestTask::finish(&mut request, response),
            Err(source) => Err(RequestError::transport(source)),
        };
        RequestTask::conclude(&request, result)
    }

    /// Await the response and the deserialized value.
    pub async fn await_response<D>(self, deserializer: &D) -> Result<ResponseOf<D::Output>, RequestError>
    where
        D: ResponseDeserializable + ?Sized,
    {
        let response = self.await_raw().await?;
        deserializer.deserialize(response)
    }

    /// Await only the deserialized value.
    pub async fn await_object<D>(self, deserializer: &D) -> Result<D::Output, RequestError>
    where
        D: ResponseDeserializable + ?Sized,
    {
        self.await_response(deserializer).await.map(|(_, value)| value)
    }

    pub async fn await_bytes(self) -> Result<Bytes, RequestError> {
        self.await_object(&ByteArrayDeserializer).await
    }

    pub async fn await_string(self) -> Result<String, RequestError> {
        self.await_object(&StringDeserializer::new()).await
    }

    pub async fn await_json<T: DeserializeOwned>(self) -> Result<T, RequestError> {
        self.await_object(&JsonDeserializer::<T>::new()).await
    }
}
