//! Turning responses into values.
//!
//! A [`ResponseDeserializable`] implements at least one of four strategies.
//! They are tried in order (bytes, stream, reader, string) and the first one
//! implemented decides the outcome. The response body is read into memory
//! first, so it stays available on the returned response.

mod builtin;

pub use builtin::{ByteArrayDeserializer, EmptyDeserializer, JsonDeserializer, StringDeserializer};

use std::io::{BufRead, Cursor, Read};

use crate::body::representation::{charset_of, decode};
use crate::error::{BoxError, RequestError};
use crate::http::Response;

/// A response together with the value deserialized from it.
pub type ResponseOf<T> = (Response, T);

/// Outcome of a single strategy: `None` when the strategy is not implemented.
pub type Attempt<T> = Option<Result<T, BoxError>>;

pub trait ResponseDeserializable: Send + Sync {
    type Output;

    fn from_bytes(&self, _bytes: &[u8]) -> Attempt<Self::Output> {
        None
    }

    fn from_stream(&self, _stream: &mut dyn Read) -> Attempt<Self::Output> {
        None
    }

    fn from_reader(&self, _reader: &mut dyn BufRead) -> Attempt<Self::Output> {
        None
    }

    /// Receives the body decoded with the response's charset (UTF-8 by default).
    fn from_string(&self, _content: &str) -> Attempt<Self::Output> {
        None
    }

    fn deserialize(&self, response: Response) -> Result<ResponseOf<Self::Output>, RequestError> {
        deserialize_response(self, response)
    }
}

/// Run the strategies of `deserializer` against `response`.
///
/// Fails with a configuration error when no strategy is implemented and with
/// a deserialization error, carrying the response, when the chosen one fails.
pub fn deserialize_response<D>(
    deserializer: &D,
    mut response: Response,
) -> Result<ResponseOf<D::Output>, RequestError>
where
    D: ResponseDeserializable + ?Sized,
{
    let bytes = response.data()?;
    let charset = response.content_type().and_then(charset_of).map(str::to_owned);

    let attempt = deserializer
        .from_bytes(&bytes)
        .or_else(|| deserializer.from_stream(&mut Cursor::new(&bytes[..])))
        .or_else(|| deserializer.from_reader(&mut Cursor::new(&bytes[..])))
        .or_else(|| deserializer.from_string(&decode(&bytes, charset.as_deref())));

    match attempt {
        Some(Ok(value)) => Ok((response, value)),
        Some(Err(source)) => Err(RequestError::deserialization(source, response)),
        None => Err(RequestError::configuration(
            "deserializer must implement at least one of from_bytes, from_stream, from_reader or from_string",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use std::sync::Mutex;
    use url::Url;

    fn response(body: &'static str) -> Response {
        Response::new(Url::parse("https://example.com").unwrap(), 200)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_bytes(body)
    }

    struct Nothing;

    impl ResponseDeserializable for Nothing {
        type Output = ();
    }

    #[derive(Default)]
    struct StreamAndString {
        used: Mutex<Vec<&'static str>>,
    }

    impl ResponseDeserializable for StreamAndString {
        type Output = usize;

        fn from_stream(&self, stream: &mut dyn Read) -> Attempt<usize> {
            self.used.lock().unwrap().push("stream");
            let mut content = Vec::new();
            Some(stream.read_to_end(&mut content).map_err(Into::into))
        }

        fn from_string(&self, content: &str) -> Attempt<usize> {
            self.used.lock().unwrap().push("string");
            Some(Ok(content.len()))
        }
    }

    struct Failing;

    impl ResponseDeserializable for Failing {
        type Output = u32;

        fn from_string(&self, content: &str) -> Attempt<u32> {
            Some(content.trim().parse::<u32>().map_err(Into::into))
        }
    }

    #[test]
    fn missing_strategies_are_a_configuration_error() {
        let err = Nothing.deserialize(response("x")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn first_implemented_strategy_wins() {
        let deserializer = StreamAndString::default();
        let (_, length) = deserializer.deserialize(response("hello")).unwrap();
        assert_eq!(length, 5);
        assert_eq!(*deserializer.used.lock().unwrap(), vec!["stream"]);
    }

    #[test]
    fn failure_carries_the_response() {
        let err = Failing.deserialize(response("not a number")).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Deserialization);
        let mut response = err.into_response().unwrap();
        assert_eq!(&response.data().unwrap()[..], b"not a number");
    }

    #[test]
    fn body_stays_readable_after_success() {
        let (mut response, value) = Failing.deserialize(response("42")).unwrap();
        assert_eq!(value, 42);
        assert_eq!(&response.data().unwrap()[..], b"42");
    }
}
