use std::io::BufRead;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::{Attempt, ResponseDeserializable};
use crate::body::representation::decode;

/// Raw body bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteArrayDeserializer;

impl ResponseDeserializable for ByteArrayDeserializer {
    type Output = Bytes;

    fn from_bytes(&self, bytes: &[u8]) -> Attempt<Bytes> {
        Some(Ok(Bytes::copy_from_slice(bytes)))
    }
}

/// Body text, decoded with the response charset unless one is forced.
#[derive(Debug, Clone, Default)]
pub struct StringDeserializer {
    charset: Option<String>,
}

impl StringDeserializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_charset(charset: impl Into<String>) -> Self {
        Self {
            charset: Some(charset.into()),
        }
    }
}

impl ResponseDeserializable for StringDeserializer {
    type Output = String;

    fn from_bytes(&self, bytes: &[u8]) -> Attempt<String> {
        let charset = self.charset.as_deref()?;
        Some(Ok(decode(bytes, Some(charset))))
    }

    fn from_string(&self, content: &str) -> Attempt<String> {
        Some(Ok(content.to_string()))
    }
}

/// Ignores the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDeserializer;

impl ResponseDeserializable for EmptyDeserializer {
    type Output = ();

    fn from_bytes(&self, _bytes: &[u8]) -> Attempt<()> {
        Some(Ok(()))
    }
}

/// JSON body via `serde_json`.
pub struct JsonDeserializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDeserializer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonDeserializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonDeserializer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonDeserializer").finish()
    }
}

impl<T: DeserializeOwned> ResponseDeserializable for JsonDeserializer<T> {
    type Output = T;

    fn from_reader(&self, reader: &mut dyn BufRead) -> Attempt<T> {
        Some(serde_json::from_reader(reader).map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use serde::Deserialize;
    use url::Url;

    fn response(content_type: &str, body: Vec<u8>) -> Response {
        Response::new(Url::parse("https://example.com").unwrap(), 200)
            .with_header("Content-Type", content_type)
            .with_bytes(body)
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
        name: String,
    }

    #[test]
    fn json_values_are_parsed() {
        let (_, item) = JsonDeserializer::<Item>::new()
            .deserialize(response("application/json", br#"{"id":1,"name":"a"}"#.to_vec()))
            .unwrap();
        assert_eq!(item, Item { id: 1, name: "a".into() });
    }

    #[test]
    fn malformed_json_is_a_deserialization_error() {
        let err = JsonDeserializer::<Item>::new()
            .deserialize(response("application/json", b"{".to_vec()))
            .unwrap_err();
        assert!(matches!(err, crate::error::RequestError::DeserializationError { .. }));
    }

    #[test]
    fn strings_follow_the_response_charset() {
        let (_, text) = StringDeserializer::new()
            .deserialize(response("text/plain; charset=ISO-8859-1", vec![0x63, 0xE9]))
            .unwrap();
        assert_eq!(text, "cé");

        let (_, forced) = StringDeserializer::with_charset("UTF-8")
            .deserialize(response("text/plain; charset=ISO-8859-1", "é".as_bytes().to_vec()))
            .unwrap();
        assert_eq!(forced, "é");
    }

    #[test]
    fn bytes_and_empty() {
        let (_, bytes) = ByteArrayDeserializer
            .deserialize(response("application/octet-stream", vec![1, 2, 3]))
            .unwrap();
        assert_eq!(&bytes[..], &[1, 2, 3]);
        EmptyDeserializer
            .deserialize(response("text/plain", Vec::new()))
            .unwrap();
    }
}
