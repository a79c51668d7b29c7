//! JSON request bodies.

use serde::Serialize;

use crate::error::RequestError;
use crate::http::Request;
use crate::http::headers::CONTENT_TYPE;

const APPLICATION_JSON: &str = "application/json";

impl Request {
    /// Use an already serialized JSON document as the body.
    pub fn json_body(self, json: impl Into<String>) -> Self {
        self.header(CONTENT_TYPE, APPLICATION_JSON).body_bytes(json.into())
    }

    /// Serialize `value` with `serde_json` and use it as the body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, RequestError> {
        let bytes = serde_json::to_vec(value)?;
        Ok(self.header(CONTENT_TYPE, APPLICATION_JSON).body_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{MockClient, manager_with_client, respond_with};
    use serde::Serialize;
    use std::sync::Arc;

    #[derive(Serialize)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    #[test]
    fn serialized_body_is_sent_with_json_content_type() {
        let client = Arc::new(MockClient::new(|_| respond_with(201, "")));
        let manager = manager_with_client(client.clone());
        manager
            .post("https://example.com/items")
            .unwrap()
            .json(&Item { id: 7, name: "lamp" })
            .unwrap()
            .response()
            .unwrap();

        let call = &client.calls()[0];
        assert_eq!(call.headers.get("content-type"), ["application/json"]);
        assert_eq!(call.body, br#"{"id":7,"name":"lamp"}"#);
    }

    #[test]
    fn raw_json_overrides_previous_content_type() {
        let client = Arc::new(MockClient::new(|_| respond_with(200, "")));
        let manager = manager_with_client(client.clone());
        manager
            .put("https://example.com/items/7")
            .unwrap()
            .header("Content-Type", "text/plain")
            .json_body(r#"{"ok":true}"#)
            .response()
            .unwrap();

        let call = &client.calls()[0];
        assert_eq!(call.headers.get("Content-Type"), ["application/json"]);
        assert_eq!(call.body, br#"{"ok":true}"#);
    }
}
