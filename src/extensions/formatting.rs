//! Textual renderings of a request for logging and debugging.
//!
//! Both renderings make the body repeatable before reading it, so the request
//! can still be sent afterwards.

use crate::http::Request;
use crate::http::Method;
use crate::http::parameters::flatten;

pub trait FormattingExt {
    /// A `curl` command line reproducing the request.
    fn curl_string(&mut self) -> String;

    /// The request roughly as it goes over the wire.
    fn http_string(&mut self) -> String;
}

impl Request {
    fn peek_body(&mut self) -> String {
        // multipart bodies only exist once prepared
        if let Err(e) = self.prepare_body() {
            tracing::debug!(target: "courier::http", error = %e, "could not prepare body for formatting");
        }
        self.make_body_repeatable();
        match self.body_mut().to_byte_array() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::debug!(target: "courier::http", error = %e, "could not read body for formatting");
                String::new()
            }
        }
    }
}

impl FormattingExt for Request {
    fn curl_string(&mut self) -> String {
        let mut out = String::from("curl -i");
        if self.method() != Method::Get {
            out.push_str(&format!(" -X {}", self.method()));
        }

        let body = self.peek_body().replace('"', "\\\"");
        if !body.is_empty() {
            out.push_str(&format!(" -d \"{body}\""));
        }

        self.headers().for_each_wire_line(|_, name, value| {
            out.push_str(&format!(" -H \"{name}:{value}\""));
        });
        out.push_str(&format!(" {}", self.url()));
        out
    }

    fn http_string(&mut self) -> String {
        let params = flatten(self.parameters())
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut out = format!("{} {}", self.method(), self.url());
        if !params.is_empty() {
            out.push('?');
            out.push_str(&params);
        }
        out.push_str("\n\n");

        self.headers().for_each_wire_line(|_, name, value| {
            out.push_str(&format!("{name} : {value}\n"));
        });

        let body = self.peek_body();
        out.push('\n');
        out.push_str(&body);
        out.push('\n');
        out
    }
}
