use crate::error::RequestError;
use crate::execution::interceptor::{RequestInterceptor, RequestTransformer};
use crate::http::Request;
use crate::http::headers::CONTENT_TYPE;
use crate::http::parameters::encode_form;
use crate::multipart::is_multipart;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Moves request parameters into the URL query or a form body.
///
/// Multipart requests are left alone; their parameters become form sections.
/// POST, PUT and PATCH requests without a body and with no Content-Type or a
/// form Content-Type get a form-encoded body. Everything else gets the
/// parameters appended to the query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterEncoder;

impl RequestInterceptor for ParameterEncoder {
    fn intercept(
        &self,
        mut request: Request,
        next: &RequestTransformer,
    ) -> Result<Request, RequestError> {
        let content_type = request.content_type().unwrap_or_default().to_string();
        if is_multipart(&content_type) || request.parameters().is_empty() {
            return next(request);
        }

        let as_form = request.method().allows_body_parameters()
            && request.body().is_empty()
            && (content_type.trim().is_empty() || content_type.starts_with(FORM_URLENCODED));

        let encoded = encode_form(&request.take_parameters());
        if as_form {
            request = request.header(CONTENT_TYPE, FORM_URLENCODED).body_string(encoded);
        } else {
            let mut url = request.url().clone();
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                _ => encoded,
            };
            url.set_query(Some(&query));
            request.set_url(url);
        }
        next(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::interceptor::identity_request_transformer;
    use crate::multipart::DataPart;
    use crate::testing::{manager_with, respond_with};

    fn encode(request: Request) -> Request {
        ParameterEncoder
            .intercept(request, &identity_request_transformer())
            .unwrap()
    }

    #[test]
    fn get_parameters_go_to_the_query() {
        let manager = manager_with(respond_with(200, ""));
        let request = manager
            .get("https://example.com/search?lang=en")
            .unwrap()
            .parameter("q", "a b")
            .parameter("ids", vec!["1", "2"]);

        let request = encode(request);
        assert_eq!(
            request.url().as_str(),
            "https://example.com/search?lang=en&q=a%20b&ids%5B%5D=1&ids%5B%5D=2"
        );
        assert!(request.parameters().is_empty());
        assert!(request.body().is_empty());
    }

    #[test]
    fn post_parameters_become_a_form_body() {
        let manager = manager_with(respond_with(200, ""));
        let request = manager
            .post("https://example.com/login")
            .unwrap()
            .parameter("user", "ann")
            .parameter("pass", "s3cret");

        let mut request = encode(request);
        assert_eq!(request.content_type(), Some(FORM_URLENCODED));
        assert_eq!(
            &request.body_mut().to_byte_array().unwrap()[..],
            b"user=ann&pass=s3cret"
        );
        assert_eq!(request.url().query(), None);
    }

    #[test]
    fn post_with_existing_body_uses_the_query() {
        let manager = manager_with(respond_with(200, ""));
        let request = manager
            .post("https://example.com/items")
            .unwrap()
            .header(CONTENT_TYPE, "application/json")
            .body_string("{}")
            .parameter("dry_run", "true");

        let request = encode(request);
        assert_eq!(request.url().query(), Some("dry_run=true"));
        assert_eq!(request.content_type(), Some("application/json"));
    }

    #[test]
    fn multipart_requests_keep_their_parameters() {
        let manager = manager_with(respond_with(200, ""));
        let request = manager
            .post("https://example.com/upload")
            .unwrap()
            .parameter("title", "report")
            .data_part(DataPart::inline("x", "file"));

        let request = encode(request);
        assert_eq!(request.parameters().len(), 1);
        assert_eq!(request.url().query(), None);
    }
}
