use std::io::Write;
use std::sync::Arc;

use courier::{DataPart, Manager, Method};
use mockito::Matcher;

mod support;
use support::{EchoClient, manager_over};

#[test]
fn upload_reaches_the_server_as_multipart_form_data() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"from disk").unwrap();
    let file_name = file.path().file_name().unwrap().to_string_lossy().into_owned();

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/upload")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=[0-9a-f]{32}$".into()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"Content-Disposition: form-data; name="title"\r\n"#.into()),
            Matcher::Regex("\r\n\r\nhello\r\n".into()),
            Matcher::Regex(format!(
                r#"Content-Disposition: form-data; name="[^"]+"; filename="{}""#,
                regex::escape(&file_name)
            )),
            Matcher::Regex("Content-Type: text/plain\r\n\r\nfrom disk\r\n".into()),
            Matcher::Regex("--[0-9a-f]{32}--\r\n$".into()),
        ]))
        .with_status(201)
        .create();

    let manager = Manager::new().unwrap();
    let (response, _) = manager
        .upload(&format!("{}/upload", server.url()), Method::Post)
        .unwrap()
        .parameter("title", "hello")
        .data_part(DataPart::file(file.path()))
        .response()
        .unwrap();

    mock.assert();
    assert_eq!(response.status_code(), 201);
}

#[test]
fn body_is_built_from_the_final_boundary() {
    let manager = manager_over(Arc::new(EchoClient));
    let (response, body) = manager
        .upload("/echo", Method::Put)
        .unwrap()
        .header("Content-Type", "multipart/form-data; boundary=fixed-boundary")
        .parameter("tags", vec!["a", "b"])
        .data_part(DataPart::inline("inline text", "note"))
        .response_string()
        .unwrap();

    assert_eq!(
        response.content_type(),
        Some("multipart/form-data; boundary=fixed-boundary")
    );
    assert_eq!(body.matches("name=\"tags[]\"").count(), 2);
    assert!(body.contains(
        "--fixed-boundary\r\nContent-Disposition: form-data; name=\"note\"\r\nContent-Type: text/plain; charset=UTF-8\r\n\r\ninline text\r\n"
    ));
    assert!(body.ends_with("--fixed-boundary--\r\n"));
}

#[test]
fn missing_boundary_fails_before_sending() {
    let manager = manager_over(Arc::new(EchoClient));
    let err = manager
        .upload("/echo", Method::Post)
        .unwrap()
        .header("Content-Type", "multipart/form-data")
        .data_part(DataPart::inline("x", "x"))
        .response()
        .unwrap_err();

    assert!(matches!(err, courier::RequestError::BoundaryMissing { .. }));
}

#[test]
fn reflected_upload_contains_file_and_parameter() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"hello").unwrap();

    let manager = manager_over(Arc::new(EchoClient));
    let (response, body) = manager
        .upload("/upload", Method::Post)
        .unwrap()
        .parameter("foo", "bar")
        .data_part(DataPart::file(file.path()).with_name("file"))
        .valid_status(200..=299)
        .response_string()
        .unwrap();

    assert_eq!(response.status_code(), 200);
    assert!(body.contains("name=\"file\"; filename="));
    assert!(body.contains("hello"));
    assert!(body.contains("bar"));
}
