use harbor::http::response::{Body, Response, ResponseBuilder, SERVER_NAME, StatusCode};
use harbor::http::writer::serialize_response;

/// Parses wire bytes the way an HTTP client would.
fn client_parse(wire: &[u8]) -> (u16, Vec<(String, String)>, Vec<u8>) {
    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut parsed = httparse::Response::new(&mut headers);
    let header_len = match parsed.parse(wire).unwrap() {
        httparse::Status::Complete(n) => n,
        httparse::Status::Partial => panic!("response head incomplete"),
    };

    let headers: Vec<(String, String)> = parsed
        .headers
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8(h.value.to_vec()).unwrap(),
            )
        })
        .collect();
    let content_length: usize = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .map(|(_, v)| v.parse().unwrap())
        .unwrap_or(0);

    (
        parsed.code.unwrap(),
        headers,
        wire[header_len..header_len + content_length].to_vec(),
    )
}

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::Created.as_u16(), 201);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::PayloadTooLarge.as_u16(), 413);
    assert_eq!(StatusCode::UnsupportedMediaType.as_u16(), 415);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::Forbidden.reason_phrase(), "Forbidden");
    assert_eq!(
        StatusCode::UnsupportedMediaType.reason_phrase(),
        "Unsupported Media Type"
    );
}

#[test]
fn test_builder_injects_date_and_server() {
    let response = ResponseBuilder::new(StatusCode::Ok).text("hi").build();

    assert_eq!(response.header("Server"), Some(SERVER_NAME));
    let date = response.header("Date").unwrap();
    assert!(date.ends_with(" GMT"), "{date}");
    assert!(httpdate::parse_http_date(date).is_ok());
}

#[test]
fn test_builder_keeps_caller_date_and_server() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Server", "custom")
        .header("date", "Thu, 01 Jan 1970 00:00:00 GMT")
        .build();

    assert_eq!(response.header("Server"), Some("custom"));
    assert_eq!(response.header("Date"), Some("Thu, 01 Jan 1970 00:00:00 GMT"));
    assert_eq!(response.headers.len(), 2);
}

#[test]
fn test_serialize_exact_bytes() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Date", "Thu, 01 Jan 1970 00:00:00 GMT")
        .header("Server", "test")
        .header("Content-Type", "text/plain")
        .text("héllo")
        .build();

    let wire = serialize_response(&response);
    assert_eq!(
        wire,
        b"HTTP/1.1 200 OK\r\n\
          Date: Thu, 01 Jan 1970 00:00:00 GMT\r\n\
          Server: test\r\n\
          Content-Type: text/plain\r\n\
          Content-Length: 6\r\n\
          \r\n\
          h\xc3\xa9llo"
            .to_vec()
    );
}

#[test]
fn test_serialize_keeps_explicit_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "4")
        .binary(b"test".to_vec())
        .build();

    let wire = String::from_utf8(serialize_response(&response)).unwrap();
    assert_eq!(wire.matches("Content-Length").count(), 1);
}

#[test]
fn test_serialize_without_body_has_no_content_length() {
    let response = ResponseBuilder::new(StatusCode::NotFound).build();

    let wire = String::from_utf8(serialize_response(&response)).unwrap();
    assert!(!wire.contains("Content-Length"));
    assert!(wire.ends_with("\r\n\r\n"));
}

#[test]
fn test_binary_body_written_verbatim() {
    let bytes: Vec<u8> = (0..=255u8).collect();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .binary(bytes.clone())
        .build();
    let wire = serialize_response(&response);

    assert!(wire.ends_with(&bytes));
    assert_eq!(response.body, Some(Body::Binary(bytes)));
}

#[test]
fn test_round_trip_through_http_client() {
    let mut response = ResponseBuilder::new(StatusCode::Created)
        .header("Content-Type", "application/json")
        .header("X-Custom", "value")
        .text(r#"{"status":"success"}"#)
        .build();
    response.headers.set("Connection", "close");

    let (status, headers, body) = client_parse(&serialize_response(&response));

    assert_eq!(status, 201);
    assert_eq!(body, br#"{"status":"success"}"#.to_vec());

    let mut expected: Vec<(String, String)> = response
        .headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
        .collect();
    expected.push(("content-length".to_string(), body.len().to_string()));
    let mut actual = headers;
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);
}

#[test]
fn test_error_page_names_status() {
    let response = Response::error(StatusCode::Forbidden);
    let (status, headers, body) = client_parse(&serialize_response(&response));
    let body = String::from_utf8(body).unwrap();

    assert_eq!(status, 403);
    assert!(body.contains("<h1>403 Forbidden</h1>"));
    assert!(
        headers
            .iter()
            .any(|(k, v)| k == "content-type" && v.starts_with("text/html"))
    );
}

#[test]
fn test_method_not_allowed_advertises_allow() {
    let response = Response::method_not_allowed();

    assert_eq!(response.status, StatusCode::MethodNotAllowed);
    assert_eq!(response.header("Allow"), Some("GET, POST"));
}
