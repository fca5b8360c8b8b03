use harbor::http::request::{Method, Request, RequestBuilder, Version};
use std::collections::HashMap;

fn request(version: Version, connection: Option<&str>) -> Request {
    let mut builder = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .version(version);
    if let Some(value) = connection {
        builder = builder.header("Connection", value);
    }
    builder.build().unwrap()
}

#[test]
fn test_request_header_retrieval_ignores_case() {
    let mut headers = HashMap::new();
    headers.insert("host".to_string(), "example.com".to_string());
    headers.insert("content-type".to_string(), "application/json".to_string());

    let req = Request {
        method: Method::GET,
        path: "/".to_string(),
        version: Version::Http11,
        headers,
        body: vec![],
    };

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_keep_alive_http11_default() {
    assert!(request(Version::Http11, None).keep_alive());
    assert!(request(Version::Http11, Some("keep-alive")).keep_alive());
}

#[test]
fn test_request_keep_alive_http11_close() {
    assert!(!request(Version::Http11, Some("close")).keep_alive());
    assert!(!request(Version::Http11, Some("Close")).keep_alive());
}

#[test]
fn test_request_keep_alive_http10_default_close() {
    assert!(!request(Version::Http10, None).keep_alive());
    assert!(request(Version::Http10, Some("Keep-Alive")).keep_alive());
}

#[test]
fn test_request_method_from_token() {
    assert_eq!(Method::parse("GET"), Method::GET);
    assert_eq!(Method::parse("POST"), Method::POST);
    assert_eq!(Method::parse("PUT"), Method::PUT);
    assert_eq!(Method::parse("get"), Method::GET);
    assert_eq!(Method::parse("Post"), Method::POST);
    assert_eq!(Method::parse("brew").as_str(), "BREW");
}

#[test]
fn test_request_version_tokens() {
    assert_eq!(Version::parse("HTTP/1.0"), Some(Version::Http10));
    assert_eq!(Version::parse("HTTP/1.1"), Some(Version::Http11));
    assert_eq!(Version::parse("HTTP/2"), None);
    assert_eq!(Version::Http11.to_string(), "HTTP/1.1");
}

#[test]
fn test_request_builder_requires_method_and_path() {
    assert!(RequestBuilder::new().path("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());

    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .build()
        .unwrap();
    assert_eq!(req.version, Version::Http11);
}
