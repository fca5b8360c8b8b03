use std::time::SystemTime;

use crate::http::headers::HeaderList;

/// Value of the `Server` header added to every response.
pub const SERVER_NAME: &str = concat!("Harbor/", env!("CARGO_PKG_VERSION"));

/// HTTP status codes produced by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    Created,
    BadRequest,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    PayloadTooLarge,
    UnsupportedMediaType,
    InternalServerError,
}

impl StatusCode {
    /// Numeric status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use harbor::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::UnsupportedMediaType => 415,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::UnsupportedMediaType => "Unsupported Media Type",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Response payload.
///
/// `Text` is UTF-8 encoded on the wire; `Binary` is written untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Binary(Vec<u8>),
}

impl Body {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(text) => text.as_bytes(),
            Body::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers in serialization order
    pub headers: HeaderList,
    /// Response body, if any
    pub body: Option<Body>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use harbor::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "application/json")
///     .text("{}")
///     .build();
/// assert!(response.headers.contains("Date"));
/// ```
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderList,
    body: Option<Body>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderList::new(),
            body: None,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(key, value);
        self
    }

    /// Sets a text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::Text(body.into()));
        self
    }

    /// Sets an opaque binary body.
    pub fn binary(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(Body::Binary(body.into()));
        self
    }

    /// Builds the final Response.
    ///
    /// `Date` and `Server` are added unless the caller already set them.
    /// Content-Length is left to serialization.
    pub fn build(mut self) -> Response {
        self.headers
            .set_default("Date", || httpdate::fmt_http_date(SystemTime::now()));
        self.headers.set_default("Server", || SERVER_NAME.to_string());

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates an HTML error page naming the status.
    pub fn error(status: StatusCode) -> Self {
        ResponseBuilder::new(status)
            .header("Content-Type", "text/html; charset=utf-8")
            .text(error_page(status))
            .build()
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound)
    }

    /// Creates a 405 response advertising the routed methods.
    pub fn method_not_allowed() -> Self {
        let mut response = Self::error(StatusCode::MethodNotAllowed);
        response.headers.set("Allow", "GET, POST");
        response
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        Self::error(StatusCode::InternalServerError)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Body::len)
    }
}

fn error_page(status: StatusCode) -> String {
    let code = status.as_u16();
    let reason = status.reason_phrase();
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{code} {reason}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 50px; }}
        h1 {{ color: #d32f2f; }}
    </style>
</head>
<body>
    <h1>{code} {reason}</h1>
    <p>The server encountered an error processing your request.</p>
    <hr>
    <p><em>{SERVER_NAME}</em></p>
</body>
</html>"#
    )
}
