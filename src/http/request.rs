use std::collections::HashMap;
use std::fmt;

/// HTTP request methods.
///
/// Only GET and POST are routed; every other method is answered with
/// 405 Method Not Allowed. Tokens that are not standard methods are kept
/// verbatim in [`Method::Extension`] so they can still be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
    OPTIONS,
    PATCH,
    /// Any other method token
    Extension(String),
}

/// Protocol versions accepted on the request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

/// A request as read off the wire.
///
/// Header names are stored lower-cased; a repeated header keeps the last value.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// The request target exactly as sent (e.g., "/index.html")
    pub path: String,
    /// HTTP version from the request line
    pub version: Version,
    /// Request headers keyed by lower-cased name
    pub headers: HashMap<String, String>,
    /// Request body, exactly Content-Length bytes
    pub body: Vec<u8>,
}

/// Assembles a [`Request`] without going through the parser.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<Version>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Method {
    /// Maps a request-line token to a method, ignoring case. Unknown tokens
    /// are kept upper-cased.
    ///
    /// # Example
    ///
    /// ```
    /// # use harbor::http::request::Method;
    /// assert_eq!(Method::parse("get"), Method::GET);
    /// assert_eq!(Method::parse("brew"), Method::Extension("BREW".to_string()));
    /// ```
    pub fn parse(token: &str) -> Self {
        let token = token.to_ascii_uppercase();
        match token.as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            "PATCH" => Method::PATCH,
            _ => Method::Extension(token),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::Extension(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Version {
    /// Returns `None` for anything other than `HTTP/1.0` and `HTTP/1.1`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "HTTP/1.0" => Some(Version::Http10),
            "HTTP/1.1" => Some(Version::Http11),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Header names are folded to lower case, like the parser does.
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.as_ref().trim().to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or(Version::Http11),
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Request {
    /// Case-insensitive header lookup.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Determines whether the client asked to keep the connection open.
    ///
    /// HTTP/1.0 closes unless `Connection: keep-alive` is sent.
    /// HTTP/1.1 stays open unless `Connection: close` is sent.
    pub fn keep_alive(&self) -> bool {
        let connection = self.header("connection").map(str::trim);
        match self.version {
            Version::Http10 => {
                connection.is_some_and(|v| v.eq_ignore_ascii_case("keep-alive"))
            }
            Version::Http11 => !connection.is_some_and(|v| v.eq_ignore_ascii_case("close")),
        }
    }
}
