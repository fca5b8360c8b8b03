//! HTTP protocol implementation.
//!
//! A minimal HTTP/1.1 subset: GET and POST with Content-Length framing and
//! persistent connections.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection request-response state machine
//! - **`parser`**: Parses incoming HTTP requests from byte buffers
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response representation with builder pattern
//! - **`headers`**: Ordered, case-insensitive response headers
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`security`**: Host header and path traversal checks
//! - **`router`**: Method dispatch to the content collaborators
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data (idle timeout)
//!        └──────┬──────┘
//!               │ Request received          ── framing error → 400/413, Writing(close)
//!               ▼
//!        ┌──────────────────┐
//!        │   Validating     │ ← Host header, path traversal
//!        └──────┬───────────┘
//!               │ Valid                      ── violation → 400/403, Writing(close)
//!               ▼
//!        ┌──────────────────┐
//!        │    Routing       │ ← GET / POST / 405, keep-alive negotiation
//!        └──────┬───────────┘
//!               │ Response ready             ── handler failure → 500, Writing(close)
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod security;
pub mod writer;
