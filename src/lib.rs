//! Harbor - bounded-concurrency HTTP/1.1 server
//!
//! Core library: wire parsing and serialization, the per-connection
//! keep-alive loop, and the worker pool that bounds concurrency.

pub mod cli;
pub mod config;
pub mod content;
pub mod http;
pub mod server;
