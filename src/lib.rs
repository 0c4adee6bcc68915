//! webd - minimal static file server
//!
//! Core library: request parsing, path resolution, response writing and
//! connection tracking.

pub mod config;
pub mod http;
pub mod server;
