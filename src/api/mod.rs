//! HTTP API Module
//!
//! The inbound half of the cluster protocol: probes, joins, votes, and
//! master announcements all arrive here.

mod http;

pub use http::HttpServer;
