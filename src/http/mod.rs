//! HTTP Module
//!
//! Just enough HTTP/1.0 to relay GET requests: request parsing, the outbound
//! request header, and client-facing error pages.

pub mod headers;
pub mod request;
pub mod response;

pub use headers::{build_request_header, USER_AGENT_HEADER};
pub use request::{parse_target, read_request, ParsedRequest, TargetParts, DEFAULT_PORT, MAX_LINE};
pub use response::ErrorPage;
