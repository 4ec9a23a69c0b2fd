//! Error types for the proxy
//!
//! Provides unified error handling using thiserror.

use std::io;

use thiserror::Error;

use crate::http::ErrorPage;

// == Proxy Error Enum ==
/// Unified error type for per-connection request handling.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Request line is not `<method> <target> <version>`
    #[error("Malformed request line: {0:?}")]
    MalformedRequest(String),

    /// Stream ended before the request line or header block was complete
    #[error("Request ended before the header block was complete")]
    TruncatedRequest,

    /// Any method other than GET
    #[error("Method not supported: {0}")]
    MethodNotSupported(String),

    /// Target could not be split into host, port and path
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Connecting to the origin failed
    #[error("Failed to connect to {host}:{port}: {source}")]
    UpstreamUnreachable {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Socket I/O failed mid-request
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// == Error Page Mapping ==
impl ProxyError {
    /// Returns the page to send back to the client, if the client can still be
    /// answered.
    ///
    /// `Io` errors mean the connection itself broke, so nothing is sent.
    pub fn error_page(&self) -> Option<ErrorPage> {
        let page = match self {
            ProxyError::MalformedRequest(line) => {
                ErrorPage::new(400, "Bad Request", "Malformed request line", line)
            }
            ProxyError::TruncatedRequest => {
                ErrorPage::new(400, "Bad Request", "Incomplete request", "")
            }
            ProxyError::MethodNotSupported(method) => ErrorPage::new(
                501,
                "Not Implemented",
                "Proxy does not implement this method",
                method,
            ),
            ProxyError::InvalidUri(uri) => {
                ErrorPage::new(400, "Bad Request", "Invalid URI", uri)
            }
            ProxyError::UpstreamUnreachable { host, .. } => {
                ErrorPage::new(404, "Not Found", "Failed to connect to server", host)
            }
            ProxyError::Io(_) => return None,
        };
        Some(page)
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
