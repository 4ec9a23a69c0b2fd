//! Header Builder
//!
//! Assembles the HTTP/1.0 request the proxy sends to the origin.

use crate::http::ParsedRequest;

/// User-Agent sent to every origin in place of the client's
pub const USER_AGENT_HEADER: &str = "User-Agent: Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) \
                                     Gecko/20120305 Firefox/10.0.3";

const CRLF: &str = "\r\n";

/// Builds the outbound request bytes for `request`.
///
/// Layout: request line, Host (the client's own line if it sent one),
/// `Connection: close`, `Proxy-Connection: close`, the fixed User-Agent, the
/// client's remaining headers in arrival order, then the blank line.
pub fn build_request_header(request: &ParsedRequest) -> String {
    let mut out = format!("GET {} HTTP/1.0{CRLF}", request.path);

    match &request.client_host_header {
        Some(line) => out.push_str(line),
        None => {
            out.push_str("Host: ");
            out.push_str(&request.host);
        }
    }
    out.push_str(CRLF);

    out.push_str("Connection: close");
    out.push_str(CRLF);
    out.push_str("Proxy-Connection: close");
    out.push_str(CRLF);
    out.push_str(USER_AGENT_HEADER);
    out.push_str(CRLF);

    for header in &request.passthrough_headers {
        out.push_str(header);
        out.push_str(CRLF);
    }
    out.push_str(CRLF);
    out
}
