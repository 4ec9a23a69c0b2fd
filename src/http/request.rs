//! Request Parser
//!
//! Decodes the request line and header block of a proxied GET request.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::cache::{normalize_key, HTTP_SCHEME};
use crate::error::{ProxyError, Result};

/// Longest request or header line accepted, including the line terminator
pub const MAX_LINE: usize = 8192;

/// Port used when neither the target nor the Host header names one
pub const DEFAULT_PORT: u16 = 80;

/// Header lines read and dropped from a request that will be refused
const MAX_SKIPPED_HEADERS: usize = 100;

// == Parsed Request ==
/// One client's request, as needed to forward it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub method: String,
    /// Target exactly as given on the request line
    pub raw_target: String,
    pub host: String,
    pub port: u16,
    /// Path and query, `/` when the target has none
    pub path: String,
    /// Header lines other than Host, Connection, Proxy-Connection and
    /// User-Agent, without their line terminators, in arrival order
    pub passthrough_headers: Vec<String>,
    /// The client's Host line, verbatim
    pub client_host_header: Option<String>,
}

impl ParsedRequest {
    /// Key under which this request's response is cached.
    pub fn cache_key(&self) -> &str {
        normalize_key(&self.raw_target)
    }
}

// == Target Splitting ==
/// Host, port and path split out of a request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetParts {
    /// Empty for host-relative targets such as `/index.html`
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
}

/// Splits a request target into host, optional port and path.
///
/// A leading `http://` is dropped. The first `/` starts the path and the first
/// `:` before it introduces the port. IPv6 literals, userinfo and
/// percent-encoding are not understood.
pub fn parse_target(target: &str) -> Result<TargetParts> {
    let rest = target.strip_prefix(HTTP_SCHEME).unwrap_or(target);
    let (authority, path) = match rest.find('/') {
        Some(index) => (&rest[..index], &rest[index..]),
        None => (rest, "/"),
    };

    let (host, port) = split_host_port(authority)
        .ok_or_else(|| ProxyError::InvalidUri(target.to_string()))?;

    Ok(TargetParts {
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

/// Splits `host[:port]`. An empty port counts as absent; a non-numeric one
/// is an error.
fn split_host_port(authority: &str) -> Option<(&str, Option<u16>)> {
    match authority.split_once(':') {
        Some((host, "")) => Some((host, None)),
        Some((host, port)) => port.parse().ok().map(|port| (host, Some(port))),
        None => Some((authority, None)),
    }
}

// == Header Classification ==
#[derive(Debug, PartialEq, Eq)]
enum HeaderKind {
    Host,
    /// Connection, Proxy-Connection and User-Agent, replaced by the proxy
    Overridden,
    Other,
}

fn classify(line: &str) -> HeaderKind {
    let Some((name, _)) = line.split_once(':') else {
        return HeaderKind::Other;
    };
    let name = name.trim();
    if name.eq_ignore_ascii_case("host") {
        HeaderKind::Host
    } else if ["connection", "proxy-connection", "user-agent"]
        .iter()
        .any(|n| name.eq_ignore_ascii_case(n))
    {
        HeaderKind::Overridden
    } else {
        HeaderKind::Other
    }
}

fn header_value(line: &str) -> &str {
    line.split_once(':').map_or("", |(_, value)| value.trim())
}

// == Line Reading ==
/// Reads one CRLF- or LF-terminated line, without the terminator.
///
/// Returns None at end of stream.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(MAX_LINE as u64)
        .read_until(b'\n', &mut buf)
        .await?;

    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        return if n == MAX_LINE {
            Err(ProxyError::MalformedRequest(format!(
                "line exceeds {MAX_LINE} bytes"
            )))
        } else {
            Err(ProxyError::TruncatedRequest)
        };
    }

    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Discards header lines up to the blank line, end of stream, a read error,
/// or `MAX_SKIPPED_HEADERS` lines, whichever comes first.
async fn skip_headers<R>(reader: &mut R)
where
    R: AsyncBufRead + Unpin,
{
    for _ in 0..MAX_SKIPPED_HEADERS {
        match read_line(reader).await {
            Ok(Some(line)) if !line.is_empty() => {}
            _ => break,
        }
    }
}

// == Read Request ==
/// Reads and parses one request from `reader`.
///
/// Stops right after the blank line ending the header block; anything that
/// follows is left unread. For non-GET methods the header block is skipped
/// before the method is reported, so the client sees the error page instead
/// of a reset.
///
/// A host-relative target with no Host header yields an empty `host`. The
/// request can still be answered from the cache; forwarding it fails.
pub async fn read_request<R>(reader: &mut R) -> Result<ParsedRequest>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(reader)
        .await?
        .ok_or(ProxyError::TruncatedRequest)?;

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [method, target, _version] = tokens.as_slice() else {
        return Err(ProxyError::MalformedRequest(line.clone()));
    };

    if !method.eq_ignore_ascii_case("GET") {
        skip_headers(reader).await;
        return Err(ProxyError::MethodNotSupported(method.to_string()));
    }

    let mut passthrough_headers = Vec::new();
    let mut client_host_header = None;
    loop {
        let header = read_line(reader)
            .await?
            .ok_or(ProxyError::TruncatedRequest)?;
        if header.is_empty() {
            break;
        }
        match classify(&header) {
            HeaderKind::Host => client_host_header = Some(header),
            HeaderKind::Overridden => {}
            HeaderKind::Other => passthrough_headers.push(header),
        }
    }

    let parts = parse_target(target)?;
    let (host, port) = if parts.host.is_empty() {
        // Host-relative target: fall back to the client's Host header
        let value = client_host_header.as_deref().map(header_value).unwrap_or("");
        let (host, port) = split_host_port(value)
            .ok_or_else(|| ProxyError::InvalidUri(target.to_string()))?;
        (host.to_string(), parts.port.or(port))
    } else {
        (parts.host, parts.port)
    };

    Ok(ParsedRequest {
        method: method.to_string(),
        raw_target: target.to_string(),
        host,
        port: port.unwrap_or(DEFAULT_PORT),
        path: parts.path,
        passthrough_headers,
        client_host_header,
    })
}
