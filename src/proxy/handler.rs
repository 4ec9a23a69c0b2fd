//! Forwarding Pipeline
//!
//! Serves one client connection end to end: parse the request, answer from
//! the cache when possible, otherwise relay the origin's response while
//! mirroring it into a bounded buffer for cache admission.

use std::io;
use std::net::SocketAddr;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::cache::{Admission, CacheStore};
use crate::error::{ProxyError, Result};
use crate::http::{build_request_header, read_request, ParsedRequest, MAX_LINE};
use crate::proxy::ProxyState;

/// How a successfully served request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Payload written straight from a cache slot
    CacheHit { bytes: usize },
    /// Response streamed from the origin
    Relayed { bytes: usize, cached: bool },
}

/// Handles one client connection until the response is complete.
///
/// Errors are answered with an error page when the client can still be
/// reached, and never propagate past this function. The connection is shut
/// down on every path and closed when `stream` is dropped.
pub async fn handle_connection<S>(stream: S, peer: SocketAddr, state: ProxyState)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    match serve(&mut reader, &mut writer, &state).await {
        Ok(outcome) => debug!(%peer, ?outcome, "Request complete"),
        Err(err) => {
            warn!(%peer, error = %err, "Request failed");
            if let Some(page) = err.error_page() {
                if let Err(e) = writer.write_all(&page.to_bytes()).await {
                    debug!(%peer, error = %e, "Could not send error page");
                }
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!(%peer, error = %e, "Client shutdown failed");
    }
}

async fn serve<R, W>(reader: &mut R, writer: &mut W, state: &ProxyState) -> Result<Outcome>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = read_request(reader).await?;
    let key = request.cache_key();

    if let Some(payload) = state.cache.lookup(key).await {
        writer.write_all(&payload).await?;
        writer.flush().await?;
        info!(key, bytes = payload.len(), "Served from cache");
        return Ok(Outcome::CacheHit {
            bytes: payload.len(),
        });
    }

    let upstream = connect_origin(&request).await?;
    debug!(host = %request.host, port = request.port, path = %request.path, "Connected to origin");

    relay(&request, upstream, writer, &state.cache).await
}

/// Opens a connection to the request's origin. A request that names no host
/// fails here like any other unreachable origin.
async fn connect_origin(request: &ParsedRequest) -> Result<TcpStream> {
    let connected = if request.host.is_empty() {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "request names no host",
        ))
    } else {
        TcpStream::connect((request.host.as_str(), request.port)).await
    };

    connected.map_err(|source| ProxyError::UpstreamUnreachable {
        host: request.host.clone(),
        port: request.port,
        source,
    })
}

// == Relay ==
/// Sends the rebuilt request to the origin and streams the response back.
///
/// Each line-sized chunk goes to the client as soon as it is read. A copy is
/// kept until the response outgrows the cache's object limit, at which point
/// the copy is dropped and the response will not be cached.
async fn relay<W>(
    request: &ParsedRequest,
    mut upstream: TcpStream,
    client: &mut W,
    cache: &CacheStore,
) -> Result<Outcome>
where
    W: AsyncWrite + Unpin,
{
    let (upstream_read, mut upstream_write) = upstream.split();
    upstream_write
        .write_all(build_request_header(request).as_bytes())
        .await?;

    let mut upstream_read = BufReader::new(upstream_read);
    let limit = cache.max_object_size();
    let mut mirror = Some(Vec::new());
    let mut chunk = Vec::with_capacity(MAX_LINE);
    let mut total = 0;

    loop {
        chunk.clear();
        let n = (&mut upstream_read)
            .take(MAX_LINE as u64)
            .read_until(b'\n', &mut chunk)
            .await?;
        if n == 0 {
            break;
        }

        client.write_all(&chunk).await?;
        total += n;

        mirror = match mirror.take() {
            Some(mut buf) if total <= limit => {
                buf.extend_from_slice(&chunk);
                Some(buf)
            }
            _ => None,
        };
    }
    client.flush().await?;

    let cached = match mirror {
        Some(payload) if !payload.is_empty() => matches!(
            cache.admit(request.cache_key(), payload).await,
            Admission::Stored { .. }
        ),
        _ => false,
    };

    info!(
        key = request.cache_key(),
        bytes = total,
        cached,
        "Relayed response from origin"
    );
    Ok(Outcome::Relayed {
        bytes: total,
        cached,
    })
}
