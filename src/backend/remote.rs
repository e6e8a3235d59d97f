//! Remote backend driver.
//!
//! Speaks the newline-delimited JSON protocol over any async byte stream
//! (TCP in production, an in-memory duplex in tests). Requests are served
//! strictly in order: write one line, read one line, map the response to a
//! completion event, repeat.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use super::handle::{BackendEndpoint, BackendHandle};
use super::protocol::{BackendEvent, BackendRequest, BackendResponse};

/// Connect to a backend at `addr` and spawn the driver task.
pub async fn connect(addr: &str) -> Result<BackendHandle> {
    let stream = TcpStream::connect(addr).await?;
    debug!("connected to backend at {}", addr);
    Ok(spawn(stream))
}

/// Spawn a driver over an arbitrary stream.
pub fn spawn<S>(stream: S) -> BackendHandle
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (handle, endpoint) = BackendHandle::pair();
    tokio::spawn(drive(stream, endpoint));
    handle
}

async fn drive<S>(stream: S, mut endpoint: BackendEndpoint)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    while let Some(request) = endpoint.requests.recv().await {
        let event = match exchange(&mut reader, &mut write_half, &mut line, &request).await {
            Ok(response) => map_response(&request, response),
            Err(e) => {
                warn!("backend round-trip failed: {}", e);
                failure_event(&request)
            }
        };
        if endpoint.events.send(event).is_err() {
            // Panel gone, stop driving the connection.
            break;
        }
    }
}

async fn exchange<R, W>(
    reader: &mut BufReader<R>,
    writer: &mut W,
    line: &mut String,
    request: &BackendRequest,
) -> Result<BackendResponse>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_string(request)?;
    payload.push('\n');
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;

    line.clear();
    let n = reader.read_line(line).await?;
    if n == 0 {
        anyhow::bail!("connection closed");
    }
    Ok(serde_json::from_str(line.trim())?)
}

/// Map a wire response onto the completion event for the request it
/// answers. Mismatched or error responses degrade to the request's
/// failure event; the pipeline recovers by re-fetching either way.
fn map_response(request: &BackendRequest, response: BackendResponse) -> BackendEvent {
    match (request, response) {
        (BackendRequest::GetConfig, BackendResponse::Config { config }) => {
            BackendEvent::Config(Some(config))
        }
        (BackendRequest::GetConfig, BackendResponse::NotFound) => BackendEvent::Config(None),
        (BackendRequest::SaveEntities { .. }, BackendResponse::Ack { success }) => {
            BackendEvent::SaveCompleted(success)
        }
        (BackendRequest::UpdateEntitySettings { .. }, BackendResponse::Ack { success }) => {
            BackendEvent::UpdateCompleted(success)
        }
        (request, response) => {
            warn!("unexpected backend response {:?} to {:?}", response, request);
            failure_event(request)
        }
    }
}

fn failure_event(request: &BackendRequest) -> BackendEvent {
    match request {
        BackendRequest::GetConfig => BackendEvent::Config(None),
        BackendRequest::SaveEntities { .. } => BackendEvent::SaveCompleted(false),
        BackendRequest::UpdateEntitySettings { .. } => BackendEvent::UpdateCompleted(false),
    }
}
