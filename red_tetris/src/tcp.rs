//! Newline delimited JSON transport over TCP

use tetris_arena::{ArenaError, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::dispatcher::DispatcherHandle;
use crate::protocol::ClientMessage;

/// Accept connections until the listener fails
pub async fn serve(listener: TcpListener, dispatcher: DispatcherHandle) -> Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            tracing::debug!("Accepted connection from {}", addr);
            if let Err(e) = serve_connection(stream, dispatcher).await {
                tracing::debug!("Connection from {} ended: {}", addr, e);
            }
        });
    }
}

/// Pump one connection: client lines to the dispatcher, events back as lines
///
/// Messages sent before the first `join` are ignored.
pub async fn serve_connection(stream: TcpStream, dispatcher: DispatcherHandle) -> Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    let link = dispatcher.connect()?;
    let mut join_sent = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let message: ClientMessage = match serde_json::from_str(&line) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::debug!("{}: malformed message: {}", link.connection(), e);
                        continue;
                    }
                };
                if !join_sent && !matches!(message, ClientMessage::Join { .. }) {
                    tracing::debug!("{}: message before join ignored", link.connection());
                    continue;
                }
                join_sent = true;
                link.send(message)?;
            }
            event = link.recv() => {
                let mut text = serde_json::to_string(&event?)
                    .map_err(|e| ArenaError::Serialization(e.to_string()))?;
                text.push('\n');
                write.write_all(text.as_bytes()).await?;
            }
        }
    }
    Ok(())
}
