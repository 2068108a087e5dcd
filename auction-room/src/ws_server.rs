// WebSocket server: one task per connected client. Actions go to the room
// actor; replies and broadcast snapshots go back out.

use futures_util::stream::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::app::{RoomHandle, SubmitError};
use crate::protocol::{ClientMessage, ServerMessage};

/// Per-connection queue of replies waiting to be written.
const OUTBOUND_CAPACITY: usize = 64;

/// Accept clients on `host:port` forever, serving each on its own task.
pub async fn run(
    host: &str,
    port: u16,
    room: RoomHandle,
    snapshots: broadcast::Sender<ServerMessage>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("WebSocket server listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        let addr_str = addr.to_string();
        info!("Accepted TCP connection from {addr_str}");

        let room = room.clone();
        let snapshot_rx = snapshots.subscribe();
        tokio::spawn(async move {
            handle_connection(stream, addr_str, room, snapshot_rx).await;
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: String,
    room: RoomHandle,
    snapshot_rx: broadcast::Receiver<ServerMessage>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {addr}: {e}");
            return;
        }
    };
    let (mut write, read) = ws_stream.split();
    let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CAPACITY);

    // Late joiners get the current state straight away.
    match room.snapshot().await {
        Ok(snapshot) => {
            let _ = out_tx.send(ServerMessage::Snapshot(Box::new(snapshot))).await;
        }
        Err(e) => {
            warn!("Could not fetch initial snapshot for {addr}: {e}");
            return;
        }
    }

    let writer_addr = addr.clone();
    let writer = tokio::spawn(async move {
        write_messages(&mut write, out_rx, snapshot_rx, &writer_addr).await;
    });

    let _ = process_message_stream(read, &room, &out_tx, &addr).await;
    drop(out_tx);
    writer.abort();
    info!("Client {addr} disconnected");
}

/// Handle client frames from any [`Stream`]: each text frame is parsed,
/// submitted to the room and answered with `ACK` or `REJECTED` on `out`.
///
/// Returns `Err(())` when the room or the outbound queue has gone away.
pub async fn process_message_stream<St>(
    mut stream: St,
    room: &RoomHandle,
    out: &mpsc::Sender<ServerMessage>,
    addr: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => {
                        debug!("Client {addr}: {:?}", msg.action);
                        match room.submit(msg.action).await {
                            Ok(()) => ServerMessage::Ack {
                                request_id: msg.request_id,
                            },
                            Err(SubmitError::Rejected(e)) => {
                                ServerMessage::rejected(msg.request_id, &e)
                            }
                            Err(SubmitError::Closed) => return Err(()),
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse message from {addr}: {e}");
                        ServerMessage::invalid(e.to_string())
                    }
                };
                if out.send(reply).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {
                // Ignore Binary, Ping, Pong, Frame variants.
            }
        }
    }
    Ok(())
}

/// Write replies and broadcast snapshots to `sink` as JSON text frames until
/// either source closes or a write fails. A lagging client skips straight to
/// newer snapshots.
pub async fn write_messages<Si>(
    sink: &mut Si,
    mut replies: mpsc::Receiver<ServerMessage>,
    mut snapshots: broadcast::Receiver<ServerMessage>,
    addr: &str,
) where
    Si: Sink<Message> + Unpin,
    Si::Error: std::fmt::Display,
{
    loop {
        let msg = tokio::select! {
            biased;

            snapshot = snapshots.recv() => match snapshot {
                Ok(msg) => msg,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Client {addr} lagged, skipped {skipped} snapshots");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            reply = replies.recv() => match reply {
                Some(msg) => msg,
                None => break,
            },
        };

        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize outbound message: {e}");
                continue;
            }
        };
        if let Err(e) = sink.send(Message::Text(json.into())).await {
            warn!("Failed to write to {addr}: {e}");
            break;
        }
    }
}
