//! Connection - Handles an individual client connection.
//!
//! Each Connection runs in its own Tokio task:
//!
//! ```text
//!   FramedRead ──▶ flood accounting ──▶ Registry::dispatch
//!                                           │
//!                                           ▼
//!   FramedWrite ◀── tokio::select! ◀── Outbox queue ◀── other sessions
//! ```
//!
//! The outbound queue is polled first, so replies to one line are written
//! before the next line is read. Whatever ends the loop, the session is
//! cleaned up through [`Lobby::disconnect`].

mod error_handling;

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use lobby_proto::{Inbound, LineCodec, ProtocolError};
use parking_lot::RwLock;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, instrument, warn};

use self::error_handling::{flood_notice, input_too_long_response, invalid_utf8_response};
use crate::config::FloodAction;
use crate::handlers::{Context, Registry};
use crate::security::FloodVerdict;
use crate::state::{Lobby, Outbound, Outbox, Session, SessionId, SessionRef};

type Reader = FramedRead<OwnedReadHalf, LineCodec>;
type Writer = FramedWrite<OwnedWriteHalf, LineCodec>;

/// A client connection handler.
pub struct Connection {
    sid: SessionId,
    addr: SocketAddr,
    /// Taken when the connection starts running.
    stream: Option<TcpStream>,
    lobby: Arc<Lobby>,
    registry: Arc<Registry>,
    max_line_len: usize,
}

impl Connection {
    /// Create a new connection handler.
    pub fn new(
        sid: SessionId,
        stream: TcpStream,
        addr: SocketAddr,
        lobby: Arc<Lobby>,
        registry: Arc<Registry>,
        max_line_len: usize,
    ) -> Self {
        Self {
            sid,
            addr,
            stream: Some(stream),
            lobby,
            registry,
            max_line_len,
        }
    }

    /// Run the connection until either side closes it.
    #[instrument(skip(self), fields(session = self.sid, addr = %self.addr), name = "connection")]
    pub async fn run(mut self) -> anyhow::Result<()> {
        let stream = self
            .stream
            .take()
            .ok_or_else(|| anyhow::anyhow!("connection already started"))?;
        info!(server = %self.lobby.server.name, "Client connected");

        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, LineCodec::with_max_len(self.max_line_len));
        let mut writer = FramedWrite::new(write_half, LineCodec::with_max_len(self.max_line_len));

        let (outbox, mut outgoing) = Outbox::channel();
        let session: SessionRef = Arc::new(RwLock::new(Session::new(
            self.sid,
            self.addr,
            outbox.clone(),
        )));

        let greeting = format!(
            "LOBBYSERVER {} {}",
            self.lobby.server.protocol_version, self.lobby.server.name
        );
        let reason = match writer.send(greeting).await {
            Ok(()) => {
                self.event_loop(&mut reader, &mut writer, &mut outgoing, &session, &outbox)
                    .await
            }
            Err(e) => format!("Write error: {e}"),
        };

        // Runs for every exit path; a no-op if a kick already cleaned up.
        self.lobby.disconnect(self.sid, &reason);
        info!(reason = %reason, "Client disconnected");
        Ok(())
    }

    /// Returns the reason the loop ended.
    async fn event_loop(
        &self,
        reader: &mut Reader,
        writer: &mut Writer,
        outgoing: &mut mpsc::UnboundedReceiver<Outbound>,
        session: &SessionRef,
        outbox: &Outbox,
    ) -> String {
        loop {
            tokio::select! {
                biased;

                item = outgoing.recv() => {
                    let Some(item) = item else {
                        return "Outbound queue closed".to_string();
                    };
                    match write_outbound(writer, item).await {
                        Ok(None) => {}
                        Ok(Some(reason)) => return reason,
                        Err(e) => return format!("Write error: {e}"),
                    }
                }

                frame = reader.next() => {
                    match frame {
                        None => return "Connection closed by peer".to_string(),
                        Some(Err(e)) => {
                            debug!(error = %e, "Read error");
                            return format!("Read error: {e}");
                        }
                        Some(Ok(inbound)) => self.process(inbound, session, outbox).await,
                    }
                }
            }
        }
    }

    /// Flood accounting, then dispatch. Replies and closes go through the
    /// outbox and are picked up by the next loop iteration.
    async fn process(&self, inbound: Inbound, session: &SessionRef, outbox: &Outbox) {
        let verdict = {
            let mut guard = session.write();
            let s = &mut *guard;
            self.lobby.flood.record(&mut s.flood, inbound.wire_len(), s.bot)
        };

        if let FloodVerdict::Exceeded { bytes, threshold } = verdict {
            let action = self.lobby.flood_action;
            crate::metrics::record_flood_alert(action.as_str());
            warn!(
                bytes,
                threshold,
                action = action.as_str(),
                user = %session.read().name(),
                "Flood threshold exceeded"
            );
            outbox.line(flood_notice(action));
            if action == FloodAction::Disconnect {
                outbox.close("Flood protection");
                return;
            }
        }

        match inbound {
            Inbound::Discarded { wire_len } => {
                debug!(wire_len, "Skipping oversized line");
            }
            Inbound::TooLong { wire_len } => {
                debug!(wire_len, "Dropped oversized line");
                outbox.line(input_too_long_response(self.max_line_len));
            }
            Inbound::Invalid { wire_len } => {
                debug!(wire_len, "Dropped non-UTF-8 line");
                outbox.line(invalid_utf8_response());
            }
            Inbound::Line(line) => {
                debug!(raw = %line.text, "Received line");
                let mut ctx = Context::new(self.sid, session, &self.lobby, outbox, self.addr);
                // Failures are reported to the client by the registry.
                let _ = self.registry.dispatch(&mut ctx, &line.text).await;
            }
        }
    }
}

/// Write one queued item. Returns the close reason for `Outbound::Close`.
async fn write_outbound(
    writer: &mut Writer,
    item: Outbound,
) -> Result<Option<String>, ProtocolError> {
    match item {
        Outbound::Line(line) => writer.send(line).await?,
        Outbound::Batch(lines) => {
            for line in lines {
                writer.feed(line).await?;
            }
            writer.flush().await?;
        }
        Outbound::Close(reason) => {
            writer.flush().await?;
            return Ok(Some(reason));
        }
    }
    Ok(None)
}
