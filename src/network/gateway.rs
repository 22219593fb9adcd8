//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds the lobby socket and spawns a Connection task for
//! each incoming client.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

use crate::handlers::Registry;
use crate::network::Connection;
use crate::state::Lobby;

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    lobby: Arc<Lobby>,
    registry: Arc<Registry>,
    max_line_len: usize,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(
        addr: SocketAddr,
        max_line_len: usize,
        lobby: Arc<Lobby>,
        registry: Arc<Registry>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Lobby listener bound");
        Ok(Self {
            listener,
            lobby,
            registry,
            max_line_len,
        })
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!(%addr, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let sid = self.lobby.sessions.next_id();
                    info!(session = sid, %addr, "Connection accepted");

                    let connection = Connection::new(
                        sid,
                        stream,
                        addr,
                        Arc::clone(&self.lobby),
                        Arc::clone(&self.registry),
                        self.max_line_len,
                    );
                    tokio::spawn(async move {
                        if let Err(e) = connection.run().await {
                            error!(session = sid, %addr, error = %e, "Connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
