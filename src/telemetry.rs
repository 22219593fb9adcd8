//! Telemetry utilities for command timing and tracing spans.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: &'static str,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(self.command, duration);
    }
}

/// Standardized span constructors for lobby observability.
pub mod spans {
    use tracing::{Span, info_span};

    use crate::state::SessionId;

    /// Span for a client connection.
    pub fn connection(session: SessionId, addr: &str) -> Span {
        info_span!("connection", session, addr = %addr)
    }

    /// Span for one dispatched command.
    pub fn command(name: &str, session: SessionId, user: &str) -> Span {
        info_span!("lobby.command", name = %name, session, user = %user)
    }
}
