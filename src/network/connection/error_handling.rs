//! Notices the connection loop sends on its own behalf.
//!
//! Malformed input (oversized or non-UTF-8 lines) is answered and dropped;
//! only flood protection closes the session from here.

use crate::config::FloodAction;

/// Reply for a line over the configured limit. The line is dropped.
pub(super) fn input_too_long_response(max_len: usize) -> String {
    format!("SERVERMSG Line too long (limit is {max_len} bytes); ignored")
}

/// Reply for a line that is not valid UTF-8. The line is dropped.
pub(super) fn invalid_utf8_response() -> &'static str {
    "SERVERMSG Invalid command syntax: line is not valid UTF-8; ignored"
}

/// Reply sent when a session crosses its flood threshold.
pub(super) fn flood_notice(action: FloodAction) -> &'static str {
    match action {
        FloodAction::Disconnect => {
            "SERVERMSG Flood protection: you are being disconnected for flooding"
        }
        FloodAction::Warn => {
            "SERVERMSG Flood protection: you are sending too much data, slow down"
        }
    }
}
