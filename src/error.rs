//! Unified error handling for lobbyd.
//!
//! Handler failures carry a stable metric label, a failure kind from the
//! lobby's error taxonomy, and (usually) one reply line for the issuer.

use lobby_proto::ArgError;
use thiserror::Error;

use crate::db::DbError;
use crate::state::AccessLevel;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("malformed arguments for {command}: {source}")]
    MalformedArguments {
        command: &'static str,
        #[source]
        source: ArgError,
    },

    #[error("insufficient access for {command} (required: {required}, held: {held})")]
    InsufficientAccess {
        command: &'static str,
        required: AccessLevel,
        held: AccessLevel,
    },

    /// Reported to the issuer as a `SERVERMSG`.
    #[error("{0}")]
    Precondition(String),

    /// Reported to the issuer verbatim (e.g. `JOINBATTLEFAILED ...`, `DENIED ...`).
    #[error("rejected: {0}")]
    Rejected(String),

    /// Dropped without a reply; the protocol expects silence here.
    #[error("ignored: {0}")]
    Ignored(&'static str),

    #[error("command {command} removed after protocol version {removed_after}")]
    Deprecated {
        command: &'static str,
        removed_after: &'static str,
    },

    #[error("client exit: {0}")]
    Disconnect(String),

    #[error("ban store error: {0}")]
    Ban(#[from] DbError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure kinds reported to metrics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnknownCommand,
    MalformedArguments,
    InsufficientAccess,
    PreconditionFailed,
    ProcessingFailure,
    TransportFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "unknown_command",
            Self::MalformedArguments => "malformed_arguments",
            Self::InsufficientAccess => "insufficient_access",
            Self::PreconditionFailed => "precondition_failed",
            Self::ProcessingFailure => "processing_failure",
            Self::TransportFailure => "transport_failure",
        }
    }
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "unknown_command",
            Self::MalformedArguments { .. } => "malformed_arguments",
            Self::InsufficientAccess { .. } => "insufficient_access",
            Self::Precondition(_) => "precondition",
            Self::Rejected(_) => "rejected",
            Self::Ignored(_) => "ignored",
            Self::Deprecated { .. } => "deprecated",
            Self::Disconnect(_) => "disconnect",
            Self::Ban(_) => "ban_store",
            Self::Internal(_) => "internal_error",
        }
    }

    /// `None` for a handler-requested disconnect, which is not a failure.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::UnknownCommand(_) => Some(FailureKind::UnknownCommand),
            Self::MalformedArguments { .. } => Some(FailureKind::MalformedArguments),
            Self::InsufficientAccess { .. } => Some(FailureKind::InsufficientAccess),
            Self::Precondition(_)
            | Self::Rejected(_)
            | Self::Ignored(_)
            | Self::Deprecated { .. } => Some(FailureKind::PreconditionFailed),
            Self::Internal(_) => Some(FailureKind::ProcessingFailure),
            Self::Ban(_) => Some(FailureKind::TransportFailure),
            Self::Disconnect(_) => None,
        }
    }

    /// Convert to the reply line sent to the issuing session.
    ///
    /// Returns `None` for errors that don't warrant a client-visible reply.
    pub fn to_reply(&self, cmd_name: &str) -> Option<String> {
        let reply = match self {
            Self::UnknownCommand(cmd) => format!("SERVERMSG Unknown command: {cmd}"),
            Self::MalformedArguments { .. } => {
                format!("SERVERMSG Invalid command syntax for {cmd_name}")
            }
            Self::InsufficientAccess { required, held, .. } => format!(
                "SERVERMSG Insufficient access for {cmd_name} (required: {required}, held: {held})"
            ),
            Self::Precondition(msg) => format!("SERVERMSG {msg}"),
            Self::Rejected(line) => line.clone(),
            Self::Deprecated { removed_after, .. } => format!(
                "SERVERMSG Command {cmd_name} was removed after protocol version {removed_after}; please update your lobby client"
            ),
            Self::Internal(_) | Self::Ban(_) => {
                format!("SERVERMSG Server error while processing {cmd_name}")
            }

            // These errors don't get client-visible replies
            Self::Ignored(_) => return None,
            Self::Disconnect(_) => return None,
        };
        Some(reply)
    }

    /// Whether the session must be closed after the reply.
    pub fn closes_session(&self) -> bool {
        matches!(self, Self::Deprecated { .. } | Self::Disconnect(_))
    }
}

/// Argument accessors only fail when a handler disagrees with its own
/// registered spec, which is a server bug rather than bad client input.
impl From<ArgError> for HandlerError {
    fn from(err: ArgError) -> Self {
        Self::Internal(format!("argument access: {err}"))
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
