//! # lobby-proto
//!
//! Protocol primitives for the lobbyd line protocol.
//!
//! Every client command is a single UTF-8 line: an upper-case keyword followed
//! by whitespace-separated arguments, optionally ending in a free-text
//! "sentence" that keeps its inner spaces. This crate provides:
//!
//! - [`LineCodec`]: a tokio codec that frames newline-terminated lines and
//!   reports the raw byte length of every frame (used for flood accounting)
//! - [`CommandLine`]: keyword/token splitting of a decoded line
//! - [`ArgumentSpec`]: declarative arity and per-argument typing, producing
//!   [`ParsedArgs`]
//!
//! ## Quick Start
//!
//! ```rust
//! use lobby_proto::{ArgKind, ArgumentSpec, CommandLine};
//!
//! let line = CommandLine::split("UPDATEBATTLEINFO 1 12345 Delta Siege Dry").unwrap();
//! assert_eq!(line.keyword, "UPDATEBATTLEINFO");
//!
//! let spec = ArgumentSpec::at_least(3)
//!     .arg(ArgKind::Bool)
//!     .arg(ArgKind::Int)
//!     .arg(ArgKind::Sentence);
//! let args = spec.parse(&line.tokens).unwrap();
//! assert!(args.bool(0).unwrap());
//! assert_eq!(args.int(1).unwrap(), 12345);
//! assert_eq!(args.text(2).unwrap(), "Delta Siege Dry");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod args;
pub mod command;
pub mod error;
#[cfg(feature = "tokio")]
pub mod line;

pub use self::args::{ArgError, ArgKind, ArgValue, ArgumentSpec, Arity, ParsedArgs};
pub use self::command::CommandLine;
pub use self::error::ProtocolError;
#[cfg(feature = "tokio")]
pub use self::line::{Inbound, LineCodec, RawLine};

/// Render a boolean the way the wire protocol expects it (`1` / `0`).
#[inline]
pub fn wire_bool(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
