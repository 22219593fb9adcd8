//! Core handler infrastructure.
//!
//! This module contains the handler trait, the per-line context and the
//! command registry that gates and dispatches every line.

pub mod context;
pub mod registry;

pub use context::{Context, Handler, HandlerError, HandlerResult};
pub use registry::{CommandEntry, Deprecation, Registry};
