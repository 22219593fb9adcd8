//! Helper functions shared by command handlers.

use lobby_proto::ArgError;

use super::core::{Context, HandlerError};
use crate::state::{BattleId, BattleRef};

// ============================================================================
// Common reply helpers
// ============================================================================

/// Build a `SERVERMSG` line.
#[inline]
pub fn server_msg(text: impl AsRef<str>) -> String {
    format!("SERVERMSG {}", text.as_ref())
}

// ============================================================================
// Battle lookups
// ============================================================================

/// The battle the issuing session is a member of, if it still exists.
pub fn current_battle(ctx: &Context<'_>) -> Option<(BattleId, BattleRef)> {
    let battle_id = ctx.session.read().battle?;
    ctx.lobby.battles.get(battle_id).map(|b| (battle_id, b))
}

/// Map hashes are 32-bit on the wire; a wider integer is a syntax error.
pub fn map_hash(
    command: &'static str,
    position: usize,
    value: i64,
) -> Result<i32, HandlerError> {
    i32::try_from(value).map_err(|_| HandlerError::MalformedArguments {
        command,
        source: ArgError::NotAnInteger {
            position,
            token: value.to_string(),
        },
    })
}

/// Bot names follow the username rules.
pub fn is_valid_bot_name(name: &str) -> bool {
    crate::services::accounts::is_valid_username(name)
}
