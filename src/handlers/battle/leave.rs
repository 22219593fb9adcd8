use async_trait::async_trait;
use lobby_proto::ParsedArgs;

use crate::handlers::core::{Context, Handler, HandlerError, HandlerResult};

/// Handler for LEAVEBATTLE command.
///
/// The founder leaving closes the battle; see [`crate::state::Lobby::leave_battle`].
pub struct LeaveBattleHandler;

#[async_trait]
impl Handler for LeaveBattleHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _args: &ParsedArgs) -> HandlerResult {
        if ctx.lobby.leave_battle(ctx.sid, ctx.session) {
            Ok(())
        } else {
            Err(HandlerError::Ignored("not in a battle"))
        }
    }
}
