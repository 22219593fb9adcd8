use async_trait::async_trait;
use lobby_proto::ParsedArgs;
use tracing::info;

use crate::handlers::core::{Context, Handler, HandlerError, HandlerResult};
use crate::handlers::helpers::server_msg;

/// Handler for KICKUSER command.
///
/// `KICKUSER <username> [reason...]`
///
/// The target is told who kicked it, then closed and cleaned up.
pub struct KickUserHandler;

#[async_trait]
impl Handler for KickUserHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let target = args.text(0)?;
        let reason = args.opt_text(1);
        let admin = ctx.username();

        if !ctx.lobby.kick(target, &admin, reason) {
            return Err(HandlerError::Precondition(format!(
                "User {target} is not online"
            )));
        }

        ctx.reply(server_msg(format!("Kicked {target} from the server")));
        info!(admin = %admin, target = %target, reason = reason.unwrap_or(""), "User kicked");
        Ok(())
    }
}
