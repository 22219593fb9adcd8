use async_trait::async_trait;
use lobby_proto::ParsedArgs;
use tracing::info;

use crate::handlers::core::{Context, Handler, HandlerError, HandlerResult};
use crate::handlers::helpers::map_hash;

fn failed(reason: impl std::fmt::Display) -> HandlerError {
    HandlerError::Rejected(format!("OPENBATTLEFAILED {reason}"))
}

/// Handler for OPENBATTLE command.
///
/// `OPENBATTLE <maxPlayers> <mapHash> <mapName...>`
pub struct OpenBattleHandler;

#[async_trait]
impl Handler for OpenBattleHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let requested_max = args.int(0)?;
        let hash = map_hash("OPENBATTLE", 1, args.int(1)?)?;
        let map_name = args.text(2)?.to_string();

        let max_players = u32::try_from(requested_max)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| failed(format!("Invalid player limit {requested_max}")))?;

        if ctx.session.read().battle.is_some() {
            return Err(failed("You are already in a battle"));
        }

        let username = ctx.username();
        let battle = ctx
            .lobby
            .battles
            .open(ctx.sid, &username, max_players, hash, map_name);

        // A join accepted concurrently may have put us in another battle,
        // or the session may have been kicked while we were opening.
        let (battle_id, opened, departed) = {
            let mut b = battle.lock();
            let mut session = ctx.session.write();
            if session.battle.is_some() || session.departed {
                b.close();
                (b.id, None, session.departed)
            } else {
                session.battle = Some(b.id);
                session.requested_battle = None;
                (b.id, Some(b.opened_line()), false)
            }
        };

        let Some(opened) = opened else {
            ctx.lobby.battles.remove(battle_id);
            if departed {
                return Err(HandlerError::Ignored("session departed"));
            }
            return Err(failed("You are already in a battle"));
        };

        ctx.reply(format!("OPENBATTLE {battle_id}"));
        ctx.lobby.broadcast(&opened);
        info!(battle = battle_id, founder = %username, max_players, "Battle opened");
        Ok(())
    }
}
