use async_trait::async_trait;
use lobby_proto::ParsedArgs;

use crate::handlers::core::{Context, Handler, HandlerError, HandlerResult};
use crate::handlers::helpers::{current_battle, map_hash};

/// Handler for UPDATEBATTLEINFO command.
///
/// `UPDATEBATTLEINFO <locked> <mapHash> <mapName...>`
///
/// Founder only. The broadcast is rendered from the battle after the update.
pub struct UpdateBattleInfoHandler;

#[async_trait]
impl Handler for UpdateBattleInfoHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let locked = args.bool(0)?;
        let hash = map_hash("UPDATEBATTLEINFO", 1, args.int(1)?)?;
        let map_name = args.text(2)?;

        let Some((_, battle)) = current_battle(ctx) else {
            return Err(HandlerError::Ignored("not in a battle"));
        };

        let line = {
            let mut b = battle.lock();
            b.update_info(ctx.sid, locked, hash, map_name.to_string())
                .map_err(|_| HandlerError::Ignored("not the battle founder"))?;
            b.info_line()
        };

        ctx.lobby.broadcast(&line);
        Ok(())
    }
}
