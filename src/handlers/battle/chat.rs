use async_trait::async_trait;
use lobby_proto::ParsedArgs;

use crate::handlers::core::{Context, Handler, HandlerError, HandlerResult};
use crate::handlers::helpers::current_battle;

/// Handler for SAYBATTLE and SAYBATTLEEX.
///
/// `SAYBATTLE <message...>`
pub struct SayBattleHandler {
    reply: &'static str,
}

impl SayBattleHandler {
    pub fn plain() -> Self {
        Self {
            reply: "SAIDBATTLE",
        }
    }

    /// The `/me` variant.
    pub fn ex() -> Self {
        Self {
            reply: "SAIDBATTLEEX",
        }
    }
}

#[async_trait]
impl Handler for SayBattleHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let message = args.text(0)?;
        let not_member = || HandlerError::Precondition("You are not in a battle".into());

        let (battle_id, battle) = current_battle(ctx).ok_or_else(not_member)?;
        let members = {
            let b = battle.lock();
            if !b.is_member(ctx.sid) {
                return Err(not_member());
            }
            b.member_ids()
        };

        let line = format!(
            "{} {} {} {}",
            self.reply,
            battle_id,
            ctx.username(),
            message
        );
        ctx.lobby.send_to_many(&members, &line);
        Ok(())
    }
}
