use async_trait::async_trait;
use lobby_proto::ParsedArgs;

use crate::handlers::core::{Context, Handler, HandlerError, HandlerResult};
use crate::handlers::helpers::{current_battle, is_valid_bot_name};
use crate::state::{BattleError, Bot};

/// Handler for ADDBOT command.
///
/// `ADDBOT <name> <ai...>`
pub struct AddBotHandler;

#[async_trait]
impl Handler for AddBotHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let name = args.text(0)?;
        let ai = args.text(1)?;

        if !is_valid_bot_name(name) {
            return Err(HandlerError::Precondition(format!("Invalid bot name {name}")));
        }
        let Some((battle_id, battle)) = current_battle(ctx) else {
            return Err(HandlerError::Precondition("You are not in a battle".into()));
        };
        let owner_name = ctx.username();

        let (line, members) = {
            let mut b = battle.lock();
            let bot = Bot {
                name: name.to_string(),
                owner: ctx.sid,
                owner_name: owner_name.clone(),
                ai: ai.to_string(),
            };
            match b.add_bot(bot) {
                Ok(()) => {}
                Err(BattleError::BotNameTaken(taken)) => {
                    return Err(HandlerError::Precondition(format!(
                        "Bot name {taken} is already in use"
                    )));
                }
                Err(_) => {
                    return Err(HandlerError::Precondition("You are not in a battle".into()));
                }
            }
            (
                format!("ADDBOT {battle_id} {name} {owner_name} {ai}"),
                b.member_ids(),
            )
        };

        ctx.lobby.send_to_many(&members, &line);
        Ok(())
    }
}

/// Handler for REMOVEBOT command.
///
/// `REMOVEBOT <name>`
///
/// Any member may remove any bot. Removing an absent bot notifies nobody.
pub struct RemoveBotHandler;

#[async_trait]
impl Handler for RemoveBotHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let name = args.text(0)?;

        let Some((battle_id, battle)) = current_battle(ctx) else {
            return Err(HandlerError::Ignored("not in a battle"));
        };

        let members = {
            let mut b = battle.lock();
            b.remove_bot(ctx.sid, name)
                .map_err(|_| HandlerError::Ignored("no such bot"))?;
            b.member_ids()
        };

        ctx.lobby
            .send_to_many(&members, &format!("REMOVEBOT {battle_id} {name}"));
        Ok(())
    }
}
