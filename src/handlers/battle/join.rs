//! Join handshake: JOINBATTLE, then JOINBATTLEACCEPT or JOINBATTLEDENY
//! from the founder.

use async_trait::async_trait;
use lobby_proto::ParsedArgs;
use tracing::debug;

use crate::handlers::core::{Context, Handler, HandlerError, HandlerResult};
use crate::handlers::helpers::current_battle;
use crate::state::{BattleError, SessionId};

fn failed(reason: &str) -> HandlerError {
    HandlerError::Rejected(format!("JOINBATTLEFAILED {reason}"))
}

/// Handler for JOINBATTLE command.
///
/// `JOINBATTLE <battleId>`
///
/// Records the request and forwards it to the founder, who decides.
pub struct JoinBattleHandler;

#[async_trait]
impl Handler for JoinBattleHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let requested = args.int(0)?;

        let (in_battle, username, ip) = {
            let session = ctx.session.read();
            (session.battle.is_some(), session.name().to_string(), session.ip())
        };
        if in_battle {
            return Err(failed("You are already in a battle"));
        }

        let battle = u64::try_from(requested)
            .ok()
            .and_then(|id| ctx.lobby.battles.get(id))
            .ok_or_else(|| failed("Battle does not exist"))?;

        let founder: SessionId = {
            let b = battle.lock();
            if b.is_closed() {
                return Err(failed("Battle does not exist"));
            }
            if b.locked {
                return Err(failed("Battle is locked"));
            }
            if b.member_count() >= b.max_players as usize {
                return Err(failed("Battle is full"));
            }
            ctx.session.write().requested_battle = Some(b.id);
            b.founder
        };

        ctx.lobby
            .send_to(founder, format!("JOINBATTLEREQUEST {username} {ip}"));
        debug!(battle = requested, user = %username, "Join requested");
        Ok(())
    }
}

/// Handler for JOINBATTLEACCEPT command.
///
/// `JOINBATTLEACCEPT <username>`
///
/// Anything but a founder accepting a pending request is dropped silently.
pub struct JoinBattleAcceptHandler;

#[async_trait]
impl Handler for JoinBattleAcceptHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let target_name = args.text(0)?;

        let Some((battle_id, battle)) = current_battle(ctx) else {
            return Err(HandlerError::Ignored("not in a battle"));
        };
        let Some((target_sid, target)) = ctx.lobby.sessions.by_username(target_name) else {
            return Err(HandlerError::Ignored("no such user"));
        };

        let (joiner, map_hash, bots) = {
            let mut b = battle.lock();
            if !b.is_founder(ctx.sid) {
                return Err(HandlerError::Ignored("not the battle founder"));
            }
            let mut t = target.write();
            if t.departed {
                return Err(HandlerError::Ignored("joiner disconnected"));
            }
            if t.requested_battle != Some(battle_id) || t.battle.is_some() {
                return Err(HandlerError::Ignored("no matching join request"));
            }
            let joiner = t.name().to_string();
            match b.add_member(target_sid, joiner.clone()) {
                Ok(()) => {}
                Err(BattleError::Full) => {
                    t.requested_battle = None;
                    let outbox = t.outbox.clone();
                    drop(t);
                    drop(b);
                    outbox.line("JOINBATTLEFAILED Battle is full");
                    return Err(HandlerError::Ignored("battle is full"));
                }
                Err(_) => return Err(HandlerError::Ignored("battle changed under the request")),
            }
            t.battle = Some(battle_id);
            t.requested_battle = None;

            let bots: Vec<String> = b
                .bots()
                .map(|bot| format!("ADDBOT {} {} {} {}", battle_id, bot.name, bot.owner_name, bot.ai))
                .collect();
            (joiner, b.map_hash, bots)
        };

        if let Some(outbox) = ctx.lobby.sessions.outbox(target_sid) {
            let mut lines = vec![format!("JOINBATTLE {battle_id} {map_hash}")];
            lines.extend(bots);
            outbox.batch(lines);
        }
        ctx.lobby
            .broadcast(&format!("JOINEDBATTLE {battle_id} {joiner}"));
        debug!(battle = battle_id, user = %joiner, "Joined battle");
        Ok(())
    }
}

/// Handler for JOINBATTLEDENY command.
///
/// `JOINBATTLEDENY <username> [reason...]`
pub struct JoinBattleDenyHandler;

#[async_trait]
impl Handler for JoinBattleDenyHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let target_name = args.text(0)?;
        let reason = args.opt_text(1);

        let Some((battle_id, battle)) = current_battle(ctx) else {
            return Err(HandlerError::Ignored("not in a battle"));
        };
        let Some((target_sid, target)) = ctx.lobby.sessions.by_username(target_name) else {
            return Err(HandlerError::Ignored("no such user"));
        };

        {
            let b = battle.lock();
            if !b.is_founder(ctx.sid) {
                return Err(HandlerError::Ignored("not the battle founder"));
            }
            let mut t = target.write();
            if t.requested_battle != Some(battle_id) {
                return Err(HandlerError::Ignored("no matching join request"));
            }
            t.requested_battle = None;
        }

        let line = match reason {
            Some(reason) => format!("JOINBATTLEFAILED Denied by battle founder - {reason}"),
            None => "JOINBATTLEFAILED Denied by battle founder".to_string(),
        };
        ctx.lobby.send_to(target_sid, line);
        Ok(())
    }
}
