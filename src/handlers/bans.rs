//! Ban command handlers.
//!
//! Commands for server bans (admin-only):
//! - BAN: Ban a username, with the target's address and user id when online
//! - UNBAN: Remove the active ban on a username
//! - BANLIST: List active bans
//!
//! Store failures surface as `HandlerError::Ban` and get a generic reply.

use async_trait::async_trait;
use lobby_proto::ParsedArgs;
use tracing::info;

use super::core::{Context, Handler, HandlerError, HandlerResult};
use super::helpers::server_msg;
use crate::db::BanEntry;

const DEFAULT_REASON: &str = "No reason given";

/// Handler for BAN command.
///
/// `BAN <username> <durationSeconds> [reason...]`
///
/// A duration of 0 is permanent. An existing active ban on the username is
/// extended in place rather than duplicated.
pub struct BanHandler;

#[async_trait]
impl Handler for BanHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let target = args.text(0)?;
        let duration = args.int(1)?;
        let reason = args.opt_text(2).unwrap_or(DEFAULT_REASON);

        if duration < 0 {
            return Err(HandlerError::Precondition(format!(
                "Ban duration must not be negative, got {duration}"
            )));
        }

        let admin = ctx.username();
        let mut entry = BanEntry::for_username(target, duration, reason, &admin);
        if let Some((_, session)) = ctx.lobby.sessions.by_username(target) {
            let session = session.read();
            entry.ip = Some(session.ip());
            entry.user_id = session.user_id;
        }

        if !ctx.lobby.bans.merge(&entry).await? {
            ctx.lobby.bans.add(&entry).await?;
        }

        let term = match entry.expires_at {
            Some(_) => format!("for {duration} seconds"),
            None => "permanently".to_string(),
        };
        ctx.reply(server_msg(format!("Banned {target} {term} ({reason})")));
        info!(admin = %admin, target = %target, duration, reason = %reason, "Ban set");

        ctx.lobby.kick(target, &admin, Some(reason));
        Ok(())
    }
}

/// Handler for UNBAN command.
///
/// `UNBAN <username>`
pub struct UnbanHandler;

#[async_trait]
impl Handler for UnbanHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let target = args.text(0)?;
        let admin = ctx.username();

        let entry = BanEntry::for_username(target, 0, "", &admin);
        if !ctx.lobby.bans.remove(&entry).await? {
            return Err(HandlerError::Precondition(format!(
                "No active ban for {target}"
            )));
        }

        ctx.reply(server_msg(format!("Unbanned {target}")));
        info!(admin = %admin, target = %target, "Ban removed");
        Ok(())
    }
}

/// Handler for BANLIST command.
///
/// Replies `BANLISTBEGIN <total> <active>`, the active entries, `BANLISTEND`
/// as one batch.
pub struct BanListHandler;

#[async_trait]
impl Handler for BanListHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _args: &ParsedArgs) -> HandlerResult {
        let total = ctx.lobby.bans.size().await?;
        let active = ctx.lobby.bans.list_active().await?;

        let mut lines = Vec::with_capacity(active.len() + 2);
        lines.push(format!("BANLISTBEGIN {} {}", total, active.len()));
        lines.extend(active.iter().map(BanEntry::list_line));
        lines.push("BANLISTEND".to_string());
        ctx.outbox.batch(lines);
        Ok(())
    }
}
