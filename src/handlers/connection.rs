//! Session lifecycle handlers.
//!
//! Handles PING, LOGIN, CONFIRMAGREEMENT, REQUESTUPDATEFILE and EXIT. These
//! are the only commands available to a session that has not logged in.

use std::sync::Arc;

use async_trait::async_trait;
use lobby_proto::ParsedArgs;
use tracing::{error, info};

use super::core::{Context, Handler, HandlerError, HandlerResult};
use crate::state::{AccessLevel, CompatFlags, FLAG_PLAIN_TEXT};

/// Handler for PING command.
///
/// `PING`
pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _args: &ParsedArgs) -> HandlerResult {
        ctx.reply("PONG");
        Ok(())
    }
}

/// Handler for LOGIN command.
///
/// `LOGIN <username> <password> <userId> <compatFlags> [lobbyVersion...]`
///
/// Checks credentials, bans and the agreement before the session enters
/// the registry. A successful login gets `ACCEPTED` plus the state burst
/// in one batch; everyone else gets `ADDUSER`.
pub struct LoginHandler;

#[async_trait]
impl Handler for LoginHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let username = args.text(0)?;
        let password = args.text(1)?;
        let user_id = args.int(2)?;
        let compat = CompatFlags::parse(args.text(3)?);
        let lobby_version = args.opt_text(4).map(str::to_string);

        if ctx.session.read().is_logged_in() {
            return Err(HandlerError::Precondition("Already logged in".into()));
        }

        let Some(auth) = ctx.lobby.accounts.authenticate(username, password) else {
            info!(user = %username, addr = %ctx.remote_addr, "Login denied: bad credentials");
            return Err(HandlerError::Rejected("DENIED Bad username/password".into()));
        };

        // Ban lookups run without any lock; a failing store lets the user in.
        let ip = ctx.remote_addr.ip().to_string();
        match ctx
            .lobby
            .bans
            .find(Some(&auth.name), Some(&ip), Some(user_id))
            .await
        {
            Ok(Some(ban)) => {
                info!(user = %auth.name, ip = %ip, set_by = %ban.set_by, "Login denied: banned");
                return Err(HandlerError::Rejected(format!(
                    "DENIED You are banned from this server ({})",
                    ban.reason
                )));
            }
            Ok(None) => {}
            Err(e) => {
                crate::metrics::record_ban_lookup_failure();
                error!(user = %auth.name, error = %e, "Ban lookup failed; treating as not banned");
            }
        }

        if ctx.lobby.agreement.needs(&auth.name) {
            let lines = ctx.lobby.agreement.render(compat.has(FLAG_PLAIN_TEXT));
            ctx.session.write().pending_agreement = Some(auth.name.clone());
            ctx.outbox.batch(lines);
            return Ok(());
        }

        {
            let mut session = ctx.session.write();
            session.username = Some(auth.name.clone());
            session.access = auth.access;
            session.bot = auth.bot;
            session.compat = compat;
            session.user_id = Some(user_id);
            session.lobby_version = lobby_version;
            session.pending_agreement = None;
        }

        if ctx
            .lobby
            .sessions
            .register(ctx.sid, &auth.name, Arc::clone(ctx.session), ctx.outbox.clone())
            .is_err()
        {
            let mut session = ctx.session.write();
            session.username = None;
            session.access = AccessLevel::None;
            session.bot = false;
            session.compat = CompatFlags::default();
            session.user_id = None;
            session.lobby_version = None;
            return Err(HandlerError::Rejected("DENIED Already logged in".into()));
        }
        crate::metrics::set_connected_sessions(ctx.lobby.sessions.len());

        let mut burst = vec![format!("ACCEPTED {}", auth.name)];
        burst.extend(ctx.lobby.login_snapshot());
        ctx.outbox.batch(burst);
        ctx.lobby
            .broadcast_except(ctx.sid, &format!("ADDUSER {}", auth.name));

        info!(
            session = ctx.sid,
            user = %auth.name,
            access = %auth.access,
            bot = auth.bot,
            "User logged in"
        );
        Ok(())
    }
}

/// Handler for CONFIRMAGREEMENT command.
///
/// Records acceptance for the account that was last shown the agreement.
/// The client logs in again afterwards.
pub struct ConfirmAgreementHandler;

#[async_trait]
impl Handler for ConfirmAgreementHandler {
    async fn handle(&self, ctx: &mut Context<'_>, _args: &ParsedArgs) -> HandlerResult {
        let pending = ctx.session.write().pending_agreement.take();
        let Some(account) = pending else {
            return Err(HandlerError::Precondition("No agreement to confirm".into()));
        };
        ctx.lobby.agreement.accept(&account);
        info!(user = %account, "Agreement accepted");
        Ok(())
    }
}

/// Handler for REQUESTUPDATEFILE command.
///
/// `REQUESTUPDATEFILE <version...>`
pub struct RequestUpdateFileHandler;

#[async_trait]
impl Handler for RequestUpdateFileHandler {
    async fn handle(&self, ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let version = args.text(0)?;
        match ctx.lobby.updates.offer_line(version) {
            Some(line) => {
                ctx.reply(line);
                Ok(())
            }
            None => Err(HandlerError::Precondition(format!(
                "No update available for {version}"
            ))),
        }
    }
}

/// Handler for EXIT command.
///
/// `EXIT [reason...]`
pub struct ExitHandler;

#[async_trait]
impl Handler for ExitHandler {
    async fn handle(&self, _ctx: &mut Context<'_>, args: &ParsedArgs) -> HandlerResult {
        let reason = args.opt_text(0).unwrap_or("Client exited");
        Err(HandlerError::Disconnect(reason.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::db::{BanEntry, BanService};
    use crate::handlers::test_support::{TestLobby, TestLobbyBuilder};
    use crate::services::Agreement;
    use crate::state::{AccessLevel, Outbound};

    #[tokio::test]
    async fn test_ping() {
        let t = TestLobby::new();
        let mut guest = t.connect();
        t.run(&guest, "PING").await.unwrap();
        assert_eq!(guest.lines(), vec!["PONG"]);
    }

    #[tokio::test]
    async fn test_login_sends_burst_in_one_batch() {
        let t = TestLobby::new();
        let mut alice = t.login("alice", AccessLevel::Normal);
        t.run(&alice, "OPENBATTLE 8 100 Comet Catcher").await.unwrap();
        alice.lines();

        let mut bob = t.connect();
        t.run(&bob, "LOGIN bob secret 42 0 SpringLobby 0.270")
            .await
            .unwrap();

        let out = bob.drain();
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0],
            Outbound::Batch(vec![
                "ACCEPTED bob".into(),
                "ADDUSER alice".into(),
                "ADDUSER bob".into(),
                "BATTLEOPENED 1 alice 8 100 Comet Catcher".into(),
                "LOGININFOEND".into(),
            ])
        );
        assert_eq!(alice.lines(), vec!["ADDUSER bob"]);

        let session = bob.session.read();
        assert_eq!(session.user_id, Some(42));
        assert_eq!(session.lobby_version.as_deref(), Some("SpringLobby 0.270"));
        assert_eq!(session.access, AccessLevel::Normal);
    }

    #[tokio::test]
    async fn test_login_twice_on_one_session() {
        let t = TestLobby::new();
        let mut alice = t.login("alice", AccessLevel::Normal);
        t.run(&alice, "LOGIN alice x 1 0").await.unwrap_err();
        assert_eq!(alice.lines(), vec!["SERVERMSG Already logged in"]);
    }

    #[tokio::test]
    async fn test_login_name_in_use_reverts() {
        let t = TestLobby::new();
        let _alice = t.login("alice", AccessLevel::Normal);

        let mut other = t.connect();
        t.run(&other, "LOGIN ALICE x 1 cl").await.unwrap_err();
        assert_eq!(other.lines(), vec!["DENIED Already logged in"]);

        let session = other.session.read();
        assert!(!session.is_logged_in());
        assert_eq!(session.access, AccessLevel::None);
        assert!(session.compat.is_empty());
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let t = TestLobby::new();
        let mut guest = t.connect();
        t.run(&guest, "LOGIN root wrong 1 0").await.unwrap_err();
        assert_eq!(guest.lines(), vec!["DENIED Bad username/password"]);
        assert!(t.lobby.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_login_configured_admin() {
        let t = TestLobby::new();
        let mut root = t.connect();
        t.run(&root, "LOGIN root toor 1 0").await.unwrap();
        root.lines();
        assert_eq!(root.session.read().access, AccessLevel::Admin);
    }

    #[tokio::test]
    async fn test_banned_login_denied() {
        let t = TestLobbyBuilder::new().sqlite_bans().await.build();
        t.lobby
            .bans
            .add(&BanEntry::for_username("mallory", 0, "cheating", "root"))
            .await
            .unwrap();

        let mut mallory = t.connect();
        t.run(&mallory, "LOGIN mallory pw 7 0").await.unwrap_err();
        assert_eq!(
            mallory.lines(),
            vec!["DENIED You are banned from this server (cheating)"]
        );
        assert!(!mallory.session.read().is_logged_in());
    }

    #[tokio::test]
    async fn test_agreement_flow() {
        let t = TestLobbyBuilder::new()
            .agreement(Agreement::from_text(Some("{\\rtf1 Rules}"), Some("Rules")))
            .build();
        let mut bob = t.connect();

        t.run(&bob, "LOGIN bob pw 1 p").await.unwrap();
        assert_eq!(
            bob.drain(),
            vec![Outbound::Batch(vec![
                "AGREEMENT Rules".into(),
                "AGREEMENTEND".into()
            ])]
        );
        assert!(!bob.session.read().is_logged_in());

        t.run(&bob, "CONFIRMAGREEMENT").await.unwrap();
        t.run(&bob, "LOGIN bob pw 1 p").await.unwrap();
        assert!(bob.session.read().is_logged_in());
        assert_eq!(bob.lines()[0], "ACCEPTED bob");

        // Nothing left to confirm.
        t.run(&bob, "CONFIRMAGREEMENT").await.unwrap_err();
    }

    #[tokio::test]
    async fn test_request_update_file() {
        let t = TestLobby::new();
        let mut guest = t.connect();

        t.run(&guest, "REQUESTUPDATEFILE SpringLobby 0.195").await.unwrap();
        t.run(&guest, "REQUESTUPDATEFILE Unknown 1.0").await.unwrap();
        assert_eq!(
            guest.lines(),
            vec![
                "OFFERFILE http://example.org/sl-0.270.exe SpringLobby 0.270",
                "OFFERFILE http://example.org/latest.exe Latest release",
            ]
        );

        let t = TestLobbyBuilder::new().no_updates().build();
        let mut guest = t.connect();
        t.run(&guest, "REQUESTUPDATEFILE Unknown 1.0").await.unwrap_err();
        assert_eq!(
            guest.lines(),
            vec!["SERVERMSG No update available for Unknown 1.0"]
        );
    }

    #[tokio::test]
    async fn test_exit_closes_with_reason() {
        let t = TestLobby::new();
        let mut alice = t.login("alice", AccessLevel::Normal);
        t.run(&alice, "EXIT gotta go").await.unwrap_err();
        assert_eq!(alice.drain(), vec![Outbound::Close("client exit: gotta go".into())]);

        let mut bob = t.login("bob", AccessLevel::Normal);
        t.run(&bob, "EXIT").await.unwrap_err();
        assert_eq!(
            bob.drain(),
            vec![Outbound::Close("client exit: Client exited".into())]
        );
    }

    #[tokio::test]
    async fn test_ban_store_failure_is_not_banned() {
        let t = TestLobbyBuilder::new()
            .bans(Arc::new(crate::handlers::test_support::FailingBans) as Arc<dyn BanService>)
            .build();
        let mut bob = t.connect();
        t.run(&bob, "LOGIN bob pw 1 0").await.unwrap();
        assert_eq!(bob.lines()[0], "ACCEPTED bob");
    }
}
