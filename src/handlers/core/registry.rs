//! Command registry and dispatch.
//!
//! The `Registry` is the static table of every command the lobby accepts,
//! built once at startup. `dispatch` walks a line through the gates
//! (lookup, argument parsing, access, deprecation) before the handler runs,
//! and turns every failure into at most one reply for the issuer.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::FutureExt;
use lobby_proto::{ArgKind, ArgumentSpec, CommandLine};
use tracing::{Instrument, debug, error};

use super::context::{Context, Handler, HandlerError, HandlerResult};
use crate::error::FailureKind;
use crate::handlers::{
    bans::{BanHandler, BanListHandler, UnbanHandler},
    battle::{
        AddBotHandler, JoinBattleAcceptHandler, JoinBattleDenyHandler, JoinBattleHandler,
        LeaveBattleHandler, OpenBattleHandler, RemoveBotHandler, SayBattleHandler,
        UpdateBattleInfoHandler,
    },
    connection::{
        ConfirmAgreementHandler, ExitHandler, LoginHandler, PingHandler, RequestUpdateFileHandler,
    },
    oper::{FloodLevelHandler, KickUserHandler},
};
use crate::state::{AccessLevel, FLAG_NO_DEPRECATED};
use crate::telemetry::{CommandTimer, spans};

/// Metric label used for keywords that are not registered.
const UNKNOWN_LABEL: &str = "UNKNOWN";

/// Marks a command as refused to sessions that declared `flag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deprecation {
    pub flag: &'static str,
    pub removed_after: &'static str,
}

/// One registered command.
pub struct CommandEntry {
    pub keyword: &'static str,
    pub access: AccessLevel,
    pub args: ArgumentSpec,
    pub deprecated: Option<Deprecation>,
    handler: Box<dyn Handler>,
    count: AtomicU64,
}

impl CommandEntry {
    fn new(
        keyword: &'static str,
        access: AccessLevel,
        args: ArgumentSpec,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            keyword,
            access,
            args,
            deprecated: None,
            handler: Box::new(handler),
            count: AtomicU64::new(0),
        }
    }

    fn deprecated(mut self, flag: &'static str, removed_after: &'static str) -> Self {
        self.deprecated = Some(Deprecation {
            flag,
            removed_after,
        });
        self
    }

    /// Times this command was received, rejected attempts included.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    async fn run(&self, ctx: &mut Context<'_>, tokens: &[&str]) -> HandlerResult {
        self.count.fetch_add(1, Ordering::Relaxed);

        let args = self
            .args
            .parse(tokens)
            .map_err(|source| HandlerError::MalformedArguments {
                command: self.keyword,
                source,
            })?;

        let (held, declared_flag) = {
            let session = ctx.session.read();
            let declared = self
                .deprecated
                .is_some_and(|dep| session.compat.has(dep.flag));
            (session.access, declared)
        };

        if !held.satisfies(self.access) {
            return Err(HandlerError::InsufficientAccess {
                command: self.keyword,
                required: self.access,
                held,
            });
        }

        if let Some(dep) = self.deprecated
            && declared_flag
        {
            return Err(HandlerError::Deprecated {
                command: self.keyword,
                removed_after: dep.removed_after,
            });
        }

        let span = spans::command(self.keyword, ctx.sid, &ctx.username());
        let _timer = CommandTimer::new(self.keyword);

        match AssertUnwindSafe(self.handler.handle(ctx, &args))
            .catch_unwind()
            .instrument(span)
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(HandlerError::Internal(format!(
                "handler panicked: {}",
                panic_message(panic.as_ref())
            ))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Registry of command handlers.
pub struct Registry {
    commands: HashMap<&'static str, CommandEntry>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        use AccessLevel::{Admin, None, Normal};

        let mut registry = Self {
            commands: HashMap::new(),
        };

        // Session handlers
        registry.register(CommandEntry::new("PING", None, ArgumentSpec::none(), PingHandler));
        registry.register(CommandEntry::new(
            "LOGIN",
            None,
            ArgumentSpec::at_least(4)
                .arg(ArgKind::Word)
                .arg(ArgKind::Word)
                .arg(ArgKind::Int)
                .arg(ArgKind::Word)
                .arg(ArgKind::Sentence),
            LoginHandler,
        ));
        registry.register(CommandEntry::new(
            "CONFIRMAGREEMENT",
            None,
            ArgumentSpec::none(),
            ConfirmAgreementHandler,
        ));
        registry.register(CommandEntry::new(
            "REQUESTUPDATEFILE",
            None,
            ArgumentSpec::at_least(1).arg(ArgKind::Sentence),
            RequestUpdateFileHandler,
        ));
        registry.register(CommandEntry::new(
            "EXIT",
            None,
            ArgumentSpec::at_least(0).arg(ArgKind::Sentence),
            ExitHandler,
        ));

        // Battle handlers
        registry.register(CommandEntry::new(
            "OPENBATTLE",
            Normal,
            ArgumentSpec::at_least(3)
                .arg(ArgKind::Int)
                .arg(ArgKind::Int)
                .arg(ArgKind::Sentence),
            OpenBattleHandler,
        ));
        registry.register(CommandEntry::new(
            "JOINBATTLE",
            Normal,
            ArgumentSpec::exact(1).arg(ArgKind::Int),
            JoinBattleHandler,
        ));
        registry.register(CommandEntry::new(
            "JOINBATTLEACCEPT",
            Normal,
            ArgumentSpec::exact(1).arg(ArgKind::Word),
            JoinBattleAcceptHandler,
        ));
        registry.register(CommandEntry::new(
            "JOINBATTLEDENY",
            Normal,
            ArgumentSpec::at_least(1)
                .arg(ArgKind::Word)
                .arg(ArgKind::Sentence),
            JoinBattleDenyHandler,
        ));
        registry.register(CommandEntry::new(
            "LEAVEBATTLE",
            Normal,
            ArgumentSpec::none(),
            LeaveBattleHandler,
        ));
        registry.register(CommandEntry::new(
            "ADDBOT",
            Normal,
            ArgumentSpec::at_least(2)
                .arg(ArgKind::Word)
                .arg(ArgKind::Sentence),
            AddBotHandler,
        ));
        registry.register(CommandEntry::new(
            "REMOVEBOT",
            Normal,
            ArgumentSpec::exact(1).arg(ArgKind::Word),
            RemoveBotHandler,
        ));
        registry.register(CommandEntry::new(
            "UPDATEBATTLEINFO",
            Normal,
            ArgumentSpec::at_least(3)
                .arg(ArgKind::Bool)
                .arg(ArgKind::Int)
                .arg(ArgKind::Sentence),
            UpdateBattleInfoHandler,
        ));
        registry.register(CommandEntry::new(
            "SAYBATTLE",
            Normal,
            ArgumentSpec::at_least(1).arg(ArgKind::Sentence),
            SayBattleHandler::plain(),
        ));
        registry.register(
            CommandEntry::new(
                "SAYBATTLEEX",
                Normal,
                ArgumentSpec::at_least(1).arg(ArgKind::Sentence),
                SayBattleHandler::ex(),
            )
            .deprecated(FLAG_NO_DEPRECATED, "0.37"),
        );

        // Admin handlers
        registry.register(CommandEntry::new(
            "FLOODLEVEL",
            Admin,
            ArgumentSpec::exact(2).arg(ArgKind::Upper).arg(ArgKind::Int),
            FloodLevelHandler,
        ));
        registry.register(CommandEntry::new(
            "KICKUSER",
            Admin,
            ArgumentSpec::at_least(1)
                .arg(ArgKind::Word)
                .arg(ArgKind::Sentence),
            KickUserHandler,
        ));
        registry.register(CommandEntry::new(
            "BAN",
            Admin,
            ArgumentSpec::at_least(2)
                .arg(ArgKind::Word)
                .arg(ArgKind::Int)
                .arg(ArgKind::Sentence),
            BanHandler,
        ));
        registry.register(CommandEntry::new(
            "UNBAN",
            Admin,
            ArgumentSpec::exact(1).arg(ArgKind::Word),
            UnbanHandler,
        ));
        registry.register(CommandEntry::new(
            "BANLIST",
            Admin,
            ArgumentSpec::none(),
            BanListHandler,
        ));

        registry
    }

    fn register(&mut self, entry: CommandEntry) {
        let previous = self.commands.insert(entry.keyword, entry);
        debug_assert!(previous.is_none(), "command registered twice");
    }

    pub fn get(&self, keyword: &str) -> Option<&CommandEntry> {
        self.commands.get(keyword)
    }

    /// Every registered command, sorted by keyword.
    pub fn commands(&self) -> Vec<&CommandEntry> {
        let mut all: Vec<_> = self.commands.values().collect();
        all.sort_by_key(|entry| entry.keyword);
        all
    }

    /// Command usage statistics, most used first.
    pub fn get_command_stats(&self) -> Vec<(&'static str, u64)> {
        let mut stats: Vec<_> = self
            .commands
            .values()
            .map(|entry| (entry.keyword, entry.count()))
            .filter(|(_, count)| *count > 0) // Only include used commands
            .collect();

        stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        stats
    }

    /// Dispatch one line from a session.
    ///
    /// Failures are already reported (reply, log, metrics, close) when this
    /// returns; the result is handed back for callers that inspect it.
    pub async fn dispatch(&self, ctx: &mut Context<'_>, line: &str) -> HandlerResult {
        let Some(parsed) = CommandLine::split(line) else {
            return Ok(());
        };

        let (name, result) = match self.commands.get(parsed.keyword.as_str()) {
            Some(entry) => (entry.keyword, entry.run(ctx, &parsed.tokens).await),
            None => (
                UNKNOWN_LABEL,
                Err(HandlerError::UnknownCommand(parsed.keyword.clone())),
            ),
        };

        if let Err(e) = &result {
            report(ctx, name, e);
        }
        result
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn report(ctx: &Context<'_>, name: &str, e: &HandlerError) {
    crate::metrics::record_command_error(name, e.error_code());

    match e.kind() {
        Some(kind @ (FailureKind::ProcessingFailure | FailureKind::TransportFailure)) => {
            error!(
                command = %name,
                session = ctx.sid,
                addr = %ctx.remote_addr,
                kind = kind.as_str(),
                error = %e,
                "Command failed"
            );
        }
        Some(kind) => {
            debug!(command = %name, session = ctx.sid, kind = kind.as_str(), error = %e, "Command rejected");
        }
        None => {
            debug!(command = %name, session = ctx.sid, reason = %e, "Session close requested");
        }
    }

    if let Some(reply) = e.to_reply(name) {
        ctx.reply(reply);
    }
    if e.closes_session() {
        ctx.outbox.close(e.to_string());
    }
}
