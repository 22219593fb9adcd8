//! In-process lobby fixtures for handler tests.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::core::{Context, HandlerResult, Registry};
use crate::config::{AccountBlock, FloodAction, UpdateEntry};
use crate::db::{BanEntry, BanService, Database, DbError, NoopBanService, SqliteBanService};
use crate::security::FloodProtection;
use crate::services::{AccountStore, Agreement, UpdateCatalog};
use crate::state::{
    AccessLevel, CompatFlags, Lobby, LobbyParams, Outbound, Outbox, ServerInfo, Session,
    SessionId, SessionRef,
};

/// A session wired to a receiver the test can inspect.
pub struct TestClient {
    pub sid: SessionId,
    pub session: SessionRef,
    pub outbox: Outbox,
    pub addr: SocketAddr,
    rx: mpsc::UnboundedReceiver<Outbound>,
}

impl TestClient {
    /// Everything queued so far.
    pub fn drain(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            out.push(item);
        }
        out
    }

    /// Queued lines with batches flattened; close markers are dropped.
    pub fn lines(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .flat_map(|item| match item {
                Outbound::Line(line) => vec![line],
                Outbound::Batch(lines) => lines,
                Outbound::Close(_) => Vec::new(),
            })
            .collect()
    }

    /// Whether a close marker is queued. Consumes the queue.
    pub fn was_closed(&mut self) -> bool {
        self.drain()
            .iter()
            .any(|item| matches!(item, Outbound::Close(_)))
    }
}

/// Ban store whose every call fails.
pub struct FailingBans;

fn unavailable() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolClosed)
}

#[async_trait]
impl BanService for FailingBans {
    async fn size(&self) -> Result<usize, DbError> {
        Err(unavailable())
    }
    async fn active_size(&self) -> Result<usize, DbError> {
        Err(unavailable())
    }
    async fn add(&self, _entry: &BanEntry) -> Result<(), DbError> {
        Err(unavailable())
    }
    async fn remove(&self, _entry: &BanEntry) -> Result<bool, DbError> {
        Err(unavailable())
    }
    async fn find(
        &self,
        _username: Option<&str>,
        _ip: Option<&str>,
        _user_id: Option<i64>,
    ) -> Result<Option<BanEntry>, DbError> {
        Err(unavailable())
    }
    async fn merge(&self, _entry: &BanEntry) -> Result<bool, DbError> {
        Err(unavailable())
    }
    async fn list_all(&self) -> Result<Vec<BanEntry>, DbError> {
        Err(unavailable())
    }
    async fn list_active(&self) -> Result<Vec<BanEntry>, DbError> {
        Err(unavailable())
    }
}

pub struct TestLobbyBuilder {
    bans: Arc<dyn BanService>,
    agreement: Agreement,
    updates: Vec<UpdateEntry>,
    flood: FloodProtection,
    flood_action: FloodAction,
}

impl TestLobbyBuilder {
    pub fn new() -> Self {
        Self {
            bans: Arc::new(NoopBanService),
            agreement: Agreement::default(),
            updates: vec![
                UpdateEntry {
                    version: "SpringLobby 0.195".into(),
                    url: "http://example.org/sl-0.270.exe".into(),
                    description: "SpringLobby 0.270".into(),
                },
                UpdateEntry {
                    version: "default".into(),
                    url: "http://example.org/latest.exe".into(),
                    description: "Latest release".into(),
                },
            ],
            flood: FloodProtection::new(
                FloodProtection::DEFAULT_PERIOD_SECS,
                FloodProtection::DEFAULT_USER_THRESHOLD,
                FloodProtection::DEFAULT_BOT_THRESHOLD,
            ),
            flood_action: FloodAction::Disconnect,
        }
    }

    pub fn bans(mut self, bans: Arc<dyn BanService>) -> Self {
        self.bans = bans;
        self
    }

    pub async fn sqlite_bans(self) -> Self {
        let db = Database::new(":memory:").await.unwrap();
        self.bans(Arc::new(SqliteBanService::new(&db)))
    }

    pub fn agreement(mut self, agreement: Agreement) -> Self {
        self.agreement = agreement;
        self
    }

    pub fn no_updates(mut self) -> Self {
        self.updates.clear();
        self
    }

    pub fn build(self) -> TestLobby {
        let accounts = AccountStore::from_config(
            &[
                AccountBlock {
                    name: "root".into(),
                    password: Some("toor".into()),
                    password_hash: None,
                    access: AccessLevel::Admin,
                    bot: false,
                },
                AccountBlock {
                    name: "autohost".into(),
                    password: Some("beep".into()),
                    password_hash: None,
                    access: AccessLevel::Normal,
                    bot: true,
                },
            ],
            true,
        );
        let lobby = Lobby::new(LobbyParams {
            server: ServerInfo {
                name: "test.lobby".into(),
                protocol_version: "0.38".into(),
            },
            flood: self.flood,
            flood_action: self.flood_action,
            bans: self.bans,
            accounts,
            agreement: self.agreement,
            updates: UpdateCatalog::new(&self.updates),
        });
        TestLobby {
            lobby: Arc::new(lobby),
            registry: Registry::new(),
        }
    }
}

/// A lobby plus registry, driven line by line without sockets.
pub struct TestLobby {
    pub lobby: Arc<Lobby>,
    pub registry: Registry,
}

impl TestLobby {
    pub fn new() -> Self {
        TestLobbyBuilder::new().build()
    }

    /// A connected session that has not logged in.
    pub fn connect(&self) -> TestClient {
        let sid = self.lobby.sessions.next_id();
        let addr: SocketAddr = format!("10.0.0.{}:5000", sid % 250 + 1).parse().unwrap();
        let (outbox, rx) = Outbox::channel();
        let session = Arc::new(RwLock::new(Session::new(sid, addr, outbox.clone())));
        TestClient {
            sid,
            session,
            outbox,
            addr,
            rx,
        }
    }

    /// A registered session, entered directly without the LOGIN handler.
    pub fn login(&self, name: &str, access: AccessLevel) -> TestClient {
        self.login_with(name, access, "0")
    }

    pub fn login_with(&self, name: &str, access: AccessLevel, flags: &str) -> TestClient {
        let client = self.connect();
        {
            let mut session = client.session.write();
            session.username = Some(name.to_string());
            session.access = access;
            session.compat = CompatFlags::parse(flags);
        }
        self.lobby
            .sessions
            .register(
                client.sid,
                name,
                Arc::clone(&client.session),
                client.outbox.clone(),
            )
            .unwrap();
        client
    }

    pub async fn run(&self, client: &TestClient, line: &str) -> HandlerResult {
        self.run_with(&self.registry, client, line).await
    }

    pub async fn run_with(
        &self,
        registry: &Registry,
        client: &TestClient,
        line: &str,
    ) -> HandlerResult {
        let mut ctx = Context::new(
            client.sid,
            &client.session,
            &self.lobby,
            &client.outbox,
            client.addr,
        );
        registry.dispatch(&mut ctx, line).await
    }
}
