//! Test harness for engine scenarios.
//!
//! Provides:
//! - ScriptedSource: an in-memory LogSource with per-file response queues
//! - RecordingSyslog: a syslog transport that keeps every message
//! - TestHarness: wires the engine to both over a temporary directory

use crate::{CancellationToken, SyncEngine};
use async_trait::async_trait;
use log_delivery_dispatcher::{
    DeliveryResult, DispatchSettings, Dispatcher, EndpointSelector, Quarantine, SyslogTransport,
};
use log_envelope_crypto::{
    seal_envelope, DecryptPipeline, DirectoryKeyRepository, PRIVATE_KEY_FILE_NAME,
};
use logsync_config_and_utils::{SyncTiming, SyslogSettings};
use remote_log_store::{LogSource, RemoteError, RemoteResult};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use sync_cursor_store::{CursorStore, FileId};
use tempfile::TempDir;

pub const KEY_ID: &str = "1";

/// One generated key pair for the whole test binary.
fn test_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap())
}

pub fn id(name: &str) -> FileId {
    FileId::parse(name).unwrap()
}

pub fn listing(names: &[&str]) -> String {
    names.iter().map(|name| format!("{name}\n")).collect()
}

/// Scripted remote response.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(Vec<u8>),
    NotFound,
    Empty,
    Status(u16),
    Unauthorized,
    RateLimited,
}

impl Reply {
    fn into_result(self, name: &str) -> RemoteResult<Vec<u8>> {
        match self {
            Reply::Body(body) => Ok(body),
            Reply::NotFound => Err(RemoteError::NotFound(name.to_string())),
            Reply::Empty => Err(RemoteError::Empty(name.to_string())),
            Reply::Status(status) => Err(RemoteError::Status {
                status,
                name: name.to_string(),
            }),
            Reply::Unauthorized => Err(RemoteError::Unauthorized),
            Reply::RateLimited => Err(RemoteError::RateLimited),
        }
    }
}

/// In-memory remote store. Queued replies are used first; once a queue is
/// drained the per-name default applies, and unknown names answer 404.
#[derive(Default)]
pub struct ScriptedSource {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    defaults: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<String>>,
}

pub const INDEX: &str = "logs.index";

impl ScriptedSource {
    /// Always answer `reply` for `name` once queued replies run out.
    pub fn set(&self, name: &str, reply: Reply) {
        self.defaults.lock().unwrap().insert(name.to_string(), reply);
    }

    /// Answer `reply` once for `name`.
    pub fn queue(&self, name: &str, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn set_index(&self, names: &[&str]) {
        self.set(INDEX, Reply::Body(listing(names).into_bytes()));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, name: &str) -> usize {
        self.requests().iter().filter(|r| *r == name).count()
    }

    fn reply(&self, name: &str) -> RemoteResult<Vec<u8>> {
        self.requests.lock().unwrap().push(name.to_string());
        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(name)
            .and_then(|queue| queue.pop_front());
        let reply = queued
            .or_else(|| self.defaults.lock().unwrap().get(name).cloned())
            .unwrap_or(Reply::NotFound);
        reply.into_result(name)
    }
}

#[async_trait]
impl LogSource for ScriptedSource {
    async fn fetch_file(&self, id: &FileId) -> RemoteResult<Vec<u8>> {
        self.reply(&id.file_name())
    }

    async fn fetch_index(&self) -> RemoteResult<String> {
        self.reply(INDEX)
            .map(|body| String::from_utf8_lossy(&body).into_owned())
    }
}

/// Syslog transport that records every session.
#[derive(Default)]
pub struct RecordingSyslog {
    sessions: Mutex<Vec<Vec<String>>>,
}

impl RecordingSyslog {
    pub fn messages(&self) -> Vec<String> {
        self.sessions.lock().unwrap().iter().flatten().cloned().collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl SyslogTransport for RecordingSyslog {
    async fn send_lines(&self, _host: &str, _port: u16, lines: &[String]) -> DeliveryResult<()> {
        self.sessions.lock().unwrap().push(lines.to_vec());
        Ok(())
    }
}

struct FirstEndpoint;

impl EndpointSelector for FirstEndpoint {
    fn select<'a>(&self, endpoints: &'a [String]) -> Option<&'a str> {
        endpoints.first().map(String::as_str)
    }
}

/// Engine wired to a scripted source and recording sinks.
pub struct TestHarness {
    pub dir: TempDir,
    pub source: Arc<ScriptedSource>,
    pub syslog: Arc<RecordingSyslog>,
    pub cancel: CancellationToken,
    pub timing: SyncTiming,
}

impl TestHarness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let key_dir = dir.path().join("keys").join(KEY_ID);
        std::fs::create_dir_all(&key_dir).unwrap();
        std::fs::write(
            key_dir.join(PRIVATE_KEY_FILE_NAME),
            test_key().to_pkcs1_pem(LineEnding::LF).unwrap().as_bytes(),
        )
        .unwrap();

        Self {
            dir,
            source: Arc::new(ScriptedSource::default()),
            syslog: Arc::new(RecordingSyslog::default()),
            cancel: CancellationToken::new(),
            timing: SyncTiming {
                loop_interval: Duration::from_millis(1),
                ..SyncTiming::immediate()
            },
        }
    }

    pub fn cursor_store(&self) -> CursorStore {
        CursorStore::new(self.dir.path().join("last_file_id"))
    }

    pub fn process_dir(&self) -> PathBuf {
        self.dir.path().join("process")
    }

    pub fn quarantine_path(&self, name: &str) -> PathBuf {
        self.process_dir().join("fail").join(name)
    }

    pub fn set_cursor(&self, name: &str) {
        self.cursor_store().advance(&id(name)).unwrap();
    }

    pub fn stored_cursor(&self) -> Option<String> {
        self.cursor_store().get().unwrap().map(|id| id.to_string())
    }

    /// A valid encrypted envelope for `payload`.
    pub fn sealed(&self, payload: &str) -> Vec<u8> {
        let public = RsaPublicKey::from(test_key());
        seal_envelope(payload.as_bytes(), &public, KEY_ID).unwrap()
    }

    /// Serve `name` as a valid encrypted file whose content is `<name> payload`.
    pub fn serve(&self, name: &str) {
        self.source
            .set(name, Reply::Body(self.sealed(&format!("{name} payload\n"))));
    }

    pub fn engine(&self) -> SyncEngine {
        let dispatcher = Dispatcher::new(
            DispatchSettings {
                syslog: Some(SyslogSettings {
                    addresses: vec!["127.0.0.1".to_string()],
                    port: 514,
                }),
                local_save: true,
                process_dir: self.process_dir(),
                sftp: None,
            },
            None,
        )
        .with_selector(Arc::new(FirstEndpoint))
        .with_syslog_transport(self.syslog.clone());

        let mut engine = SyncEngine::new(
            self.source.clone(),
            self.cursor_store(),
            DecryptPipeline::new(Arc::new(DirectoryKeyRepository::new(
                self.dir.path().join("keys"),
            ))),
            dispatcher,
            Quarantine::new(self.process_dir().join("fail")),
            self.timing,
            self.cancel.clone(),
        );
        engine.load_cursor().unwrap();
        engine
    }

    /// Run the engine in the background until `done` holds for the stored
    /// cursor, then cancel and wait for it to stop.
    pub async fn run_until(&self, done: impl Fn(Option<String>) -> bool) -> SyncEngine {
        let mut engine = self.engine();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(async move {
            let result = engine.run().await;
            (engine, result)
        });

        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while !done(self.stored_cursor()) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "condition not reached, cursor = {:?}",
                self.stored_cursor()
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        cancel.cancel();
        let (engine, result) = task.await.unwrap();
        result.unwrap();
        engine
    }
}
