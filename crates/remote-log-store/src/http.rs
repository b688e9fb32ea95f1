//! HTTP transport for the remote log store.

use crate::{LogSource, RemoteError, RemoteResult};
use async_trait::async_trait;
use logsync_config_and_utils::{AgentConfig, Secret};
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use std::time::Duration;
use sync_cursor_store::FileId;
use tracing::{debug, warn};
use url::Url;

/// Name of the bootstrap listing under the base URL.
pub const INDEX_FILE_NAME: &str = "logs.index";

/// Connection settings for [`HttpLogStore`].
#[derive(Debug, Clone)]
pub struct HttpStoreSettings {
    /// Must end with `/`.
    pub base_url: Url,
    pub api_id: String,
    pub api_key: Secret,
    pub proxy: Option<String>,
    pub custom_ca: Option<PathBuf>,
    pub timeout: Duration,
}

impl HttpStoreSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_id: config.api_id.clone(),
            api_key: config.api_key.clone(),
            proxy: config.proxy.clone(),
            custom_ca: config.custom_ca.clone(),
            timeout: config.timing.request_timeout,
        }
    }
}

/// [`LogSource`] backed by `GET {base_url}{name}` with HTTP Basic auth.
pub struct HttpLogStore {
    client: Client,
    settings: HttpStoreSettings,
}

impl HttpLogStore {
    /// Build the HTTP client. Fails on an invalid proxy address or an
    /// unreadable CA bundle.
    pub fn new(settings: HttpStoreSettings) -> RemoteResult<Self> {
        let mut builder = Client::builder().timeout(settings.timeout);

        if let Some(proxy) = &settings.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| RemoteError::Config(format!("invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        if let Some(path) = &settings.custom_ca {
            let pem = std::fs::read(path).map_err(|e| {
                RemoteError::Config(format!("cannot read CA bundle {}: {e}", path.display()))
            })?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                RemoteError::Config(format!("invalid CA bundle {}: {e}", path.display()))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        let client = builder
            .build()
            .map_err(|e| RemoteError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { client, settings })
    }

    pub fn from_config(config: &AgentConfig) -> RemoteResult<Self> {
        Self::new(HttpStoreSettings::from_config(config))
    }

    pub fn base_url(&self) -> &Url {
        &self.settings.base_url
    }

    /// Fetch one object and map the status per the store's contract.
    async fn get(&self, name: &str) -> RemoteResult<Vec<u8>> {
        let url = self
            .settings
            .base_url
            .join(name)
            .map_err(|e| RemoteError::Config(format!("cannot build URL for {name}: {e}")))?;

        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .basic_auth(&self.settings.api_id, Some(self.settings.api_key.expose()))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.bytes().await?;
                if body.is_empty() {
                    return Err(RemoteError::Empty(name.to_string()));
                }
                Ok(body.to_vec())
            }
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound(name.to_string())),
            StatusCode::UNAUTHORIZED => {
                warn!(name, "Remote store rejected credentials");
                Err(RemoteError::Unauthorized)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(name, "Remote store is rate limiting");
                Err(RemoteError::RateLimited)
            }
            status => Err(RemoteError::Status {
                status: status.as_u16(),
                name: name.to_string(),
            }),
        }
    }
}

#[async_trait]
impl LogSource for HttpLogStore {
    async fn fetch_file(&self, id: &FileId) -> RemoteResult<Vec<u8>> {
        self.get(&id.file_name()).await
    }

    async fn fetch_index(&self) -> RemoteResult<String> {
        let body = self.get(INDEX_FILE_NAME).await?;
        String::from_utf8(body)
            .map_err(|_| RemoteError::Validation("index is not valid UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP/1.1 server answering canned responses by path.
    struct StubServer {
        addr: SocketAddr,
        requests: Arc<Mutex<Vec<(String, Option<String>)>>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl StubServer {
        async fn start(routes: Vec<(&'static str, u16, &'static [u8])>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let routes: Arc<HashMap<String, (u16, Vec<u8>)>> = Arc::new(
                routes
                    .into_iter()
                    .map(|(path, status, body)| (path.to_string(), (status, body.to_vec())))
                    .collect(),
            );
            let requests = Arc::new(Mutex::new(Vec::new()));
            let recorded = requests.clone();

            let handle = tokio::spawn(async move {
                loop {
                    let Ok((mut stream, _)) = listener.accept().await else {
                        break;
                    };
                    let routes = routes.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            match stream.read(&mut chunk).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }
                        let head = String::from_utf8_lossy(&buf).to_string();
                        let path = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("/")
                            .to_string();
                        let auth = head
                            .lines()
                            .find(|line| line.to_ascii_lowercase().starts_with("authorization:"))
                            .map(|line| line["authorization:".len()..].trim().to_string());
                        recorded.lock().unwrap().push((path.clone(), auth));

                        let (status, body) = routes
                            .get(&path)
                            .cloned()
                            .unwrap_or((404, b"missing".to_vec()));
                        let head = format!(
                            "HTTP/1.1 {status} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            body.len()
                        );
                        let _ = stream.write_all(head.as_bytes()).await;
                        let _ = stream.write_all(&body).await;
                        let _ = stream.shutdown().await;
                    });
                }
            });

            Self {
                addr,
                requests,
                handle,
            }
        }

        fn store(&self) -> HttpLogStore {
            HttpLogStore::new(HttpStoreSettings {
                base_url: Url::parse(&format!("http://{}/acct_1/", self.addr)).unwrap(),
                api_id: "1234".to_string(),
                api_key: Secret::new("abcd"),
                proxy: None,
                custom_ca: None,
                timeout: Duration::from_secs(5),
            })
            .unwrap()
        }

        fn requests(&self) -> Vec<(String, Option<String>)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Drop for StubServer {
        fn drop(&mut self) {
            self.handle.abort();
        }
    }

    #[tokio::test]
    async fn fetch_file_returns_body_and_sends_basic_auth() {
        let server =
            StubServer::start(vec![("/acct_1/20230101_5.log", 200, b"payload bytes")]).await;
        let store = server.store();

        let body = store.fetch_file(&FileId::new(20230101, 5)).await.unwrap();
        assert_eq!(body, b"payload bytes");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "/acct_1/20230101_5.log");
        // base64("1234:abcd")
        assert_eq!(requests[0].1.as_deref(), Some("Basic MTIzNDphYmNk"));
    }

    #[tokio::test]
    async fn status_codes_map_to_error_kinds() {
        let server = StubServer::start(vec![
            ("/acct_1/1_1.log", 404, b""),
            ("/acct_1/1_2.log", 401, b"no"),
            ("/acct_1/1_3.log", 429, b"slow down"),
            ("/acct_1/1_4.log", 503, b"unavailable"),
            ("/acct_1/1_5.log", 200, b""),
        ])
        .await;
        let store = server.store();

        let err = store.fetch_file(&FileId::new(1, 1)).await.unwrap_err();
        assert!(matches!(err, RemoteError::NotFound(ref name) if name == "1_1.log"));

        let err = store.fetch_file(&FileId::new(1, 2)).await.unwrap_err();
        assert!(matches!(err, RemoteError::Unauthorized));
        assert!(err.is_fatal());

        let err = store.fetch_file(&FileId::new(1, 3)).await.unwrap_err();
        assert!(matches!(err, RemoteError::RateLimited));
        assert!(err.is_fatal());

        let err = store.fetch_file(&FileId::new(1, 4)).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 503, .. }));
        assert!(!err.is_fatal());

        let err = store.fetch_file(&FileId::new(1, 5)).await.unwrap_err();
        assert!(matches!(err, RemoteError::Empty(_)));
    }

    #[tokio::test]
    async fn fetch_index_reads_listing() {
        let server =
            StubServer::start(vec![("/acct_1/logs.index", 200, b"1_1.log\n1_2.log\n")]).await;
        let store = server.store();

        assert_eq!(store.fetch_index().await.unwrap(), "1_1.log\n1_2.log\n");
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = HttpLogStore::new(HttpStoreSettings {
            base_url: Url::parse(&format!("http://{addr}/")).unwrap(),
            api_id: "id".to_string(),
            api_key: Secret::new("key"),
            proxy: None,
            custom_ca: None,
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let err = store.fetch_file(&FileId::new(1, 1)).await.unwrap_err();
        assert_eq!(err.kind(), logsync_config_and_utils::FailureKind::Transport);
    }

    #[test]
    fn unreadable_ca_bundle_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = HttpLogStore::new(HttpStoreSettings {
            base_url: Url::parse("https://logs.example.com/").unwrap(),
            api_id: "id".to_string(),
            api_key: Secret::new("key"),
            proxy: None,
            custom_ca: Some(dir.path().join("missing.pem")),
            timeout: Duration::from_secs(2),
        });
        assert!(matches!(result, Err(RemoteError::Config(_))));
    }
}
