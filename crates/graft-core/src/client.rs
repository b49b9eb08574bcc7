//! Registry index client.
//!
//! A registry is either served over HTTP(S) or laid out in a local
//! directory. In both cases the index lives at `<source>/index.json` and
//! item files are resolved relative to the index's directory.
//!
//! Fetches are single-shot: there is no retry. A caller-provided timeout or
//! cancellation aborts the in-flight request and surfaces as
//! [`FetchError::Network`].

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use graft_schema::{INDEX_FILE, RegistryIndex};
use reqwest::{Client, Url};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::paths::{path_key, safe_join, sanitize_path};

/// Failure to obtain registry data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The registry could not be reached, answered with an error status,
    /// timed out or the request was cancelled.
    #[error("Network error: {0}")]
    Network(String),

    /// The registry answered but the data is not usable.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Where the registry lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// HTTP(S) registry. `base` always ends with `/`.
    Remote {
        /// Directory URL item files are resolved against.
        base: Url,
        /// URL of the index document.
        index: Url,
    },
    /// Registry laid out on the local file system.
    Local {
        /// Directory item files are resolved against.
        root: PathBuf,
        /// Path of the index document.
        index: PathBuf,
    },
}

impl RegistrySource {
    /// Parse a source string.
    ///
    /// `http://` and `https://` strings are remote; anything else is a local
    /// path. A source ending in `.json` names the index file itself.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Parse`] for an empty string or an invalid URL.
    pub fn parse(source: &str) -> Result<Self, FetchError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(FetchError::Parse("registry source is empty".into()));
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            let invalid = |e| {
                FetchError::Parse(format!("invalid registry URL '{source}': {e}"))
            };
            let url = Url::parse(source).map_err(invalid)?;

            if url.path().ends_with(".json") {
                let base = url.join(".").map_err(invalid)?;
                return Ok(Self::Remote { base, index: url });
            }

            let base = if url.path().ends_with('/') {
                url
            } else {
                Url::parse(&format!("{source}/")).map_err(invalid)?
            };
            let index = base.join(INDEX_FILE).map_err(invalid)?;
            return Ok(Self::Remote { base, index });
        }

        let path = PathBuf::from(source);
        if path.extension().is_some_and(|ext| ext == "json") {
            let root = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            return Ok(Self::Local { root, index: path });
        }

        Ok(Self::Local {
            index: path.join(INDEX_FILE),
            root: path,
        })
    }

    /// Parse a source string, resolving a relative local path against `dir`.
    ///
    /// # Errors
    ///
    /// Same as [`RegistrySource::parse`].
    pub fn parse_relative_to(source: &str, dir: &Path) -> Result<Self, FetchError> {
        Ok(match Self::parse(source)? {
            Self::Local { root, index } if root.is_relative() => Self::Local {
                root: dir.join(root),
                index: dir.join(index),
            },
            other => other,
        })
    }
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { index, .. } => write!(f, "{index}"),
            Self::Local { index, .. } => write!(f, "{}", index.display()),
        }
    }
}

/// Fetches the payload of one registry file.
///
/// The resolver only needs file content, so it depends on this trait rather
/// than on [`IndexClient`] directly.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the file at a registry-relative source path.
    async fn fetch_file(&self, source_path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Client for one registry source.
pub struct IndexClient {
    source: RegistrySource,
    http: Client,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    last_error: Mutex<Option<String>>,
}

impl fmt::Debug for IndexClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexClient")
            .field("source", &self.source)
            .field("timeout", &self.timeout)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl IndexClient {
    /// Create a client with no timeout and no cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the HTTP client cannot be built.
    pub fn new(source: RegistrySource) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            source,
            http,
            timeout: None,
            cancel: CancellationToken::new(),
            last_error: Mutex::new(None),
        })
    }

    /// Abort any single fetch that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Abort in-flight fetches when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The registry this client reads from.
    pub fn source(&self) -> &RegistrySource {
        &self.source
    }

    /// Message of the most recent failure since the last index fetch.
    ///
    /// File fetches only ever set it, so a file that arrives after a failed
    /// one does not hide the failure. [`IndexClient::fetch_index`] clears it.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|slot| slot.clone())
    }

    /// Fetch and parse the registry index.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the index cannot be retrieved and
    /// [`FetchError::Parse`] if it is not a valid index document.
    pub async fn fetch_index(&self) -> Result<RegistryIndex, FetchError> {
        let location = self.source.to_string();
        tracing::debug!(source = %location, "fetching registry index");

        if let Ok(mut slot) = self.last_error.lock() {
            *slot = None;
        }

        self.guarded(async {
            let bytes = match &self.source {
                RegistrySource::Remote { index, .. } => self.get(index).await?,
                RegistrySource::Local { index, .. } => read_local(index).await?,
            };
            let text = std::str::from_utf8(&bytes)
                .map_err(|e| FetchError::Parse(format!("{location} is not UTF-8: {e}")))?;
            let index = RegistryIndex::from_json(text)
                .map_err(|e| FetchError::Parse(format!("{location}: {e}")))?;

            tracing::debug!(items = index.len(), "registry index loaded");
            Ok::<_, FetchError>(index)
        })
        .await
    }

    /// Fetch one item file by its registry-relative source path.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Parse`] if the source path escapes the registry
    /// and [`FetchError::Network`] if the file cannot be retrieved.
    pub async fn fetch_file(&self, source_path: &str) -> Result<Vec<u8>, FetchError> {
        self.guarded(async {
            let relative = sanitize_path(source_path).map_err(|e| {
                FetchError::Parse(format!("invalid source path '{source_path}': {e}"))
            })?;

            match &self.source {
                RegistrySource::Remote { base, .. } => {
                    let url = base.join(&path_key(&relative)).map_err(|e| {
                        FetchError::Parse(format!("invalid source path '{source_path}': {e}"))
                    })?;
                    self.get(&url).await
                }
                RegistrySource::Local { root, .. } => {
                    let path = safe_join(root, &relative).map_err(|e| {
                        FetchError::Parse(format!("invalid source path '{source_path}': {e}"))
                    })?;
                    read_local(&path).await
                }
            }
        })
        .await
    }

    async fn get(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(FetchError::Network(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to read response from {url}: {e}")))?;

        Ok(body.to_vec())
    }

    /// Run `fut` under the timeout and cancellation token, remembering any failure.
    async fn guarded<T>(
        &self,
        fut: impl Future<Output = Result<T, FetchError>>,
    ) -> Result<T, FetchError> {
        let bounded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
                    Err(FetchError::Network(format!(
                        "request timed out after {}s",
                        limit.as_secs_f64()
                    )))
                }),
                None => fut.await,
            }
        };

        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(FetchError::Network("request cancelled".into())),
            result = bounded => result,
        };

        if let Err(e) = &result {
            tracing::debug!(error = %e, "registry fetch failed");
            if let Ok(mut slot) = self.last_error.lock() {
                *slot = Some(e.to_string());
            }
        }
        result
    }
}

#[async_trait]
impl ContentFetcher for IndexClient {
    async fn fetch_file(&self, source_path: &str) -> Result<Vec<u8>, FetchError> {
        IndexClient::fetch_file(self, source_path).await
    }
}

async fn read_local(path: &Path) -> Result<Vec<u8>, FetchError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| FetchError::Network(format!("Failed to read {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"[
        { "name": "button", "files": ["ui/button.tsx"], "dependencies": ["icon-frame"] },
        { "name": "icon-frame", "files": ["ui/icon-frame.tsx"] }
    ]"#;

    fn local_registry() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.json"), INDEX).unwrap();
        std::fs::create_dir_all(dir.path().join("default/ui")).unwrap();
        std::fs::write(dir.path().join("default/ui/button.tsx"), "export {}\n").unwrap();
        dir
    }

    #[test]
    fn parse_remote_sources() {
        let source = RegistrySource::parse("https://graft.dev/r").unwrap();
        let RegistrySource::Remote { base, index } = &source else {
            panic!("expected remote source");
        };
        assert_eq!(base.as_str(), "https://graft.dev/r/");
        assert_eq!(index.as_str(), "https://graft.dev/r/index.json");

        let source = RegistrySource::parse("https://graft.dev/r/registry.json").unwrap();
        let RegistrySource::Remote { base, index } = &source else {
            panic!("expected remote source");
        };
        assert_eq!(base.as_str(), "https://graft.dev/r/");
        assert_eq!(index.as_str(), "https://graft.dev/r/registry.json");
    }

    #[test]
    fn parse_local_sources() {
        assert_eq!(
            RegistrySource::parse("./registry").unwrap(),
            RegistrySource::Local {
                root: PathBuf::from("./registry"),
                index: PathBuf::from("./registry/index.json"),
            }
        );
        assert_eq!(
            RegistrySource::parse("index.json").unwrap(),
            RegistrySource::Local {
                root: PathBuf::from("."),
                index: PathBuf::from("index.json"),
            }
        );
        assert!(matches!(RegistrySource::parse("  "), Err(FetchError::Parse(_))));
        assert!(matches!(
            RegistrySource::parse("https://"),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn relative_local_source_is_anchored() {
        let source = RegistrySource::parse_relative_to("registry", Path::new("/project")).unwrap();
        assert_eq!(
            source,
            RegistrySource::Local {
                root: PathBuf::from("/project/registry"),
                index: PathBuf::from("/project/registry/index.json"),
            }
        );
    }

    #[tokio::test]
    async fn fetch_index_from_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/r/index.json")
            .match_header("user-agent", crate::USER_AGENT)
            .with_status(200)
            .with_body(INDEX)
            .create_async()
            .await;

        let source = RegistrySource::parse(&format!("{}/r", server.url())).unwrap();
        let client = IndexClient::new(source).unwrap();
        let index = client.fetch_index().await.unwrap();

        mock.assert_async().await;
        assert_eq!(index.len(), 2);
        assert!(index.contains("icon-frame"));
        assert!(client.last_error().is_none());
    }

    #[tokio::test]
    async fn error_status_is_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/index.json")
            .with_status(503)
            .create_async()
            .await;

        let client = IndexClient::new(RegistrySource::parse(&server.url()).unwrap()).unwrap();
        let err = client.fetch_index().await.unwrap_err();

        assert!(matches!(&err, FetchError::Network(msg) if msg.contains("503")));
        assert_eq!(client.last_error(), Some(err.to_string()));
    }

    #[tokio::test]
    async fn malformed_index_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/index.json")
            .with_status(200)
            .with_body(r#"[{ "name": "button" }]"#)
            .create_async()
            .await;

        let client = IndexClient::new(RegistrySource::parse(&server.url()).unwrap()).unwrap();
        assert!(matches!(
            client.fetch_index().await,
            Err(FetchError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn file_success_keeps_earlier_failure() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/default/ui/gone.tsx")
            .with_status(404)
            .create_async()
            .await;
        let _present = server
            .mock("GET", "/default/ui/button.tsx")
            .with_status(200)
            .with_body("export {}\n")
            .create_async()
            .await;
        let _index = server
            .mock("GET", "/index.json")
            .with_status(200)
            .with_body(INDEX)
            .create_async()
            .await;

        let client = IndexClient::new(RegistrySource::parse(&server.url()).unwrap()).unwrap();
        let err = client.fetch_file("default/ui/gone.tsx").await.unwrap_err();
        assert_eq!(client.last_error(), Some(err.to_string()));

        let body = client.fetch_file("default/ui/button.tsx").await.unwrap();
        assert_eq!(body, b"export {}\n");
        assert_eq!(client.last_error(), Some(err.to_string()));

        client.fetch_index().await.unwrap();
        assert!(client.last_error().is_none());
    }

    #[tokio::test]
    async fn failed_resolve_leaves_last_error() {
        let dir = local_registry();
        std::fs::write(
            dir.path().join("index.json"),
            r#"[{ "name": "button", "files": ["ui/button.tsx", "ui/missing.tsx"] }]"#,
        )
        .unwrap();

        let source = RegistrySource::parse(dir.path().to_str().unwrap()).unwrap();
        let client = IndexClient::new(source).unwrap();
        let index = client.fetch_index().await.unwrap();

        let result = crate::resolver::resolve(&["button"], &index, &client, "default").await;
        assert!(matches!(
            result,
            Err(crate::ResolveError::Fetch(FetchError::Network(_)))
        ));
        let message = client.last_error().unwrap();
        assert!(message.contains("missing.tsx"), "{message}");
    }

    #[tokio::test]
    async fn local_registry_fetches() {
        let dir = local_registry();
        let source = RegistrySource::parse(dir.path().to_str().unwrap()).unwrap();
        let client = IndexClient::new(source).unwrap();

        let index = client.fetch_index().await.unwrap();
        assert_eq!(index.len(), 2);

        let body = client.fetch_file("default/ui/button.tsx").await.unwrap();
        assert_eq!(body, b"export {}\n");

        assert!(matches!(
            client.fetch_file("default/ui/missing.tsx").await,
            Err(FetchError::Network(_))
        ));
        assert!(matches!(
            client.fetch_file("../outside.tsx").await,
            Err(FetchError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn missing_local_index_is_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = RegistrySource::parse(dir.path().to_str().unwrap()).unwrap();
        let client = IndexClient::new(source).unwrap();
        assert!(matches!(
            client.fetch_index().await,
            Err(FetchError::Network(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_token_aborts_fetch() {
        let dir = local_registry();
        let token = CancellationToken::new();
        token.cancel();

        let source = RegistrySource::parse(dir.path().to_str().unwrap()).unwrap();
        let client = IndexClient::new(source)
            .unwrap()
            .with_cancellation(token)
            .with_timeout(Duration::from_secs(5));

        let err = client.fetch_index().await.unwrap_err();
        assert_eq!(err, FetchError::Network("request cancelled".into()));
    }

    #[tokio::test]
    async fn timeout_aborts_stalled_fetch() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let source = RegistrySource::parse(&format!("http://{addr}")).unwrap();
        let client = IndexClient::new(source)
            .unwrap()
            .with_timeout(Duration::from_millis(200));

        let err = client.fetch_index().await.unwrap_err();
        assert!(
            matches!(&err, FetchError::Network(msg) if msg.contains("timed out")),
            "{err}"
        );
        assert_eq!(client.last_error(), Some(err.to_string()));
    }
}
