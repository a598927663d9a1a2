//! Graph document loading.
//!
//! Sources are read on a tokio runtime owned by `DataLoader` and the parsed
//! document is handed back to the UI thread over a channel. Every load gets a
//! ticket; starting a new load aborts the one in flight and any late result
//! carrying an old ticket is dropped, so a document is never applied twice.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::graph_utils::graph::GraphDocument;

pub type LoadTicket = Uuid;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid URL {0:?}: {1}")]
    InvalidUrl(String, url::ParseError),
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("HTTP sources are not supported in this build")]
    HttpDisabled,
    #[error("invalid graph JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Http(Url),
}

impl FromStr for DataSource {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Url::parse(s).map(DataSource::Http).map_err(|e| LoadError::InvalidUrl(s.to_string(), e))
        } else {
            Ok(DataSource::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(p) => write!(f, "{}", p.display()),
            DataSource::Http(u) => write!(f, "{}", u),
        }
    }
}

pub fn parse_document(bytes: &[u8]) -> Result<GraphDocument, LoadError> {
    Ok(GraphDocument::from_json_slice(bytes)?)
}

/// Read and parse a document. There is no timeout; a hung server keeps the
/// load pending until it is cancelled or superseded.
pub async fn fetch_document(source: &DataSource) -> Result<GraphDocument, LoadError> {
    let bytes = match source {
        DataSource::File(path) => tokio::fs::read(path)
            .await
            .map_err(|source| LoadError::Io { path: path.clone(), source })?,
        DataSource::Http(url) => fetch_http(url).await?,
    };
    parse_document(&bytes)
}

#[cfg(feature = "http")]
async fn fetch_http(url: &Url) -> Result<Vec<u8>, LoadError> {
    let resp = reqwest::get(url.clone()).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(LoadError::Status(status.as_u16()));
    }
    Ok(resp.bytes().await?.to_vec())
}

#[cfg(not(feature = "http"))]
async fn fetch_http(_url: &Url) -> Result<Vec<u8>, LoadError> {
    Err(LoadError::HttpDisabled)
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: LoadTicket,
    pub source: DataSource,
    pub result: Result<GraphDocument, LoadError>,
}

struct InFlight {
    ticket: LoadTicket,
    source: DataSource,
    handle: JoinHandle<()>,
}

type Notifier = Arc<dyn Fn() + Send + Sync>;

pub struct DataLoader {
    runtime: Runtime,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    in_flight: Option<InFlight>,
    notify: Option<Notifier>,
}

impl DataLoader {
    pub fn new() -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("kg-loader")
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::channel();
        Ok(Self { runtime, tx, rx, in_flight: None, notify: None })
    }

    /// Called from the loader thread whenever an outcome is ready (e.g. to
    /// request a repaint).
    pub fn set_notifier(&mut self, f: impl Fn() + Send + Sync + 'static) {
        self.notify = Some(Arc::new(f));
    }

    /// Start loading `source`, superseding any load still in flight.
    pub fn start(&mut self, source: DataSource) -> LoadTicket {
        self.cancel();
        let ticket = Uuid::now_v7();
        let tx = self.tx.clone();
        let notify = self.notify.clone();
        let task_source = source.clone();
        log::info!("loading graph from {} ({})", source, ticket);
        let handle = self.runtime.spawn(async move {
            let result = fetch_document(&task_source).await;
            let _ = tx.send(LoadOutcome { ticket, source: task_source, result });
            if let Some(n) = notify {
                n();
            }
        });
        self.in_flight = Some(InFlight { ticket, source, handle });
        ticket
    }

    /// Abort the in-flight load, if any. Returns whether one was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(f) => {
                f.handle.abort();
                log::info!("cancelled load of {} ({})", f.source, f.ticket);
                true
            }
            None => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn current_ticket(&self) -> Option<LoadTicket> {
        self.in_flight.as_ref().map(|f| f.ticket)
    }

    pub fn current_source(&self) -> Option<&DataSource> {
        self.in_flight.as_ref().map(|f| &f.source)
    }

    // Accept only the outcome of the load currently in flight
    fn accept(&mut self, outcome: LoadOutcome) -> Option<LoadOutcome> {
        if self.current_ticket() == Some(outcome.ticket) {
            self.in_flight = None;
            Some(outcome)
        } else {
            log::debug!("discarding stale load outcome {}", outcome.ticket);
            None
        }
    }

    /// Non-blocking: the finished outcome of the current load, if ready.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        while let Ok(outcome) = self.rx.try_recv() {
            if let Some(o) = self.accept(outcome) {
                return Some(o);
            }
        }
        None
    }

    /// Block up to `timeout` for the current load to finish.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    if let Some(o) = self.accept(outcome) {
                        return Some(o);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}
