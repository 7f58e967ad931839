use crate::events::{AssetReady, PreloadRequest};
use crate::navigation::ViewerState;
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::select;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Fetches one asset so later display of it is instant.
pub trait AssetFetcher: Send + Sync + 'static {
    fn fetch(&self, src: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Viewer-side handle: issues neighbor preloads without waiting on them.
#[derive(Debug, Clone, Default)]
pub struct Preloader {
    tx: Option<Sender<PreloadRequest>>,
}

impl Preloader {
    pub fn new(tx: Sender<PreloadRequest>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Queues the next and previous neighbors of the active item.
    ///
    /// Returns how many requests were queued. A full queue drops the request.
    pub fn preload_neighbors(&self, state: &ViewerState) -> usize {
        let Some(tx) = &self.tx else {
            return 0;
        };
        let Some((next, prev)) = state.neighbors() else {
            return 0;
        };
        let mut queued = 0;
        for item in [next, prev].into_iter().filter_map(|pos| state.filtered_item(pos)) {
            match tx.try_send(PreloadRequest(item.src().to_string())) {
                Ok(()) => queued += 1,
                Err(TrySendError::Full(PreloadRequest(src))) => {
                    debug!(%src, "preload queue full; dropping request");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("preloader stopped; skipping neighbor preloads");
                    break;
                }
            }
        }
        queued
    }
}

/// Remembered successes before the dedup set starts over.
const FETCHED_CAPACITY: usize = 512;

/// Preload task:
/// - Dedups requests already in flight or already fetched.
/// - Keeps at most `max_in_flight` fetches running.
/// - Reports successes as `AssetReady`; failures are only logged.
///
/// Finishes when cancelled, or once every request sender is gone and the
/// fetches in flight have completed.
pub async fn run<F: AssetFetcher>(
    mut requests: Receiver<PreloadRequest>,
    fetcher: Arc<F>,
    ready_tx: Sender<AssetReady>,
    cancel: CancellationToken,
    max_in_flight: usize,
) -> Result<()> {
    let max_in_flight = max_in_flight.max(1);
    let mut in_flight: HashMap<Id, String> = HashMap::new();
    let mut fetched: HashSet<String> = HashSet::new();
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();
    let mut requests_open = true;

    loop {
        if !requests_open && tasks.is_empty() {
            break;
        }
        select! {
            _ = cancel.cancelled() => break,

            maybe = requests.recv(), if requests_open && in_flight.len() < max_in_flight => {
                let Some(PreloadRequest(src)) = maybe else {
                    debug!("preload requests closed");
                    requests_open = false;
                    continue;
                };
                if fetched.contains(&src) {
                    debug!(%src, "already preloaded");
                } else if in_flight.values().any(|pending| *pending == src) {
                    debug!(%src, "preload already in flight");
                } else {
                    let fetcher = Arc::clone(&fetcher);
                    let target = src.clone();
                    let handle = tasks.spawn(async move { fetcher.fetch(&target).await });
                    in_flight.insert(handle.id(), src);
                }
            }

            Some(joined) = tasks.join_next_with_id() => match joined {
                Ok((id, Ok(()))) => {
                    let Some(src) = in_flight.remove(&id) else { continue };
                    debug!(%src, "preloaded");
                    if fetched.len() >= FETCHED_CAPACITY {
                        fetched.clear();
                    }
                    fetched.insert(src.clone());
                    if ready_tx.send(AssetReady(src)).await.is_err() {
                        debug!("asset-ready receiver closed");
                    }
                }
                Ok((id, Err(err))) => {
                    let src = in_flight.remove(&id).unwrap_or_default();
                    debug!(%src, error = %err, "preload failed");
                }
                Err(err) => {
                    let src = in_flight.remove(&err.id()).unwrap_or_default();
                    warn!(%src, error = %err, "preload task aborted");
                }
            },
        }
    }
    tasks.abort_all();
    Ok(())
}

/// Where an asset `src` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    Remote(String),
    /// `data:` URL; nothing to fetch.
    Inline,
    Local(PathBuf),
}

impl AssetLocation {
    pub fn classify(src: &str, asset_root: &Path) -> Self {
        if src.starts_with("http://") || src.starts_with("https://") {
            AssetLocation::Remote(src.to_string())
        } else if src.starts_with("data:") {
            AssetLocation::Inline
        } else {
            AssetLocation::Local(asset_root.join(src.trim_start_matches('/')))
        }
    }
}

/// Fetches remote assets over HTTP and decodes local files from `asset_root`.
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
    client: reqwest::Client,
    asset_root: PathBuf,
}

impl DefaultFetcher {
    pub fn new(client: reqwest::Client, asset_root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            asset_root: asset_root.into(),
        }
    }
}

impl AssetFetcher for DefaultFetcher {
    async fn fetch(&self, src: &str) -> Result<()> {
        match AssetLocation::classify(src, &self.asset_root) {
            AssetLocation::Remote(url) => {
                self.client
                    .get(&url)
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?;
            }
            AssetLocation::Inline => {}
            AssetLocation::Local(path) => {
                tokio::task::spawn_blocking(move || decode(&path))
                    .await
                    .context("decode task panicked")??;
            }
        }
        Ok(())
    }
}

fn decode(path: &Path) -> Result<()> {
    image::ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(())
}
