//! Pushing label changes to a remote persistence service.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, warn};

use crate::{Capabilities, LabelChange, LabelError, Result};

/// Remote label persistence.
#[async_trait]
pub trait LabelSync: Send + Sync {
    /// Push one change. `value: None` clears the label remotely.
    async fn push(&self, group: &str, pos: usize, value: Option<&str>) -> Result<()>;

    /// Push an applied change, logging rather than returning a failure.
    ///
    /// Local state is never rolled back; the return value only says whether
    /// the remote accepted it. Interactive callers should not await this
    /// directly but hand changes to a [`SyncQueue`].
    async fn push_change(&self, change: &LabelChange) -> bool {
        match self.push(&change.group, change.pos, change.value.as_deref()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(group = %change.group, pos = change.pos, error = %e, "Label sync failed");
                false
            }
        }
    }
}

/// Sync used when the remote service is not advertised.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSync;

#[async_trait]
impl LabelSync for NoopSync {
    async fn push(&self, _group: &str, _pos: usize, _value: Option<&str>) -> Result<()> {
        Ok(())
    }
}

/// Sync over HTTP: `POST label/<group>/<pos>/<value>` to set and
/// `DELETE label/<group>/<pos>` to clear.
pub struct HttpLabelSync {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpLabelSync {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = reqwest::Url::parse(base_url)
            .map_err(|e| LabelError::sync(format!("invalid base URL {}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LabelError::sync(format!("failed to build client: {}", e)))?;
        Ok(Self { client, base })
    }

    /// Endpoint for one assignment, with each segment percent-encoded.
    pub fn endpoint(&self, group: &str, pos: usize, value: Option<&str>) -> Result<reqwest::Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| LabelError::sync("base URL cannot have a path"))?;
            segments.pop_if_empty();
            segments.push("label").push(group).push(&pos.to_string());
            if let Some(value) = value {
                segments.push(value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl LabelSync for HttpLabelSync {
    #[instrument(skip(self))]
    async fn push(&self, group: &str, pos: usize, value: Option<&str>) -> Result<()> {
        let url = self.endpoint(group, pos, value)?;
        let request = match value {
            Some(_) => self.client.post(url.clone()),
            None => self.client.delete(url.clone()),
        };
        request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LabelError::sync(format!("{}: {}", url, e)))?;
        debug!(url = %url, "Label pushed");
        Ok(())
    }
}

/// The sync to use given the probed capabilities.
pub fn connect_sync(
    caps: &Capabilities,
    base_url: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn LabelSync>> {
    match (caps.labels, base_url) {
        (true, Some(base)) => Ok(Arc::new(HttpLabelSync::new(base, timeout)?)),
        _ => Ok(Arc::new(NoopSync)),
    }
}

enum SyncJob {
    Push(LabelChange),
    Flush(oneshot::Sender<()>),
}

/// Background pusher for label changes.
///
/// A worker task pushes submitted changes one at a time in submission order,
/// so a set followed by a clear reaches the remote in that order, and
/// [`submit`](Self::submit) never waits on the remote. The worker exits once
/// the queue is dropped and its backlog is drained.
pub struct SyncQueue {
    tx: mpsc::UnboundedSender<SyncJob>,
}

impl SyncQueue {
    /// Start the worker. Must be called from within a tokio runtime.
    pub fn spawn(sync: Arc<dyn LabelSync>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match job {
                    SyncJob::Push(change) => {
                        sync.push_change(&change).await;
                    }
                    SyncJob::Flush(done) => {
                        done.send(()).ok();
                    }
                }
            }
            debug!("Label sync queue closed");
        });
        Self { tx }
    }

    /// Queue a change. Returns false if the worker has gone away.
    pub fn submit(&self, change: LabelChange) -> bool {
        self.tx.send(SyncJob::Push(change)).is_ok()
    }

    /// Wait until every change submitted so far has been pushed.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(SyncJob::Flush(done)).is_ok() {
            wait.await.ok();
        }
    }
}
