//! Reload coordination.
//!
//! Every trigger (startup, SIGHUP, deploy webhook) goes through
//! [`Reloader::reload`], which holds one exclusive lock while it pulls,
//! loads, publishes the snapshot and rebuilds the search index. Triggers that
//! arrive during a reload wait their turn in arrival order. Subscriber mail is
//! sent after the lock is released.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use quire_content::LoadError;
use quire_core::search::index_entries;
use quire_core::{ContentSnapshot, LiveCache, Store};
use tokio::process::Command;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::notify::{self, MailContext, Notifier, NotifyReport};

/// What asked for a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Process start. Failure is fatal and the ledger is seeded.
    Startup,
    /// SIGHUP from the operator.
    Signal,
    /// Verified deploy webhook. Pulls the content repository first.
    Webhook,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Startup => "startup",
            Trigger::Signal => "signal",
            Trigger::Webhook => "webhook",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("source pull failed: {0}")]
    Pull(String),

    #[error("source pull timed out after {0:?}")]
    PullTimeout(Duration),

    #[error("content load failed: {0}")]
    Load(#[from] LoadError),

    #[error("store update failed: {0}")]
    Store(#[from] quire_core::Error),

    #[error("load task failed: {0}")]
    Task(String),
}

/// Builds a complete snapshot. Runs on a blocking thread.
pub trait ContentLoader: Send + Sync + 'static {
    fn load(&self) -> Result<ContentSnapshot, LoadError>;
}

/// Loads from the content directory on disk.
pub struct DiskLoader {
    root: PathBuf,
}

impl DiskLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContentLoader for DiskLoader {
    fn load(&self) -> Result<ContentSnapshot, LoadError> {
        quire_content::load_content(&self.root)
    }
}

/// Brings the content source up to date before a webhook reload.
#[async_trait::async_trait]
pub trait SourcePuller: Send + Sync {
    async fn pull(&self) -> Result<(), ReloadError>;
}

/// `git pull --ff-only` in the content repository, bounded in time.
pub struct GitPuller {
    repo: PathBuf,
    timeout: Duration,
}

impl GitPuller {
    pub fn new(repo: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { repo: repo.into(), timeout }
    }
}

#[async_trait::async_trait]
impl SourcePuller for GitPuller {
    async fn pull(&self) -> Result<(), ReloadError> {
        let output = Command::new("git")
            .args(["pull", "--ff-only"])
            .current_dir(&self.repo)
            .kill_on_drop(true)
            .output();

        // Dropping the timed-out future kills the child.
        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| ReloadError::PullTimeout(self.timeout))?
            .map_err(|e| ReloadError::Pull(format!("cannot run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReloadError::Pull(format!("git exited with {}: {}", output.status, stderr.trim())));
        }
        tracing::info!(
            repo = %self.repo.display(),
            output = %String::from_utf8_lossy(&output.stdout).trim(),
            "content repository pulled"
        );
        Ok(())
    }
}

/// Result of one successful reload.
#[derive(Debug, Clone)]
pub struct ReloadOutcome {
    pub posts: usize,
    pub indexed: usize,
    /// Whether the new snapshot differs from the one it replaced.
    pub changed: bool,
    pub notified: NotifyReport,
}

pub struct Reloader {
    lock: Mutex<()>,
    cache: LiveCache,
    store: Store,
    loader: Arc<dyn ContentLoader>,
    puller: Arc<dyn SourcePuller>,
    notifier: Arc<dyn Notifier>,
    mail: MailContext,
}

impl Reloader {
    pub fn new(
        cache: LiveCache, store: Store, loader: Arc<dyn ContentLoader>, puller: Arc<dyn SourcePuller>,
        notifier: Arc<dyn Notifier>, mail: MailContext,
    ) -> Self {
        Self { lock: Mutex::new(()), cache, store, loader, puller, notifier, mail }
    }

    /// Run one reload to completion.
    ///
    /// # Errors
    ///
    /// Any failing step stops the reload. A failure before the snapshot is
    /// published leaves the previous snapshot and search index in place.
    pub async fn reload(&self, trigger: Trigger) -> Result<ReloadOutcome, ReloadError> {
        let started = Instant::now();
        let (snapshot, indexed, changed) = {
            let _guard = self.lock.lock().await;
            self.reload_locked(trigger).await?
        };

        let notified = match trigger {
            Trigger::Startup => NotifyReport::default(),
            Trigger::Signal | Trigger::Webhook => {
                notify::notify_new_posts(&self.store, self.notifier.as_ref(), &self.mail, &snapshot)
                    .await
                    .unwrap_or_else(|err| {
                        tracing::warn!(trigger = trigger.as_str(), error = %err, "notification pass failed");
                        NotifyReport::default()
                    })
            }
        };

        let outcome = ReloadOutcome { posts: snapshot.posts.len(), indexed, changed, notified };
        tracing::info!(
            trigger = trigger.as_str(),
            posts = outcome.posts,
            indexed = outcome.indexed,
            changed = outcome.changed,
            notified_posts = outcome.notified.posts,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reload complete"
        );
        Ok(outcome)
    }

    async fn reload_locked(&self, trigger: Trigger) -> Result<(Arc<ContentSnapshot>, usize, bool), ReloadError> {
        if trigger == Trigger::Webhook {
            self.puller.pull().await?;
        }

        let loader = self.loader.clone();
        let candidate = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| ReloadError::Task(e.to_string()))??;

        let changed = self.cache.read().fingerprint() != candidate.fingerprint();
        let entries = index_entries(&candidate);
        self.cache.replace(candidate);
        let snapshot = self.cache.read();

        let indexed = self.store.rebuild_search_index(entries).await?;

        if trigger == Trigger::Startup {
            let seeded = notify::seed_ledger(&self.store, &snapshot).await?;
            tracing::debug!(seeded, "notified-posts ledger seeded");
        }

        Ok((snapshot, indexed, changed))
    }

    /// Run a reload in the background, logging the outcome.
    pub fn spawn(self: &Arc<Self>, trigger: Trigger) -> JoinHandle<()> {
        let reloader = Arc::clone(self);
        tokio::spawn(async move { reloader.reload_logged(trigger).await })
    }

    /// Reload once per received signal, finishing each reload before taking
    /// the next signal. Returns when every sender is gone.
    pub async fn run_signal_reloads(&self, mut signals: mpsc::Receiver<()>) {
        while signals.recv().await.is_some() {
            tracing::info!("SIGHUP received, reloading");
            self.reload_logged(Trigger::Signal).await;
        }
    }

    async fn reload_logged(&self, trigger: Trigger) {
        if let Err(err) = self.reload(trigger).await {
            tracing::error!(trigger = trigger.as_str(), error = %err, "reload failed, keeping previous content");
        }
    }
}
