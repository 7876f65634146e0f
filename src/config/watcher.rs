//! Configuration file watcher for hot reload.
//!
//! # State machine
//! ```text
//! Idle → Watching → ChangeDetected → Reparsing → Applying → Watching
//!                        │ (debounce)     │ (parse error)
//!                        │                └──────────────→ Watching
//!                        └─ stop ─→ Stopped ←─ stop ─ Watching
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::loader::{load_snapshot, ConfigError};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::options::parse::parse_from;
use crate::options::{LogTo, OptionsRecord};
use crate::settings::GlobalSettings;

/// Default quiet period before a burst of writes is reparsed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Poll interval used when falling back from event-based watching.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Change notifications beyond this many pending are dropped; they would be
/// coalesced into the same reparse anyway.
const CHANGE_BUFFER: usize = 16;

const EVENT_BUFFER: usize = 32;

/// How the watcher learns about file changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// OS file events.
    Event,
    /// Periodic metadata polling.
    Poll(Duration),
}

/// Watcher settings.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub debounce: Duration,
    pub mode: WatchMode,
    /// Fall back to polling if OS file events are unavailable.
    pub fallback_to_poll: bool,
    /// Narrow the file to this section before parsing.
    pub section: Option<String>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            mode: WatchMode::Event,
            fallback_to_poll: false,
            section: None,
        }
    }
}

impl WatchOptions {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.mode = WatchMode::Poll(interval);
        self
    }

    pub fn with_fallback_to_poll(mut self, fallback: bool) -> Self {
        self.fallback_to_poll = fallback;
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

/// Watcher lifecycle state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle = 0,
    Watching = 1,
    ChangeDetected = 2,
    Reparsing = 3,
    Applying = 4,
    Stopped = 5,
}

impl From<u8> for WatcherState {
    fn from(val: u8) -> Self {
        match val {
            1 => WatcherState::Watching,
            2 => WatcherState::ChangeDetected,
            3 => WatcherState::Reparsing,
            4 => WatcherState::Applying,
            5 => WatcherState::Stopped,
            _ => WatcherState::Idle,
        }
    }
}

/// Outcome of one reparse cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WatchEvent {
    /// New global settings were published.
    Applied { generation: u64, log_to: LogTo },
    /// The file parsed but the global settings did not change.
    Unchanged,
    /// The file could not be read or parsed; previous settings remain.
    Rejected { error: String },
}

/// The change-notification mechanism could not be set up.
#[derive(Debug, Error)]
pub enum WatchSubscriptionError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Config path is not a file: {0}")]
    NotAFile(PathBuf),

    #[error("Config watcher must be started inside a Tokio runtime")]
    NoRuntime,

    #[error("Watch error: {0}")]
    Notify(#[from] notify::Error),
}

/// Watches a configuration file and keeps [`GlobalSettings`] in sync with it.
///
/// Only the global subset (the logging policy) is applied live; region and
/// credentials in the file take effect for clients constructed after a
/// restart.
pub struct ConfigWatcher {
    path: PathBuf,
    dir: PathBuf,
    state: Arc<AtomicU8>,
    events: broadcast::Sender<WatchEvent>,
    shutdown: Shutdown,
    watcher: Option<Box<dyn Watcher + Send>>,
    task: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    /// Start watching `path`.
    ///
    /// `initial` is the record parsed from the file at startup; its logging
    /// policy is published to `settings` before watching begins. Must be
    /// called from within a Tokio runtime.
    pub fn start(
        path: &Path,
        initial: &OptionsRecord,
        settings: GlobalSettings,
        options: WatchOptions,
    ) -> Result<Self, WatchSubscriptionError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| WatchSubscriptionError::NoRuntime)?;

        if !path.exists() {
            return Err(WatchSubscriptionError::NotFound(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(WatchSubscriptionError::NotAFile(path.to_path_buf()));
        }
        let path = path
            .canonicalize()
            .map_err(|_| WatchSubscriptionError::NotFound(path.to_path_buf()))?;
        let (dir, file_name) = match (path.parent(), path.file_name()) {
            (Some(dir), Some(name)) => (dir.to_path_buf(), name.to_os_string()),
            _ => return Err(WatchSubscriptionError::NotAFile(path.clone())),
        };

        let state = Arc::new(AtomicU8::new(WatcherState::Idle as u8));
        if let Some(generation) = settings.seed_from(initial) {
            metrics::record_settings_generation(generation);
        }

        let (change_tx, change_rx) = mpsc::channel::<()>(CHANGE_BUFFER);
        let handler = {
            let path = path.clone();
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_relevant(&event, &file_name) {
                        tracing::debug!(path = ?path, kind = ?event.kind, "Config file change detected");
                        let _ = change_tx.try_send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            }
        };
        // Watch the directory so editors that save by renaming over the
        // file are still seen.
        let watcher = subscribe(&dir, handler, &options)?;

        let shutdown = Shutdown::new();
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let reload = ReloadLoop {
            path: path.clone(),
            section: options.section.clone(),
            debounce: options.debounce,
            settings,
            state: state.clone(),
            events: events.clone(),
        };

        state.store(WatcherState::Watching as u8, Ordering::Release);
        let stop_rx = shutdown.subscribe();
        let task = runtime.spawn(reload.run(change_rx, shutdown.clone(), stop_rx));

        tracing::info!(
            path = ?path,
            debounce_ms = options.debounce.as_millis() as u64,
            mode = ?options.mode,
            "Config watcher started"
        );

        Ok(Self {
            path,
            dir,
            state,
            events,
            shutdown,
            watcher: Some(watcher),
            task: Some(task),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> WatcherState {
        WatcherState::from(self.state.load(Ordering::Acquire))
    }

    /// Receive the outcome of every reparse cycle from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.events.subscribe()
    }

    /// Stop watching and wait for the reload loop to exit.
    ///
    /// A reparse already applying completes first; no further cycle starts.
    pub async fn stop(mut self) {
        self.unsubscribe();
        self.shutdown.trigger();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Config watcher task failed");
            }
        }
    }

    fn unsubscribe(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.dir) {
                tracing::debug!(error = %e, "Unwatch failed");
            }
        }
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.unsubscribe();
        self.shutdown.trigger();
    }
}

fn is_relevant(event: &Event, file_name: &OsStr) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name))
}

fn subscribe<H>(dir: &Path, handler: H, options: &WatchOptions) -> Result<Box<dyn Watcher + Send>, WatchSubscriptionError>
where
    H: notify::EventHandler + Clone,
{
    let interval = match options.mode {
        WatchMode::Poll(interval) => return Ok(poll(dir, handler, interval)?),
        WatchMode::Event => DEFAULT_POLL_INTERVAL,
    };

    let events = RecommendedWatcher::new(handler.clone(), notify::Config::default()).and_then(|mut watcher| {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(watcher)
    });

    match events {
        Ok(watcher) => Ok(Box::new(watcher)),
        Err(e) if options.fallback_to_poll => {
            tracing::warn!(error = %e, "File events unavailable, falling back to polling");
            Ok(poll(dir, handler, interval)?)
        }
        Err(e) => Err(e.into()),
    }
}

fn poll<H: notify::EventHandler>(dir: &Path, handler: H, interval: Duration) -> notify::Result<Box<dyn Watcher + Send>> {
    let mut watcher = PollWatcher::new(handler, notify::Config::default().with_poll_interval(interval))?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(Box::new(watcher))
}

/// The background half of the watcher.
struct ReloadLoop {
    path: PathBuf,
    section: Option<String>,
    debounce: Duration,
    settings: GlobalSettings,
    state: Arc<AtomicU8>,
    events: broadcast::Sender<WatchEvent>,
}

impl ReloadLoop {
    async fn run(
        self,
        mut changes: mpsc::Receiver<()>,
        shutdown: Shutdown,
        mut stop: broadcast::Receiver<()>,
    ) {
        loop {
            self.set_state(WatcherState::Watching);
            tokio::select! {
                change = changes.recv() => {
                    if change.is_none() {
                        break;
                    }
                }
                _ = shutdown.wait(&mut stop) => break,
            }

            self.set_state(WatcherState::ChangeDetected);
            if !self.settle(&mut changes, &shutdown, &mut stop).await {
                break;
            }
            self.reload().await;
        }

        self.set_state(WatcherState::Stopped);
        tracing::info!(path = ?self.path, "Config watcher stopped");
    }

    /// Wait until no change arrived for a full debounce window. Returns
    /// `false` if shutdown was requested meanwhile.
    async fn settle(
        &self,
        changes: &mut mpsc::Receiver<()>,
        shutdown: &Shutdown,
        stop: &mut broadcast::Receiver<()>,
    ) -> bool {
        let quiet = tokio::time::sleep(self.debounce);
        tokio::pin!(quiet);
        loop {
            tokio::select! {
                _ = &mut quiet => return true,
                Some(()) = changes.recv() => {
                    quiet.as_mut().reset(Instant::now() + self.debounce);
                }
                _ = shutdown.wait(stop) => return false,
            }
        }
    }

    async fn reload(&self) {
        self.set_state(WatcherState::Reparsing);
        tracing::info!(path = ?self.path, "Reloading config");

        let path = self.path.clone();
        let section = self.section.clone();
        let parsed = tokio::task::spawn_blocking(move || -> Result<OptionsRecord, ConfigError> {
            let snapshot = load_snapshot(&path, section.as_deref())?;
            Ok(parse_from(&snapshot)?)
        })
        .await;

        let record = match parsed {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => return self.reject(e.to_string()),
            Err(e) => return self.reject(format!("reparse task failed: {}", e)),
        };

        self.set_state(WatcherState::Applying);
        let logging = record.parsed_logging().clone();
        let log_to = logging.log_to;
        match self.settings.replace(logging) {
            Some(generation) => {
                tracing::info!(generation, log_to = %log_to, "Global settings updated");
                metrics::record_reload("applied");
                metrics::record_settings_generation(generation);
                self.publish(WatchEvent::Applied { generation, log_to });
            }
            None => {
                tracing::debug!("Config reparsed, global settings unchanged");
                metrics::record_reload("unchanged");
                self.publish(WatchEvent::Unchanged);
            }
        }
    }

    fn reject(&self, error: String) {
        tracing::error!(path = ?self.path, "Failed to reload config: {}. Keeping current configuration.", error);
        metrics::record_reload("rejected");
        self.publish(WatchEvent::Rejected { error });
    }

    fn publish(&self, event: WatchEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn set_state(&self, state: WatcherState) {
        self.state.store(state as u8, Ordering::Release);
    }
}
