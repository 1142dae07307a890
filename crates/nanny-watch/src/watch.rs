//! The live trigger loop.
//!
//! Triggers arrive on a channel, are coalesced over a short debounce
//! window, and start at most one pipeline run at a time. Triggers that
//! arrive while a run is in flight collapse into a single follow-up run.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use nanny_core::{DiffReport, NannyError};

use crate::pipeline::Pipeline;
use crate::status::{RunTicket, StatusIndicator};
use crate::trigger::{Trigger, TriggerFilter};

/// Tuning for [`drive`] and [`watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// How long to gather triggers before starting a run.
    pub debounce: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
        }
    }
}

type Run = JoinHandle<(RunTicket, DiffReport)>;

/// Run the trigger loop until `shutdown` resolves or the channel closes.
///
/// `render` is called with every report the indicator accepts. A run still
/// in flight when the loop ends is aborted.
pub async fn drive<R, S>(
    pipeline: Arc<Pipeline>,
    indicator: Arc<StatusIndicator>,
    mut triggers: UnboundedReceiver<Trigger>,
    options: WatchOptions,
    mut render: R,
    shutdown: S,
) where
    R: FnMut(&DiffReport),
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut deadline: Option<Instant> = None;
    let mut in_flight: Option<Run> = None;
    let mut pending = false;
    let mut open = true;

    loop {
        if !open && deadline.is_none() && in_flight.is_none() && !pending {
            break;
        }

        tokio::select! {
            _ = &mut shutdown => {
                tracing::debug!("watch loop shutting down");
                break;
            }
            trigger = triggers.recv(), if open => match trigger {
                Some(trigger) => {
                    tracing::trace!(?trigger, "trigger received");
                    deadline.get_or_insert_with(|| Instant::now() + options.debounce);
                }
                None => open = false,
            },
            _ = wait_for(deadline) => {
                deadline = None;
                if in_flight.is_some() {
                    pending = true;
                } else {
                    in_flight = Some(start_run(&pipeline, &indicator));
                }
            }
            joined = join_run(&mut in_flight) => {
                in_flight = None;
                match joined {
                    Ok((ticket, report)) => {
                        if indicator.publish(ticket, report) {
                            render(&indicator.current());
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "diff run failed"),
                }
                if pending {
                    pending = false;
                    in_flight = Some(start_run(&pipeline, &indicator));
                }
            }
        }
    }

    if let Some(run) = in_flight {
        run.abort();
    }
}

fn start_run(pipeline: &Arc<Pipeline>, indicator: &StatusIndicator) -> Run {
    let ticket = indicator.begin();
    let pipeline = Arc::clone(pipeline);
    tracing::debug!(ticket = ticket.sequence(), "starting diff run");
    tokio::spawn(async move { (ticket, pipeline.run_lenient().await) })
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn join_run(run: &mut Option<Run>) -> Result<(RunTicket, DiffReport), JoinError> {
    match run {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Start a file-system watcher that forwards triggers into `triggers`.
///
/// `root` is watched recursively. A config file outside `root` is watched
/// through its parent directory so it may be created later. The watcher
/// stops when the returned handle is dropped.
///
/// # Errors
///
/// Returns [`NannyError::Watch`] if the platform watcher cannot be created
/// or `root` cannot be watched.
pub fn spawn_fs_watcher(
    root: &Path,
    config_path: &Path,
    triggers: UnboundedSender<Trigger>,
) -> Result<RecommendedWatcher, NannyError> {
    let filter = TriggerFilter::new(root, config_path);

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if let Some(trigger) = filter.classify_event(&event) {
                // The receiver is gone once the loop has ended.
                let _ = triggers.send(trigger);
            }
        }
        Err(e) => tracing::warn!(error = %e, "file watcher error"),
    })
    .map_err(|e| NannyError::Watch(e.to_string()))?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| NannyError::Watch(format!("{}: {e}", root.display())))?;

    if !config_path.starts_with(root) {
        if let Some(parent) = config_path.parent().filter(|p| p.is_dir()) {
            if let Err(e) = watcher.watch(parent, RecursiveMode::NonRecursive) {
                tracing::warn!(path = %parent.display(), error = %e, "cannot watch config directory");
            }
        }
    }

    tracing::debug!(root = %root.display(), config = %config_path.display(), "watching");
    Ok(watcher)
}

/// Watch the pipeline's root and keep `indicator` current until `shutdown`.
///
/// Runs once immediately, then again after every relevant change.
///
/// # Errors
///
/// Fails if the root cannot be resolved or watched. Errors during
/// individual runs are logged and never end the loop.
pub async fn watch<R, S>(
    pipeline: Pipeline,
    indicator: Arc<StatusIndicator>,
    options: WatchOptions,
    render: R,
    shutdown: S,
) -> Result<(), NannyError>
where
    R: FnMut(&DiffReport),
    S: Future<Output = ()>,
{
    let root = pipeline.root().canonicalize()?;
    let config_path = resolve(&pipeline.watched_config_path());

    let (tx, rx) = mpsc::unbounded_channel();
    let _watcher = spawn_fs_watcher(&root, &config_path, tx.clone())?;
    let _ = tx.send(Trigger::Activation);

    drive(Arc::new(pipeline), indicator, rx, options, render, shutdown).await;
    Ok(())
}

/// Canonical form of a path that may not exist yet.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(path) = path.canonicalize() {
        return path;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}
