//! Engine entry point: starts, cancels and observes refresh runs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Settings;
use crate::engine::events::{EngineEvent, RunId};
use crate::engine::run::{Run, RunContext, RunProgress};
use crate::engine::tree::ProjectTree;
use crate::tooling::provider::{
    DependencyReportProvider, ModuleDependencyLister, ProjectInfoProvider, ProjectTreeWalker,
};
use crate::version::resolver::MetadataResolver;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Result of a refresh request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Started(RunId),
    /// A run is still in progress; the request was ignored
    AlreadyRunning(RunId),
}

struct RunHandle {
    id: RunId,
    progress: watch::Receiver<RunProgress>,
    task: Option<JoinHandle<()>>,
}

impl RunHandle {
    fn is_idle(&mut self) -> bool {
        let finished = self.task.as_ref().is_none_or(|task| task.is_finished());
        let idle = self.progress.borrow().is_idle() || finished;
        if idle && finished {
            self.task = None;
        }
        idle
    }
}

/// Discovers the projects of a build, lists their dependencies and looks up
/// newer versions, one run at a time
///
/// Runs are spawned on the ambient tokio runtime; [`ResolutionEngine::refresh`]
/// must be called from within it.
pub struct ResolutionEngine {
    root_dir: PathBuf,
    walker: ProjectTreeWalker,
    lister: ModuleDependencyLister,
    events: Option<mpsc::UnboundedSender<EngineEvent>>,
    next_run: AtomicU64,
    current: Mutex<Option<RunHandle>>,
}

impl ResolutionEngine {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        projects: Arc<dyn ProjectInfoProvider>,
        reports: Arc<dyn DependencyReportProvider>,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            walker: ProjectTreeWalker::new(projects),
            lister: ModuleDependencyLister::new(reports),
            events: None,
            next_run: AtomicU64::new(1),
            current: Mutex::new(None),
        }
    }

    /// Publishes tree changes of every run to `events`
    pub fn with_events(mut self, events: mpsc::UnboundedSender<EngineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Starts a run with a snapshot of `settings`, unless one is in progress
    pub fn refresh(&self, settings: &Settings) -> Result<RefreshOutcome, EngineError> {
        let mut current = self.lock_current();
        if let Some(id) = running_id(&mut current) {
            debug!("Ignoring refresh, {} is still running", id);
            return Ok(RefreshOutcome::AlreadyRunning(id));
        }
        let resolver = MetadataResolver::from_settings(settings)?;
        Ok(RefreshOutcome::Started(self.start(&mut current, resolver)))
    }

    /// Like [`ResolutionEngine::refresh`] with an already built resolver
    pub fn refresh_with(&self, resolver: MetadataResolver) -> RefreshOutcome {
        let mut current = self.lock_current();
        if let Some(id) = running_id(&mut current) {
            debug!("Ignoring refresh, {} is still running", id);
            return RefreshOutcome::AlreadyRunning(id);
        }
        RefreshOutcome::Started(self.start(&mut current, resolver))
    }

    /// Cancels any run in progress and starts a new one
    pub fn restart(&self, settings: &Settings) -> Result<RunId, EngineError> {
        let resolver = MetadataResolver::from_settings(settings)?;
        Ok(self.restart_with(resolver))
    }

    pub fn restart_with(&self, resolver: MetadataResolver) -> RunId {
        let mut current = self.lock_current();
        cancel_run(&mut current);
        self.start(&mut current, resolver)
    }

    /// Cancels the run in progress, if any
    ///
    /// In-flight jobs of the run are aborted and their results discarded.
    pub fn cancel(&self) -> Option<RunId> {
        cancel_run(&mut self.lock_current())
    }

    /// Returns true when no run has outstanding work
    pub fn is_idle(&self) -> bool {
        self.lock_current()
            .as_mut()
            .is_none_or(|handle| handle.is_idle())
    }

    /// Outstanding job count of the current run
    pub fn outstanding(&self) -> usize {
        self.lock_current()
            .as_ref()
            .map_or(0, |handle| handle.progress.borrow().outstanding)
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.lock_current().as_ref().map(|handle| handle.id)
    }

    /// Waits until the current run is idle and returns its final tree
    ///
    /// Returns None when there is no run, or when the run was cancelled
    /// before it finished.
    pub async fn wait_idle(&self) -> Option<Arc<ProjectTree>> {
        let mut progress = {
            let current = self.lock_current();
            current.as_ref()?.progress.clone()
        };
        let tree = progress
            .wait_for(|progress| progress.is_idle())
            .await
            .ok()?
            .tree
            .clone();
        tree
    }

    fn start(&self, current: &mut Option<RunHandle>, resolver: MetadataResolver) -> RunId {
        let id = RunId(self.next_run.fetch_add(1, Ordering::Relaxed));
        let (progress_tx, progress_rx) = watch::channel(RunProgress {
            outstanding: 1,
            tree: None,
        });
        let ctx = RunContext {
            root_dir: self.root_dir.clone(),
            walker: self.walker.clone(),
            lister: self.lister.clone(),
            resolver: Arc::new(resolver),
        };

        let run = Run::new(id, ctx, progress_tx, self.events.clone());
        let task = tokio::spawn(run.execute());
        *current = Some(RunHandle {
            id,
            progress: progress_rx,
            task: Some(task),
        });
        id
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<RunHandle>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ResolutionEngine {
    fn drop(&mut self) {
        cancel_run(&mut self.lock_current());
    }
}

fn running_id(current: &mut Option<RunHandle>) -> Option<RunId> {
    let handle = current.as_mut()?;
    if handle.is_idle() {
        None
    } else {
        Some(handle.id)
    }
}

fn cancel_run(current: &mut Option<RunHandle>) -> Option<RunId> {
    let handle = current.take()?;
    match handle.task {
        Some(task) if !task.is_finished() => {
            task.abort();
            info!("Cancelled {}", handle.id);
        }
        _ => debug!("{} already finished", handle.id),
    }
    Some(handle.id)
}
