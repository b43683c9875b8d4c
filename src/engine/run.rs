//! Coordinator of a single refresh run
//!
//! The coordinator task is the only writer of the run's tree and of the
//! module lookup table. Build tool calls and repository lookups run as
//! separate tasks and report back through a [`JoinSet`]; the coordinator
//! applies their outcomes one at a time.
//!
//! An outstanding work counter tracks every job in flight. It starts at one
//! for the project tree walk, is incremented before a job is spawned and
//! decremented only after the job's outcome (success, error or panic) has
//! been applied. The run is idle once the counter drops to zero.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::engine::events::{EngineEvent, RunId};
use crate::engine::tree::{NodeId, NodeKind, ProjectTree};
use crate::tooling::error::{DiscoveryError, ListingError};
use crate::tooling::provider::{ModuleDependencyLister, ProjectTreeWalker};
use crate::tooling::types::{Dependency, ModuleId, ProjectNode};
use crate::version::error::LookupError;
use crate::version::resolver::MetadataResolver;

pub const LOADING: &str = "loading...";
pub const LISTING: &str = "listing dependencies...";
pub const CHECKING: &str = "checking for updates...";

/// Progress of a run as seen by the engine
#[derive(Debug, Clone)]
pub struct RunProgress {
    pub outstanding: usize,
    /// Final tree, set once the run is idle
    pub tree: Option<Arc<ProjectTree>>,
}

impl RunProgress {
    pub fn is_idle(&self) -> bool {
        self.outstanding == 0
    }
}

/// Collaborators shared by the jobs of a run
pub(crate) struct RunContext {
    pub root_dir: PathBuf,
    pub walker: ProjectTreeWalker,
    pub lister: ModuleDependencyLister,
    pub resolver: Arc<MetadataResolver>,
}

#[derive(Debug, Clone)]
enum Job {
    WalkTree,
    ListDependencies { node: NodeId, project: ProjectNode },
    LookupModule { module: ModuleId },
}

enum JobOutcome {
    TreeWalked(Result<ProjectNode, DiscoveryError>),
    DependenciesListed {
        node: NodeId,
        result: Result<Vec<Dependency>, ListingError>,
    },
    ModuleResolved {
        module: ModuleId,
        result: Result<String, LookupError>,
    },
}

/// Ok(candidate) or the error message shown on every waiting record
type LookupResult = Result<String, String>;

enum LookupState {
    Pending,
    Resolved(LookupResult),
}

/// Single lookup per distinct module, fanned out to every waiting record
struct ModuleLookup {
    state: LookupState,
    waiters: Vec<NodeId>,
}

pub(crate) struct Run {
    id: RunId,
    ctx: RunContext,
    tree: ProjectTree,
    lookups: IndexMap<ModuleId, ModuleLookup>,
    outstanding: usize,
    jobs: JoinSet<JobOutcome>,
    running: HashMap<task::Id, Job>,
    progress: watch::Sender<RunProgress>,
    events: Option<mpsc::UnboundedSender<EngineEvent>>,
}

impl Run {
    pub(crate) fn new(
        id: RunId,
        ctx: RunContext,
        progress: watch::Sender<RunProgress>,
        events: Option<mpsc::UnboundedSender<EngineEvent>>,
    ) -> Self {
        Self {
            id,
            ctx,
            tree: ProjectTree::placeholder(LOADING),
            lookups: IndexMap::new(),
            outstanding: 1,
            jobs: JoinSet::new(),
            running: HashMap::new(),
            progress,
            events,
        }
    }

    /// Drives the run until no work is outstanding
    pub(crate) async fn execute(mut self) {
        info!("Starting {} in {:?}", self.id, self.ctx.root_dir);
        self.emit(EngineEvent::RunStarted { run: self.id });
        self.spawn(Job::WalkTree);

        while self.outstanding > 0 {
            let Some(joined) = self.jobs.join_next_with_id().await else {
                error!(
                    "{} has {} outstanding jobs but none running",
                    self.id, self.outstanding
                );
                break;
            };

            match joined {
                Ok((task_id, outcome)) => {
                    self.running.remove(&task_id);
                    self.apply(outcome);
                }
                Err(e) => {
                    let job = self.running.remove(&e.id());
                    self.fail(job, e);
                }
            }
        }

        self.finish();
    }

    fn finish(&mut self) {
        let tree = Arc::new(self.tree.clone());
        let updates = self
            .tree
            .dependencies()
            .filter(|(_, dependency)| dependency.has_update())
            .count();
        info!(
            "Finished {}: {} nodes, {} modules looked up, {} updates available",
            self.id,
            self.tree.len(),
            self.lookups.len(),
            updates
        );
        if !self.lookups.is_empty() {
            let modules: Vec<String> = self.looked_up_modules().map(|m| m.to_string()).collect();
            debug!("{} looked up {}", self.id, modules.join(", "));
        }

        self.outstanding = 0;
        self.progress.send_replace(RunProgress {
            outstanding: 0,
            tree: Some(Arc::clone(&tree)),
        });
        self.emit(EngineEvent::RunFinished { run: self.id, tree });
    }

    /// Modules looked up by this run, in first-request order
    fn looked_up_modules(&self) -> impl Iterator<Item = &ModuleId> {
        self.lookups.keys()
    }

    /// Increments the counter and spawns `job`
    fn dispatch(&mut self, job: Job) {
        self.outstanding += 1;
        self.publish_progress();
        self.spawn(job);
    }

    fn spawn(&mut self, job: Job) {
        let handle = match &job {
            Job::WalkTree => {
                let walker = self.ctx.walker.clone();
                let root_dir = self.ctx.root_dir.clone();
                self.jobs
                    .spawn(async move { JobOutcome::TreeWalked(walker.walk(&root_dir).await) })
            }
            Job::ListDependencies { node, project } => {
                let lister = self.ctx.lister.clone();
                let root_dir = self.ctx.root_dir.clone();
                let project = project.clone();
                let node = *node;
                self.jobs.spawn(async move {
                    let result = lister.list(&root_dir, &project).await;
                    JobOutcome::DependenciesListed { node, result }
                })
            }
            Job::LookupModule { module } => {
                let resolver = Arc::clone(&self.ctx.resolver);
                let module = module.clone();
                self.jobs.spawn(async move {
                    let result = resolver.find_latest(&module).await;
                    JobOutcome::ModuleResolved { module, result }
                })
            }
        };
        self.running.insert(handle.id(), job);
    }

    /// Decrements the counter once a job's outcome has been applied
    ///
    /// Reaching zero is published by [`Run::finish`] together with the tree.
    fn complete_job(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.outstanding > 0 {
            self.publish_progress();
        }
    }

    fn publish_progress(&self) {
        self.progress.send_replace(RunProgress {
            outstanding: self.outstanding,
            tree: None,
        });
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(events) = &self.events
            && events.send(event).is_err()
        {
            debug!("Event receiver of {} is gone", self.id);
        }
    }

    fn emit_updated(&self, id: NodeId) {
        if let Some(node) = self.tree.get(id) {
            self.emit(EngineEvent::NodeUpdated {
                run: self.id,
                id,
                node: node.clone(),
            });
        }
    }

    fn apply(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::TreeWalked(result) => self.on_tree_walked(result),
            JobOutcome::DependenciesListed { node, result } => {
                self.on_dependencies_listed(node, result)
            }
            JobOutcome::ModuleResolved { module, result } => {
                self.on_module_resolved(module, result.map_err(|e| e.to_string()))
            }
        }
        self.complete_job();
    }

    /// Applies the failure of a job that panicked or was aborted
    fn fail(&mut self, job: Option<Job>, e: JoinError) {
        let message = format!("Internal error: {}", e);
        error!("Job of {} failed: {}", self.id, e);

        match job {
            Some(Job::WalkTree) => self.set_project_error(NodeId::ROOT, message),
            Some(Job::ListDependencies { node, .. }) => self.set_project_error(node, message),
            Some(Job::LookupModule { module }) => self.on_module_resolved(module, Err(message)),
            None => warn!("Unknown job {} finished in {}", e.id(), self.id),
        }
        self.complete_job();
    }

    fn set_project_error(&mut self, id: NodeId, message: String) {
        if let Some(entry) = self.tree.project_mut(id) {
            entry.status = None;
            entry.error = Some(message);
        }
        self.emit_updated(id);
    }

    fn on_tree_walked(&mut self, result: Result<ProjectNode, DiscoveryError>) {
        let root = match result {
            Ok(root) => root,
            Err(e) => {
                warn!("Project discovery failed in {}: {}", self.id, e);
                self.set_project_error(NodeId::ROOT, e.to_string());
                return;
            }
        };

        let (tree, projects) = ProjectTree::from_projects(&root);
        let listings: Vec<(NodeId, ProjectNode)> = projects
            .into_iter()
            .filter(|(_, project)| project.build_file.is_some())
            .map(|(id, project)| (id, project.detached()))
            .collect();
        self.tree = tree;

        for (id, _) in &listings {
            if let Some(entry) = self.tree.project_mut(*id) {
                entry.status = Some(LISTING.to_string());
            }
        }
        debug!(
            "{} discovered {} projects, {} with a build file",
            self.id,
            self.tree.len(),
            listings.len()
        );
        self.emit(EngineEvent::TreeDiscovered {
            run: self.id,
            tree: Arc::new(self.tree.clone()),
        });

        for (node, project) in listings {
            self.dispatch(Job::ListDependencies { node, project });
        }
    }

    fn on_dependencies_listed(
        &mut self,
        node: NodeId,
        result: Result<Vec<Dependency>, ListingError>,
    ) {
        let dependencies = match result {
            Ok(dependencies) => dependencies,
            Err(e) => {
                warn!("Listing dependencies failed in {}: {}", self.id, e);
                self.set_project_error(node, e.to_string());
                return;
            }
        };

        if let Some(entry) = self.tree.project_mut(node) {
            entry.status = None;
        }
        self.emit_updated(node);

        for dependency in dependencies {
            let checkable = dependency.is_checkable();
            let kind = if dependency.is_project_reference() {
                NodeKind::ProjectReference {
                    path: dependency.name,
                }
            } else {
                NodeKind::Dependency(dependency)
            };

            let id = self.tree.push(node, kind);
            if let Some(added) = self.tree.get(id) {
                self.emit(EngineEvent::NodeAdded {
                    run: self.id,
                    id,
                    parent: node,
                    node: added.clone(),
                });
            }

            if checkable {
                self.request_update_check(id);
            }
        }
    }

    /// Registers the record at `id` for the lookup of its module
    ///
    /// The first request for a module spawns the lookup; later requests wait
    /// for it, or take the stored result when it already completed.
    fn request_update_check(&mut self, id: NodeId) {
        let Some(module) = self.tree.get(id).and_then(|node| node.dependency()?.module_id())
        else {
            return;
        };

        let resolved = match self.lookups.get_mut(&module) {
            Some(lookup) => {
                lookup.waiters.push(id);
                match &lookup.state {
                    LookupState::Resolved(result) => Some(result.clone()),
                    LookupState::Pending => None,
                }
            }
            None => {
                self.lookups.insert(
                    module.clone(),
                    ModuleLookup {
                        state: LookupState::Pending,
                        waiters: vec![id],
                    },
                );
                self.dispatch(Job::LookupModule { module });
                None
            }
        };

        match resolved {
            Some(result) => self.apply_lookup(id, &result),
            None => {
                if let Some(dependency) = self.tree.dependency_mut(id) {
                    dependency.status = Some(CHECKING.to_string());
                }
                self.emit_updated(id);
            }
        }
    }

    fn on_module_resolved(&mut self, module: ModuleId, result: LookupResult) {
        let Some(lookup) = self.lookups.get_mut(&module) else {
            warn!("{} resolved unrequested module {}", self.id, module);
            return;
        };

        match &result {
            Ok(version) => debug!("{} resolved {} to {}", self.id, module, version),
            Err(e) => debug!("{} failed to resolve {}: {}", self.id, module, e),
        }

        lookup.state = LookupState::Resolved(result.clone());
        let waiters = lookup.waiters.clone();
        for id in waiters {
            self.apply_lookup(id, &result);
        }
    }

    /// Writes a lookup result to one record, comparing against its own
    /// declared version
    fn apply_lookup(&mut self, id: NodeId, result: &LookupResult) {
        if let Some(dependency) = self.tree.dependency_mut(id) {
            dependency.record_lookup(result.as_deref().map_err(String::as_str));
        }
        self.emit_updated(id);
    }
}
