//! Change notifications published while a run progresses

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::engine::tree::{NodeId, ProjectTree, TreeNode};

/// Identity of one refresh run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RunId(pub(crate) u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// Tree change published by a run
///
/// Every event carries the id of the run that produced it, so consumers can
/// drop events of a run that has since been cancelled.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    RunStarted {
        run: RunId,
    },
    /// The project skeleton replaced the loading placeholder
    TreeDiscovered {
        run: RunId,
        tree: Arc<ProjectTree>,
    },
    NodeAdded {
        run: RunId,
        id: NodeId,
        parent: NodeId,
        node: TreeNode,
    },
    NodeUpdated {
        run: RunId,
        id: NodeId,
        node: TreeNode,
    },
    RunFinished {
        run: RunId,
        tree: Arc<ProjectTree>,
    },
}

impl EngineEvent {
    pub fn run(&self) -> RunId {
        match self {
            EngineEvent::RunStarted { run }
            | EngineEvent::TreeDiscovered { run, .. }
            | EngineEvent::NodeAdded { run, .. }
            | EngineEvent::NodeUpdated { run, .. }
            | EngineEvent::RunFinished { run, .. } => *run,
        }
    }
}
