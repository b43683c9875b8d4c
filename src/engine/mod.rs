//! Refresh engine
//!
//! A run discovers the project tree of a build, lists the first-level
//! dependencies of every project with a build file and looks up the latest
//! version of every distinct module once, fanning the result out to each
//! record that declares it.
//!
//! # Modules
//!
//! - [`resolution`]: Engine entry point (refresh, cancel, idle tracking)
//! - [`run`]: Coordinator task owning the tree of one run
//! - [`tree`]: Arena of result nodes
//! - [`events`]: Change notifications tagged with their run

pub mod events;
pub mod resolution;
pub mod run;
pub mod tree;

pub use events::{EngineEvent, RunId};
pub use resolution::{EngineError, RefreshOutcome, ResolutionEngine};
pub use tree::{NodeId, NodeKind, ProjectEntry, ProjectTree, TreeNode};
