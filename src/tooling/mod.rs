//! Build tool layer
//!
//! Talks to the build tool collaborator and turns its textual reports into
//! the project tree and the per-project dependency lists.
//!
//! # Modules
//!
//! - [`types`]: `ModuleId`, `Dependency` and `ProjectNode`
//! - [`report`]: Dependency report parser
//! - [`projects`]: Projects report parser
//! - [`provider`]: Collaborator traits, `ProjectTreeWalker` and `ModuleDependencyLister`
//! - [`gradle`]: Default collaborator running Gradle as an external process
//! - [`error`]: Discovery, listing and parse errors

pub mod error;
pub mod gradle;
pub mod projects;
pub mod provider;
pub mod report;
pub mod types;
