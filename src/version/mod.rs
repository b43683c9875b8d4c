//! Version lookup layer
//!
//! This module provides the functionality for fetching module metadata from
//! artifact repositories and deciding whether a newer stable version exists.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Repository  │────▶│  Resolver   │────▶│  Compare    │
//! │  (fetch)    │     │ (first hit) │     │ (is newer)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │  Metadata   │     │  Stability  │
//! │ (xml tags)  │     │  (filter)   │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`compare`]: Numeric version comparison
//! - [`stability`]: Pattern based rejection of unstable versions
//! - [`metadata`]: `maven-metadata.xml` extraction
//! - [`repository`]: Repository trait and the Maven HTTP implementation
//! - [`resolver`]: Ordered lookup across repositories
//! - [`error`]: Lookup errors

pub mod compare;
pub mod error;
pub mod metadata;
pub mod repository;
pub mod resolver;
pub mod stability;
