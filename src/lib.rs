pub mod config;
pub mod engine;
pub mod logging;
pub mod render;
pub mod tooling;
pub mod version;
