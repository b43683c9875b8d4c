use thiserror::Error;

/// The build tool could not describe the project structure
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Build tool exited with {status}: {stderr}")]
    BuildFailed { status: String, stderr: String },

    #[error("No projects found in {0}")]
    NoProjects(String),
}

/// The dependency report of a single project could not be obtained
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Build tool exited with {status}: {stderr}")]
    BuildFailed { status: String, stderr: String },
}

/// A report line that does not name at least `group:name`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed dependency entry: {0}")]
    MalformedEntry(String),
}
