//! Dependency report parser
//!
//! Parses the textual output of the build tool's `dependencies` task and
//! extracts the first-level entries of the classpath configurations.
//!
//! Format example:
//! ```text
//! compileClasspath - Compile classpath for source set 'main'.
//! +--- project :core
//! +--- com.google.guava:guava:31.0-jre
//! |    \--- com.google.guava:failureaccess:1.0.1
//! +--- org.slf4j:slf4j-api:1.7.30 -> 1.7.36
//! \--- org.example:missing FAILED
//!
//! ```

use regex::Regex;
use tracing::debug;

use crate::tooling::error::ParseError;
use crate::tooling::types::Dependency;

/// Configuration blocks whose first-level entries are extracted (lowercase)
const CLASSPATH_CONFIGURATIONS: &[&str] = &[
    "compileclasspath - ",
    "runtimeclasspath - ",
    "testcompileclasspath - ",
    "testruntimeclasspath - ",
    "debugcompileclasspath - ",
    "debugruntimeclasspath - ",
    "releasecompileclasspath - ",
    "releaseruntimeclasspath - ",
];

/// Markers of a first-level entry; deeper levels are prefixed by `|    ` or spaces
const FIRST_LEVEL_MARKERS: &[&str] = &["+--- ", "\\--- "];

/// Prefix of an entry referencing another project of the same build
const PROJECT_MARKER: &str = "project ";

/// Annotation of a declared dependency that the configuration does not resolve
const NOT_RESOLVED: &str = "(n)";

/// Annotations that only decorate an entry: `(*)` omitted repeat, `(c)` constraint
const DECORATIONS: &[&str] = &[" (*)", " (c)"];

/// Parser for dependency reports
pub struct DependencyReportParser {
    /// Regex for rich version constraints: `{strictly 1.0}`
    strictly_re: Regex,
}

impl DependencyReportParser {
    pub fn new() -> Self {
        Self {
            strictly_re: Regex::new(r"\{strictly\s+([^}]*)\}").unwrap(),
        }
    }

    /// Extracts the first-level dependencies of every classpath block
    ///
    /// Entries are returned in report order; repeated entries (same group,
    /// name and version) are kept once. Malformed entries are skipped.
    pub fn parse(&self, report: &str) -> Vec<Dependency> {
        let mut results: Vec<Dependency> = Vec::new();
        let mut in_block = false;

        for line in report.lines() {
            let line = line.trim_end_matches('\r');

            if is_block_start(line) {
                in_block = true;
                continue;
            }
            if !in_block {
                continue;
            }
            if line.is_empty() {
                in_block = false;
                continue;
            }

            let Some(entry) = FIRST_LEVEL_MARKERS
                .iter()
                .find_map(|marker| line.strip_prefix(marker))
            else {
                continue;
            };

            match self.parse_entry(entry) {
                Ok(Some(dependency)) => {
                    if !results.contains(&dependency) {
                        results.push(dependency);
                    }
                }
                Ok(None) => debug!("Skipping unresolved entry: {}", entry),
                Err(e) => debug!("Skipping report line: {}", e),
            }
        }

        results
    }

    /// Parses a single first-level entry (without its tree marker)
    ///
    /// Returns `Ok(None)` for entries that are declared but not resolved.
    pub fn parse_entry(&self, entry: &str) -> Result<Option<Dependency>, ParseError> {
        let normalized = self.strictly_re.replace_all(entry, "$1");
        let entry = normalized.trim();

        if let Some(path) = entry.strip_prefix(PROJECT_MARKER) {
            let path = first_token(path);
            if path.is_empty() {
                return Err(ParseError::MalformedEntry(entry.to_string()));
            }
            return Ok(Some(Dependency::project_reference(path)));
        }

        let (coordinates, selected) = match entry.split_once(" -> ") {
            Some((left, right)) => (left, Some(first_token(right))),
            None => (entry, None),
        };

        // Substituted by another module or project: `a:b:1.0 -> c:d:2.0`
        if let Some(target) = selected
            && (target.contains(':') || right_is_project(entry))
        {
            let (_, right) = entry.split_once(" -> ").unwrap_or_default();
            return self.parse_entry(right);
        }

        let parts: Vec<&str> = coordinates.split(':').collect();
        if parts.len() < 2 || parts[0].trim().is_empty() {
            return Err(ParseError::MalformedEntry(entry.to_string()));
        }
        let group = parts[0].trim();

        if parts.len() == 2 {
            let rest = strip_decorations(parts[1]);
            if let Some(version) = selected {
                return Ok(Some(Dependency::new(group, first_token(rest), Some(version))));
            }
            return match rest.split_once(' ') {
                Some((name, annotation)) => {
                    let annotation = annotation.trim();
                    if annotation == NOT_RESOLVED {
                        Ok(None)
                    } else {
                        let mut dependency = Dependency::new(group, name, None);
                        dependency.error = Some(annotation.to_string());
                        Ok(Some(dependency))
                    }
                }
                None if rest.is_empty() => Err(ParseError::MalformedEntry(entry.to_string())),
                None => Ok(Some(Dependency::new(group, rest, None))),
            };
        }

        let name = parts[1].trim();
        if name.is_empty() {
            return Err(ParseError::MalformedEntry(entry.to_string()));
        }
        let version = selected.unwrap_or_else(|| first_token(parts[2]));
        Ok(Some(Dependency::new(group, name, Some(version))))
    }
}

impl Default for DependencyReportParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_block_start(line: &str) -> bool {
    let lower = line.to_lowercase();
    CLASSPATH_CONFIGURATIONS
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

fn right_is_project(entry: &str) -> bool {
    entry
        .split_once(" -> ")
        .is_some_and(|(_, right)| right.trim_start().starts_with(PROJECT_MARKER))
}

fn strip_decorations(s: &str) -> &str {
    let mut s = s.trim();
    while let Some(stripped) = DECORATIONS.iter().find_map(|d| s.strip_suffix(d)) {
        s = stripped.trim_end();
    }
    s
}

fn first_token(s: &str) -> &str {
    s.split_whitespace().next().unwrap_or_default()
}
