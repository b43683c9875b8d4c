//! Rejection of pre-release versions by substring patterns

/// Decides whether a version may be reported as the latest one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StabilityFilter {
    enabled: bool,
    /// Lowercased, trimmed, non-empty patterns
    patterns: Vec<String>,
}

impl StabilityFilter {
    /// Creates a filter from a comma-separated pattern list (e.g. "alpha, rc")
    pub fn new(enabled: bool, patterns: &str) -> Self {
        Self {
            enabled,
            patterns: patterns
                .split(',')
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// A filter that accepts every version
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Returns true if `version` is acceptable as a candidate latest version
    pub fn is_stable(&self, version: &str) -> bool {
        if !self.enabled {
            return true;
        }
        if version.trim().is_empty() {
            return false;
        }
        let lower = version.to_lowercase();
        !self.patterns.iter().any(|p| lower.contains(p.as_str()))
    }
}
