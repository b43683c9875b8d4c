//! Extraction of version information from `maven-metadata.xml`
//!
//! Format example:
//! ```text
//! <metadata>
//!   <groupId>org.x</groupId>
//!   <artifactId>lib</artifactId>
//!   <versioning>
//!     <latest>1.3.0-rc1</latest>
//!     <release>1.2</release>
//!     <versions>
//!       <version>1.0</version>
//!       <version>1.2</version>
//!       <version>1.3.0-rc1</version>
//!     </versions>
//!   </versioning>
//! </metadata>
//! ```

use regex::Regex;

/// File name of the module metadata in a Maven layout repository
pub const METADATA_FILE: &str = "maven-metadata.xml";

/// Version information published for a module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleMetadata {
    pub latest: Option<String>,
    pub release: Option<String>,
    /// Every listed version, in document order (oldest first by convention)
    pub versions: Vec<String>,
}

/// Parser for module metadata documents
pub struct MetadataParser {
    latest_re: Regex,
    release_re: Regex,
    versions_re: Regex,
    version_re: Regex,
}

impl MetadataParser {
    pub fn new() -> Self {
        Self {
            latest_re: Regex::new(r"<latest>\s*([^<]*?)\s*</latest>").unwrap(),
            release_re: Regex::new(r"<release>\s*([^<]*?)\s*</release>").unwrap(),
            versions_re: Regex::new(r"(?s)<versions>(.*?)</versions>").unwrap(),
            version_re: Regex::new(r"<version>\s*([^<]*?)\s*</version>").unwrap(),
        }
    }

    pub fn parse(&self, document: &str) -> ModuleMetadata {
        let tag = |re: &Regex| {
            re.captures(document)
                .map(|caps| caps[1].to_string())
                .filter(|v| !v.is_empty())
        };

        // Only <version> entries inside <versions>; a top-level <version> is the
        // module's own version in some repositories
        let versions = self
            .versions_re
            .captures(document)
            .map(|caps| {
                self.version_re
                    .captures_iter(&caps[1])
                    .map(|c| c[1].to_string())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        ModuleMetadata {
            latest: tag(&self.latest_re),
            release: tag(&self.release_re),
            versions,
        }
    }
}

impl Default for MetadataParser {
    fn default() -> Self {
        Self::new()
    }
}
