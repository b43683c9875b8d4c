//! Shared test utilities
#![allow(dead_code)]

mod build;

pub use build::FakeBuild;

use dependency_updates::config::{RepositoryConfig, Settings};

/// Settings with a single repository at `url` and unstable filtering on
pub fn settings_for(url: &str) -> Settings {
    Settings {
        repositories: vec![RepositoryConfig::new("Test", url)],
        ..Settings::default()
    }
}

/// `maven-metadata.xml` body with a release tag and the listed versions
pub fn metadata_xml(release: &str, versions: &[&str]) -> String {
    let versions: String = versions
        .iter()
        .map(|version| format!("<version>{}</version>", version))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata><versioning>\
         <release>{}</release><versions>{}</versions></versioning></metadata>",
        release, versions
    )
}

/// Dependency report with one compile classpath block
pub fn compile_report(entries: &[&str]) -> String {
    let mut report = String::from("compileClasspath - Compile classpath for source set 'main'.\n");
    for (index, entry) in entries.iter().enumerate() {
        let marker = if index + 1 == entries.len() { "\\--- " } else { "+--- " };
        report.push_str(marker);
        report.push_str(entry);
        report.push('\n');
    }
    report.push('\n');
    report
}
