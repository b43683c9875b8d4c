//! Gradle command-line collaborator
//!
//! Runs the `projects` and `dependencies` tasks through the project's wrapper
//! (or an installed Gradle) and hands the textual reports to the parsers.

use std::path::{Path, PathBuf};
use std::process::Output;

use tokio::process::Command;
use tracing::{debug, info};

use crate::tooling::error::{DiscoveryError, ListingError};
use crate::tooling::projects::ProjectsReportParser;
use crate::tooling::provider::{DependencyReportProvider, ProjectInfoProvider};
use crate::tooling::types::ProjectNode;

/// Build scripts recognized in a project directory, in lookup order
const BUILD_FILES: &[&str] = &["build.gradle", "build.gradle.kts"];

/// Gradle invoked as an external process
pub struct GradleCli {
    /// Explicit executable; resolved per build directory when None
    executable: Option<PathBuf>,
    gradle_home: Option<PathBuf>,
    parser: ProjectsReportParser,
}

impl GradleCli {
    pub fn new() -> Self {
        Self {
            executable: None,
            gradle_home: std::env::var_os("GRADLE_HOME")
                .filter(|home| !home.is_empty())
                .map(PathBuf::from),
            parser: ProjectsReportParser::new(),
        }
    }

    /// Uses the given executable instead of the wrapper lookup
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = Some(executable.into());
        self
    }

    /// Executable for the build at `root_dir`: explicit, wrapper,
    /// `$GRADLE_HOME/bin/gradle`, then `gradle` from `PATH`
    fn executable_for(&self, root_dir: &Path) -> PathBuf {
        if let Some(executable) = &self.executable {
            return executable.clone();
        }
        let wrapper = root_dir.join(if cfg!(windows) { "gradlew.bat" } else { "gradlew" });
        if wrapper.is_file() {
            return wrapper;
        }
        if let Some(home) = &self.gradle_home {
            return home.join("bin").join("gradle");
        }
        PathBuf::from("gradle")
    }

    async fn run(&self, root_dir: &Path, task: &str) -> std::io::Result<(PathBuf, Output)> {
        let program = self.executable_for(root_dir);
        debug!("Running {:?} {} in {:?}", program, task, root_dir);
        let output = Command::new(&program)
            .args(["-q", "--console=plain", task])
            .current_dir(root_dir)
            .kill_on_drop(true)
            .output()
            .await?;
        Ok((program, output))
    }
}

impl Default for GradleCli {
    fn default() -> Self {
        Self::new()
    }
}

/// Build script of the project in `dir`, if any
pub fn detect_build_file(dir: &Path) -> Option<PathBuf> {
    BUILD_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Gradle task listing the dependencies of the project at `path`
fn dependencies_task(path: &str) -> String {
    if path == ":" {
        "dependencies".to_string()
    } else {
        format!("{}:dependencies", path)
    }
}

fn attach_build_files(node: &mut ProjectNode) {
    node.build_file = detect_build_file(&node.dir);
    for child in &mut node.children {
        attach_build_files(child);
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[async_trait::async_trait]
impl ProjectInfoProvider for GradleCli {
    async fn project_info(&self, root_dir: &Path) -> Result<ProjectNode, DiscoveryError> {
        let (program, output) =
            self.run(root_dir, "projects")
                .await
                .map_err(|source| DiscoveryError::Launch {
                    program: self.executable_for(root_dir).display().to_string(),
                    source,
                })?;

        if !output.status.success() {
            return Err(DiscoveryError::BuildFailed {
                status: output.status.to_string(),
                stderr: stderr_of(&output),
            });
        }

        let report = String::from_utf8_lossy(&output.stdout);
        let mut root = self
            .parser
            .parse(&report, root_dir)
            .ok_or_else(|| DiscoveryError::NoProjects(root_dir.display().to_string()))?;
        attach_build_files(&mut root);

        info!(
            "{:?} reported {} projects",
            program,
            root.iter().count()
        );
        Ok(root)
    }
}

#[async_trait::async_trait]
impl DependencyReportProvider for GradleCli {
    async fn dependency_report(
        &self,
        root_dir: &Path,
        project: &ProjectNode,
    ) -> Result<String, ListingError> {
        let task = dependencies_task(&project.path);
        let (_, output) =
            self.run(root_dir, &task)
                .await
                .map_err(|source| ListingError::Launch {
                    program: self.executable_for(root_dir).display().to_string(),
                    source,
                })?;

        if !output.status.success() {
            return Err(ListingError::BuildFailed {
                status: output.status.to_string(),
                stderr: stderr_of(&output),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dependencies_task_targets_project_path() {
        assert_eq!(dependencies_task(":"), "dependencies");
        assert_eq!(dependencies_task(":app:core"), ":app:core:dependencies");
    }

    #[test]
    fn detect_build_file_prefers_groovy_then_kotlin_script() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(detect_build_file(temp_dir.path()), None);

        let kts = temp_dir.path().join("build.gradle.kts");
        std::fs::write(&kts, "").unwrap();
        assert_eq!(detect_build_file(temp_dir.path()), Some(kts));

        let groovy = temp_dir.path().join("build.gradle");
        std::fs::write(&groovy, "").unwrap();
        assert_eq!(detect_build_file(temp_dir.path()), Some(groovy));
    }

    #[test]
    fn executable_for_prefers_wrapper_over_gradle_home() {
        let temp_dir = TempDir::new().unwrap();
        let gradle = GradleCli {
            executable: None,
            gradle_home: Some(PathBuf::from("/opt/gradle")),
            parser: ProjectsReportParser::new(),
        };

        assert_eq!(
            gradle.executable_for(temp_dir.path()),
            PathBuf::from("/opt/gradle/bin/gradle")
        );

        let wrapper = temp_dir
            .path()
            .join(if cfg!(windows) { "gradlew.bat" } else { "gradlew" });
        std::fs::write(&wrapper, "").unwrap();
        assert_eq!(gradle.executable_for(temp_dir.path()), wrapper);
    }

    #[test]
    fn attach_build_files_marks_projects_with_scripts() {
        let temp_dir = TempDir::new().unwrap();
        let app_dir = temp_dir.path().join("app");
        std::fs::create_dir(&app_dir).unwrap();
        std::fs::write(app_dir.join("build.gradle"), "").unwrap();

        let mut root = ProjectNode::new("demo", ":", temp_dir.path().to_path_buf());
        root.children
            .push(ProjectNode::new("app", ":app", app_dir.clone()));
        attach_build_files(&mut root);

        assert_eq!(root.build_file, None);
        assert_eq!(root.children[0].build_file, Some(app_dir.join("build.gradle")));
    }

    #[tokio::test]
    async fn project_info_reports_launch_failure() {
        let temp_dir = TempDir::new().unwrap();
        let gradle = GradleCli::new().with_executable("/nonexistent/gradle-binary");

        let result = gradle.project_info(temp_dir.path()).await;

        assert!(matches!(result, Err(DiscoveryError::Launch { .. })));
    }
}
