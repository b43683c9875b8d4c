//! Repository trait and the Maven layout HTTP implementation

#[cfg(test)]
use mockall::automock;
use reqwest::Url;
use tracing::{debug, warn};

use crate::tooling::types::ModuleId;
use crate::version::error::LookupError;
use crate::version::metadata::{METADATA_FILE, MetadataParser, ModuleMetadata};

const USER_AGENT: &str = "dependency-updates";

/// Trait for fetching module metadata from an artifact repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    /// Display name of the repository (e.g. "Maven Central")
    fn name(&self) -> String;

    /// Fetches the published version information of a module
    ///
    /// # Returns
    /// * `Ok(ModuleMetadata)` - Tags and versions found in the metadata document
    /// * `Err(LookupError)` - If the request fails or the repository answers with a non-success status
    async fn fetch_metadata(&self, module: &ModuleId) -> Result<ModuleMetadata, LookupError>;
}

/// Builds the HTTP client shared by the repositories of a run
///
/// `accept_invalid_certs` trusts any TLS certificate, for intranet mirrors
/// with self-signed certificates.
pub fn build_client(accept_invalid_certs: bool) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
}

/// Repository with a Maven layout (`group/as/path/name/maven-metadata.xml`)
pub struct MavenRepository {
    name: String,
    base_url: String,
    client: reqwest::Client,
    parser: MetadataParser,
}

impl MavenRepository {
    pub fn new(name: &str, base_url: &str, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            client,
            parser: MetadataParser::new(),
        }
    }

    /// URL of the metadata document of `module`, with any user-info removed
    /// and returned separately as (username, password)
    fn metadata_url(
        &self,
        module: &ModuleId,
    ) -> Result<(Url, Option<(String, Option<String>)>), LookupError> {
        let raw = format!(
            "{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            module.group.replace('.', "/"),
            module.name,
            METADATA_FILE
        );
        let mut url = Url::parse(&raw).map_err(|e| LookupError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        let credentials = if url.username().is_empty() {
            None
        } else {
            Some((
                url.username().to_string(),
                url.password().map(|p| p.to_string()),
            ))
        };

        if credentials.is_some() {
            // set_username/set_password only fail for URLs that cannot carry user-info,
            // which is impossible once a username was parsed
            let _ = url.set_username("");
            let _ = url.set_password(None);
        }

        Ok((url, credentials))
    }
}

#[async_trait::async_trait]
impl Repository for MavenRepository {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn fetch_metadata(&self, module: &ModuleId) -> Result<ModuleMetadata, LookupError> {
        let (url, credentials) = self.metadata_url(module)?;
        debug!("Fetching {} from {}", module, url);

        let mut request = self.client.get(url.clone());
        if let Some((username, password)) = credentials {
            request = request.basic_auth(username, password);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("{} returned status {}: {}", self.name, status, url);
            return Err(LookupError::Status {
                repository: self.name.clone(),
                status,
            });
        }

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read response from {}: {}", self.name, e);
            LookupError::InvalidResponse(e.to_string())
        })?;

        Ok(self.parser.parse(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn repository(base_url: &str) -> MavenRepository {
        MavenRepository::new("Test", base_url, build_client(false).unwrap())
    }

    #[tokio::test]
    async fn fetch_metadata_requests_maven_layout_path() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/maven2/com/google/guava/guava/maven-metadata.xml")
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(
                "<metadata><versioning><release>33.0.0-jre</release><versions>\
                 <version>32.1.3-jre</version><version>33.0.0-jre</version>\
                 </versions></versioning></metadata>",
            )
            .create_async()
            .await;

        let repository = repository(&format!("{}/maven2/", server.url()));
        let metadata = repository
            .fetch_metadata(&ModuleId::new("com.google.guava", "guava"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(metadata.release.as_deref(), Some("33.0.0-jre"));
        assert_eq!(metadata.versions.len(), 2);
    }

    #[tokio::test]
    async fn fetch_metadata_returns_status_error_for_non_success() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/org/x/missing/maven-metadata.xml")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let repository = repository(&server.url());
        let result = repository
            .fetch_metadata(&ModuleId::new("org.x", "missing"))
            .await;

        mock.assert_async().await;
        match result {
            Err(LookupError::Status { repository, status }) => {
                assert_eq!(repository, "Test");
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_metadata_sends_basic_auth_from_url_user_info() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/org/x/lib/maven-metadata.xml")
            .match_header("authorization", "Basic dXNlcjpzZWNyZXQ=")
            .with_status(200)
            .with_body("<metadata><versioning><release>1.0</release></versioning></metadata>")
            .create_async()
            .await;

        let base_url = server.url().replace("http://", "http://user:secret@");
        let repository = repository(&base_url);
        let metadata = repository
            .fetch_metadata(&ModuleId::new("org.x", "lib"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(metadata.release.as_deref(), Some("1.0"));
    }

    #[tokio::test]
    async fn fetch_metadata_rejects_invalid_base_url() {
        let repository = repository("not a url");

        let result = repository
            .fetch_metadata(&ModuleId::new("org.x", "lib"))
            .await;

        assert!(matches!(result, Err(LookupError::InvalidUrl { .. })));
    }

    #[test]
    fn metadata_url_strips_credentials() {
        let repository = repository("https://user:pw@repo.example.com/maven2/");

        let (url, credentials) = repository
            .metadata_url(&ModuleId::new("org.x", "lib"))
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://repo.example.com/maven2/org/x/lib/maven-metadata.xml"
        );
        assert_eq!(
            credentials,
            Some(("user".to_string(), Some("pw".to_string())))
        );
    }
}
