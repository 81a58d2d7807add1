use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{id_label, DevOpsClient, Transport, API_VERSION};
use crate::error::FetchError;
use crate::model::Release;

const MAX_RESULTS: u32 = 100;
const MAX_LOGGED_RELEASES: usize = 3;
const UNKNOWN: &str = "Unknown";

#[derive(Deserialize)]
struct ClassicReleaseList {
    #[serde(default)]
    value: Vec<ClassicRelease>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassicRelease {
    id: Option<Value>,
    name: Option<String>,
    release_definition: Option<DefinitionRef>,
    #[serde(default)]
    environments: Vec<Environment>,
}

#[derive(Deserialize)]
struct DefinitionRef {
    id: Option<Value>,
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Environment {
    name: Option<String>,
    #[serde(default)]
    deploy_steps: Vec<DeployStep>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployStep {
    last_modified_on: Option<String>,
}

#[derive(Deserialize)]
struct BuildList {
    #[serde(default)]
    value: Vec<Build>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Build {
    definition: Option<BuildDefinition>,
    build_number: Option<String>,
}

#[derive(Deserialize)]
struct BuildDefinition {
    name: Option<String>,
}

impl<T: Transport> DevOpsClient<T> {
    /// Microservice releases tagged with `release_tag`.
    ///
    /// Classic releases are preferred since they carry production deploy
    /// times. When that API is unavailable the builds API is used instead,
    /// and when both fail the report goes out without release data.
    pub async fn fetch_releases(&self, release_tag: &str) -> Vec<Release> {
        match self.classic_releases(release_tag).await {
            Ok(releases) => releases,
            Err(err) => {
                info!("Classic Releases API not available, trying Builds API: {err}");
                self.build_releases(release_tag).await.unwrap_or_else(|err| {
                    warn!("Builds API also failed: {err}. Skipping microservices section.");
                    Vec::new()
                })
            }
        }
    }

    async fn classic_releases(&self, release_tag: &str) -> Result<Vec<Release>, FetchError> {
        let url = format!(
            "{}/{}/_apis/release/releases?api-version={API_VERSION}&$top={MAX_RESULTS}&tagFilter={}&$expand=environments",
            self.release_management_url(),
            urlencoding::encode(&self.project),
            urlencoding::encode(release_tag),
        );

        let list: ClassicReleaseList = serde_json::from_value(self.transport.get(&url).await?)?;
        info!("Found {} releases matching tag filter", list.value.len());

        let releases: Vec<Release> = list
            .value
            .into_iter()
            .map(|data| self.parse_classic_release(data))
            .collect();

        for release in releases.iter().take(MAX_LOGGED_RELEASES) {
            info!(
                "  Found: {} - {} (PROD: {})",
                release.microservice,
                release.version,
                release.prod_deploy_time.as_deref().unwrap_or("none")
            );
        }
        if releases.is_empty() {
            info!("No releases returned from tag filter");
        } else {
            info!("Total: {} microservice releases", releases.len());
        }

        Ok(releases)
    }

    fn parse_classic_release(&self, data: ClassicRelease) -> Release {
        let prod_deploy_time = self.prod_deploy_time(&data.environments);
        let (microservice, definition_id) = match data.release_definition {
            Some(def) => (
                def.name.unwrap_or_else(|| UNKNOWN.to_string()),
                id_label(def.id.as_ref()),
            ),
            None => (UNKNOWN.to_string(), String::new()),
        };

        let release = Release::new(microservice, data.name.unwrap_or_else(|| UNKNOWN.to_string()))
            .with_ids(id_label(data.id.as_ref()), definition_id);
        match prod_deploy_time {
            Some(timestamp) => release.deployed_at(timestamp),
            None => release,
        }
    }

    /// Timestamp of the last deploy step in the production environment.
    fn prod_deploy_time(&self, environments: &[Environment]) -> Option<String> {
        environments
            .iter()
            .filter(|env| env.name.as_deref() == Some(self.production_environment.as_str()))
            .find_map(|env| env.deploy_steps.last())
            .and_then(|step| step.last_modified_on.clone())
    }

    async fn build_releases(&self, release_tag: &str) -> Result<Vec<Release>, FetchError> {
        let url = format!(
            "{}?api-version={API_VERSION}&tagFilters={}&$top={MAX_RESULTS}",
            self.api_url("build/builds"),
            urlencoding::encode(release_tag),
        );

        let list: BuildList = serde_json::from_value(self.transport.get(&url).await?)?;

        Ok(list
            .value
            .into_iter()
            .map(|build| {
                let microservice = build
                    .definition
                    .and_then(|d| d.name)
                    .unwrap_or_else(|| UNKNOWN.to_string());
                Release::new(microservice, build.build_number.unwrap_or_else(|| UNKNOWN.to_string()))
            })
            .collect())
    }
}
