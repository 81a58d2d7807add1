use serde::{Deserialize, Serialize};

/// One microservice deployment belonging to a release tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub microservice: String,
    pub version: String,
    /// ISO-8601 timestamp of the last production deploy step, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prod_deploy_time: Option<String>,
    #[serde(default)]
    pub release_id: String,
    #[serde(default)]
    pub definition_id: String,
}

impl Release {
    pub fn new(microservice: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            microservice: microservice.into(),
            version: version.into(),
            prod_deploy_time: None,
            release_id: String::new(),
            definition_id: String::new(),
        }
    }

    pub fn deployed_at(mut self, timestamp: impl Into<String>) -> Self {
        self.prod_deploy_time = Some(timestamp.into());
        self
    }

    pub fn with_ids(mut self, release_id: impl Into<String>, definition_id: impl Into<String>) -> Self {
        self.release_id = release_id.into();
        self.definition_id = definition_id.into();
        self
    }
}
