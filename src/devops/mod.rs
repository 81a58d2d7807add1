pub mod contributors;
pub mod http;
pub mod releases;
pub mod work_items;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::error::FetchError;

pub const API_VERSION: &str = "7.0";

/// Raw JSON access to the tracker. The HTTP implementation lives in
/// [`http::HttpTransport`]; tests swap in an in-memory one.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Value, FetchError>;
    async fn post(&self, url: &str, body: &Value) -> Result<Value, FetchError>;
}

/// Gateway to the work item, release and build services of one project.
pub struct DevOpsClient<T> {
    organization_url: String,
    project: String,
    release_field: String,
    notes_field: String,
    production_environment: String,
    transport: T,
}

impl<T: Transport> DevOpsClient<T> {
    pub fn new(config: &ConnectionConfig, transport: T) -> Self {
        Self {
            organization_url: config.organization_url.clone(),
            project: config.project.clone(),
            release_field: config.release_field.clone(),
            notes_field: config.notes_field.clone(),
            production_environment: config.production_environment.clone(),
            transport,
        }
    }

    /// `{org}/{project}/_apis/{path}` with the project segment encoded.
    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}/_apis/{path}",
            self.organization_url,
            urlencoding::encode(&self.project)
        )
    }

    /// Classic releases are served from a separate `vsrm.` host on Azure
    /// DevOps Services. On-premises servers use the collection URL itself.
    fn release_management_url(&self) -> String {
        if self.organization_url.contains("dev.azure.com") {
            self.organization_url
                .replace("dev.azure.com", "vsrm.dev.azure.com")
        } else {
            self.organization_url.clone()
        }
    }
}

/// Identifiers arrive as strings or numbers depending on the endpoint.
fn id_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
pub mod tests;
