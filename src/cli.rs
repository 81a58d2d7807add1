use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{ConnectionConfig, FileConfig};
use crate::error::ConfigError;
use crate::report::SortOrder;

/// Generate release notes from Azure DevOps work items
///
/// Examples:
///   release-notes 2025.006 --organization https://dev.azure.com/myorg --project MyProject --pat TOKEN
///   AZURE_DEVOPS_PAT=token release-notes 2025.006 --organization https://dev.azure.com/myorg --project MyProject
#[derive(Parser, Debug)]
#[command(author, version, about, verbatim_doc_comment)]
pub struct Args {
    /// Release number to generate notes for (e.g. 2025.006)
    pub release: String,

    /// Azure DevOps organization URL (e.g. https://dev.azure.com/myorg)
    #[arg(long, env = "AZURE_DEVOPS_ORG")]
    pub organization: Option<String>,

    /// Azure DevOps project name
    #[arg(long, env = "AZURE_DEVOPS_PROJECT")]
    pub project: Option<String>,

    /// Personal Access Token
    #[arg(long, env = "AZURE_DEVOPS_PAT", hide_env_values = true)]
    pub pat: Option<String>,

    /// Work item field for release tracking [default: Custom.Release]
    #[arg(long)]
    pub release_field: Option<String>,

    /// Production environment name [default: PROD]
    #[arg(long)]
    pub prod_env: Option<String>,

    /// Work item field for deployment notes [default: System.Description]
    #[arg(long)]
    pub notes_field: Option<String>,

    /// Output file path [default: Release-Notes-<release>.md]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sort changelog entries by id or title
    #[arg(long, value_enum, default_value_t = SortOrder::Id)]
    pub sort_by: SortOrder,

    /// Config file [default: ~/.release-notes/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl Args {
    /// Merge flags over the config file and validate the result.
    pub fn resolve(&self, file: FileConfig) -> Result<ConnectionConfig, ConfigError> {
        let organization = self.organization.clone().or(file.organization_url).unwrap_or_default();
        let project = self.project.clone().or(file.project).unwrap_or_default();
        let pat = self.pat.clone().or(file.pat).unwrap_or_default();

        let mut config = ConnectionConfig::new(&organization, &project, &pat)?;
        if let Some(field) = self.release_field.clone().or(file.release_field) {
            config.release_field = field;
        }
        if let Some(field) = self.notes_field.clone().or(file.notes_field) {
            config.notes_field = field;
        }
        if let Some(env) = self.prod_env.clone().or(file.production_environment) {
            config.production_environment = env;
        }
        config.timeout = self.timeout_secs.or(file.timeout_secs).map(Duration::from_secs);

        Ok(config)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("Release-Notes-{}.md", self.release)))
    }
}
