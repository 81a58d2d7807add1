use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::warn;

use super::{DevOpsClient, Transport, API_VERSION};
use crate::error::FetchError;

/// Display names containing any of these belong to automation, not people.
/// Angle brackets show up in identities that embed an email or descriptor.
pub const SYSTEM_ACCOUNT_PATTERNS: &[&str] = &[
    "Microsoft.VisualStudio.Services",
    "Project Collection Build Service",
    "<",
    ">",
];

#[derive(Deserialize)]
struct UpdateList {
    #[serde(default)]
    value: Vec<Update>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Update {
    revised_by: Option<Identity>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Identity {
    display_name: Option<String>,
}

/// Contributors gathered across work items, plus the items whose history
/// could not be read.
#[derive(Debug, Default)]
pub struct ContributorHarvest {
    pub contributors: BTreeSet<String>,
    pub skipped: Vec<(u32, FetchError)>,
}

pub fn is_system_account(display_name: &str) -> bool {
    SYSTEM_ACCOUNT_PATTERNS
        .iter()
        .any(|pattern| display_name.contains(pattern))
}

fn contributor(update: Update) -> Option<String> {
    update
        .revised_by
        .and_then(|identity| identity.display_name)
        .filter(|name| !name.is_empty() && !is_system_account(name))
}

impl<T: Transport> DevOpsClient<T> {
    /// Everyone who revised any of `ids`. A failed history fetch skips that
    /// item only.
    pub async fn fetch_contributors(&self, ids: &[u32]) -> ContributorHarvest {
        let mut harvest = ContributorHarvest::default();

        for &id in ids {
            match self.revision_authors(id).await {
                Ok(names) => harvest.contributors.extend(names),
                Err(err) => {
                    warn!("Could not get revisions for work item {id}: {err}");
                    harvest.skipped.push((id, err));
                }
            }
        }

        harvest
    }

    async fn revision_authors(&self, id: u32) -> Result<Vec<String>, FetchError> {
        let url = format!(
            "{}?api-version={API_VERSION}",
            self.api_url(&format!("wit/workitems/{id}/updates"))
        );
        let updates: UpdateList = serde_json::from_value(self.transport.get(&url).await?)?;

        Ok(updates.value.into_iter().filter_map(contributor).collect())
    }
}
