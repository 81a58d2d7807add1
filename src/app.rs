use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::devops::{DevOpsClient, Transport};
use crate::report::{group_by_type, ReportGenerator};

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Written { path: PathBuf, work_items: usize },
    NoWorkItems,
}

/// Fetch everything tagged `release`, render it and write `output`.
pub async fn run<T: Transport>(
    client: &DevOpsClient<T>,
    generator: &ReportGenerator,
    release: &str,
    output: &Path,
) -> Result<Outcome> {
    info!("Querying work items for release '{release}'...");
    let ids = client.query_work_item_ids(release).await?;

    if ids.is_empty() {
        info!("No work items found for release '{release}'");
        return Ok(Outcome::NoWorkItems);
    }
    info!("Found {} work items", ids.len());

    info!("Retrieving work item details...");
    let work_items = client.fetch_work_item_details(&ids).await?;

    info!("Querying releases for microservices...");
    let releases = client.fetch_releases(release).await;
    if !releases.is_empty() {
        info!("Found {} microservice release(s)", releases.len());
    }

    info!("Extracting contributors from work item history...");
    let harvest = client.fetch_contributors(&ids).await;
    if !harvest.contributors.is_empty() {
        info!("Found {} contributor(s)", harvest.contributors.len());
    }
    if !harvest.skipped.is_empty() {
        info!("Skipped history for {} work item(s)", harvest.skipped.len());
    }

    info!("Generating markdown...");
    let markdown = generator.generate(release, &work_items, &releases, &harvest.contributors);

    std::fs::write(output, markdown)
        .with_context(|| format!("Failed to write release notes to {}", output.display()))?;

    info!("Release notes written to {}", output.display());
    info!("Total work items: {}", work_items.len());

    let mut breakdown: Vec<_> = group_by_type(&work_items).into_iter().collect();
    breakdown.sort_by(|(a, _), (b, _)| a.label().cmp(b.label()));
    for (kind, items) in breakdown {
        info!("  - {kind}: {}", items.len());
    }

    Ok(Outcome::Written {
        path: output.to_path_buf(),
        work_items: work_items.len(),
    })
}
