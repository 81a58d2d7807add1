pub mod summary;

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Release, WorkItem, WorkItemType};
use crate::util::html::extract_list_items;

use summary::{extract_iterations, extract_release_date};

/// Ordering of work items inside a changelog group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    #[default]
    Id,
    Title,
}

/// Work items keyed by type, iterated in display order.
pub type GroupedItems<'a> = BTreeMap<WorkItemType, Vec<&'a WorkItem>>;

pub fn group_by_type(work_items: &[WorkItem]) -> GroupedItems<'_> {
    let mut grouped: GroupedItems<'_> = BTreeMap::new();
    for item in work_items {
        grouped
            .entry(item.work_item_type.clone())
            .or_default()
            .push(item);
    }
    grouped
}

/// Renders release notes as markdown. Pure: no I/O.
pub struct ReportGenerator {
    organization_url: String,
    project: String,
    sort_order: SortOrder,
}

impl ReportGenerator {
    pub fn new(organization_url: impl Into<String>, project: impl Into<String>, sort_order: SortOrder) -> Self {
        Self {
            organization_url: organization_url.into(),
            project: project.into(),
            sort_order,
        }
    }

    pub fn generate(
        &self,
        release: &str,
        work_items: &[WorkItem],
        releases: &[Release],
        contributors: &BTreeSet<String>,
    ) -> String {
        let mut lines = Vec::new();
        let grouped = group_by_type(work_items);

        lines.push(format!("# Release Notes - {release}"));
        lines.push(String::new());

        self.summary_section(&mut lines, work_items, releases, &grouped);
        self.binaries_section(&mut lines, releases);
        self.changelog_section(&mut lines, &grouped);
        self.deployment_section(&mut lines, work_items);
        contributors_section(&mut lines, contributors);

        lines.join("\n")
    }

    fn summary_section(
        &self,
        lines: &mut Vec<String>,
        work_items: &[WorkItem],
        releases: &[Release],
        grouped: &GroupedItems<'_>,
    ) {
        lines.push("## \u{1F4CA} Summary".into());
        lines.push(String::new());
        lines.push(format!("**Release Date:** {}", extract_release_date(releases)));
        lines.push(String::new());
        lines.push(format!("**Iteration:** {}", extract_iterations(work_items)));
        lines.push(String::new());
        lines.push(format!("**Total Work Items:** {}", work_items.len()));
        lines.push(format!("**Microservices Released:** {}", releases.len()));
        lines.push(String::new());

        lines.push("**Breakdown by Type:**".into());
        lines.push(String::new());
        for (kind, items) in grouped {
            lines.push(format!("- {} **{kind}:** {}", kind.emoji(), items.len()));
        }
        lines.push(String::new());
    }

    fn binaries_section(&self, lines: &mut Vec<String>, releases: &[Release]) {
        if releases.is_empty() {
            return;
        }

        lines.push("## \u{1F4E6} Binaries".into());
        lines.push(String::new());
        lines.push("| Microservice | Version |".into());
        lines.push("|--------------|---------|".into());

        let mut sorted: Vec<&Release> = releases.iter().collect();
        sorted.sort_by(|a, b| a.microservice.cmp(&b.microservice));

        for release in sorted {
            let pipeline_url = format!(
                "{}/{}/_release?definitionId={}&_a=releases&view=mine",
                self.organization_url, self.project, release.definition_id
            );
            let release_url = format!(
                "{}/{}/_releaseProgress?_a=release-pipeline-progress&releaseId={}",
                self.organization_url, self.project, release.release_id
            );
            lines.push(format!(
                "| [{}]({pipeline_url}) | [{}]({release_url}) |",
                release.microservice, release.version
            ));
        }
        lines.push(String::new());
    }

    fn changelog_section(&self, lines: &mut Vec<String>, grouped: &GroupedItems<'_>) {
        lines.push("## \u{1F4DD} Changelog".into());
        lines.push(String::new());

        for (kind, items) in grouped {
            lines.push(format!("### {} {kind} ({})", kind.emoji(), items.len()));
            lines.push(String::new());

            let mut sorted = items.clone();
            match self.sort_order {
                SortOrder::Id => sorted.sort_by_key(|item| item.id),
                SortOrder::Title => {
                    sorted.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)))
                }
            }

            for item in sorted {
                lines.push(format!(
                    "- [#{}]({}) {}",
                    item.id,
                    self.work_item_url(item.id),
                    item.title
                ));
            }
            lines.push(String::new());
        }
    }

    /// Items whose notes hold nothing but markup are left out.
    fn deployment_section(&self, lines: &mut Vec<String>, work_items: &[WorkItem]) {
        let mut with_notes: Vec<(&WorkItem, Vec<String>)> = work_items
            .iter()
            .filter_map(|item| {
                let instructions = extract_list_items(item.notes.as_deref()?);
                (!instructions.is_empty()).then_some((item, instructions))
            })
            .collect();
        if with_notes.is_empty() {
            return;
        }
        with_notes.sort_by_key(|(item, _)| item.id);

        lines.push("## \u{1F680} Deployment Instructions".into());
        lines.push(String::new());

        for (item, instructions) in with_notes {
            lines.push(format!("- [#{}]({})", item.id, self.work_item_url(item.id)));
            for instruction in instructions {
                lines.push(format!("  - {instruction}"));
            }
            lines.push(String::new());
        }
    }

    fn work_item_url(&self, id: u32) -> String {
        format!("{}/{}/_workitems/edit/{id}", self.organization_url, self.project)
    }
}

fn contributors_section(lines: &mut Vec<String>, contributors: &BTreeSet<String>) {
    if contributors.is_empty() {
        return;
    }

    lines.push("## \u{1F465} Contributors".into());
    lines.push(String::new());
    for name in contributors {
        lines.push(format!("- {name}"));
    }
    lines.push(String::new());
}
