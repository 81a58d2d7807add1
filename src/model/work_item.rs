use serde::{Deserialize, Serialize};
use std::fmt;

/// Iteration path used when the tracker reports none.
pub const NO_ITERATION: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: u32,
    pub title: String,
    #[serde(rename = "type")]
    pub work_item_type: WorkItemType,
    pub state: String,
    #[serde(default = "default_iteration")]
    pub iteration_path: String,
    /// Deployment instructions, possibly HTML. Never empty or whitespace-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_iteration() -> String {
    NO_ITERATION.to_string()
}

impl WorkItem {
    pub fn new(id: u32, title: impl Into<String>, work_item_type: impl Into<WorkItemType>) -> Self {
        Self {
            id,
            title: title.into(),
            work_item_type: work_item_type.into(),
            state: String::new(),
            iteration_path: default_iteration(),
            notes: None,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn with_iteration(mut self, iteration_path: impl Into<String>) -> Self {
        self.iteration_path = iteration_path.into();
        self
    }

    pub fn with_notes(mut self, notes: Option<&str>) -> Self {
        self.notes = normalize_notes(notes);
        self
    }
}

/// Trim notes and collapse empty results to `None`. Markup is kept as-is.
pub fn normalize_notes(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(String::from)
}

/// Work item category. Variant order is the display order; every label the
/// tracker sends that isn't one of the prioritized types lands in `Other`
/// and sorts after them, alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkItemType {
    Bug,
    Epic,
    Feature,
    UserStory,
    Task,
    Other(String),
}

impl WorkItemType {
    pub fn label(&self) -> &str {
        match self {
            WorkItemType::Bug => "Bug",
            WorkItemType::Epic => "Epic",
            WorkItemType::Feature => "Feature",
            WorkItemType::UserStory => "User Story",
            WorkItemType::Task => "Task",
            WorkItemType::Other(label) => label,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            WorkItemType::Bug => "\u{1F41B}",
            WorkItemType::Epic => "\u{1F4D8}",
            WorkItemType::Feature => "\u{2728}",
            WorkItemType::UserStory => "\u{1F4DD}",
            WorkItemType::Task => "\u{1F527}",
            WorkItemType::Other(label) => match label.as_str() {
                "Issue" => "\u{26A0}\u{FE0F}",
                "Product Backlog Item" => "\u{1F4CB}",
                "Impediment" => "\u{1F6A7}",
                _ => "\u{1F4CC}",
            },
        }
    }
}

impl From<&str> for WorkItemType {
    fn from(label: &str) -> Self {
        match label {
            "Bug" => WorkItemType::Bug,
            "Epic" => WorkItemType::Epic,
            "Feature" => WorkItemType::Feature,
            "User Story" => WorkItemType::UserStory,
            "Task" => WorkItemType::Task,
            other => WorkItemType::Other(other.to_string()),
        }
    }
}

impl From<String> for WorkItemType {
    fn from(label: String) -> Self {
        WorkItemType::from(label.as_str())
    }
}

impl From<WorkItemType> for String {
    fn from(kind: WorkItemType) -> Self {
        kind.label().to_string()
    }
}

impl fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
