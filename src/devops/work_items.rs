use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use super::{DevOpsClient, Transport, API_VERSION};
use crate::error::RemoteError;
use crate::model::work_item::NO_ITERATION;
use crate::model::WorkItem;

/// The work items endpoint rejects batches larger than this.
const MAX_BATCH_SIZE: usize = 200;

const DETAIL_FIELDS: &[&str] = &[
    "System.Id",
    "System.Title",
    "System.WorkItemType",
    "System.State",
    "System.IterationPath",
];

#[derive(Deserialize)]
struct WiqlResponse {
    #[serde(default, rename = "workItems")]
    work_items: Vec<WorkItemRef>,
}

#[derive(Deserialize)]
struct WorkItemRef {
    id: u32,
}

#[derive(Deserialize)]
struct WorkItemBatch {
    #[serde(default)]
    value: Vec<RawWorkItem>,
}

#[derive(Deserialize)]
struct RawWorkItem {
    id: Option<u32>,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Escape a value for use inside a single-quoted WIQL literal.
fn wiql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn text_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(Value::as_str)
}

impl<T: Transport> DevOpsClient<T> {
    /// Ids of every work item whose release field equals `release_tag`, in
    /// the order the server returns them.
    pub async fn query_work_item_ids(&self, release_tag: &str) -> Result<Vec<u32>, RemoteError> {
        let query = format!(
            "SELECT [System.Id], [System.Title], [System.WorkItemType], [System.State], [System.IterationPath] \
             FROM WorkItems WHERE [{}] = '{}' AND [System.TeamProject] = '{}'",
            self.release_field,
            wiql_literal(release_tag),
            wiql_literal(&self.project),
        );
        let url = format!("{}?api-version={API_VERSION}", self.api_url("wit/wiql"));

        let resp = self
            .transport
            .post(&url, &json!({ "query": query }))
            .await
            .map_err(RemoteError::during("querying work items"))?;
        let result: WiqlResponse = serde_json::from_value(resp)
            .map_err(|e| RemoteError::during("querying work items")(e.into()))?;

        Ok(result.work_items.into_iter().map(|r| r.id).collect())
    }

    pub async fn fetch_work_item_details(&self, ids: &[u32]) -> Result<Vec<WorkItem>, RemoteError> {
        let mut items = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_BATCH_SIZE) {
            let resp = self
                .transport
                .get(&self.work_items_url(chunk))
                .await
                .map_err(RemoteError::during("getting work item details"))?;
            let batch: WorkItemBatch = serde_json::from_value(resp)
                .map_err(|e| RemoteError::during("getting work item details")(e.into()))?;

            items.extend(batch.value.into_iter().filter_map(|raw| self.parse_work_item(raw)));
        }

        Ok(items)
    }

    fn work_items_url(&self, ids: &[u32]) -> String {
        let ids = ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let fields = DETAIL_FIELDS
            .iter()
            .copied()
            .chain(std::iter::once(self.notes_field.as_str()))
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "{}?ids={ids}&fields={}&api-version={API_VERSION}",
            self.api_url("wit/workitems"),
            urlencoding::encode(&fields)
        )
    }

    fn parse_work_item(&self, raw: RawWorkItem) -> Option<WorkItem> {
        let fields = &raw.fields;
        let id = raw.id.or_else(|| {
            fields
                .get("System.Id")
                .and_then(Value::as_u64)
                .and_then(|id| u32::try_from(id).ok())
        });
        let Some(id) = id else {
            warn!(
                title = text_field(fields, "System.Title").unwrap_or_default(),
                "Skipping work item without an id"
            );
            return None;
        };

        let item = WorkItem::new(
            id,
            text_field(fields, "System.Title").unwrap_or_default(),
            text_field(fields, "System.WorkItemType").unwrap_or_default(),
        )
        .with_state(text_field(fields, "System.State").unwrap_or_default())
        .with_iteration(text_field(fields, "System.IterationPath").unwrap_or(NO_ITERATION))
        .with_notes(text_field(fields, &self.notes_field));

        Some(item)
    }
}
