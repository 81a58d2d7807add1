use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{DevOpsClient, Transport};
use crate::config::ConnectionConfig;
use crate::error::FetchError;
use crate::model::WorkItemType;

/// Canned responses matched by URL substring, first match wins. Every
/// request is recorded.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Vec<(String, Result<Value, u16>)>,
    pub(crate) requests: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, url_fragment: &str, body: Value) -> Self {
        self.routes.push((url_fragment.to_string(), Ok(body)));
        self
    }

    pub(crate) fn fail(mut self, url_fragment: &str, status: u16) -> Self {
        self.routes.push((url_fragment.to_string(), Err(status)));
        self
    }

    fn lookup(&self, url: &str) -> Result<Value, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.routes.iter().find(|(fragment, _)| url.contains(fragment.as_str())) {
            Some((_, Ok(body))) => Ok(body.clone()),
            Some((_, Err(status))) => Err(FetchError::Status {
                status: *status,
                reason: "Mock failure".into(),
                body: "{\"message\":\"mock\"}".into(),
            }),
            None => Err(FetchError::Transport(format!("no route for {url}"))),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<Value, FetchError> {
        self.lookup(url)
    }

    async fn post(&self, url: &str, _body: &Value) -> Result<Value, FetchError> {
        self.lookup(url)
    }
}

fn config() -> ConnectionConfig {
    ConnectionConfig::new("https://dev.azure.com/testorg", "TestProject", "test_pat_token_123").unwrap()
}

fn client(transport: MockTransport) -> (DevOpsClient<MockTransport>, Arc<Mutex<Vec<String>>>) {
    let requests = transport.requests.clone();
    (DevOpsClient::new(&config(), transport), requests)
}

#[tokio::test]
async fn query_returns_ids_in_server_order() {
    let transport = MockTransport::new().respond(
        "_apis/wit/wiql",
        json!({ "workItems": [{ "id": 3 }, { "id": 1 }, { "id": 2 }] }),
    );
    let (client, requests) = client(transport);

    let ids = client.query_work_item_ids("2025.006").await.unwrap();

    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(
        requests.lock().unwrap().as_slice(),
        &["https://dev.azure.com/testorg/TestProject/_apis/wit/wiql?api-version=7.0"]
    );
}

#[tokio::test]
async fn query_with_no_matches_is_empty() {
    let (client, _) = client(MockTransport::new().respond("_apis/wit/wiql", json!({ "workItems": [] })));
    assert!(client.query_work_item_ids("2025.006").await.unwrap().is_empty());
}

#[tokio::test]
async fn query_failure_surfaces_status_and_body() {
    let (client, _) = client(MockTransport::new().fail("_apis/wit/wiql", 401));

    let err = client.query_work_item_ids("2025.006").await.unwrap_err();

    let message = format!("{:#}", anyhow::Error::from(err));
    assert!(message.starts_with("Error querying work items: 401"));
    assert!(message.contains("{\"message\":\"mock\"}"));
}

#[tokio::test]
async fn details_for_no_ids_makes_no_request() {
    let (client, requests) = client(MockTransport::new());

    assert!(client.fetch_work_item_details(&[]).await.unwrap().is_empty());
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn details_map_fields_with_defaults() {
    let transport = MockTransport::new().respond(
        "_apis/wit/workitems?ids=",
        json!({
            "value": [
                {
                    "id": 1,
                    "fields": {
                        "System.Title": "Test Bug",
                        "System.WorkItemType": "Bug",
                        "System.State": "Done",
                        "System.IterationPath": "Sprint 1",
                        "System.Description": "  <ul><li>Deploy to production first</li></ul>  "
                    }
                },
                {
                    "fields": {
                        "System.Id": 2,
                        "System.Title": "Spike it",
                        "System.WorkItemType": "Spike",
                        "System.Description": "   "
                    }
                },
                { "fields": { "System.Title": "No id" } }
            ]
        }),
    );
    let (client, requests) = client(transport);

    let items = client.fetch_work_item_details(&[1, 2, 9]).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, 1);
    assert_eq!(items[0].title, "Test Bug");
    assert_eq!(items[0].work_item_type, WorkItemType::Bug);
    assert_eq!(items[0].state, "Done");
    assert_eq!(items[0].iteration_path, "Sprint 1");
    assert_eq!(items[0].notes.as_deref(), Some("<ul><li>Deploy to production first</li></ul>"));

    assert_eq!(items[1].id, 2);
    assert_eq!(items[1].work_item_type, WorkItemType::Other("Spike".into()));
    assert_eq!(items[1].state, "");
    assert_eq!(items[1].iteration_path, "N/A");
    assert_eq!(items[1].notes, None);

    let url = requests.lock().unwrap()[0].clone();
    assert!(url.contains("ids=1,2,9"));
    assert!(url.contains("System.Description"));
}

#[tokio::test]
async fn details_are_fetched_in_batches() {
    let transport = MockTransport::new().respond("_apis/wit/workitems?ids=", json!({ "value": [] }));
    let (client, requests) = client(transport);
    let ids: Vec<u32> = (1..=450).collect();

    client.fetch_work_item_details(&ids).await.unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].contains("ids=1,2,"));
    assert!(requests[2].contains("ids=401,"));
}

#[tokio::test]
async fn details_failure_is_fatal() {
    let (client, _) = client(MockTransport::new().fail("_apis/wit/workitems", 500));
    let err = client.fetch_work_item_details(&[1]).await.unwrap_err();
    assert!(format!("{:#}", anyhow::Error::from(err)).starts_with("Error getting work item details: 500"));
}

fn classic_release(name: &str, environments: Value) -> Value {
    json!({
        "id": 789,
        "name": name,
        "releaseDefinition": { "id": "456", "name": "auth-service" },
        "environments": environments
    })
}

#[tokio::test]
async fn classic_releases_carry_prod_deploy_time() {
    let transport = MockTransport::new().respond(
        "vsrm.dev.azure.com/testorg/TestProject/_apis/release/releases",
        json!({
            "value": [
                classic_release("Release-123", json!([
                    { "name": "DEV", "deploySteps": [{ "lastModifiedOn": "2025-11-05T11:39:14.667Z" }] },
                    { "name": "PROD", "deploySteps": [
                        { "lastModifiedOn": "2025-11-06T08:00:00.000Z" },
                        { "lastModifiedOn": "2025-11-06T11:39:14.667Z" }
                    ] }
                ])),
                classic_release("Release-124", json!([
                    { "name": "DEV", "deploySteps": [{ "lastModifiedOn": "2025-11-05T11:39:14.667Z" }] }
                ])),
                classic_release("Release-125", json!([{ "name": "PROD", "deploySteps": [] }]))
            ]
        }),
    );
    let (client, requests) = client(transport);

    let releases = client.fetch_releases("2025.006").await;

    assert_eq!(releases.len(), 3);
    assert_eq!(releases[0].microservice, "auth-service");
    assert_eq!(releases[0].version, "Release-123");
    assert_eq!(releases[0].release_id, "789");
    assert_eq!(releases[0].definition_id, "456");
    assert_eq!(releases[0].prod_deploy_time.as_deref(), Some("2025-11-06T11:39:14.667Z"));
    assert_eq!(releases[1].prod_deploy_time, None);
    assert_eq!(releases[2].prod_deploy_time, None);

    let url = requests.lock().unwrap()[0].clone();
    assert!(url.contains("tagFilter=2025.006"));
    assert!(url.contains("$expand=environments"));
}

#[tokio::test]
async fn production_environment_name_is_configurable() {
    let mut config = config();
    config.production_environment = "Production".into();
    let transport = MockTransport::new().respond(
        "_apis/release/releases",
        json!({ "value": [classic_release("Release-1", json!([
            { "name": "PROD", "deploySteps": [{ "lastModifiedOn": "2025-01-01T00:00:00Z" }] },
            { "name": "Production", "deploySteps": [{ "lastModifiedOn": "2025-02-01T00:00:00Z" }] }
        ]))] }),
    );
    let client = DevOpsClient::new(&config, transport);

    let releases = client.fetch_releases("r").await;
    assert_eq!(releases[0].prod_deploy_time.as_deref(), Some("2025-02-01T00:00:00Z"));
}

#[tokio::test]
async fn classic_failure_falls_back_to_builds() {
    let transport = MockTransport::new()
        .fail("_apis/release/releases", 404)
        .respond(
            "_apis/build/builds",
            json!({
                "value": [
                    { "definition": { "name": "api-gateway" }, "buildNumber": "20251106.3" },
                    { "buildNumber": "20251106.4" }
                ]
            }),
        );
    let (client, requests) = client(transport);

    let releases = client.fetch_releases("2025.006").await;

    assert_eq!(releases.len(), 2);
    assert_eq!(releases[0].microservice, "api-gateway");
    assert_eq!(releases[0].version, "20251106.3");
    assert_eq!(releases[0].prod_deploy_time, None);
    assert_eq!(releases[0].release_id, "");
    assert_eq!(releases[1].microservice, "Unknown");

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].starts_with("https://dev.azure.com/testorg/TestProject/_apis/build/builds"));
    assert!(requests[1].contains("tagFilters=2025.006"));
}

#[tokio::test]
async fn both_release_tiers_failing_yields_empty() {
    let transport = MockTransport::new()
        .fail("_apis/release/releases", 404)
        .fail("_apis/build/builds", 500);
    let (client, requests) = client(transport);

    assert!(client.fetch_releases("2025.006").await.is_empty());
    assert_eq!(requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_classic_response_falls_back() {
    let transport = MockTransport::new()
        .respond("_apis/release/releases", json!({ "value": "not a list" }))
        .respond("_apis/build/builds", json!({ "value": [{ "buildNumber": "1.0" }] }));
    let (client, _) = client(transport);

    let releases = client.fetch_releases("r").await;
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].version, "1.0");
}

#[tokio::test]
async fn release_host_unchanged_for_on_premises_server() {
    let config = ConnectionConfig::new("https://tfs.example.com/DefaultCollection", "Proj", "pat").unwrap();
    let transport = MockTransport::new().respond("_apis/release/releases", json!({ "value": [] }));
    let requests = transport.requests.clone();
    let client = DevOpsClient::new(&config, transport);

    client.fetch_releases("r").await;

    assert!(requests.lock().unwrap()[0]
        .starts_with("https://tfs.example.com/DefaultCollection/Proj/_apis/release/releases"));
}

fn updates(names: &[&str]) -> Value {
    let value: Vec<Value> = names
        .iter()
        .map(|name| json!({ "revisedBy": { "displayName": name } }))
        .collect();
    json!({ "value": value })
}

#[tokio::test]
async fn contributors_for_no_ids_makes_no_request() {
    let (client, requests) = client(MockTransport::new());

    let harvest = client.fetch_contributors(&[]).await;

    assert!(harvest.contributors.is_empty());
    assert!(harvest.skipped.is_empty());
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn contributors_exclude_system_accounts() {
    let transport = MockTransport::new().respond(
        "workitems/1/updates",
        updates(&[
            "Alice Developer",
            "Microsoft.VisualStudio.Services.TFS",
            "Project Collection Build Service (testorg)",
            "Bob <bob@example.com>",
            "Alice Developer",
        ]),
    );
    let (client, _) = client(transport);

    let harvest = client.fetch_contributors(&[1]).await;

    assert_eq!(harvest.contributors.into_iter().collect::<Vec<_>>(), vec!["Alice Developer"]);
}

#[tokio::test]
async fn one_failed_history_keeps_the_others() {
    let transport = MockTransport::new()
        .respond("workitems/1/updates", updates(&["Alice Developer", "Bob Engineer"]))
        .fail("workitems/2/updates", 500)
        .respond("workitems/3/updates", updates(&["Charlie Tester", "Alice Developer"]));
    let (client, requests) = client(transport);

    let harvest = client.fetch_contributors(&[1, 2, 3]).await;

    assert_eq!(
        harvest.contributors.into_iter().collect::<Vec<_>>(),
        vec!["Alice Developer", "Bob Engineer", "Charlie Tester"]
    );
    assert_eq!(harvest.skipped.len(), 1);
    assert_eq!(harvest.skipped[0].0, 2);
    assert_eq!(requests.lock().unwrap().len(), 3);
    assert!(requests.lock().unwrap()[0]
        .ends_with("/TestProject/_apis/wit/workitems/1/updates?api-version=7.0"));
}
