use std::sync::Once;

use dkron_config::ProviderConfig;
use dkron_domain::{AttributeValue, Job};
use dkron_errors::ProviderError;
use dkron_provider_core::{DkronProvider, JobResource, Resource, ResourceData};
use dkron_testing_utils::{JobAttributesBuilder, MockDkronServer};
use serde_json::json;

static INIT: Once = Once::new();

/// Route request logging to the test output. `RUST_LOG` overrides the level.
fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

fn resource_for(server: &MockDkronServer) -> JobResource {
    init_test_logging();
    let config = ProviderConfig::new(server.address()).expect("valid mock address");
    JobResource::new(&config)
}

fn full_job(name: &str) -> JobAttributesBuilder {
    JobAttributesBuilder::new(name)
        .with_schedule("@every 10m")
        .with("timezone", "UTC")
        .with("owner", "platform")
        .with("owner_email", "platform@example.com")
        .with("concurrency", "forbid")
        .with("parent_job", "warmup")
        .with("cwd", "/srv/app")
        .with("mem_limit_kb", "65536")
        .with_retries(2)
        .with_shell(true)
        .with_tag("role", "web:2")
        .with_tag("weight", 5i64)
        .with_processor("log", Some("true"), None)
        .with_processor("files", None, Some("/var/log/jobs"))
        .with_dependent_jobs(&["cleanup", "notify"])
}

#[tokio::test]
async fn test_create_posts_job_and_records_id() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);
    let mut data = ResourceData::new(full_job("web-sync").build());

    resource.create(&mut data).await.expect("create should succeed");

    assert_eq!(data.id(), Some("web-sync"));

    let posts = server.requests_with_method("POST");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].path, "/v1/jobs");
    assert_eq!(posts[0].content_type.as_deref(), Some("application/json"));

    let body = posts[0].json();
    assert_eq!(body["name"], "web-sync");
    assert_eq!(body["executor_config"]["shell"], json!("true"));
    assert_eq!(body["executor_config"]["command"], "echo hello");
    assert_eq!(body["tags"], json!({"role": "web:2", "weight": 5}));
    assert_eq!(
        body["processors"],
        json!({"log": {"forward": "true"}, "files": {"log_dir": "/var/log/jobs"}})
    );
    assert_eq!(body["dependent_jobs"], json!(["cleanup", "notify"]));
}

#[tokio::test]
async fn test_create_omits_empty_processor_fields() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);
    let attributes = JobAttributesBuilder::new("logger")
        .with_processor("log", Some(""), Some("/var/log"))
        .build();

    resource
        .create(&mut ResourceData::new(attributes))
        .await
        .unwrap();

    let body = server.requests_with_method("POST")[0].json();
    assert_eq!(body["processors"], json!({"log": {"log_dir": "/var/log"}}));
}

#[tokio::test]
async fn test_create_non_201_is_remote_error_with_body() {
    let server = MockDkronServer::spawn().await;
    server.respond_to_create_with(422, "{\"error\":\"invalid schedule\"}");
    let resource = resource_for(&server);
    let mut data = ResourceData::new(JobAttributesBuilder::new("broken").build());

    let err = resource.create(&mut data).await.unwrap_err();

    match err {
        ProviderError::Remote { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body, "{\"error\":\"invalid schedule\"}");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    assert!(data.id().is_none());
}

#[tokio::test]
async fn test_create_200_is_not_success() {
    let server = MockDkronServer::spawn().await;
    server.respond_to_create_with(200, "{\"name\":\"almost\"}");
    let resource = resource_for(&server);

    let err = resource
        .create(&mut ResourceData::new(JobAttributesBuilder::new("almost").build()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Remote { status: 200, .. }));
}

#[tokio::test]
async fn test_create_malformed_response_is_serialization_error() {
    let server = MockDkronServer::spawn().await;
    server.respond_to_create_with(201, "<html>created</html>");
    let resource = resource_for(&server);

    let err = resource
        .create(&mut ResourceData::new(JobAttributesBuilder::new("odd").build()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Serialization(_)));
}

#[tokio::test]
async fn test_create_invalid_attributes_sends_nothing() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);

    let missing_command = JobAttributesBuilder::new("incomplete").without("command").build();
    let err = resource
        .create(&mut ResourceData::new(missing_command))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Validation { ref attribute, .. } if attribute == "command"));

    let bad_processor = JobAttributesBuilder::new("incomplete")
        .with_processor("kafka", None, None)
        .build();
    let err = resource
        .create(&mut ResourceData::new(bad_processor))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Validation { .. }));

    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_create_then_read_round_trips() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);
    let attributes = full_job("round-trip").build();
    let mut data = ResourceData::new(attributes.clone());

    resource.create(&mut data).await.unwrap();
    resource.read(&mut data).await.unwrap();

    let gets = server.requests_with_method("GET");
    assert_eq!(gets.len(), 1);
    assert_eq!(gets[0].path, "/v1/jobs/round-trip");

    assert_eq!(data.get("shell"), Some(&AttributeValue::Bool(true)));
    assert_eq!(data.get("retries"), Some(&AttributeValue::Int(2)));
    assert_eq!(data.get("owner"), Some(&AttributeValue::from("platform")));
    assert_eq!(
        Job::from_attributes(data.attributes()).unwrap(),
        Job::from_attributes(&attributes).unwrap()
    );
}

#[tokio::test]
async fn test_read_missing_job_degrades_to_empty_state() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);
    let mut data = ResourceData::new(full_job("ghost").build()).with_id("ghost");

    resource.read(&mut data).await.expect("404 is not reported");

    assert_eq!(data.id(), Some("ghost"));
    assert_eq!(data.get("name"), Some(&AttributeValue::from("")));
    assert_eq!(data.get("command"), Some(&AttributeValue::from("")));
    assert_eq!(data.get("processors"), Some(&AttributeValue::List(vec![])));
}

#[tokio::test]
async fn test_read_error_body_that_is_not_json() {
    let server = MockDkronServer::spawn().await;
    server.respond_to_get_with(500, "internal error");
    let resource = resource_for(&server);
    let mut data = ResourceData::default().with_id("anything");

    resource.read(&mut data).await.unwrap();
    assert_eq!(data.get("executor"), Some(&AttributeValue::from("")));
}

#[tokio::test]
async fn test_read_decodes_server_side_fields() {
    let server = MockDkronServer::spawn().await;
    server.insert_job(json!({
        "name": "remote",
        "executor": "http",
        "disabled": true,
        "tags": null,
        "processors": {"syslog": {}},
        "executor_config": {"command": "ping", "shell": "false"},
        "success_count": 40,
        "last_success": "2024-01-01T00:00:00Z"
    }));
    let resource = resource_for(&server);
    let mut data = ResourceData::default().with_id("remote");

    resource.read(&mut data).await.unwrap();

    assert_eq!(data.get("disabled"), Some(&AttributeValue::Bool(true)));
    assert_eq!(data.get("shell"), Some(&AttributeValue::Bool(false)));
    assert_eq!(data.get("command"), Some(&AttributeValue::from("ping")));
    let processors = data.get("processors").and_then(|p| p.as_list()).unwrap();
    assert_eq!(processors.len(), 1);
    assert_eq!(
        processors[0].as_map().unwrap()["type"],
        AttributeValue::from("syslog")
    );
}

#[tokio::test]
async fn test_read_accepts_non_string_processor_settings() {
    let server = MockDkronServer::spawn().await;
    server.insert_job(json!({
        "name": "archiver",
        "executor": "shell",
        "processors": {"files": {"forward": true}}
    }));
    let resource = resource_for(&server);
    let mut data = ResourceData::default().with_id("archiver");

    resource.read(&mut data).await.unwrap();

    let processors = data.get("processors").and_then(|p| p.as_list()).unwrap();
    let files = processors[0].as_map().unwrap();
    assert_eq!(files["type"], AttributeValue::from("files"));
    assert_eq!(files["forward"], AttributeValue::from("true"));
}

#[tokio::test]
async fn test_read_requires_id() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);

    let err = resource.read(&mut ResourceData::default()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Validation { .. }));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_update_same_name_issues_single_post() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);
    let mut data = ResourceData::new(JobAttributesBuilder::new("stable").build());
    resource.create(&mut data).await.unwrap();
    server.clear_requests();

    let planned = JobAttributesBuilder::new("stable")
        .with_command("echo updated")
        .build();
    resource.update(&mut data, planned).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].json()["executor_config"]["command"], "echo updated");
    assert_eq!(data.id(), Some("stable"));
    assert_eq!(data.get("command"), Some(&AttributeValue::from("echo updated")));
}

#[tokio::test]
async fn test_update_rename_deletes_then_creates() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);
    let mut data = ResourceData::new(JobAttributesBuilder::new("old-name").build());
    resource.create(&mut data).await.unwrap();
    server.clear_requests();

    let planned = JobAttributesBuilder::new("new-name").build();
    resource.update(&mut data, planned).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].path, "/v1/jobs/old-name");
    assert_eq!(requests[1].method, "POST");
    assert_eq!(requests[1].json()["name"], "new-name");

    assert_eq!(data.id(), Some("new-name"));
    assert!(server.stored_job("old-name").is_none());
    assert!(server.stored_job("new-name").is_some());
}

#[tokio::test]
async fn test_update_rename_surfaces_create_failure() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);
    let mut data = ResourceData::new(JobAttributesBuilder::new("before").build());
    resource.create(&mut data).await.unwrap();

    server.respond_to_create_with(500, "raft: leadership lost");
    let err = resource
        .update(&mut data, JobAttributesBuilder::new("after").build())
        .await
        .unwrap_err();

    match err {
        ProviderError::Remote { body, .. } => assert_eq!(body, "raft: leadership lost"),
        other => panic!("expected remote error, got {other:?}"),
    }
    assert!(data.id().is_none());
}

#[tokio::test]
async fn test_update_failure_keeps_applied_attributes() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);
    let mut data = ResourceData::new(JobAttributesBuilder::new("steady").build());
    resource.create(&mut data).await.unwrap();

    server.respond_to_create_with(500, "cluster unavailable");
    let planned = JobAttributesBuilder::new("steady")
        .with_command("echo changed")
        .build();
    let err = resource.update(&mut data, planned).await.unwrap_err();

    assert!(matches!(err, ProviderError::Remote { status: 500, .. }));
    assert_eq!(data.id(), Some("steady"));
    assert_eq!(data.get("command"), Some(&AttributeValue::from("echo hello")));
}

#[tokio::test]
async fn test_update_with_invalid_plan_touches_nothing() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);
    let mut data = ResourceData::new(JobAttributesBuilder::new("keep").build());
    resource.create(&mut data).await.unwrap();
    server.clear_requests();

    let planned = JobAttributesBuilder::new("renamed").without("tags").build();
    let err = resource.update(&mut data, planned).await.unwrap_err();

    assert!(matches!(err, ProviderError::Validation { .. }));
    assert!(server.requests().is_empty());
    assert_eq!(data.id(), Some("keep"));
}

#[tokio::test]
async fn test_delete_issues_single_delete_and_clears_id() {
    let server = MockDkronServer::spawn().await;
    let resource = resource_for(&server);
    let mut data = ResourceData::new(JobAttributesBuilder::new("doomed").build());
    resource.create(&mut data).await.unwrap();
    server.clear_requests();

    resource.delete(&mut data).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].path, "/v1/jobs/doomed");
    assert!(data.id().is_none());
    assert_eq!(server.job_count(), 0);
}

#[tokio::test]
async fn test_delete_ignores_remote_status() {
    let server = MockDkronServer::spawn().await;
    server.respond_to_delete_with(500);
    let resource = resource_for(&server);
    let mut data = ResourceData::default().with_id("stubborn");

    resource
        .delete(&mut data)
        .await
        .expect("status is not inspected");
    assert!(data.id().is_none());
    assert_eq!(server.requests_with_method("DELETE").len(), 1);
}

#[tokio::test]
async fn test_transport_failure() {
    init_test_logging();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let config = ProviderConfig::new(address).unwrap();
    let resource = JobResource::new(&config);

    let mut data = ResourceData::new(JobAttributesBuilder::new("offline").build());
    let err = resource.create(&mut data).await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)));
    assert!(err.is_retryable());

    let mut tracked = ResourceData::default().with_id("offline");
    assert!(matches!(
        resource.read(&mut tracked).await.unwrap_err(),
        ProviderError::Transport(_)
    ));
    assert!(matches!(
        resource.delete(&mut tracked).await.unwrap_err(),
        ProviderError::Transport(_)
    ));
    assert_eq!(tracked.id(), Some("offline"));
}

#[tokio::test]
async fn test_provider_registry_drives_full_lifecycle() {
    init_test_logging();
    let server = MockDkronServer::spawn().await;
    let provider = DkronProvider::new();

    let mut settings = dkron_domain::AttributeMap::new();
    settings.insert("host".to_string(), server.address().into());
    let config = provider.configure(&settings).unwrap();

    let resource = provider.resource("dkron_job", &config).unwrap();
    let mut data = ResourceData::new(full_job("lifecycle").build());

    resource.create(&mut data).await.unwrap();
    resource.read(&mut data).await.unwrap();
    resource
        .update(&mut data, full_job("lifecycle-v2").build())
        .await
        .unwrap();
    resource.delete(&mut data).await.unwrap();

    let methods: Vec<String> = server.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, vec!["POST", "GET", "DELETE", "POST", "DELETE"]);
    assert!(!data.is_tracked());
    assert_eq!(server.job_count(), 0);
}
