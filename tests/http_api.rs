//! Identity HTTP endpoints

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use escar::common::{Config, IdentityConfig, Result, RetryPolicy};
use escar::coordinator::codec::instances_from_json;
use escar::coordinator::http::{create_router, IdentityState};
use escar::coordinator::{
    ClusterInstance, Directory, InstanceCoordinator, MemoryDirectory, NewInstance,
    StaticMembership,
};
use escar::Error;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Memory directory whose listings can be switched off after startup
#[derive(Default)]
struct SwitchableDirectory {
    inner: MemoryDirectory,
    offline: AtomicBool,
}

impl Directory for SwitchableDirectory {
    fn create(&self, instance: &NewInstance) -> Result<ClusterInstance> {
        self.inner.create(instance)
    }

    fn delete(&self, instance: &ClusterInstance) -> Result<()> {
        self.inner.delete(instance)
    }

    fn list_all(&self, cluster_name: &str) -> Result<Vec<ClusterInstance>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Directory("directory unreachable".into()));
        }
        self.inner.list_all(cluster_name)
    }
}

fn setup(asg: &str, dedicated: bool) -> (Router, Arc<SwitchableDirectory>) {
    let mut config = Config::new(IdentityConfig {
        app_name: "escar".into(),
        datacenter: "us-east-1".into(),
        instance_id: "i-003".into(),
        hostname: "ip-10-0-0-3".into(),
        host_ip: "10.0.0.3".into(),
        rack: "us-east-1a".into(),
        asg_name: asg.into(),
        ..Default::default()
    });
    config.identity.dedicated_deployment = dedicated;

    let directory = Arc::new(SwitchableDirectory::default());
    let coordinator = InstanceCoordinator::start_with_policy(
        directory.clone(),
        Arc::new(StaticMembership::new(["i-003"])),
        Arc::new(config),
        RetryPolicy::new(2, Duration::ZERO),
    )
    .unwrap();

    let router = create_router(IdentityState {
        coordinator: Arc::new(coordinator),
    });
    (router, directory)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_instance_endpoint() {
    let (router, _) = setup("escar-east-v001", false);

    let (status, body) = get(&router, "/v1/identity/instance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "us-east-1.i-003");
    assert_eq!(body["rack"], "us-east-1a");
}

#[tokio::test]
async fn test_instances_endpoint() {
    let (router, _) = setup("escar-east-v001", false);

    let (status, body) = get(&router, "/v1/identity/instances").await;
    assert_eq!(status, StatusCode::OK);

    let instances = instances_from_json(&body).unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].instance_id, "i-003");
    assert_eq!(instances[0].asg, "escar-east-v001");
}

#[tokio::test]
async fn test_instances_endpoint_reports_directory_failure() {
    let (router, directory) = setup("escar-east-v001", false);
    directory.offline.store(true, Ordering::SeqCst);

    let (status, body) = get(&router, "/v1/identity/instances").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("unreachable"));

    // The cached identity does not depend on the directory
    let (status, _) = get(&router, "/v1/identity/instance").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_master_endpoint() {
    let (router, _) = setup("escar-data-v001", true);
    let (_, body) = get(&router, "/v1/identity/master").await;
    assert_eq!(body["is_master"], false);
    assert_eq!(body["asg_name"], "escar-data-v001");
    assert_eq!(body["dedicated_deployment"], true);

    let (router, _) = setup("escar-Master-v001", true);
    let (_, body) = get(&router, "/v1/identity/master").await;
    assert_eq!(body["is_master"], true);

    let (router, _) = setup("escar-data-v001", false);
    let (_, body) = get(&router, "/v1/identity/master").await;
    assert_eq!(body["is_master"], true);
    assert_eq!(body["dedicated_deployment"], false);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (router, _) = setup("escar-east-v001", false);
    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["instance_id"], "i-003");
}
