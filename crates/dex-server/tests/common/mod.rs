//! In-memory backends that record every call, plus request helpers.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use dex_firehose::alert::{Alert, Policy};
use dex_firehose::{FirehoseConfigs, FirehoseDefinition, ProjectContext, mapper, structpb};
use dex_proto::entropy_v1beta1::resource_state::Status as ResourceStatus;
use dex_proto::entropy_v1beta1::{
    ApplyActionRequest, GetLogRequest, LogChunk, Resource, ResourceState, UpdateResourceRequest,
};
use dex_proto::shield_v1beta1::Project;
use dex_server::config::FirehoseSettings;
use dex_server::orchestrator::{LogStream, ResourceService};
use dex_server::shield::ProjectService;
use dex_server::siren::{AlertError, AlertService};
use dex_server::state::AppState;
use futures_util::StreamExt;
use serde_json::{Value, json};
use tonic::{Code, Status};
use tower::ServiceExt;

pub const PROJECT_ID: &str = "p-1";
pub const PROJECT_SLUG: &str = "pricing";
pub const LATEST_VERSION: &str = "0.8.0";
pub const URN: &str = "orn:entropy:firehose:pricing:booking";
pub const RELEASE_NAME: &str = "fh-booking";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List { project: String, kind: String },
    Get(String),
    Create(Resource),
    Update(UpdateResourceRequest),
    Delete(String),
    Apply(ApplyActionRequest),
    GetLog(GetLogRequest),
}

#[derive(Default)]
pub struct FakeResources {
    pub records: Mutex<HashMap<String, Resource>>,
    pub calls: Mutex<Vec<Call>>,
    pub create_error: Mutex<Option<(Code, String)>>,
    pub apply_error: Mutex<Option<(Code, String)>>,
    pub log_items: Mutex<Vec<Result<LogChunk, (Code, String)>>>,
}

impl FakeResources {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn insert(&self, res: Resource) {
        self.records.lock().unwrap().insert(res.urn.clone(), res);
    }

    fn lookup(&self, urn: &str) -> Result<Resource, Status> {
        self.records
            .lock()
            .unwrap()
            .get(urn)
            .cloned()
            .ok_or_else(|| Status::not_found(format!("resource {urn} not found")))
    }

    fn injected(slot: &Mutex<Option<(Code, String)>>) -> Option<Status> {
        slot.lock()
            .unwrap()
            .as_ref()
            .map(|(code, msg)| Status::new(*code, msg.clone()))
    }
}

#[tonic::async_trait]
impl ResourceService for FakeResources {
    async fn list_resources(&self, project: &str, kind: &str) -> Result<Vec<Resource>, Status> {
        self.record(Call::List {
            project: project.to_string(),
            kind: kind.to_string(),
        });
        let mut items: Vec<Resource> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.kind == kind && r.project == project)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.urn.cmp(&b.urn));
        Ok(items)
    }

    async fn get_resource(&self, urn: &str) -> Result<Resource, Status> {
        self.record(Call::Get(urn.to_string()));
        self.lookup(urn)
    }

    async fn create_resource(&self, mut resource: Resource) -> Result<Resource, Status> {
        self.record(Call::Create(resource.clone()));
        if let Some(status) = Self::injected(&self.create_error) {
            return Err(status);
        }
        resource.urn = format!(
            "orn:entropy:{}:{}:{}",
            resource.kind, resource.project, resource.name
        );
        resource.created_at = Some(prost_types::Timestamp {
            seconds: 1_700_000_000,
            nanos: 0,
        });
        resource.state = Some(state_with_release_name(ResourceStatus::Pending, None));
        self.insert(resource.clone());
        Ok(resource)
    }

    async fn update_resource(&self, req: UpdateResourceRequest) -> Result<Resource, Status> {
        self.record(Call::Update(req.clone()));
        let mut res = self.lookup(&req.urn)?;
        res.spec = req.new_spec;
        self.insert(res.clone());
        Ok(res)
    }

    async fn delete_resource(&self, urn: &str) -> Result<(), Status> {
        self.record(Call::Delete(urn.to_string()));
        self.records
            .lock()
            .unwrap()
            .remove(urn)
            .map(|_| ())
            .ok_or_else(|| Status::not_found("gone"))
    }

    async fn apply_action(&self, req: ApplyActionRequest) -> Result<Resource, Status> {
        self.record(Call::Apply(req.clone()));
        if let Some(status) = Self::injected(&self.apply_error) {
            return Err(status);
        }
        self.lookup(&req.urn)
    }

    async fn get_log(&self, req: GetLogRequest) -> Result<LogStream, Status> {
        self.record(Call::GetLog(req));
        let items: Vec<Result<LogChunk, Status>> = self
            .log_items
            .lock()
            .unwrap()
            .drain(..)
            .map(|item| item.map_err(|(code, msg)| Status::new(code, msg)))
            .collect();
        Ok(futures_util::stream::iter(items).boxed())
    }
}

#[derive(Default)]
pub struct FakeProjects {
    pub projects: Mutex<HashMap<String, Project>>,
    pub calls: Mutex<Vec<String>>,
}

#[tonic::async_trait]
impl ProjectService for FakeProjects {
    async fn get_project(&self, id: &str) -> Result<Project, Status> {
        self.calls.lock().unwrap().push(id.to_string());
        self.projects
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Status::not_found(format!("project {id} not found")))
    }
}

#[derive(Default)]
pub struct FakeAlerts {
    pub policies: Mutex<HashMap<(String, String), Policy>>,
    pub upserts: Mutex<Vec<(String, Policy)>>,
    pub alerts: Mutex<Vec<Alert>>,
    pub data_source: Mutex<String>,
    pub fail_upsert: Mutex<bool>,
}

impl FakeAlerts {
    pub fn upserts(&self) -> Vec<(String, Policy)> {
        self.upserts.lock().unwrap().clone()
    }
}

#[tonic::async_trait]
impl AlertService for FakeAlerts {
    async fn upsert_alert_policy(
        &self,
        project_slug: &str,
        policy: Policy,
    ) -> Result<Policy, AlertError> {
        self.upserts
            .lock()
            .unwrap()
            .push((project_slug.to_string(), policy.clone()));
        if *self.fail_upsert.lock().unwrap() {
            return Err(AlertError::Status {
                status: 503,
                body: "siren unavailable".to_string(),
            });
        }
        self.policies.lock().unwrap().insert(
            (project_slug.to_string(), policy.resource.clone()),
            policy.clone(),
        );
        Ok(policy)
    }

    async fn get_alert_policy(
        &self,
        project_slug: &str,
        resource: &str,
    ) -> Result<Policy, AlertError> {
        self.policies
            .lock()
            .unwrap()
            .get(&(project_slug.to_string(), resource.to_string()))
            .cloned()
            .ok_or_else(|| AlertError::NotFound(format!("no policy for {resource}")))
    }

    async fn list_alerts(
        &self,
        _project_slug: &str,
        resource: &str,
    ) -> Result<Vec<Alert>, AlertError> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.resource_name == resource)
            .cloned()
            .collect())
    }

    async fn get_project_data_source(&self, _project_slug: &str) -> Result<String, AlertError> {
        Ok(self.data_source.lock().unwrap().clone())
    }
}

pub fn state_with_release_name(status: ResourceStatus, release_name: Option<&str>) -> ResourceState {
    let output = match release_name {
        Some(name) => json!({ "release_name": name }),
        None => json!({}),
    };
    ResourceState {
        status: status as i32,
        output: Some(structpb::to_value(output).unwrap()),
        module_data: Vec::new(),
        reason: String::new(),
    }
}

pub fn project() -> Project {
    let metadata = structpb::to_struct_value(&json!({
        "team": "data-eng",
        "cluster": "orn:kube:default",
    }))
    .unwrap();
    let metadata = match metadata.kind {
        Some(prost_types::value::Kind::StructValue(s)) => Some(s),
        _ => None,
    };
    Project {
        id: PROJECT_ID.to_string(),
        name: "Pricing".to_string(),
        slug: PROJECT_SLUG.to_string(),
        metadata,
        ..Default::default()
    }
}

/// A running firehose at `version`, as the orchestrator would report it.
pub fn firehose_resource(urn: &str, version: &str, release_name: Option<&str>) -> Resource {
    let def = FirehoseDefinition {
        name: urn.rsplit(':').next().unwrap_or_default().to_string(),
        title: "Booking Ingester".to_string(),
        description: "booking events".to_string(),
        cluster: "orn:kube:c1".to_string(),
        configs: Some(FirehoseConfigs {
            version: version.to_string(),
            replicas: 1,
            env_vars: BTreeMap::from([("SINK_TYPE".to_string(), "log".to_string())]),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut res = mapper::to_resource(&def, &ProjectContext::from_proto(project())).unwrap();
    res.urn = urn.to_string();
    res.state = Some(state_with_release_name(ResourceStatus::Completed, release_name));
    res
}

pub struct Harness {
    pub app: Router,
    pub resources: Arc<FakeResources>,
    pub projects: Arc<FakeProjects>,
    pub alerts: Arc<FakeAlerts>,
}

impl Harness {
    pub fn new() -> Self {
        let resources = Arc::new(FakeResources::default());
        let projects = Arc::new(FakeProjects::default());
        let alerts = Arc::new(FakeAlerts::default());

        projects
            .projects
            .lock()
            .unwrap()
            .insert(PROJECT_ID.to_string(), project());
        *alerts.data_source.lock().unwrap() = "orn:siren:datasource:42".to_string();

        let state = AppState::new(
            resources.clone(),
            projects.clone(),
            alerts.clone(),
            FirehoseSettings::new(LATEST_VERSION),
        );
        Self {
            app: dex_server::router(state),
            resources,
            projects,
            alerts,
        }
    }

    /// Harness with one firehose at `URN` whose release name is known.
    pub fn with_firehose(version: &str) -> Self {
        let h = Self::new();
        h.resources
            .insert(firehose_resource(URN, version, Some(RELEASE_NAME)));
        h
    }

    pub async fn raw(&self, method: Method, uri: &str, body: Option<&str>) -> Response {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-Shield-Project", PROJECT_ID)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        self.app.clone().oneshot(req).await.unwrap()
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map(|b| b.to_string());
        let resp = self.raw(method, uri, body.as_deref()).await;
        read_json(resp).await
    }
}

pub async fn read_json(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub fn firehose_uri(suffix: &str) -> String {
    format!("/projects/{PROJECT_SLUG}/firehoses/{URN}{suffix}")
}
