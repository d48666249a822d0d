//! HTTP handlers for `/projects/:project_slug/firehoses`.
//!
//! Project-scoped routes resolve the project named by the `X-Shield-Project`
//! header first, then re-read the firehose by URN, then act.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dex_firehose::alert::{self, Alert, Policy, SuppliedVariables};
use dex_firehose::{FirehoseConfigs, FirehoseDefinition, KIND_FIREHOSE, ProjectContext, mapper};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dispatch::{ActionDispatcher, resolve_firehose};
use crate::error::{ApiError, ApiResult};
use crate::logs;
use crate::state::AppState;

pub const HEADER_PROJECT_ID: &str = "x-shield-project";

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct UpdateRequestBody {
    configs: FirehoseConfigs,
}

type FirehosePath = Path<(String, String)>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_slug/firehoses",
            get(list_firehoses).post(create_firehose),
        )
        .route(
            "/projects/:project_slug/firehoses/:urn",
            get(get_firehose)
                .put(update_firehose)
                .delete(delete_firehose),
        )
        .route("/projects/:project_slug/firehoses/:urn/logs", get(firehose_logs))
        .route("/projects/:project_slug/firehoses/:urn/start", post(start_firehose))
        .route("/projects/:project_slug/firehoses/:urn/stop", post(stop_firehose))
        .route("/projects/:project_slug/firehoses/:urn/scale", post(scale_firehose))
        .route("/projects/:project_slug/firehoses/:urn/reset", post(reset_firehose))
        .route(
            "/projects/:project_slug/firehoses/:urn/upgrade",
            post(upgrade_firehose),
        )
        .route(
            "/projects/:project_slug/firehoses/:urn/alert-policy",
            get(get_alert_policy).put(upsert_alert_policy),
        )
        .route(
            "/projects/:project_slug/firehoses/:urn/alerts",
            get(list_alerts),
        )
}

async fn resolve_project(state: &AppState, headers: &HeaderMap) -> ApiResult<ProjectContext> {
    let id = headers
        .get(HEADER_PROJECT_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ApiError::invalid().with_cause(format!("missing {HEADER_PROJECT_ID} header"))
        })?;

    let project = state
        .projects
        .get_project(id)
        .await
        .map_err(ApiError::from_project_status)?;
    Ok(ProjectContext::from_proto(project))
}

/// Strict JSON decoding for bodies that carry data (an empty body is
/// rejected).
fn json_body<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(ApiError::invalid_body)
}

fn dispatcher(state: &AppState) -> ActionDispatcher<'_> {
    ActionDispatcher::new(
        state.resources.as_ref(),
        state.alerts.as_ref(),
        &state.settings.latest_version,
    )
}

async fn list_firehoses(
    State(state): State<AppState>,
    Path(project_slug): Path<String>,
) -> ApiResult<Json<ListResponse<FirehoseDefinition>>> {
    let resources = state
        .resources
        .list_resources(&project_slug, KIND_FIREHOSE)
        .await
        .map_err(ApiError::from_status)?;

    let items = resources
        .iter()
        .map(|res| mapper::from_resource(res, true))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(ListResponse { items }))
}

async fn create_firehose(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<FirehoseDefinition>)> {
    let project = resolve_project(&state, &headers).await?;
    let def: FirehoseDefinition = json_body(&body)?;

    let resource = mapper::to_resource(&def, &project)?;
    let created = state
        .resources
        .create_resource(resource)
        .await
        .map_err(ApiError::from_create_status)?;

    tracing::info!(urn = %created.urn, project = %project.slug, "firehose created");
    Ok((
        StatusCode::CREATED,
        Json(mapper::from_resource(&created, false)?),
    ))
}

async fn get_firehose(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
) -> ApiResult<Json<FirehoseDefinition>> {
    resolve_project(&state, &headers).await?;
    Ok(Json(resolve_firehose(state.resources.as_ref(), &urn).await?))
}

async fn update_firehose(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<FirehoseDefinition>> {
    let project = resolve_project(&state, &headers).await?;
    let current = resolve_firehose(state.resources.as_ref(), &urn).await?;
    let req: UpdateRequestBody = json_body(&body)?;

    let updated = dispatcher(&state)
        .update_configs(&urn, &current, &req.configs, &project)
        .await?;
    Ok(Json(updated))
}

async fn delete_firehose(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    resolve_project(&state, &headers).await?;
    resolve_firehose(state.resources.as_ref(), &urn).await?;

    state
        .resources
        .delete_resource(&urn)
        .await
        .map_err(ApiError::from_action_status)?;

    tracing::info!(urn = %urn, "firehose deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn firehose_logs(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    resolve_project(&state, &headers).await?;
    resolve_firehose(state.resources.as_ref(), &urn).await?;

    let filter = logs::collect_filters(&query, &state.settings.log_filter_keys);
    logs::open(state.resources.as_ref(), &urn, filter).await
}

async fn start_firehose(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<FirehoseDefinition>> {
    resolve_project(&state, &headers).await?;
    Ok(Json(dispatcher(&state).start(&urn, &body).await?))
}

async fn stop_firehose(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<FirehoseDefinition>> {
    let project = resolve_project(&state, &headers).await?;
    Ok(Json(dispatcher(&state).stop(&urn, &body, &project).await?))
}

async fn scale_firehose(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<FirehoseDefinition>> {
    resolve_project(&state, &headers).await?;
    Ok(Json(dispatcher(&state).scale(&urn, &body).await?))
}

async fn reset_firehose(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<FirehoseDefinition>> {
    resolve_project(&state, &headers).await?;
    Ok(Json(dispatcher(&state).reset(&urn, &body).await?))
}

async fn upgrade_firehose(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let project = resolve_project(&state, &headers).await?;
    match dispatcher(&state).upgrade(&urn, &project).await? {
        Some(def) => Ok(Json(def).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn get_alert_policy(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
) -> ApiResult<Json<Policy>> {
    let project = resolve_project(&state, &headers).await?;
    let def = resolve_firehose(state.resources.as_ref(), &urn).await?;
    let name = def.release_name()?;

    let mut policy = state.alerts.get_alert_policy(&project.slug, name).await?;
    policy.rules = alert::strip_supplied_variables(
        &policy.rules,
        state.settings.supplied_variable_names.as_slice(),
    );
    Ok(Json(policy))
}

async fn upsert_alert_policy(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Policy>> {
    let project = resolve_project(&state, &headers).await?;
    let def = resolve_firehose(state.resources.as_ref(), &urn).await?;
    let name = def.release_name()?;
    let entity = state.alerts.get_project_data_source(&project.slug).await?;

    let mut policy: Policy = json_body(&body)?;
    let supplied = SuppliedVariables {
        name: name.to_string(),
        team: def.team.clone(),
        entity,
    };
    policy.rules = alert::inject_supplied_variables(&policy.rules, &supplied.to_map());
    policy.resource = name.to_string();

    let mut saved = state.alerts.upsert_alert_policy(&project.slug, policy).await?;
    saved.rules = alert::strip_supplied_variables(
        &saved.rules,
        state.settings.supplied_variable_names.as_slice(),
    );
    Ok(Json(saved))
}

async fn list_alerts(
    State(state): State<AppState>,
    Path((_, urn)): FirehosePath,
    headers: HeaderMap,
) -> ApiResult<Json<ListResponse<Alert>>> {
    let project = resolve_project(&state, &headers).await?;
    let def = resolve_firehose(state.resources.as_ref(), &urn).await?;
    let name = def.release_name()?;

    let items = state.alerts.list_alerts(&project.slug, name).await?;
    Ok(Json(ListResponse { items }))
}
