//! Firehose <-> generic resource record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dex_proto::entropy_v1beta1::{Resource, ResourceDependency, ResourceSpec};

use crate::definition::{FirehoseConfigs, FirehoseDefinition, FirehoseState};
use crate::error::{Error, Result};
use crate::project::ProjectContext;
use crate::{KIND_FIREHOSE, structpb};

const LABEL_TITLE: &str = "title";
const LABEL_DESCRIPTION: &str = "description";
const LABEL_TEAM: &str = "team";

const DEPENDENCY_KUBE_CLUSTER: &str = "kube_cluster";

/// Builds the resource record for a new firehose.
///
/// Read-only fields of `def` (urn, team, timestamps, state) are ignored: the
/// orchestrator assigns the URN and the team comes from the project.
pub fn to_resource(def: &FirehoseDefinition, project: &ProjectContext) -> Result<Resource> {
    let configs = def.configs.clone().unwrap_or_default();

    let mut labels = HashMap::new();
    labels.insert(LABEL_TITLE.to_string(), def.title.clone());
    labels.insert(LABEL_DESCRIPTION.to_string(), def.description.clone());
    labels.insert(LABEL_TEAM.to_string(), project.team().to_string());

    Ok(Resource {
        urn: String::new(),
        kind: KIND_FIREHOSE.to_string(),
        name: def.name.clone(),
        project: project.slug.clone(),
        labels,
        created_at: None,
        updated_at: None,
        spec: Some(to_spec(&configs, &def.cluster, project)?),
        state: None,
    })
}

/// Builds the resource spec for `configs` running on `cluster`, falling back
/// to the project's default cluster when `cluster` is blank.
pub fn to_spec(
    configs: &FirehoseConfigs,
    cluster: &str,
    project: &ProjectContext,
) -> Result<ResourceSpec> {
    let cluster = match cluster.trim() {
        "" => project.default_cluster().unwrap_or_default(),
        c => c,
    };

    Ok(ResourceSpec {
        configs: Some(configs.to_config_value(project)?),
        dependencies: vec![ResourceDependency {
            key: DEPENDENCY_KUBE_CLUSTER.to_string(),
            value: cluster.to_string(),
        }],
    })
}

/// Projects a resource record onto the firehose view.
///
/// `list_view` leaves out `configs`; every other field is identical to the
/// single-item projection.
pub fn from_resource(res: &Resource, list_view: bool) -> Result<FirehoseDefinition> {
    if res.kind != KIND_FIREHOSE {
        return Err(Error::WrongKind(res.kind.clone()));
    }
    let spec = res.spec.as_ref().ok_or(Error::MissingSpec)?;

    let label = |key: &str| res.labels.get(key).cloned().unwrap_or_default();
    let cluster = spec
        .dependencies
        .iter()
        .find(|d| d.key == DEPENDENCY_KUBE_CLUSTER)
        .map(|d| d.value.clone())
        .unwrap_or_default();

    let configs = if list_view {
        None
    } else {
        let raw = spec
            .configs
            .as_ref()
            .ok_or_else(|| Error::Decode("resource spec has no configs".to_string()))?;
        Some(structpb::decode::<FirehoseConfigs>(raw)?)
    };

    Ok(FirehoseDefinition {
        urn: res.urn.clone(),
        name: res.name.clone(),
        title: label(LABEL_TITLE),
        description: label(LABEL_DESCRIPTION),
        cluster,
        team: label(LABEL_TEAM),
        created_at: res.created_at.as_ref().and_then(to_datetime),
        updated_at: res.updated_at.as_ref().and_then(to_datetime),
        configs,
        state: map_state(res)?,
    })
}

fn map_state(res: &Resource) -> Result<FirehoseState> {
    let Some(state) = &res.state else {
        return Ok(FirehoseState::default());
    };

    let output = match state.output.as_ref().map(structpb::from_value).transpose()? {
        None | Some(serde_json::Value::Null) => serde_json::Map::new(),
        Some(serde_json::Value::Object(m)) => m,
        Some(other) => {
            return Err(Error::Decode(format!(
                "state output must be an object, got {other}"
            )));
        }
    };

    Ok(FirehoseState {
        status: state.status().as_str_name().to_string(),
        reason: state.reason.clone(),
        output,
    })
}

fn to_datetime(ts: &prost_types::Timestamp) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(ts.nanos).ok()?;
    DateTime::from_timestamp(ts.seconds, nanos)
}
