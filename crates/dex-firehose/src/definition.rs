use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::project::ProjectContext;
use crate::structpb;
use crate::OUTPUT_RELEASE_NAME_KEY;

/// Env var firehose workers read their statsd tags from.
const ENV_METRIC_TAGS: &str = "METRIC_STATSD_TAGS";

fn default_replicas() -> u32 {
    1
}

/// Firehose as served over HTTP.
///
/// `urn`, `team`, `created_at` and `updated_at` are always taken from the
/// orchestrator; whatever a client sends for them is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirehoseDefinition {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub urn: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub cluster: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub team: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configs: Option<FirehoseConfigs>,
    pub state: FirehoseState,
}

/// Worker configuration. Keys other than the ones modelled here are owned
/// by the orchestrator and carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirehoseConfigs {
    #[serde(default)]
    pub version: String,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for FirehoseConfigs {
    fn default() -> Self {
        Self {
            version: String::new(),
            replicas: default_replicas(),
            env_vars: BTreeMap::new(),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirehoseState {
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
    pub output: serde_json::Map<String, serde_json::Value>,
}

impl FirehoseConfigs {
    /// Encodes the configs into the orchestrator's structured value,
    /// filling in project-derived env vars the client did not set.
    pub fn to_config_value(&self, project: &ProjectContext) -> Result<prost_types::Value> {
        let mut cfg = self.clone();
        cfg.env_vars
            .entry(ENV_METRIC_TAGS.to_string())
            .or_insert_with(|| format!("team={},project={}", project.team(), project.slug));
        structpb::to_struct_value(&cfg)
    }
}

impl FirehoseDefinition {
    /// Deployment name the orchestrator computed for this firehose.
    pub fn release_name(&self) -> Result<&str> {
        self.state
            .output
            .get(OUTPUT_RELEASE_NAME_KEY)
            .and_then(|v| v.as_str())
            .ok_or(Error::ReleaseName)
    }

    pub fn version(&self) -> &str {
        self.configs.as_ref().map(|c| c.version.as_str()).unwrap_or("")
    }
}
