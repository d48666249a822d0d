//! Lifecycle transitions of a firehose.
//!
//! Every transition re-reads the resource first so that actions are never
//! sent to a URN that is missing or belongs to another kind of resource.

use std::collections::HashMap;

use dex_firehose::action::{Action, ActionParams, NoParams, ResetParams, ScaleParams};
use dex_firehose::alert::Policy;
use dex_firehose::{FirehoseConfigs, FirehoseDefinition, KIND_FIREHOSE, ProjectContext, mapper};
use dex_proto::entropy_v1beta1::{ApplyActionRequest, UpdateResourceRequest};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};
use crate::orchestrator::ResourceService;
use crate::siren::AlertService;

/// Decodes a JSON request body; an empty body reads as `{}`.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(ApiError::invalid_body)
}

/// Looks up `urn` and checks it is a firehose.
pub async fn resolve_firehose(
    resources: &dyn ResourceService,
    urn: &str,
) -> ApiResult<FirehoseDefinition> {
    let res = resources
        .get_resource(urn)
        .await
        .map_err(|status| match status.code() {
            tonic::Code::NotFound => ApiError::firehose_not_found().with_cause(status.message()),
            _ => ApiError::from_status(status),
        })?;
    if res.kind != KIND_FIREHOSE {
        return Err(ApiError::firehose_not_found());
    }
    Ok(mapper::from_resource(&res, false)?)
}

pub struct ActionDispatcher<'a> {
    resources: &'a dyn ResourceService,
    alerts: &'a dyn AlertService,
    latest_version: &'a str,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(
        resources: &'a dyn ResourceService,
        alerts: &'a dyn AlertService,
        latest_version: &'a str,
    ) -> Self {
        Self {
            resources,
            alerts,
            latest_version,
        }
    }

    pub async fn start(&self, urn: &str, body: &[u8]) -> ApiResult<FirehoseDefinition> {
        self.transition::<NoParams>(urn, Action::Start, body).await
    }

    /// Stops the firehose and then replaces its alert policy with an empty
    /// one. If the second step fails the firehose stays stopped and the
    /// error is returned.
    pub async fn stop(
        &self,
        urn: &str,
        body: &[u8],
        project: &ProjectContext,
    ) -> ApiResult<FirehoseDefinition> {
        let def = self.transition::<NoParams>(urn, Action::Stop, body).await?;

        if let Err(err) = self.suppress_alerts(&def, project).await {
            tracing::error!(urn, error = %err, "firehose stopped but alert suppression failed");
            return Err(err);
        }
        Ok(def)
    }

    pub async fn scale(&self, urn: &str, body: &[u8]) -> ApiResult<FirehoseDefinition> {
        self.transition::<ScaleParams>(urn, Action::Scale, body).await
    }

    pub async fn reset(&self, urn: &str, body: &[u8]) -> ApiResult<FirehoseDefinition> {
        self.transition::<ResetParams>(urn, Action::ResetOffset, body)
            .await
    }

    /// Moves the firehose to the configured latest version. Returns `None`
    /// without touching the orchestrator when it already runs that version.
    pub async fn upgrade(
        &self,
        urn: &str,
        project: &ProjectContext,
    ) -> ApiResult<Option<FirehoseDefinition>> {
        let current = resolve_firehose(self.resources, urn).await?;
        if current.version() == self.latest_version {
            return Ok(None);
        }

        let mut configs = current.configs.clone().unwrap_or_default();
        configs.version = self.latest_version.to_string();
        let updated = self
            .update_configs(urn, &current, &configs, project)
            .await?;
        Ok(Some(updated))
    }

    /// Replaces the configs of an already resolved firehose.
    pub async fn update_configs(
        &self,
        urn: &str,
        current: &FirehoseDefinition,
        configs: &FirehoseConfigs,
        project: &ProjectContext,
    ) -> ApiResult<FirehoseDefinition> {
        let req = UpdateResourceRequest {
            urn: urn.to_string(),
            new_spec: Some(mapper::to_spec(configs, &current.cluster, project)?),
            labels: HashMap::new(),
        };

        let res = self
            .resources
            .update_resource(req)
            .await
            .map_err(ApiError::from_action_status)?;
        Ok(mapper::from_resource(&res, false)?)
    }

    async fn transition<P>(
        &self,
        urn: &str,
        action: Action,
        body: &[u8],
    ) -> ApiResult<FirehoseDefinition>
    where
        P: ActionParams + DeserializeOwned,
    {
        resolve_firehose(self.resources, urn).await?;
        let params: P = decode_body(body)?;
        self.apply(urn, action, &params).await
    }

    async fn apply<P: ActionParams>(
        &self,
        urn: &str,
        action: Action,
        params: &P,
    ) -> ApiResult<FirehoseDefinition> {
        let req = ApplyActionRequest {
            urn: urn.to_string(),
            action: action.as_str().to_string(),
            params: Some(params.encode()?),
            labels: HashMap::new(),
        };

        tracing::info!(urn, %action, "applying firehose action");
        let res = self
            .resources
            .apply_action(req)
            .await
            .map_err(ApiError::from_action_status)?;
        Ok(mapper::from_resource(&res, false)?)
    }

    async fn suppress_alerts(
        &self,
        def: &FirehoseDefinition,
        project: &ProjectContext,
    ) -> ApiResult<()> {
        let policy = Policy {
            resource: def.release_name()?.to_string(),
            rules: Vec::new(),
        };
        self.alerts
            .upsert_alert_policy(&project.slug, policy)
            .await?;
        Ok(())
    }
}
