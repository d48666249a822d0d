//! Lifecycle actions and the parameter shapes each one accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::structpb;

/// Actions dispatched through the orchestrator's `ApplyAction` RPC.
///
/// Upgrades are not in this list: they rewrite the spec through
/// `UpdateResource` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Scale,
    ResetOffset,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Scale => "scale",
            Action::ResetOffset => "reset",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter shapes that can be sent with an action.
pub trait ActionParams: Serialize {
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Validates and encodes the params as a structured value.
    fn encode(&self) -> Result<prost_types::Value> {
        self.validate()?;
        structpb::to_struct_value(self)
    }
}

/// Start and stop take no arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoParams {}

impl ActionParams for NoParams {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleParams {
    pub replicas: u32,
}

impl ActionParams for ScaleParams {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetTarget {
    #[serde(rename = "EARLIEST")]
    Earliest,
    #[serde(rename = "LATEST")]
    Latest,
    #[serde(rename = "DATETIME")]
    DateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetParams {
    pub to: ResetTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
}

impl ActionParams for ResetParams {
    fn validate(&self) -> Result<()> {
        if self.to == ResetTarget::DateTime && self.date_time.is_none() {
            return Err(Error::InvalidParams(
                "date_time is required when resetting to DATETIME".to_string(),
            ));
        }
        Ok(())
    }
}
