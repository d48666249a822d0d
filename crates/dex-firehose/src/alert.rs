//! Alert policies and the server-supplied rule variables.
//!
//! `name`, `team` and `entity` are computed by the server. They are removed
//! from every rule a client sends before the server values are appended, and
//! removed again from every rule handed back to a client.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SUPPLIED_VARIABLE_NAMES: [&str; 3] = ["name", "team", "entity"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub template: String,
    pub enabled: bool,
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub resource: String,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alert {
    pub id: u64,
    pub resource_name: String,
    pub metric_name: String,
    pub metric_value: String,
    pub severity: String,
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_at: Option<DateTime<Utc>>,
}

/// Values for the supplied variables of one firehose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppliedVariables {
    pub name: String,
    pub team: String,
    pub entity: String,
}

impl SuppliedVariables {
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("name".to_string(), self.name.clone()),
            ("team".to_string(), self.team.clone()),
            ("entity".to_string(), self.entity.clone()),
        ])
    }
}

/// Returns `rules` without any variable named in `keys`. Rule order and the
/// order of the remaining variables are kept.
pub fn strip_supplied_variables<S: AsRef<str>>(rules: &[Rule], keys: &[S]) -> Vec<Rule> {
    rules
        .iter()
        .map(|rule| Rule {
            variables: rule
                .variables
                .iter()
                .filter(|v| !keys.iter().any(|k| k.as_ref() == v.name))
                .cloned()
                .collect(),
            ..rule.clone()
        })
        .collect()
}

/// Strips the keys of `vars` from every rule, then appends one variable per
/// entry of `vars` in key order. Applying it twice gives the same rules as
/// applying it once.
pub fn inject_supplied_variables(rules: &[Rule], vars: &BTreeMap<String, String>) -> Vec<Rule> {
    let keys: Vec<&str> = vars.keys().map(String::as_str).collect();
    let supplied: Vec<Variable> = vars
        .iter()
        .map(|(name, value)| Variable {
            name: name.clone(),
            value: value.clone(),
        })
        .collect();

    strip_supplied_variables(rules, keys.as_slice())
        .into_iter()
        .map(|mut rule| {
            rule.variables.extend(supplied.iter().cloned());
            rule
        })
        .collect()
}
