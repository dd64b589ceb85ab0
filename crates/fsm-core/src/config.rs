//! Serialized definitions (YAML or JSON).
//!
//! ```yaml
//! name: drone_locomotion
//! initial: Idle
//! parameters:
//!   - { name: moving, type: bool }
//!   - { name: speed, type: float, initial: 0.0 }
//! states:
//!   - name: Idle
//!   - name: Moving
//!     update: shared.locomotion.update
//! transitions:
//!   - from: Idle
//!     to: Moving
//!     when:
//!       - { param: moving, equals: true }
//!       - { param: speed, op: ">", value: 0.1 }
//!   - from: "*"
//!     when: [{ param: moving, equals: false }]
//! ```
//!
//! `from: "*"` is an any-state transition; a missing `to` targets the initial state. Every
//! state channel is resolved through a [`ChannelRegistry`]: by the name given in the state's
//! `enter`/`update`/`exit` field, or `<definition>.<state>.<kind>` when absent.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fsm_events::ChannelRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::definition::{Definition, DefinitionBuilder, Source, StateEvents, StateId, Target, Transition};
use crate::error::DefinitionError;
use crate::guard::{Comparison, Guard, Operand};
use crate::param::{ParamId, ParamKind, Value};

/// `from` value meaning "any state".
pub const ANY_STATE: &str = "*";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML definition: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("initial value of `{param}` is not a {kind}")]
    InvalidInitial { param: String, kind: ParamKind },

    #[error("condition on `{param}` is invalid: {reason}")]
    InvalidCondition { param: String, reason: String },

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionConfig {
    pub name: String,
    pub initial: String,
    #[serde(default)]
    pub parameters: Vec<ParameterConfig>,
    pub states: Vec<StateConfig>,
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    /// Defaults to `false` / `0.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<InitialValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialValue {
    Bool(bool),
    Float(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<ConditionConfig>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

/// One guard. Bool: `equals` (default `true`). Trigger: no operands. Float: `op` plus exactly
/// one of `value` and `other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    pub param: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<Comparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

impl DefinitionConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load a `.json` file as JSON and anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Resolve every name to a handle once and build the definition.
    pub fn build(&self, channels: &mut ChannelRegistry) -> Result<Definition, ConfigError> {
        let mut builder = DefinitionBuilder::new(self.name.as_str());

        let mut params: BTreeMap<&str, (ParamId, ParamKind)> = BTreeMap::new();
        for p in &self.parameters {
            let initial = match (p.kind, p.initial) {
                (kind, None) => Value::default_for(kind),
                (ParamKind::Bool, Some(InitialValue::Bool(v))) => Value::Bool(v),
                (ParamKind::Trigger, Some(InitialValue::Bool(v))) => Value::Trigger(v),
                (ParamKind::Float, Some(InitialValue::Float(v))) => Value::Float(v),
                (kind, Some(_)) => {
                    return Err(ConfigError::InvalidInitial {
                        param: p.name.clone(),
                        kind,
                    })
                }
            };
            let id = builder.param(p.name.as_str(), initial);
            params.insert(p.name.as_str(), (id, p.kind));
        }

        let mut states: BTreeMap<&str, StateId> = BTreeMap::new();
        for s in &self.states {
            let mut channel = |explicit: &Option<String>, kind: &str| match explicit {
                Some(name) => channels.get_or_create(name),
                None => channels.get_or_create(&format!("{}.{}.{kind}", self.name, s.name)),
            };
            let events = StateEvents {
                enter: channel(&s.enter, "enter"),
                update: channel(&s.update, "update"),
                exit: channel(&s.exit, "exit"),
            };
            let id = builder.state_with_events(s.name.as_str(), events);
            states.insert(s.name.as_str(), id);
        }

        let state = |name: &str| {
            states
                .get(name)
                .copied()
                .ok_or_else(|| DefinitionError::UnknownState(name.to_string()))
        };

        builder.initial(state(&self.initial)?);

        for t in &self.transitions {
            let from = if t.from == ANY_STATE {
                Source::Any
            } else {
                Source::State(state(&t.from)?)
            };
            let to = match &t.to {
                Some(name) => Target::State(state(name)?),
                None => Target::Initial,
            };
            let mut transition = Transition::new(from, to).with_enabled(!t.disabled);
            if let Some(name) = &t.name {
                transition = transition.named(name.as_str());
            }
            for condition in &t.when {
                transition = transition.when(condition.to_guard(&params)?);
            }
            builder.transition(transition);
        }

        Ok(builder.build()?)
    }
}

impl ConditionConfig {
    fn to_guard(&self, params: &BTreeMap<&str, (ParamId, ParamKind)>) -> Result<Guard, ConfigError> {
        let lookup = |name: &str| {
            params
                .get(name)
                .copied()
                .ok_or_else(|| DefinitionError::UnknownParameter(name.to_string()))
        };
        let invalid = |reason: &str| ConfigError::InvalidCondition {
            param: self.param.clone(),
            reason: reason.to_string(),
        };
        let has_float_operands = self.op.is_some() || self.value.is_some() || self.other.is_some();

        let (param, kind) = lookup(&self.param)?;
        match kind {
            ParamKind::Bool => {
                if has_float_operands {
                    return Err(invalid("bool conditions only take `equals`"));
                }
                Ok(Guard::Bool {
                    param,
                    equals: self.equals.unwrap_or(true),
                })
            }
            ParamKind::Trigger => {
                if has_float_operands || self.equals.is_some() {
                    return Err(invalid("trigger conditions take no operands"));
                }
                Ok(Guard::Trigger { param })
            }
            ParamKind::Float => {
                if self.equals.is_some() {
                    return Err(invalid("float conditions take `op`, not `equals`"));
                }
                let cmp = self.op.ok_or_else(|| invalid("missing `op`"))?;
                let rhs = match (self.value, &self.other) {
                    (Some(value), None) => Operand::Const(value),
                    (None, Some(other)) => {
                        let (other_id, other_kind) = lookup(other)?;
                        if other_kind != ParamKind::Float {
                            return Err(DefinitionError::GuardTypeMismatch {
                                param: other.clone(),
                                expected: ParamKind::Float,
                                actual: other_kind,
                            }
                            .into());
                        }
                        Operand::Param(other_id)
                    }
                    _ => return Err(invalid("exactly one of `value` and `other` is required")),
                };
                Ok(Guard::Float { param, cmp, rhs })
            }
        }
    }
}
