//! Scripted simulation input.
//!
//! ```yaml
//! selector: 1
//! steps:
//!   - set: { moving: true, speed: 0.5 }
//!   - trigger: hit
//!   - tick: 3
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use fsm_core::{Definition, Instance, InstanceOptions, ParamKind, Value};
use fsm_events::{Channel, Response, Responses};
use fsm_tools::SharedTraceLog;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub selector: Option<u64>,
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStep {
    Set(BTreeMap<String, ScriptValue>),
    Trigger(String),
    Tick(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    Bool(bool),
    Float(f32),
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script from {}", path.display()))?;
        let script: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse script from {}", path.display()))?;
        Ok(script)
    }
}

/// Result of a simulation: printed event lines plus the instance trace.
#[derive(Debug)]
pub struct Simulation {
    pub lines: Vec<String>,
    pub trace: SharedTraceLog,
    pub final_state: String,
}

pub fn simulate(definition: Rc<Definition>, script: &Script) -> Result<Simulation> {
    let lines: Rc<RefCell<Vec<String>>> = Rc::default();
    let tick = Rc::new(Cell::new(0u64));
    let _listeners = listen(&definition, &lines, &tick);

    let mut options = InstanceOptions::default().log_transitions(true);
    if let Some(selector) = script.selector {
        options = options.selector(selector);
    }
    let trace = SharedTraceLog::new();
    let mut fsm = Instance::traced(definition.clone(), options, Box::new(trace.clone()));

    for step in &script.steps {
        match step {
            ScriptStep::Set(values) => {
                for (name, value) in values {
                    let id = definition
                        .param_id(name)
                        .with_context(|| format!("unknown parameter `{name}`"))?;
                    let kind = definition
                        .param_decl(id)
                        .map(|d| d.kind())
                        .with_context(|| format!("unknown parameter `{name}`"))?;
                    fsm.set_value(id, to_value(name, kind, *value)?)?;
                }
            }
            ScriptStep::Trigger(name) => {
                let param = definition.trigger_param(name)?;
                fsm.set_trigger(param)?;
            }
            ScriptStep::Tick(count) => {
                for _ in 0..*count {
                    tick.set(fsm.tick_count());
                    fsm.update();
                }
            }
        }
    }

    let lines = lines.borrow().clone();
    Ok(Simulation {
        lines,
        trace,
        final_state: fsm.current_state_name().to_string(),
    })
}

fn to_value(name: &str, kind: ParamKind, value: ScriptValue) -> Result<Value> {
    Ok(match (kind, value) {
        (ParamKind::Bool, ScriptValue::Bool(v)) => Value::Bool(v),
        (ParamKind::Trigger, ScriptValue::Bool(v)) => Value::Trigger(v),
        (ParamKind::Float, ScriptValue::Float(v)) => Value::Float(v),
        (kind, value) => bail!("parameter `{name}` is a {kind}; cannot set it to {value:?}"),
    })
}

/// Record every enter/update/exit raise of every state as `[tick N] kind State`.
fn listen(
    definition: &Definition,
    lines: &Rc<RefCell<Vec<String>>>,
    tick: &Rc<Cell<u64>>,
) -> Responses {
    let mut bindings: Vec<(Channel, Response)> = Vec::new();
    for state in definition.state_ids() {
        let events = definition.events_for(state);
        for (kind, channel) in [
            ("enter", &events.enter),
            ("update", &events.update),
            ("exit", &events.exit),
        ] {
            let (lines, tick) = (lines.clone(), tick.clone());
            let name = definition.state_name(state).to_string();
            bindings.push((
                channel.clone(),
                Response::signal(move || {
                    lines
                        .borrow_mut()
                        .push(format!("[tick {}] {kind} {name}", tick.get()));
                }),
            ));
        }
    }
    let mut responses = Responses::new();
    responses.set_responses(bindings);
    responses.register();
    responses
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsm_core::{DefinitionBuilder, Transition};

    fn door() -> Rc<Definition> {
        let mut b = DefinitionBuilder::new("door");
        let closed = b.state("Closed");
        let open = b.state("Open");
        let unlocked = b.bool_param("unlocked");
        let push = b.trigger_param("push");
        b.initial(closed)
            .transition(
                Transition::new(closed, open)
                    .when(unlocked.is(true))
                    .when(push.is_set()),
            )
            .transition(Transition::new(open, closed).when(push.is_set()));
        Rc::new(b.build().unwrap())
    }

    #[test]
    fn script_drives_the_instance() {
        let script: Script = serde_yaml::from_str(
            r#"
steps:
  - set: { unlocked: true }
  - trigger: push
  - tick: 2
"#,
        )
        .unwrap();

        let sim = simulate(door(), &script).unwrap();
        assert_eq!(sim.final_state, "Open");
        assert_eq!(
            sim.lines,
            vec![
                "[tick 0] enter Closed",
                "[tick 0] update Closed",
                "[tick 0] exit Closed",
                "[tick 0] enter Open",
                "[tick 1] update Open",
            ]
        );
        assert_eq!(sim.trace.len(), 4);
    }

    #[test]
    fn wrong_value_kind_is_an_error() {
        let script: Script = serde_yaml::from_str("steps: [{ set: { unlocked: 0.5 } }]").unwrap();
        let err = simulate(door(), &script).unwrap_err();
        assert!(err.to_string().contains("unlocked"), "{err}");
    }

    #[test]
    fn unknown_trigger_is_an_error() {
        let script: Script = serde_yaml::from_str("steps: [{ trigger: knock }]").unwrap();
        assert!(simulate(door(), &script).is_err());
    }
}
