use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use fsm_events::{Channel, DEFAULT_MAX_RAISE_DEPTH};

use crate::error::{DefinitionError, ParamError};
use crate::guard::{Guard, Operand};
use crate::param::{Param, ParamDecl, ParamId, ParamKind, ParamType, Trigger, Value};

/// Process-unique identity of a built (or building) definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefinitionId(u64);

impl DefinitionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId {
    definition: DefinitionId,
    index: u32,
}

impl StateId {
    pub fn definition(self) -> DefinitionId {
        self.definition
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// The three channels raised for a state.
#[derive(Debug, Clone)]
pub struct StateEvents {
    pub enter: Channel,
    pub update: Channel,
    pub exit: Channel,
}

impl StateEvents {
    /// Fresh channels named `<definition>.<state>.enter|update|exit`.
    pub fn new(definition: &str, state: &str) -> Self {
        Self::with_max_depth(definition, state, DEFAULT_MAX_RAISE_DEPTH)
    }

    pub fn with_max_depth(definition: &str, state: &str, max_depth: u32) -> Self {
        let channel = |kind: &str| {
            Channel::with_max_depth(format!("{definition}.{state}.{kind}"), max_depth)
        };
        Self {
            enter: channel("enter"),
            update: channel("update"),
            exit: channel("exit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Any state except the transition's own destination.
    Any,
    State(StateId),
}

impl From<StateId> for Source {
    fn from(state: StateId) -> Self {
        Source::State(state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The definition's initial state.
    Initial,
    State(StateId),
}

impl From<StateId> for Target {
    fn from(state: StateId) -> Self {
        Target::State(state)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    name: Option<String>,
    from: Source,
    to: Target,
    guards: Vec<Guard>,
    enabled: bool,
}

impl Transition {
    pub fn new(from: impl Into<Source>, to: impl Into<Target>) -> Self {
        Self {
            name: None,
            from: from.into(),
            to: to.into(),
            guards: Vec::new(),
            enabled: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a guard. All guards must hold for the transition to be taken.
    pub fn when(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    /// Keep the transition in the definition but never take it.
    pub fn disabled(self) -> Self {
        self.with_enabled(false)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn from(&self) -> Source {
        self.from
    }

    pub fn to(&self) -> Target {
        self.to
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug)]
pub struct State {
    name: String,
    events: StateEvents,
    /// Enabled transitions that can leave this state, in definition order.
    outgoing: Vec<usize>,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn events(&self) -> &StateEvents {
        &self.events
    }
}

/// Authoring-time findings that do not prevent a definition from running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lint {
    /// No chain of enabled transitions leads from the initial state here.
    Unreachable { state: String },
    /// No enabled transition leaves this state.
    DeadEnd { state: String },
    /// An earlier unguarded transition out of `state` always wins.
    Shadowed {
        state: String,
        transition: usize,
        by: usize,
    },
    Disabled { transition: usize },
}

impl Lint {
    /// Lints that almost always indicate an authoring mistake.
    pub fn is_suspicious(&self) -> bool {
        matches!(self, Lint::Unreachable { .. } | Lint::Shadowed { .. })
    }
}

impl fmt::Display for Lint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lint::Unreachable { state } => write!(f, "state `{state}` is unreachable"),
            Lint::DeadEnd { state } => write!(f, "state `{state}` has no way out"),
            Lint::Shadowed {
                state,
                transition,
                by,
            } => write!(
                f,
                "transition #{transition} can never leave `{state}`: unguarded transition #{by} comes first"
            ),
            Lint::Disabled { transition } => write!(f, "transition #{transition} is disabled"),
        }
    }
}

/// Immutable state graph plus parameter declarations, shared by every instance built from it.
#[derive(Debug)]
pub struct Definition {
    id: DefinitionId,
    name: String,
    params: Vec<ParamDecl>,
    param_index: BTreeMap<String, u32>,
    states: Vec<State>,
    state_index: BTreeMap<String, u32>,
    transitions: Vec<Transition>,
    initial: StateId,
}

impl Definition {
    pub fn builder(name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder::new(name)
    }

    pub fn id(&self) -> DefinitionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.states.len() as u32).map(|index| StateId {
            definition: self.id,
            index,
        })
    }

    /// Look a state up by name. Names are for binding only; use the returned id afterwards.
    pub fn state(&self, name: &str) -> Option<StateId> {
        self.state_index.get(name).map(|&index| StateId {
            definition: self.id,
            index,
        })
    }

    pub fn owns_state(&self, state: StateId) -> bool {
        state.definition == self.id && state.index() < self.states.len()
    }

    /// # Panics
    ///
    /// Panics if `state` belongs to another definition.
    pub fn state_data(&self, state: StateId) -> &State {
        &self.states[self.local(state)]
    }

    pub fn state_name(&self, state: StateId) -> &str {
        &self.state_data(state).name
    }

    /// Channels raised for `state`.
    ///
    /// # Panics
    ///
    /// Panics if `state` belongs to another definition.
    pub fn events_for(&self, state: StateId) -> &StateEvents {
        &self.state_data(state).events
    }

    /// Enabled transitions that can leave `state`, in evaluation order.
    ///
    /// Any-state transitions are included except those whose destination is `state` itself.
    pub fn transitions_from(&self, state: StateId) -> impl Iterator<Item = &Transition> + '_ {
        self.state_data(state)
            .outgoing
            .iter()
            .map(move |&i| &self.transitions[i])
    }

    /// Every authored transition, disabled ones included, in definition order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn resolve(&self, target: Target) -> StateId {
        match target {
            Target::Initial => self.initial,
            Target::State(state) => state,
        }
    }

    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    pub fn param_id(&self, name: &str) -> Option<ParamId> {
        self.param_index.get(name).map(|&index| ParamId {
            definition: self.id,
            index,
        })
    }

    /// Typed handle for the parameter called `name`.
    pub fn param<T: ParamType>(&self, name: &str) -> Result<Param<T>, ParamError> {
        let id = self.param_id(name).ok_or_else(|| ParamError::Unknown {
            definition: self.name.clone(),
            name: name.to_string(),
        })?;
        self.check_param(id, T::KIND)?;
        Ok(Param::from_id(id))
    }

    pub fn bool_param(&self, name: &str) -> Result<Param<bool>, ParamError> {
        self.param(name)
    }

    pub fn float_param(&self, name: &str) -> Result<Param<f32>, ParamError> {
        self.param(name)
    }

    pub fn trigger_param(&self, name: &str) -> Result<Param<Trigger>, ParamError> {
        self.param(name)
    }

    pub fn owns_param(&self, param: ParamId) -> bool {
        param.definition == self.id && param.index() < self.params.len()
    }

    pub fn param_decl(&self, param: ParamId) -> Option<&ParamDecl> {
        if self.owns_param(param) {
            self.params.get(param.index())
        } else {
            None
        }
    }

    pub(crate) fn check_param(&self, param: ParamId, expected: ParamKind) -> Result<usize, ParamError> {
        let decl = self.param_decl(param).ok_or_else(|| ParamError::Foreign {
            definition: self.name.clone(),
        })?;
        if decl.kind() != expected {
            return Err(ParamError::TypeMismatch {
                definition: self.name.clone(),
                param: decl.name.clone(),
                expected,
                actual: decl.kind(),
            });
        }
        Ok(param.index())
    }

    /// Human-readable form of a guard, e.g. `speed > 0.1`.
    pub fn describe(&self, guard: &Guard) -> String {
        let name = |id: ParamId| {
            self.param_decl(id)
                .map(|d| d.name.as_str())
                .unwrap_or("?")
                .to_string()
        };
        match *guard {
            Guard::Bool { param, equals } => format!("{} == {equals}", name(param)),
            Guard::Trigger { param } => format!("{} set", name(param)),
            Guard::Float { param, cmp, rhs } => match rhs {
                Operand::Const(c) => format!("{} {cmp} {c}", name(param)),
                Operand::Param(other) => format!("{} {cmp} {}", name(param), name(other)),
            },
        }
    }

    pub(crate) fn initial_values(&self) -> Vec<Value> {
        self.params.iter().map(|d| d.initial).collect()
    }

    /// First enabled transition out of `from` whose guards all hold, with its resolved
    /// destination.
    pub(crate) fn select(&self, from: StateId, values: &[Value]) -> Option<(usize, StateId)> {
        self.state_data(from)
            .outgoing
            .iter()
            .copied()
            .find(|&i| self.transitions[i].guards.iter().all(|g| g.holds(values)))
            .map(|i| (i, self.resolve(self.transitions[i].to)))
    }

    pub fn lints(&self) -> Vec<Lint> {
        let mut lints = Vec::new();

        let mut reached = vec![false; self.states.len()];
        let mut queue = VecDeque::from([self.initial.index()]);
        reached[self.initial.index()] = true;
        while let Some(state) = queue.pop_front() {
            for &i in &self.states[state].outgoing {
                let to = self.resolve(self.transitions[i].to).index();
                if !reached[to] {
                    reached[to] = true;
                    queue.push_back(to);
                }
            }
        }

        for (state, seen) in self.states.iter().zip(&reached) {
            if !seen {
                lints.push(Lint::Unreachable {
                    state: state.name.clone(),
                });
            }
            if state.outgoing.is_empty() {
                lints.push(Lint::DeadEnd {
                    state: state.name.clone(),
                });
            }
            if let Some(pos) = state
                .outgoing
                .iter()
                .position(|&i| self.transitions[i].guards.is_empty())
            {
                let by = state.outgoing[pos];
                for &transition in &state.outgoing[pos + 1..] {
                    lints.push(Lint::Shadowed {
                        state: state.name.clone(),
                        transition,
                        by,
                    });
                }
            }
        }

        for (transition, t) in self.transitions.iter().enumerate() {
            if !t.enabled {
                lints.push(Lint::Disabled { transition });
            }
        }
        lints
    }

    fn local(&self, state: StateId) -> usize {
        assert!(
            self.owns_state(state),
            "state {state:?} does not belong to definition `{}`",
            self.name
        );
        state.index()
    }
}

/// Collects parameters, states and transitions, then validates them in [`DefinitionBuilder::build`].
#[derive(Debug)]
pub struct DefinitionBuilder {
    id: DefinitionId,
    name: String,
    max_depth: u32,
    params: Vec<ParamDecl>,
    states: Vec<(String, Option<StateEvents>)>,
    transitions: Vec<Transition>,
    initial: Option<StateId>,
}

impl DefinitionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DefinitionId::next(),
            name: name.into(),
            max_depth: DEFAULT_MAX_RAISE_DEPTH,
            params: Vec::new(),
            states: Vec::new(),
            transitions: Vec::new(),
            initial: None,
        }
    }

    /// Raise-depth cap for the channels this builder creates.
    pub fn max_raise_depth(&mut self, max_depth: u32) -> &mut Self {
        self.max_depth = max_depth;
        self
    }

    /// Declare a parameter with an explicit initial value; its kind follows the value.
    pub fn param(&mut self, name: impl Into<String>, initial: Value) -> ParamId {
        let index = self.params.len() as u32;
        self.params.push(ParamDecl {
            name: name.into(),
            initial,
        });
        ParamId {
            definition: self.id,
            index,
        }
    }

    pub fn bool_param(&mut self, name: impl Into<String>) -> Param<bool> {
        self.bool_param_with(name, false)
    }

    pub fn bool_param_with(&mut self, name: impl Into<String>, initial: bool) -> Param<bool> {
        Param::from_id(self.param(name, Value::Bool(initial)))
    }

    pub fn float_param(&mut self, name: impl Into<String>) -> Param<f32> {
        self.float_param_with(name, 0.0)
    }

    pub fn float_param_with(&mut self, name: impl Into<String>, initial: f32) -> Param<f32> {
        Param::from_id(self.param(name, Value::Float(initial)))
    }

    pub fn trigger_param(&mut self, name: impl Into<String>) -> Param<Trigger> {
        Param::from_id(self.param(name, Value::Trigger(false)))
    }

    /// Declare a state with its own fresh enter/update/exit channels.
    pub fn state(&mut self, name: impl Into<String>) -> StateId {
        self.push_state(name.into(), None)
    }

    /// Declare a state raising existing (possibly shared) channels.
    pub fn state_with_events(&mut self, name: impl Into<String>, events: StateEvents) -> StateId {
        self.push_state(name.into(), Some(events))
    }

    fn push_state(&mut self, name: String, events: Option<StateEvents>) -> StateId {
        let index = self.states.len() as u32;
        self.states.push((name, events));
        StateId {
            definition: self.id,
            index,
        }
    }

    pub fn initial(&mut self, state: StateId) -> &mut Self {
        self.initial = Some(state);
        self
    }

    /// Append a transition. Earlier transitions take priority.
    pub fn transition(&mut self, transition: Transition) -> &mut Self {
        self.transitions.push(transition);
        self
    }

    pub fn build(self) -> Result<Definition, DefinitionError> {
        let DefinitionBuilder {
            id,
            name,
            max_depth,
            params,
            states,
            transitions,
            initial,
        } = self;

        if states.is_empty() {
            return Err(DefinitionError::NoStates(name));
        }

        let mut state_index = BTreeMap::new();
        for (index, (state, _)) in states.iter().enumerate() {
            if state_index.insert(state.clone(), index as u32).is_some() {
                return Err(DefinitionError::DuplicateState {
                    definition: name,
                    name: state.clone(),
                });
            }
        }

        let mut param_index = BTreeMap::new();
        for (index, decl) in params.iter().enumerate() {
            if param_index.insert(decl.name.clone(), index as u32).is_some() {
                return Err(DefinitionError::DuplicateParameter {
                    definition: name,
                    name: decl.name.clone(),
                });
            }
        }

        let owns_state = |state: StateId| state.definition == id && state.index() < states.len();
        let foreign = |what| DefinitionError::ForeignHandle {
            definition: name.clone(),
            what,
        };

        let initial = initial.ok_or_else(|| DefinitionError::MissingInitialState(name.clone()))?;
        if !owns_state(initial) {
            return Err(foreign("initial state"));
        }

        let param_kind = |param: ParamId| -> Result<ParamKind, DefinitionError> {
            if param.definition != id {
                return Err(foreign("guard parameter"));
            }
            params
                .get(param.index())
                .map(ParamDecl::kind)
                .ok_or_else(|| foreign("guard parameter"))
        };
        let expect_kind = |param: ParamId, expected: ParamKind| -> Result<(), DefinitionError> {
            let actual = param_kind(param)?;
            if actual != expected {
                return Err(DefinitionError::GuardTypeMismatch {
                    param: params[param.index()].name.clone(),
                    expected,
                    actual,
                });
            }
            Ok(())
        };

        for transition in &transitions {
            if let Source::State(from) = transition.from {
                if !owns_state(from) {
                    return Err(foreign("transition source"));
                }
            }
            if let Target::State(to) = transition.to {
                if !owns_state(to) {
                    return Err(foreign("transition destination"));
                }
            }
            for guard in &transition.guards {
                match *guard {
                    Guard::Bool { param, .. } => expect_kind(param, ParamKind::Bool)?,
                    Guard::Trigger { param } => expect_kind(param, ParamKind::Trigger)?,
                    Guard::Float { param, rhs, .. } => {
                        expect_kind(param, ParamKind::Float)?;
                        match rhs {
                            Operand::Param(other) => expect_kind(other, ParamKind::Float)?,
                            Operand::Const(c) if !c.is_finite() => {
                                return Err(DefinitionError::NonFiniteThreshold {
                                    param: params[param.index()].name.clone(),
                                });
                            }
                            Operand::Const(_) => {}
                        }
                    }
                }
            }
        }

        let resolve = |target: Target| match target {
            Target::Initial => initial,
            Target::State(state) => state,
        };
        let states = states
            .into_iter()
            .enumerate()
            .map(|(index, (state_name, events))| {
                let here = StateId {
                    definition: id,
                    index: index as u32,
                };
                let outgoing = transitions
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.enabled)
                    .filter(|(_, t)| match t.from {
                        Source::State(from) => from == here,
                        Source::Any => resolve(t.to) != here,
                    })
                    .map(|(i, _)| i)
                    .collect();
                let events = events
                    .unwrap_or_else(|| StateEvents::with_max_depth(&name, &state_name, max_depth));
                State {
                    name: state_name,
                    events,
                    outgoing,
                }
            })
            .collect();

        let definition = Definition {
            id,
            name,
            params,
            param_index,
            states,
            state_index,
            transitions,
            initial,
        };

        for lint in definition.lints() {
            if lint.is_suspicious() {
                tracing::warn!(definition = %definition.name, %lint, "definition lint");
            } else {
                tracing::debug!(definition = %definition.name, %lint, "definition lint");
            }
        }
        tracing::debug!(
            definition = %definition.name,
            states = definition.states.len(),
            params = definition.params.len(),
            transitions = definition.transitions.len(),
            "definition built"
        );
        Ok(definition)
    }
}
