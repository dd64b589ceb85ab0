//! Components that couple one state machine's activity to another's parameters.

use fsm_events::{Channel, Response, Responses, Selector};

use crate::definition::{Definition, StateId};
use crate::error::{DefinitionError, ParamError};
use crate::param::{Param, ParamKind};
use crate::parameters::Parameters;

/// Keeps a bool parameter of a target instance true while a source instance is in any of a set
/// of states, and false otherwise.
///
/// Entering one of the states writes `true`, exiting one writes `false`. Moving directly
/// between two of the states therefore ends on `true` (exit runs before enter). The target sees
/// the write on its next `update()`.
#[derive(Debug)]
pub struct BoolWhileInStates {
    param: Param<bool>,
    /// (enter, exit) channels of the true-in states.
    channels: Vec<(Channel, Channel)>,
    true_in: Vec<StateId>,
    target: Option<Parameters>,
    responses: Responses,
}

impl BoolWhileInStates {
    pub fn new(
        source: &Definition,
        true_in: impl IntoIterator<Item = StateId>,
        param: Param<bool>,
    ) -> Result<Self, DefinitionError> {
        let true_in: Vec<StateId> = true_in.into_iter().collect();
        let mut channels = Vec::with_capacity(true_in.len());
        for &state in &true_in {
            if !source.owns_state(state) {
                return Err(DefinitionError::ForeignHandle {
                    definition: source.name().to_string(),
                    what: "bridge state",
                });
            }
            let events = source.events_for(state);
            channels.push((events.enter.clone(), events.exit.clone()));
        }
        Ok(Self {
            param,
            channels,
            true_in,
            target: None,
            responses: Responses::new(),
        })
    }

    /// Bind the target parameters. With a selector, only raises addressed to it (the source
    /// instance's selector) are heard; otherwise every raise of the source states' channels is.
    ///
    /// Re-initializing replaces the previous binding; if registered, it stays registered.
    pub fn initialize(
        &mut self,
        target: Parameters,
        selector: Option<Selector>,
    ) -> Result<(), ParamError> {
        target.definition().check_param(self.param.id(), ParamKind::Bool)?;

        let param = self.param;
        let set = |value: bool| {
            let target = target.clone();
            Response::signal(move || {
                // Rejections are logged by `Parameters`.
                let _ = target.set_bool(param, value);
            })
        };
        let bindings: Vec<(Channel, Response)> = self
            .channels
            .iter()
            .map(|(enter, _)| (enter.clone(), set(true)))
            .chain(self.channels.iter().map(|(_, exit)| (exit.clone(), set(false))))
            .collect();

        let was_registered = self.responses.is_registered();
        if was_registered {
            self.responses.unregister();
        }
        let mut responses = Responses::new();
        match selector {
            Some(selector) => responses.set_selective_responses(selector, bindings),
            None => responses.set_responses(bindings),
        }
        if was_registered {
            responses.register();
        }
        self.responses = responses;
        self.target = Some(target);
        Ok(())
    }

    /// Write the value matching `state` right away, e.g. the source's current state when the
    /// bridge is wired after the source already entered it.
    pub fn sync(&self, state: StateId) -> Result<(), ParamError> {
        match &self.target {
            Some(target) => target.set_bool(self.param, self.true_in.contains(&state)),
            None => {
                tracing::warn!("bridge synced before initialize; ignoring");
                Ok(())
            }
        }
    }

    pub fn register(&mut self) {
        if self.target.is_none() {
            tracing::warn!("bridge registered before initialize; nothing to subscribe");
        }
        self.responses.register();
    }

    pub fn unregister(&mut self) {
        self.responses.unregister();
    }

    pub fn is_registered(&self) -> bool {
        self.responses.is_registered()
    }

    pub fn true_in(&self) -> &[StateId] {
        &self.true_in
    }
}

/// Writes a fixed value into a bool parameter whenever a channel is raised.
#[derive(Debug)]
pub struct SetBoolOnEvent {
    responses: Responses,
}

impl SetBoolOnEvent {
    pub fn new(
        event: Channel,
        target: Parameters,
        param: Param<bool>,
        value: bool,
    ) -> Result<Self, ParamError> {
        target.definition().check_param(param.id(), ParamKind::Bool)?;

        let mut responses = Responses::new();
        responses.set_responses([(
            event,
            Response::signal(move || {
                let _ = target.set_bool(param, value);
            }),
        )]);
        Ok(Self { responses })
    }

    pub fn register(&mut self) {
        self.responses.register();
    }

    pub fn unregister(&mut self) {
        self.responses.unregister();
    }

    pub fn is_registered(&self) -> bool {
        self.responses.is_registered()
    }
}
