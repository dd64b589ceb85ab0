use std::fmt;
use std::rc::Rc;

use fsm_events::{Channel, Selector};
use fsm_tools::{TraceEvent, TraceSink};

use crate::definition::{Definition, StateId};
use crate::error::ParamError;
use crate::guard::Guard;
use crate::param::{Param, ParamId, Trigger, Value};
use crate::parameters::Parameters;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceOptions {
    /// Attached to every raise so selective responses can tell instances apart.
    pub selector: Option<Selector>,
    /// Log each taken transition at `info` level.
    pub log_transitions: bool,
}

impl InstanceOptions {
    pub fn selector(mut self, selector: impl Into<Selector>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn log_transitions(mut self, on: bool) -> Self {
        self.log_transitions = on;
        self
    }
}

/// A transition taken by [`Instance::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub from: StateId,
    pub to: StateId,
    /// Index into [`Definition::transitions`].
    pub transition: usize,
}

/// One running state machine.
///
/// The initial state is entered when the instance is constructed. Every call to
/// [`Instance::update`] raises the current state's update event, then takes at most one
/// transition (exit of the old state, then enter of the new one).
pub struct Instance {
    definition: Rc<Definition>,
    params: Parameters,
    options: InstanceOptions,
    current: StateId,
    tick: u64,
    entered_at: u64,
    trace: Option<Box<dyn TraceSink>>,
}

impl Instance {
    pub fn new(definition: Rc<Definition>) -> Self {
        Self::with_options(definition, InstanceOptions::default())
    }

    pub fn with_selector(definition: Rc<Definition>, selector: impl Into<Selector>) -> Self {
        Self::with_options(definition, InstanceOptions::default().selector(selector))
    }

    pub fn with_options(definition: Rc<Definition>, options: InstanceOptions) -> Self {
        Self::build(definition, options, None)
    }

    /// Like [`Instance::with_options`], recording the initial enter into `sink` as well.
    pub fn traced(
        definition: Rc<Definition>,
        options: InstanceOptions,
        sink: Box<dyn TraceSink>,
    ) -> Self {
        Self::build(definition, options, Some(sink))
    }

    fn build(
        definition: Rc<Definition>,
        options: InstanceOptions,
        trace: Option<Box<dyn TraceSink>>,
    ) -> Self {
        let current = definition.initial_state();
        let mut instance = Self {
            params: Parameters::new(definition.clone()),
            definition,
            options,
            current,
            tick: 0,
            entered_at: 0,
            trace,
        };
        tracing::debug!(
            definition = %instance.definition.name(),
            state = %instance.current_state_name(),
            selector = ?instance.options.selector.map(Selector::id),
            "instance created"
        );
        instance.emit(TraceEvent::enter(0, current.index() as u32));
        let enter = instance.definition.events_for(current).enter.clone();
        instance.raise(&enter);
        instance
    }

    pub fn definition(&self) -> &Rc<Definition> {
        &self.definition
    }

    pub fn options(&self) -> InstanceOptions {
        self.options
    }

    pub fn selector(&self) -> Option<Selector> {
        self.options.selector
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn current_state_name(&self) -> &str {
        self.definition.state_name(self.current)
    }

    /// Number of completed `update()` calls.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Number of `update()` calls completed since the current state was entered.
    pub fn ticks_in_state(&self) -> u64 {
        self.tick - self.entered_at
    }

    /// Shared handle to this instance's parameter values.
    pub fn parameters(&self) -> Parameters {
        self.params.clone()
    }

    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.trace = sink;
    }

    pub fn set_bool(&self, param: Param<bool>, value: bool) -> Result<(), ParamError> {
        self.params.set_bool(param, value)
    }

    pub fn set_float(&self, param: Param<f32>, value: f32) -> Result<(), ParamError> {
        self.params.set_float(param, value)
    }

    pub fn set_trigger(&self, param: Param<Trigger>) -> Result<(), ParamError> {
        self.params.set_trigger(param)
    }

    pub fn set_value(&self, param: ParamId, value: Value) -> Result<(), ParamError> {
        self.params.set(param, value)
    }

    pub fn get_bool(&self, param: Param<bool>) -> Result<bool, ParamError> {
        self.params.get_bool(param)
    }

    pub fn get_float(&self, param: Param<f32>) -> Result<f32, ParamError> {
        self.params.get_float(param)
    }

    pub fn get_trigger(&self, param: Param<Trigger>) -> Result<bool, ParamError> {
        self.params.get_trigger(param)
    }

    pub fn get_value(&self, param: ParamId) -> Result<Value, ParamError> {
        self.params.get(param)
    }

    /// Advance one tick. Returns the transition taken, if any.
    ///
    /// The update event of the state current at the start of the tick is raised first, so
    /// parameter writes made by its callbacks are seen by this tick's transition check.
    pub fn update(&mut self) -> Option<Step> {
        let definition = self.definition.clone();
        let from = self.current;

        self.raise(&definition.events_for(from).update);

        let selected = self.params.with_values(|values| {
            let (transition, to) = definition.select(from, values)?;
            for guard in definition.transitions()[transition].guards() {
                if let Guard::Trigger { param } = *guard {
                    values[param.index()] = Value::Trigger(false);
                }
            }
            Some((transition, to))
        });

        let step = selected.map(|(transition, to)| {
            if self.options.log_transitions {
                tracing::info!(
                    definition = %definition.name(),
                    tick = self.tick,
                    from = %definition.state_name(from),
                    to = %definition.state_name(to),
                    "transition"
                );
            } else {
                tracing::debug!(
                    definition = %definition.name(),
                    tick = self.tick,
                    from = %definition.state_name(from),
                    to = %definition.state_name(to),
                    transition,
                    "transition"
                );
            }

            self.emit(TraceEvent::exit(self.tick, from.index() as u32));
            self.raise(&definition.events_for(from).exit);

            self.current = to;
            self.entered_at = self.tick + 1;
            self.emit(TraceEvent::transition(
                self.tick,
                transition as u32,
                from.index() as u32,
                to.index() as u32,
            ));

            self.emit(TraceEvent::enter(self.tick, to.index() as u32));
            self.raise(&definition.events_for(to).enter);

            Step {
                from,
                to,
                transition,
            }
        });

        self.tick += 1;
        step
    }

    fn raise(&self, channel: &Channel) {
        match self.options.selector {
            Some(selector) => channel.raise_for(selector),
            None => channel.raise(),
        }
    }

    fn emit(&mut self, event: TraceEvent) {
        let selector = self.options.selector.map(Selector::id);
        if let Some(sink) = self.trace.as_mut() {
            sink.emit(event.with_selector(selector));
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("definition", &self.definition.name())
            .field("state", &self.current_state_name())
            .field("tick", &self.tick)
            .field("selector", &self.options.selector)
            .field("params", &self.params)
            .finish()
    }
}
