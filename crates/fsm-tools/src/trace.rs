#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// What happened to the machine at a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TraceKind {
    Enter,
    Exit,
    Transition,
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Transition => "transition",
        })
    }
}

/// One recorded step of an instance.
///
/// States are stored by index into their definition so events stay plain data; tooling resolves
/// names against the definition when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub kind: TraceKind,
    /// Entered or exited state; the source state for transitions.
    pub state: u32,
    /// Destination state, only set for transitions.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub to: Option<u32>,
    /// Position of the taken transition in the definition's transition list.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub transition: Option<u32>,
    /// Raw selector of the instance that recorded the event.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub selector: Option<u64>,
}

impl TraceEvent {
    pub fn enter(tick: u64, state: u32) -> Self {
        Self::plain(tick, TraceKind::Enter, state)
    }

    pub fn exit(tick: u64, state: u32) -> Self {
        Self::plain(tick, TraceKind::Exit, state)
    }

    pub fn transition(tick: u64, transition: u32, from: u32, to: u32) -> Self {
        Self {
            to: Some(to),
            transition: Some(transition),
            ..Self::plain(tick, TraceKind::Transition, from)
        }
    }

    pub fn with_selector(mut self, selector: Option<u64>) -> Self {
        self.selector = selector;
        self
    }

    fn plain(tick: u64, kind: TraceKind, state: u32) -> Self {
        Self {
            tick,
            kind,
            state,
            to: None,
            transition: None,
            selector: None,
        }
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

impl<F: FnMut(TraceEvent)> TraceSink for F {
    fn emit(&mut self, event: TraceEvent) {
        self(event)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn of_kind(&self, kind: TraceKind) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Entered states in order, the initial state first.
    pub fn visited(&self) -> Vec<u32> {
        self.of_kind(TraceKind::Enter).map(|e| e.state).collect()
    }

    /// Events recorded by the instance carrying `selector`.
    pub fn for_selector(&self, selector: u64) -> TraceLog {
        TraceLog {
            events: self
                .events
                .iter()
                .filter(|e| e.selector == Some(selector))
                .copied()
                .collect(),
        }
    }
}

impl TraceSink for TraceLog {
    fn emit(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Trace log that stays readable while a clone of it is installed as a sink.
///
/// Several instances may share one log; their events interleave in emission order.
#[derive(Debug, Default, Clone)]
pub struct SharedTraceLog(Rc<RefCell<TraceLog>>);

impl SharedTraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TraceLog {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.0.borrow_mut().events.clear();
    }
}

impl TraceSink for SharedTraceLog {
    fn emit(&mut self, event: TraceEvent) {
        self.0.borrow_mut().push(event);
    }
}
