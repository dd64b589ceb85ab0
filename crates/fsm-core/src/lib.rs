//! Parameterized finite state machines whose states raise event channels.
//!
//! A [`Definition`] is an immutable graph of states, guarded transitions and typed parameters,
//! built once (with [`DefinitionBuilder`] or from config) and shared by any number of
//! [`Instance`]s. Each instance holds its current state and parameter values; collaborators
//! write parameters, call [`Instance::update`] once per tick, and react to the enter/update/exit
//! channels of the states through `fsm_events` response tables.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod bridge;
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub mod config;
pub mod definition;
pub mod error;
pub mod guard;
pub mod instance;
pub mod param;
pub mod parameters;

pub use bridge::{BoolWhileInStates, SetBoolOnEvent};
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub use config::{ConfigError, DefinitionConfig};
pub use definition::{
    Definition, DefinitionBuilder, DefinitionId, Lint, Source, State, StateEvents, StateId, Target,
    Transition,
};
pub use error::{DefinitionError, ParamError};
pub use guard::{Comparison, Guard, Operand};
pub use instance::{Instance, InstanceOptions, Step};
pub use param::{Param, ParamDecl, ParamId, ParamKind, ParamType, Trigger, Value};
pub use parameters::Parameters;
