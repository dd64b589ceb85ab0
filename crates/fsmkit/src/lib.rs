//! Umbrella crate that re-exports the `fsm-*` building blocks.
//!
//! Most users only need the [`prelude`]: build a definition, spawn instances, bind behaviour
//! to state channels with response tables, and couple machines with bridges.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "events")]
#[cfg_attr(docsrs, doc(cfg(feature = "events")))]
pub use fsm_events as events;

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use fsm_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use fsm_tools as tools;

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub mod prelude {
    pub use fsm_core::{
        BoolWhileInStates, Definition, DefinitionBuilder, Instance, InstanceOptions, Param,
        Parameters, SetBoolOnEvent, Source, StateId, Target, Transition, Trigger,
    };
    pub use fsm_events::{Channel, ChannelRegistry, Response, Responses, Selector};
    pub use fsm_tools::{SharedTraceLog, TraceKind, TraceLog};

    #[cfg(feature = "serde")]
    pub use fsm_core::DefinitionConfig;
}
