//! Tick tracing for state machine debugging.
//!
//! Instances record enter, exit and transition events into a [`TraceSink`]; [`TraceLog`] keeps
//! them as plain data so tooling can render or serialize them later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{SharedTraceLog, TraceEvent, TraceKind, TraceLog, TraceSink};
