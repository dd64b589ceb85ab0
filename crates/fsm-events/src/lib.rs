//! Synchronous publish/subscribe channels for single-threaded simulations.
//!
//! A [`Channel`] is a shared broadcast point: any number of callbacks subscribe to it and any
//! caller raises it. Raises carry an optional [`Selector`] so one channel can be shared by many
//! owners without cross-firing, and an optional untyped payload.
//!
//! [`Responses`] is the per-owner table used to register and unregister a whole set of
//! (channel, callback) bindings from activation/deactivation hooks.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod channel;
pub mod error;
pub mod payload;
pub mod registry;
pub mod responses;
pub mod selector;

pub use channel::{Channel, Event, Response, SubscriptionId, DEFAULT_MAX_RAISE_DEPTH};
pub use error::EventError;
pub use payload::Payload;
pub use registry::ChannelRegistry;
pub use responses::Responses;
pub use selector::Selector;
