use std::any::{type_name, Any};
use std::fmt;

use crate::{EventError, Selector};

/// Untyped payload handed to data responses for the duration of one raise.
///
/// The channel does not know the payload's type; emitter and listener agree on it out of band.
/// Listeners go through [`Payload::downcast`], which reports a descriptive error instead of
/// misinterpreting the value.
#[derive(Clone, Copy)]
pub struct Payload<'a> {
    channel: &'a str,
    selector: Option<Selector>,
    value: &'a dyn Any,
}

impl<'a> Payload<'a> {
    pub(crate) fn new(channel: &'a str, selector: Option<Selector>, value: &'a dyn Any) -> Self {
        Self {
            channel,
            selector,
            value,
        }
    }

    /// Name of the channel that delivered this payload.
    pub fn channel(&self) -> &'a str {
        self.channel
    }

    /// Selector the raise was addressed to, if any.
    pub fn selector(&self) -> Option<Selector> {
        self.selector
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast<T: Any>(&self) -> Result<&'a T, EventError> {
        self.value
            .downcast_ref::<T>()
            .ok_or_else(|| EventError::PayloadType {
                channel: self.channel.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn value(&self) -> &'a dyn Any {
        self.value
    }
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("channel", &self.channel)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}
