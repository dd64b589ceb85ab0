use crate::{Channel, Response, Selector, SubscriptionId};

#[derive(Debug, Clone)]
struct Binding {
    channel: Channel,
    selector: Option<Selector>,
    response: Response,
}

/// Per-owner table of (channel, response) bindings, registered and unregistered as a unit.
///
/// Intended to be driven from an owner's activate/deactivate hooks. Both operations are
/// idempotent: a redundant call logs a warning and does nothing, so a binding is never
/// subscribed twice. Dropping a registered table unregisters it.
#[derive(Debug, Default)]
pub struct Responses {
    plain: Vec<Binding>,
    selective: Vec<Binding>,
    active: Vec<(Channel, SubscriptionId)>,
    registered: bool,
}

impl Responses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the responses that fire on every raise of their channel.
    ///
    /// Nothing is subscribed until [`Responses::register`] is called. If the table is already
    /// registered the new set takes effect immediately.
    pub fn set_responses<I>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (Channel, Response)>,
    {
        let plain: Vec<Binding> = bindings
            .into_iter()
            .map(|(channel, response)| Binding {
                channel,
                selector: None,
                response,
            })
            .collect();
        self.replace(|table| table.plain = plain);
    }

    /// Replace the responses that only fire when a raise is addressed to `selector`.
    pub fn set_selective_responses<I>(&mut self, selector: Selector, bindings: I)
    where
        I: IntoIterator<Item = (Channel, Response)>,
    {
        let selective: Vec<Binding> = bindings
            .into_iter()
            .map(|(channel, response)| Binding {
                channel,
                selector: Some(selector),
                response,
            })
            .collect();
        self.replace(|table| table.selective = selective);
    }

    fn replace(&mut self, f: impl FnOnce(&mut Self)) {
        let was_registered = self.registered;
        if was_registered {
            tracing::warn!("replacing responses while registered; re-registering");
            self.unregister();
        }
        f(self);
        if was_registered {
            self.register();
        }
    }

    pub fn register(&mut self) {
        if self.registered {
            tracing::warn!(bindings = self.len(), "responses already registered");
            return;
        }
        self.registered = true;

        for binding in self.plain.iter().chain(self.selective.iter()) {
            let id = binding
                .channel
                .subscribe_response(binding.selector, binding.response.clone());
            self.active.push((binding.channel.clone(), id));
        }
        tracing::trace!(subscriptions = self.active.len(), "responses registered");
    }

    pub fn unregister(&mut self) {
        if !self.registered {
            tracing::warn!(bindings = self.len(), "responses not registered");
            return;
        }
        self.registered = false;

        for (channel, id) in self.active.drain(..) {
            channel.unsubscribe(id);
        }
        tracing::trace!("responses unregistered");
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Number of bindings (plain and selective) held by the table.
    pub fn len(&self) -> usize {
        self.plain.len() + self.selective.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for Responses {
    fn drop(&mut self) {
        if self.registered {
            self.unregister();
        }
    }
}
