use std::any::Any;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::{Payload, Selector};

/// Nesting limit for reentrant raises of one channel. Exceeding it means an event feeds back into
/// itself without terminating.
pub const DEFAULT_MAX_RAISE_DEPTH: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Callback bound to a channel.
///
/// `Signal` responses run on every raise they accept. `Data` responses only run on raises that
/// carry a payload.
#[derive(Clone)]
pub enum Response {
    Signal(Rc<dyn Fn()>),
    Data(Rc<dyn Fn(Payload<'_>)>),
}

impl Response {
    pub fn signal(f: impl Fn() + 'static) -> Self {
        Response::Signal(Rc::new(f))
    }

    pub fn data(f: impl Fn(Payload<'_>) + 'static) -> Self {
        Response::Data(Rc::new(f))
    }

    /// Data response for payloads of type `T`. Payloads of any other type are rejected with an
    /// error log and the callback is skipped.
    pub fn typed<T: Any>(f: impl Fn(&T) + 'static) -> Self {
        Response::data(move |payload| match payload.downcast::<T>() {
            Ok(value) => f(value),
            Err(err) => tracing::error!(error = %err, "payload rejected"),
        })
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Signal(_) => f.write_str("Response::Signal"),
            Response::Data(_) => f.write_str("Response::Data"),
        }
    }
}

/// Arguments of a single raise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Event<'a> {
    selector: Option<Selector>,
    payload: Option<&'a dyn Any>,
}

impl<'a> Event<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_selector(mut self, selector: Selector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_payload(mut self, payload: &'a dyn Any) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn selector(&self) -> Option<Selector> {
        self.selector
    }

    pub fn payload(&self) -> Option<&'a dyn Any> {
        self.payload
    }
}

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    selector: Option<Selector>,
    response: Response,
}

impl Subscriber {
    fn accepts(&self, event: &Event<'_>) -> bool {
        let addressed = match self.selector {
            None => true,
            Some(selector) => event.selector == Some(selector),
        };
        let kind = match self.response {
            Response::Signal(_) => true,
            Response::Data(_) => event.payload.is_some(),
        };
        addressed && kind
    }
}

enum PendingChange {
    Add(Subscriber),
    Remove(SubscriptionId),
}

struct ChannelInner {
    name: Cow<'static, str>,
    max_depth: u32,
    next_id: Cell<u64>,
    depth: Cell<u32>,
    subscribers: RefCell<Vec<Subscriber>>,
    pending: RefCell<Vec<PendingChange>>,
}

impl ChannelInner {
    fn apply(&self, change: PendingChange) {
        let mut subscribers = self.subscribers.borrow_mut();
        match change {
            PendingChange::Add(sub) => subscribers.push(sub),
            PendingChange::Remove(id) => subscribers.retain(|s| s.id != id),
        }
    }

    fn flush_pending(&self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        if !pending.is_empty() {
            tracing::trace!(channel = %self.name, changes = pending.len(), "applying deferred subscriber changes");
        }
        for change in pending {
            self.apply(change);
        }
    }
}

/// Restores the raise depth on exit (including unwinding) and applies subscriber changes that
/// were requested while the channel was dispatching.
struct DepthGuard<'a> {
    inner: &'a ChannelInner,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        let depth = self.inner.depth.get().saturating_sub(1);
        self.inner.depth.set(depth);
        if depth == 0 {
            self.inner.flush_pending();
        }
    }
}

/// Shared broadcast point. Cloning a `Channel` yields another handle to the same channel.
///
/// Delivery is synchronous and in subscription order. Each raise dispatches to a snapshot of the
/// subscribers taken when the raise starts; subscribe/unsubscribe calls made while the channel is
/// dispatching are deferred until the outermost raise returns.
#[derive(Clone)]
pub struct Channel {
    inner: Rc<ChannelInner>,
}

impl Channel {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_max_depth(name, DEFAULT_MAX_RAISE_DEPTH)
    }

    pub fn with_max_depth(name: impl Into<Cow<'static, str>>, max_depth: u32) -> Self {
        Self {
            inner: Rc::new(ChannelInner {
                name: name.into(),
                max_depth: max_depth.max(1),
                next_id: Cell::new(0),
                depth: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
                pending: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn max_depth(&self) -> u32 {
        self.inner.max_depth
    }

    /// `true` when both handles refer to the same channel.
    pub fn ptr_eq(&self, other: &Channel) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of active subscriptions (deferred changes are not counted until applied).
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    pub fn is_raising(&self) -> bool {
        self.inner.depth.get() > 0
    }

    pub fn subscribe(&self, f: impl Fn() + 'static) -> SubscriptionId {
        self.subscribe_response(None, Response::signal(f))
    }

    pub fn subscribe_data(&self, f: impl Fn(Payload<'_>) + 'static) -> SubscriptionId {
        self.subscribe_response(None, Response::data(f))
    }

    pub fn subscribe_typed<T: Any>(&self, f: impl Fn(&T) + 'static) -> SubscriptionId {
        self.subscribe_response(None, Response::typed(f))
    }

    /// Subscribe a response, optionally restricted to raises addressed to `selector`.
    pub fn subscribe_response(
        &self,
        selector: Option<Selector>,
        response: Response,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let sub = Subscriber {
            id,
            selector,
            response,
        };
        if self.is_raising() {
            tracing::debug!(channel = %self.name(), id = id.0, "subscribe deferred until raise completes");
            self.inner.pending.borrow_mut().push(PendingChange::Add(sub));
        } else {
            self.inner.apply(PendingChange::Add(sub));
        }
        id
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if self.is_raising() {
            tracing::debug!(channel = %self.name(), id = id.0, "unsubscribe deferred until raise completes");
            self.inner
                .pending
                .borrow_mut()
                .push(PendingChange::Remove(id));
        } else {
            self.inner.apply(PendingChange::Remove(id));
        }
    }

    pub fn raise(&self) {
        self.raise_event(Event::new());
    }

    pub fn raise_for(&self, selector: Selector) {
        self.raise_event(Event::new().for_selector(selector));
    }

    pub fn raise_with(&self, payload: &dyn Any) {
        self.raise_event(Event::new().with_payload(payload));
    }

    /// Deliver `event` to every accepting subscriber before returning.
    ///
    /// # Panics
    ///
    /// Panics when reentrant raises of this channel nest deeper than its maximum depth.
    pub fn raise_event(&self, event: Event<'_>) {
        let inner = &*self.inner;
        let depth = inner.depth.get();
        if depth >= inner.max_depth {
            panic!(
                "channel `{}` exceeded the maximum raise depth of {} (cyclic event feedback)",
                inner.name, inner.max_depth
            );
        }

        let snapshot: Vec<Subscriber> = inner
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.accepts(&event))
            .cloned()
            .collect();

        tracing::trace!(
            channel = %inner.name,
            depth,
            selector = ?event.selector.map(Selector::id),
            receivers = snapshot.len(),
            "raise"
        );

        inner.depth.set(depth + 1);
        let _guard = DepthGuard { inner };

        for sub in &snapshot {
            match &sub.response {
                Response::Signal(f) => f(),
                Response::Data(f) => {
                    if let Some(value) = event.payload {
                        f(Payload::new(&inner.name, event.selector, value));
                    }
                }
            }
        }
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Channel {}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
