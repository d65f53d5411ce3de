//! The event bus (C2): an append-only table of handlers dispatched in
//! registration order, keyed by [`EventTag`].
//!
//! Grounded in the teacher's hooks-as-trait-objects pattern (`core::hooks`):
//! handlers are boxed trait objects registered once at startup and run
//! in-place rather than through a dynamic subscribe/unsubscribe API, since
//! the spec's component table wires up a fixed set of engines per tag.

use std::collections::HashMap;

use crate::x::{EventTag, XConn, XEvent};
use crate::Result;

/// A handler invoked for every [`XEvent`] whose tag it registered for.
///
/// Returning `Err` aborts dispatch for the *current* event only; the event
/// loop logs it and continues (spec §7: no single handler failure may stop
/// the loop).
pub trait Handler<X: XConn> {
    fn handle(&mut self, conn: &X, event: &XEvent) -> Result<()>;
}

impl<X: XConn, F> Handler<X> for F
where
    F: FnMut(&X, &XEvent) -> Result<()>,
{
    fn handle(&mut self, conn: &X, event: &XEvent) -> Result<()> {
        self(conn, event)
    }
}

/// The dispatch table. Handlers for a tag run in the order they were
/// registered.
pub struct EventBus<X: XConn> {
    handlers: HashMap<EventTag, Vec<Box<dyn Handler<X>>>>,
}

impl<X: XConn> Default for EventBus<X> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<X: XConn> EventBus<X> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` to run for every event tagged `tag`, after any
    /// handler already registered for that tag.
    pub fn on(&mut self, tag: EventTag, handler: impl Handler<X> + 'static) {
        self.handlers.entry(tag).or_default().push(Box::new(handler));
    }

    /// Run every handler registered for `event`'s tag, in registration
    /// order. A handler's error is logged and does not block later
    /// handlers from running.
    pub fn dispatch(&mut self, conn: &X, event: &XEvent) {
        let tag = event.tag();
        let Some(handlers) = self.handlers.get_mut(&tag) else {
            return;
        };
        for handler in handlers.iter_mut() {
            if let Err(err) = handler.handle(conn, event) {
                tracing::warn!(?tag, %err, "event handler failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::Xid;
    use crate::x::mock::StubXConn;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn handlers_run_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus: EventBus<StubXConn> = EventBus::new();

        let o1 = order.clone();
        bus.on(EventTag::MapRequest, move |_: &StubXConn, _: &XEvent| {
            o1.borrow_mut().push(1);
            Ok(())
        });
        let o2 = order.clone();
        bus.on(EventTag::MapRequest, move |_: &StubXConn, _: &XEvent| {
            o2.borrow_mut().push(2);
            Ok(())
        });

        bus.dispatch(&StubXConn, &XEvent::MapRequest { window: Xid(1) });
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn handler_error_does_not_block_later_handlers() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus: EventBus<StubXConn> = EventBus::new();

        bus.on(EventTag::DestroyNotify, |_: &StubXConn, _: &XEvent| {
            Err(crate::Error::Fatal("boom".into()))
        });
        let o2 = order.clone();
        bus.on(EventTag::DestroyNotify, move |_: &StubXConn, _: &XEvent| {
            o2.borrow_mut().push(2);
            Ok(())
        });

        bus.dispatch(&StubXConn, &XEvent::DestroyNotify { window: Xid(1) });
        assert_eq!(*order.borrow(), vec![2]);
    }

    #[test]
    fn untagged_event_is_a_noop() {
        let mut bus: EventBus<StubXConn> = EventBus::new();
        bus.dispatch(&StubXConn, &XEvent::Update);
    }
}
