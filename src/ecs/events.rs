//! Lifecycle notifications.
//!
//! A `World` reports every structural change to an optional `EventSink`.
//! Sinks are observers only, nothing in the registry depends on them for
//! correctness.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::component::ComponentTypeId;
use super::{EntityId, QueryId};
use crate::errors::Error;

/// One structural change of a `World`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    EntityCreated(EntityId),
    EntityDestroyed(EntityId),
    ComponentAdded {
        entity: EntityId,
        component: ComponentTypeId,
    },
    ComponentRemoved {
        entity: EntityId,
        component: ComponentTypeId,
    },
    /// A new `QueryTraits` has been cached. Emitted before its members are
    /// seeded.
    QueryCreated(QueryId),
    QueryMemberAdded {
        query: QueryId,
        entity: EntityId,
    },
    QueryMemberRemoved {
        query: QueryId,
        entity: EntityId,
    },
    ChildAdded {
        parent: EntityId,
        child: EntityId,
    },
    ChildRemoved {
        parent: EntityId,
        child: EntityId,
    },
}

/// Observer of `World` changes. Callbacks fire synchronously, in the order
/// the changes are applied.
pub trait EventSink {
    fn on_event(&mut self, event: &Event);

    /// Receives the non-fatal anomalies, e.g. destroying an entity twice.
    fn on_error(&mut self, _: &Error) {}
}

/// Lets the host keep a handle to a sink it has installed.
impl<T: EventSink> EventSink for Rc<RefCell<T>> {
    fn on_event(&mut self, event: &Event) {
        self.borrow_mut().on_event(event);
    }

    fn on_error(&mut self, error: &Error) {
        self.borrow_mut().on_error(error);
    }
}

/// A sink that records everything it receives.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<Event>,
    pub errors: Vec<Error>,
}

impl EventLog {
    pub fn new() -> Self {
        EventLog::default()
    }

    /// Clears the recorded events and errors.
    pub fn clear(&mut self) {
        self.events.clear();
        self.errors.clear();
    }
}

impl EventSink for EventLog {
    fn on_event(&mut self, event: &Event) {
        self.events.push(*event);
    }

    fn on_error(&mut self, error: &Error) {
        self.errors.push(error.clone());
    }
}

/// Routes notifications into the installed sink and the log facade. The
/// sink sits in a `RefCell` so read-only accessors of `World` can report
/// anomalies too.
#[derive(Default)]
pub(crate) struct EventBus {
    sink: RefCell<Option<Box<dyn EventSink>>>,
}

impl EventBus {
    #[inline]
    pub fn set(&mut self, sink: Box<dyn EventSink>) -> Option<Box<dyn EventSink>> {
        self.sink.get_mut().replace(sink)
    }

    #[inline]
    pub fn take(&mut self) -> Option<Box<dyn EventSink>> {
        self.sink.get_mut().take()
    }

    #[inline]
    pub fn emit(&self, event: Event) {
        trace!("{:?}", event);

        if let Some(ref mut sink) = *self.sink.borrow_mut() {
            sink.on_event(&event);
        }
    }

    pub fn error(&self, error: Error) {
        warn!("{}", error);

        if let Some(ref mut sink) = *self.sink.borrow_mut() {
            sink.on_error(&error);
        }
    }
}
