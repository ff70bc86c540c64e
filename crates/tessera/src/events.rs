//! # Event Bus
//!
//! Typed publish/subscribe plus a deferred FIFO.
//!
//! ## Dispatch rules
//!
//! - `emit` delivers synchronously to every listener of the event type, in
//!   subscription order, before returning
//! - `enqueue` only stores the event; `update` delivers the stored batch in
//!   FIFO order
//! - Listeners may emit, enqueue, subscribe or unsubscribe from inside a
//!   dispatch. No lock is held, so an emit cycle recurses until the stack
//!   runs out; avoiding that is the caller's job
//!
//! ## Structural events
//!
//! [`ComponentAdded`] and [`ComponentRemoved`] are emitted by the
//! [`EntityManager`](crate::EntityManager) from inside `assign`/`remove`/
//! `destroy`, once a listener is registered through
//! [`EntityManager::subscribe`](crate::EntityManager::subscribe).

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use tessera_storage::Component;

use crate::entity::Entity;
use crate::handle::ComponentHandle;

/// Marker for types that travel over the [`EventManager`].
pub trait Event: 'static {}

/// Something that listens for `E`.
///
/// Closures `Fn(&E)` are receivers too.
pub trait Receiver<E: Event>: 'static {
    /// Called once per delivered event.
    fn receive(&self, event: &E);
}

impl<E: Event, F: Fn(&E) + 'static> Receiver<E> for F {
    fn receive(&self, event: &E) {
        self(event);
    }
}

/// Listeners of one event type.
struct Channel<E: Event> {
    listeners: Vec<Rc<dyn Receiver<E>>>,
}

/// Type-erased queued event.
trait Pending {
    fn dispatch(self: Box<Self>, events: &EventManager);
}

struct Queued<E: Event>(E);

impl<E: Event> Pending for Queued<E> {
    fn dispatch(self: Box<Self>, events: &EventManager) {
        events.emit(&self.0);
    }
}

/// Typed publish/subscribe bus.
///
/// All methods take `&self`; the bus is shared as `Rc<EventManager>`
/// between the entity manager, systems and listeners.
#[derive(Default)]
pub struct EventManager {
    /// Event type -> `Channel<E>`.
    channels: RefCell<HashMap<TypeId, Box<dyn Any>>>,
    queue: RefCell<VecDeque<Box<dyn Pending>>>,
}

fn receiver_addr<T: ?Sized>(receiver: &Rc<T>) -> *const () {
    Rc::as_ptr(receiver).cast::<()>()
}

impl EventManager {
    /// Creates a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `receiver` for `E`.
    ///
    /// [`ComponentAdded`] and [`ComponentRemoved`] are only emitted while a
    /// storage hook is installed; subscribe to them through
    /// [`EntityManager::subscribe`](crate::EntityManager::subscribe), which
    /// installs it. A structural listener registered here alone hears nothing.
    ///
    /// # Returns
    ///
    /// `false` if this receiver was already subscribed to `E`.
    pub fn subscribe<E: Event, R: Receiver<E>>(&self, receiver: &Rc<R>) -> bool {
        let mut channels = self.channels.borrow_mut();
        let Some(channel) = channels
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Channel::<E> { listeners: Vec::new() }))
            .downcast_mut::<Channel<E>>()
        else {
            return false;
        };

        let addr = receiver_addr(receiver);
        if channel.listeners.iter().any(|l| receiver_addr(l) == addr) {
            return false;
        }
        let listener: Rc<dyn Receiver<E>> = receiver.clone();
        channel.listeners.push(listener);
        true
    }

    /// Removes `receiver` from the listeners of `E`.
    ///
    /// # Returns
    ///
    /// `true` if it was subscribed.
    pub fn unsubscribe<E: Event, R: Receiver<E>>(&self, receiver: &Rc<R>) -> bool {
        let mut channels = self.channels.borrow_mut();
        let Some(channel) = channels
            .get_mut(&TypeId::of::<E>())
            .and_then(|c| c.downcast_mut::<Channel<E>>())
        else {
            return false;
        };

        let addr = receiver_addr(receiver);
        let before = channel.listeners.len();
        channel.listeners.retain(|l| receiver_addr(l) != addr);
        channel.listeners.len() != before
    }

    /// Number of listeners currently subscribed to `E`.
    #[must_use]
    pub fn listener_count<E: Event>(&self) -> usize {
        self.channels
            .borrow()
            .get(&TypeId::of::<E>())
            .and_then(|c| c.downcast_ref::<Channel<E>>())
            .map_or(0, |c| c.listeners.len())
    }

    /// Delivers `event` to every listener of `E`, in subscription order.
    ///
    /// The listener list is captured on entry: listeners added during this
    /// dispatch wait for the next emit, listeners removed during it still
    /// receive this event.
    pub fn emit<E: Event>(&self, event: &E) {
        let listeners = {
            let channels = self.channels.borrow();
            match channels
                .get(&TypeId::of::<E>())
                .and_then(|c| c.downcast_ref::<Channel<E>>())
            {
                Some(channel) if !channel.listeners.is_empty() => channel.listeners.clone(),
                _ => return,
            }
        };

        for listener in &listeners {
            listener.receive(event);
        }
    }

    /// Stores `event` for the next [`EventManager::update`].
    pub fn enqueue<E: Event>(&self, event: E) {
        self.queue.borrow_mut().push_back(Box::new(Queued(event)));
    }

    /// Number of events waiting for [`EventManager::update`].
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Delivers every event queued before this call, in FIFO order.
    ///
    /// Events enqueued by listeners during the drain are kept for the next
    /// call.
    ///
    /// # Returns
    ///
    /// The number of events delivered.
    pub fn update(&self) -> usize {
        let batch = std::mem::take(&mut *self.queue.borrow_mut());
        let delivered = batch.len();
        if delivered > 0 {
            tracing::trace!(delivered, "draining event queue");
        }
        for pending in batch {
            pending.dispatch(self);
        }
        delivered
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("channels", &self.channels.borrow().len())
            .field("queued", &self.queued())
            .finish()
    }
}

/// Storage hook a structural event is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Fired after a component is constructed.
    Construct,
    /// Fired before a component is destroyed.
    Destroy,
}

/// An event the storage emits on its own when a component is added or removed.
pub trait StructuralEvent: Event {
    /// The component whose construction/destruction triggers the event.
    type Component: Component;
    /// Which storage hook drives the event.
    const KIND: HookKind;

    /// Builds the event for one entity.
    fn new(entity: Entity, component: ComponentHandle<Self::Component>) -> Self;
}

/// Emitted from inside `assign` after a `C` was attached.
pub struct ComponentAdded<C: Component> {
    /// The entity that gained the component.
    pub entity: Entity,
    /// Handle to the new component.
    pub component: ComponentHandle<C>,
}

/// Emitted from inside `remove`/`destroy` before a `C` is dropped.
pub struct ComponentRemoved<C: Component> {
    /// The entity losing the component.
    pub entity: Entity,
    /// Handle to the component being removed.
    pub component: ComponentHandle<C>,
}

macro_rules! structural_event {
    ($event:ident, $kind:expr) => {
        impl<C: Component> Event for $event<C> {}

        impl<C: Component> StructuralEvent for $event<C> {
            type Component = C;
            const KIND: HookKind = $kind;

            fn new(entity: Entity, component: ComponentHandle<C>) -> Self {
                Self { entity, component }
            }
        }

        impl<C: Component> Clone for $event<C> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<C: Component> Copy for $event<C> {}

        impl<C: Component> fmt::Debug for $event<C> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($event))
                    .field("component", &type_name::<C>())
                    .field("entity", &self.entity)
                    .finish()
            }
        }
    };
}

structural_event!(ComponentAdded, HookKind::Construct);
structural_event!(ComponentRemoved, HookKind::Destroy);
