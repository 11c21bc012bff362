//! Change events - explicit observer registries
//!
//! Every observable in the binding engine (model properties, view controls,
//! adapters) owns a [`ChangeEvent<T>`]. Handlers are stored in a slotmap so
//! they can be removed by id at any time, including from inside another
//! handler while the event is being dispatched.
//!
//! Dispatch works on a snapshot of the handler list taken when `emit` starts.
//! A handler that was unsubscribed after the snapshot was taken is skipped
//! when its turn comes, and a handler subscribed during dispatch first runs
//! on the next emission.
//!
//! ```ignore
//! let event = ChangeEvent::<i32>::new();
//! let id = event.subscribe(|value| {
//!     println!("changed to {value}");
//!     Ok(())
//! });
//! event.emit(&3)?;
//! event.unsubscribe(id);
//! ```

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;

new_key_type! {
    /// Identifies one handler registered on a [`ChangeEvent`]
    pub struct HandlerId;
}

/// A change handler (cheap to clone, shared with dispatch snapshots)
pub type ChangeHandler<T> = Rc<dyn Fn(&T) -> Result<()>>;

struct Registry<T> {
    handlers: SlotMap<HandlerId, ChangeHandler<T>>,
    /// Subscription order; dispatch follows it
    order: SmallVec<[HandlerId; 4]>,
}

/// Multi-subscriber change notification
pub struct ChangeEvent<T> {
    registry: RefCell<Registry<T>>,
}

impl<T> ChangeEvent<T> {
    /// Create an event with no handlers
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(Registry {
                handlers: SlotMap::with_key(),
                order: SmallVec::new(),
            }),
        }
    }

    /// Register an already shared handler
    pub fn add(&self, handler: ChangeHandler<T>) -> HandlerId {
        let mut registry = self.registry.borrow_mut();
        let id = registry.handlers.insert(handler);
        registry.order.push(id);
        id
    }

    /// Remove a handler
    ///
    /// Returns `false` if the id is unknown or was already removed.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        if registry.handlers.remove(id).is_none() {
            return false;
        }
        registry.order.retain(|h| *h != id);
        true
    }

    /// Whether `id` is still registered
    pub fn contains(&self, id: HandlerId) -> bool {
        self.registry.borrow().handlers.contains_key(id)
    }

    /// Notify every handler, in subscription order
    ///
    /// Stops at the first handler error and returns it.
    pub fn emit(&self, value: &T) -> Result<()> {
        let snapshot: SmallVec<[(HandlerId, ChangeHandler<T>); 4]> = {
            let registry = self.registry.borrow();
            registry
                .order
                .iter()
                .filter_map(|id| registry.handlers.get(*id).map(|h| (*id, Rc::clone(h))))
                .collect()
        };

        for (id, handler) in snapshot {
            if !self.contains(id) {
                continue;
            }
            handler(value)?;
        }
        Ok(())
    }

    /// Remove every handler
    pub fn clear(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.handlers.clear();
        registry.order.clear();
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> ChangeEvent<T> {
    /// Register a handler
    pub fn subscribe<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&T) -> Result<()> + 'static,
    {
        self.add(Rc::new(handler))
    }
}

impl<T> Default for ChangeEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ChangeEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeEvent")
            .field("handlers", &self.len())
            .finish()
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// RAII guard for a handler registered through a property
///
/// Dropping the guard (or calling [`Subscription::cancel`]) removes the
/// handler. Cancelling after the observed property is gone does nothing.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribe now
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    /// Keep the handler registered for the lifetime of the observed value
    pub fn detach(mut self) {
        self.cancel = None;
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
