//! Model properties
//!
//! A [`ModelProperty<T>`] is the model side of a binding: an observable value
//! that one or more views can be attached to. Writes flow both ways:
//!
//! - property -> view: every change of the property is pushed into each
//!   attached view, unconditionally
//! - view -> property: a change reported by a view is written back only when
//!   [`values_equal`] says it differs from the property's current value
//!
//! The equality guard on the way back is what keeps echoing controls (ones
//! that fire their change event on programmatic writes too) from looping.
//!
//! Derived properties re-evaluate through [`ModelProperty::depends_on`]:
//!
//! ```ignore
//! let query = ModelProperty::new(String::new());
//! let results = {
//!     let (query, items) = (query.clone(), items.clone());
//!     ModelProperty::computed(move || filter(&items, &query.get()))
//! };
//! results.depends_on(&query);
//! ```

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::BindConfig;
use crate::equality::{values_equal, BindEq};
use crate::error::{BindError, Result};
use crate::event::{ChangeEvent, HandlerId, Subscription};
use crate::view::ViewBinding;

type Getter<T> = Box<dyn Fn() -> T>;
type Setter<T> = Box<dyn Fn(&T) -> Result<()>>;

/// Identity of an attached view (address of its `Rc` allocation)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ViewKey(*const ());

impl ViewKey {
    fn of<V: ?Sized>(view: &Rc<V>) -> Self {
        ViewKey(Rc::as_ptr(view).cast::<()>())
    }
}

struct Attachment<T> {
    view: Rc<dyn ViewBinding<T>>,
    /// Handler on the property pushing values into the view
    forward: HandlerId,
    /// Handler on the view writing values back into the property
    reverse: HandlerId,
}

struct PropertyInner<T> {
    cached: RefCell<T>,
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
    enabled: Cell<bool>,
    changed: ChangeEvent<T>,
    attachments: RefCell<FxHashMap<ViewKey, Attachment<T>>>,
    upstream: RefCell<SmallVec<[Subscription; 2]>>,
    version: Cell<u64>,
}

impl<T> Drop for PropertyInner<T> {
    fn drop(&mut self) {
        for (_, attachment) in self.attachments.get_mut().drain() {
            attachment.view.changed().unsubscribe(attachment.reverse);
        }
    }
}

/// An observable model value with bidirectional view sync
///
/// Cloning is cheap and yields another handle onto the same property.
pub struct ModelProperty<T> {
    inner: Rc<PropertyInner<T>>,
}

impl<T> Clone for ModelProperty<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: BindEq + Clone + 'static> ModelProperty<T> {
    fn build(initial: T, getter: Option<Getter<T>>, setter: Option<Setter<T>>) -> Self {
        Self {
            inner: Rc::new(PropertyInner {
                cached: RefCell::new(initial),
                getter,
                setter,
                enabled: Cell::new(true),
                changed: ChangeEvent::new(),
                attachments: RefCell::new(FxHashMap::default()),
                upstream: RefCell::new(SmallVec::new()),
                version: Cell::new(0),
            }),
        }
    }

    fn from_inner(inner: Rc<PropertyInner<T>>) -> Self {
        Self { inner }
    }

    /// Self-storing property
    pub fn new(value: T) -> Self {
        Self::build(value, None, None)
    }

    /// Property stored elsewhere, read through `getter` and written through `setter`
    pub fn with_accessors<G, S>(getter: G, setter: S) -> Self
    where
        G: Fn() -> T + 'static,
        S: Fn(&T) -> Result<()> + 'static,
    {
        let initial = getter();
        Self::build(initial, Some(Box::new(getter)), Some(Box::new(setter)))
    }

    /// Derived property; writes only force a re-read
    pub fn computed<G>(getter: G) -> Self
    where
        G: Fn() -> T + 'static,
    {
        let initial = getter();
        Self::build(initial, Some(Box::new(getter)), None)
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        self.inner.enabled.set(enabled);
        self
    }

    /// Current value
    pub fn get(&self) -> T {
        match &self.inner.getter {
            Some(getter) => getter(),
            None => self.inner.cached.borrow().clone(),
        }
    }

    /// Write a value and notify
    ///
    /// Does nothing while the property is disabled. Otherwise the change
    /// event fires with the post-write value even when `value` equals the
    /// previous one.
    pub fn set(&self, value: T) -> Result<()> {
        if !self.inner.enabled.get() {
            tracing::trace!("ignoring write to disabled property");
            return Ok(());
        }

        match &self.inner.setter {
            Some(setter) => {
                self.inner.cached.replace(value.clone());
                setter(&value)?;
            }
            None => {
                self.inner.cached.replace(value);
            }
        }

        self.notify()
    }

    /// Fire the change event with the current value without writing anything
    pub fn trigger_update(&self) -> Result<()> {
        self.notify()
    }

    fn notify(&self) -> Result<()> {
        let current = self.get();
        let version = self.inner.version.get() + 1;
        self.inner.version.set(version);
        tracing::trace!(version, handlers = self.inner.changed.len(), "property changed");
        self.inner.changed.emit(&current)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.set(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Number of change notifications so far
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Bind a view to this property in both directions
    ///
    /// The view is initialized with the current value right away. Attaching a
    /// view that is already attached replaces its earlier binding and moves it
    /// to the end of the dispatch order.
    pub fn attach(&self, view: Rc<dyn ViewBinding<T>>) -> Result<()> {
        let key = ViewKey::of(&view);
        self.detach_key(key);

        let forward = {
            let view = Rc::clone(&view);
            self.inner
                .changed
                .subscribe(move |value: &T| view.set_value(value.clone()))
        };

        let reverse = {
            let property = Rc::downgrade(&self.inner);
            view.changed()
                .subscribe(move |value: &T| write_back(&property, value))
        };

        self.inner.attachments.borrow_mut().insert(
            key,
            Attachment {
                view: Rc::clone(&view),
                forward,
                reverse,
            },
        );
        tracing::debug!(attached = self.attached_count(), "view attached");

        if let Err(err) = view.set_value(self.get()) {
            self.detach_key(key);
            return Err(err);
        }
        Ok(())
    }

    /// Remove the binding to `view`
    ///
    /// Returns whether the view was attached. Calling it again, or from inside
    /// a change handler, is fine.
    pub fn detach<V: ?Sized>(&self, view: &Rc<V>) -> bool {
        self.detach_key(ViewKey::of(view))
    }

    fn detach_key(&self, key: ViewKey) -> bool {
        let removed = self.inner.attachments.borrow_mut().remove(&key);
        match removed {
            Some(attachment) => {
                self.release(attachment);
                tracing::debug!(attached = self.attached_count(), "view detached");
                true
            }
            None => false,
        }
    }

    fn release(&self, attachment: Attachment<T>) {
        self.inner.changed.unsubscribe(attachment.forward);
        attachment.view.changed().unsubscribe(attachment.reverse);
    }

    /// Remove every view binding
    pub fn detach_all(&self) {
        let drained: Vec<Attachment<T>> = self
            .inner
            .attachments
            .borrow_mut()
            .drain()
            .map(|(_, attachment)| attachment)
            .collect();
        for attachment in drained {
            self.release(attachment);
        }
    }

    pub fn attached_count(&self) -> usize {
        self.inner.attachments.borrow().len()
    }

    pub fn is_attached<V: ?Sized>(&self, view: &Rc<V>) -> bool {
        self.inner.attachments.borrow().contains_key(&ViewKey::of(view))
    }

    /// Re-evaluate this property whenever `other` changes
    ///
    /// Each change of `other` performs `self.set(self.get())`. A failure in
    /// that re-evaluation is logged and does not reach `other`'s writer, so
    /// one broken dependent cannot stop the others.
    pub fn depends_on<U: 'static>(&self, other: &ModelProperty<U>) -> &Self {
        let dependent = Rc::downgrade(&self.inner);
        let id = other.inner.changed.subscribe(move |_: &U| {
            if let Some(inner) = dependent.upgrade() {
                if let Err(err) = ModelProperty::from_inner(inner).reevaluate() {
                    tracing::warn!("dependent property failed to re-evaluate: {}", err);
                }
            }
            Ok(())
        });

        let upstream = Rc::downgrade(&other.inner);
        self.inner
            .upstream
            .borrow_mut()
            .push(Subscription::new(move || {
                if let Some(upstream) = upstream.upgrade() {
                    upstream.changed.unsubscribe(id);
                }
            }));
        self
    }

    fn reevaluate(&self) -> Result<()> {
        let _depth = DepthGuard::enter()?;
        self.set(self.get())
    }

    /// Observe changes from application code
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) -> Result<()> + 'static,
    {
        let id = self.inner.changed.subscribe(handler);
        let property = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = property.upgrade() {
                inner.changed.unsubscribe(id);
            }
        })
    }

    /// Tear the property down: detach every view, drop upstream
    /// subscriptions and clear all handlers. Idempotent.
    pub fn dispose(&self) {
        self.detach_all();
        let upstream = std::mem::take(&mut *self.inner.upstream.borrow_mut());
        drop(upstream);
        self.inner.changed.clear();
        tracing::debug!("property disposed");
    }

    /// Whether both handles point at the same property
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

fn write_back<T: BindEq + Clone + 'static>(property: &Weak<PropertyInner<T>>, value: &T) -> Result<()> {
    let Some(inner) = property.upgrade() else {
        return Ok(());
    };
    let property = ModelProperty::from_inner(inner);
    if values_equal(&property.get(), value) {
        return Ok(());
    }
    property.set(value.clone())
}

impl<T: fmt::Debug + BindEq + Clone + 'static> fmt::Debug for ModelProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelProperty")
            .field("value", &self.get())
            .field("enabled", &self.is_enabled())
            .field("attached", &self.attached_count())
            .field("version", &self.version())
            .finish()
    }
}

// =============================================================================
// DEPENDENCY DEPTH GUARD
// =============================================================================

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts nested `depends_on` re-evaluations on the current thread
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<Self> {
        let limit = BindConfig::current().max_dependency_depth;
        DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if let Some(max) = limit {
                if next > max {
                    return Err(BindError::DependencyDepthExceeded { depth: max });
                }
            }
            depth.set(next);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
