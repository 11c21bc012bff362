//! Type-converting view adapters
//!
//! A [`BindingAdapter<TFrom, TTo>`] wraps a `ViewBinding<TFrom>` and is itself
//! a `ViewBinding<TTo>`. Reads go through `forward`, writes through
//! `reverse`, and the inner control's change events are re-emitted after
//! passing through `forward`.
//!
//! ```ignore
//! // A float property edited through a text box
//! let text: Rc<dyn ViewBinding<String>> = Rc::new(ViewCell::new(String::new()));
//! let as_float = Rc::new(adapters::parsed::<f64>(text));
//! speed.attach(as_float)?;
//! ```
//!
//! Adapters compose: the inner binding may itself be an adapter.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{BindError, Result};
use crate::event::{ChangeEvent, HandlerId};
use crate::value::{BindValue, ValueType};
use crate::view::ViewBinding;

type Convert<A, B> = Rc<dyn Fn(&A) -> Result<B>>;

/// Exposes a `ViewBinding<TFrom>` as a `ViewBinding<TTo>`
pub struct BindingAdapter<TFrom, TTo> {
    inner: Rc<dyn ViewBinding<TFrom>>,
    forward: Convert<TFrom, TTo>,
    reverse: Convert<TTo, TFrom>,
    changed: Rc<ChangeEvent<TTo>>,
    /// Handler on `inner` relaying its changes to `changed`
    relay: HandlerId,
}

impl<TFrom: 'static, TTo: 'static> BindingAdapter<TFrom, TTo> {
    /// Create an adapter from fallible conversions
    pub fn new<F, R>(inner: Rc<dyn ViewBinding<TFrom>>, forward: F, reverse: R) -> Self
    where
        F: Fn(&TFrom) -> Result<TTo> + 'static,
        R: Fn(&TTo) -> Result<TFrom> + 'static,
    {
        let forward: Convert<TFrom, TTo> = Rc::new(forward);
        let changed = Rc::new(ChangeEvent::new());

        let relay = {
            let forward = Rc::clone(&forward);
            let changed = Rc::clone(&changed);
            inner.changed().subscribe(move |value: &TFrom| {
                let converted = forward(value)?;
                changed.emit(&converted)
            })
        };

        Self {
            inner,
            forward,
            reverse: Rc::new(reverse),
            changed,
            relay,
        }
    }

    /// Create an adapter from conversions that cannot fail
    pub fn map<F, R>(inner: Rc<dyn ViewBinding<TFrom>>, forward: F, reverse: R) -> Self
    where
        F: Fn(&TFrom) -> TTo + 'static,
        R: Fn(&TTo) -> TFrom + 'static,
    {
        Self::new(inner, move |v| Ok(forward(v)), move |v| Ok(reverse(v)))
    }

    /// The wrapped binding
    pub fn inner(&self) -> &Rc<dyn ViewBinding<TFrom>> {
        &self.inner
    }
}

impl<TFrom, TTo> ViewBinding<TTo> for BindingAdapter<TFrom, TTo> {
    fn value(&self) -> Result<TTo> {
        let inner = self.inner.value()?;
        (self.forward)(&inner)
    }

    fn set_value(&self, value: TTo) -> Result<()> {
        let converted = (self.reverse)(&value)?;
        self.inner.set_value(converted)
    }

    fn changed(&self) -> &ChangeEvent<TTo> {
        &self.changed
    }
}

impl<TFrom, TTo> Drop for BindingAdapter<TFrom, TTo> {
    fn drop(&mut self) {
        self.inner.changed().unsubscribe(self.relay);
    }
}

impl<TFrom, TTo> fmt::Debug for BindingAdapter<TFrom, TTo> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingAdapter")
            .field("from", &type_name::<TFrom>())
            .field("to", &type_name::<TTo>())
            .field("handlers", &self.changed.len())
            .finish()
    }
}

// =============================================================================
// STANDARD ADAPTERS
// =============================================================================

/// Adapters the UI-construction layer needs to put common controls in front
/// of typed or type-erased properties
pub mod adapters {
    use std::fmt::Display;
    use std::rc::Rc;
    use std::str::FromStr;

    use super::BindingAdapter;
    use crate::error::BindError;
    use crate::value::{BindValue, ValueType};
    use crate::view::ViewBinding;

    /// Text control in front of any parseable value
    ///
    /// Reads fail with [`BindError::Conversion`] while the text does not
    /// parse; surrounding whitespace is ignored.
    pub fn parsed<T>(text: Rc<dyn ViewBinding<String>>) -> BindingAdapter<String, T>
    where
        T: FromStr + Display + 'static,
        T::Err: Display,
    {
        BindingAdapter::new(
            text,
            |s: &String| {
                s.trim()
                    .parse::<T>()
                    .map_err(|e| BindError::conversion::<str, T>(e))
            },
            |v: &T| Ok(v.to_string()),
        )
    }

    /// Typed control in front of a type-erased property
    pub fn erased<T: ValueType>(view: Rc<dyn ViewBinding<T>>) -> BindingAdapter<T, BindValue> {
        BindingAdapter::new(view, |v: &T| Ok(v.to_value()), |v: &BindValue| {
            T::from_value(v.clone())
        })
    }

    /// Type-erased control in front of a typed property
    pub fn typed<T: ValueType>(view: Rc<dyn ViewBinding<BindValue>>) -> BindingAdapter<BindValue, T> {
        BindingAdapter::new(
            view,
            |v: &BindValue| T::from_value(v.clone()),
            |v: &T| Ok(v.to_value()),
        )
    }
}

// =============================================================================
// TYPED VIEW SLOT
// =============================================================================

struct CachedAdapter {
    type_id: TypeId,
    type_name: &'static str,
    adapter: Rc<dyn Any>,
}

/// Single-instantiation cache of a typed view over a type-erased control
///
/// List controls bind an untyped `BindValue` sequence. The first call to
/// [`TypedViewSlot::typed`] decides the element type the control is viewed
/// as; asking again for the same type returns the same adapter, asking for a
/// different one is a programming error.
pub struct TypedViewSlot {
    inner: Rc<dyn ViewBinding<BindValue>>,
    cached: RefCell<Option<CachedAdapter>>,
}

impl TypedViewSlot {
    pub fn new(inner: Rc<dyn ViewBinding<BindValue>>) -> Self {
        Self {
            inner,
            cached: RefCell::new(None),
        }
    }

    /// The typed view of the control, created on first use
    pub fn typed<T: ValueType>(&self) -> Result<Rc<BindingAdapter<BindValue, T>>> {
        let requested = TypeId::of::<T>();

        if let Some(cached) = self.cached.borrow().as_ref() {
            if cached.type_id != requested {
                return Err(BindError::AdapterCastConflict {
                    cached: cached.type_name,
                    requested: type_name::<T>(),
                });
            }
            return Rc::clone(&cached.adapter)
                .downcast::<BindingAdapter<BindValue, T>>()
                .map_err(|_| BindError::AdapterCastConflict {
                    cached: cached.type_name,
                    requested: type_name::<T>(),
                });
        }

        let adapter = Rc::new(adapters::typed::<T>(Rc::clone(&self.inner)));
        self.cached.replace(Some(CachedAdapter {
            type_id: requested,
            type_name: type_name::<T>(),
            adapter: adapter.clone(),
        }));
        Ok(adapter)
    }

    /// Name of the cached element type, if any
    pub fn cached_type(&self) -> Option<&'static str> {
        self.cached.borrow().as_ref().map(|c| c.type_name)
    }
}

impl fmt::Debug for TypedViewSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedViewSlot")
            .field("cached", &self.cached_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::adapters;
    use super::*;
    use crate::view::ViewCell;

    fn int_to_text(inner: &Rc<ViewCell<i32>>) -> BindingAdapter<i32, String> {
        BindingAdapter::new(
            inner.clone(),
            |i: &i32| Ok(i.to_string()),
            |s: &String| s.parse::<i32>().map_err(|e| BindError::conversion::<str, i32>(e)),
        )
    }

    #[test]
    fn test_round_trip_law() {
        let inner = Rc::new(ViewCell::new(0));
        let adapter = int_to_text(&inner);

        inner.set_value(42).unwrap();
        assert_eq!(adapter.value(), Ok("42".to_string()));

        adapter.set_value("7".to_string()).unwrap();
        assert_eq!(inner.get(), 7);
    }

    #[test]
    fn test_relays_converted_changes() {
        let inner = Rc::new(ViewCell::new(0));
        let adapter = int_to_text(&inner);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = seen.clone();
        adapter.changed().subscribe(move |s: &String| {
            log.borrow_mut().push(s.clone());
            Ok(())
        });

        inner.input(5).unwrap();
        inner.input(-1).unwrap();
        assert_eq!(*seen.borrow(), vec!["5".to_string(), "-1".to_string()]);
    }

    #[test]
    fn test_reverse_failure_propagates() {
        let inner = Rc::new(ViewCell::new(3));
        let adapter = int_to_text(&inner);

        let err = adapter.set_value("three".to_string()).unwrap_err();
        assert!(matches!(err, BindError::Conversion { to: "i32", .. }));
        assert_eq!(inner.get(), 3);
    }

    #[test]
    fn test_composition() {
        let inner = Rc::new(ViewCell::new(10));
        let text = Rc::new(int_to_text(&inner));
        let shouted = BindingAdapter::map(
            text as Rc<dyn ViewBinding<String>>,
            |s: &String| format!("{s}!"),
            |s: &String| s.trim_end_matches('!').to_string(),
        );

        assert_eq!(shouted.value(), Ok("10!".to_string()));
        shouted.set_value("12!".to_string()).unwrap();
        assert_eq!(inner.get(), 12);

        let seen = Rc::new(RefCell::new(String::new()));
        let log = seen.clone();
        shouted.changed().subscribe(move |s: &String| {
            log.replace(s.clone());
            Ok(())
        });
        inner.input(99).unwrap();
        assert_eq!(*seen.borrow(), "99!");
    }

    #[test]
    fn test_drop_removes_relay() {
        let inner = Rc::new(ViewCell::new(0));
        let adapter = int_to_text(&inner);
        assert_eq!(inner.changed().len(), 1);

        drop(adapter);
        assert!(inner.changed().is_empty());
    }

    #[test]
    fn test_parsed_text() {
        let text = Rc::new(ViewCell::new(" 2.5 ".to_string()));
        let speed = adapters::parsed::<f64>(text.clone());

        assert_eq!(speed.value(), Ok(2.5));
        speed.set_value(0.75).unwrap();
        assert_eq!(text.get(), "0.75");

        text.set_value("fast".into()).unwrap();
        assert!(matches!(speed.value(), Err(BindError::Conversion { .. })));
    }

    #[test]
    fn test_erased_and_typed() {
        let toggle = Rc::new(ViewCell::new(false));
        let erased = adapters::erased::<bool>(toggle.clone());
        erased.set_value(BindValue::Bool(true)).unwrap();
        assert!(toggle.get());
        assert!(matches!(
            erased.set_value(BindValue::Integer(1)),
            Err(BindError::TypeMismatch { .. })
        ));

        let list = Rc::new(ViewCell::new(BindValue::List(vec![BindValue::Integer(1)])));
        let ints = adapters::typed::<Vec<i32>>(list.clone());
        assert_eq!(ints.value(), Ok(vec![1]));
        ints.set_value(vec![2, 3]).unwrap();
        assert_eq!(
            list.get(),
            BindValue::List(vec![BindValue::Integer(2), BindValue::Integer(3)])
        );
    }

    #[test]
    fn test_typed_slot_single_instantiation() {
        let list = Rc::new(ViewCell::new(BindValue::List(Vec::new())));
        let slot = TypedViewSlot::new(list);

        let first = slot.typed::<Vec<String>>().unwrap();
        let again = slot.typed::<Vec<String>>().unwrap();
        assert!(Rc::ptr_eq(&first, &again));
        assert_eq!(slot.cached_type(), Some(type_name::<Vec<String>>()));

        let err = slot.typed::<Vec<i64>>().unwrap_err();
        assert!(matches!(err, BindError::AdapterCastConflict { .. }));
    }
}
