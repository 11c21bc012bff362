//! Type-erased bindable items

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{ControlKind, ErasedGet, ErasedSet};
use crate::equality::BindEq;
use crate::error::{BindError, Result};
use crate::property::ModelProperty;
use crate::value::{BindValue, ValueKind, ValueType};
use crate::view::ViewBinding;

pub(crate) struct ItemMeta {
    pub name: &'static str,
    pub label: String,
    pub kind: ValueKind,
    pub control: ControlKind,
    pub values: Vec<BindValue>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

type ReadFn = Box<dyn Fn() -> Result<BindValue>>;
type WriteFn = Box<dyn Fn(BindValue) -> Result<()>>;

struct ItemInner {
    meta: ItemMeta,
    read: ReadFn,
    write: Option<WriteFn>,
}

/// One discovered property of a live target object
///
/// Values cross this boundary as [`BindValue`] only. Cloning is cheap.
#[derive(Clone)]
pub struct BindableItem {
    inner: Rc<ItemInner>,
}

impl BindableItem {
    pub(crate) fn new<S: 'static>(
        meta: ItemMeta,
        target: Rc<RefCell<S>>,
        get: ErasedGet<S>,
        set: Option<ErasedSet<S>>,
    ) -> Self {
        let name = meta.name;

        let read: ReadFn = {
            let target = Rc::clone(&target);
            Box::new(move || {
                let target = target
                    .try_borrow()
                    .map_err(|_| BindError::TargetBusy { property: name })?;
                Ok(get(&target))
            })
        };

        let write = set.map(|set| -> WriteFn {
            Box::new(move |value: BindValue| {
                let mut target = target
                    .try_borrow_mut()
                    .map_err(|_| BindError::TargetBusy { property: name })?;
                set(&mut target, value)
            })
        });

        Self {
            inner: Rc::new(ItemInner { meta, read, write }),
        }
    }

    /// Property identifier
    pub fn name(&self) -> &'static str {
        self.inner.meta.name
    }

    /// Display label
    pub fn label(&self) -> &str {
        &self.inner.meta.label
    }

    /// Kind of the underlying property
    pub fn kind(&self) -> &ValueKind {
        &self.inner.meta.kind
    }

    /// Control that should render this item
    pub fn control(&self) -> ControlKind {
        self.inner.meta.control
    }

    /// Selectable values; empty when the item is not a choice
    pub fn values(&self) -> &[BindValue] {
        &self.inner.meta.values
    }

    pub fn min(&self) -> Option<f64> {
        self.inner.meta.min
    }

    pub fn max(&self) -> Option<f64> {
        self.inner.meta.max
    }

    /// Numeric bounds, when both are declared
    pub fn range(&self) -> Option<(f64, f64)> {
        self.min().zip(self.max())
    }

    pub fn is_readonly(&self) -> bool {
        self.inner.write.is_none()
    }

    pub fn is_supported(&self) -> bool {
        self.control().is_supported()
    }

    /// Read the property from the target
    pub fn value(&self) -> Result<BindValue> {
        (self.inner.read)()
    }

    /// Write the property on the target
    pub fn set_value(&self, value: BindValue) -> Result<()> {
        match &self.inner.write {
            Some(write) => write(value),
            None => Err(BindError::ReadOnly {
                property: self.name(),
            }),
        }
    }

    /// A type-erased model property over this item
    ///
    /// Read-only items yield a disabled property. Every call creates a new
    /// property; share the returned handle rather than calling again.
    pub fn property(&self) -> ModelProperty<BindValue> {
        let initial = self.value().unwrap_or_default();
        self.model(initial, Ok, |value: &BindValue| value.clone())
    }

    /// A statically typed model property over this item
    ///
    /// Fails with [`BindError::TypeMismatch`] when `T` is not of the item's kind.
    pub fn typed_property<T: ValueType>(&self) -> Result<ModelProperty<T>> {
        if T::kind() != *self.kind() {
            return Err(BindError::TypeMismatch {
                expected: self.kind().clone(),
                found: type_name::<T>(),
            });
        }
        let initial = T::from_value(self.value()?)?;
        Ok(self.model(initial, T::from_value, T::to_value))
    }

    /// Bind a type-erased control to this item
    pub fn bind(&self, view: Rc<dyn ViewBinding<BindValue>>) -> Result<ModelProperty<BindValue>> {
        let property = self.property();
        property.attach(view)?;
        Ok(property)
    }

    fn model<T, D, E>(&self, initial: T, decode: D, encode: E) -> ModelProperty<T>
    where
        T: BindEq + Clone + 'static,
        D: Fn(BindValue) -> Result<T> + 'static,
        E: Fn(&T) -> BindValue + 'static,
    {
        // Last value read successfully; served while the target is busy
        let last = Rc::new(RefCell::new(initial));

        let getter = {
            let item = self.clone();
            let last = Rc::clone(&last);
            move || match item.value().and_then(&decode) {
                Ok(value) => {
                    last.replace(value.clone());
                    value
                }
                Err(err) => {
                    tracing::debug!("reading `{}` failed, using last value: {}", item.name(), err);
                    last.borrow().clone()
                }
            }
        };

        let setter = {
            let item = self.clone();
            move |value: &T| item.set_value(encode(value))
        };

        ModelProperty::with_accessors(getter, setter).with_enabled(!self.is_readonly())
    }
}

impl fmt::Debug for BindableItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindableItem")
            .field("name", &self.name())
            .field("label", &self.label())
            .field("kind", self.kind())
            .field("control", &self.control())
            .field("values", &self.values())
            .field("range", &(self.min(), self.max()))
            .field("readonly", &self.is_readonly())
            .finish()
    }
}
