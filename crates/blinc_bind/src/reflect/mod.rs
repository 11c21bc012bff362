//! Discovery of bindable properties
//!
//! A struct opts in with `#[derive(Bindable)]` and tags each bindable field
//! with `#[bind(...)]`:
//!
//! ```ignore
//! #[derive(Bindable)]
//! struct Vehicle {
//!     #[bind(min = 0, max = 300)]
//!     max_speed: f32,
//!     #[bind(values = ["red", "green"])]
//!     paint: String,
//!     #[bind(skip)]
//!     cache_key: u64,
//!     #[bind(flatten)]
//!     engine: Engine,
//! }
//!
//! let items = discover(&Rc::new(RefCell::new(vehicle)));
//! ```
//!
//! [`ReflectiveBinder`] turns the descriptors of a live target object into
//! type-erased [`BindableItem`]s the UI-construction layer renders without
//! knowing the fields' static types.

mod control;
mod item;
mod label;

pub use control::{resolve as resolve_control, ControlKind};
pub use item::BindableItem;
pub use label::humanize;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::config::{BindConfig, LabelCase};
use crate::error::Result;
use crate::value::{BindValue, ValueKind, ValueType};

type ErasedGet<S> = Rc<dyn Fn(&S) -> BindValue>;
type ErasedSet<S> = Rc<dyn Fn(&mut S, BindValue) -> Result<()>>;

/// A type whose tagged properties can be discovered at run time
///
/// Usually derived; see the module docs.
pub trait Bindable: 'static {
    /// Descriptors of every tagged property, in declaration order
    fn descriptors() -> Vec<PropertyDescriptor<Self>>
    where
        Self: Sized;
}

/// Metadata declared on a bindable property
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindAttrs {
    /// Display label overriding the humanized identifier
    pub label: Option<String>,
    /// Fixed set of selectable values
    pub values: Vec<BindValue>,
    /// Preferred control
    pub control: Option<ControlKind>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub readonly: bool,
    pub skip: bool,
}

impl BindAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn values(mut self, values: impl IntoIterator<Item = BindValue>) -> Self {
        self.values = values.into_iter().collect();
        self
    }

    pub fn control(mut self, control: ControlKind) -> Self {
        self.control = Some(control);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }
}

/// How to read and write one property of `S`, with its static type erased
pub struct PropertyDescriptor<S> {
    name: &'static str,
    attrs: BindAttrs,
    kind: ValueKind,
    choices: Vec<BindValue>,
    get: Option<ErasedGet<S>>,
    set: Option<ErasedSet<S>>,
}

impl<S: 'static> PropertyDescriptor<S> {
    /// Descriptor for a plain field
    pub fn field<F, G, M>(name: &'static str, attrs: BindAttrs, get: G, get_mut: M) -> Self
    where
        F: ValueType,
        G: Fn(&S) -> &F + 'static,
        M: Fn(&mut S) -> &mut F + 'static,
    {
        Self::accessor::<F>(name, attrs)
            .with_getter(move |s: &S| get(s).clone())
            .with_setter(move |s: &mut S, value: F| {
                *get_mut(s) = value;
                Ok(())
            })
    }

    /// Descriptor for a computed property; add accessors with
    /// [`with_getter`](Self::with_getter) and [`with_setter`](Self::with_setter)
    pub fn accessor<F: ValueType>(name: &'static str, attrs: BindAttrs) -> Self {
        let choices = declared_choices::<F>(name, &attrs);
        Self {
            name,
            attrs,
            kind: F::kind(),
            choices,
            get: None,
            set: None,
        }
    }

    pub fn with_getter<F, G>(mut self, getter: G) -> Self
    where
        F: ValueType,
        G: Fn(&S) -> F + 'static,
    {
        debug_assert_eq!(F::kind(), self.kind, "getter type of `{}`", self.name);
        self.get = Some(Rc::new(move |s: &S| getter(s).to_value()));
        self
    }

    pub fn with_setter<F, W>(mut self, setter: W) -> Self
    where
        F: ValueType,
        W: Fn(&mut S, F) -> Result<()> + 'static,
    {
        debug_assert_eq!(F::kind(), self.kind, "setter type of `{}`", self.name);
        self.set = Some(Rc::new(move |s: &mut S, value: BindValue| {
            let value = F::from_value(value)?;
            setter(s, value)
        }));
        self
    }

    /// Lift a descriptor of a nested value `S` onto its container `P`
    pub fn project<P, G, M>(self, outer: G, outer_mut: M) -> PropertyDescriptor<P>
    where
        P: 'static,
        G: Fn(&P) -> &S + 'static,
        M: Fn(&mut P) -> &mut S + 'static,
    {
        let get = self.get.map(|get| -> ErasedGet<P> { Rc::new(move |p: &P| get(outer(p))) });
        let set = self.set.map(|set| -> ErasedSet<P> {
            Rc::new(move |p: &mut P, value: BindValue| set(outer_mut(p), value))
        });
        PropertyDescriptor {
            name: self.name,
            attrs: self.attrs,
            kind: self.kind,
            choices: self.choices,
            get,
            set,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn attrs(&self) -> &BindAttrs {
        &self.attrs
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Declared values, or the type's intrinsic choices when none were declared
    pub fn choices(&self) -> &[BindValue] {
        &self.choices
    }

    pub fn is_readable(&self) -> bool {
        self.get.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.set.is_some() && !self.attrs.readonly
    }
}

impl<S> fmt::Debug for PropertyDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("attrs", &self.attrs)
            .field("choices", &self.choices.len())
            .finish()
    }
}

fn declared_choices<F: ValueType>(name: &'static str, attrs: &BindAttrs) -> Vec<BindValue> {
    if attrs.values.is_empty() {
        return F::choices();
    }
    attrs
        .values
        .iter()
        .filter_map(|value| match F::normalize_choice(value.clone()) {
            Ok(normalized) => Some(normalized),
            Err(err) => {
                tracing::warn!("dropping declared value `{}` of `{}`: {}", value, name, err);
                None
            }
        })
        .collect()
}

// =============================================================================
// BINDER
// =============================================================================

/// Produces [`BindableItem`]s from a live target object
#[derive(Clone, Debug)]
pub struct ReflectiveBinder {
    label_case: LabelCase,
}

impl Default for ReflectiveBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflectiveBinder {
    /// Binder using the thread's active configuration
    pub fn new() -> Self {
        Self::with_config(&BindConfig::current())
    }

    pub fn with_config(config: &BindConfig) -> Self {
        Self {
            label_case: config.label_case,
        }
    }

    /// Enumerate the bindable properties of `target`
    ///
    /// Never fails: skipped and unreadable properties are left out, and
    /// properties no control can render come back as
    /// [`ControlKind::Unsupported`].
    pub fn discover<S: Bindable>(&self, target: &Rc<RefCell<S>>) -> Vec<BindableItem> {
        S::descriptors()
            .into_iter()
            .filter_map(|descriptor| self.item(target, descriptor))
            .collect()
    }

    fn item<S: 'static>(&self, target: &Rc<RefCell<S>>, descriptor: PropertyDescriptor<S>) -> Option<BindableItem> {
        let PropertyDescriptor {
            name,
            attrs,
            kind,
            choices,
            get,
            set,
        } = descriptor;

        if attrs.skip {
            return None;
        }
        let Some(get) = get else {
            tracing::debug!("skipping `{}`: no getter", name);
            return None;
        };

        let label = attrs
            .label
            .clone()
            .unwrap_or_else(|| humanize(name, self.label_case));
        let has_range = attrs.min.is_some() || attrs.max.is_some();
        let control = if !attrs.values.is_empty() && choices.is_empty() {
            // every declared value was dropped
            ControlKind::Unsupported
        } else {
            control::resolve(&kind, attrs.control, !choices.is_empty(), has_range)
        };
        if !control.is_supported() {
            tracing::warn!(
                "no control for `{}` of kind {} (declared {:?})",
                name,
                kind,
                attrs.control
            );
        }

        let set = if attrs.readonly { None } else { set };
        Some(BindableItem::new(
            item::ItemMeta {
                name,
                label,
                kind,
                control,
                values: choices,
                min: attrs.min,
                max: attrs.max,
            },
            Rc::clone(target),
            get,
            set,
        ))
    }
}

/// Discover the bindable properties of `target` with the active configuration
pub fn discover<S: Bindable>(target: &Rc<RefCell<S>>) -> Vec<BindableItem> {
    ReflectiveBinder::new().discover(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindError;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Quality {
        Low,
        High,
    }

    crate::bind_eq_by_partial_eq!(Quality);

    impl ValueType for Quality {
        fn kind() -> ValueKind {
            ValueKind::Choice
        }

        fn to_value(&self) -> BindValue {
            BindValue::Choice(format!("{self:?}"))
        }

        fn from_value(value: BindValue) -> Result<Self> {
            match value.as_str() {
                Some("Low") => Ok(Quality::Low),
                Some("High") => Ok(Quality::High),
                _ => Err(BindError::UnknownChoice {
                    value: value.to_string(),
                    type_name: "Quality",
                }),
            }
        }

        fn choices() -> Vec<BindValue> {
            vec![Quality::Low.to_value(), Quality::High.to_value()]
        }
    }

    struct Render {
        quality: Quality,
        scale: f64,
        frames: u32,
    }

    impl Bindable for Render {
        fn descriptors() -> Vec<PropertyDescriptor<Self>> {
            vec![
                PropertyDescriptor::field::<Quality, _, _>(
                    "quality",
                    BindAttrs::new(),
                    |s: &Self| &s.quality,
                    |s: &mut Self| &mut s.quality,
                ),
                PropertyDescriptor::field::<f64, _, _>(
                    "scale",
                    BindAttrs::new().values([BindValue::Integer(1), BindValue::Integer(2)]),
                    |s: &Self| &s.scale,
                    |s: &mut Self| &mut s.scale,
                ),
                PropertyDescriptor::accessor::<u32>("frameCount", BindAttrs::new())
                    .with_getter(|s: &Self| s.frames),
                PropertyDescriptor::accessor::<bool>("write_only", BindAttrs::new())
                    .with_setter(|_: &mut Self, _: bool| Ok(())),
            ]
        }
    }

    fn render() -> Rc<RefCell<Render>> {
        Rc::new(RefCell::new(Render {
            quality: Quality::High,
            scale: 1.0,
            frames: 60,
        }))
    }

    #[test]
    fn test_discover_descriptors() {
        let items = ReflectiveBinder::with_config(&BindConfig::standard()).discover(&render());
        let names: Vec<_> = items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["quality", "scale", "frameCount"]);

        assert_eq!(items[0].control(), ControlKind::Choice);
        assert_eq!(items[0].values(), &Quality::choices()[..]);
        assert_eq!(items[1].values(), &[BindValue::Float(1.0), BindValue::Float(2.0)]);
        assert_eq!(items[2].label(), "FRAME COUNT");
        assert!(items[2].is_readonly());
    }

    #[test]
    fn test_erased_write_reaches_target() {
        let target = render();
        let items = ReflectiveBinder::new().discover(&target);

        items[0].set_value(BindValue::Choice("Low".into())).unwrap();
        assert_eq!(target.borrow().quality, Quality::Low);

        let err = items[0].set_value(BindValue::Choice("Ultra".into())).unwrap_err();
        assert!(matches!(err, BindError::UnknownChoice { .. }));
    }

    #[test]
    fn test_invalid_declared_values_are_dropped() {
        let attrs = BindAttrs::new().values([BindValue::Float(1.5), BindValue::from("fast")]);
        let descriptor = PropertyDescriptor::<Render>::accessor::<f64>("scale", attrs);
        assert_eq!(descriptor.choices(), &[BindValue::Float(1.5)]);
    }

    #[test]
    fn test_all_declared_values_invalid_is_unsupported() {
        struct Speed {
            value: f64,
        }

        impl Bindable for Speed {
            fn descriptors() -> Vec<PropertyDescriptor<Self>> {
                vec![PropertyDescriptor::field::<f64, _, _>(
                    "value",
                    BindAttrs::new().values([BindValue::from("fast"), BindValue::from("slow")]),
                    |s: &Self| &s.value,
                    |s: &mut Self| &mut s.value,
                )]
            }
        }

        let target = Rc::new(RefCell::new(Speed { value: 2.0 }));
        let items = ReflectiveBinder::with_config(&BindConfig::standard()).discover(&target);
        assert_eq!(items.len(), 1);
        assert!(items[0].values().is_empty());
        assert_eq!(items[0].control(), ControlKind::Unsupported);
        assert!(!items[0].is_supported());
        assert_eq!(items[0].value(), Ok(BindValue::Float(2.0)));
    }

    #[test]
    fn test_project() {
        struct Outer {
            render: Render,
        }

        let descriptor = PropertyDescriptor::<Render>::field::<u32, _, _>(
            "frames",
            BindAttrs::new(),
            |s: &Render| &s.frames,
            |s: &mut Render| &mut s.frames,
        )
        .project(|o: &Outer| &o.render, |o: &mut Outer| &mut o.render);

        let mut outer = Outer {
            render: Render {
                quality: Quality::Low,
                scale: 1.0,
                frames: 24,
            },
        };
        let get = descriptor.get.clone().unwrap();
        let set = descriptor.set.clone().unwrap();
        assert_eq!(get(&outer), BindValue::Integer(24));
        set(&mut outer, BindValue::Integer(30)).unwrap();
        assert_eq!(outer.render.frames, 30);
    }
}
