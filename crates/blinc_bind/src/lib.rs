//! Blinc Property Bindings
//!
//! This crate keeps model values and UI controls in sync:
//!
//! - **Model Properties**: observable values with bidirectional view sync
//! - **Equality Oracle**: value-level comparison that suppresses update loops
//! - **Binding Adapters**: type-converting views (a float edited in a text box)
//! - **Reflective Discovery**: `#[derive(Bindable)]` structs turned into
//!   type-erased items a generic inspector can render
//!
//! Everything is single-threaded and synchronous; handles are `Rc` based.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use blinc_bind::{adapters, ModelProperty, ViewBinding, ViewCell};
//!
//! let speed = ModelProperty::new(1.5f64);
//!
//! // A text box showing the speed
//! let text = Rc::new(ViewCell::new(String::new()));
//! speed.attach(Rc::new(adapters::parsed::<f64>(text.clone()))).unwrap();
//! assert_eq!(text.get(), "1.5");
//!
//! // The user types a new value
//! text.input("2.25".to_string()).unwrap();
//! assert_eq!(speed.get(), 2.25);
//!
//! // The model changes
//! speed.set(3.0).unwrap();
//! assert_eq!(text.value().unwrap(), "3");
//! ```

pub mod adapter;
pub mod config;
pub mod equality;
pub mod error;
pub mod event;
pub mod property;
pub mod reflect;
pub mod value;
pub mod view;

pub use adapter::{adapters, BindingAdapter, TypedViewSlot};
pub use config::{BindConfig, LabelCase};
pub use equality::{sequence_equal, values_equal, BindEq};
pub use error::{BindError, Result};
pub use event::{ChangeEvent, ChangeHandler, HandlerId, Subscription};
pub use property::ModelProperty;
pub use reflect::{
    discover, humanize, resolve_control, BindAttrs, Bindable, BindableItem, ControlKind,
    PropertyDescriptor, ReflectiveBinder,
};
pub use value::{BindValue, ValueKind, ValueType, Vec2};
pub use view::{ViewBinding, ViewCell};

// Derive macros share their names with the traits they implement
pub use blinc_bind_macros::{Bindable, Choice};
