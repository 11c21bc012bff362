//! View-side binding contract
//!
//! A concrete control (text box, toggle, slider, list) implements
//! [`ViewBinding<T>`] for the value type it natively edits. The control owns
//! its [`ChangeEvent`] and fires it when the user changes the value. Whether
//! an external `set_value` also fires it is up to the control; the model side
//! copes with both through its equality guard.
//!
//! [`ViewCell<T>`] is an in-memory control, useful for headless hosts and
//! for tests.

use std::cell::RefCell;
use std::fmt;

use crate::error::Result;
use crate::event::ChangeEvent;

/// The contract a control satisfies to be bound to a model property
pub trait ViewBinding<T> {
    /// Current value shown by the control
    ///
    /// Must be a pure query. Adapters may fail here when their conversion
    /// rejects the control's content.
    fn value(&self) -> Result<T>;

    /// Replace the value shown by the control
    fn set_value(&self, value: T) -> Result<()>;

    /// Fired with the new value when the control's value changes
    fn changed(&self) -> &ChangeEvent<T>;
}

/// In-memory control
///
/// [`ViewCell::input`] simulates a user edit: it stores the value and fires
/// the change event. Whether `set_value` fires it too depends on how the cell
/// was created ([`ViewCell::new`] stays quiet, [`ViewCell::echoing`] fires).
pub struct ViewCell<T> {
    value: RefCell<T>,
    changed: ChangeEvent<T>,
    echo: bool,
}

impl<T: Clone + 'static> ViewCell<T> {
    /// A control that only fires on user input
    pub fn new(initial: T) -> Self {
        Self {
            value: RefCell::new(initial),
            changed: ChangeEvent::new(),
            echo: false,
        }
    }

    /// A control that also fires when its value is set programmatically
    pub fn echoing(initial: T) -> Self {
        Self {
            echo: true,
            ..Self::new(initial)
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Simulate the user editing the control
    pub fn input(&self, value: T) -> Result<()> {
        self.value.replace(value.clone());
        self.changed.emit(&value)
    }

    pub fn is_echoing(&self) -> bool {
        self.echo
    }
}

impl<T: Clone + 'static> ViewBinding<T> for ViewCell<T> {
    fn value(&self) -> Result<T> {
        Ok(self.get())
    }

    fn set_value(&self, value: T) -> Result<()> {
        self.value.replace(value.clone());
        if self.echo {
            self.changed.emit(&value)?;
        }
        Ok(())
    }

    fn changed(&self) -> &ChangeEvent<T> {
        &self.changed
    }
}

impl<T: fmt::Debug> fmt::Debug for ViewCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCell")
            .field("value", &self.value.borrow())
            .field("echo", &self.echo)
            .field("handlers", &self.changed.len())
            .finish()
    }
}
