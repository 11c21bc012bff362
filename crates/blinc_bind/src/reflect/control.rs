//! Control kinds and control routing

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

/// Which kind of control should render a bindable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Single-line text box
    Text,
    /// Numeric input
    Number,
    /// Numeric input with a range
    Slider,
    /// Checkbox or switch
    Toggle,
    /// Two-component vector input
    Vector,
    /// One value out of a fixed set
    Choice,
    /// Several values out of a fixed set
    MultiChoice,
    /// No control can render this property
    Unsupported,
}

impl ControlKind {
    /// Whether this control can edit values of `kind`
    pub fn accepts(&self, kind: &ValueKind) -> bool {
        match self {
            ControlKind::Text => matches!(
                kind,
                ValueKind::Text | ValueKind::Integer | ValueKind::Float | ValueKind::Choice
            ),
            ControlKind::Number | ControlKind::Slider => kind.is_numeric(),
            ControlKind::Toggle => *kind == ValueKind::Bool,
            ControlKind::Vector => *kind == ValueKind::Vec2,
            ControlKind::Choice => !kind.is_list(),
            ControlKind::MultiChoice => kind.is_list(),
            ControlKind::Unsupported => false,
        }
    }

    pub fn is_supported(&self) -> bool {
        *self != ControlKind::Unsupported
    }

    /// Whether the control needs a fixed set of values to offer
    pub fn needs_choices(&self) -> bool {
        matches!(self, ControlKind::Choice | ControlKind::MultiChoice)
    }

    /// Get the display name for this control.
    pub fn display_name(&self) -> &'static str {
        match self {
            ControlKind::Text => "Text",
            ControlKind::Number => "Number",
            ControlKind::Slider => "Slider",
            ControlKind::Toggle => "Toggle",
            ControlKind::Vector => "Vector",
            ControlKind::Choice => "Choice",
            ControlKind::MultiChoice => "Multi Choice",
            ControlKind::Unsupported => "Unsupported",
        }
    }

    /// Parse the name used in `#[bind(control = ...)]`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(ControlKind::Text),
            "number" => Some(ControlKind::Number),
            "slider" => Some(ControlKind::Slider),
            "toggle" => Some(ControlKind::Toggle),
            "vector" => Some(ControlKind::Vector),
            "choice" => Some(ControlKind::Choice),
            "multi_choice" => Some(ControlKind::MultiChoice),
            _ => None,
        }
    }
}

/// Pick the control for a property
///
/// A fixed value set wins: scalars get [`ControlKind::Choice`], sequences
/// [`ControlKind::MultiChoice`]. Next comes a declared control, kept only if
/// it can edit `kind`. Otherwise the control is inferred from `kind`;
/// numbers with a range get a slider.
pub fn resolve(kind: &ValueKind, declared: Option<ControlKind>, has_choices: bool, has_range: bool) -> ControlKind {
    if has_choices {
        return if kind.is_list() {
            ControlKind::MultiChoice
        } else {
            ControlKind::Choice
        };
    }

    if let Some(control) = declared {
        return if control.accepts(kind) && !control.needs_choices() {
            control
        } else {
            ControlKind::Unsupported
        };
    }

    match kind {
        ValueKind::Text => ControlKind::Text,
        ValueKind::Integer | ValueKind::Float if has_range => ControlKind::Slider,
        ValueKind::Integer | ValueKind::Float => ControlKind::Number,
        ValueKind::Bool => ControlKind::Toggle,
        ValueKind::Vec2 => ControlKind::Vector,
        // A choice type with no variants has nothing to offer
        ValueKind::Choice => ControlKind::Unsupported,
        ValueKind::List(_) => ControlKind::Unsupported,
    }
}
