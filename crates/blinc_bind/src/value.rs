//! Type-erased property values
//!
//! [`BindValue`] is the closed set of value shapes a bindable property can
//! take once its static type has been erased: text, numbers, booleans, 2D
//! vectors, enum-like choices, and sequences of those. [`ValueType`]
//! classifies a Rust type into that set and converts in both directions.
//!
//! Conversions coerce where no information is lost for round-tripping user
//! edits (an integer into a float property, text into a choice), and fail
//! with [`BindError::TypeMismatch`] otherwise.

use std::fmt;

use crate::equality::{sequence_equal, BindEq};
use crate::error::{BindError, Result};

/// 2D vector value
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl BindEq for Vec2 {
    fn bind_eq(&self, other: &Self) -> bool {
        self.x.bind_eq(&other.x) && self.y.bind_eq(&other.y)
    }
}

/// Identifies the static shape of a bindable property
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// UTF-8 string
    Text,
    /// Any primitive integer
    Integer,
    /// `f32` or `f64`
    Float,
    /// Boolean
    Bool,
    /// 2D vector
    Vec2,
    /// One variant out of a fixed set
    Choice,
    /// Sequence of one element kind
    List(Box<ValueKind>),
}

impl ValueKind {
    /// List of `element`
    pub fn list_of(element: ValueKind) -> Self {
        ValueKind::List(Box::new(element))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ValueKind::List(_))
    }

    /// Element kind of a list
    pub fn element(&self) -> Option<&ValueKind> {
        match self {
            ValueKind::List(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Text => f.write_str("Text"),
            ValueKind::Integer => f.write_str("Integer"),
            ValueKind::Float => f.write_str("Float"),
            ValueKind::Bool => f.write_str("Bool"),
            ValueKind::Vec2 => f.write_str("Vec2"),
            ValueKind::Choice => f.write_str("Choice"),
            ValueKind::List(element) => write!(f, "List<{element}>"),
        }
    }
}

/// A property value with its static type erased
#[derive(Clone, Debug, Default, PartialEq)]
pub enum BindValue {
    /// No value
    #[default]
    None,
    /// UTF-8 string
    Text(String),
    /// Integer, widened to 128 bits so every 64-bit value fits
    Integer(i128),
    /// Float, widened to 64 bits
    Float(f64),
    /// Boolean
    Bool(bool),
    /// 2D vector
    Vec2(Vec2),
    /// Name of the selected variant of an enum-like type
    Choice(String),
    /// Sequence of values
    List(Vec<BindValue>),
}

impl BindValue {
    pub fn is_none(&self) -> bool {
        matches!(self, BindValue::None)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            BindValue::None => "None",
            BindValue::Text(_) => "Text",
            BindValue::Integer(_) => "Integer",
            BindValue::Float(_) => "Float",
            BindValue::Bool(_) => "Bool",
            BindValue::Vec2(_) => "Vec2",
            BindValue::Choice(_) => "Choice",
            BindValue::List(_) => "List",
        }
    }

    /// Text or choice name
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BindValue::Text(s) | BindValue::Choice(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert to f64, coercing from Integer if needed
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BindValue::Float(v) => Some(*v),
            BindValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BindValue::Integer(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BindValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[BindValue]> {
        match self {
            BindValue::List(items) => Some(items),
            _ => None,
        }
    }

    fn mismatch(self, expected: ValueKind) -> BindError {
        BindError::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }
}

impl BindEq for BindValue {
    fn bind_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BindValue::None, BindValue::None) => true,
            (BindValue::Text(a), BindValue::Text(b)) => a == b,
            (BindValue::Choice(a), BindValue::Choice(b)) => a == b,
            (BindValue::Integer(a), BindValue::Integer(b)) => a == b,
            (BindValue::Float(a), BindValue::Float(b)) => a.bind_eq(b),
            (BindValue::Bool(a), BindValue::Bool(b)) => a == b,
            (BindValue::Vec2(a), BindValue::Vec2(b)) => a.bind_eq(b),
            (BindValue::List(a), BindValue::List(b)) => sequence_equal(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindValue::None => Ok(()),
            BindValue::Text(s) | BindValue::Choice(s) => f.write_str(s),
            BindValue::Integer(v) => write!(f, "{v}"),
            BindValue::Float(v) => write!(f, "{v}"),
            BindValue::Bool(v) => write!(f, "{v}"),
            BindValue::Vec2(v) => write!(f, "({}, {})", v.x, v.y),
            BindValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

// Conversions used for declared choice literals

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

impl From<bool> for BindValue {
    fn from(v: bool) -> Self {
        BindValue::Bool(v)
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Integer(i128::from(v))
    }
}

impl From<i32> for BindValue {
    fn from(v: i32) -> Self {
        BindValue::Integer(i128::from(v))
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        BindValue::Float(v)
    }
}

impl From<f32> for BindValue {
    fn from(v: f32) -> Self {
        BindValue::Float(f64::from(v))
    }
}

impl From<Vec2> for BindValue {
    fn from(v: Vec2) -> Self {
        BindValue::Vec2(v)
    }
}

// =============================================================================
// VALUE TYPES
// =============================================================================

/// A Rust type that can be bound through a type-erased [`BindValue`]
///
/// Enum-like types get an implementation from `#[derive(Choice)]`.
pub trait ValueType: BindEq + Clone + 'static {
    /// The shape of this type
    fn kind() -> ValueKind;

    /// Erase to a [`BindValue`]
    fn to_value(&self) -> BindValue;

    /// Recover from a [`BindValue`]
    fn from_value(value: BindValue) -> Result<Self>;

    /// Selectable values intrinsic to the type (all variants of an enum)
    fn choices() -> Vec<BindValue> {
        Vec::new()
    }

    /// Coerce a declared choice literal into this type's own value shape
    ///
    /// For sequences the literal describes one element.
    fn normalize_choice(value: BindValue) -> Result<BindValue> {
        Self::from_value(value).map(|v| v.to_value())
    }
}

impl ValueType for String {
    fn kind() -> ValueKind {
        ValueKind::Text
    }

    fn to_value(&self) -> BindValue {
        BindValue::Text(self.clone())
    }

    fn from_value(value: BindValue) -> Result<Self> {
        match value {
            BindValue::Text(s) | BindValue::Choice(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::Text)),
        }
    }
}

impl ValueType for bool {
    fn kind() -> ValueKind {
        ValueKind::Bool
    }

    fn to_value(&self) -> BindValue {
        BindValue::Bool(*self)
    }

    fn from_value(value: BindValue) -> Result<Self> {
        match value {
            BindValue::Bool(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }
}

macro_rules! impl_integer_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ValueType for $ty {
                fn kind() -> ValueKind {
                    ValueKind::Integer
                }

                fn to_value(&self) -> BindValue {
                    BindValue::Integer(*self as i128)
                }

                fn from_value(value: BindValue) -> Result<Self> {
                    match value {
                        BindValue::Integer(v) => <$ty>::try_from(v)
                            .map_err(|e| BindError::conversion::<i128, $ty>(e)),
                        other => Err(other.mismatch(ValueKind::Integer)),
                    }
                }
            }
        )+
    };
}

impl_integer_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl ValueType for f64 {
    fn kind() -> ValueKind {
        ValueKind::Float
    }

    fn to_value(&self) -> BindValue {
        BindValue::Float(*self)
    }

    fn from_value(value: BindValue) -> Result<Self> {
        match value.as_f64() {
            Some(v) => Ok(v),
            None => Err(value.mismatch(ValueKind::Float)),
        }
    }
}

impl ValueType for f32 {
    fn kind() -> ValueKind {
        ValueKind::Float
    }

    fn to_value(&self) -> BindValue {
        BindValue::Float(f64::from(*self))
    }

    fn from_value(value: BindValue) -> Result<Self> {
        match value.as_f64() {
            Some(v) => Ok(v as f32),
            None => Err(value.mismatch(ValueKind::Float)),
        }
    }
}

impl ValueType for Vec2 {
    fn kind() -> ValueKind {
        ValueKind::Vec2
    }

    fn to_value(&self) -> BindValue {
        BindValue::Vec2(*self)
    }

    fn from_value(value: BindValue) -> Result<Self> {
        match value {
            BindValue::Vec2(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Vec2)),
        }
    }
}

impl<T: ValueType> ValueType for Option<T> {
    fn kind() -> ValueKind {
        T::kind()
    }

    fn to_value(&self) -> BindValue {
        match self {
            Some(v) => v.to_value(),
            None => BindValue::None,
        }
    }

    fn from_value(value: BindValue) -> Result<Self> {
        match value {
            BindValue::None => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn choices() -> Vec<BindValue> {
        T::choices()
    }

    fn normalize_choice(value: BindValue) -> Result<BindValue> {
        T::normalize_choice(value)
    }
}

impl<T: ValueType> ValueType for Vec<T> {
    fn kind() -> ValueKind {
        ValueKind::list_of(T::kind())
    }

    fn to_value(&self) -> BindValue {
        BindValue::List(self.iter().map(T::to_value).collect())
    }

    fn from_value(value: BindValue) -> Result<Self> {
        match value {
            BindValue::List(items) => items.into_iter().map(T::from_value).collect(),
            BindValue::None => Ok(Vec::new()),
            other => Err(other.mismatch(Self::kind())),
        }
    }

    fn choices() -> Vec<BindValue> {
        T::choices()
    }

    fn normalize_choice(value: BindValue) -> Result<BindValue> {
        T::normalize_choice(value)
    }
}
