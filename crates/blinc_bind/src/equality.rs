//! Equality oracle for loop suppression
//!
//! A model property only accepts a value coming back from a view when
//! [`values_equal`] says it differs from the current one. The comparison is
//! graded:
//!
//! 1. identity (`Rc::ptr_eq`, same slice) or the scalar's own `==`
//! 2. an empty/default sentinel (`None`, empty sequence) against a non-empty
//!    value is unequal without looking further
//! 3. sequences compare elementwise, in order, short-circuiting on length or
//!    the first mismatching pair; strings are atomic scalars
//! 4. otherwise the type's own equality
//!
//! Floats treat `NaN` as equal to `NaN`. With IEEE semantics a NaN-valued
//! property would never compare equal to the value its own view echoes back.

use std::collections::VecDeque;
use std::rc::Rc;

/// Value-level equality used to decide whether a write is a real change
pub trait BindEq {
    fn bind_eq(&self, other: &Self) -> bool;
}

/// Whether `a` and `b` are the same value for binding purposes
pub fn values_equal<T: BindEq + ?Sized>(a: &T, b: &T) -> bool {
    a.bind_eq(b)
}

/// Elementwise, order-sensitive sequence comparison
pub fn sequence_equal<T: BindEq>(a: &[T], b: &[T]) -> bool {
    if std::ptr::eq(a, b) {
        return true;
    }
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).all(|(x, y)| x.bind_eq(y))
}

/// Implement [`BindEq`] through `PartialEq` for one or more types
///
/// ```ignore
/// #[derive(Clone, PartialEq)]
/// struct Waypoint { x: i32, y: i32 }
///
/// blinc_bind::bind_eq_by_partial_eq!(Waypoint);
/// ```
#[macro_export]
macro_rules! bind_eq_by_partial_eq {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::BindEq for $ty {
                fn bind_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )+
    };
}

bind_eq_by_partial_eq!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    String,
    str,
);

impl BindEq for f32 {
    fn bind_eq(&self, other: &Self) -> bool {
        self == other || (self.is_nan() && other.is_nan())
    }
}

impl BindEq for f64 {
    fn bind_eq(&self, other: &Self) -> bool {
        self == other || (self.is_nan() && other.is_nan())
    }
}

impl<T: BindEq + ?Sized> BindEq for &T {
    fn bind_eq(&self, other: &Self) -> bool {
        (**self).bind_eq(*other)
    }
}

impl<T: BindEq + ?Sized> BindEq for Box<T> {
    fn bind_eq(&self, other: &Self) -> bool {
        (**self).bind_eq(&**other)
    }
}

impl<T: BindEq + ?Sized> BindEq for Rc<T> {
    fn bind_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other) || (**self).bind_eq(&**other)
    }
}

impl<T: BindEq> BindEq for Option<T> {
    fn bind_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.bind_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: BindEq> BindEq for [T] {
    fn bind_eq(&self, other: &Self) -> bool {
        sequence_equal(self, other)
    }
}

impl<T: BindEq> BindEq for Vec<T> {
    fn bind_eq(&self, other: &Self) -> bool {
        sequence_equal(self, other)
    }
}

impl<T: BindEq, const N: usize> BindEq for [T; N] {
    fn bind_eq(&self, other: &Self) -> bool {
        sequence_equal(self, other)
    }
}

impl<T: BindEq> BindEq for VecDeque<T> {
    fn bind_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(x, y)| x.bind_eq(y))
    }
}

impl<A: BindEq, B: BindEq> BindEq for (A, B) {
    fn bind_eq(&self, other: &Self) -> bool {
        self.0.bind_eq(&other.0) && self.1.bind_eq(&other.1)
    }
}
