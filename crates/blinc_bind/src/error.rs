//! Error types for blinc_bind

use thiserror::Error;

use crate::value::ValueKind;

/// Errors that can occur while reading, writing, or adapting bound values
///
/// Writing to a disabled property is not an error; it is a defined no-op.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    /// A type-erased setter received a value of the wrong kind
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: &'static str,
    },

    /// A choice name that does not name any variant of the target type
    #[error("`{value}` is not a variant of {type_name}")]
    UnknownChoice {
        value: String,
        type_name: &'static str,
    },

    /// A conversion function rejected its input
    #[error("cannot convert {from} to {to}: {reason}")]
    Conversion {
        from: &'static str,
        to: &'static str,
        reason: String,
    },

    /// Write through a type-erased accessor of a read-only property
    #[error("property `{property}` is read-only")]
    ReadOnly { property: &'static str },

    /// The bound target object is already mutably borrowed
    #[error("target of property `{property}` is already borrowed")]
    TargetBusy { property: &'static str },

    /// Nested dependency re-evaluation exceeded the configured depth
    #[error("dependency re-evaluation exceeded depth {depth}; is the dependency graph cyclic?")]
    DependencyDepthExceeded { depth: usize },

    /// A cached typed adapter was requested again with a different element type
    #[error("adapter already cached as {cached}, cannot reinterpret as {requested}")]
    AdapterCastConflict {
        cached: &'static str,
        requested: &'static str,
    },

    /// Invalid configuration
    #[error("invalid bind configuration: {0}")]
    Config(String),

    /// Failure reported by a user-supplied callback
    #[error("{0}")]
    Callback(String),
}

impl BindError {
    /// Build a [`BindError::Conversion`] naming the Rust types involved
    pub fn conversion<Src: ?Sized, Dst: ?Sized>(reason: impl ToString) -> Self {
        BindError::Conversion {
            from: std::any::type_name::<Src>(),
            to: std::any::type_name::<Dst>(),
            reason: reason.to_string(),
        }
    }
}

impl From<anyhow::Error> for BindError {
    fn from(err: anyhow::Error) -> Self {
        BindError::Callback(format!("{err:#}"))
    }
}

/// Result type for blinc_bind operations
pub type Result<T> = std::result::Result<T, BindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = BindError::TypeMismatch {
            expected: ValueKind::Float,
            found: "Text",
        };
        assert_eq!(err.to_string(), "type mismatch: expected Float, found Text");

        let err = BindError::conversion::<str, i32>("invalid digit found in string");
        assert_eq!(
            err.to_string(),
            "cannot convert str to i32: invalid digit found in string"
        );
    }

    #[test]
    fn test_from_anyhow() {
        let err: BindError = anyhow::anyhow!("disk full").context("saving speed").into();
        assert_eq!(err, BindError::Callback("saving speed: disk full".into()));
    }
}
