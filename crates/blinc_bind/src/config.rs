//! Binding engine configuration presets.
//!
//! The active configuration is per thread, matching the single-threaded
//! engine. Hosts install one at startup, typically loaded from TOML:
//!
//! ```ignore
//! let config = BindConfig::from_toml_str(r#"
//!     max_dependency_depth = 32
//!     label_case = "title"
//! "#)?;
//! config.install();
//! ```

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};

/// How humanized identifiers are cased in display labels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelCase {
    /// `max_speed` -> `MAX SPEED`
    #[default]
    Upper,
    /// `max_speed` -> `Max Speed`
    Title,
}

/// Configuration for the binding engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    /// Maximum nesting of `depends_on` re-evaluations on one call stack.
    /// `None` disables the guard (written as `0` in TOML).
    #[serde(with = "depth_limit")]
    pub max_dependency_depth: Option<usize>,
    /// Casing of labels generated from identifiers.
    pub label_case: LabelCase,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl BindConfig {
    /// Standard configuration for general use.
    ///
    /// The dependency guard stops at 256 nested `depends_on` re-evaluations
    /// whether or not the chain is cyclic. Levels past the limit keep their
    /// stale value and log a warning. Graphs that legitimately chain deeper
    /// need a larger limit or [`BindConfig::unchecked`].
    pub fn standard() -> Self {
        Self {
            max_dependency_depth: Some(256),
            label_case: LabelCase::Upper,
        }
    }

    /// Development configuration: cyclic dependency chains fail fast.
    pub fn development() -> Self {
        Self {
            max_dependency_depth: Some(32),
            label_case: LabelCase::Upper,
        }
    }

    /// No recursion guard at all.
    pub fn unchecked() -> Self {
        Self {
            max_dependency_depth: None,
            label_case: LabelCase::Upper,
        }
    }

    /// Set the dependency depth limit.
    pub fn with_max_dependency_depth(mut self, depth: Option<usize>) -> Self {
        self.max_dependency_depth = depth;
        self
    }

    /// Set the label casing.
    pub fn with_label_case(mut self, case: LabelCase) -> Self {
        self.label_case = case;
        self
    }

    /// Parse a configuration from TOML; missing keys take their standard value.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| BindError::Config(e.to_string()))
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| BindError::Config(e.to_string()))
    }

    /// Make this the active configuration of the current thread.
    ///
    /// Returns the previously active configuration.
    pub fn install(self) -> BindConfig {
        ACTIVE.with(|active| active.replace(self))
    }

    /// The active configuration of the current thread.
    pub fn current() -> BindConfig {
        ACTIVE.with(|active| active.borrow().clone())
    }
}

thread_local! {
    static ACTIVE: RefCell<BindConfig> = RefCell::new(BindConfig::standard());
}

mod depth_limit {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(depth: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(depth.map_or(0, |d| d as u64))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let depth = usize::deserialize(deserializer)?;
        Ok((depth > 0).then_some(depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(BindConfig::default(), BindConfig::standard());
        assert!(BindConfig::development().max_dependency_depth < BindConfig::standard().max_dependency_depth);
        assert_eq!(BindConfig::unchecked().max_dependency_depth, None);
    }

    #[test]
    fn test_toml_round_trip() {
        for config in [
            BindConfig::standard(),
            BindConfig::unchecked().with_label_case(LabelCase::Title),
        ] {
            let text = config.to_toml().unwrap();
            assert_eq!(BindConfig::from_toml_str(&text).unwrap(), config);
        }
    }

    #[test]
    fn test_partial_toml() {
        let config = BindConfig::from_toml_str("label_case = \"title\"").unwrap();
        assert_eq!(config.label_case, LabelCase::Title);
        assert_eq!(config.max_dependency_depth, Some(256));

        let config = BindConfig::from_toml_str("max_dependency_depth = 0").unwrap();
        assert_eq!(config.max_dependency_depth, None);
    }

    #[test]
    fn test_invalid_toml() {
        let err = BindConfig::from_toml_str("label_case = \"shouting\"").unwrap_err();
        assert!(matches!(err, BindError::Config(_)));
    }

    #[test]
    fn test_install_is_per_thread() {
        let previous = BindConfig::development().install();
        assert_eq!(BindConfig::current(), BindConfig::development());

        let other = std::thread::spawn(BindConfig::current).join().unwrap();
        assert_eq!(other, BindConfig::standard());

        previous.install();
    }
}
