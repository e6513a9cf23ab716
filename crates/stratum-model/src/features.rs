use serde::{Deserialize, Serialize};

/// Kind of a feature definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Plain boolean presence feature.
    Bool,
    /// Bounded integer feature. Predicates over these are accepted by the
    /// model but are not yet encodable into SAT.
    Int,
    /// Closed enumeration over a fixed, ordered value set.
    Enum {
        /// Declared values, in declaration order.
        values: Vec<String>,
    },
    /// Boolean feature annotated as versioned: either absent, or installed
    /// at exactly one positive integer version.
    VersionedBool,
}

/// A feature definition as visible inside one slice.
///
/// Identity is the fully qualified name (module path included); the model
/// compiler guarantees uniqueness per slice and never mutates a definition
/// after compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDefinition {
    /// Fully qualified feature name.
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureDefinition {
    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Bool,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Int,
        }
    }

    pub fn enumeration(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Enum {
                values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn versioned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::VersionedBool,
        }
    }

    /// Whether this feature carries a boolean presence variable.
    pub fn has_presence_variable(&self) -> bool {
        matches!(self.kind, FeatureKind::Bool | FeatureKind::VersionedBool)
    }

    /// Declared enum values, if this is an enum feature.
    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.kind {
            FeatureKind::Enum { values } => Some(values),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_variables_only_for_boolean_kinds() {
        assert!(FeatureDefinition::boolean("a").has_presence_variable());
        assert!(FeatureDefinition::versioned("b").has_presence_variable());
        assert!(!FeatureDefinition::int("c").has_presence_variable());
        assert!(!FeatureDefinition::enumeration("d", ["x"]).has_presence_variable());
    }

    #[test]
    fn enum_values_preserve_declaration_order() {
        let f = FeatureDefinition::enumeration("color", ["red", "green", "blue"]);
        assert_eq!(f.enum_values().unwrap(), ["red", "green", "blue"]);
        assert_eq!(FeatureDefinition::boolean("b").enum_values(), None);
    }
}
