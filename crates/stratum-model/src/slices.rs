use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::features::FeatureDefinition;
use crate::rules::Rule;

/// A context selector: a combination of slicing-property values.
///
/// Opaque to the transpiler; equality is the only operation it needs besides
/// per-property matching for partial-context views.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Slice {
    /// Property name → value, in declaration order.
    pub properties: IndexMap<String, String>,
}

impl Slice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(property.into(), value.into());
        self
    }

    /// Whether this slice assigns `value` to `property`.
    pub fn matches(&self, property: &str, value: &str) -> bool {
        self.properties.get(property).map(String::as_str) == Some(value)
    }
}

/// The features and rules visible for one slice (or several equal slices).
///
/// The model compiler deduplicates slices that would produce identical
/// encodings; such a set lists every slice it represents in `slices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceSet {
    /// Feature definitions visible in this slice, keyed by fully qualified name.
    pub features: IndexMap<String, FeatureDefinition>,
    /// Rules applicable in this slice, in source order.
    pub rules: Vec<Rule>,
    /// The slice(s) this set represents.
    pub slices: Vec<Slice>,
}

impl SliceSet {
    pub fn new(
        features: impl IntoIterator<Item = FeatureDefinition>,
        rules: impl IntoIterator<Item = Rule>,
        slices: impl IntoIterator<Item = Slice>,
    ) -> Self {
        Self {
            features: features.into_iter().map(|f| (f.name.clone(), f)).collect(),
            rules: rules.into_iter().collect(),
            slices: slices.into_iter().collect(),
        }
    }

    /// Whether this set represents the given slice.
    pub fn represents(&self, slice: &Slice) -> bool {
        self.slices.contains(slice)
    }
}

/// The full slice-resolved model: one `SliceSet` per distinct encoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    pub slice_sets: Vec<SliceSet>,
}

impl Model {
    pub fn new(slice_sets: impl IntoIterator<Item = SliceSet>) -> Self {
        Self {
            slice_sets: slice_sets.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Constraint;

    #[test]
    fn slice_matching() {
        let slice = Slice::new().with("region", "eu").with("tier", "gold");
        assert!(slice.matches("region", "eu"));
        assert!(!slice.matches("region", "us"));
        assert!(!slice.matches("missing", "eu"));
    }

    #[test]
    fn slice_set_keys_features_by_name() {
        let set = SliceSet::new(
            [
                FeatureDefinition::boolean("a"),
                FeatureDefinition::boolean("b"),
            ],
            [Rule::constraint("r1", Constraint::feature("a"))],
            [Slice::new().with("region", "eu")],
        );
        assert_eq!(set.features.len(), 2);
        assert_eq!(set.features["a"].name, "a");
        assert!(set.represents(&Slice::new().with("region", "eu")));
        assert!(!set.represents(&Slice::new().with("region", "us")));
    }
}
