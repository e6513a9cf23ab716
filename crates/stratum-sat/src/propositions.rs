use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use stratum_model::{Slice, SliceSet};

use crate::formula::Formula;

/// Why a proposition exists. Closed tag set; exactly one per proposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Directly translated source rule.
    Rule,
    /// Exactly-one constraint over an enum feature's one-hot family.
    EnumDomain,
    /// Order-encoding ladder clause for a versioned feature.
    VersionLadder,
    /// At most one installed-at-exactly version variable true.
    VersionAmo,
    /// Feature presence ⟺ some version installed.
    VersionPresence,
    /// Forces a variable unknown in a slice to false in that slice's namespace.
    UnknownFeature,
    /// Glue between a global variable and its slice-local rename.
    SliceEquivalence,
    /// User-supplied ad hoc restriction.
    Restriction,
}

/// A provenance-tagged formula.
///
/// Created only by the encoder components, never mutated afterwards, and
/// handed to the solver collaborator as a plain value. The rule reference is
/// the source rule's name; the slice reference is the index of the
/// originating `SliceSet` within the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proposition {
    pub rule_type: RuleType,
    pub rule: Option<String>,
    pub slice: Option<usize>,
    pub formula: Formula,
}

impl Proposition {
    /// Proposition for a translated source rule.
    pub fn rule(name: impl Into<String>, slice: usize, formula: Formula) -> Self {
        Self {
            rule_type: RuleType::Rule,
            rule: Some(name.into()),
            slice: Some(slice),
            formula,
        }
    }

    /// Domain or glue proposition not tied to a single source rule.
    pub fn domain(rule_type: RuleType, slice: usize, formula: Formula) -> Self {
        Self {
            rule_type,
            rule: None,
            slice: Some(slice),
            formula,
        }
    }

    /// User-supplied ad hoc restriction.
    pub fn restriction(slice: usize, formula: Formula) -> Self {
        Self {
            rule_type: RuleType::Restriction,
            rule: None,
            slice: Some(slice),
            formula,
        }
    }
}

/// The immutable result of encoding one slice.
///
/// `propositions` is ordered: source-rule propositions in input rule order,
/// then enum-domain constraints, then version-domain constraints, then ad
/// hoc restrictions. That order is part of the observable contract.
#[derive(Debug, Clone)]
pub struct SliceTranslation {
    pub slice_set: SliceSet,
    pub propositions: Vec<Proposition>,
    /// Every variable this slice knows: presence variables plus all enum and
    /// version auxiliary variables.
    pub known_variables: IndexSet<String>,
    /// Enum feature → (declared value → one-hot variable).
    pub enum_mapping: IndexMap<String, IndexMap<String, String>>,
    /// Versioned feature → (version → installed-at-exactly variable), only
    /// up to the maximum version compared in this slice.
    pub version_mapping: IndexMap<String, IndexMap<u32, String>>,
    /// Features referenced by a rule but not defined in this slice.
    pub unknown_features: IndexSet<String>,
}

impl SliceTranslation {
    /// Propositions of one provenance kind.
    pub fn propositions_of(&self, rule_type: RuleType) -> impl Iterator<Item = &Proposition> {
        self.propositions
            .iter()
            .filter(move |p| p.rule_type == rule_type)
    }

    /// Propositions translated from source rules, in input order.
    pub fn original_rules(&self) -> impl Iterator<Item = &Proposition> {
        self.propositions_of(RuleType::Rule)
    }
}

/// One `SliceTranslation` per distinct `SliceSet`, in model order.
#[derive(Debug, Clone, Default)]
pub struct ModelTranslation {
    pub slices: Vec<SliceTranslation>,
}

impl ModelTranslation {
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SliceTranslation> {
        self.slices.iter()
    }

    /// The translation whose slice set represents the given context.
    pub fn get(&self, context: &Slice) -> Option<&SliceTranslation> {
        self.slices.iter().find(|t| t.slice_set.represents(context))
    }

    /// All translations with at least one slice assigning `value` to
    /// `property` — the deduplicated partial-context view.
    pub fn matching(&self, property: &str, value: &str) -> Vec<&SliceTranslation> {
        self.slices
            .iter()
            .filter(|t| {
                t.slice_set
                    .slices
                    .iter()
                    .any(|s| s.matches(property, value))
            })
            .collect()
    }
}

/// The result of merging every slice of a model into one global formula.
///
/// Derived once from a `ModelTranslation`, never mutated. Consumed directly
/// by a solver that reasons across all slices simultaneously.
#[derive(Debug, Clone)]
pub struct MergedSliceTranslation {
    /// Selector namespace → the slice translation it stands for.
    pub selector_slices: IndexMap<String, SliceTranslation>,
    /// Glue propositions and renamed per-slice propositions, slice-major.
    pub propositions: Vec<Proposition>,
    /// Union of every slice's known variables, sorted, un-renamed.
    pub known_variables: IndexSet<String>,
    /// Union of the per-slice enum mappings, un-renamed.
    pub enum_mapping: IndexMap<String, IndexMap<String, String>>,
    /// Features unknown in every slice.
    pub unknown_features: IndexSet<String>,
}

impl MergedSliceTranslation {
    pub fn propositions_of(&self, rule_type: RuleType) -> impl Iterator<Item = &Proposition> {
        self.propositions
            .iter()
            .filter(move |p| p.rule_type == rule_type)
    }
}
