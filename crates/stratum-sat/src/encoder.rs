use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use stratum_model::{Constraint, FeatureKind, GroupCardinality, Rule, RuleBody, SliceSet};

use crate::error::TranspileError;
use crate::formula::Formula;
use crate::propositions::{Proposition, RuleType, SliceTranslation};
use crate::vars;
use crate::versions::VersionEncoding;

/// Encode one slice's rules and feature definitions into a translation.
///
/// Unknown feature references never abort encoding; they are neutralized to
/// constant false (plain and predicate references) or filtered out of
/// at-most-one/exactly-one groups. The only error condition is an integer
/// predicate, which cannot be encoded yet.
///
/// `restrictions` are caller-supplied ad hoc formulas appended after the
/// domain constraints, tagged [`RuleType::Restriction`].
pub fn encode_slice(
    slice_set: &SliceSet,
    slice_index: usize,
    restrictions: &[Formula],
) -> Result<SliceTranslation, TranspileError> {
    let mut state = EncodingState::new(slice_set, slice_index);

    let mut propositions = Vec::new();
    for rule in &slice_set.rules {
        let formula = state.translate_rule(rule)?;
        propositions.push(Proposition::rule(&rule.name, slice_index, formula));
    }
    propositions.extend(state.enum_domain.drain(..));
    propositions.extend(state.versions.propositions.drain(..));
    propositions.extend(
        restrictions
            .iter()
            .map(|f| Proposition::restriction(slice_index, f.clone())),
    );

    let mut known_variables = state.boolean_variables.clone();
    for family in state.enum_mapping.values() {
        known_variables.extend(family.values().cloned());
    }
    known_variables.extend(state.versions.variables.iter().cloned());

    debug!(
        slice = slice_index,
        variables = known_variables.len(),
        propositions = propositions.len(),
        unknown = state.unknown_features.len(),
        "encoded slice"
    );

    Ok(SliceTranslation {
        slice_set: slice_set.clone(),
        propositions,
        known_variables,
        enum_mapping: state.enum_mapping,
        version_mapping: state.versions.mapping.clone(),
        unknown_features: state.unknown_features,
    })
}

/// Mutable per-slice state; created at the start of [`encode_slice`] and
/// discarded when the translation is assembled.
struct EncodingState<'a> {
    slice_set: &'a SliceSet,
    unknown_features: IndexSet<String>,
    boolean_variables: IndexSet<String>,
    enum_mapping: IndexMap<String, IndexMap<String, String>>,
    enum_domain: Vec<Proposition>,
    versions: VersionEncoding,
}

impl<'a> EncodingState<'a> {
    fn new(slice_set: &'a SliceSet, slice_index: usize) -> Self {
        let mut referenced = IndexSet::new();
        for rule in &slice_set.rules {
            rule.referenced_features(&mut referenced);
        }
        let unknown_features: IndexSet<String> = referenced
            .into_iter()
            .filter(|name| !slice_set.features.contains_key(name))
            .collect();

        let mut boolean_variables = IndexSet::new();
        let mut enum_mapping: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        let mut enum_domain = Vec::new();
        for (name, definition) in &slice_set.features {
            match &definition.kind {
                FeatureKind::Bool | FeatureKind::VersionedBool => {
                    boolean_variables.insert(name.clone());
                }
                FeatureKind::Enum { values } => {
                    // Eager: the full one-hot family and its exactly-one
                    // constraint exist whether or not any rule mentions them.
                    let family: IndexMap<String, String> = values
                        .iter()
                        .map(|value| (value.clone(), vars::enum_var(name, value)))
                        .collect();
                    let family_vars: Vec<&String> = family.values().collect();
                    enum_domain.push(Proposition::domain(
                        RuleType::EnumDomain,
                        slice_index,
                        Formula::exactly_one(&family_vars),
                    ));
                    enum_mapping.insert(name.clone(), family);
                }
                FeatureKind::Int => {}
            }
        }

        let versions = VersionEncoding::build(slice_set, slice_index);

        Self {
            slice_set,
            unknown_features,
            boolean_variables,
            enum_mapping,
            enum_domain,
            versions,
        }
    }

    /// Presence variable of a feature, or constant false when the feature is
    /// unknown in this slice: an absent feature can never be asserted true.
    fn presence(&self, name: &str) -> Formula {
        if self.boolean_variables.contains(name) {
            return Formula::var(name);
        }
        assert!(
            !self.slice_set.features.contains_key(name),
            "feature '{name}' is defined in this slice but carries no presence variable"
        );
        Formula::falsum()
    }

    /// One-hot family of an enum feature; `None` when the feature is unknown
    /// in this slice.
    fn enum_family(&self, feature: &str) -> Option<&IndexMap<String, String>> {
        match self.enum_mapping.get(feature) {
            Some(family) => Some(family),
            None => {
                assert!(
                    !self.slice_set.features.contains_key(feature),
                    "feature '{feature}' is defined in this slice but has no one-hot family"
                );
                None
            }
        }
    }

    /// Keep only group members this slice has a presence variable for.
    ///
    /// Unknown members are dropped, not replaced by false: the group's
    /// commitments as a whole must stay satisfiable.
    fn known_members<'b>(&self, names: &'b [String]) -> Vec<&'b String> {
        names
            .iter()
            .filter(|name| self.boolean_variables.contains(name.as_str()))
            .collect()
    }

    fn translate_rule(&mut self, rule: &Rule) -> Result<Formula, TranspileError> {
        match &rule.body {
            RuleBody::Constraint(c) => self.translate(c, &rule.name),
            RuleBody::IfThenElse {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.translate(condition, &rule.name)?;
                let then_branch = self.translate(then_branch, &rule.name)?;
                let else_branch = self.translate(else_branch, &rule.name)?;
                Ok(Formula::or(vec![
                    Formula::and(vec![condition.clone(), then_branch]),
                    Formula::and(vec![condition.not(), else_branch]),
                ]))
            }
            RuleBody::Exclusion {
                condition,
                excluded,
            } => {
                let condition = self.translate(condition, &rule.name)?;
                let excluded = self.translate(excluded, &rule.name)?;
                Ok(condition.implies(excluded.not()))
            }
            RuleBody::Definition {
                feature,
                expression,
            } => {
                let expression = self.translate(expression, &rule.name)?;
                Ok(self.presence(feature).iff(expression))
            }
            RuleBody::Group {
                parent,
                members,
                cardinality,
            } => {
                let members = self.known_members(members);
                let group = match cardinality {
                    GroupCardinality::Mandatory => Formula::exactly_one(&members),
                    GroupCardinality::Optional => Formula::at_most_one(&members),
                };
                let any_member =
                    Formula::or(members.iter().map(|m| Formula::var(m.as_str())).collect());
                Ok(Formula::and(vec![
                    group,
                    self.presence(parent).iff(any_member),
                ]))
            }
        }
    }

    fn translate(&self, constraint: &Constraint, rule: &str) -> Result<Formula, TranspileError> {
        match constraint {
            Constraint::Feature(name) => Ok(self.presence(name)),
            Constraint::Not(inner) => Ok(self.translate(inner, rule)?.not()),
            Constraint::And(items) => Ok(Formula::and(
                items
                    .iter()
                    .map(|c| self.translate(c, rule))
                    .collect::<Result<_, _>>()?,
            )),
            Constraint::Or(items) => Ok(Formula::or(
                items
                    .iter()
                    .map(|c| self.translate(c, rule))
                    .collect::<Result<_, _>>()?,
            )),
            Constraint::Implies(lhs, rhs) => Ok(self
                .translate(lhs, rule)?
                .implies(self.translate(rhs, rule)?)),
            Constraint::Iff(lhs, rhs) => {
                Ok(self.translate(lhs, rule)?.iff(self.translate(rhs, rule)?))
            }
            Constraint::AtMostOne(names) => Ok(Formula::at_most_one(&self.known_members(names))),
            Constraint::ExactlyOne(names) => Ok(Formula::exactly_one(&self.known_members(names))),
            Constraint::EnumEq { feature, value } => Ok(match self.enum_family(feature) {
                Some(family) => match family.get(value) {
                    Some(var) => Formula::var(var),
                    // Undeclared value: the predicate can never hold.
                    None => Formula::falsum(),
                },
                None => Formula::falsum(),
            }),
            Constraint::EnumNe { feature, value } => Ok(match self.enum_family(feature) {
                Some(family) => match family.get(value) {
                    Some(var) => Formula::var(var).not(),
                    None => Formula::verum(),
                },
                None => Formula::verum(),
            }),
            Constraint::EnumIn { feature, values } => Ok(match self.enum_family(feature) {
                Some(family) => Formula::or(
                    values
                        .iter()
                        .map(|value| match family.get(value) {
                            Some(var) => Formula::var(var),
                            None => Formula::falsum(),
                        })
                        .collect(),
                ),
                None => Formula::falsum(),
            }),
            Constraint::VersionCmp {
                feature,
                op,
                version,
            } => {
                let versioned = matches!(
                    self.slice_set.features.get(feature).map(|f| &f.kind),
                    Some(FeatureKind::VersionedBool)
                );
                if versioned {
                    Ok(self.versions.comparison(feature, *op, *version))
                } else {
                    // Unknown in this slice (or not versioned, which the
                    // model compiler rejects upstream): never satisfiable.
                    Ok(Formula::falsum())
                }
            }
            Constraint::IntCmp { feature, .. } => Err(TranspileError::UnsupportedIntPredicate {
                rule: rule.to_string(),
                feature: feature.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_model::{CmpOp, FeatureDefinition, Slice};

    fn slice(features: Vec<FeatureDefinition>, rules: Vec<Rule>) -> SliceSet {
        SliceSet::new(features, rules, [Slice::new()])
    }

    #[test]
    fn unknown_boolean_reference_becomes_false() {
        let set = slice(
            vec![FeatureDefinition::boolean("a")],
            vec![Rule::constraint(
                "r",
                Constraint::feature("a").implies(Constraint::feature("ghost")),
            )],
        );
        let t = encode_slice(&set, 0, &[]).unwrap();
        assert_eq!(
            t.propositions[0].formula,
            Formula::var("a").implies(Formula::falsum())
        );
        assert!(t.unknown_features.contains("ghost"));
        assert!(!t.known_variables.contains("ghost"));
    }

    #[test]
    fn unknown_members_are_dropped_from_groups() {
        let set = slice(
            vec![
                FeatureDefinition::boolean("a"),
                FeatureDefinition::boolean("b"),
            ],
            vec![Rule::constraint(
                "r",
                Constraint::exactly_one(["a", "b", "ghost"]),
            )],
        );
        let t = encode_slice(&set, 0, &[]).unwrap();
        assert_eq!(
            t.propositions[0].formula,
            Formula::exactly_one(&["a", "b"])
        );
    }

    #[test]
    fn if_then_else_compiles_to_case_split() {
        let set = slice(
            vec![
                FeatureDefinition::boolean("c"),
                FeatureDefinition::boolean("t"),
                FeatureDefinition::boolean("e"),
            ],
            vec![Rule::if_then_else(
                "r",
                Constraint::feature("c"),
                Constraint::feature("t"),
                Constraint::feature("e"),
            )],
        );
        let t = encode_slice(&set, 0, &[]).unwrap();
        assert_eq!(
            t.propositions[0].formula,
            Formula::or(vec![
                Formula::and(vec![Formula::var("c"), Formula::var("t")]),
                Formula::and(vec![Formula::var("c").not(), Formula::var("e")]),
            ])
        );
    }

    #[test]
    fn exclusion_compiles_to_guarded_negation() {
        let set = slice(
            vec![
                FeatureDefinition::boolean("a"),
                FeatureDefinition::boolean("b"),
            ],
            vec![Rule::exclusion(
                "r",
                Constraint::feature("a"),
                Constraint::feature("b"),
            )],
        );
        let t = encode_slice(&set, 0, &[]).unwrap();
        assert_eq!(
            t.propositions[0].formula,
            Formula::var("a").implies(Formula::var("b").not())
        );
    }

    #[test]
    fn group_with_unknown_parent_forces_members_out() {
        let set = slice(
            vec![
                FeatureDefinition::boolean("m1"),
                FeatureDefinition::boolean("m2"),
            ],
            vec![Rule::group(
                "g",
                "ghost_parent",
                ["m1", "m2"],
                GroupCardinality::Optional,
            )],
        );
        let t = encode_slice(&set, 0, &[]).unwrap();
        assert_eq!(
            t.propositions[0].formula,
            Formula::and(vec![
                Formula::at_most_one(&["m1", "m2"]),
                Formula::falsum().iff(Formula::or(vec![
                    Formula::var("m1"),
                    Formula::var("m2"),
                ])),
            ])
        );
    }

    #[test]
    fn enum_predicates_on_unknown_features_use_polarity_constants() {
        let set = slice(
            vec![],
            vec![
                Rule::constraint("eq", Constraint::enum_eq("ghost", "x")),
                Rule::constraint("ne", Constraint::enum_ne("ghost", "x")),
                Rule::constraint("in", Constraint::enum_in("ghost", ["x", "y"])),
            ],
        );
        let t = encode_slice(&set, 0, &[]).unwrap();
        assert_eq!(t.propositions[0].formula, Formula::falsum());
        assert_eq!(t.propositions[1].formula, Formula::verum());
        assert_eq!(t.propositions[2].formula, Formula::falsum());
    }

    #[test]
    fn int_predicates_surface_as_unsupported() {
        let set = slice(
            vec![FeatureDefinition::int("count")],
            vec![Rule::constraint(
                "r",
                Constraint::int_cmp("count", CmpOp::Ge, 3),
            )],
        );
        let err = encode_slice(&set, 0, &[]).unwrap_err();
        assert_eq!(
            err,
            TranspileError::UnsupportedIntPredicate {
                rule: "r".to_string(),
                feature: "count".to_string(),
            }
        );
    }

    #[test]
    fn restrictions_are_appended_after_domain_constraints() {
        let set = slice(
            vec![FeatureDefinition::enumeration("color", ["red", "green"])],
            vec![Rule::constraint("r", Constraint::enum_eq("color", "red"))],
        );
        let t = encode_slice(&set, 0, &[Formula::var("color=red").not()]).unwrap();
        let kinds: Vec<RuleType> = t.propositions.iter().map(|p| p.rule_type).collect();
        assert_eq!(
            kinds,
            [RuleType::Rule, RuleType::EnumDomain, RuleType::Restriction]
        );
    }

    #[test]
    #[should_panic(expected = "no presence variable")]
    fn boolean_reference_to_enum_feature_is_an_encoder_bug() {
        let set = slice(
            vec![FeatureDefinition::enumeration("color", ["red"])],
            vec![Rule::constraint("r", Constraint::feature("color"))],
        );
        let _ = encode_slice(&set, 0, &[]);
    }
}
