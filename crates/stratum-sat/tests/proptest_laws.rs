//! Property-based tests for the encoding laws.

use indexmap::{IndexMap, IndexSet};
use proptest::prelude::*;

use stratum_model::{CmpOp, Constraint, FeatureDefinition, Model, Rule, Slice, SliceSet};
use stratum_sat::formula::enumerate_models;
use stratum_sat::{transpile_model, RuleType, SliceTranslation, TranspileOptions};

fn translate_single(features: Vec<FeatureDefinition>, rules: Vec<Rule>) -> SliceTranslation {
    let model = Model::new([SliceSet::new(features, rules, [Slice::new()])]);
    transpile_model(&model, &TranspileOptions::default())
        .unwrap()
        .slices
        .remove(0)
}

/// Boolean-only constraint trees over a fixed feature alphabet.
fn bool_constraint(features: &'static [&'static str]) -> impl Strategy<Value = Constraint> {
    let leaf = prop::sample::select(features.to_vec()).prop_map(Constraint::feature);
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|c| c.not()),
            prop::collection::vec(inner.clone(), 1..3).prop_map(Constraint::and),
            prop::collection::vec(inner.clone(), 1..3).prop_map(Constraint::or),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.implies(b)),
            (inner.clone(), inner).prop_map(|(a, b)| a.iff(b)),
        ]
    })
}

/// Reference interpretation of a boolean-only constraint.
fn interpret(c: &Constraint, assignment: &IndexMap<String, bool>) -> bool {
    match c {
        Constraint::Feature(name) => assignment.get(name).copied().unwrap_or(false),
        Constraint::Not(inner) => !interpret(inner, assignment),
        Constraint::And(items) => items.iter().all(|c| interpret(c, assignment)),
        Constraint::Or(items) => items.iter().any(|c| interpret(c, assignment)),
        Constraint::Implies(lhs, rhs) => {
            !interpret(lhs, assignment) || interpret(rhs, assignment)
        }
        Constraint::Iff(lhs, rhs) => interpret(lhs, assignment) == interpret(rhs, assignment),
        other => panic!("not a boolean-only constraint: {other:?}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The enum-domain constraint admits exactly one model per declared value.
    #[test]
    fn enum_exactly_one_law(value_count in 1usize..=5) {
        let values: Vec<String> = (0..value_count).map(|i| format!("v{i}")).collect();
        let slice = translate_single(
            vec![FeatureDefinition::enumeration("e", values.clone())],
            vec![],
        );
        let exo = &slice
            .propositions_of(RuleType::EnumDomain)
            .next()
            .unwrap()
            .formula;
        let vars: IndexSet<String> = slice.enum_mapping["e"].values().cloned().collect();
        let models = enumerate_models(&[exo], &vars);
        prop_assert_eq!(models.len(), value_count);
    }

    /// The version-domain constraints admit exactly M+1 models.
    #[test]
    fn version_cardinality_law(max in 1u32..=2) {
        let slice = translate_single(
            vec![FeatureDefinition::versioned("v")],
            vec![Rule::constraint(
                "cap",
                Constraint::version_cmp("v", CmpOp::Le, max),
            )],
        );
        let domain: Vec<_> = slice
            .propositions
            .iter()
            .filter(|p| p.rule_type != RuleType::Rule)
            .map(|p| &p.formula)
            .collect();
        let models = enumerate_models(&domain, &slice.known_variables);
        prop_assert_eq!(models.len(), max as usize + 1);
    }

    /// Boolean-only rules translate to formulas that agree with the direct
    /// interpretation of the constraint on every assignment.
    #[test]
    fn boolean_translation_agrees_with_interpretation(
        constraint in bool_constraint(&["a", "b", "c"]),
    ) {
        let slice = translate_single(
            vec![
                FeatureDefinition::boolean("a"),
                FeatureDefinition::boolean("b"),
                FeatureDefinition::boolean("c"),
            ],
            vec![Rule::constraint("r", constraint.clone())],
        );
        let formula = &slice.propositions[0].formula;
        let names = ["a", "b", "c"];
        for bits in 0..8u32 {
            let assignment: IndexMap<String, bool> = names
                .iter()
                .enumerate()
                .map(|(i, n)| (n.to_string(), bits & (1 << i) != 0))
                .collect();
            prop_assert_eq!(formula.evaluate(&assignment), interpret(&constraint, &assignment));
        }
    }

    /// Merging never invents models inside a slice's namespace: for a single
    /// slice, the merged and direct model counts coincide.
    #[test]
    fn merge_preserves_model_count(constraint in bool_constraint(&["a", "b"])) {
        let options = TranspileOptions::default();
        let model = Model::new([SliceSet::new(
            [
                FeatureDefinition::boolean("a"),
                FeatureDefinition::boolean("b"),
            ],
            [Rule::constraint("r", constraint)],
            [Slice::new()],
        )]);
        let translation = transpile_model(&model, &options).unwrap();
        let direct_refs: Vec<_> = translation.slices[0]
            .propositions
            .iter()
            .map(|p| &p.formula)
            .collect();
        let direct_vars = translation.slices[0].known_variables.clone();
        let direct = enumerate_models(&direct_refs, &direct_vars);

        let merged = stratum_sat::merge_slices(&translation, &options);
        let merged_refs: Vec<_> = merged.propositions.iter().map(|p| &p.formula).collect();
        let mut merged_vars = IndexSet::new();
        for f in &merged_refs {
            f.variables(&mut merged_vars);
        }
        let merged_models = enumerate_models(&merged_refs, &merged_vars);
        prop_assert_eq!(merged_models.len(), direct.len());
    }
}
