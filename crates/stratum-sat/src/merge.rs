use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::formula::Formula;
use crate::propositions::{MergedSliceTranslation, ModelTranslation, Proposition, RuleType};

/// Combine every per-slice translation into one global formula.
///
/// Each slice gets a selector namespace (`<prefix><index>`). For every
/// variable any slice knows, each slice receives a renamed local copy glued
/// to the global variable by an equivalence; slices that do not know the
/// variable additionally force their local copy to false, so a feature known
/// only elsewhere can never be asserted in their context. The slice's own
/// propositions are then moved into its namespace by pure substitution.
pub fn merge(translation: &ModelTranslation, selector_prefix: &str) -> MergedSliceTranslation {
    // Union of all known variables, sorted for determinism.
    let mut all_known: Vec<String> = translation
        .slices
        .iter()
        .flat_map(|slice| slice.known_variables.iter().cloned())
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect();
    all_known.sort();
    let known_variables: IndexSet<String> = all_known.iter().cloned().collect();

    let mut selector_slices = IndexMap::new();
    let mut propositions = Vec::new();
    let mut enum_mapping: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
    let mut unknown_features: Option<IndexSet<String>> = None;

    for (index, slice) in translation.slices.iter().enumerate() {
        let selector = format!("{selector_prefix}{index}");
        let renaming: IndexMap<String, String> = all_known
            .iter()
            .map(|kvar| (kvar.clone(), format!("{selector}_{kvar}")))
            .collect();

        for kvar in &all_known {
            let renamed = &renaming[kvar];
            propositions.push(Proposition::domain(
                RuleType::SliceEquivalence,
                index,
                Formula::var(kvar.as_str()).iff(Formula::var(renamed.as_str())),
            ));
            if !slice.known_variables.contains(kvar) {
                propositions.push(Proposition::domain(
                    RuleType::UnknownFeature,
                    index,
                    Formula::var(renamed.as_str()).not(),
                ));
            }
        }

        for proposition in &slice.propositions {
            propositions.push(Proposition {
                rule_type: proposition.rule_type,
                rule: proposition.rule.clone(),
                slice: proposition.slice,
                formula: proposition.formula.substitute(&renaming),
            });
        }

        // Duplicate (feature, value) pairs across slices map to the same
        // un-renamed variable, so a plain union is collision-free.
        for (feature, family) in &slice.enum_mapping {
            enum_mapping
                .entry(feature.clone())
                .or_default()
                .extend(family.iter().map(|(v, var)| (v.clone(), var.clone())));
        }

        unknown_features = Some(match unknown_features.take() {
            None => slice.unknown_features.clone(),
            Some(so_far) => so_far
                .intersection(&slice.unknown_features)
                .cloned()
                .collect(),
        });

        selector_slices.insert(selector, slice.clone());
    }

    debug!(
        slices = translation.slices.len(),
        variables = known_variables.len(),
        propositions = propositions.len(),
        "merged slice translations"
    );

    MergedSliceTranslation {
        selector_slices,
        propositions,
        known_variables,
        enum_mapping,
        unknown_features: unknown_features.unwrap_or_default(),
    }
}
