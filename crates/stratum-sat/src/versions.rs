use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use stratum_model::{CmpOp, Constraint, FeatureKind, Rule, RuleBody, SliceSet};

use crate::formula::Formula;
use crate::propositions::{Proposition, RuleType};
use crate::vars;

/// Maximum relevant version per versioned feature in a slice.
///
/// Scans every version comparison against a feature the slice defines as
/// versioned. For `=`, `≠`, `≥`, `≤` the referenced version itself counts;
/// for `>` it is version+1 and for `<` it is version−1, the smallest ladder
/// index that can still distinguish the strict comparison. Features whose
/// maximum works out to zero get no entry: nothing needs encoding for them.
pub fn relevant_versions(slice_set: &SliceSet) -> IndexMap<String, u32> {
    let mut maxima: IndexMap<String, u32> = IndexMap::new();
    for rule in &slice_set.rules {
        scan_rule(rule, slice_set, &mut maxima);
    }
    maxima.retain(|_, max| *max >= 1);
    maxima
}

fn scan_rule(rule: &Rule, slice_set: &SliceSet, maxima: &mut IndexMap<String, u32>) {
    match &rule.body {
        RuleBody::Constraint(c) => scan_constraint(c, slice_set, maxima),
        RuleBody::IfThenElse {
            condition,
            then_branch,
            else_branch,
        } => {
            scan_constraint(condition, slice_set, maxima);
            scan_constraint(then_branch, slice_set, maxima);
            scan_constraint(else_branch, slice_set, maxima);
        }
        RuleBody::Exclusion {
            condition,
            excluded,
        } => {
            scan_constraint(condition, slice_set, maxima);
            scan_constraint(excluded, slice_set, maxima);
        }
        RuleBody::Definition { expression, .. } => scan_constraint(expression, slice_set, maxima),
        RuleBody::Group { .. } => {}
    }
}

fn scan_constraint(c: &Constraint, slice_set: &SliceSet, maxima: &mut IndexMap<String, u32>) {
    match c {
        Constraint::VersionCmp {
            feature,
            op,
            version,
        } => {
            let versioned = matches!(
                slice_set.features.get(feature).map(|f| &f.kind),
                Some(FeatureKind::VersionedBool)
            );
            if !versioned {
                return;
            }
            let relevant = match op {
                CmpOp::Eq | CmpOp::Ne | CmpOp::Ge | CmpOp::Le => *version,
                CmpOp::Gt => version.saturating_add(1),
                CmpOp::Lt => version.saturating_sub(1),
            };
            let entry = maxima.entry(feature.clone()).or_insert(0);
            *entry = (*entry).max(relevant);
        }
        Constraint::Not(inner) => scan_constraint(inner, slice_set, maxima),
        Constraint::And(items) | Constraint::Or(items) => {
            for item in items {
                scan_constraint(item, slice_set, maxima);
            }
        }
        Constraint::Implies(lhs, rhs) | Constraint::Iff(lhs, rhs) => {
            scan_constraint(lhs, slice_set, maxima);
            scan_constraint(rhs, slice_set, maxima);
        }
        Constraint::Feature(_)
        | Constraint::AtMostOne(_)
        | Constraint::ExactlyOne(_)
        | Constraint::EnumEq { .. }
        | Constraint::EnumNe { .. }
        | Constraint::EnumIn { .. }
        | Constraint::IntCmp { .. } => {}
    }
}

/// Order (ladder) encoding of every versioned feature compared in a slice.
///
/// For a feature with maximum relevant version `M`, the encoding introduces
/// installed-at-exactly variables `v_1..v_M` plus four threshold families
/// per index (at-or-above, at-or-below, and their negative duals), linked by
/// neighbor equivalences clamped at the 1 and `M` boundaries. Per feature it
/// additionally emits an at-most-one over `v_1..v_M` and an equivalence
/// between the presence variable and the disjunction of all `v_k`.
#[derive(Debug)]
pub struct VersionEncoding {
    /// Feature → (version → installed-at-exactly variable).
    pub mapping: IndexMap<String, IndexMap<u32, String>>,
    /// Every variable the encoding introduced, exact and threshold alike.
    pub variables: IndexSet<String>,
    /// Ladder, at-most-one and presence-equivalence propositions, in that
    /// order per feature.
    pub propositions: Vec<Proposition>,
    maxima: IndexMap<String, u32>,
}

impl VersionEncoding {
    /// Build the encoding for one slice. Empty when no rule compares versions.
    pub fn build(slice_set: &SliceSet, slice_index: usize) -> Self {
        let maxima = relevant_versions(slice_set);
        let mut mapping: IndexMap<String, IndexMap<u32, String>> = IndexMap::new();
        let mut variables = IndexSet::new();
        let mut propositions = Vec::new();

        for (feature, &max) in &maxima {
            debug!(feature = feature.as_str(), max, "building version ladder");
            let mut exact = IndexMap::new();
            for k in 1..=max {
                let var = vars::exact_version_var(feature, k);
                variables.insert(var.clone());
                exact.insert(k, var);
            }
            for k in 1..=max {
                variables.insert(vars::at_least_version_var(feature, k));
                variables.insert(vars::at_most_version_var(feature, k));
                variables.insert(vars::not_at_least_version_var(feature, k));
                variables.insert(vars::not_at_most_version_var(feature, k));
            }

            for k in 1..=max {
                let exact_k = Formula::var(&exact[&k]);
                // at-or-above(k) ⟺ v_k ∨ at-or-above(k+1), clamped at M.
                let above_next = if k + 1 <= max {
                    Formula::var(vars::at_least_version_var(feature, k + 1))
                } else {
                    Formula::falsum()
                };
                propositions.push(Proposition::domain(
                    RuleType::VersionLadder,
                    slice_index,
                    Formula::var(vars::at_least_version_var(feature, k))
                        .iff(Formula::or(vec![exact_k.clone(), above_next])),
                ));
                // at-or-below(k) ⟺ v_k ∨ at-or-below(k−1), clamped at 1.
                let below_prev = if k > 1 {
                    Formula::var(vars::at_most_version_var(feature, k - 1))
                } else {
                    Formula::falsum()
                };
                propositions.push(Proposition::domain(
                    RuleType::VersionLadder,
                    slice_index,
                    Formula::var(vars::at_most_version_var(feature, k))
                        .iff(Formula::or(vec![exact_k, below_prev])),
                ));
                // Negative duals.
                propositions.push(Proposition::domain(
                    RuleType::VersionLadder,
                    slice_index,
                    Formula::var(vars::not_at_least_version_var(feature, k))
                        .iff(Formula::var(vars::at_least_version_var(feature, k)).not()),
                ));
                propositions.push(Proposition::domain(
                    RuleType::VersionLadder,
                    slice_index,
                    Formula::var(vars::not_at_most_version_var(feature, k))
                        .iff(Formula::var(vars::at_most_version_var(feature, k)).not()),
                ));
            }

            let exact_names: Vec<&String> = exact.values().collect();
            propositions.push(Proposition::domain(
                RuleType::VersionAmo,
                slice_index,
                Formula::at_most_one(&exact_names),
            ));
            propositions.push(Proposition::domain(
                RuleType::VersionPresence,
                slice_index,
                Formula::var(feature).iff(Formula::or(
                    exact.values().map(Formula::var).collect(),
                )),
            ));

            mapping.insert(feature.clone(), exact);
        }

        Self {
            mapping,
            variables,
            propositions,
            maxima,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Maximum relevant version for a feature, if any comparison produced one.
    pub fn max_version(&self, feature: &str) -> Option<u32> {
        self.maxima.get(feature).copied()
    }

    /// Translate one comparison against a known versioned feature.
    ///
    /// `>` and `≥` are both routed through at-or-above(version+1), matching
    /// the behavior in production today; do not change one without the other
    /// until the intended `≥` semantics are confirmed.
    pub fn comparison(&self, feature: &str, op: CmpOp, version: u32) -> Formula {
        let max = self.maxima.get(feature).copied().unwrap_or(0);
        match op {
            CmpOp::Eq => match self.mapping.get(feature).and_then(|m| m.get(&version)) {
                Some(var) => Formula::var(var),
                None => Formula::falsum(),
            },
            CmpOp::Ne => Formula::or(vec![
                self.at_most(feature, version.wrapping_sub(1), max),
                self.at_least(feature, version.saturating_add(1), max),
            ]),
            CmpOp::Lt => self.at_most(feature, version.wrapping_sub(1), max),
            CmpOp::Le => self.at_most(feature, version, max),
            CmpOp::Gt | CmpOp::Ge => self.at_least(feature, version.saturating_add(1), max),
        }
    }

    /// At-or-above threshold variable, constant false beyond the ladder.
    fn at_least(&self, feature: &str, k: u32, max: u32) -> Formula {
        if k >= 1 && k <= max {
            Formula::var(vars::at_least_version_var(feature, k))
        } else {
            Formula::falsum()
        }
    }

    /// At-or-below threshold variable. Below 1 nothing is installed; above
    /// the ladder maximum the index cannot occur, since every comparison
    /// contributed its version to the maximum.
    fn at_most(&self, feature: &str, k: u32, max: u32) -> Formula {
        if k == 0 || k == u32::MAX {
            return Formula::falsum();
        }
        assert!(
            k <= max,
            "at-or-below {k} exceeds encoded maximum {max} for '{feature}'"
        );
        Formula::var(vars::at_most_version_var(feature, k))
    }
}
