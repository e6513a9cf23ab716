use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Abstract Boolean formula, solver-agnostic.
///
/// This is the formula collaborator the encoders construct into: constants,
/// named variables, the usual connectives, plus the substitution and
/// evaluation facilities the slice merger and the solver side need. No
/// simplification happens on construction; encoders emit structure as-is so
/// tests can assert on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Formula {
    /// Boolean constant.
    Const(bool),
    /// Variable reference by name.
    Var(String),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
}

#[allow(clippy::should_implement_trait)]
impl Formula {
    pub fn var(name: impl Into<String>) -> Self {
        Formula::Var(name.into())
    }

    pub fn bool(value: bool) -> Self {
        Formula::Const(value)
    }

    pub fn verum() -> Self {
        Formula::Const(true)
    }

    pub fn falsum() -> Self {
        Formula::Const(false)
    }

    pub fn not(self) -> Self {
        Formula::Not(Box::new(self))
    }

    pub fn and(items: Vec<Formula>) -> Self {
        Formula::And(items)
    }

    pub fn or(items: Vec<Formula>) -> Self {
        Formula::Or(items)
    }

    pub fn implies(self, other: Formula) -> Self {
        Formula::Implies(Box::new(self), Box::new(other))
    }

    pub fn iff(self, other: Formula) -> Self {
        Formula::Iff(Box::new(self), Box::new(other))
    }

    /// At-most-one over variable names, as a pairwise conjunction.
    ///
    /// Zero or one variables yield the empty conjunction (a tautology).
    pub fn at_most_one<S: AsRef<str>>(names: &[S]) -> Self {
        let mut pairs = Vec::new();
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                pairs.push(Formula::or(vec![
                    Formula::var(names[i].as_ref()).not(),
                    Formula::var(names[j].as_ref()).not(),
                ]));
            }
        }
        Formula::And(pairs)
    }

    /// Exactly-one over variable names: the disjunction conjoined with the
    /// pairwise at-most-one. Exactly-one of zero variables is unsatisfiable.
    pub fn exactly_one<S: AsRef<str>>(names: &[S]) -> Self {
        if names.is_empty() {
            return Formula::falsum();
        }
        let any = Formula::or(names.iter().map(|n| Formula::var(n.as_ref())).collect());
        Formula::and(vec![any, Formula::at_most_one(names)])
    }

    /// Collect every variable name, in first-occurrence order.
    pub fn variables(&self, out: &mut IndexSet<String>) {
        match self {
            Formula::Const(_) => {}
            Formula::Var(name) => {
                out.insert(name.clone());
            }
            Formula::Not(inner) => inner.variables(out),
            Formula::And(items) | Formula::Or(items) => {
                for item in items {
                    item.variables(out);
                }
            }
            Formula::Implies(lhs, rhs) | Formula::Iff(lhs, rhs) => {
                lhs.variables(out);
                rhs.variables(out);
            }
        }
    }

    /// Rename variables according to `renaming`; unmapped variables stay.
    ///
    /// This is a pure structural substitution, used by the slice merger to
    /// move a slice's propositions into its selector namespace.
    pub fn substitute(&self, renaming: &IndexMap<String, String>) -> Formula {
        match self {
            Formula::Const(value) => Formula::Const(*value),
            Formula::Var(name) => match renaming.get(name) {
                Some(renamed) => Formula::Var(renamed.clone()),
                None => Formula::Var(name.clone()),
            },
            Formula::Not(inner) => inner.substitute(renaming).not(),
            Formula::And(items) => {
                Formula::And(items.iter().map(|f| f.substitute(renaming)).collect())
            }
            Formula::Or(items) => {
                Formula::Or(items.iter().map(|f| f.substitute(renaming)).collect())
            }
            Formula::Implies(lhs, rhs) => lhs
                .substitute(renaming)
                .implies(rhs.substitute(renaming)),
            Formula::Iff(lhs, rhs) => lhs.substitute(renaming).iff(rhs.substitute(renaming)),
        }
    }

    /// Evaluate under a total assignment; variables missing from the
    /// assignment read as false.
    pub fn evaluate(&self, assignment: &IndexMap<String, bool>) -> bool {
        match self {
            Formula::Const(value) => *value,
            Formula::Var(name) => assignment.get(name).copied().unwrap_or(false),
            Formula::Not(inner) => !inner.evaluate(assignment),
            Formula::And(items) => items.iter().all(|f| f.evaluate(assignment)),
            Formula::Or(items) => items.iter().any(|f| f.evaluate(assignment)),
            Formula::Implies(lhs, rhs) => !lhs.evaluate(assignment) || rhs.evaluate(assignment),
            Formula::Iff(lhs, rhs) => lhs.evaluate(assignment) == rhs.evaluate(assignment),
        }
    }
}

/// Enumerate every assignment over `variables` satisfying all `formulas`.
///
/// Brute force over 2^n assignments; intended for tests and for model
/// enumeration over the small variable sets a single feature's domain
/// constraints span.
pub fn enumerate_models(
    formulas: &[&Formula],
    variables: &IndexSet<String>,
) -> Vec<IndexMap<String, bool>> {
    assert!(
        variables.len() < usize::BITS as usize,
        "model enumeration over {} variables is not feasible",
        variables.len()
    );
    let mut models = Vec::new();
    for bits in 0..(1usize << variables.len()) {
        let assignment: IndexMap<String, bool> = variables
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), bits & (1 << i) != 0))
            .collect();
        if formulas.iter().all(|f| f.evaluate(&assignment)) {
            models.push(assignment);
        }
    }
    models
}
