use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Comparison operator for enum-order, version and integer predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A node in a rule's constraint tree.
///
/// This hierarchy is sealed: the encoder dispatches over it with an
/// exhaustive `match`, so adding a variant is a compile-time-checked change
/// across the transpiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// Presence of a boolean or versioned-boolean feature.
    Feature(String),
    Not(Box<Constraint>),
    And(Vec<Constraint>),
    Or(Vec<Constraint>),
    Implies(Box<Constraint>, Box<Constraint>),
    Iff(Box<Constraint>, Box<Constraint>),
    /// At most one of the named features is present.
    AtMostOne(Vec<String>),
    /// Exactly one of the named features is present.
    ExactlyOne(Vec<String>),
    /// The enum feature is configured to the given value.
    EnumEq { feature: String, value: String },
    /// The enum feature is configured to a different value.
    EnumNe { feature: String, value: String },
    /// The enum feature is configured to one of the given values.
    EnumIn { feature: String, values: Vec<String> },
    /// The versioned feature is installed at a version satisfying `op version`.
    VersionCmp {
        feature: String,
        op: CmpOp,
        version: u32,
    },
    /// Integer predicate over an int feature. Carried in the model, but not
    /// yet encodable into SAT.
    IntCmp {
        feature: String,
        op: CmpOp,
        value: i64,
    },
}

#[allow(clippy::should_implement_trait)]
impl Constraint {
    pub fn feature(name: impl Into<String>) -> Self {
        Constraint::Feature(name.into())
    }

    pub fn not(self) -> Self {
        Constraint::Not(Box::new(self))
    }

    pub fn and(items: Vec<Constraint>) -> Self {
        Constraint::And(items)
    }

    pub fn or(items: Vec<Constraint>) -> Self {
        Constraint::Or(items)
    }

    pub fn implies(self, other: Constraint) -> Self {
        Constraint::Implies(Box::new(self), Box::new(other))
    }

    pub fn iff(self, other: Constraint) -> Self {
        Constraint::Iff(Box::new(self), Box::new(other))
    }

    pub fn at_most_one(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Constraint::AtMostOne(names.into_iter().map(Into::into).collect())
    }

    pub fn exactly_one(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Constraint::ExactlyOne(names.into_iter().map(Into::into).collect())
    }

    pub fn enum_eq(feature: impl Into<String>, value: impl Into<String>) -> Self {
        Constraint::EnumEq {
            feature: feature.into(),
            value: value.into(),
        }
    }

    pub fn enum_ne(feature: impl Into<String>, value: impl Into<String>) -> Self {
        Constraint::EnumNe {
            feature: feature.into(),
            value: value.into(),
        }
    }

    pub fn enum_in(
        feature: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Constraint::EnumIn {
            feature: feature.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn version_cmp(feature: impl Into<String>, op: CmpOp, version: u32) -> Self {
        Constraint::VersionCmp {
            feature: feature.into(),
            op,
            version,
        }
    }

    pub fn int_cmp(feature: impl Into<String>, op: CmpOp, value: i64) -> Self {
        Constraint::IntCmp {
            feature: feature.into(),
            op,
            value,
        }
    }

    /// Collect every feature name referenced anywhere in this tree.
    pub fn referenced_features(&self, out: &mut IndexSet<String>) {
        match self {
            Constraint::Feature(name) => {
                out.insert(name.clone());
            }
            Constraint::Not(inner) => inner.referenced_features(out),
            Constraint::And(items) | Constraint::Or(items) => {
                for item in items {
                    item.referenced_features(out);
                }
            }
            Constraint::Implies(lhs, rhs) | Constraint::Iff(lhs, rhs) => {
                lhs.referenced_features(out);
                rhs.referenced_features(out);
            }
            Constraint::AtMostOne(names) | Constraint::ExactlyOne(names) => {
                for name in names {
                    out.insert(name.clone());
                }
            }
            Constraint::EnumEq { feature, .. }
            | Constraint::EnumNe { feature, .. }
            | Constraint::EnumIn { feature, .. }
            | Constraint::VersionCmp { feature, .. }
            | Constraint::IntCmp { feature, .. } => {
                out.insert(feature.clone());
            }
        }
    }
}

/// Group membership cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupCardinality {
    /// Exactly one member is present whenever the parent is.
    Mandatory,
    /// At most one member is present.
    Optional,
}

/// The shape of a rule, as resolved by the model compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleBody {
    /// A constraint that must hold as-is.
    Constraint(Constraint),
    /// `condition ⇒ then` and `¬condition ⇒ otherwise`.
    IfThenElse {
        condition: Constraint,
        then_branch: Constraint,
        else_branch: Constraint,
    },
    /// `condition ⇒ ¬excluded`.
    Exclusion {
        condition: Constraint,
        excluded: Constraint,
    },
    /// `feature ⟺ expression`.
    Definition {
        feature: String,
        expression: Constraint,
    },
    /// Grouped membership of boolean sub-features under a parent feature.
    Group {
        parent: String,
        members: Vec<String>,
        cardinality: GroupCardinality,
    },
}

/// A named rule applicable in a slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Source identity of the rule, unique within its rule file.
    pub name: String,
    pub body: RuleBody,
}

impl Rule {
    pub fn constraint(name: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            name: name.into(),
            body: RuleBody::Constraint(constraint),
        }
    }

    pub fn if_then_else(
        name: impl Into<String>,
        condition: Constraint,
        then_branch: Constraint,
        else_branch: Constraint,
    ) -> Self {
        Self {
            name: name.into(),
            body: RuleBody::IfThenElse {
                condition,
                then_branch,
                else_branch,
            },
        }
    }

    pub fn exclusion(name: impl Into<String>, condition: Constraint, excluded: Constraint) -> Self {
        Self {
            name: name.into(),
            body: RuleBody::Exclusion {
                condition,
                excluded,
            },
        }
    }

    pub fn definition(
        name: impl Into<String>,
        feature: impl Into<String>,
        expression: Constraint,
    ) -> Self {
        Self {
            name: name.into(),
            body: RuleBody::Definition {
                feature: feature.into(),
                expression,
            },
        }
    }

    pub fn group(
        name: impl Into<String>,
        parent: impl Into<String>,
        members: impl IntoIterator<Item = impl Into<String>>,
        cardinality: GroupCardinality,
    ) -> Self {
        Self {
            name: name.into(),
            body: RuleBody::Group {
                parent: parent.into(),
                members: members.into_iter().map(Into::into).collect(),
                cardinality,
            },
        }
    }

    /// Collect every feature name referenced by this rule.
    pub fn referenced_features(&self, out: &mut IndexSet<String>) {
        match &self.body {
            RuleBody::Constraint(c) => c.referenced_features(out),
            RuleBody::IfThenElse {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.referenced_features(out);
                then_branch.referenced_features(out);
                else_branch.referenced_features(out);
            }
            RuleBody::Exclusion {
                condition,
                excluded,
            } => {
                condition.referenced_features(out);
                excluded.referenced_features(out);
            }
            RuleBody::Definition {
                feature,
                expression,
            } => {
                out.insert(feature.clone());
                expression.referenced_features(out);
            }
            RuleBody::Group {
                parent, members, ..
            } => {
                out.insert(parent.clone());
                for member in members {
                    out.insert(member.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_features_cover_nested_constraints() {
        let c = Constraint::feature("a")
            .implies(Constraint::or(vec![
                Constraint::enum_eq("color", "red"),
                Constraint::version_cmp("v", CmpOp::Ge, 2),
            ]))
            .iff(Constraint::at_most_one(["x", "y"]));
        let mut out = IndexSet::new();
        c.referenced_features(&mut out);
        let names: Vec<&str> = out.iter().map(String::as_str).collect();
        assert_eq!(names, ["a", "color", "v", "x", "y"]);
    }

    #[test]
    fn group_rule_references_parent_and_members() {
        let rule = Rule::group("g", "parent", ["m1", "m2"], GroupCardinality::Mandatory);
        let mut out = IndexSet::new();
        rule.referenced_features(&mut out);
        let names: Vec<&str> = out.iter().map(String::as_str).collect();
        assert_eq!(names, ["parent", "m1", "m2"]);
    }

    #[test]
    fn definition_rule_references_defined_feature() {
        let rule = Rule::definition("d", "f", Constraint::feature("g"));
        let mut out = IndexSet::new();
        rule.referenced_features(&mut out);
        assert!(out.contains("f"));
        assert!(out.contains("g"));
    }
}
