use thiserror::Error;

/// Errors surfaced by the transpiler.
///
/// Unknown feature references are never errors: they degrade to constant
/// false or are filtered out of groups, as defined by the encoder. Internal
/// invariant violations (a feature present in the slice's feature map with
/// no registered variable) are programming errors and panic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranspileError {
    /// Integer predicates cannot be encoded yet; failing loudly here avoids
    /// handing the solver a silently wrong formula.
    #[error("integer predicates are not supported yet (rule '{rule}', feature '{feature}')")]
    UnsupportedIntPredicate { rule: String, feature: String },
}
