#![doc = include_str!("../README.md")]

//! Typed model for the stratum feature/rule language.
//!
//! This crate defines the output interface of the model compiler: typed
//! feature definitions, the sealed rule/constraint AST, and the context
//! slices the transpiler encodes one by one.

pub mod features;
pub mod rules;
pub mod slices;

pub use features::{FeatureDefinition, FeatureKind};
pub use rules::{CmpOp, Constraint, GroupCardinality, Rule, RuleBody};
pub use slices::{Model, Slice, SliceSet};
