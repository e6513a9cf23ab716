#![doc = include_str!("../README.md")]

//! Transpiler pipeline: [`transpile::transpile_model`] encodes every slice,
//! [`transpile::merge_slices`] combines the per-slice results into one
//! global formula with per-slice selector namespaces.

pub mod encoder;
pub mod error;
pub mod formula;
pub mod merge;
pub mod propositions;
pub mod transpile;
pub mod vars;
pub mod versions;

pub use error::TranspileError;
pub use formula::Formula;
pub use propositions::{
    MergedSliceTranslation, ModelTranslation, Proposition, RuleType, SliceTranslation,
};
pub use transpile::{merge_slices, transpile_model, TranspileOptions, TranspileStats};
