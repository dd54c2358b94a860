//! Oniguruma regex-source AST parser, traverser and optimizer.
//!
//! Parses Oniguruma regular-expression source text into an AST, exposes
//! a generic tree-traversal facility with in-place mutation primitives,
//! and runs a fixed-point pipeline of AST-to-AST optimizations before
//! serializing the AST back to Oniguruma source.
//!
//! # Modules
//!
//! - `core`: the parser/traverser/optimizer triad plus the shared AST.
//! - `generator`: serializes an AST back to Oniguruma source.
//! - `unicode`: the Unicode property-name table the parser and the
//!   `use-shorthands`/`use-unicode-aliases` transforms consult.

pub mod core;
pub mod generator;
pub mod unicode;

pub use core::errors::{OnigError, OnigResult};
pub use core::nodes::{Flags, Node};
pub use core::optimizer::{optimize, OptimizeOutput, Optimizer, OptimizerOptions};
pub use core::parser::{parse, ParserOptions, ParserRules};
pub use core::traverser::{traverse, Path, Visitor};
pub use generator::{generate, GenerateOutput};
