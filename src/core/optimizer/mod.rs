//! Fixed-point orchestrator over the transform catalog (spec.md §4.5).

pub mod transforms;

use std::collections::HashMap;

use super::errors::{OnigError, OnigResult};
use super::nodes::{Flags, Node};
use super::parser::{parse, ParserOptions, ParserRules};
use super::traverser::{traverse, Visitor};
use crate::generator::generate;

const ALL_TRANSFORMS: &[&str] = &[
    "unwrap-classes",
    "unnest-useless-classes",
    "unwrap-negation-wrappers",
    "alternation-to-class",
    "use-shorthands",
    "use-unicode-aliases",
];

/// Options accepted by [`optimize`].
#[derive(Debug, Clone, Default)]
pub struct OptimizerOptions {
    pub flags: String,
    pub rules: ParserRules,
    /// Per-transform on/off override, keyed by the names in
    /// [`ALL_TRANSFORMS`].
    pub overrides: HashMap<String, bool>,
    /// When present, only these transforms are even considered (before
    /// `overrides` is applied on top).
    pub allow: Option<Vec<String>>,
    /// Safety bound on the fixed-point loop; `0` means "use the
    /// default" (100 passes).
    pub max_passes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeOutput {
    pub pattern: String,
    pub ast: Node,
}

/// A thin namespace, mirroring the teacher's associated-function style
/// for grouping related free functions under one type.
pub struct Optimizer;

impl Optimizer {
    /// The default enable/disable map, with every name in `disable`
    /// forced off. Mirrors `getOptionalOptimizations({disable})`.
    pub fn default_optimizations(disable: &[&str]) -> HashMap<String, bool> {
        ALL_TRANSFORMS
            .iter()
            .map(|t| (t.to_string(), !disable.contains(t)))
            .collect()
    }
}

pub fn optimize(source: &str, options: OptimizerOptions) -> OnigResult<OptimizeOutput> {
    let parser_options = ParserOptions {
        flags: options.flags.clone(),
        rules: options.rules.clone(),
        ..Default::default()
    };
    let mut ast = parse(source, parser_options)?;
    let active = resolve_active_transforms(&options);
    let max_passes = if options.max_passes == 0 { 100 } else { options.max_passes };

    let mut previous = generate(&ast)?.pattern;
    for _ in 0..max_passes {
        let flags = regex_flags(&ast)?;
        let mut visitor = build_visitor(&active, flags);
        traverse(&mut ast, &mut visitor)?;
        let current = generate(&ast)?.pattern;
        if current == previous {
            return Ok(OptimizeOutput { pattern: current, ast });
        }
        previous = current;
    }
    Err(OnigError::OptimizerNonConverging { passes: max_passes })
}

fn regex_flags(ast: &Node) -> OnigResult<Flags> {
    if let Node::Regex(r) = ast {
        if let Node::Flags(f) = r.flags.as_ref() {
            return Ok(*f);
        }
    }
    Err(OnigError::invariant("optimize expects a Regex root with a Flags node"))
}

fn resolve_active_transforms(options: &OptimizerOptions) -> Vec<&'static str> {
    let mut active: Vec<&'static str> = match &options.allow {
        Some(allow) => ALL_TRANSFORMS
            .iter()
            .filter(|t| allow.iter().any(|a| a == *t))
            .copied()
            .collect(),
        None => ALL_TRANSFORMS.to_vec(),
    };
    active.retain(|t| *options.overrides.get(*t).unwrap_or(&true));
    active
}

fn build_visitor(active: &[&'static str], flags: Flags) -> Visitor {
    let mut v = Visitor::new();
    for name in active {
        let transform_visitor = match *name {
            "unwrap-classes" => transforms::unwrap_classes::visitor(flags),
            "unnest-useless-classes" => transforms::unnest_useless_classes::visitor(flags),
            "unwrap-negation-wrappers" => transforms::unwrap_negation_wrappers::visitor(flags),
            "alternation-to-class" => transforms::alternation_to_class::visitor(flags),
            "use-shorthands" => transforms::use_shorthands::visitor(flags),
            "use-unicode-aliases" => transforms::use_unicode_aliases::visitor(flags),
            _ => Visitor::new(),
        };
        v = v.merge(transform_visitor);
    }
    v
}
