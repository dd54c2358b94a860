//! The transform catalog (spec.md §4.5). Each submodule exposes a
//! single `visitor(flags) -> Visitor` constructor; `flags` is the
//! parsed pattern's flag record, since several transforms are gated on
//! it (and per spec.md, transforms may read `root.flags` but never
//! mutate it).

pub mod alternation_to_class;
pub mod unnest_useless_classes;
pub mod unwrap_classes;
pub mod unwrap_negation_wrappers;
pub mod use_shorthands;
pub mod use_unicode_aliases;
