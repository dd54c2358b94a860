//! In any alternative-container, runs of adjacent alternatives each
//! consisting of a single single-length element (`Character`,
//! `CharacterClass`, or a fixed-length `CharacterSet`) fuse into one
//! alternative containing a union class. A run of length one is
//! unchanged.

use crate::core::errors::OnigResult;
use crate::core::nodes::*;
use crate::core::traverser::{Path, Visitor};

pub fn visitor(_flags: Flags) -> Visitor {
    Visitor::new()
        .on("Pattern", rewrite)
        .on("Group", rewrite)
        .on("CapturingGroup", rewrite)
        .on("AbsentFunction", rewrite)
        .on("LookaroundAssertion", rewrite)
}

fn rewrite(path: &mut Path) -> OnigResult<()> {
    let alternatives = match path.node() {
        Node::Pattern(p) => &p.alternatives,
        Node::Group(g) => &g.alternatives,
        Node::CapturingGroup(g) => &g.alternatives,
        Node::AbsentFunction(a) => &a.alternatives,
        Node::LookaroundAssertion(l) => &l.alternatives,
        _ => return Ok(()),
    };
    let fused = fuse_runs(alternatives);
    if fused == *alternatives {
        return Ok(());
    }
    let new_node = match path.node().clone() {
        Node::Pattern(mut p) => {
            p.alternatives = fused;
            Node::Pattern(p)
        }
        Node::Group(mut g) => {
            g.alternatives = fused;
            Node::Group(g)
        }
        Node::CapturingGroup(mut g) => {
            g.alternatives = fused;
            Node::CapturingGroup(g)
        }
        Node::AbsentFunction(mut a) => {
            a.alternatives = fused;
            Node::AbsentFunction(a)
        }
        Node::LookaroundAssertion(mut l) => {
            l.alternatives = fused;
            Node::LookaroundAssertion(l)
        }
        other => other,
    };
    path.replace_with(new_node, false);
    Ok(())
}

fn single_length_member(alt: &Node) -> Option<&Node> {
    let Node::Alternative(a) = alt else {
        return None;
    };
    if a.elements.len() != 1 {
        return None;
    }
    match &a.elements[0] {
        Node::Character(_) | Node::CharacterClass(_) => Some(&a.elements[0]),
        Node::CharacterSet(cs) if !cs.variable_length => Some(&a.elements[0]),
        _ => None,
    }
}

fn fuse_runs(alternatives: &[Node]) -> Vec<Node> {
    let mut out = Vec::with_capacity(alternatives.len());
    let mut i = 0;
    while i < alternatives.len() {
        match single_length_member(&alternatives[i]) {
            None => {
                out.push(alternatives[i].clone());
                i += 1;
            }
            Some(first) => {
                let mut run = vec![first.clone()];
                let mut j = i + 1;
                while j < alternatives.len() {
                    match single_length_member(&alternatives[j]) {
                        Some(member) => {
                            run.push(member.clone());
                            j += 1;
                        }
                        None => break,
                    }
                }
                if run.len() > 1 {
                    let class = create_character_class(ClassKind::Union, false, run);
                    out.push(create_alternative(vec![class]));
                } else {
                    out.push(alternatives[i].clone());
                }
                i = j;
            }
        }
    }
    out
}
