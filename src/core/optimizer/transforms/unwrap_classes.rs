//! A non-negated union class at non-class context with exactly one
//! `Character` or `CharacterSet` child collapses to that child. Scoped
//! to `Alternative` containers (rather than `CharacterClass` itself)
//! since that's exactly what "non-class context" means — an element
//! sitting directly in an alternative's element list, not nested inside
//! another class's own element list.

use crate::core::errors::OnigResult;
use crate::core::nodes::*;
use crate::core::traverser::{Path, Visitor};

pub fn visitor(_flags: Flags) -> Visitor {
    Visitor::new().on("Alternative", rewrite)
}

fn rewrite(path: &mut Path) -> OnigResult<()> {
    let Node::Alternative(a) = path.node() else {
        return Ok(());
    };
    let mut changed = false;
    let new_elements: Vec<Node> = a
        .elements
        .iter()
        .map(|el| match collapsible_child(el) {
            Some(child) => {
                changed = true;
                child.clone()
            }
            None => el.clone(),
        })
        .collect();
    if changed {
        path.replace_with(Node::Alternative(Alternative { elements: new_elements }), false);
    }
    Ok(())
}

fn collapsible_child(node: &Node) -> Option<&Node> {
    let Node::CharacterClass(cc) = node else {
        return None;
    };
    if cc.kind == ClassKind::Union && !cc.negate && cc.elements.len() == 1 {
        if matches!(cc.elements[0], Node::Character(_) | Node::CharacterSet(_)) {
            return Some(&cc.elements[0]);
        }
    }
    None
}
