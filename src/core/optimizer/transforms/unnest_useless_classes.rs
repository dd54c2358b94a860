//! Inside another class, a non-negated inner union class is flattened
//! into the outer one. When the inner union is the outer's *only*
//! child, the outer's `negate` XORs with the inner's instead of being
//! dropped (the wrapping survives, just collapsed by one level).
//! Singleton intersection children are unnested to their sole member.

use crate::core::errors::OnigResult;
use crate::core::nodes::*;
use crate::core::traverser::{Path, Visitor};

pub fn visitor(_flags: Flags) -> Visitor {
    Visitor::new().on("CharacterClass", rewrite)
}

fn rewrite(path: &mut Path) -> OnigResult<()> {
    let Node::CharacterClass(cc) = path.node() else {
        return Ok(());
    };
    if cc.kind != ClassKind::Union {
        return Ok(());
    }

    if cc.elements.len() == 1 {
        if let Node::CharacterClass(inner) = &cc.elements[0] {
            if inner.kind == ClassKind::Union {
                let new_node = create_character_class(
                    ClassKind::Union,
                    cc.negate ^ inner.negate,
                    inner.elements.clone(),
                );
                path.replace_with(new_node, false);
                return Ok(());
            }
        }
    }

    let mut changed = false;
    let mut new_elements = Vec::with_capacity(cc.elements.len());
    for el in &cc.elements {
        match el {
            Node::CharacterClass(inner) if inner.kind == ClassKind::Union && !inner.negate => {
                changed = true;
                new_elements.extend(inner.elements.iter().cloned());
            }
            Node::CharacterClass(inner) if inner.kind == ClassKind::Intersection && inner.elements.len() == 1 => {
                changed = true;
                new_elements.push(inner.elements[0].clone());
            }
            other => new_elements.push(other.clone()),
        }
    }
    if changed {
        path.replace_with(
            create_character_class(ClassKind::Union, cc.negate, new_elements),
            false,
        );
    }
    Ok(())
}
