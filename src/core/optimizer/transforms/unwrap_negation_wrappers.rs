//! A negated single-child union class whose child is a `CharacterSet`
//! collapses by flipping the set's own `negate`. Separately, in
//! non-class context, `[^\n]` becomes `\N` — except directly under a
//! non-lazy quantifier, where Oniguruma has a known bug with the
//! shorthand form, so the rewrite is suppressed there.

use crate::core::errors::OnigResult;
use crate::core::nodes::*;
use crate::core::traverser::{Path, Visitor};

pub fn visitor(_flags: Flags) -> Visitor {
    Visitor::new()
        .on("CharacterClass", unwrap_set_negation)
        .on("Alternative", unwrap_standalone_newline)
        .on("Quantifier", unwrap_lazy_quantified_newline)
}

fn unwrap_set_negation(path: &mut Path) -> OnigResult<()> {
    let Node::CharacterClass(cc) = path.node() else {
        return Ok(());
    };
    if cc.kind == ClassKind::Union && cc.negate && cc.elements.len() == 1 {
        if let Node::CharacterSet(cs) = &cc.elements[0] {
            let mut flipped = cs.clone();
            flipped.negate = !flipped.negate;
            path.replace_with(Node::CharacterSet(flipped), false);
        }
    }
    Ok(())
}

fn is_negated_newline_class(node: &Node) -> bool {
    matches!(node, Node::CharacterClass(cc)
        if cc.kind == ClassKind::Union
            && cc.negate
            && cc.elements.len() == 1
            && matches!(&cc.elements[0], Node::Character(c) if c.value == '\n' as u32))
}

fn newline_shorthand() -> Node {
    create_character_set(CharacterSetKind::Newline, None, true)
}

fn unwrap_standalone_newline(path: &mut Path) -> OnigResult<()> {
    let Node::Alternative(a) = path.node() else {
        return Ok(());
    };
    let mut changed = false;
    let new_elements: Vec<Node> = a
        .elements
        .iter()
        .map(|el| {
            if is_negated_newline_class(el) {
                changed = true;
                newline_shorthand()
            } else {
                el.clone()
            }
        })
        .collect();
    if changed {
        path.replace_with(Node::Alternative(Alternative { elements: new_elements }), false);
    }
    Ok(())
}

fn unwrap_lazy_quantified_newline(path: &mut Path) -> OnigResult<()> {
    let Node::Quantifier(q) = path.node() else {
        return Ok(());
    };
    if q.kind == QuantifierKind::Lazy && is_negated_newline_class(&q.element) {
        let mut new_q = q.clone();
        new_q.element = Box::new(newline_shorthand());
        path.replace_with(Node::Quantifier(new_q), false);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traverser::traverse;

    fn negated_set(kind: CharacterSetKind) -> Node {
        let inner = create_character_set(kind, None, false);
        create_character_class(ClassKind::Union, true, vec![inner])
    }

    #[test]
    fn negated_union_of_set_flips_its_negate() {
        let mut ast = negated_set(CharacterSetKind::Digit);
        let mut v = visitor(Flags::default());
        traverse(&mut ast, &mut v).unwrap();
        assert!(matches!(ast, Node::CharacterSet(cs) if cs.negate && cs.kind == CharacterSetKind::Digit));
    }

    #[test]
    fn standalone_negated_newline_class_becomes_shorthand() {
        let class = create_character_class(
            ClassKind::Union,
            true,
            vec![create_character('\n' as u32, CreateCharacterOptions::default()).unwrap()],
        );
        let mut ast = create_alternative(vec![class]);
        let mut v = visitor(Flags::default());
        traverse(&mut ast, &mut v).unwrap();
        if let Node::Alternative(a) = &ast {
            assert!(matches!(&a.elements[0], Node::CharacterSet(cs) if cs.kind == CharacterSetKind::Newline && cs.negate));
        } else {
            panic!();
        }
    }

    #[test]
    fn greedy_quantified_negated_newline_is_left_as_a_class() {
        let class = create_character_class(
            ClassKind::Union,
            true,
            vec![create_character('\n' as u32, CreateCharacterOptions::default()).unwrap()],
        );
        let mut ast = create_quantifier(class, 2, Max::Bounded(2), QuantifierKind::Greedy).unwrap();
        let mut v = visitor(Flags::default());
        traverse(&mut ast, &mut v).unwrap();
        if let Node::Quantifier(q) = &ast {
            assert!(matches!(q.element.as_ref(), Node::CharacterClass(_)));
        } else {
            panic!();
        }
    }
}
