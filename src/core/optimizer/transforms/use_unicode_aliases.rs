//! Companion to `use-shorthands`: canonicalizes Unicode property names
//! to their short aliases (`Decimal_Number` → `Nd`). `Control` is left
//! to `use-shorthands`, which owns its `posixIsAscii`-gated rewrite to
//! `Cc` — aliasing it here unconditionally would bypass that gate.

use crate::core::errors::OnigResult;
use crate::core::nodes::*;
use crate::core::traverser::{Path, Visitor};
use crate::unicode;

pub fn visitor(_flags: Flags) -> Visitor {
    Visitor::new().on("CharacterSet", rewrite)
}

fn rewrite(path: &mut Path) -> OnigResult<()> {
    let Node::CharacterSet(cs) = path.node() else {
        return Ok(());
    };
    if cs.kind != CharacterSetKind::Property || cs.value.as_deref() == Some("Control") {
        return Ok(());
    }
    let Some(name) = cs.value.as_deref() else {
        return Ok(());
    };
    if let Some(alias) = unicode::short_alias(name) {
        if alias != name {
            let mut new_cs = cs.clone();
            new_cs.value = Some(alias.to_string());
            path.replace_with(Node::CharacterSet(new_cs), false);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traverser::traverse;

    #[test]
    fn canonical_name_becomes_short_alias() {
        let mut ast = create_character_set(CharacterSetKind::Property, Some("Decimal_Number".into()), false);
        let mut v = visitor(Flags::default());
        traverse(&mut ast, &mut v).unwrap();
        assert!(matches!(&ast, Node::CharacterSet(cs) if cs.value.as_deref() == Some("Nd")));
    }

    #[test]
    fn control_is_untouched_here() {
        let mut ast = create_character_set(CharacterSetKind::Property, Some("Control".into()), false);
        let mut v = visitor(Flags::default());
        traverse(&mut ast, &mut v).unwrap();
        assert!(matches!(&ast, Node::CharacterSet(cs) if cs.value.as_deref() == Some("Control")));
    }
}
