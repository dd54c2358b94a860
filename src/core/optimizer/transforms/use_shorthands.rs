//! Rewrites Unicode-property / POSIX-class spellings to their
//! single-letter shorthand equivalents, and folds a handful of common
//! union-class idioms (the full hex-digit split, the full-codepoint
//! range, the four general-category union for "word") into their
//! shorthand form.

use std::collections::HashSet;

use crate::core::errors::OnigResult;
use crate::core::nodes::*;
use crate::core::traverser::{Path, Visitor};

pub fn visitor(flags: Flags) -> Visitor {
    Visitor::new()
        .on("CharacterSet", move |path| rewrite_leaf(path, flags))
        .on("CharacterClass", move |path| rewrite_class(path, flags))
}

fn rewrite_leaf(path: &mut Path, flags: Flags) -> OnigResult<()> {
    let Node::CharacterSet(cs) = path.node() else {
        return Ok(());
    };
    let name = cs.value.as_deref().unwrap_or("");
    let replacement = match cs.kind {
        CharacterSetKind::Property => match name {
            "Decimal_Number" | "Nd" if !(flags.digit_is_ascii || flags.posix_is_ascii) => {
                Some(create_character_set(CharacterSetKind::Digit, None, cs.negate))
            }
            "ASCII_Hex_Digit" | "AHex" => Some(create_character_set(CharacterSetKind::Hex, None, cs.negate)),
            "White_Space" | "WSpace" if !(flags.space_is_ascii || flags.posix_is_ascii) => {
                Some(create_character_set(CharacterSetKind::Space, None, cs.negate))
            }
            "Control" if !flags.posix_is_ascii => Some(create_character_set(
                CharacterSetKind::Property,
                Some("Cc".to_string()),
                cs.negate,
            )),
            _ => None,
        },
        CharacterSetKind::Posix => match name {
            "digit" => Some(create_character_set(CharacterSetKind::Digit, None, cs.negate)),
            "xdigit" => Some(create_character_set(CharacterSetKind::Hex, None, cs.negate)),
            "space" => Some(create_character_set(CharacterSetKind::Space, None, cs.negate)),
            "cntrl" if !flags.posix_is_ascii => Some(create_character_set(
                CharacterSetKind::Property,
                Some("Cc".to_string()),
                cs.negate,
            )),
            _ => None,
        },
        _ => None,
    };
    if let Some(new_node) = replacement {
        path.replace_with(new_node, false);
    }
    Ok(())
}

const HEX_RANGES: [(u32, u32); 3] = [('0' as u32, '9' as u32), ('A' as u32, 'F' as u32), ('a' as u32, 'f' as u32)];

fn range_bounds(node: &Node) -> Option<(u32, u32)> {
    if let Node::CharacterClassRange(r) = node {
        if let (Node::Character(min), Node::Character(max)) = (r.min.as_ref(), r.max.as_ref()) {
            return Some((min.value, max.value));
        }
    }
    None
}

fn is_property(node: &Node, names: &[&str]) -> bool {
    matches!(node, Node::CharacterSet(cs)
        if cs.kind == CharacterSetKind::Property
            && !cs.negate
            && names.contains(&cs.value.as_deref().unwrap_or("")))
}

const LETTER_NAMES: &[&str] = &[
    "Letter",
    "Uppercase_Letter",
    "Lowercase_Letter",
    "Titlecase_Letter",
    "Modifier_Letter",
    "Other_Letter",
];
const MARK_NAMES: &[&str] = &["Mark", "Nonspacing_Mark", "Spacing_Mark", "Enclosing_Mark"];
const NUMBER_NAMES: &[&str] = &["Number", "Decimal_Number", "Letter_Number", "Other_Number"];
const CONNECTOR_NAMES: &[&str] = &["Connector_Punctuation", "Punctuation"];

fn rewrite_class(path: &mut Path, flags: Flags) -> OnigResult<()> {
    let Node::CharacterClass(cc) = path.node() else {
        return Ok(());
    };
    if cc.kind != ClassKind::Union {
        return Ok(());
    }

    let mut remove: HashSet<usize> = HashSet::new();
    let mut append: Vec<Node> = Vec::new();

    let hex_indices: Vec<usize> = HEX_RANGES
        .iter()
        .filter_map(|&(lo, hi)| {
            cc.elements
                .iter()
                .position(|el| range_bounds(el) == Some((lo, hi)))
        })
        .collect();
    if hex_indices.len() == 3 {
        remove.extend(hex_indices);
        append.push(create_character_set(CharacterSetKind::Hex, None, false));
    }

    if let Some(idx) = cc.elements.iter().position(|el| range_bounds(el) == Some((0, 0x10FFFF))) {
        remove.insert(idx);
        append.push(create_character_set(CharacterSetKind::Any, None, false));
    }

    if !(flags.word_is_ascii || flags.posix_is_ascii) {
        let l = cc.elements.iter().position(|el| is_property(el, LETTER_NAMES));
        let m = cc.elements.iter().position(|el| is_property(el, MARK_NAMES));
        let n = cc.elements.iter().position(|el| is_property(el, NUMBER_NAMES));
        let pc = cc.elements.iter().position(|el| is_property(el, CONNECTOR_NAMES));
        if let (Some(l), Some(m), Some(n), Some(pc)) = (l, m, n, pc) {
            remove.extend([l, m, n, pc]);
            append.push(create_character_set(CharacterSetKind::Word, None, false));
        }
    }

    if remove.is_empty() {
        return Ok(());
    }

    let mut new_elements: Vec<Node> = cc
        .elements
        .iter()
        .enumerate()
        .filter(|(i, _)| !remove.contains(i))
        .map(|(_, el)| el.clone())
        .collect();
    new_elements.extend(append);
    path.replace_with(
        create_character_class(ClassKind::Union, cc.negate, new_elements),
        false,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traverser::traverse;

    #[test]
    fn decimal_number_property_becomes_digit_shorthand() {
        let mut ast = create_character_set(CharacterSetKind::Property, Some("Decimal_Number".into()), false);
        let mut v = visitor(Flags::default());
        traverse(&mut ast, &mut v).unwrap();
        assert!(matches!(ast, Node::CharacterSet(cs) if cs.kind == CharacterSetKind::Digit));
    }

    #[test]
    fn digit_is_ascii_suppresses_property_form_rewrite() {
        let mut ast = create_character_set(CharacterSetKind::Property, Some("Decimal_Number".into()), false);
        let mut flags = Flags::default();
        flags.digit_is_ascii = true;
        let mut v = visitor(flags);
        traverse(&mut ast, &mut v).unwrap();
        assert!(matches!(ast, Node::CharacterSet(cs) if cs.kind == CharacterSetKind::Property));
    }

    #[test]
    fn posix_digit_form_rewrites_even_with_posix_is_ascii() {
        let mut ast = create_character_set(CharacterSetKind::Posix, Some("digit".into()), false);
        let mut flags = Flags::default();
        flags.posix_is_ascii = true;
        let mut v = visitor(flags);
        traverse(&mut ast, &mut v).unwrap();
        assert!(matches!(ast, Node::CharacterSet(cs) if cs.kind == CharacterSetKind::Digit));
    }

    #[test]
    fn full_hex_split_collapses_to_hex_shorthand() {
        let ranges = vec![
            create_character_class_range(
                create_character('0' as u32, CreateCharacterOptions::default()).unwrap(),
                create_character('9' as u32, CreateCharacterOptions::default()).unwrap(),
            )
            .unwrap(),
            create_character_class_range(
                create_character('A' as u32, CreateCharacterOptions::default()).unwrap(),
                create_character('F' as u32, CreateCharacterOptions::default()).unwrap(),
            )
            .unwrap(),
            create_character_class_range(
                create_character('a' as u32, CreateCharacterOptions::default()).unwrap(),
                create_character('f' as u32, CreateCharacterOptions::default()).unwrap(),
            )
            .unwrap(),
        ];
        let mut ast = create_character_class(ClassKind::Union, false, ranges);
        let mut v = visitor(Flags::default());
        traverse(&mut ast, &mut v).unwrap();
        if let Node::CharacterClass(cc) = &ast {
            assert_eq!(cc.elements.len(), 1);
            assert!(matches!(&cc.elements[0], Node::CharacterSet(cs) if cs.kind == CharacterSetKind::Hex));
        } else {
            panic!();
        }
    }

    #[test]
    fn four_general_categories_collapse_to_word_shorthand() {
        let elements = vec![
            create_character_set(CharacterSetKind::Property, Some("Letter".into()), false),
            create_character_set(CharacterSetKind::Property, Some("Mark".into()), false),
            create_character_set(CharacterSetKind::Property, Some("Number".into()), false),
            create_character_set(CharacterSetKind::Property, Some("Connector_Punctuation".into()), false),
        ];
        let mut ast = create_character_class(ClassKind::Union, false, elements);
        let mut v = visitor(Flags::default());
        traverse(&mut ast, &mut v).unwrap();
        if let Node::CharacterClass(cc) = &ast {
            assert_eq!(cc.elements.len(), 1);
            assert!(matches!(&cc.elements[0], Node::CharacterSet(cs) if cs.kind == CharacterSetKind::Word));
        } else {
            panic!();
        }
    }
}
