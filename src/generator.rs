//! External collaborator: inverts the parser, turning an AST back into
//! Oniguruma source text. Grounded on the shape of a PCRE2 emitter —
//! one recursive `emit_node` dispatch plus small per-context escaping
//! helpers — retargeted at this crate's own dialect so that
//! `generate(parse(s))` round-trips through `parse` again.

use crate::core::errors::{OnigError, OnigResult};
use crate::core::nodes::*;

/// Result of [`generate`]: the serialized pattern body and its flag
/// letters, kept apart the way `parse`'s input is split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOutput {
    pub pattern: String,
    pub flags: String,
}

pub fn generate(ast: &Node) -> OnigResult<GenerateOutput> {
    let Node::Regex(regex) = ast else {
        return Err(OnigError::invariant("generate expects a Regex root node"));
    };
    let mut pattern = String::new();
    emit_node(&regex.pattern, &mut pattern, false)?;
    let Node::Flags(flags) = regex.flags.as_ref() else {
        return Err(OnigError::invariant("Regex.flags must be a Flags node"));
    };
    Ok(GenerateOutput {
        pattern,
        flags: flag_letters(flags),
    })
}

fn flag_letters(flags: &Flags) -> String {
    let mut s = String::new();
    if flags.ignore_case {
        s.push('i');
    }
    if flags.dot_all {
        s.push('m');
    }
    if flags.extended {
        s.push('x');
    }
    if flags.digit_is_ascii {
        s.push('D');
    }
    if flags.space_is_ascii {
        s.push('S');
    }
    if flags.word_is_ascii {
        s.push('W');
    }
    if flags.posix_is_ascii {
        s.push('P');
    }
    if flags.text_segment_mode {
        s.push('y');
    }
    s
}

fn emit_node(node: &Node, out: &mut String, in_class: bool) -> OnigResult<()> {
    match node {
        Node::Pattern(p) => {
            for (i, alt) in p.alternatives.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                emit_node(alt, out, in_class)?;
            }
        }
        Node::Alternative(a) => {
            for el in &a.elements {
                emit_node(el, out, in_class)?;
            }
        }
        Node::Character(c) => {
            emit_char(c.value, out, in_class);
        }
        Node::CharacterClass(cc) => emit_character_class(cc, out)?,
        Node::CharacterClassRange(r) => {
            emit_node(&r.min, out, true)?;
            out.push('-');
            emit_node(&r.max, out, true)?;
        }
        Node::CharacterSet(cs) => emit_character_set(cs, out),
        Node::Assertion(a) => emit_assertion(a, out),
        Node::LookaroundAssertion(la) => {
            out.push_str(match (la.kind, la.negate) {
                (LookaroundKind::Lookahead, false) => "(?=",
                (LookaroundKind::Lookahead, true) => "(?!",
                (LookaroundKind::Lookbehind, false) => "(?<=",
                (LookaroundKind::Lookbehind, true) => "(?<!",
            });
            emit_alternatives(&la.alternatives, out, in_class)?;
            out.push(')');
        }
        Node::Group(g) => {
            if let Some(modifiers) = &g.flags {
                out.push_str("(?");
                emit_flag_modifiers(modifiers, out);
                out.push(':');
            } else if g.atomic {
                out.push_str("(?>");
            } else {
                out.push_str("(?:");
            }
            emit_alternatives(&g.alternatives, out, in_class)?;
            out.push(')');
        }
        Node::CapturingGroup(g) => {
            match &g.name {
                Some(name) => {
                    out.push_str("(?<");
                    out.push_str(name);
                    out.push('>');
                }
                None => out.push('('),
            }
            emit_alternatives(&g.alternatives, out, in_class)?;
            out.push(')');
        }
        Node::AbsentFunction(a) => {
            out.push_str("(?~");
            emit_alternatives(&a.alternatives, out, in_class)?;
            out.push(')');
        }
        Node::Backreference(b) => emit_reference(&b.reference, out, true),
        Node::Subroutine(s) => emit_reference(&s.reference, out, false),
        Node::Quantifier(q) => {
            emit_node(&q.element, out, in_class)?;
            emit_quantifier_suffix(q, out);
        }
        Node::Directive(d) => emit_directive(d, out),
        Node::Flags(_) | Node::Regex(_) => {
            return Err(OnigError::invariant(
                "Flags/Regex nodes are only valid as Regex.pattern/flags, not inline",
            ))
        }
    }
    Ok(())
}

fn emit_alternatives(alts: &[Node], out: &mut String, in_class: bool) -> OnigResult<()> {
    for (i, alt) in alts.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        emit_node(alt, out, in_class)?;
    }
    Ok(())
}

fn emit_flag_modifiers(modifiers: &FlagGroupModifiers, out: &mut String) {
    let enabling = flag_letters(&modifiers.enabling);
    let disabling = flag_letters(&modifiers.disabling);
    out.push_str(&enabling);
    if !disabling.is_empty() {
        out.push('-');
        out.push_str(&disabling);
    }
}

const PATTERN_METACHARS: &[char] = &['.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '^', '$', '|', '\\'];
const CLASS_METACHARS: &[char] = &['[', ']', '^', '-', '\\', '&'];

fn emit_char(value: u32, out: &mut String, in_class: bool) {
    if let Some(ch) = char::from_u32(value) {
        let metachars = if in_class { CLASS_METACHARS } else { PATTERN_METACHARS };
        if metachars.contains(&ch) {
            out.push('\\');
            out.push(ch);
            return;
        }
        if ch.is_control() {
            emit_control_escape(ch, out);
            return;
        }
        out.push(ch);
    } else {
        out.push_str(&format!("\\x{{{value:x}}}"));
    }
}

fn emit_control_escape(ch: char, out: &mut String) {
    match ch {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{0C}' => out.push_str("\\f"),
        '\u{0B}' => out.push_str("\\v"),
        '\u{1B}' => out.push_str("\\e"),
        other => out.push_str(&format!("\\x{{{:x}}}", other as u32)),
    }
}

fn emit_character_class(cc: &CharacterClass, out: &mut String) -> OnigResult<()> {
    out.push('[');
    if cc.negate {
        out.push('^');
    }
    match cc.kind {
        ClassKind::Union => {
            for el in &cc.elements {
                emit_node(el, out, true)?;
            }
        }
        ClassKind::Intersection => {
            for (i, segment) in cc.elements.iter().enumerate() {
                if i > 0 {
                    out.push_str("&&");
                }
                match segment {
                    Node::CharacterClass(inner) if inner.kind == ClassKind::Union && !inner.negate => {
                        for el in &inner.elements {
                            emit_node(el, out, true)?;
                        }
                    }
                    other => emit_node(other, out, true)?,
                }
            }
        }
    }
    out.push(']');
    Ok(())
}

fn emit_character_set(cs: &CharacterSet, out: &mut String) {
    match cs.kind {
        CharacterSetKind::Any => out.push('.'),
        CharacterSetKind::Digit => out.push_str(if cs.negate { "\\D" } else { "\\d" }),
        CharacterSetKind::Hex => out.push_str(if cs.negate { "\\H" } else { "\\h" }),
        CharacterSetKind::Space => out.push_str(if cs.negate { "\\S" } else { "\\s" }),
        CharacterSetKind::Word => out.push_str(if cs.negate { "\\W" } else { "\\w" }),
        CharacterSetKind::Newline => out.push_str(if cs.negate { "\\N" } else { "\\R" }),
        CharacterSetKind::Grapheme => out.push_str("\\X"),
        CharacterSetKind::Posix => {
            out.push_str("[:");
            if cs.negate {
                out.push('^');
            }
            out.push_str(cs.value.as_deref().unwrap_or(""));
            out.push_str(":]");
        }
        CharacterSetKind::Property => {
            out.push_str(if cs.negate { "\\P{" } else { "\\p{" });
            out.push_str(cs.value.as_deref().unwrap_or(""));
            out.push('}');
        }
    }
}

fn emit_assertion(a: &Assertion, out: &mut String) {
    out.push_str(match (a.kind, a.negate) {
        (AssertionKind::LineStart, _) => "^",
        (AssertionKind::LineEnd, _) => "$",
        (AssertionKind::StringStart, _) => "\\A",
        (AssertionKind::StringEnd, _) => "\\z",
        (AssertionKind::StringEndNewline, _) => "\\Z",
        (AssertionKind::SearchStart, _) => "\\G",
        (AssertionKind::WordBoundary, false) => "\\b",
        (AssertionKind::WordBoundary, true) => "\\B",
        (AssertionKind::GraphemeBoundary, false) => "\\y",
        (AssertionKind::GraphemeBoundary, true) => "\\Y",
    });
}

fn emit_reference(reference: &Ref, out: &mut String, is_backref: bool) {
    let open = if is_backref { "\\k<" } else { "\\g<" };
    out.push_str(open);
    match reference {
        Ref::Number(n) => out.push_str(&n.to_string()),
        Ref::Name(name) => out.push_str(name),
    }
    out.push('>');
}

fn emit_quantifier_suffix(q: &Quantifier, out: &mut String) {
    match (q.min, q.max) {
        (0, Max::Unbounded) => out.push('*'),
        (1, Max::Unbounded) => out.push('+'),
        (0, Max::Bounded(1)) => out.push('?'),
        (min, Max::Unbounded) => out.push_str(&format!("{{{min},}}")),
        (min, Max::Bounded(max)) if min == max => out.push_str(&format!("{{{min}}}")),
        (min, Max::Bounded(max)) => out.push_str(&format!("{{{min},{max}}}")),
    }
    match q.kind {
        QuantifierKind::Greedy => {}
        QuantifierKind::Lazy => out.push('?'),
        QuantifierKind::Possessive => out.push('+'),
    }
}

fn emit_directive(d: &Directive, out: &mut String) {
    match d.kind {
        DirectiveKind::Keep => out.push_str("\\K"),
        DirectiveKind::Flags => {
            out.push_str("(?");
            if let Some(modifiers) = &d.flags {
                emit_flag_modifiers(modifiers, out);
            }
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::{parse, ParserOptions};

    fn roundtrip(source: &str) -> String {
        let ast = parse(source, ParserOptions::default()).unwrap();
        generate(&ast).unwrap().pattern
    }

    #[test]
    fn plain_literal_roundtrips() {
        assert_eq!(roundtrip("abc"), "abc");
    }

    #[test]
    fn capturing_group_and_backreference_roundtrip() {
        let out = roundtrip("(a)\\k<1>");
        let reparsed = parse(&out, ParserOptions::default()).unwrap();
        let original = parse("(a)\\k<1>", ParserOptions::default()).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn character_class_range_roundtrips() {
        assert_eq!(roundtrip("[a-z]"), "[a-z]");
    }

    #[test]
    fn literal_bracket_inside_a_class_is_escaped() {
        // An unescaped `[` would reopen as a nested class on re-parse.
        assert_eq!(roundtrip("[\\[]"), "[\\[]");
    }

    #[test]
    fn quantifier_suffix_forms() {
        assert_eq!(roundtrip("a*"), "a*");
        assert_eq!(roundtrip("a+?"), "a+?");
        assert_eq!(roundtrip("a{2,4}+"), "a{2,4}+");
    }

    #[test]
    fn lookbehind_roundtrips() {
        assert_eq!(roundtrip("(?<=a)"), "(?<=a)");
        assert_eq!(roundtrip("(?<!a)"), "(?<!a)");
    }
}
