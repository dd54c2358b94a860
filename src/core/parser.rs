//! Recursive-descent parser — token stream → AST, with cross-pattern
//! validation (backref/subroutine resolution, named/numbered capture
//! conflicts, lookbehind content restrictions).
//!
//! State that would otherwise be threaded through every helper (the
//! running capturing-group list, the named-group index, the "has a
//! numbered ref" flag, the active options) lives on `Parser` itself,
//! scoped to one `parse` call, rather than closed-over module variables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::{OnigError, OnigResult, Pos};
use super::nodes::*;
use super::tokenizer::{GroupOpenKind, Token, TokenData, TokenKind, Tokenizer};

/// `rules.captureGroup` / `rules.singleline` from spec.md §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParserRules {
    /// When true, unnamed groups stay capturing even if the pattern also
    /// has named groups (`ONIG_OPTION_CAPTURE_GROUP`). When false
    /// (default), an unnamed group is demoted to a plain `Group` as soon
    /// as the pattern has at least one named group anywhere.
    pub capture_group: bool,
    /// `.` matches newline; `^`/`$` ignore line breaks. Attached to the
    /// parsed `Flags` node's `dot_all`, consistent with how the tokenizer
    /// already treats Oniguruma's `m` flag letter.
    pub singleline: bool,
}

/// Options accepted by [`parse`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParserOptions {
    pub flags: String,
    pub rules: ParserRules,
    pub skip_backref_validation: bool,
    pub skip_lookbehind_validation: bool,
    pub skip_property_name_validation: bool,
    pub normalize_unknown_property_names: bool,
    pub unicode_property_map: Option<HashMap<String, String>>,
}

struct CaptureEntry {
    number: u32,
    name: Option<String>,
}

struct SubroutineTarget {
    reference: Ref,
    pos: Pos,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source: String,
    flags: Flags,
    options: ParserOptions,
    captures: Vec<CaptureEntry>,
    named_groups: HashMap<String, Vec<u32>>,
    has_any_named_group: bool,
    has_numbered_ref: bool,
    subroutine_targets: Vec<SubroutineTarget>,
}

/// Parse Oniguruma source into a `Regex` AST node (spec.md §4.2).
pub fn parse(source: &str, options: ParserOptions) -> OnigResult<Node> {
    let (tokens, flags) = Tokenizer::tokenize(source, &options.flags)?;
    let mut flags = flags;
    if options.rules.singleline {
        flags.dot_all = true;
    }

    let has_any_named_group = tokens.iter().any(|t| {
        matches!(
            t.data,
            TokenData::GroupOpen(GroupOpenKind::Named(_))
        )
    });

    let mut parser = Parser {
        tokens,
        pos: 0,
        source: source.to_string(),
        flags,
        options,
        captures: Vec::new(),
        named_groups: HashMap::new(),
        has_any_named_group,
        has_numbered_ref: false,
        subroutine_targets: Vec::new(),
    };

    let pattern = parser.parse_pattern()?;
    if !parser.eof() {
        let pos = parser.peek().map(|t| t.start).unwrap_or(source.chars().count());
        return Err(parser.err("Unmatched ')'", pos));
    }
    parser.validate_whole_pattern()?;

    let flags_node = create_flags(parser.flags);
    Ok(create_regex(pattern, flags_node))
}

impl Parser {
    fn err(&self, message: impl Into<String>, pos: Pos) -> OnigError {
        OnigError::syntax(message, pos, self.source.clone())
    }

    fn reference_err(&self, message: impl Into<String>, pos: Pos) -> OnigError {
        OnigError::reference(message, pos, self.source.clone())
    }

    fn feature_err(&self, message: impl Into<String>, pos: Pos) -> OnigError {
        OnigError::feature(message, pos, self.source.clone())
    }

    /// Calls a `create_*` factory and remaps any `Invariant` failure into
    /// a `Syntax` error at `pos`: the factories only know about the local
    /// invariant they're checking, but from here the bad input always
    /// traces back to the user's source text, not a caller bug.
    fn node(&self, pos: Pos, result: OnigResult<Node>) -> OnigResult<Node> {
        result.map_err(|e| match e {
            OnigError::Invariant { message } => self.err(message, pos),
            other => other,
        })
    }

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_kind_at(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        tok
    }

    fn next_capture_number(&mut self) -> u32 {
        self.captures.len() as u32 + 1
    }

    fn register_capture(&mut self, number: u32, name: Option<String>) {
        if let Some(name) = &name {
            self.named_groups
                .entry(name.clone())
                .or_default()
                .push(number);
        }
        self.captures.push(CaptureEntry { number, name });
    }

    // -----------------------------------------------------------------
    // Grammar
    // -----------------------------------------------------------------

    fn parse_pattern(&mut self) -> OnigResult<Node> {
        let alternatives = self.parse_alternatives()?;
        Ok(create_pattern(alternatives))
    }

    fn parse_alternatives(&mut self) -> OnigResult<Vec<Node>> {
        let mut alternatives = vec![self.parse_alternative()?];
        while self.check(TokenKind::Alternator) {
            self.advance();
            alternatives.push(self.parse_alternative()?);
        }
        Ok(alternatives)
    }

    fn parse_alternative(&mut self) -> OnigResult<Node> {
        let mut elements = Vec::new();
        loop {
            match self.peek_kind() {
                None | Some(TokenKind::Alternator) | Some(TokenKind::GroupClose) => break,
                _ => elements.push(self.parse_element()?),
            }
        }
        Ok(create_alternative(elements))
    }

    /// Parses everything through `parse_alternative` until a matching
    /// `GroupClose`, for use inside any group-like construct.
    fn parse_group_body(&mut self, open_pos: Pos) -> OnigResult<Vec<Node>> {
        let alternatives = self.parse_alternatives()?;
        if !self.check(TokenKind::GroupClose) {
            return Err(self.err("Unterminated group", open_pos));
        }
        self.advance();
        Ok(alternatives)
    }

    fn parse_element(&mut self) -> OnigResult<Node> {
        let atom = self.parse_atom()?;
        if self.check(TokenKind::Quantifier) {
            let tok = self.advance();
            let (mut min, mut max, mut kind) = match tok.data {
                TokenData::Quantifier { min, max, kind } => (min, max, kind),
                _ => unreachable!(),
            };
            if let Max::Bounded(max_val) = max {
                if max_val < min {
                    kind = QuantifierKind::Possessive;
                    let swapped_min = max_val;
                    max = Max::Bounded(min);
                    min = swapped_min;
                }
            }
            return self.node(tok.start, create_quantifier(atom, min, max, kind));
        }
        Ok(atom)
    }

    fn parse_atom(&mut self) -> OnigResult<Node> {
        let tok = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.err("Unexpected end of pattern", self.source.chars().count())),
        };

        match tok.kind {
            TokenKind::Character => {
                self.advance();
                match tok.data {
                    TokenData::Char(value) => self.node(tok.start, create_character(value, CreateCharacterOptions::default())),
                    _ => unreachable!(),
                }
            }
            TokenKind::CharacterClassOpen => self.parse_character_class(),
            TokenKind::CharacterSet => {
                self.advance();
                match tok.data {
                    TokenData::CharacterSet { kind, value, negate } => {
                        let value = match (&kind, value) {
                            (CharacterSetKind::Property, Some(name)) => {
                                Some(self.resolve_property_name(name, tok.start)?)
                            }
                            (_, v) => v,
                        };
                        Ok(create_character_set(kind, value, negate))
                    }
                    _ => unreachable!(),
                }
            }
            TokenKind::Assertion => {
                self.advance();
                match tok.data {
                    TokenData::Assertion { kind, negate } => Ok(create_assertion(kind, negate)),
                    _ => unreachable!(),
                }
            }
            TokenKind::Backreference => {
                self.advance();
                match tok.data {
                    TokenData::Backreference { reference } => {
                        self.resolve_backreference(reference, tok.start)
                    }
                    _ => unreachable!(),
                }
            }
            TokenKind::Subroutine => {
                self.advance();
                match tok.data {
                    TokenData::Subroutine { reference } => {
                        if matches!(reference, Ref::Number(_)) {
                            self.has_numbered_ref = true;
                        }
                        self.subroutine_targets.push(SubroutineTarget {
                            reference: reference.clone(),
                            pos: tok.start,
                        });
                        Ok(create_subroutine(reference))
                    }
                    _ => unreachable!(),
                }
            }
            TokenKind::GroupOpen => {
                self.advance();
                match tok.data {
                    TokenData::GroupOpen(open) => self.parse_group(open, tok.start),
                    _ => unreachable!(),
                }
            }
            TokenKind::Directive => {
                self.advance();
                match tok.data {
                    TokenData::Directive { kind, flags } => self.node(tok.start, create_directive(kind, flags)),
                    _ => unreachable!(),
                }
            }
            TokenKind::GroupClose => Err(self.err("Unmatched ')'", tok.start)),
            TokenKind::Quantifier => Err(self.err("Quantifier has nothing to repeat", tok.start)),
            TokenKind::Alternator
            | TokenKind::CharacterClassClose
            | TokenKind::CharacterClassHyphen
            | TokenKind::CharacterClassIntersector => {
                Err(self.err("Unexpected token", tok.start))
            }
        }
    }

    fn parse_group(&mut self, open: GroupOpenKind, open_pos: Pos) -> OnigResult<Node> {
        match open {
            GroupOpenKind::NonCapturing => {
                let alts = self.parse_group_body(open_pos)?;
                Ok(create_group(false, None, alts))
            }
            GroupOpenKind::Atomic => {
                let alts = self.parse_group_body(open_pos)?;
                Ok(create_group(true, None, alts))
            }
            GroupOpenKind::FlagsScoped(modifiers) => {
                let alts = self.parse_group_body(open_pos)?;
                Ok(create_group(false, Some(modifiers), alts))
            }
            GroupOpenKind::Capturing => {
                if !self.options.rules.capture_group && self.has_any_named_group {
                    let alts = self.parse_group_body(open_pos)?;
                    return Ok(create_group(false, None, alts));
                }
                let number = self.next_capture_number();
                self.register_capture(number, None);
                let alts = self.parse_group_body(open_pos)?;
                self.node(open_pos, create_capturing_group(number, None, alts))
            }
            GroupOpenKind::Named(name) => {
                let number = self.next_capture_number();
                self.register_capture(number, Some(name.clone()));
                let alts = self.parse_group_body(open_pos)?;
                self.node(open_pos, create_capturing_group(number, Some(name), alts))
            }
            GroupOpenKind::AbsentRepeater => {
                let alts = self.parse_group_body(open_pos)?;
                if alts.iter().any(|a| alternative_contains_absent_function(a)) {
                    return Err(self.feature_err("nested absent functions are not supported", open_pos));
                }
                Ok(create_absent_function(AbsentFunctionKind::Repeater, alts))
            }
            GroupOpenKind::Lookaround { kind, negate } => {
                let alts = self.parse_group_body(open_pos)?;
                let node = create_lookaround_assertion(kind, negate, alts);
                if kind == LookaroundKind::Lookbehind && !self.options.skip_lookbehind_validation {
                    check_lookbehind_content(&node, negate, open_pos, &self.source)?;
                }
                Ok(node)
            }
        }
    }

    // -----------------------------------------------------------------
    // Character classes
    // -----------------------------------------------------------------

    fn parse_character_class(&mut self) -> OnigResult<Node> {
        let open_tok = self.advance();
        let outer_negate = match open_tok.data {
            TokenData::ClassOpen { negate } => negate,
            _ => unreachable!(),
        };

        let mut segments = vec![self.parse_class_segment()?];
        while self.check(TokenKind::CharacterClassIntersector) {
            self.advance();
            segments.push(self.parse_class_segment()?);
        }

        if !self.check(TokenKind::CharacterClassClose) {
            return Err(self.err("Unterminated character class", open_tok.start));
        }
        self.advance();

        if segments.iter().all(|s| s.is_empty()) && segments.len() == 1 {
            return Err(self.err("Empty character class", open_tok.start));
        }

        if segments.len() == 1 {
            let elements = segments.into_iter().next().unwrap();
            Ok(create_character_class(ClassKind::Union, outer_negate, elements))
        } else {
            let sub_classes = segments
                .into_iter()
                .map(|elements| {
                    if elements.len() == 1 {
                        elements.into_iter().next().unwrap()
                    } else {
                        create_character_class(ClassKind::Union, false, elements)
                    }
                })
                .collect();
            Ok(create_character_class(ClassKind::Intersection, outer_negate, sub_classes))
        }
    }

    fn parse_class_segment(&mut self) -> OnigResult<Vec<Node>> {
        let mut elements = Vec::new();
        loop {
            match self.peek_kind() {
                None | Some(TokenKind::CharacterClassClose) | Some(TokenKind::CharacterClassIntersector) => {
                    break
                }
                Some(TokenKind::CharacterClassOpen) => elements.push(self.parse_character_class()?),
                Some(TokenKind::CharacterClassHyphen) => {
                    let tok = self.advance();
                    elements.push(self.node(tok.start, create_character(b'-' as u32, CreateCharacterOptions::default()))?);
                }
                Some(TokenKind::Character) | Some(TokenKind::CharacterSet) => {
                    let left_pos = self.peek().unwrap().start;
                    let left = self.parse_class_atom()?;
                    if self.check(TokenKind::CharacterClassHyphen)
                        && matches!(
                            self.peek_kind_at(1),
                            Some(TokenKind::Character) | Some(TokenKind::CharacterSet)
                        )
                    {
                        self.advance(); // hyphen
                        let right = self.parse_class_atom()?;
                        if matches!((&left, &right), (Node::Character(_), Node::Character(_))) {
                            elements.push(self.node(left_pos, create_character_class_range(left, right))?);
                        } else {
                            return Err(self.err(
                                "Invalid character class range: endpoints must be single characters",
                                left_pos,
                            ));
                        }
                    } else {
                        elements.push(left);
                    }
                }
                _ => {
                    let pos = self.peek().unwrap().start;
                    return Err(self.err("Unexpected token in character class", pos));
                }
            }
        }
        Ok(elements)
    }

    fn parse_class_atom(&mut self) -> OnigResult<Node> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Character => match tok.data {
                TokenData::Char(value) => self.node(tok.start, create_character(value, CreateCharacterOptions::default())),
                _ => unreachable!(),
            },
            TokenKind::CharacterSet => match tok.data {
                TokenData::CharacterSet { kind, value, negate } => {
                    if kind == CharacterSetKind::Posix {
                        return self.node(
                            tok.start,
                            create_posix_class(value.as_deref().unwrap_or(""), negate),
                        );
                    }
                    let value = match (&kind, value) {
                        (CharacterSetKind::Property, Some(name)) => {
                            Some(self.resolve_property_name(name, tok.start)?)
                        }
                        (_, v) => v,
                    };
                    Ok(create_character_set(kind, value, negate))
                }
                _ => unreachable!(),
            },
            _ => unreachable!("parse_class_atom called on a non-class-atom token"),
        }
    }

    // -----------------------------------------------------------------
    // References
    // -----------------------------------------------------------------

    fn resolve_backreference(&mut self, reference: Ref, pos: Pos) -> OnigResult<Node> {
        match &reference {
            Ref::Number(n) => {
                self.has_numbered_ref = true;
                let defined = self.captures.iter().any(|c| c.number == *n);
                if !defined {
                    if self.options.skip_backref_validation {
                        return Ok(create_backreference(reference, true));
                    }
                    return Err(self.reference_err(
                        format!("backreference to group {n} is not yet defined"),
                        pos,
                    ));
                }
                Ok(create_backreference(reference, false))
            }
            Ref::Name(name) => {
                let defined = self.named_groups.contains_key(name);
                if !defined {
                    if self.options.skip_backref_validation {
                        return Ok(create_backreference(reference, true));
                    }
                    return Err(self.reference_err(
                        format!("backreference to undefined group '{name}'"),
                        pos,
                    ));
                }
                Ok(create_backreference(reference, false))
            }
        }
    }

    fn resolve_property_name(&self, name: String, pos: Pos) -> OnigResult<String> {
        let slug = crate::unicode::normalize_slug(&name);
        if let Some(map) = &self.options.unicode_property_map {
            if let Some(canonical) = map.get(&slug) {
                return Ok(canonical.clone());
            }
            if self.options.skip_property_name_validation {
                return Ok(name);
            }
            if self.options.normalize_unknown_property_names {
                return Ok(crate::unicode::normalize_unknown(&name));
            }
            return Err(self.err(format!("unknown Unicode property name '{name}'"), pos));
        }
        if let Some(canonical) = crate::unicode::lookup(&slug) {
            return Ok(canonical.to_string());
        }
        if self.options.normalize_unknown_property_names {
            return Ok(crate::unicode::normalize_unknown(&name));
        }
        Ok(name)
    }

    // -----------------------------------------------------------------
    // Whole-pattern validation
    // -----------------------------------------------------------------

    fn validate_whole_pattern(&self) -> OnigResult<()> {
        if self.has_numbered_ref && !self.named_groups.is_empty() && !self.options.rules.capture_group {
            return Err(self.reference_err(
                "numbered backreferences and subroutine calls cannot be mixed with named \
                 captures unless rules.captureGroup is set",
                0,
            ));
        }

        for target in &self.subroutine_targets {
            match &target.reference {
                Ref::Number(0) => {} // whole-pattern recursion
                Ref::Number(n) => {
                    if !self.captures.iter().any(|c| c.number == *n) {
                        return Err(self.reference_err(
                            format!("subroutine calls undefined group {n}"),
                            target.pos,
                        ));
                    }
                }
                Ref::Name(name) => match self.named_groups.get(name) {
                    None => {
                        return Err(self.reference_err(
                            format!("subroutine calls undefined group '{name}'"),
                            target.pos,
                        ))
                    }
                    Some(numbers) if numbers.len() > 1 => {
                        return Err(self.reference_err(
                            format!("subroutine target '{name}' is ambiguous: multiple groups share this name"),
                            target.pos,
                        ))
                    }
                    Some(_) => {}
                },
            }
        }
        Ok(())
    }
}

fn alternative_contains_absent_function(node: &Node) -> bool {
    match node {
        Node::Alternative(a) => a.elements.iter().any(node_is_or_contains_absent_function),
        _ => node_is_or_contains_absent_function(node),
    }
}

fn node_is_or_contains_absent_function(node: &Node) -> bool {
    matches!(node, Node::AbsentFunction(_))
}

/// Recursively checks a lookbehind's subtree against the Oniguruma
/// lookbehind-content rule (spec.md §4.3). Applied to the whole subtree,
/// not just the immediate children, so a capturing group nested under a
/// quantifier inside a negative lookbehind is still caught.
fn check_lookbehind_content(node: &Node, outer_negate: bool, pos: Pos, source: &str) -> OnigResult<()> {
    match node {
        Node::LookaroundAssertion(la) => {
            if la.kind == LookaroundKind::Lookahead {
                return Err(OnigError::feature(
                    "lookahead is not allowed inside a lookbehind",
                    pos,
                    source.to_string(),
                ));
            }
            // la.kind == Lookbehind
            if !outer_negate && la.negate {
                return Err(OnigError::feature(
                    "a negative lookbehind is not allowed inside a positive lookbehind",
                    pos,
                    source.to_string(),
                ));
            }
            let next_negate = outer_negate || la.negate;
            for alt in &la.alternatives {
                check_lookbehind_content(alt, next_negate, pos, source)?;
            }
            Ok(())
        }
        Node::CapturingGroup(cg) => {
            if outer_negate {
                return Err(OnigError::feature(
                    "capturing groups are not allowed inside a negative lookbehind",
                    pos,
                    source.to_string(),
                ));
            }
            for alt in &cg.alternatives {
                check_lookbehind_content(alt, outer_negate, pos, source)?;
            }
            Ok(())
        }
        Node::AbsentFunction(af) => {
            for alt in &af.alternatives {
                check_lookbehind_content(alt, outer_negate, pos, source)?;
            }
            Ok(())
        }
        Node::Group(g) => {
            for alt in &g.alternatives {
                check_lookbehind_content(alt, outer_negate, pos, source)?;
            }
            Ok(())
        }
        Node::Pattern(p) => {
            for alt in &p.alternatives {
                check_lookbehind_content(alt, outer_negate, pos, source)?;
            }
            Ok(())
        }
        Node::Alternative(a) => {
            for el in &a.elements {
                check_lookbehind_content(el, outer_negate, pos, source)?;
            }
            Ok(())
        }
        Node::Quantifier(q) => check_lookbehind_content(&q.element, outer_negate, pos, source),
        Node::CharacterClass(_)
        | Node::CharacterClassRange(_)
        | Node::CharacterSet(_)
        | Node::Character(_)
        | Node::Assertion(_)
        | Node::Backreference(_)
        | Node::Subroutine(_)
        | Node::Directive(_)
        | Node::Flags(_)
        | Node::Regex(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Node {
        parse(src, ParserOptions::default()).unwrap_or_else(|e| panic!("parse({src:?}) failed: {e}"))
    }

    #[test]
    fn parses_plain_literal() {
        let node = parse_ok("ab");
        match node {
            Node::Regex(r) => match *r.pattern {
                Node::Pattern(p) => assert_eq!(p.alternatives.len(), 1),
                _ => panic!(),
            },
            _ => panic!(),
        }
    }

    #[test]
    fn capturing_groups_numbered_in_source_order() {
        let node = parse_ok("(a)(b)");
        if let Node::Regex(r) = node {
            if let Node::Pattern(p) = *r.pattern {
                if let Node::Alternative(a) = &p.alternatives[0] {
                    let numbers: Vec<u32> = a
                        .elements
                        .iter()
                        .map(|e| match e {
                            Node::CapturingGroup(cg) => cg.number,
                            _ => panic!(),
                        })
                        .collect();
                    assert_eq!(numbers, vec![1, 2]);
                    return;
                }
            }
        }
        panic!("unexpected shape");
    }

    #[test]
    fn unnamed_group_demoted_when_named_group_present() {
        let node = parse_ok("(a)(?<x>b)");
        if let Node::Regex(r) = node {
            if let Node::Pattern(p) = *r.pattern {
                if let Node::Alternative(a) = &p.alternatives[0] {
                    assert!(matches!(a.elements[0], Node::Group(_)));
                    assert!(matches!(a.elements[1], Node::CapturingGroup(_)));
                    return;
                }
            }
        }
        panic!("unexpected shape");
    }

    #[test]
    fn backreference_to_undefined_group_errors() {
        let err = parse(r"\k<name>", ParserOptions::default()).unwrap_err();
        assert!(matches!(err, OnigError::Reference { .. }));
    }

    #[test]
    fn subroutine_forward_reference_is_allowed() {
        parse_ok(r"\g<1>(a)");
    }

    #[test]
    fn subroutine_to_undefined_name_errors() {
        let err = parse(r"\g<name>", ParserOptions::default()).unwrap_err();
        assert!(matches!(err, OnigError::Reference { .. }));
    }

    #[test]
    fn possessive_reinterpretation_on_reversed_bounds() {
        let node = parse_ok("a{3,1}");
        if let Node::Regex(r) = node {
            if let Node::Pattern(p) = *r.pattern {
                if let Node::Alternative(a) = &p.alternatives[0] {
                    if let Node::Quantifier(q) = &a.elements[0] {
                        assert_eq!(q.min, 1);
                        assert_eq!(q.max, Max::Bounded(3));
                        assert_eq!(q.kind, QuantifierKind::Possessive);
                        return;
                    }
                }
            }
        }
        panic!("unexpected shape");
    }

    #[test]
    fn lookbehind_rejects_capturing_group_when_negative() {
        let err = parse("(?<!(a))", ParserOptions::default()).unwrap_err();
        assert!(matches!(err, OnigError::Feature { .. }));
    }

    #[test]
    fn lookbehind_allows_capturing_group_when_positive() {
        parse_ok("(?<=(a))");
    }

    #[test]
    fn lookbehind_rejects_lookahead_of_either_sign() {
        assert!(parse("(?<=(?=a))", ParserOptions::default()).is_err());
        assert!(parse("(?<!(?!a))", ParserOptions::default()).is_err());
    }

    #[test]
    fn lookbehind_rejects_capture_nested_under_quantifier() {
        let err = parse("(?<!(a)*)", ParserOptions::default()).unwrap_err();
        assert!(matches!(err, OnigError::Feature { .. }));
    }

    #[test]
    fn character_class_parses_range() {
        let node = parse_ok("[a-z]");
        if let Node::Regex(r) = node {
            if let Node::Pattern(p) = *r.pattern {
                if let Node::Alternative(a) = &p.alternatives[0] {
                    assert!(matches!(a.elements[0], Node::CharacterClass(_)));
                    if let Node::CharacterClass(cc) = &a.elements[0] {
                        assert_eq!(cc.elements.len(), 1);
                        assert!(matches!(cc.elements[0], Node::CharacterClassRange(_)));
                    }
                    return;
                }
            }
        }
        panic!("unexpected shape");
    }

    #[test]
    fn character_class_hyphen_as_literal_when_not_a_range() {
        let node = parse_ok("[-a]");
        if let Node::Regex(r) = node {
            if let Node::Pattern(p) = *r.pattern {
                if let Node::Alternative(a) = &p.alternatives[0] {
                    if let Node::CharacterClass(cc) = &a.elements[0] {
                        assert_eq!(cc.elements.len(), 2);
                        return;
                    }
                }
            }
        }
        panic!("unexpected shape");
    }

    #[test]
    fn intersection_class_builds_sub_classes() {
        let node = parse_ok("[a-z&&[^aeiou]]");
        if let Node::Regex(r) = node {
            if let Node::Pattern(p) = *r.pattern {
                if let Node::Alternative(a) = &p.alternatives[0] {
                    if let Node::CharacterClass(cc) = &a.elements[0] {
                        assert_eq!(cc.kind, ClassKind::Intersection);
                        assert_eq!(cc.elements.len(), 2);
                        return;
                    }
                }
            }
        }
        panic!("unexpected shape");
    }

    #[test]
    fn empty_character_class_errors() {
        assert!(parse("[]", ParserOptions::default()).is_err());
    }

    #[test]
    fn unmatched_close_paren_errors() {
        assert!(parse("a)", ParserOptions::default()).is_err());
    }

    #[test]
    fn property_name_resolves_through_builtin_table() {
        let node = parse_ok(r"\p{Nd}");
        if let Node::Regex(r) = node {
            if let Node::Pattern(p) = *r.pattern {
                if let Node::Alternative(a) = &p.alternatives[0] {
                    if let Node::CharacterSet(cs) = &a.elements[0] {
                        assert_eq!(cs.value.as_deref(), Some("Decimal_Number"));
                        return;
                    }
                }
            }
        }
        panic!("unexpected shape");
    }

    #[test]
    fn unknown_property_name_errors_when_map_provided() {
        let mut map = HashMap::new();
        map.insert("decimalnumber".to_string(), "Decimal_Number".to_string());
        let opts = ParserOptions {
            unicode_property_map: Some(map),
            ..Default::default()
        };
        assert!(parse(r"\p{NotAThing}", opts).is_err());
    }
}
