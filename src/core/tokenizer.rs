//! Tokenizer — source text → linear token stream.
//!
//! Scans Oniguruma source under a starting flag set and produces a flat
//! `Vec<Token>` plus the final [`Flags`] record (flags accumulate as
//! `(?i)`-style directives are scanned, the same way the parser will see
//! them, so callers that only need the flag set don't need a full parse).
//!
//! Tokens carry their own resolved payload (a `Character`'s code point, a
//! `Backreference`'s already-disambiguated target, ...) rather than the
//! parser re-deriving it from the raw lexeme a second time, but leave
//! tree-shape decisions (quantifier reinterpretation, lookbehind content
//! checks, capture numbering) to the parser.

use std::collections::HashSet;

use super::errors::{OnigError, OnigResult};
use super::nodes::{
    AssertionKind, CharacterSetKind, Flags, FlagGroupModifiers, LookaroundKind, Max,
    QuantifierKind, Ref, DirectiveKind,
};

/// One lexical token plus its source span, in chars (not bytes) so
/// position arithmetic stays correct over multi-byte scalar values.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub data: TokenData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Character,
    CharacterClassOpen,
    CharacterClassClose,
    CharacterClassHyphen,
    CharacterClassIntersector,
    CharacterSet,
    Assertion,
    Backreference,
    Subroutine,
    GroupOpen,
    GroupClose,
    Alternator,
    Quantifier,
    Directive,
}

/// What kind of group a `GroupOpen` token introduces. Absent functions and
/// lookarounds are grouping constructs from the tokenizer's point of view
/// too — the parser decides which AST node each becomes.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOpenKind {
    Capturing,
    Named(String),
    NonCapturing,
    Atomic,
    Lookaround { kind: LookaroundKind, negate: bool },
    AbsentRepeater,
    /// `(?flags-flags:` — a flag modifier scoped to the group body.
    FlagsScoped(FlagGroupModifiers),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenData {
    None,
    Char(u32),
    ClassOpen {
        negate: bool,
    },
    CharacterSet {
        kind: CharacterSetKind,
        value: Option<String>,
        negate: bool,
    },
    Assertion {
        kind: AssertionKind,
        negate: bool,
    },
    Backreference {
        reference: Ref,
    },
    Subroutine {
        reference: Ref,
    },
    GroupOpen(GroupOpenKind),
    Quantifier {
        min: u32,
        max: Max,
        kind: QuantifierKind,
    },
    Directive {
        kind: DirectiveKind,
        flags: Option<FlagGroupModifiers>,
    },
}

/// Lexical scan cursor over the pattern's characters. Distinct from the
/// parser's token-index cursor — this one walks raw chars.
struct Cursor {
    chars: Vec<char>,
    i: usize,
    extended_mode: bool,
    in_class: usize,
}

impl Cursor {
    fn new(text: &str, extended_mode: bool) -> Self {
        Cursor {
            chars: text.chars().collect(),
            i: 0,
            extended_mode,
            in_class: 0,
        }
    }

    fn eof(&self) -> bool {
        self.i >= self.chars.len()
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.chars.get(self.i + n).copied()
    }

    fn take(&mut self) -> Option<char> {
        let ch = self.peek(0);
        if ch.is_some() {
            self.i += 1;
        }
        ch
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek(0) == Some(c) {
            self.i += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws_and_comments(&mut self) {
        if !self.extended_mode || self.in_class > 0 {
            return;
        }
        loop {
            match self.peek(0) {
                Some(c) if c.is_whitespace() => {
                    self.i += 1;
                }
                Some('#') => {
                    while !self.eof() && self.peek(0) != Some('\n') {
                        self.i += 1;
                    }
                }
                _ => break,
            }
        }
    }
}

pub struct Tokenizer {
    cur: Cursor,
    tokens: Vec<Token>,
    flags: Flags,
    capturing_count: u32,
    /// Total capturing groups anywhere in the pattern, known up front by a
    /// cheap pre-scan. Used only to disambiguate `\N` as a backreference
    /// versus an octal/literal escape, the way Oniguruma needs the whole
    /// pattern's group count to resolve that ambiguity; `capturing_count`
    /// (groups opened strictly to the left) is what the parser later
    /// checks to decide whether the reference is legal or orphaned.
    total_capturing_groups: u32,
    source: String,
}

impl Tokenizer {
    /// Tokenize `source` under `initial_flags` (an Oniguruma flag-letter
    /// string, e.g. `"im"`). Returns the token stream and the final flag
    /// record (mutated in place as inline `(?flags)` directives are
    /// scanned, mirroring what the parser will observe).
    pub fn tokenize(source: &str, initial_flags: &str) -> OnigResult<(Vec<Token>, Flags)> {
        let flags = Flags::from_letters(initial_flags);
        let mut tokenizer = Tokenizer {
            cur: Cursor::new(source, flags.extended),
            tokens: Vec::new(),
            flags,
            capturing_count: 0,
            total_capturing_groups: count_total_capturing_groups(source),
            source: source.to_string(),
        };
        tokenizer.run()?;
        Ok((tokenizer.tokens, tokenizer.flags))
    }

    fn err(&self, message: impl Into<String>, pos: usize) -> OnigError {
        OnigError::syntax(message, pos, self.source.clone())
    }

    fn run(&mut self) -> OnigResult<()> {
        loop {
            self.cur.skip_ws_and_comments();
            if self.cur.eof() {
                break;
            }
            self.scan_one()?;
        }
        Ok(())
    }

    fn push(&mut self, kind: TokenKind, start: usize, data: TokenData) {
        self.tokens.push(Token {
            kind,
            start,
            end: self.cur.i,
            data,
        });
    }

    fn scan_one(&mut self) -> OnigResult<()> {
        let start = self.cur.i;
        let in_class = self.cur.in_class > 0;
        let ch = self.cur.peek(0).unwrap();

        if in_class {
            return self.scan_in_class(start, ch);
        }

        match ch {
            '|' => {
                self.cur.take();
                self.push(TokenKind::Alternator, start, TokenData::None);
            }
            '(' => self.scan_group_open(start)?,
            ')' => {
                self.cur.take();
                self.push(TokenKind::GroupClose, start, TokenData::None);
            }
            '[' => {
                self.cur.take();
                self.cur.in_class += 1;
                let negate = self.cur.eat('^');
                self.push(TokenKind::CharacterClassOpen, start, TokenData::ClassOpen { negate });
            }
            '.' => {
                self.cur.take();
                self.push(
                    TokenKind::CharacterSet,
                    start,
                    TokenData::CharacterSet {
                        kind: CharacterSetKind::Any,
                        value: None,
                        negate: false,
                    },
                );
            }
            '^' => {
                self.cur.take();
                self.push(
                    TokenKind::Assertion,
                    start,
                    TokenData::Assertion {
                        kind: AssertionKind::LineStart,
                        negate: false,
                    },
                );
            }
            '$' => {
                self.cur.take();
                self.push(
                    TokenKind::Assertion,
                    start,
                    TokenData::Assertion {
                        kind: AssertionKind::LineEnd,
                        negate: false,
                    },
                );
            }
            '*' | '+' | '?' | '{' => self.scan_quantifier(start)?,
            '\\' => self.scan_escape(start)?,
            _ => {
                self.cur.take();
                self.push(TokenKind::Character, start, TokenData::Char(ch as u32));
            }
        }
        Ok(())
    }

    fn scan_in_class(&mut self, start: usize, ch: char) -> OnigResult<()> {
        match ch {
            ']' => {
                self.cur.take();
                self.cur.in_class -= 1;
                self.push(TokenKind::CharacterClassClose, start, TokenData::None);
            }
            '[' if self.cur.peek(1) == Some(':') => self.scan_posix_class(start)?,
            '[' => {
                self.cur.take();
                self.cur.in_class += 1;
                let negate = self.cur.eat('^');
                self.push(TokenKind::CharacterClassOpen, start, TokenData::ClassOpen { negate });
            }
            '&' if self.cur.peek(1) == Some('&') => {
                self.cur.take();
                self.cur.take();
                self.push(TokenKind::CharacterClassIntersector, start, TokenData::None);
            }
            '-' => {
                self.cur.take();
                self.push(TokenKind::CharacterClassHyphen, start, TokenData::None);
            }
            '\\' => self.scan_escape(start)?,
            _ => {
                self.cur.take();
                self.push(TokenKind::Character, start, TokenData::Char(ch as u32));
            }
        }
        Ok(())
    }

    fn scan_posix_class(&mut self, start: usize) -> OnigResult<()> {
        // `[:name:]` or `[:^name:]`
        self.cur.take(); // '['
        self.cur.take(); // ':'
        let negate = self.cur.eat('^');
        let mut name = String::new();
        while let Some(c) = self.cur.peek(0) {
            if c == ':' {
                break;
            }
            name.push(c);
            self.cur.take();
        }
        if !self.cur.eat(':') || !self.cur.eat(']') {
            return Err(self.err("Unterminated POSIX class", start));
        }
        self.push(
            TokenKind::CharacterSet,
            start,
            TokenData::CharacterSet {
                kind: CharacterSetKind::Posix,
                value: Some(name),
                negate,
            },
        );
        Ok(())
    }

    fn scan_group_open(&mut self, start: usize) -> OnigResult<()> {
        self.cur.take(); // '('
        if !self.cur.eat('?') {
            self.capturing_count += 1;
            self.push(TokenKind::GroupOpen, start, TokenData::GroupOpen(GroupOpenKind::Capturing));
            return Ok(());
        }

        match self.cur.peek(0) {
            Some(':') => {
                self.cur.take();
                self.push(
                    TokenKind::GroupOpen,
                    start,
                    TokenData::GroupOpen(GroupOpenKind::NonCapturing),
                );
            }
            Some('>') => {
                self.cur.take();
                self.push(TokenKind::GroupOpen, start, TokenData::GroupOpen(GroupOpenKind::Atomic));
            }
            Some('=') => {
                self.cur.take();
                self.push(
                    TokenKind::GroupOpen,
                    start,
                    TokenData::GroupOpen(GroupOpenKind::Lookaround {
                        kind: LookaroundKind::Lookahead,
                        negate: false,
                    }),
                );
            }
            Some('!') => {
                self.cur.take();
                self.push(
                    TokenKind::GroupOpen,
                    start,
                    TokenData::GroupOpen(GroupOpenKind::Lookaround {
                        kind: LookaroundKind::Lookahead,
                        negate: true,
                    }),
                );
            }
            Some('~') => {
                self.cur.take();
                self.push(
                    TokenKind::GroupOpen,
                    start,
                    TokenData::GroupOpen(GroupOpenKind::AbsentRepeater),
                );
            }
            Some('<') if matches!(self.cur.peek(1), Some('=') | Some('!')) => {
                self.cur.take();
                let negate = self.cur.take() == Some('!');
                self.push(
                    TokenKind::GroupOpen,
                    start,
                    TokenData::GroupOpen(GroupOpenKind::Lookaround {
                        kind: LookaroundKind::Lookbehind,
                        negate,
                    }),
                );
            }
            Some('<') => {
                self.cur.take();
                let name = self.scan_name_until('>', start)?;
                self.capturing_count += 1;
                self.push(
                    TokenKind::GroupOpen,
                    start,
                    TokenData::GroupOpen(GroupOpenKind::Named(name)),
                );
            }
            Some('\'') => {
                self.cur.take();
                let name = self.scan_name_until('\'', start)?;
                self.capturing_count += 1;
                self.push(
                    TokenKind::GroupOpen,
                    start,
                    TokenData::GroupOpen(GroupOpenKind::Named(name)),
                );
            }
            Some(c) if c.is_ascii_alphabetic() || c == '-' => {
                self.scan_flag_modifier(start)?;
            }
            _ => return Err(self.err("Unknown group modifier", start)),
        }
        Ok(())
    }

    fn scan_name_until(&mut self, terminator: char, start: usize) -> OnigResult<String> {
        let mut name = String::new();
        while let Some(c) = self.cur.peek(0) {
            if c == terminator {
                self.cur.take();
                return Ok(name);
            }
            name.push(c);
            self.cur.take();
        }
        Err(self.err("Unterminated group name", start))
    }

    /// `(?flags-flags:` or bare `(?flags-flags)`.
    fn scan_flag_modifier(&mut self, start: usize) -> OnigResult<()> {
        let mut enabling = String::new();
        let mut disabling = String::new();
        let mut seen_dash = false;
        loop {
            match self.cur.peek(0) {
                Some('-') => {
                    seen_dash = true;
                    self.cur.take();
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    self.cur.take();
                    if seen_dash {
                        disabling.push(c);
                    } else {
                        enabling.push(c);
                    }
                }
                _ => break,
            }
        }
        let modifiers = FlagGroupModifiers {
            enabling: Flags::from_letters(&enabling),
            disabling: Flags::from_letters(&disabling),
        };

        if self.cur.eat(':') {
            self.push(
                TokenKind::GroupOpen,
                start,
                TokenData::GroupOpen(GroupOpenKind::FlagsScoped(modifiers)),
            );
        } else if self.cur.eat(')') {
            // Bare mode modifier: applies to the rest of the enclosing
            // alternative. It is a Directive, not a Group — there's no
            // matching GroupClose.
            self.flags = apply_modifiers(self.flags, &modifiers);
            self.push(
                TokenKind::Directive,
                start,
                TokenData::Directive {
                    kind: DirectiveKind::Flags,
                    flags: Some(modifiers),
                },
            );
        } else {
            return Err(self.err("Unterminated group", start));
        }
        Ok(())
    }

    fn scan_quantifier(&mut self, start: usize) -> OnigResult<()> {
        let ch = self.cur.take().unwrap();
        let (min, max) = match ch {
            '*' => (0, Max::Unbounded),
            '+' => (1, Max::Unbounded),
            '?' => (0, Max::Bounded(1)),
            '{' => match self.try_scan_brace_quantifier(start)? {
                Some(bounds) => bounds,
                None => {
                    // Not a quantifier after all — treat `{` as a literal.
                    self.push(TokenKind::Character, start, TokenData::Char('{' as u32));
                    return Ok(());
                }
            },
            _ => unreachable!(),
        };

        let kind = if self.cur.eat('?') {
            QuantifierKind::Lazy
        } else if self.cur.eat('+') {
            QuantifierKind::Possessive
        } else {
            QuantifierKind::Greedy
        };

        self.push(TokenKind::Quantifier, start, TokenData::Quantifier { min, max, kind });
        Ok(())
    }

    /// Attempts `{m}`, `{m,}`, `{m,n}`, `{,n}`. Returns `None` (without
    /// consuming past `{`) if the contents don't form a valid bound, so
    /// the caller can fall back to a literal `{`.
    fn try_scan_brace_quantifier(&mut self, start: usize) -> OnigResult<Option<(u32, Max)>> {
        let save = self.cur.i;
        let mut min_digits = String::new();
        while let Some(c) = self.cur.peek(0) {
            if c.is_ascii_digit() {
                min_digits.push(c);
                self.cur.take();
            } else {
                break;
            }
        }

        let has_comma = self.cur.eat(',');
        let mut max_digits = String::new();
        if has_comma {
            while let Some(c) = self.cur.peek(0) {
                if c.is_ascii_digit() {
                    max_digits.push(c);
                    self.cur.take();
                } else {
                    break;
                }
            }
        }

        if min_digits.is_empty() && max_digits.is_empty() {
            self.cur.i = save;
            return Ok(None);
        }
        if !self.cur.eat('}') {
            self.cur.i = save;
            return Ok(None);
        }

        let min: u32 = if min_digits.is_empty() {
            0
        } else {
            min_digits
                .parse()
                .map_err(|_| self.err("Quantifier bound too large", start))?
        };
        let max = if !has_comma {
            Max::Bounded(min)
        } else if max_digits.is_empty() {
            Max::Unbounded
        } else {
            Max::Bounded(
                max_digits
                    .parse()
                    .map_err(|_| self.err("Quantifier bound too large", start))?,
            )
        };
        Ok(Some((min, max)))
    }

    fn scan_escape(&mut self, start: usize) -> OnigResult<()> {
        self.cur.take(); // '\\'
        let ch = self
            .cur
            .peek(0)
            .ok_or_else(|| self.err("Incomplete escape sequence", start))?;

        match ch {
            'd' | 'D' => {
                self.cur.take();
                self.push_class_escape(start, CharacterSetKind::Digit, ch.is_uppercase());
            }
            'h' | 'H' => {
                self.cur.take();
                self.push_class_escape(start, CharacterSetKind::Hex, ch.is_uppercase());
            }
            's' | 'S' => {
                self.cur.take();
                self.push_class_escape(start, CharacterSetKind::Space, ch.is_uppercase());
            }
            'w' | 'W' => {
                self.cur.take();
                self.push_class_escape(start, CharacterSetKind::Word, ch.is_uppercase());
            }
            'N' => {
                self.cur.take();
                self.push(
                    TokenKind::CharacterSet,
                    start,
                    TokenData::CharacterSet {
                        kind: CharacterSetKind::Newline,
                        value: None,
                        negate: true,
                    },
                );
            }
            'R' => {
                self.cur.take();
                self.push(
                    TokenKind::CharacterSet,
                    start,
                    TokenData::CharacterSet {
                        kind: CharacterSetKind::Newline,
                        value: None,
                        negate: false,
                    },
                );
            }
            'X' => {
                self.cur.take();
                self.push(
                    TokenKind::CharacterSet,
                    start,
                    TokenData::CharacterSet {
                        kind: CharacterSetKind::Grapheme,
                        value: None,
                        negate: false,
                    },
                );
            }
            'p' | 'P' => self.scan_property(start, ch == 'P')?,
            'A' => {
                self.cur.take();
                self.push_assertion(start, AssertionKind::StringStart, false);
            }
            'Z' => {
                self.cur.take();
                self.push_assertion(start, AssertionKind::StringEndNewline, false);
            }
            'z' => {
                self.cur.take();
                self.push_assertion(start, AssertionKind::StringEnd, false);
            }
            'G' => {
                self.cur.take();
                self.push_assertion(start, AssertionKind::SearchStart, false);
            }
            'b' => {
                self.cur.take();
                self.push_assertion(start, AssertionKind::WordBoundary, false);
            }
            'B' => {
                self.cur.take();
                self.push_assertion(start, AssertionKind::WordBoundary, true);
            }
            'y' => {
                self.cur.take();
                self.push_assertion(start, AssertionKind::GraphemeBoundary, false);
            }
            'Y' => {
                self.cur.take();
                self.push_assertion(start, AssertionKind::GraphemeBoundary, true);
            }
            'K' => {
                self.cur.take();
                self.push(
                    TokenKind::Directive,
                    start,
                    TokenData::Directive {
                        kind: DirectiveKind::Keep,
                        flags: None,
                    },
                );
            }
            'k' => self.scan_named_backreference(start)?,
            'g' => self.scan_subroutine(start)?,
            '1'..='9' => self.scan_numeric_backreference(start)?,
            '0' => self.scan_octal_escape(start)?,
            'x' => self.scan_hex_escape(start)?,
            'n' => {
                self.cur.take();
                self.push(TokenKind::Character, start, TokenData::Char('\n' as u32));
            }
            'r' => {
                self.cur.take();
                self.push(TokenKind::Character, start, TokenData::Char('\r' as u32));
            }
            't' => {
                self.cur.take();
                self.push(TokenKind::Character, start, TokenData::Char('\t' as u32));
            }
            'f' => {
                self.cur.take();
                self.push(TokenKind::Character, start, TokenData::Char(0x0C));
            }
            'v' => {
                self.cur.take();
                self.push(TokenKind::Character, start, TokenData::Char(0x0B));
            }
            'e' => {
                self.cur.take();
                self.push(TokenKind::Character, start, TokenData::Char(0x1B));
            }
            other => {
                // Identity escape: the escaped character, literally.
                self.cur.take();
                self.push(TokenKind::Character, start, TokenData::Char(other as u32));
            }
        }
        Ok(())
    }

    fn push_class_escape(&mut self, start: usize, kind: CharacterSetKind, negate: bool) {
        self.push(
            TokenKind::CharacterSet,
            start,
            TokenData::CharacterSet {
                kind,
                value: None,
                negate,
            },
        );
    }

    fn push_assertion(&mut self, start: usize, kind: AssertionKind, negate: bool) {
        self.push(TokenKind::Assertion, start, TokenData::Assertion { kind, negate });
    }

    fn scan_property(&mut self, start: usize, negate: bool) -> OnigResult<()> {
        self.cur.take(); // 'p' / 'P'
        let name = if self.cur.eat('{') {
            let mut name = String::new();
            let mut inner_negate = negate;
            if self.cur.eat('^') {
                inner_negate = !inner_negate;
            }
            while let Some(c) = self.cur.peek(0) {
                if c == '}' {
                    break;
                }
                name.push(c);
                self.cur.take();
            }
            if !self.cur.eat('}') {
                return Err(self.err("Unterminated Unicode property name", start));
            }
            self.push(
                TokenKind::CharacterSet,
                start,
                TokenData::CharacterSet {
                    kind: CharacterSetKind::Property,
                    value: Some(name),
                    negate: inner_negate,
                },
            );
            return Ok(());
        } else {
            // Single-letter shorthand form, e.g. `\pL`.
            let c = self
                .cur
                .take()
                .ok_or_else(|| self.err("Incomplete Unicode property escape", start))?;
            c.to_string()
        };
        self.push(
            TokenKind::CharacterSet,
            start,
            TokenData::CharacterSet {
                kind: CharacterSetKind::Property,
                value: Some(name),
                negate,
            },
        );
        Ok(())
    }

    /// `\k<name>`, `\k'name'`, `\k<-n>`.
    fn scan_named_backreference(&mut self, start: usize) -> OnigResult<()> {
        self.cur.take(); // 'k'
        let (open, close) = match self.cur.peek(0) {
            Some('<') => ('<', '>'),
            Some('\'') => ('\'', '\''),
            _ => return Err(self.err("Expected '<' or '\\'' after \\k", start)),
        };
        self.cur.take();
        let mut body = String::new();
        while let Some(c) = self.cur.peek(0) {
            if c == close {
                break;
            }
            body.push(c);
            self.cur.take();
        }
        let _ = open;
        if !self.cur.eat(close) {
            return Err(self.err("Unterminated backreference", start));
        }
        if body.is_empty() {
            return Err(self.err("Empty backreference name", start));
        }

        let reference = if let Some(rest) = body.strip_prefix('-') {
            let n: i64 = rest
                .parse()
                .map_err(|_| self.err("Invalid relative backreference", start))?;
            let resolved = self.capturing_count as i64 - n;
            if resolved < 1 {
                return Err(self.err(
                    "Relative backreference refers to a group before the start of the pattern",
                    start,
                ));
            }
            Ref::Number(resolved as u32)
        } else if body.starts_with('+') || body.contains(['-', '+']) {
            return Err(self.err(
                "Forward-relative and level-bearing backreference forms are not supported",
                start,
            ));
        } else if body.chars().all(|c| c.is_ascii_digit()) {
            Ref::Number(body.parse().map_err(|_| self.err("Invalid backreference", start))?)
        } else {
            Ref::Name(body)
        };

        self.push(TokenKind::Backreference, start, TokenData::Backreference { reference });
        Ok(())
    }

    /// `\g<name>`, `\g'name'`, `\g<N>`, `\g<+N>`, `\g<-N>`, `\g<0>`.
    fn scan_subroutine(&mut self, start: usize) -> OnigResult<()> {
        self.cur.take(); // 'g'
        let (open, close) = match self.cur.peek(0) {
            Some('<') => ('<', '>'),
            Some('\'') => ('\'', '\''),
            _ => return Err(self.err("Expected '<' or '\\'' after \\g", start)),
        };
        let _ = open;
        self.cur.take();
        let mut body = String::new();
        while let Some(c) = self.cur.peek(0) {
            if c == close {
                break;
            }
            body.push(c);
            self.cur.take();
        }
        if !self.cur.eat(close) {
            return Err(self.err("Unterminated subroutine reference", start));
        }
        if body.is_empty() {
            return Err(self.err("Empty subroutine reference", start));
        }

        let reference = if let Some(rest) = body.strip_prefix('+') {
            let n: i64 = rest
                .parse()
                .map_err(|_| self.err("Invalid relative subroutine reference", start))?;
            Ref::Number((self.capturing_count as i64 + n) as u32)
        } else if let Some(rest) = body.strip_prefix('-') {
            let n: i64 = rest
                .parse()
                .map_err(|_| self.err("Invalid relative subroutine reference", start))?;
            let resolved = self.capturing_count as i64 - n + 1;
            if resolved < 0 {
                return Err(self.err(
                    "Relative subroutine reference refers before the start of the pattern",
                    start,
                ));
            }
            Ref::Number(resolved as u32)
        } else if body.chars().all(|c| c.is_ascii_digit()) {
            Ref::Number(body.parse().map_err(|_| self.err("Invalid subroutine reference", start))?)
        } else {
            Ref::Name(body)
        };

        self.push(TokenKind::Subroutine, start, TokenData::Subroutine { reference });
        Ok(())
    }

    /// `\1`..`\99`: a backreference when the pattern contains at least
    /// that many capturing groups anywhere (Oniguruma's own
    /// backref-vs-octal disambiguation needs the whole pattern's group
    /// count, not just the count to the left); otherwise the digits are
    /// read back as literal characters. Whether the referenced group has
    /// actually been *defined yet* at this point — legal vs. orphaned — is
    /// the parser's job, checked against the running left-to-right count.
    fn scan_numeric_backreference(&mut self, start: usize) -> OnigResult<()> {
        let save = self.cur.i;
        let mut digits = String::new();
        while let Some(c) = self.cur.peek(0) {
            if c.is_ascii_digit() && digits.len() < 3 {
                digits.push(c);
                self.cur.take();
            } else {
                break;
            }
        }
        let n: u32 = digits.parse().unwrap_or(0);
        if n >= 1 && n <= self.total_capturing_groups {
            self.push(
                TokenKind::Backreference,
                start,
                TokenData::Backreference {
                    reference: Ref::Number(n),
                },
            );
            return Ok(());
        }

        // No such group anywhere in the pattern: back off to the first
        // digit as a literal character, re-scanning the remainder normally.
        self.cur.i = save;
        let ch = self.cur.take().unwrap();
        self.push(TokenKind::Character, start, TokenData::Char(ch as u32));
        Ok(())
    }

    fn scan_octal_escape(&mut self, start: usize) -> OnigResult<()> {
        self.cur.take(); // '0'
        let mut digits = String::new();
        while let Some(c) = self.cur.peek(0) {
            if ('0'..='7').contains(&c) && digits.len() < 2 {
                digits.push(c);
                self.cur.take();
            } else {
                break;
            }
        }
        let value = u32::from_str_radix(&digits, 8).unwrap_or(0);
        self.push(TokenKind::Character, start, TokenData::Char(value));
        Ok(())
    }

    fn scan_hex_escape(&mut self, start: usize) -> OnigResult<()> {
        self.cur.take(); // 'x'
        let value = if self.cur.eat('{') {
            let mut digits = String::new();
            while let Some(c) = self.cur.peek(0) {
                if c == '}' {
                    break;
                }
                digits.push(c);
                self.cur.take();
            }
            if !self.cur.eat('}') {
                return Err(self.err("Unterminated hex escape", start));
            }
            u32::from_str_radix(&digits, 16)
                .map_err(|_| self.err("Invalid hex escape", start))?
        } else {
            let mut digits = String::new();
            while let Some(c) = self.cur.peek(0) {
                if c.is_ascii_hexdigit() && digits.len() < 2 {
                    digits.push(c);
                    self.cur.take();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                return Err(self.err("Invalid hex escape", start));
            }
            u32::from_str_radix(&digits, 16)
                .map_err(|_| self.err("Invalid hex escape", start))?
        };
        self.push(TokenKind::Character, start, TokenData::Char(value));
        Ok(())
    }
}

/// Cheap pre-scan counting capturing-group opens anywhere in the source,
/// honoring escapes and character-class nesting so that parens inside
/// `[...]` or escaped `\(` never count.
fn count_total_capturing_groups(source: &str) -> u32 {
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    let mut in_class = 0usize;
    let mut count = 0u32;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '[' if in_class == 0 || chars.get(i + 1) != Some(&':') => {
                in_class += 1;
            }
            ']' if in_class > 0 => {
                in_class -= 1;
            }
            '(' if in_class == 0 => {
                if chars.get(i + 1) != Some(&'?') {
                    count += 1;
                } else {
                    match chars.get(i + 2) {
                        Some('<') if !matches!(chars.get(i + 3), Some('=') | Some('!')) => {
                            count += 1;
                        }
                        Some('\'') => count += 1,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    count
}

fn apply_modifiers(mut flags: Flags, modifiers: &FlagGroupModifiers) -> Flags {
    macro_rules! apply {
        ($field:ident) => {
            if modifiers.enabling.$field {
                flags.$field = true;
            }
            if modifiers.disabling.$field {
                flags.$field = false;
            }
        };
    }
    apply!(ignore_case);
    apply!(dot_all);
    apply!(extended);
    apply!(digit_is_ascii);
    apply!(space_is_ascii);
    apply!(word_is_ascii);
    apply!(posix_is_ascii);
    apply!(text_segment_mode);
    flags
}

/// Distinct reserved words the parser asks about structurally; kept here
/// so both modules see the same spelling.
pub fn reserved_escape_letters() -> HashSet<char> {
    "dDhHsSwWNRXpPAZzGbByYKkg0123456789x".chars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, _) = Tokenizer::tokenize(src, "").unwrap();
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_plain_literal() {
        assert_eq!(
            kinds("ab"),
            vec![TokenKind::Character, TokenKind::Character]
        );
    }

    #[test]
    fn tokenizes_class_boundaries() {
        assert_eq!(
            kinds("[a-z]"),
            vec![
                TokenKind::CharacterClassOpen,
                TokenKind::Character,
                TokenKind::CharacterClassHyphen,
                TokenKind::Character,
                TokenKind::CharacterClassClose,
            ]
        );
    }

    #[test]
    fn backreference_requires_prior_group() {
        let (tokens, _) = Tokenizer::tokenize(r"(a)\1", "").unwrap();
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Backreference);
        assert_eq!(
            last.data,
            TokenData::Backreference {
                reference: Ref::Number(1)
            }
        );
    }

    #[test]
    fn numeric_escape_without_groups_is_literal() {
        let (tokens, _) = Tokenizer::tokenize(r"\1", "").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Character);
    }

    #[test]
    fn brace_quantifier_parses_bounds() {
        let (tokens, _) = Tokenizer::tokenize("a{2,5}", "").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Quantifier);
        assert_eq!(
            tokens[1].data,
            TokenData::Quantifier {
                min: 2,
                max: Max::Bounded(5),
                kind: QuantifierKind::Greedy
            }
        );
    }

    #[test]
    fn malformed_brace_falls_back_to_literal() {
        let (tokens, _) = Tokenizer::tokenize("a{z}", "").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Character);
        assert_eq!(tokens[1].data, TokenData::Char('{' as u32));
    }

    #[test]
    fn flags_directive_mutates_running_flags() {
        let (tokens, flags) = Tokenizer::tokenize("(?i)a", "").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Directive);
        assert!(flags.ignore_case);
    }

    #[test]
    fn lookbehind_negate_detected() {
        let (tokens, _) = Tokenizer::tokenize("(?<!a)", "").unwrap();
        match &tokens[0].data {
            TokenData::GroupOpen(GroupOpenKind::Lookaround { kind, negate }) => {
                assert_eq!(*kind, LookaroundKind::Lookbehind);
                assert!(*negate);
            }
            other => panic!("unexpected token data: {other:?}"),
        }
    }
}
