//! AST node definitions and factory constructors.
//!
//! The AST is a single closed discriminated union ([`Node`]); every
//! constructor in this module returns that same type, and consumers
//! switch on its tag rather than walking a class hierarchy. Each factory
//! validates the *local* invariant owed to that node alone (a descending
//! range, an out-of-range code point, an unknown POSIX class name, ...);
//! invariants that span multiple nodes (capturing-group numbering,
//! backref/subroutine resolution, lookbehind content) are the parser's
//! job, not the constructors'.

use regex::Regex as TextRegex;
use serde::{Deserialize, Serialize};

use super::errors::{OnigError, OnigResult};

/// The maximum Unicode scalar value Oniguruma will accept for a single
/// `Character` node.
pub const MAX_CODE_POINT: u32 = 0x10FFFF;
/// Oniguruma additionally tolerates numeric escapes up to this value when
/// `use_last_valid` is set, clamping down to [`MAX_CODE_POINT`].
pub const MAX_CODE_POINT_LENIENT: u32 = 0x13FFFF;

// ---------------------------------------------------------------------
// The union
// ---------------------------------------------------------------------

/// Every AST node variant, tagged by `type` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Regex(Regex),
    Pattern(Pattern),
    Alternative(Alternative),
    Flags(Flags),
    Character(Character),
    CharacterClass(CharacterClass),
    CharacterClassRange(CharacterClassRange),
    CharacterSet(CharacterSet),
    Assertion(Assertion),
    LookaroundAssertion(LookaroundAssertion),
    Group(Group),
    CapturingGroup(CapturingGroup),
    AbsentFunction(AbsentFunction),
    Backreference(Backreference),
    Subroutine(Subroutine),
    Quantifier(Quantifier),
    Directive(Directive),
}

impl Node {
    /// The tag name used for visitor dispatch (spec.md §4.4) and for
    /// `#[serde(tag = "type")]` — kept as one method so the two never
    /// drift apart.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Regex(_) => "Regex",
            Node::Pattern(_) => "Pattern",
            Node::Alternative(_) => "Alternative",
            Node::Flags(_) => "Flags",
            Node::Character(_) => "Character",
            Node::CharacterClass(_) => "CharacterClass",
            Node::CharacterClassRange(_) => "CharacterClassRange",
            Node::CharacterSet(_) => "CharacterSet",
            Node::Assertion(_) => "Assertion",
            Node::LookaroundAssertion(_) => "LookaroundAssertion",
            Node::Group(_) => "Group",
            Node::CapturingGroup(_) => "CapturingGroup",
            Node::AbsentFunction(_) => "AbsentFunction",
            Node::Backreference(_) => "Backreference",
            Node::Subroutine(_) => "Subroutine",
            Node::Quantifier(_) => "Quantifier",
            Node::Directive(_) => "Directive",
        }
    }

    /// True for node kinds that may legally sit under a [`Quantifier`]
    /// (spec.md §3's global invariant: not `Assertion`, `Directive`, or
    /// `LookaroundAssertion`).
    pub fn is_quantifiable(&self) -> bool {
        !matches!(
            self,
            Node::Assertion(_) | Node::Directive(_) | Node::LookaroundAssertion(_)
        )
    }
}

// ---------------------------------------------------------------------
// Root / structural nodes
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regex {
    pub pattern: Box<Node>,
    pub flags: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub alternatives: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub elements: Vec<Node>,
}

/// The flags record. Field set matches spec.md §3 exactly; no extra
/// JS/PCRE-only flags (`multiline`, `unicode`, ...) are invented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Flags {
    pub ignore_case: bool,
    pub dot_all: bool,
    pub extended: bool,
    pub digit_is_ascii: bool,
    pub space_is_ascii: bool,
    pub word_is_ascii: bool,
    pub posix_is_ascii: bool,
    pub text_segment_mode: bool,
}

impl Flags {
    /// Parse an Oniguruma-style flag-letter string (`"im"`, `"mix"`, ...).
    /// Unknown letters are ignored; the caller surfaces an `Invalid flag`
    /// error before calling this if strictness is desired.
    pub fn from_letters(letters: &str) -> Self {
        let mut f = Flags::default();
        for ch in letters.chars() {
            match ch {
                'i' => f.ignore_case = true,
                'm' => f.dot_all = true, // ONIG_OPTION_MULTILINE: dot matches newline
                'x' => f.extended = true,
                'D' => f.digit_is_ascii = true,
                'S' => f.space_is_ascii = true,
                'W' => f.word_is_ascii = true,
                'P' => f.posix_is_ascii = true,
                'y' => f.text_segment_mode = true,
                _ => {}
            }
        }
        f
    }
}

// ---------------------------------------------------------------------
// Characters and character classes
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Union,
    Intersection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterClass {
    pub kind: ClassKind,
    pub negate: bool,
    pub elements: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterClassRange {
    pub min: Box<Node>,
    pub max: Box<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterSetKind {
    Any,
    Digit,
    Hex,
    Space,
    Word,
    Newline,
    Grapheme,
    Posix,
    Property,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSet {
    pub kind: CharacterSetKind,
    /// Present for `posix` (class name, e.g. `"alpha"`) and `property`
    /// (property name, e.g. `"Decimal_Number"`) kinds only.
    pub value: Option<String>,
    pub negate: bool,
    /// Set for `grapheme` and non-negated `newline`, per spec.md §3.
    pub variable_length: bool,
}

pub const POSIX_CLASS_NAMES: &[&str] = &[
    "alnum", "alpha", "ascii", "blank", "cntrl", "digit", "graph", "lower", "print", "punct",
    "space", "upper", "word", "xdigit",
];

// ---------------------------------------------------------------------
// Assertions
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionKind {
    LineStart,
    LineEnd,
    StringStart,
    StringEnd,
    StringEndNewline,
    SearchStart,
    WordBoundary,
    GraphemeBoundary,
}

impl AssertionKind {
    /// Only `word_boundary` and `grapheme_boundary` carry a meaningful
    /// `negate` flag (spec.md §3).
    pub fn supports_negate(self) -> bool {
        matches!(
            self,
            AssertionKind::WordBoundary | AssertionKind::GraphemeBoundary
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub kind: AssertionKind,
    pub negate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookaroundKind {
    Lookahead,
    Lookbehind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookaroundAssertion {
    pub kind: LookaroundKind,
    pub negate: bool,
    pub alternatives: Vec<Node>,
}

// ---------------------------------------------------------------------
// Groups, captures, subroutines, backreferences
// ---------------------------------------------------------------------

/// Enable/disable flag sets carried by a scoped flag modifier, on either
/// a [`Group`] or a flags [`Directive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlagGroupModifiers {
    pub enabling: Flags,
    pub disabling: Flags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub atomic: bool,
    pub flags: Option<FlagGroupModifiers>,
    pub alternatives: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturingGroup {
    /// 1-based, assigned in source order.
    pub number: u32,
    pub name: Option<String>,
    pub alternatives: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsentFunctionKind {
    Repeater,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsentFunction {
    pub kind: AbsentFunctionKind,
    pub alternatives: Vec<Node>,
}

/// Either a numbered or a named reference target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref {
    Number(u32),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backreference {
    #[serde(rename = "ref")]
    pub reference: Ref,
    /// Set when the referenced group lies to the right and validation
    /// was skipped (`skipBackrefValidation`).
    pub orphan: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subroutine {
    /// `Ref::Number(0)` denotes whole-pattern recursion.
    #[serde(rename = "ref")]
    pub reference: Ref,
}

// ---------------------------------------------------------------------
// Quantifiers
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantifierKind {
    Greedy,
    Lazy,
    Possessive,
}

/// The quantifier's upper bound; `Unbounded` is the sentinel for `*`/`+`
/// and for `{n,}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Max {
    Bounded(u32),
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantifier {
    pub element: Box<Node>,
    pub min: u32,
    pub max: Max,
    pub kind: QuantifierKind,
}

// ---------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    Keep,
    Flags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Present only when `kind == Flags`.
    pub flags: Option<FlagGroupModifiers>,
}

// ---------------------------------------------------------------------
// Factory constructors
// ---------------------------------------------------------------------
//
// Every `create_*` function returns the shared `Node` union and validates
// only the invariant local to the node it builds.

pub fn create_regex(pattern: Node, flags: Node) -> Node {
    Node::Regex(Regex {
        pattern: Box::new(pattern),
        flags: Box::new(flags),
    })
}

pub fn create_pattern(alternatives: Vec<Node>) -> Node {
    Node::Pattern(Pattern { alternatives })
}

pub fn create_alternative(elements: Vec<Node>) -> Node {
    Node::Alternative(Alternative { elements })
}

pub fn create_flags(flags: Flags) -> Node {
    Node::Flags(flags)
}

/// Options for [`create_character`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateCharacterOptions {
    /// When true, a code point in `(MAX_CODE_POINT, MAX_CODE_POINT_LENIENT]`
    /// is clamped down to `MAX_CODE_POINT` instead of erroring.
    pub use_last_valid: bool,
}

pub fn create_character(value: u32, options: CreateCharacterOptions) -> OnigResult<Node> {
    if value > MAX_CODE_POINT_LENIENT {
        return Err(OnigError::invariant(format!(
            "code point {value:#x} exceeds the maximum accepted value {MAX_CODE_POINT_LENIENT:#x}"
        )));
    }
    let value = if value > MAX_CODE_POINT {
        if options.use_last_valid {
            MAX_CODE_POINT
        } else {
            return Err(OnigError::invariant(format!(
                "code point {value:#x} exceeds U+10FFFF"
            )));
        }
    } else {
        value
    };
    Ok(Node::Character(Character { value }))
}

pub fn create_character_class(kind: ClassKind, negate: bool, elements: Vec<Node>) -> Node {
    Node::CharacterClass(CharacterClass {
        kind,
        negate,
        elements,
    })
}

/// Rejects a descending range (`min.value > max.value`).
pub fn create_character_class_range(min: Node, max: Node) -> OnigResult<Node> {
    let (min_val, max_val) = match (&min, &max) {
        (Node::Character(lo), Node::Character(hi)) => (lo.value, hi.value),
        _ => {
            return Err(OnigError::invariant(
                "character class range endpoints must be Character nodes".to_string(),
            ))
        }
    };
    if min_val > max_val {
        return Err(OnigError::invariant(format!(
            "descending range: {min_val:#x}-{max_val:#x}"
        )));
    }
    Ok(Node::CharacterClassRange(CharacterClassRange {
        min: Box::new(min),
        max: Box::new(max),
    }))
}

pub fn create_character_set(kind: CharacterSetKind, value: Option<String>, negate: bool) -> Node {
    let variable_length = matches!(kind, CharacterSetKind::Grapheme)
        || (matches!(kind, CharacterSetKind::Newline) && !negate);
    Node::CharacterSet(CharacterSet {
        kind,
        value,
        negate,
        variable_length,
    })
}

/// Rejects unknown POSIX class names (spec.md §6).
pub fn create_posix_class(name: &str, negate: bool) -> OnigResult<Node> {
    if !POSIX_CLASS_NAMES.contains(&name) {
        return Err(OnigError::invariant(format!(
            "unknown POSIX class name '{name}'"
        )));
    }
    Ok(create_character_set(
        CharacterSetKind::Posix,
        Some(name.to_string()),
        negate,
    ))
}

pub fn create_assertion(kind: AssertionKind, negate: bool) -> Node {
    Node::Assertion(Assertion {
        kind,
        negate: negate && kind.supports_negate(),
    })
}

pub fn create_lookaround_assertion(
    kind: LookaroundKind,
    negate: bool,
    alternatives: Vec<Node>,
) -> Node {
    Node::LookaroundAssertion(LookaroundAssertion {
        kind,
        negate,
        alternatives,
    })
}

pub fn create_group(
    atomic: bool,
    flags: Option<FlagGroupModifiers>,
    alternatives: Vec<Node>,
) -> Node {
    Node::Group(Group {
        atomic,
        flags,
        alternatives,
    })
}

fn capturing_group_name_re() -> TextRegex {
    // `^[\p{Alpha}\p{Pc}][^)]*$`
    TextRegex::new(r"^[\p{Alphabetic}\p{Pc}][^)]*$").expect("valid capturing-group name pattern")
}

/// Rejects names failing `^[\p{Alpha}\p{Pc}][^)]*$`.
pub fn create_capturing_group(
    number: u32,
    name: Option<String>,
    alternatives: Vec<Node>,
) -> OnigResult<Node> {
    if let Some(name) = &name {
        if !capturing_group_name_re().is_match(name) {
            return Err(OnigError::invariant(format!(
                "invalid capturing group name '{name}'"
            )));
        }
    }
    Ok(Node::CapturingGroup(CapturingGroup {
        number,
        name,
        alternatives,
    }))
}

pub fn create_absent_function(kind: AbsentFunctionKind, alternatives: Vec<Node>) -> Node {
    Node::AbsentFunction(AbsentFunction { kind, alternatives })
}

pub fn create_backreference(reference: Ref, orphan: bool) -> Node {
    Node::Backreference(Backreference { reference, orphan })
}

pub fn create_subroutine(reference: Ref) -> Node {
    Node::Subroutine(Subroutine { reference })
}

/// Rejects a non-quantifiable element (spec.md §3's global invariant).
pub fn create_quantifier(
    element: Node,
    min: u32,
    max: Max,
    kind: QuantifierKind,
) -> OnigResult<Node> {
    if !element.is_quantifiable() {
        return Err(OnigError::invariant(format!(
            "{} is not quantifiable",
            element.type_name()
        )));
    }
    if let Max::Bounded(max_val) = max {
        if max_val < min {
            return Err(OnigError::invariant(format!(
                "quantifier max {max_val} is less than min {min}; the caller must reinterpret \
                 this as possessive with swapped bounds before constructing the node"
            )));
        }
    }
    Ok(Node::Quantifier(Quantifier {
        element: Box::new(element),
        min,
        max,
        kind,
    }))
}

pub fn create_directive(kind: DirectiveKind, flags: Option<FlagGroupModifiers>) -> OnigResult<Node> {
    if matches!(kind, DirectiveKind::Keep) && flags.is_some() {
        return Err(OnigError::invariant(
            "a keep directive does not carry flag modifiers".to_string(),
        ));
    }
    if matches!(kind, DirectiveKind::Flags) && flags.is_none() {
        return Err(OnigError::invariant(
            "a flags directive must carry flag modifiers".to_string(),
        ));
    }
    Ok(Node::Directive(Directive { kind, flags }))
}
