//! Unicode property-name table — an external collaborator, not a full
//! Unicode Character Database transcription. Supplies a small slug →
//! canonical-name map for the handful of properties the shorthand
//! transforms (`use-shorthands`, `use-unicode-aliases`) and the parser's
//! `\p{Name}` validation care about, plus the name-normalization routine
//! `normalizeUnknownPropertyNames` describes.

/// `(slug, canonical name)`. The slug is the lookup key: lowercase with
/// every `-`, `_` and space stripped entirely (not collapsed — removed).
const PROPERTY_ALIASES: &[(&str, &str)] = &[
    ("nd", "Decimal_Number"),
    ("decimalnumber", "Decimal_Number"),
    ("l", "Letter"),
    ("letter", "Letter"),
    ("lu", "Uppercase_Letter"),
    ("uppercaseletter", "Uppercase_Letter"),
    ("ll", "Lowercase_Letter"),
    ("lowercaseletter", "Lowercase_Letter"),
    ("lt", "Titlecase_Letter"),
    ("lm", "Modifier_Letter"),
    ("lo", "Other_Letter"),
    ("m", "Mark"),
    ("mark", "Mark"),
    ("mn", "Nonspacing_Mark"),
    ("mc", "Spacing_Mark"),
    ("me", "Enclosing_Mark"),
    ("n", "Number"),
    ("number", "Number"),
    ("nl", "Letter_Number"),
    ("no", "Other_Number"),
    ("pc", "Connector_Punctuation"),
    ("connectorpunctuation", "Connector_Punctuation"),
    ("p", "Punctuation"),
    ("punctuation", "Punctuation"),
    ("ahex", "ASCII_Hex_Digit"),
    ("asciihexdigit", "ASCII_Hex_Digit"),
    ("wspace", "White_Space"),
    ("whitespace", "White_Space"),
    ("space", "White_Space"),
    ("cc", "Control"),
    ("control", "Control"),
    ("cntrl", "Control"),
    ("any", "Any"),
];

/// Canonical name → short alias, the reverse direction used by
/// `use-unicode-aliases`.
const SHORT_ALIASES: &[(&str, &str)] = &[
    ("Decimal_Number", "Nd"),
    ("Letter", "L"),
    ("Uppercase_Letter", "Lu"),
    ("Lowercase_Letter", "Ll"),
    ("Titlecase_Letter", "Lt"),
    ("Modifier_Letter", "Lm"),
    ("Other_Letter", "Lo"),
    ("Mark", "M"),
    ("Nonspacing_Mark", "Mn"),
    ("Spacing_Mark", "Mc"),
    ("Enclosing_Mark", "Me"),
    ("Number", "N"),
    ("Letter_Number", "Nl"),
    ("Other_Number", "No"),
    ("Connector_Punctuation", "Pc"),
    ("Punctuation", "P"),
    ("ASCII_Hex_Digit", "AHex"),
    ("White_Space", "WSpace"),
    ("Control", "Cc"),
];

/// Lowercase `name` and strip every `-`, `_` and space, producing the
/// lookup key used against [`PROPERTY_ALIASES`] and any caller-supplied
/// `unicode_property_map`.
pub fn normalize_slug(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Look up a property name's canonical spelling via the built-in table.
pub fn lookup(slug: &str) -> Option<&'static str> {
    PROPERTY_ALIASES
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, canonical)| *canonical)
}

/// The short alias for a canonical property name, if one is known.
pub fn short_alias(canonical: &str) -> Option<&'static str> {
    SHORT_ALIASES
        .iter()
        .find(|(c, _)| *c == canonical)
        .map(|(_, alias)| *alias)
}

/// `normalizeUnknownPropertyNames`: trim, collapse runs of `[-_ ]+` to a
/// single `_`, split camelCase on word boundaries, title-case each word.
pub fn normalize_unknown(name: &str) -> String {
    let trimmed = name.trim();
    let mut collapsed = String::new();
    let mut last_was_sep = false;
    for c in trimmed.chars() {
        if matches!(c, '-' | '_' | ' ') {
            if !last_was_sep && !collapsed.is_empty() {
                collapsed.push('_');
            }
            last_was_sep = true;
        } else {
            collapsed.push(c);
            last_was_sep = false;
        }
    }
    let collapsed = collapsed.trim_matches('_');

    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = collapsed.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if i > 0
            && c.is_uppercase()
            && chars[i - 1].is_lowercase()
            && !current.is_empty()
        {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .into_iter()
        .map(|w| title_case(&w))
        .collect::<Vec<_>>()
        .join("_")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}
