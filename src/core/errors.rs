//! Error taxonomy for the parser, traverser and optimizer.
//!
//! Every fallible public operation returns `Result<T, OnigError>`. There is
//! no partial-result mode: a failing `parse` or `optimize` call discards
//! whatever AST it had under construction. Each variant carries enough
//! context (message, source text, byte position) to render a one-line
//! pointer into the offending source, the same way a hand syntax-error
//! reporter would.

use thiserror::Error;

/// Look up an instructional hint for a parser error message. Kept as a
/// free function (rather than a method) so it can be consulted from the
/// parser before an `OnigError` is even constructed.
pub fn hint_for(message: &str) -> Option<&'static str> {
    if message.contains("Unterminated character class") {
        return Some(
            "This character class was opened with '[' but never closed. Add a matching ']'.",
        );
    }
    if message.contains("Unterminated group") {
        return Some("This group was opened with '(' but never closed. Add a matching ')'.");
    }
    if message.contains("Unterminated lookbehind") || message.contains("Unterminated lookahead") {
        return Some("This assertion was opened with '(?' but never closed. Add a matching ')'.");
    }
    if message.contains("Empty character class") {
        return Some("Character classes must contain at least one item.");
    }
    if message.contains("Unmatched ')'") {
        return Some("This ')' has no matching '('. Escape it with '\\)' to match it literally.");
    }
    if message.contains("descending range") || message.contains("Invalid range") {
        return Some("A character class range must have its low end before its high end, e.g. 'a-z' not 'z-a'.");
    }
    if message.contains("orphan") || message.contains("to the right") {
        return Some("A backreference must refer to a group that appears earlier in the pattern.");
    }
    if message.contains("lookbehind") {
        return Some(
            "Oniguruma restricts what can appear inside lookbehind; see the lookbehind rules.",
        );
    }
    None
}

/// A byte offset into the source pattern where an error was detected.
pub type Pos = usize;

/// The single error type produced by this crate's public operations.
///
/// Variants correspond to the spec's abstract error kinds: `SyntaxError`,
/// `ReferenceError`, `FeatureError`, `InvariantError`, and
/// `OptimizerNonConverging`.
#[derive(Debug, Clone, Error)]
pub enum OnigError {
    /// Malformed source: unclosed class/group, invalid escape, empty
    /// class, invalid range, invalid property name, out-of-range code
    /// point.
    #[error("{}", render(.message, *.pos, .text))]
    Syntax {
        message: String,
        pos: Pos,
        text: String,
    },

    /// A backreference or subroutine target is missing, lies to the
    /// right of the reference, is a duplicate name used as a subroutine
    /// target, or mixes numbered refs with named captures illegally.
    #[error("{}", render(.message, *.pos, .text))]
    Reference {
        message: String,
        pos: Pos,
        text: String,
    },

    /// A construct is not supported in its context: disallowed inside
    /// lookbehind, nested absent functions, unsupported subroutine forms.
    #[error("{}", render(.message, *.pos, .text))]
    Feature {
        message: String,
        pos: Pos,
        text: String,
    },

    /// An AST-construction invariant was violated by a caller or
    /// transform (e.g. a descending character-class range handed to a
    /// factory function). Indicates a bug upstream of this crate.
    #[error("invariant violated: {message}")]
    Invariant { message: String },

    /// The optimizer's fixed-point loop exceeded its pass-count safety
    /// bound without converging.
    #[error("optimizer did not converge after {passes} passes")]
    OptimizerNonConverging { passes: usize },
}

fn render(message: &str, pos: Pos, text: &str) -> String {
    format_pointer(message, pos, text, hint_for(message))
}

/// Render a message plus a `line | text` / caret pointer, the same shape
/// an editor-integrated diagnostic uses. `hint`, when present, is appended
/// as a trailing `Hint: ...` paragraph.
pub fn format_pointer(message: &str, pos: Pos, text: &str, hint: Option<&str>) -> String {
    if text.is_empty() {
        return format!("{message} at position {pos}");
    }

    let mut line_num = 1;
    let mut line_text = "";
    let mut col = pos;
    let mut current_pos = 0;
    let lines: Vec<&str> = text.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        let line_len = line.len() + 1; // account for the stripped newline
        if current_pos + line_len > pos {
            line_num = i + 1;
            line_text = line;
            col = pos - current_pos;
            break;
        }
        current_pos += line_len;
    }

    if line_text.is_empty() && !lines.is_empty() {
        line_num = lines.len();
        line_text = lines[lines.len() - 1];
        col = line_text.len();
    }

    let mut parts = vec![
        format!("Oniguruma parse error: {message}"),
        String::new(),
        format!("> {line_num} | {line_text}"),
        format!(">   | {}^", " ".repeat(col)),
    ];

    if let Some(hint) = hint {
        parts.push(String::new());
        parts.push(format!("Hint: {hint}"));
    }

    parts.join("\n")
}

impl OnigError {
    /// A syntax error at `pos` within `text`.
    pub fn syntax(message: impl Into<String>, pos: Pos, text: impl Into<String>) -> Self {
        OnigError::Syntax {
            message: message.into(),
            pos,
            text: text.into(),
        }
    }

    pub fn reference(message: impl Into<String>, pos: Pos, text: impl Into<String>) -> Self {
        OnigError::Reference {
            message: message.into(),
            pos,
            text: text.into(),
        }
    }

    pub fn feature(message: impl Into<String>, pos: Pos, text: impl Into<String>) -> Self {
        OnigError::Feature {
            message: message.into(),
            pos,
            text: text.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        OnigError::Invariant {
            message: message.into(),
        }
    }

    /// The underlying short message, without position/line rendering.
    pub fn message(&self) -> &str {
        match self {
            OnigError::Syntax { message, .. }
            | OnigError::Reference { message, .. }
            | OnigError::Feature { message, .. }
            | OnigError::Invariant { message } => message,
            OnigError::OptimizerNonConverging { .. } => "optimizer did not converge",
        }
    }

    /// The instructional hint for this error, if one is known.
    pub fn hint(&self) -> Option<&'static str> {
        hint_for(self.message())
    }

    /// Render this error as an LSP `Diagnostic`-shaped JSON value.
    pub fn to_lsp_diagnostic(&self) -> serde_json::Value {
        let (pos, text) = match self {
            OnigError::Syntax { pos, text, .. }
            | OnigError::Reference { pos, text, .. }
            | OnigError::Feature { pos, text, .. } => (*pos, text.as_str()),
            OnigError::Invariant { .. } | OnigError::OptimizerNonConverging { .. } => (0, ""),
        };

        let lines: Vec<&str> = text.lines().collect();
        let mut line_num = 0usize;
        let mut col = pos;
        let mut current_pos = 0usize;
        for (i, line) in lines.iter().enumerate() {
            let line_len = line.len() + 1;
            if current_pos + line_len > pos {
                line_num = i;
                col = pos - current_pos;
                break;
            }
            current_pos += line_len;
        }

        let mut message = self.message().to_string();
        if let Some(hint) = self.hint() {
            message.push_str("\n\nHint: ");
            message.push_str(hint);
        }

        serde_json::json!({
            "range": {
                "start": {"line": line_num, "character": col},
                "end": {"line": line_num, "character": col + 1},
            },
            "severity": 1,
            "message": message,
            "source": "oniguruma-parser",
        })
    }
}

pub type OnigResult<T> = Result<T, OnigError>;
