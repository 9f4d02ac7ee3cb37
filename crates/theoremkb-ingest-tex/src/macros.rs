//! MathJax → KaTeX macro translation.
//!
//! MathJax macro declarations arrive as `name: <literal>` strings, where the
//! literal is either a template string or a `[template, arg_count]` array:
//!
//! ```text
//! emph: ["\\textit{#1}", 1]      →  \emph  ↦ \textit{#1}
//! Tr: "\\operatorname{Tr}"        →  \Tr    ↦ \operatorname{Tr}
//! ```
//!
//! KaTeX wants a map from the escaped macro name to the template.

use serde_json::Value;
use std::collections::BTreeMap;

/// Separator between macro name and literal.
pub const MACRO_SEPARATOR: &str = ": ";

#[derive(Debug, thiserror::Error)]
pub enum MacroError {
    #[error("macro declaration `{declaration}` has no `: ` separator")]
    MissingSeparator { declaration: String },

    #[error("macro declaration `{declaration}` has an invalid literal: {source}")]
    InvalidLiteral {
        declaration: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("macro declaration `{declaration}` is neither a string nor an array starting with a string")]
    UnsupportedValue { declaration: String },
}

/// KaTeX macro table, keyed by `\name`.
pub type KatexMacros = BTreeMap<String, String>;

/// Translate one MathJax declaration into a `(\name, template)` pair.
///
/// The literal is read as JSON. Python-only literal forms are rejected as
/// [`MacroError::InvalidLiteral`]: single-quoted strings such as `'\\x'`, and
/// backslash escapes JSON does not define such as `"\operatorname"` (write
/// `"\\operatorname"`).
pub fn translate_macro(declaration: &str) -> Result<(String, String), MacroError> {
    let (name, literal) =
        declaration
            .split_once(MACRO_SEPARATOR)
            .ok_or_else(|| MacroError::MissingSeparator {
                declaration: declaration.to_string(),
            })?;

    let value: Value =
        serde_json::from_str(literal).map_err(|source| MacroError::InvalidLiteral {
            declaration: declaration.to_string(),
            source,
        })?;

    let template = match value {
        Value::String(template) => template,
        Value::Array(mut items) if !items.is_empty() => match items.swap_remove(0) {
            Value::String(template) => template,
            _ => {
                return Err(MacroError::UnsupportedValue {
                    declaration: declaration.to_string(),
                })
            }
        },
        _ => {
            return Err(MacroError::UnsupportedValue {
                declaration: declaration.to_string(),
            })
        }
    };

    Ok((format!("\\{name}"), template))
}

/// Translate a list of declarations. The first malformed declaration aborts
/// the whole call; no partial table is returned.
pub fn translate_macros<S: AsRef<str>>(declarations: &[S]) -> Result<KatexMacros, MacroError> {
    let mut macros = KatexMacros::new();
    for declaration in declarations {
        let (key, value) = translate_macro(declaration.as_ref())?;
        macros.insert(key, value);
    }
    Ok(macros)
}
