//! Macro and theorem-environment declarations lifted out of LaTeX source.
//!
//! Output uses the MathJax declaration format understood by
//! [`crate::translate_macro`]: `name: "template"` or `name: ["template", n]`.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::MacroScanner;

fn command_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\(newcommand|renewcommand|providecommand|DeclareMathOperator)(\*?)")
            .expect("command pattern is a valid regex")
    })
}

fn newtheorem_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\newtheorem\*?\s*\{([^{}]+)\}\s*(?:\[[^\]]*\]\s*)?\{([^{}]+)\}")
            .expect("newtheorem pattern is a valid regex")
    })
}

// ============================================================================
// Brace helpers
// ============================================================================

fn skip_whitespace(s: &str, mut pos: usize) -> usize {
    while let Some(c) = s[pos..].chars().next() {
        if !c.is_whitespace() {
            break;
        }
        pos += c.len_utf8();
    }
    pos
}

/// Read a `{...}` group starting at `pos` (after optional whitespace).
/// Returns the inner text and the position just past the closing brace.
pub(crate) fn read_group(s: &str, pos: usize) -> Option<(&str, usize)> {
    read_delimited(s, pos, '{', '}')
}

/// Read an optional `[...]` argument starting at `pos`.
pub(crate) fn read_optional(s: &str, pos: usize) -> Option<(&str, usize)> {
    read_delimited(s, pos, '[', ']')
}

fn read_delimited(s: &str, pos: usize, open: char, close: char) -> Option<(&str, usize)> {
    let start = skip_whitespace(s, pos);
    if !s[start..].starts_with(open) {
        return None;
    }
    let body_start = start + open.len_utf8();
    let mut depth = 0usize;
    let mut escaped = false;

    for (offset, c) in s[body_start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            c if c == open => depth += 1,
            c if c == close => {
                if depth == 0 {
                    let end = body_start + offset;
                    return Some((&s[body_start..end], end + close.len_utf8()));
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Macro name given either as `{\name}` or as a bare `\name`.
fn read_macro_name(s: &str, pos: usize) -> Option<(&str, usize)> {
    if let Some((inner, end)) = read_group(s, pos) {
        let name = inner.trim().strip_prefix('\\')?;
        return Some((name, end));
    }
    let start = skip_whitespace(s, pos);
    let rest = s[start..].strip_prefix('\\')?;
    let len = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    if len == 0 {
        return None;
    }
    Some((&rest[..len], start + 1 + len))
}

// ============================================================================
// Scanning
// ============================================================================

/// One `\newtheorem{env}{Title}` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TheoremEnvironment {
    pub name: String,
    pub title: String,
}

pub fn theorem_environments(tex: &str) -> Vec<TheoremEnvironment> {
    newtheorem_regex()
        .captures_iter(tex)
        .map(|caps| TheoremEnvironment {
            name: caps[1].trim().to_string(),
            title: caps[2].trim().to_string(),
        })
        .collect()
}

/// `\newcommand`-family and `\DeclareMathOperator` declarations, in source order.
pub fn macro_declarations(tex: &str) -> Vec<String> {
    let mut declarations = Vec::new();

    for caps in command_regex().captures_iter(tex) {
        let Some(whole) = caps.get(0) else { continue };
        let command = &caps[1];
        let starred = !caps[2].is_empty();

        let Some((name, pos)) = read_macro_name(tex, whole.end()) else {
            tracing::debug!(command, offset = whole.start(), "skipping malformed macro declaration");
            continue;
        };

        if command == "DeclareMathOperator" {
            let Some((body, _)) = read_group(tex, pos) else { continue };
            let operator = if starred { r"\operatorname*" } else { r"\operatorname" };
            let template = format!("{operator}{{{body}}}");
            declarations.push(format!("{name}: {}", Value::String(template)));
            continue;
        }

        let (arg_count, pos) = match read_optional(tex, pos) {
            Some((count, end)) => match count.trim().parse::<u32>() {
                Ok(n) => (Some(n), end),
                Err(_) => continue,
            },
            None => (None, pos),
        };
        // a default value for the first argument; not representable for KaTeX
        let pos = match read_optional(tex, pos) {
            Some((_, end)) if arg_count.is_some() => end,
            _ => pos,
        };
        let Some((body, _)) = read_group(tex, pos) else {
            tracing::debug!(name, "macro declaration without a body");
            continue;
        };

        let literal = Value::String(body.to_string());
        match arg_count {
            Some(n) => declarations.push(format!("{name}: [{literal}, {n}]")),
            None => declarations.push(format!("{name}: {literal}")),
        }
    }

    declarations
}

/// `env: "Title"` declarations for every `\newtheorem`.
pub fn environment_declarations(tex: &str) -> Vec<String> {
    theorem_environments(tex)
        .into_iter()
        .map(|env| format!("{}: {}", env.name, Value::String(env.title)))
        .collect()
}

/// Default scanner over preprocessed source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewcommandScanner;

impl MacroScanner for NewcommandScanner {
    fn macros(&self, tex: &str) -> Vec<String> {
        macro_declarations(tex)
    }

    fn environments(&self, tex: &str) -> Vec<String> {
        environment_declarations(tex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate_macro;

    #[test]
    fn test_read_group_balances_braces() {
        let s = r"  {a{b}c\}d} rest";
        let (inner, end) = read_group(s, 0).unwrap();
        assert_eq!(inner, r"a{b}c\}d");
        assert_eq!(&s[end..], " rest");
        assert!(read_group("{open", 0).is_none());
        assert!(read_group("x{a}", 0).is_none());
    }

    #[test]
    fn test_newcommand_with_arguments() {
        let tex = r"\newcommand{\emph}[1]{\textit{#1}}";
        let decls = macro_declarations(tex);
        assert_eq!(decls, [r#"emph: ["\\textit{#1}", 1]"#]);
        let (key, value) = translate_macro(&decls[0]).unwrap();
        assert_eq!(key, r"\emph");
        assert_eq!(value, r"\textit{#1}");
    }

    #[test]
    fn test_newcommand_forms() {
        let tex = r"
\newcommand\R{\mathbb{R}}
\renewcommand*{\vec}[2][x]{\mathbf{#1}_{#2}}
\providecommand{\set}[1]{\{#1\}}
\DeclareMathOperator{\Tr}{Tr}
\DeclareMathOperator*{\argmax}{arg\,max}
\newcommand{broken}{x}
";
        let decls = macro_declarations(tex);
        assert_eq!(
            decls,
            [
                r#"R: "\\mathbb{R}""#,
                r#"vec: ["\\mathbf{#1}_{#2}", 2]"#,
                r#"set: ["\\{#1\\}", 1]"#,
                r#"Tr: "\\operatorname{Tr}""#,
                r#"argmax: "\\operatorname*{arg\\,max}""#,
            ]
        );
    }

    #[test]
    fn test_theorem_environments() {
        let tex = r"\newtheorem{thm}{Theorem}[section] \newtheorem{lem}[thm]{Lemma} \newtheorem*{rem}{Remark}";
        let envs = theorem_environments(tex);
        assert_eq!(envs.len(), 3);
        assert_eq!(envs[0].name, "thm");
        assert_eq!(envs[0].title, "Theorem");
        assert_eq!(envs[1].name, "lem");
        assert_eq!(envs[1].title, "Lemma");
        assert_eq!(
            environment_declarations(tex),
            [r#"thm: "Theorem""#, r#"lem: "Lemma""#, r#"rem: "Remark""#]
        );
    }
}
