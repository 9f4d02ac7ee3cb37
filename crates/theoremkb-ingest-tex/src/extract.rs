//! Statement extraction from theorem-like LaTeX environments.
//!
//! Recognised environments come from [`ExtractionConfig`] plus any
//! `\newtheorem{env}{Title}` whose title names a statement kind. A `proof`
//! environment that directly follows a provable statement becomes its proof.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use theoremkb_model::{Proof, Statement, StatementKind, Statements};

use crate::labels::label_regex;
use crate::scan::{read_optional, theorem_environments};
use crate::{ExtractionConfig, StatementExtractor};

fn begin_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\begin\{([A-Za-z*]+)\}").expect("begin pattern is a valid regex"))
}

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$?\\(ref|cref|Cref)\{([^{}]+)\}\$?").expect("marker pattern is a valid regex")
    })
}

fn paragraph_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t]*\n").expect("paragraph pattern is a valid regex"))
}

// ============================================================================
// Environment matching
// ============================================================================

/// One `\begin{env}...\end{env}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Environment<'a> {
    /// the whole environment, delimiters included
    source: &'a str,
    /// optional `[...]` right after `\begin{env}`
    title: Option<&'a str>,
    /// text between the optional title and `\end{env}`
    body: &'a str,
    end: usize,
}

/// Match the environment whose `\begin` starts at `start`, counting nested
/// environments of the same name.
fn match_environment<'a>(
    tex: &'a str,
    start: usize,
    name: &str,
    body_start: usize,
) -> Option<Environment<'a>> {
    let begin = format!("\\begin{{{name}}}");
    let end = format!("\\end{{{name}}}");

    let (title, content_start) = match read_optional(tex, body_start) {
        Some((title, after)) => (Some(title.trim()), after),
        None => (None, body_start),
    };

    let mut depth = 0usize;
    let mut pos = body_start;
    loop {
        let next_end = tex[pos..].find(&end)? + pos;
        match tex[pos..next_end].find(&begin) {
            Some(offset) => {
                depth += 1;
                pos += offset + begin.len();
            }
            None if depth > 0 => {
                depth -= 1;
                pos = next_end + end.len();
            }
            None => {
                let stop = next_end + end.len();
                return Some(Environment {
                    source: &tex[start..stop],
                    title: title.filter(|t| !t.is_empty()),
                    body: &tex[content_start..next_end],
                    end: stop,
                });
            }
        }
    }
}

// ============================================================================
// HTML
// ============================================================================

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Provisional HTML for a statement body: labels dropped, text escaped,
/// reference markers in math-wrapped form, one `<p>` per paragraph.
pub fn provisional_html(body: &str) -> String {
    let without_labels = label_regex().replace_all(body, "");
    let escaped = escape_html(&without_labels);
    let normalized = marker_regex().replace_all(&escaped, |caps: &Captures| {
        format!("$\\{}{{{}}}$", &caps[1], &caps[2])
    });

    paragraph_regex()
        .split(&normalized)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{p}</p>"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain-text form of an optional environment title: labels dropped,
/// reference markers unwrapped to bare `\ref{L}` form, whitespace collapsed.
fn plain_title(title: &str) -> String {
    let without_labels = label_regex().replace_all(title, "");
    let unwrapped = marker_regex().replace_all(&without_labels, |caps: &Captures| {
        format!("\\{}{{{}}}", &caps[1], &caps[2])
    });
    unwrapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Extractor
// ============================================================================

/// Default [`StatementExtractor`] driven by environment names.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentExtractor {
    config: ExtractionConfig,
}

impl EnvironmentExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Configured aliases plus `\newtheorem` environments titled after a kind.
    fn environment_kinds(&self, tex: &str) -> BTreeMap<String, StatementKind> {
        let mut kinds = BTreeMap::new();
        for env in theorem_environments(tex) {
            match env.title.parse::<StatementKind>() {
                Ok(kind) => {
                    kinds.insert(env.name, kind);
                }
                Err(_) => {
                    tracing::debug!(environment = %env.name, title = %env.title, "theorem environment is not a statement kind");
                }
            }
        }
        kinds.extend(
            self.config
                .environment_aliases
                .iter()
                .map(|(name, kind)| (name.clone(), *kind)),
        );
        kinds
    }

    /// A proof environment directly after `pos`, separated by whitespace only.
    fn following_proof<'a>(&self, tex: &'a str, pos: usize) -> Option<Environment<'a>> {
        let rest = &tex[pos..];
        let start = pos + (rest.len() - rest.trim_start().len());
        let caps = begin_regex().captures(&tex[start..])?;
        let whole = caps.get(0)?;
        let name = caps.get(1)?.as_str();
        if whole.start() != 0 || name != self.config.proof_environment {
            return None;
        }
        match_environment(tex, start, name, start + whole.end())
    }
}

impl StatementExtractor for EnvironmentExtractor {
    fn extract(&self, tex: &str, paper_id: &str) -> Statements {
        let kinds = self.environment_kinds(tex);
        let mut statements = Statements::new();
        let mut counters: BTreeMap<StatementKind, usize> = BTreeMap::new();
        let mut last_corable: Option<String> = None;
        let mut pos = 0usize;

        while let Some(caps) = begin_regex().captures_at(tex, pos) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let Some(kind) = kinds.get(name.as_str()).copied() else {
                pos = whole.end();
                continue;
            };
            let Some(env) = match_environment(tex, whole.start(), name.as_str(), whole.end()) else {
                tracing::warn!(environment = name.as_str(), offset = whole.start(), "unterminated environment");
                pos = whole.end();
                continue;
            };

            let n = {
                let counter = counters.entry(kind).or_insert(0);
                *counter += 1;
                *counter
            };
            let statement_id = format!("{paper_id}-{kind}-{n}");
            let html_url = format!("{paper_id}/{kind}-{n}.html");
            let library_name = match env.title.map(plain_title).filter(|t| !t.is_empty()) {
                Some(title) => format!("{} {n} ({title})", kind.title()),
                None => format!("{} {n}", kind.title()),
            };

            let mut statement = Statement::new(statement_id.clone(), kind, env.source)
                .with_html(provisional_html(env.body))
                .with_html_url(html_url.clone())
                .with_library_name(library_name.clone());
            pos = env.end;

            if self.config.attach_proofs && kind.is_provable() {
                if let Some(proof_env) = self.following_proof(tex, pos) {
                    let mut proof = Proof::new(format!("{statement_id}-proof"), proof_env.source)
                        .with_html(provisional_html(proof_env.body));
                    proof.html_url = Some(html_url);
                    proof.library_name = Some(format!("Proof of {library_name}"));
                    pos = proof_env.end;
                    let attached = statement.set_proof(proof);
                    debug_assert!(attached.is_ok(), "provable kind rejected a proof");
                }
            }

            if kind == StatementKind::Corollary && self.config.link_corollaries {
                if let Some(parent_id) = &last_corable {
                    let linked = statement.set_parent(parent_id.clone());
                    debug_assert!(linked.is_ok(), "corollary rejected a parent");
                    if let Some(parent) = statements.get_mut(parent_id) {
                        let recorded = parent.add_corollary(statement_id.clone());
                        debug_assert!(recorded.is_ok(), "corable kind rejected a corollary");
                    }
                }
            }
            if kind.is_corable() {
                last_corable = Some(statement_id);
            }

            statements.add(statement);
        }

        tracing::debug!(paper_id, statements = statements.len(), "extracted statements");
        statements
    }
}
