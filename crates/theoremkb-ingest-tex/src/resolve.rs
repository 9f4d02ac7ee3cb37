//! Reference resolution: rewrite `$\ref{L}$`, `$\cref{L}$` and `$\Cref{L}$`
//! markers in rendered statement HTML into hyperlinks.
//!
//! Two passes run per statement/proof:
//!
//! 1. `$\ref{L}$` becomes a link when `L` names another statement; otherwise
//!    the marker is left as is.
//! 2. `$\cref{L}$` / `$\Cref{L}$` become links the same way; when `L` is
//!    unknown the marker is downgraded to a bare `\ref{L}`.
//!
//! A self-reference is never linked. Once a marker is rewritten its wrapped
//! form is gone, so running the resolver again changes nothing.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;
use theoremkb_model::Statements;

use crate::LabelIndex;

pub const TEX_REF_PATTERN: &str = r"\$\\ref\{([^{}]+)\}\$";
pub const TEX_CREF_PATTERN: &str = r"\$\\[cC]ref\{([^{}]+)\}\$";

fn ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TEX_REF_PATTERN).expect("ref pattern is a valid regex"))
}

fn cref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TEX_CREF_PATTERN).expect("cref pattern is a valid regex"))
}

// ============================================================================
// Link targets
// ============================================================================

/// What a link to a statement points at and shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub html_url: Option<String>,
    pub display_name: String,
}

/// Owned snapshot of link targets keyed by statement id.
///
/// Taken before the rewrite so statement HTML can be mutated while the
/// targets are being read.
#[derive(Debug, Clone, Default)]
pub struct LinkTargets {
    targets: HashMap<String, LinkTarget>,
}

impl LinkTargets {
    pub fn from_statements(statements: &Statements) -> Self {
        let targets = statements
            .all_statements()
            .map(|s| {
                (
                    s.statement_id.clone(),
                    LinkTarget {
                        html_url: s.html_url.clone(),
                        display_name: s.display_name().to_string(),
                    },
                )
            })
            .collect();
        Self { targets }
    }

    pub fn get(&self, statement_id: &str) -> Option<&LinkTarget> {
        self.targets.get(statement_id)
    }

    pub fn insert(&mut self, statement_id: impl Into<String>, target: LinkTarget) {
        self.targets.insert(statement_id.into(), target);
    }
}

// ============================================================================
// Link formatting
// ============================================================================

/// Prefix `path` with the pages root.
///
/// Empty paths stay empty; absolute paths ignore the root.
pub fn join_pages_root(root: Option<&str>, path: &str) -> String {
    match root {
        _ if path.is_empty() => String::new(),
        Some(root) if !root.is_empty() && !path.starts_with('/') => {
            if root.ends_with('/') {
                format!("{root}{path}")
            } else {
                format!("{root}/{path}")
            }
        }
        _ => path.to_string(),
    }
}

/// Form-urlencode a label for use as a URL fragment (space becomes `+`).
pub fn encode_label(label: &str) -> String {
    url::form_urlencoded::byte_serialize(label.as_bytes()).collect()
}

/// Escape text for use inside link markup. `$` is written as an entity so
/// a display name can never carry a live reference marker into the output.
pub fn escape_link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '$' => out.push_str("&#36;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<a href="{url}">{text}</a>`, with both parts escaped.
pub fn interlink(url: &str, text: &str) -> String {
    format!(
        r#"<a href="{}">{}</a>"#,
        escape_link_text(url),
        escape_link_text(text)
    )
}

// ============================================================================
// Resolver
// ============================================================================

/// Counters for one resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// markers rewritten into hyperlinks
    pub linked: usize,
    /// `\cref`/`\Cref` markers downgraded to `\ref`
    pub downgraded: usize,
    /// markers kept as they were (unknown `\ref`, self-references)
    pub untouched: usize,
}

impl ResolveStats {
    pub fn merge(&mut self, other: ResolveStats) {
        self.linked += other.linked;
        self.downgraded += other.downgraded;
        self.untouched += other.untouched;
    }
}

enum Lookup<'t> {
    Link(&'t LinkTarget),
    SelfReference,
    Missing,
}

/// Resolves reference markers against one paper's label index.
pub struct ReferenceResolver<'a> {
    index: &'a LabelIndex,
    targets: &'a LinkTargets,
    pages_root: Option<&'a str>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(index: &'a LabelIndex, targets: &'a LinkTargets, pages_root: Option<&'a str>) -> Self {
        Self {
            index,
            targets,
            pages_root,
        }
    }

    fn lookup(&self, label: &str, current_id: &str) -> Lookup<'a> {
        let Some(statement_id) = self.index.get(label) else {
            return Lookup::Missing;
        };
        if statement_id == current_id {
            return Lookup::SelfReference;
        }
        match self.targets.get(statement_id) {
            Some(target) => Lookup::Link(target),
            None => {
                tracing::debug!(label, statement_id, "label index points at an unknown statement");
                Lookup::Missing
            }
        }
    }

    fn link(&self, target: &LinkTarget, label: &str) -> String {
        let url = join_pages_root(self.pages_root, target.html_url.as_deref().unwrap_or(""));
        interlink(
            &format!("{url}#{}", encode_label(label)),
            &target.display_name,
        )
    }

    /// Run both passes over `html` for the statement or proof `current_id`.
    pub fn resolve(&self, html: &str, current_id: &str) -> (String, ResolveStats) {
        let mut stats = ResolveStats::default();

        let html = ref_regex().replace_all(html, |caps: &Captures| {
            let label = &caps[1];
            match self.lookup(label, current_id) {
                Lookup::Link(target) => {
                    stats.linked += 1;
                    self.link(target, label)
                }
                Lookup::SelfReference | Lookup::Missing => {
                    stats.untouched += 1;
                    caps[0].to_string()
                }
            }
        });

        let html = cref_regex().replace_all(&html, |caps: &Captures| {
            let label = &caps[1];
            match self.lookup(label, current_id) {
                Lookup::Link(target) => {
                    stats.linked += 1;
                    self.link(target, label)
                }
                Lookup::SelfReference => {
                    stats.untouched += 1;
                    caps[0].to_string()
                }
                Lookup::Missing => {
                    tracing::debug!(label, current_id, "unresolved cross-reference");
                    stats.downgraded += 1;
                    format!(r"\ref{{{label}}}")
                }
            }
        });

        (html.into_owned(), stats)
    }

    /// Rewrite the HTML of every statement and then every proof in place.
    pub fn resolve_statements(&self, statements: &mut Statements) -> ResolveStats {
        let mut total = ResolveStats::default();
        statements.for_each_html_mut(|mut unit| {
            let (html, stats) = self.resolve(unit.statement_html(), unit.statement_id());
            unit.set_statement_html(html);
            total.merge(stats);
        });
        total
    }
}
