//! Label index: `\label{name}` → owning statement id.
//!
//! The index is always rebuilt from scratch under two rules:
//!
//! - every label declared in a statement's text or its proof's text maps to
//!   that statement (the first declaration is its primary label);
//! - across statements, the statement visited last in collection order wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use theoremkb_model::{Statement, Statements};

/// Pattern for label declarations. Names never contain braces.
pub const TEX_LABEL_PATTERN: &str = r"\\label\{([^{}]+)\}";

pub(crate) fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TEX_LABEL_PATTERN).expect("label pattern is a valid regex"))
}

/// All label names declared in `tex`, in order of appearance.
pub fn scan_labels(tex: &str) -> impl Iterator<Item = &str> + '_ {
    label_regex()
        .captures_iter(tex)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// First label declared in the statement or its proof.
pub fn primary_label(statement: &Statement) -> Option<String> {
    let tex = statement.tex_with_proof();
    let label = scan_labels(&tex).next().map(str::to_string);
    label
}

/// A label claimed by more than one statement during an index build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCollision {
    pub label: String,
    pub previous: String,
    pub winner: String,
}

/// Label → statement id mapping for one paper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelIndex {
    labels: BTreeMap<String, String>,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index over `statements` in traversal order.
    pub fn build(statements: &Statements) -> Self {
        Self::build_with_collisions(statements).0
    }

    /// Like [`LabelIndex::build`], also reporting labels that a later
    /// statement took over from an earlier one.
    pub fn build_with_collisions(statements: &Statements) -> (Self, Vec<LabelCollision>) {
        let mut index = LabelIndex::new();
        let mut collisions = Vec::new();

        for statement in statements.all_statements() {
            let tex = statement.tex_with_proof();
            for label in scan_labels(&tex) {
                if let Some(previous) = index.insert(label, &statement.statement_id) {
                    if previous != statement.statement_id {
                        tracing::debug!(
                            label,
                            previous = %previous,
                            winner = %statement.statement_id,
                            "label declared by more than one statement"
                        );
                        collisions.push(LabelCollision {
                            label: label.to_string(),
                            previous,
                            winner: statement.statement_id.clone(),
                        });
                    }
                }
            }
        }

        (index, collisions)
    }

    /// Insert unconditionally, returning the previous owner.
    pub fn insert(&mut self, label: &str, statement_id: &str) -> Option<String> {
        self.labels
            .insert(label.to_string(), statement_id.to_string())
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.labels.get(label).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains_key(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(String, String)> for LabelIndex {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use theoremkb_model::{Proof, StatementKind};

    #[test]
    fn test_scan_labels_ignores_malformed() {
        let tex = r"\label{a} \label{} \label{b{c}} \label {d} \label{e:f}";
        let labels: Vec<&str> = scan_labels(tex).collect();
        assert_eq!(labels, ["a", "e:f"]);
    }

    #[test]
    fn test_labels_in_proof_map_to_owner() {
        let mut statements = Statements::new();
        statements.add(
            Statement::new("t1", StatementKind::Theorem, r"Main. \label{thm:main}")
                .with_proof(Proof::new("t1-proof", r"Step \label{eq:step}"))
                .unwrap(),
        );
        let index = LabelIndex::build(&statements);
        assert_eq!(index.get("thm:main"), Some("t1"));
        assert_eq!(index.get("eq:step"), Some("t1"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_later_statement_in_traversal_order_wins() {
        let mut statements = Statements::new();
        // inserted first, but theorems come after lemmas in traversal order
        statements.add(Statement::new("t1", StatementKind::Theorem, r"\label{dup}"));
        statements.add(Statement::new("l1", StatementKind::Lemma, r"\label{dup}"));
        statements.add(Statement::new("d1", StatementKind::Definition, r"\label{dup}"));

        let (index, collisions) = LabelIndex::build_with_collisions(&statements);
        assert_eq!(index.get("dup"), Some("t1"));
        assert_eq!(collisions.len(), 2);
        assert_eq!(collisions[0].previous, "d1");
        assert_eq!(collisions[0].winner, "l1");
        assert_eq!(collisions[1].winner, "t1");
    }

    #[test]
    fn test_repeated_label_in_one_statement_is_not_a_collision() {
        let mut statements = Statements::new();
        statements.add(Statement::new(
            "l1",
            StatementKind::Lemma,
            r"\label{x} and again \label{x}",
        ));
        let (index, collisions) = LabelIndex::build_with_collisions(&statements);
        assert_eq!(index.get("x"), Some("l1"));
        assert!(collisions.is_empty());
    }

    #[test]
    fn test_primary_label_is_first_declaration() {
        let lemma = Statement::new("l1", StatementKind::Lemma, r"\label{lem:a} \label{lem:b}");
        assert_eq!(primary_label(&lemma).as_deref(), Some("lem:a"));
        let bare = Statement::new("l2", StatementKind::Lemma, "no labels");
        assert_eq!(primary_label(&bare), None);
    }
}
