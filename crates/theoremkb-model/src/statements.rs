//! Per-paper statement collection.
//!
//! Statements are partitioned by kind, each partition keeping insertion
//! order. Traversal order is fixed: definitions, axioms, lemmas, theorems,
//! corollaries. Label indexing relies on that order for its
//! "last statement wins" rule, so it must not change.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{ModelError, Proof, Statement, StatementKind, StatementMut, StatementRef};

/// All statements of one paper, grouped by kind.
///
/// Deserialization re-checks what [`Statements::add`] guarantees: every
/// statement sits in the sequence of its own kind, carries only the
/// capability fields its kind allows, and has an id unique within the
/// collection (proof ids included).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StatementsRepr", into = "StatementsRepr")]
pub struct Statements {
    definitions: Vec<Statement>,
    axioms: Vec<Statement>,
    lemmas: Vec<Statement>,
    theorems: Vec<Statement>,
    corollaries: Vec<Statement>,
}

/// Wire form of [`Statements`]: one field per kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StatementsRepr {
    #[serde(default)]
    definitions: Vec<Statement>,
    #[serde(default)]
    axioms: Vec<Statement>,
    #[serde(default)]
    lemmas: Vec<Statement>,
    #[serde(default)]
    theorems: Vec<Statement>,
    #[serde(default)]
    corollaries: Vec<Statement>,
}

impl From<Statements> for StatementsRepr {
    fn from(statements: Statements) -> Self {
        Self {
            definitions: statements.definitions,
            axioms: statements.axioms,
            lemmas: statements.lemmas,
            theorems: statements.theorems,
            corollaries: statements.corollaries,
        }
    }
}

impl TryFrom<StatementsRepr> for Statements {
    type Error = ModelError;

    fn try_from(repr: StatementsRepr) -> Result<Self, Self::Error> {
        let buckets = [
            (StatementKind::Definition, repr.definitions),
            (StatementKind::Axiom, repr.axioms),
            (StatementKind::Lemma, repr.lemmas),
            (StatementKind::Theorem, repr.theorems),
            (StatementKind::Corollary, repr.corollaries),
        ];

        let mut statements = Statements::new();
        let mut ids = HashSet::new();
        for (bucket, members) in buckets {
            for statement in members {
                let kind = statement.kind();
                if kind != bucket {
                    return Err(ModelError::MisplacedStatement {
                        statement_id: statement.statement_id,
                        kind,
                        bucket: bucket.plural(),
                    });
                }
                statement.check_capabilities()?;

                let proof_id = statement.proof().map(|p| p.statement_id.clone());
                for id in std::iter::once(statement.statement_id.clone()).chain(proof_id) {
                    if !ids.insert(id.clone()) {
                        return Err(ModelError::DuplicateStatementId(id));
                    }
                }
                statements.add(statement);
            }
        }
        Ok(statements)
    }
}

/// A statement as handed over by an extractor, with its kind still a raw tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub statement_id: String,
    pub statement_type: String,
    pub statement_original_tex: String,
    #[serde(default)]
    pub statement_html: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub library_name: Option<String>,
}

impl StatementRecord {
    pub fn into_statement(self) -> Result<Statement, ModelError> {
        let kind: StatementKind = self.statement_type.parse()?;
        let mut statement = Statement::new(self.statement_id, kind, self.statement_original_tex)
            .with_html(self.statement_html);
        statement.html_url = self.html_url;
        statement.library_name = self.library_name;
        Ok(statement)
    }
}

impl Statements {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, kind: StatementKind) -> &mut Vec<Statement> {
        match kind {
            StatementKind::Definition => &mut self.definitions,
            StatementKind::Axiom => &mut self.axioms,
            StatementKind::Lemma => &mut self.lemmas,
            StatementKind::Theorem => &mut self.theorems,
            StatementKind::Corollary => &mut self.corollaries,
        }
    }

    /// Append a statement to the sequence matching its kind.
    pub fn add(&mut self, statement: Statement) {
        self.bucket_mut(statement.kind()).push(statement);
    }

    /// Append a raw record. An unrecognised type tag is reported and the
    /// collection is left untouched.
    pub fn try_add(&mut self, record: StatementRecord) -> Result<(), ModelError> {
        let statement = record.into_statement()?;
        self.add(statement);
        Ok(())
    }

    /// The typed sequence for one kind.
    pub fn of_kind(&self, kind: StatementKind) -> &[Statement] {
        match kind {
            StatementKind::Definition => &self.definitions,
            StatementKind::Axiom => &self.axioms,
            StatementKind::Lemma => &self.lemmas,
            StatementKind::Theorem => &self.theorems,
            StatementKind::Corollary => &self.corollaries,
        }
    }

    /// Every statement in fixed kind order. Call again to restart.
    pub fn all_statements(&self) -> impl Iterator<Item = &Statement> + Clone + '_ {
        self.definitions
            .iter()
            .chain(self.axioms.iter())
            .chain(self.lemmas.iter())
            .chain(self.theorems.iter())
            .chain(self.corollaries.iter())
    }

    /// Every proof currently attached, in statement traversal order.
    pub fn all_proofs(&self) -> impl Iterator<Item = &Proof> + Clone + '_ {
        self.all_statements().filter_map(Statement::proof)
    }

    /// All statements first, then all proofs. Proofs are not interleaved.
    pub fn all_statements_and_proofs(&self) -> impl Iterator<Item = StatementRef<'_>> + '_ {
        self.all_statements()
            .map(StatementRef::Statement)
            .chain(self.all_proofs().map(StatementRef::Proof))
    }

    pub fn all_statements_mut(&mut self) -> impl Iterator<Item = &mut Statement> + '_ {
        self.definitions
            .iter_mut()
            .chain(self.axioms.iter_mut())
            .chain(self.lemmas.iter_mut())
            .chain(self.theorems.iter_mut())
            .chain(self.corollaries.iter_mut())
    }

    /// Visit every statement and then every proof mutably, in the same order
    /// as [`Statements::all_statements_and_proofs`].
    pub fn for_each_html_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(StatementMut<'_>),
    {
        for statement in self.all_statements_mut() {
            f(StatementMut::Statement(statement));
        }
        for statement in self.all_statements_mut() {
            if let Some(proof) = statement.proof_mut() {
                f(StatementMut::Proof(proof));
            }
        }
    }

    pub fn get(&self, statement_id: &str) -> Option<&Statement> {
        self.all_statements()
            .find(|s| s.statement_id == statement_id)
    }

    pub fn get_mut(&mut self, statement_id: &str) -> Option<&mut Statement> {
        self.all_statements_mut()
            .find(|s| s.statement_id == statement_id)
    }

    pub fn len(&self) -> usize {
        StatementKind::ALL
            .iter()
            .map(|kind| self.of_kind(*kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Extend<Statement> for Statements {
    fn extend<T: IntoIterator<Item = Statement>>(&mut self, iter: T) {
        for statement in iter {
            self.add(statement);
        }
    }
}

impl FromIterator<Statement> for Statements {
    fn from_iter<T: IntoIterator<Item = Statement>>(iter: T) -> Self {
        let mut statements = Statements::new();
        statements.extend(iter);
        statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Statements {
        let mut statements = Statements::new();
        statements.add(Statement::new("c1", StatementKind::Corollary, "c"));
        statements.add(
            Statement::new("t1", StatementKind::Theorem, "t")
                .with_proof(Proof::new("t1-proof", "pt"))
                .unwrap(),
        );
        statements.add(Statement::new("d1", StatementKind::Definition, "d"));
        statements.add(
            Statement::new("l1", StatementKind::Lemma, "l")
                .with_proof(Proof::new("l1-proof", "pl"))
                .unwrap(),
        );
        statements.add(Statement::new("d2", StatementKind::Definition, "d"));
        statements
    }

    #[test]
    fn test_add_dispatches_by_kind() {
        let statements = sample();
        assert_eq!(statements.of_kind(StatementKind::Definition).len(), 2);
        assert_eq!(statements.of_kind(StatementKind::Axiom).len(), 0);
        assert_eq!(statements.of_kind(StatementKind::Lemma).len(), 1);
        assert_eq!(statements.of_kind(StatementKind::Theorem).len(), 1);
        assert_eq!(statements.of_kind(StatementKind::Corollary).len(), 1);
        assert_eq!(statements.len(), 5);
    }

    #[test]
    fn test_all_statements_uses_fixed_kind_order() {
        let statements = sample();
        let ids: Vec<&str> = statements
            .all_statements()
            .map(|s| s.statement_id.as_str())
            .collect();
        assert_eq!(ids, ["d1", "d2", "l1", "t1", "c1"]);

        // restartable
        assert_eq!(statements.all_statements().count(), 5);
    }

    #[test]
    fn test_proofs_come_after_all_statements() {
        let statements = sample();
        let ids: Vec<&str> = statements
            .all_statements_and_proofs()
            .map(|s| s.statement_id())
            .collect();
        assert_eq!(ids, ["d1", "d2", "l1", "t1", "c1", "l1-proof", "t1-proof"]);
    }

    #[test]
    fn test_try_add_reports_unknown_type() {
        let mut statements = Statements::new();
        let err = statements
            .try_add(StatementRecord {
                statement_id: "x".to_string(),
                statement_type: "conjecture".to_string(),
                statement_original_tex: "x".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, ModelError::UnknownStatementType("conjecture".into()));
        assert!(statements.is_empty());

        statements
            .try_add(StatementRecord {
                statement_id: "a1".to_string(),
                statement_type: "axiom".to_string(),
                statement_original_tex: "x".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(statements.of_kind(StatementKind::Axiom).len(), 1);
    }

    #[test]
    fn test_for_each_html_mut_visits_statements_then_proofs() {
        let mut statements = sample();
        let mut seen = Vec::new();
        statements.for_each_html_mut(|mut s| {
            seen.push(s.statement_id().to_string());
            let html = format!("<p>{}</p>", s.statement_id());
            s.set_statement_html(html);
        });
        assert_eq!(seen, ["d1", "d2", "l1", "t1", "c1", "l1-proof", "t1-proof"]);
        assert_eq!(statements.get("t1").unwrap().statement_html, "<p>t1</p>");
        assert_eq!(
            statements.get("t1").unwrap().proof().unwrap().statement_html,
            "<p>t1-proof</p>"
        );
    }

    #[test]
    fn test_serialized_shape_round_trips() {
        let statements = sample();
        let json = serde_json::to_value(&statements).unwrap();
        assert_eq!(json["definitions"][1]["statement_id"], "d2");
        assert_eq!(json["theorems"][0]["proof"]["statement_id"], "t1-proof");
        let back: Statements = serde_json::from_value(json).unwrap();
        assert_eq!(back, statements);

        let partial: Statements = serde_json::from_str(r#"{ "axioms": [] }"#).unwrap();
        assert!(partial.is_empty());
    }

    fn parse(json: serde_json::Value) -> Result<Statements, serde_json::Error> {
        serde_json::from_value(json)
    }

    #[test]
    fn test_statement_in_wrong_sequence_is_rejected() {
        let err = parse(serde_json::json!({
            "definitions": [
                { "statement_id": "t1", "statement_type": "theorem", "statement_original_tex": "x" }
            ]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("stored under `definitions`"));
    }

    #[test]
    fn test_capability_violations_are_rejected() {
        let err = parse(serde_json::json!({
            "axioms": [{
                "statement_id": "a1",
                "statement_type": "axiom",
                "statement_original_tex": "x",
                "proof": { "statement_id": "a1-proof", "statement_original_tex": "pf" }
            }]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("cannot carry a proof"));

        let err = parse(serde_json::json!({
            "corollaries": [{
                "statement_id": "c1",
                "statement_type": "corollary",
                "statement_original_tex": "x",
                "corollary_ids": ["c2"]
            }]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("cannot carry corollaries"));

        let err = parse(serde_json::json!({
            "lemmas": [{
                "statement_id": "l1",
                "statement_type": "lemma",
                "statement_original_tex": "x",
                "parent_id": "t1"
            }]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("not a corollary"));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let err = parse(serde_json::json!({
            "definitions": [
                { "statement_id": "s1", "statement_type": "definition", "statement_original_tex": "x" }
            ],
            "axioms": [
                { "statement_id": "s1", "statement_type": "axiom", "statement_original_tex": "y" }
            ]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("`s1` is used more than once"));

        // a proof id clashing with a statement id counts too
        let err = parse(serde_json::json!({
            "lemmas": [{
                "statement_id": "l1",
                "statement_type": "lemma",
                "statement_original_tex": "x",
                "proof": { "statement_id": "l2", "statement_original_tex": "pf" }
            }, {
                "statement_id": "l2",
                "statement_type": "lemma",
                "statement_original_tex": "y"
            }]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("`l2` is used more than once"));
    }

    #[test]
    fn test_check_capabilities_accepts_setter_built_statements() {
        for statement in sample().all_statements() {
            assert_eq!(statement.check_capabilities(), Ok(()));
        }
    }
}
