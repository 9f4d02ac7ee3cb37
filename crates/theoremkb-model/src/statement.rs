//! Statement taxonomy.
//!
//! A statement is a single record tagged with its [`StatementKind`]. The
//! "provable" and "corable" capabilities are optional fields whose use is
//! gated by the kind, so dispatch always goes through the tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

// ============================================================================
// Kinds
// ============================================================================

/// The five statement kinds extracted from a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Definition,
    Axiom,
    Lemma,
    Theorem,
    Corollary,
}

impl StatementKind {
    /// All kinds in collection traversal order.
    pub const ALL: [StatementKind; 5] = [
        StatementKind::Definition,
        StatementKind::Axiom,
        StatementKind::Lemma,
        StatementKind::Theorem,
        StatementKind::Corollary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Definition => "definition",
            StatementKind::Axiom => "axiom",
            StatementKind::Lemma => "lemma",
            StatementKind::Theorem => "theorem",
            StatementKind::Corollary => "corollary",
        }
    }

    /// Name of the collection field holding this kind.
    pub fn plural(self) -> &'static str {
        match self {
            StatementKind::Definition => "definitions",
            StatementKind::Axiom => "axioms",
            StatementKind::Lemma => "lemmas",
            StatementKind::Theorem => "theorems",
            StatementKind::Corollary => "corollaries",
        }
    }

    /// Human-facing title, used as a fallback display name.
    pub fn title(self) -> &'static str {
        match self {
            StatementKind::Definition => "Definition",
            StatementKind::Axiom => "Axiom",
            StatementKind::Lemma => "Lemma",
            StatementKind::Theorem => "Theorem",
            StatementKind::Corollary => "Corollary",
        }
    }

    pub fn is_provable(self) -> bool {
        matches!(
            self,
            StatementKind::Lemma | StatementKind::Theorem | StatementKind::Corollary
        )
    }

    pub fn is_corable(self) -> bool {
        matches!(self, StatementKind::Lemma | StatementKind::Theorem)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "definition" => Ok(StatementKind::Definition),
            "axiom" => Ok(StatementKind::Axiom),
            "lemma" => Ok(StatementKind::Lemma),
            "theorem" => Ok(StatementKind::Theorem),
            "corollary" => Ok(StatementKind::Corollary),
            _ => Err(ModelError::UnknownStatementType(s.to_string())),
        }
    }
}

// ============================================================================
// Proof
// ============================================================================

/// A proof attached to a provable statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub statement_id: String,
    pub statement_original_tex: String,
    #[serde(default)]
    pub statement_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,
}

impl Proof {
    pub fn new(statement_id: impl Into<String>, original_tex: impl Into<String>) -> Self {
        Self {
            statement_id: statement_id.into(),
            statement_original_tex: original_tex.into(),
            statement_html: String::new(),
            html_url: None,
            library_name: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.statement_html = html.into();
        self
    }
}

// ============================================================================
// Statement
// ============================================================================

/// One formal statement of a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub statement_id: String,
    pub statement_type: StatementKind,
    pub statement_original_tex: String,
    #[serde(default)]
    pub statement_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proof: Option<Proof>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    corollary_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
}

impl Statement {
    pub fn new(
        statement_id: impl Into<String>,
        kind: StatementKind,
        original_tex: impl Into<String>,
    ) -> Self {
        Self {
            statement_id: statement_id.into(),
            statement_type: kind,
            statement_original_tex: original_tex.into(),
            statement_html: String::new(),
            html_url: None,
            library_name: None,
            proof: None,
            corollary_ids: Vec::new(),
            parent_id: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.statement_html = html.into();
        self
    }

    pub fn with_html_url(mut self, url: impl Into<String>) -> Self {
        self.html_url = Some(url.into());
        self
    }

    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = Some(name.into());
        self
    }

    pub fn with_proof(mut self, proof: Proof) -> Result<Self, ModelError> {
        self.set_proof(proof)?;
        Ok(self)
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Result<Self, ModelError> {
        self.set_parent(parent_id)?;
        Ok(self)
    }

    pub fn kind(&self) -> StatementKind {
        self.statement_type
    }

    pub fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    pub fn proof_mut(&mut self) -> Option<&mut Proof> {
        self.proof.as_mut()
    }

    pub fn corollary_ids(&self) -> &[String] {
        &self.corollary_ids
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Attach (or replace) the proof. Only provable kinds accept one.
    pub fn set_proof(&mut self, proof: Proof) -> Result<(), ModelError> {
        if !self.statement_type.is_provable() {
            return Err(ModelError::NotProvable {
                statement_id: self.statement_id.clone(),
                kind: self.statement_type,
            });
        }
        self.proof = Some(proof);
        Ok(())
    }

    pub fn add_corollary(&mut self, corollary_id: impl Into<String>) -> Result<(), ModelError> {
        if !self.statement_type.is_corable() {
            return Err(ModelError::NotCorable {
                statement_id: self.statement_id.clone(),
                kind: self.statement_type,
            });
        }
        self.corollary_ids.push(corollary_id.into());
        Ok(())
    }

    pub fn set_parent(&mut self, parent_id: impl Into<String>) -> Result<(), ModelError> {
        if self.statement_type != StatementKind::Corollary {
            return Err(ModelError::NotCorollary {
                statement_id: self.statement_id.clone(),
                kind: self.statement_type,
            });
        }
        self.parent_id = Some(parent_id.into());
        Ok(())
    }

    /// Check that the capability fields are allowed for this kind. Records
    /// built through the setters always pass; deserialized ones may not.
    pub fn check_capabilities(&self) -> Result<(), ModelError> {
        let kind = self.statement_type;
        let violation = if self.proof.is_some() && !kind.is_provable() {
            Some(ModelError::NotProvable {
                statement_id: self.statement_id.clone(),
                kind,
            })
        } else if !self.corollary_ids.is_empty() && !kind.is_corable() {
            Some(ModelError::NotCorable {
                statement_id: self.statement_id.clone(),
                kind,
            })
        } else if self.parent_id.is_some() && kind != StatementKind::Corollary {
            Some(ModelError::NotCorollary {
                statement_id: self.statement_id.clone(),
                kind,
            })
        } else {
            None
        };
        violation.map_or(Ok(()), Err)
    }

    pub fn set_statement_html(&mut self, html: impl Into<String>) {
        self.statement_html = html.into();
    }

    /// Statement source followed by its proof source, if any.
    ///
    /// This is the blob label scanning runs over.
    pub fn tex_with_proof(&self) -> String {
        match &self.proof {
            Some(proof) => {
                let mut tex = String::with_capacity(
                    self.statement_original_tex.len() + proof.statement_original_tex.len(),
                );
                tex.push_str(&self.statement_original_tex);
                tex.push_str(&proof.statement_original_tex);
                tex
            }
            None => self.statement_original_tex.clone(),
        }
    }

    /// Link text for references to this statement.
    pub fn display_name(&self) -> &str {
        self.library_name
            .as_deref()
            .unwrap_or_else(|| self.statement_type.title())
    }
}

// ============================================================================
// Borrowed views
// ============================================================================

/// A statement or a proof, as seen by consumers that only care about ids and HTML.
#[derive(Debug, Clone, Copy)]
pub enum StatementRef<'a> {
    Statement(&'a Statement),
    Proof(&'a Proof),
}

impl<'a> StatementRef<'a> {
    pub fn statement_id(&self) -> &'a str {
        match self {
            StatementRef::Statement(s) => &s.statement_id,
            StatementRef::Proof(p) => &p.statement_id,
        }
    }

    pub fn statement_original_tex(&self) -> &'a str {
        match self {
            StatementRef::Statement(s) => &s.statement_original_tex,
            StatementRef::Proof(p) => &p.statement_original_tex,
        }
    }

    pub fn statement_html(&self) -> &'a str {
        match self {
            StatementRef::Statement(s) => &s.statement_html,
            StatementRef::Proof(p) => &p.statement_html,
        }
    }

    pub fn is_proof(&self) -> bool {
        matches!(self, StatementRef::Proof(_))
    }
}

/// Mutable access to the HTML of a statement or proof.
#[derive(Debug)]
pub enum StatementMut<'a> {
    Statement(&'a mut Statement),
    Proof(&'a mut Proof),
}

impl StatementMut<'_> {
    pub fn statement_id(&self) -> &str {
        match self {
            StatementMut::Statement(s) => &s.statement_id,
            StatementMut::Proof(p) => &p.statement_id,
        }
    }

    pub fn statement_html(&self) -> &str {
        match self {
            StatementMut::Statement(s) => &s.statement_html,
            StatementMut::Proof(p) => &p.statement_html,
        }
    }

    pub fn set_statement_html(&mut self, html: String) {
        match self {
            StatementMut::Statement(s) => s.statement_html = html,
            StatementMut::Proof(p) => p.statement_html = html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in StatementKind::ALL {
            assert_eq!(kind.as_str().parse::<StatementKind>().unwrap(), kind);
        }
        assert_eq!(
            " Theorem ".parse::<StatementKind>().unwrap(),
            StatementKind::Theorem
        );
    }

    #[test]
    fn test_unknown_kind_is_reported() {
        let err = "proposition".parse::<StatementKind>().unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownStatementType("proposition".to_string())
        );
    }

    #[test]
    fn test_capabilities_follow_kind() {
        let def = Statement::new("d1", StatementKind::Definition, "x");
        assert!(matches!(
            def.clone().with_proof(Proof::new("p", "y")),
            Err(ModelError::NotProvable { .. })
        ));

        let mut thm = Statement::new("t1", StatementKind::Theorem, "x")
            .with_proof(Proof::new("t1-proof", "pf"))
            .unwrap();
        assert_eq!(thm.proof().unwrap().statement_id, "t1-proof");
        thm.add_corollary("c1").unwrap();
        assert_eq!(thm.corollary_ids(), ["c1".to_string()]);
        assert!(thm.set_parent("t0").is_err());

        let mut cor = Statement::new("c1", StatementKind::Corollary, "z");
        cor.set_parent("t1").unwrap();
        assert_eq!(cor.parent_id(), Some("t1"));
        assert!(cor.add_corollary("c2").is_err());
        assert!(cor.set_proof(Proof::new("c1-proof", "")).is_ok());
    }

    #[test]
    fn test_tex_with_proof_appends_proof_text() {
        let lemma = Statement::new("l1", StatementKind::Lemma, "A \\label{a}")
            .with_proof(Proof::new("l1-proof", " B \\label{b}"))
            .unwrap();
        assert_eq!(lemma.tex_with_proof(), "A \\label{a} B \\label{b}");
    }

    #[test]
    fn test_display_name_falls_back_to_kind_title() {
        let thm = Statement::new("t1", StatementKind::Theorem, "x");
        assert_eq!(thm.display_name(), "Theorem");
        let thm = thm.with_library_name("Theorem 2.1");
        assert_eq!(thm.display_name(), "Theorem 2.1");
    }

    #[test]
    fn test_statement_serializes_kind_in_lowercase() {
        let lemma = Statement::new("l1", StatementKind::Lemma, "x");
        let json = serde_json::to_value(&lemma).unwrap();
        assert_eq!(json["statement_type"], "lemma");
        assert!(json.get("proof").is_none());
        let back: Statement = serde_json::from_value(json).unwrap();
        assert_eq!(back, lemma);
    }
}
