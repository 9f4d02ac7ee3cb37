//! Extraction configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use theoremkb_model::StatementKind;

/// Controls how [`crate::EnvironmentExtractor`] maps LaTeX environments to statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Environment name → statement kind. Merged with `\newtheorem`
    /// declarations found in the source; entries here take precedence.
    pub environment_aliases: BTreeMap<String, StatementKind>,
    /// Environment holding a proof.
    pub proof_environment: String,
    /// Attach a proof that directly follows a provable statement.
    pub attach_proofs: bool,
    /// Point each corollary at the nearest preceding lemma or theorem.
    pub link_corollaries: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let aliases = [
            ("definition", StatementKind::Definition),
            ("defn", StatementKind::Definition),
            ("dfn", StatementKind::Definition),
            ("axiom", StatementKind::Axiom),
            ("lemma", StatementKind::Lemma),
            ("lem", StatementKind::Lemma),
            ("theorem", StatementKind::Theorem),
            ("thm", StatementKind::Theorem),
            ("corollary", StatementKind::Corollary),
            ("cor", StatementKind::Corollary),
        ];

        Self {
            environment_aliases: aliases
                .into_iter()
                .map(|(name, kind)| (name.to_string(), kind))
                .collect(),
            proof_environment: "proof".to_string(),
            attach_proofs: true,
            link_corollaries: true,
        }
    }
}

impl ExtractionConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn kind_for_environment(&self, environment: &str) -> Option<StatementKind> {
        self.environment_aliases.get(environment).copied()
    }
}
