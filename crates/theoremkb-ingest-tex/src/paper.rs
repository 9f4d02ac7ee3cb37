//! The paper aggregate.
//!
//! A [`Paper`] goes through two explicit phases:
//!
//! 1. **build**: [`Paper::build`] fills the preprocessed source and the
//!    statement collection once, using a [`TexPipeline`];
//! 2. **resolve**: [`Paper::resolve_references`] builds the label index if
//!    needed and rewrites reference markers in every statement and proof.
//!
//! The phase is observable through [`Paper::resolution`]. Any mutable access
//! to the statements drops the cached label index and returns the paper to
//! the unresolved phase.

use serde::{Deserialize, Serialize};
use theoremkb_model::{Statement, StatementKind, Statements};
use uuid::Uuid;

use crate::{
    translate_macros, KatexMacros, LabelIndex, LinkTargets, MacroError, ReferenceResolver,
    ResolveStats, TexPipeline,
};

#[derive(Debug, thiserror::Error)]
pub enum PaperError {
    #[error("paper `{paper_id}` has no LaTeX source to extract statements from")]
    MissingSource { paper_id: String },

    #[error(transparent)]
    Macro(#[from] MacroError),
}

/// Where a paper is in the build → resolve pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    Unresolved,
    Resolved {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pages_root: Option<String>,
    },
}

/// Paper fields as supplied by a caller; anything missing is derived during
/// [`Paper::build`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperDraft {
    pub paper_id: Option<String>,
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub year: Option<i32>,
    pub source_url: Option<String>,
    pub html_url: Option<String>,
    pub bibtex: Option<String>,
    pub original_tex: Option<String>,
    pub processed_original_tex: Option<String>,
    pub statements: Option<Statements>,
    pub mathjax_macros: Option<Vec<String>>,
    pub mathjax_environments: Option<Vec<String>>,
    pub label2statementid: Option<LabelIndex>,
}

impl PaperDraft {
    pub fn from_tex(tex: impl Into<String>) -> Self {
        Self {
            original_tex: Some(tex.into()),
            ..Default::default()
        }
    }
}

/// One ingested paper and its formal statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub paper_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<Vec<String>>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub bibtex: Option<String>,
    #[serde(default)]
    original_tex: String,
    #[serde(default)]
    processed_original_tex: String,
    #[serde(default)]
    statements: Statements,
    #[serde(default)]
    mathjax_macros: Option<Vec<String>>,
    #[serde(default)]
    mathjax_environments: Option<Vec<String>>,
    #[serde(default)]
    label2statementid: Option<LabelIndex>,
    #[serde(default)]
    resolution: Resolution,
}

impl Paper {
    /// Build phase. Preprocessed text and statements are derived only when
    /// the draft does not already carry them.
    pub fn build(mut draft: PaperDraft, pipeline: &TexPipeline) -> Result<Self, PaperError> {
        let original_tex = match draft.original_tex.take() {
            Some(tex) => tex,
            None if draft.processed_original_tex.is_some() && draft.statements.is_some() => {
                String::new()
            }
            None => {
                return Err(PaperError::MissingSource {
                    paper_id: draft.paper_id.unwrap_or_default(),
                })
            }
        };
        Ok(Self::assemble(draft, original_tex, pipeline))
    }

    /// Build a paper with a generated id from raw source.
    pub fn from_tex(tex: impl Into<String>, pipeline: &TexPipeline) -> Self {
        Self::assemble(PaperDraft::default(), tex.into(), pipeline)
    }

    fn assemble(draft: PaperDraft, original_tex: String, pipeline: &TexPipeline) -> Self {
        let paper_id = draft
            .paper_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let processed_original_tex = draft
            .processed_original_tex
            .unwrap_or_else(|| pipeline.preprocessor.preprocess(&original_tex));
        let statements = draft
            .statements
            .unwrap_or_else(|| pipeline.extractor.extract(&original_tex, &paper_id));

        tracing::info!(
            paper_id = %paper_id,
            statements = statements.len(),
            "built paper"
        );

        Self {
            paper_id,
            title: draft.title,
            authors: draft.authors,
            year: draft.year,
            source_url: draft.source_url,
            html_url: draft.html_url,
            bibtex: draft.bibtex,
            original_tex,
            processed_original_tex,
            statements,
            mathjax_macros: draft.mathjax_macros,
            mathjax_environments: draft.mathjax_environments,
            label2statementid: draft.label2statementid,
            resolution: Resolution::Unresolved,
        }
    }

    pub fn original_tex(&self) -> &str {
        &self.original_tex
    }

    pub fn processed_original_tex(&self) -> &str {
        &self.processed_original_tex
    }

    pub fn statements(&self) -> &Statements {
        &self.statements
    }

    /// Mutable statements. Drops the cached label index and resets the
    /// paper to [`Resolution::Unresolved`].
    pub fn statements_mut(&mut self) -> &mut Statements {
        self.label2statementid = None;
        self.resolution = Resolution::Unresolved;
        &mut self.statements
    }

    pub fn statement_by_id(&self, statement_id: &str) -> Option<&Statement> {
        self.statements.get(statement_id)
    }

    pub fn statements_of_kind(&self, kind: StatementKind) -> &[Statement] {
        self.statements.of_kind(kind)
    }

    // ------------------------------------------------------------------
    // Label index
    // ------------------------------------------------------------------

    /// Rebuild the label index when `overwrite` is set or none exists yet.
    pub fn extend_label_index(&mut self, overwrite: bool) -> &LabelIndex {
        if overwrite {
            self.label2statementid = None;
        }
        self.label2statementid
            .get_or_insert_with(|| LabelIndex::build(&self.statements))
    }

    /// The label index, built on first use.
    pub fn label_index(&mut self) -> &LabelIndex {
        self.extend_label_index(false)
    }

    pub fn cached_label_index(&self) -> Option<&LabelIndex> {
        self.label2statementid.as_ref()
    }

    // ------------------------------------------------------------------
    // Reference resolution
    // ------------------------------------------------------------------

    /// Resolve phase: rewrite reference markers in every statement, then in
    /// every proof. The label index is built first if it is missing.
    pub fn resolve_references(&mut self, pages_root: Option<&str>) -> ResolveStats {
        let index = self
            .label2statementid
            .get_or_insert_with(|| LabelIndex::build(&self.statements));
        let targets = LinkTargets::from_statements(&self.statements);
        let resolver = ReferenceResolver::new(index, &targets, pages_root);
        let stats = resolver.resolve_statements(&mut self.statements);

        self.resolution = Resolution::Resolved {
            pages_root: pages_root.map(str::to_string),
        };
        tracing::info!(
            paper_id = %self.paper_id,
            linked = stats.linked,
            downgraded = stats.downgraded,
            untouched = stats.untouched,
            "resolved references"
        );
        stats
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved { .. })
    }

    // ------------------------------------------------------------------
    // Macros and environments
    // ------------------------------------------------------------------

    pub fn extend_mathjax_macros(&mut self, pipeline: &TexPipeline, overwrite: bool) -> &[String] {
        if overwrite || self.mathjax_macros.is_none() {
            self.mathjax_macros = Some(pipeline.scanner.macros(&self.processed_original_tex));
        }
        self.mathjax_macros.as_deref().unwrap_or_default()
    }

    pub fn extend_mathjax_environments(
        &mut self,
        pipeline: &TexPipeline,
        overwrite: bool,
    ) -> &[String] {
        if overwrite || self.mathjax_environments.is_none() {
            self.mathjax_environments =
                Some(pipeline.scanner.environments(&self.processed_original_tex));
        }
        self.mathjax_environments.as_deref().unwrap_or_default()
    }

    pub fn mathjax_macros(&self) -> Option<&[String]> {
        self.mathjax_macros.as_deref()
    }

    pub fn mathjax_environments(&self) -> Option<&[String]> {
        self.mathjax_environments.as_deref()
    }

    /// KaTeX macro table for this paper; scans macros first if needed.
    pub fn katex_macros(&mut self, pipeline: &TexPipeline) -> Result<KatexMacros, PaperError> {
        let declarations = self.extend_mathjax_macros(pipeline, false);
        Ok(translate_macros(declarations)?)
    }
}
