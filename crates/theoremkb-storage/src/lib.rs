//! Knowledge-base storage for theoremkb
//!
//! A [`KnowledgeBase`] is a list of [`Paper`]s persisted as one JSON file:
//!
//! ```text
//! {
//!   "kb_path": "/data/kb.json",
//!   "extraction_dir": "/tmp/paper_extraction",
//!   "papers": [ { "paper_id": "...", "statements": { ... }, ... } ]
//! }
//! ```
//!
//! Loading a path that does not exist (or that we may not read) is not an
//! error: the result is an empty knowledge base carrying a load warning. A
//! file that exists but cannot be decoded, or is not a valid knowledge base,
//! is rejected.

pub mod persistence;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use theoremkb_ingest_tex::{Paper, PaperDraft, PaperError, ResolveStats, TexPipeline};

use persistence::ReadOutcome;

/// Default working directory for paper extraction.
pub const DEFAULT_EXTRACTION_DIR: &str = "/tmp/paper_extraction";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid knowledge base: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize knowledge base: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("knowledge base has no path; pass one explicitly")]
    NoPath,

    #[error("paper `{0}` is already in the knowledge base")]
    DuplicatePaper(String),

    #[error("invalid paper record: {0}")]
    InvalidPaper(#[source] serde_json::Error),

    #[error(transparent)]
    Paper(#[from] PaperError),
}

pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// Knowledge base
// ============================================================================

fn default_extraction_dir() -> PathBuf {
    PathBuf::from(DEFAULT_EXTRACTION_DIR)
}

/// A collection of ingested papers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub kb_path: Option<PathBuf>,
    #[serde(default = "default_extraction_dir")]
    pub extraction_dir: PathBuf,
    #[serde(default)]
    papers: Vec<Paper>,
    #[serde(skip)]
    load_warning: Option<String>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self {
            kb_path: None,
            extraction_dir: default_extraction_dir(),
            papers: Vec::new(),
            load_warning: None,
        }
    }
}

impl KnowledgeBase {
    /// An empty knowledge base that will be saved to `path`.
    pub fn create(path: Option<PathBuf>, extraction_dir: Option<PathBuf>) -> Self {
        Self {
            kb_path: path,
            extraction_dir: extraction_dir.unwrap_or_else(default_extraction_dir),
            ..Default::default()
        }
    }

    /// Load from `path`. The loaded knowledge base remembers `path` as its
    /// own, whatever `kb_path` the file recorded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut kb = match persistence::read_json::<KnowledgeBase>(path)? {
            ReadOutcome::Loaded(kb) => {
                tracing::info!(path = %path.display(), papers = kb.papers.len(), "loaded knowledge base");
                kb
            }
            ReadOutcome::Unavailable(err) => {
                tracing::warn!(path = %path.display(), error = %err, "knowledge base not loaded; starting empty");
                Self {
                    load_warning: Some(format!("could not read {}: {err}", path.display())),
                    ..Default::default()
                }
            }
        };
        kb.kb_path = Some(path.to_path_buf());
        Ok(kb)
    }

    /// Set when [`KnowledgeBase::load`] fell back to an empty knowledge base.
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    /// Save to `path`, or to `kb_path` when no path is given. Returns the
    /// path written.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path
            .or(self.kb_path.as_deref())
            .ok_or(StorageError::NoPath)?
            .to_path_buf();
        persistence::write_json_atomic(&path, self)?;
        tracing::info!(path = %path.display(), papers = self.papers.len(), "saved knowledge base");
        Ok(path)
    }

    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    pub fn paper(&self, paper_id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.paper_id == paper_id)
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// Add an already-built paper. Paper ids are unique within a knowledge base.
    pub fn add_paper(&mut self, paper: Paper) -> Result<&Paper> {
        if self.paper(&paper.paper_id).is_some() {
            return Err(StorageError::DuplicatePaper(paper.paper_id));
        }
        tracing::debug!(paper_id = %paper.paper_id, "adding paper");
        self.papers.push(paper);
        Ok(&self.papers[self.papers.len() - 1])
    }

    /// Build a paper from a JSON record and add it. Without statements the
    /// record must carry non-empty `original_tex`.
    pub fn merge_paper(&mut self, record: serde_json::Value, pipeline: &TexPipeline) -> Result<&Paper> {
        let draft: PaperDraft = serde_json::from_value(record).map_err(StorageError::InvalidPaper)?;
        if let Some(id) = &draft.paper_id {
            if self.paper(id).is_some() {
                return Err(StorageError::DuplicatePaper(id.clone()));
            }
        }
        let has_source = draft.original_tex.as_deref().is_some_and(|t| !t.trim().is_empty());
        if draft.statements.is_none() && !has_source {
            return Err(PaperError::MissingSource {
                paper_id: draft.paper_id.unwrap_or_default(),
            }
            .into());
        }
        let paper = Paper::build(draft, pipeline)?;
        self.add_paper(paper)
    }

    /// Resolve references in every paper.
    pub fn resolve_all(&mut self, pages_root: Option<&str>) -> ResolveStats {
        let mut total = ResolveStats::default();
        for paper in &mut self.papers {
            total.merge(paper.resolve_references(pages_root));
        }
        total
    }
}
