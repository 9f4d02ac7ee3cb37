//! LaTeX paper ingestion for theoremkb
//!
//! Turns the source of a paper into a cross-linked set of statements:
//!
//! - preprocessing (comment stripping): [`TexPreprocessor`]
//! - statement extraction from theorem-like environments: [`StatementExtractor`]
//! - macro / environment scanning: [`MacroScanner`]
//! - label indexing (`\label{…}` → statement id): [`LabelIndex`]
//! - reference resolution (`$\ref{…}$`, `$\cref{…}$`, `$\Cref{…}$` → links): [`ReferenceResolver`]
//! - MathJax → KaTeX macro translation: [`translate_macros`]
//!
//! [`Paper`] ties these together in a build phase followed by a resolve phase.

pub mod config;
pub mod extract;
pub mod labels;
pub mod macros;
pub mod paper;
pub mod preprocess;
pub mod resolve;
pub mod scan;

pub use config::*;
pub use extract::*;
pub use labels::*;
pub use macros::*;
pub use paper::*;
pub use preprocess::*;
pub use resolve::*;
pub use scan::*;

use theoremkb_model::Statements;

// ============================================================================
// Pipeline collaborators
// ============================================================================

/// Prepares raw source for macro scanning. Must be safe to run twice.
pub trait TexPreprocessor {
    fn preprocess(&self, tex: &str) -> String;
}

/// Turns raw source into a populated statement collection.
pub trait StatementExtractor {
    fn extract(&self, tex: &str, paper_id: &str) -> Statements;
}

/// Lifts macro and environment declarations out of preprocessed source.
pub trait MacroScanner {
    fn macros(&self, tex: &str) -> Vec<String>;
    fn environments(&self, tex: &str) -> Vec<String>;
}

/// The collaborators a [`Paper`] is built with.
pub struct TexPipeline {
    pub preprocessor: Box<dyn TexPreprocessor>,
    pub extractor: Box<dyn StatementExtractor>,
    pub scanner: Box<dyn MacroScanner>,
}

impl Default for TexPipeline {
    fn default() -> Self {
        Self::with_config(ExtractionConfig::default())
    }
}

impl TexPipeline {
    pub fn with_config(config: ExtractionConfig) -> Self {
        Self {
            preprocessor: Box::new(CommentStripper),
            extractor: Box::new(EnvironmentExtractor::new(config)),
            scanner: Box::new(NewcommandScanner),
        }
    }

    pub fn with_extractor(mut self, extractor: impl StatementExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }
}
