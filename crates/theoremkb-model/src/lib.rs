//! theoremkb statement model
//!
//! Typed representation of the formal content of a paper:
//!
//! - [`StatementKind`]: the closed taxonomy (definition, axiom, lemma, theorem, corollary)
//! - [`Statement`]: one extracted statement with its capability fields
//!   (proof, corollary ids, parent id) gated by the kind tag
//! - [`Proof`]: statement-shaped record owned by a provable statement
//! - [`Statements`]: the per-paper collection, partitioned by kind
//!
//! Nothing here touches LaTeX syntax; label scanning and reference resolution
//! live in `theoremkb-ingest-tex`.

pub mod error;
pub mod statement;
pub mod statements;

pub use error::ModelError;
pub use statement::*;
pub use statements::*;
