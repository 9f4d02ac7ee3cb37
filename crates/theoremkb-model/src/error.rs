use crate::StatementKind;

/// Errors raised by the statement model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("unknown statement type `{0}`")]
    UnknownStatementType(String),

    #[error("{kind} statement `{statement_id}` cannot carry a proof")]
    NotProvable {
        statement_id: String,
        kind: StatementKind,
    },

    #[error("{kind} statement `{statement_id}` cannot carry corollaries")]
    NotCorable {
        statement_id: String,
        kind: StatementKind,
    },

    #[error("{kind} statement `{statement_id}` is not a corollary and has no parent")]
    NotCorollary {
        statement_id: String,
        kind: StatementKind,
    },

    #[error("{kind} statement `{statement_id}` is stored under `{bucket}`")]
    MisplacedStatement {
        statement_id: String,
        kind: StatementKind,
        bucket: &'static str,
    },

    #[error("statement id `{0}` is used more than once")]
    DuplicateStatementId(String),
}
