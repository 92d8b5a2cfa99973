//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent structural violations of a parse tree
/// or an explicit policy rejection during pruning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed tree: {0}")]
    MalformedTree(String),

    #[error("no noun ancestor for modifier '{label}' (token {source_index})")]
    NoTargetAncestor { label: String, source_index: usize },

    #[error("pruning removed every node of the tree")]
    EmptyResult,

    #[error("no root token (head 0) in question")]
    MissingRoot,

    #[error("multiple root tokens: {first} and {second}")]
    MultipleRoots { first: usize, second: usize },

    #[error("token {index} points to unknown head {head}")]
    DanglingHead { index: usize, head: usize },

    #[error("cycle detected in dependency heads at token {0}")]
    CycleDetected(usize),

    #[error("duplicate token index: {0}")]
    DuplicateIndex(usize),

    #[error("invalid token line {line}: {message}")]
    InvalidToken { line: usize, message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
