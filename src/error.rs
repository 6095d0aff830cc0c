//! Error types for the compiler stage and the lifecycle runtime.
//!
//! Discovery and synthesis are total and never produce these; they only
//! surface at the edges (prefix validation, descriptor JSON from the node
//! bridge) and from runtime misuse.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilerError {
    /// The hygiene token is not a valid identifier start.
    #[error("invalid hygiene prefix `{0}`: expected [A-Za-z_$][A-Za-z0-9_$]*")]
    InvalidPrefix(String),

    /// A descriptor handed across the node boundary did not deserialize.
    #[error("malformed component descriptor: {0}")]
    Descriptor(String),
}

pub type CompilerResult<T> = Result<T, CompilerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// `use_data_plane` was called with no provider on the current thread.
    #[error("use_data_plane must be called within DataPlane::provide")]
    OutsideProvider,

    #[error("route params could not be keyed: {0}")]
    Serialize(String),
}
