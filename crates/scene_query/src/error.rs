//! Error types for store mutations and spatial queries

use crate::entity::Entity;
use thiserror::Error;

/// Errors raised at the query boundary and by store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Malformed geometry or out-of-range parameter
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unrecognized cast mode name or code
    #[error("invalid cast mode: {0}")]
    InvalidMode(String),

    /// Store operation on an entity that has no volume
    #[error("entity {0} not found in volume store")]
    NotFound(Entity),

    /// A writer panicked while holding the world lock
    #[error("spatial world lock poisoned")]
    Poisoned,
}

/// Result alias for query and store operations
pub type QueryResult<T> = Result<T, QueryError>;
