use std::fmt;

use stockroom_kv::KVError;
use thiserror::Error;

use crate::product::Code;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Callers match on these,
// never on the human-readable message string.

pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const ALLOCATION_COLLISION: &str = "ALLOCATION_COLLISION";
    pub const MALFORMED_RECORD: &str = "MALFORMED_RECORD";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";
    pub const REMOTE_ERROR: &str = "REMOTE_ERROR";
}

/// The operation that was being attempted when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    GetAll,
    GetOne,
    Update,
    Delete,
    PutCategory,
    GetCategory,
    ListCategories,
    DeleteCategory,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::GetAll => "get_all",
            Operation::GetOne => "get_one",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::PutCategory => "put_category",
            Operation::GetCategory => "get_category",
            Operation::ListCategories => "list_categories",
            Operation::DeleteCategory => "delete_category",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which input of a diff a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => f.write_str("local"),
            Side::Remote => f.write_str("remote"),
        }
    }
}

/// Errors raised by the offline catalog.
///
/// Variants carry the product code and operation involved so callers can
/// log or present them; see [`CatalogError::error_code`] for the stable code.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// `update` targeted a code that is not in the local store.
    #[error("{op}: product {code} not found")]
    NotFound { op: Operation, code: Code },

    /// `add` was given a code that is already stored.
    #[error("product {code} already exists")]
    AlreadyExists { code: Code },

    /// The allocator produced a code that is already in use.
    #[error("allocated code {code} collides with an existing product")]
    AllocationInvariantViolation { code: Code },

    /// A record handed to `diff` has no code.
    #[error("{side} record at index {index} has no code")]
    MalformedRecord { side: Side, index: usize },

    #[error("{0}")]
    Validation(String),

    /// The local store failed. Propagated as-is, never retried here.
    #[error("{op}: {source}")]
    Storage {
        op: Operation,
        #[source]
        source: KVError,
    },

    #[error("{op}: {message}")]
    Serialization { op: Operation, message: String },

    #[error("remote catalog: {0}")]
    Remote(String),
}

impl CatalogError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::NotFound { .. } => error_code::NOT_FOUND,
            CatalogError::AlreadyExists { .. } => error_code::ALREADY_EXISTS,
            CatalogError::AllocationInvariantViolation { .. } => error_code::ALLOCATION_COLLISION,
            CatalogError::MalformedRecord { .. } => error_code::MALFORMED_RECORD,
            CatalogError::Validation(_) => error_code::VALIDATION_FAILED,
            CatalogError::Storage { .. } => error_code::STORAGE_ERROR,
            CatalogError::Serialization { .. } => error_code::SERIALIZATION_ERROR,
            CatalogError::Remote(_) => error_code::REMOTE_ERROR,
        }
    }

    /// The product code involved, when there is one.
    pub fn code(&self) -> Option<Code> {
        match self {
            CatalogError::NotFound { code, .. }
            | CatalogError::AlreadyExists { code }
            | CatalogError::AllocationInvariantViolation { code } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn storage(op: Operation) -> impl FnOnce(KVError) -> CatalogError {
        move |source| CatalogError::Storage { op, source }
    }

    pub(crate) fn serialization(op: Operation) -> impl FnOnce(serde_json::Error) -> CatalogError {
        move |e| CatalogError::Serialization {
            op,
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_mapping() {
        let not_found = CatalogError::NotFound { op: Operation::Update, code: Code(5) };
        assert_eq!(not_found.error_code(), "NOT_FOUND");
        assert_eq!(not_found.code(), Some(Code(5)));

        assert_eq!(
            CatalogError::AlreadyExists { code: Code(1) }.error_code(),
            "ALREADY_EXISTS"
        );
        assert_eq!(
            CatalogError::AllocationInvariantViolation { code: Code(1) }.error_code(),
            "ALLOCATION_COLLISION"
        );
        assert_eq!(
            CatalogError::MalformedRecord { side: Side::Remote, index: 0 }.error_code(),
            "MALFORMED_RECORD"
        );
        assert_eq!(
            CatalogError::Storage { op: Operation::Add, source: KVError::Storage("io".into()) }
                .error_code(),
            "STORAGE_ERROR"
        );
        assert_eq!(CatalogError::Remote("down".into()).error_code(), "REMOTE_ERROR");
    }

    #[test]
    fn messages_name_operation_and_code() {
        let err = CatalogError::NotFound { op: Operation::Update, code: Code(9001) };
        assert_eq!(err.to_string(), "update: product 9001 not found");

        let err = CatalogError::MalformedRecord { side: Side::Local, index: 3 };
        assert_eq!(err.to_string(), "local record at index 3 has no code");

        let err = CatalogError::Storage { op: Operation::Delete, source: KVError::Storage("disk full".into()) };
        assert_eq!(err.to_string(), "delete: storage error: disk full");
    }
}
