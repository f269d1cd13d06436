use thiserror::Error;

#[derive(Error, Debug)]
pub enum KVError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Returned from inside a transaction to roll it back.
    #[error("transaction aborted: {0}")]
    Aborted(String),
}
