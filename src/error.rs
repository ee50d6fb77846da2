use crate::types::{CartId, Version};

#[derive(thiserror::Error, Debug)]
pub enum CartError {
    #[error("Operation {operation} is not permitted for this caller")]
    AuthorizationDenied { operation: &'static str },
    #[error("Your state version ({requested}) is behind the current version ({current}).")]
    VersionConflict { requested: Version, current: Version },
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("State document is inconsistent: {0}")]
    InconsistentDocument(String),
    #[error("Arithmetic overflow while computing {0}")]
    ArithmeticOverflow(&'static str),
    #[error("Cart {0} has not been initialized")]
    NotFound(CartId),
    #[error("Storage failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("Failed to encode cart record: {0}")]
    Encoding(String),
    #[error("Failed to decode cart record: {0}")]
    Decoding(#[from] minicbor::decode::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}
