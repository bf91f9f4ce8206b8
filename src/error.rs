//! The uniform failure type surfaced to callers.
//!
//! Every fallible path in the client resolves to a [`Web3Error`], which pairs
//! an HTTP status code with a human-readable message so a gateway front-end
//! can forward failures without translation. Internal invariant violations
//! get their own variant: they indicate a programming bug, not bad input.

use thiserror::Error;

/// A user-surfaced failure carrying the HTTP status it should be served with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Web3Error {
    /// Malformed URL, unknown chain or name-service suffix, invalid hex,
    /// unparseable type annotation, or a zero resolver address.
    #[error("{0}")]
    BadRequest(String),

    /// Name has no address record, the contract call failed, or the contract
    /// returned no data.
    #[error("{0}")]
    NotFound(String),

    /// The RPC transport could not be built or reached.
    #[error("{0}")]
    ServerError(String),

    /// Reserved functionality (ERC-5219 resource requests).
    #[error("{0}")]
    NotImplemented(String),

    /// Internal invariant violation. Reaching this variant is a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Web3Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Web3Error::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Web3Error::NotFound(message.into())
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Web3Error::ServerError(message.into())
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Web3Error::NotImplemented(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Web3Error::Internal(message.into())
    }

    /// The HTTP status code this failure should be served with.
    pub fn http_code(&self) -> u16 {
        match self {
            Web3Error::BadRequest(_) => 400,
            Web3Error::NotFound(_) => 404,
            Web3Error::ServerError(_) => 500,
            Web3Error::NotImplemented(_) => 501,
            Web3Error::Internal(_) => 500,
        }
    }
}

/// The message served when a contract call returns no data at all.
pub const EMPTY_RETURN_MESSAGE: &str = "The contract returned no data (\"0x\").\n\nThis could be due to any of the following:\n  - The contract does not have the requested function,\n  - The parameters passed to the contract function may be invalid, or\n  - The address is not a contract.";
