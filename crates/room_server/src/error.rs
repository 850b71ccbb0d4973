//! Error types and handling for the room server.
//!
//! This module defines the error types that can occur during server operations,
//! providing clear categorization of different failure modes. None of them are
//! fatal to the process: every error is scoped to one connection or one request.

/// Enumeration of possible server errors.
///
/// Categorizes errors into network-related, protocol-related and internal
/// server errors to help with debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// An inbound frame that is not a well-formed message object
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// A well-formed message whose `type` is not handled by the router
    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    /// A room or player identifier rejected at the connection boundary
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}
