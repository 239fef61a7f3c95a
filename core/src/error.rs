//! Error types for the force client.
//!
//! # Design
//! The builder itself only fails when a typed body cannot be turned into a
//! JSON object. Everything else (network, authentication, server-side
//! rejections) is produced by the executor and handed to the caller as-is;
//! the client never inspects or re-wraps it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The executor could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A request body could not be serialized into a JSON object.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A response body could not be decoded.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}
