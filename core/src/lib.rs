//! Request builder and client core for the force REST data API.
//!
//! # Overview
//! Formats endpoint paths and parameters for the REST data API (CRUD,
//! query, search, metadata discovery) and hands the resulting
//! `RequestDescriptor` to a host-supplied `RequestExecutor`. The core never
//! touches the network (host-does-IO pattern).
//!
//! # Design
//! - `RequestBuilder` is pure; it holds only the API version of its instance.
//! - `ForceClient` wraps a builder and an executor and exposes one `async`
//!   method per operation, resolving with the executor's result.
//! - Descriptors serialize to the argument object a native bridge expects,
//!   so they can also be shipped over FFI as JSON.

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;

pub use builder::{RequestBuilder, DATA_ENDPOINT};
pub use client::ForceClient;
pub use config::{ClientConfig, DEFAULT_API_VERSION};
pub use error::ApiError;
pub use executor::RequestExecutor;
pub use http::{FileParam, HttpMethod, RequestDescriptor, RequestOptions, Response};
