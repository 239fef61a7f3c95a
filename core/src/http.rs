//! Request and response types for the host-does-IO pattern.
//!
//! # Design
//! A `RequestDescriptor` describes one REST call as plain data. The core
//! builds descriptors and never touches the network; the executor (host) is
//! responsible for transport and authentication. Every map field is present
//! even when empty, so a host never has to handle a missing value.
//!
//! The serde representation matches the argument object a native bridge
//! expects (`endPoint`, `queryParams`, `doesNotRequireAuthentication`, ...),
//! which lets descriptors cross a process or FFI boundary as JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether `params` travel in the body rather than the query string.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Patch)
    }
}

/// A file to attach to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileParam {
    #[serde(rename = "fileMimeType")]
    pub mime_type: String,
    pub file_url: String,
    pub file_name: String,
}

/// Optional parts of a request, with their defaults.
///
/// | field                 | default |
/// |-----------------------|---------|
/// | `method`              | `GET`   |
/// | `params`              | `{}`    |
/// | `header_params`       | `{}`    |
/// | `file_params`         | `{}`    |
/// | `return_binary`       | `false` |
/// | `skip_authentication` | `false` |
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub params: Map<String, Value>,
    pub header_params: Map<String, Value>,
    pub file_params: BTreeMap<String, FileParam>,
    pub return_binary: bool,
    pub skip_authentication: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.header_params.insert(key.into(), value.into());
        self
    }

    pub fn file(mut self, name: impl Into<String>, file: FileParam) -> Self {
        self.file_params.insert(name.into(), file);
        self
    }

    pub fn return_binary(mut self, return_binary: bool) -> Self {
        self.return_binary = return_binary;
        self
    }

    pub fn skip_authentication(mut self, skip: bool) -> Self {
        self.skip_authentication = skip;
        self
    }
}

/// A fully normalized request, ready for an executor.
///
/// `params` is sent as the query string for `GET`/`DELETE` and as the JSON
/// body for `POST`/`PATCH`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    #[serde(rename = "endPoint")]
    pub endpoint: String,
    pub path: String,
    pub method: HttpMethod,
    #[serde(rename = "queryParams")]
    pub params: Map<String, Value>,
    pub header_params: Map<String, Value>,
    pub file_params: BTreeMap<String, FileParam>,
    pub return_binary: bool,
    #[serde(rename = "doesNotRequireAuthentication")]
    pub skip_authentication: bool,
}

impl RequestDescriptor {
    /// Endpoint and path joined, e.g. `/services/data/v46.0/query`.
    pub fn full_path(&self) -> String {
        format!("{}{}", self.endpoint, self.path)
    }
}

/// What an executor hands back for a completed request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Json(Value),
    Binary { content_type: String, body: Vec<u8> },
    /// No content, e.g. `204` after an update or delete.
    Empty,
}

impl Response {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Response::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Response::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Response::Empty)
    }
}
