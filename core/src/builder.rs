//! Stateless request builder for the REST data API.
//!
//! # Design
//! `RequestBuilder` holds only the API version. Every operation is a pure
//! function of that version and its arguments that yields a
//! `RequestDescriptor`; all of them go through [`RequestBuilder::send_request`],
//! the one place where defaults are applied. Executing the descriptor is the
//! caller's job, which keeps the builder deterministic and free of I/O.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, RequestDescriptor, RequestOptions};

/// Endpoint shared by every operation except `query_more`.
pub const DATA_ENDPOINT: &str = "/services/data";

/// Builds `RequestDescriptor` values for each REST operation.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    api_version: String,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl RequestBuilder {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            api_version: config.api_version.clone(),
        }
    }

    pub fn set_api_version(&mut self, version: impl Into<String>) {
        self.api_version = version.into();
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Normalize an arbitrary request.
    pub fn send_request(&self, endpoint: &str, path: &str, options: RequestOptions) -> RequestDescriptor {
        RequestDescriptor {
            endpoint: endpoint.to_string(),
            path: path.to_string(),
            method: options.method,
            params: options.params,
            header_params: options.header_params,
            file_params: options.file_params,
            return_binary: options.return_binary,
            skip_authentication: options.skip_authentication,
        }
    }

    /// Summary of every available API version.
    pub fn versions(&self) -> RequestDescriptor {
        self.data_request("/", RequestOptions::default())
    }

    /// Resources available for the current API version.
    pub fn resources(&self) -> RequestDescriptor {
        self.data_request(&format!("/{}/", self.api_version), RequestOptions::default())
    }

    pub fn describe_global(&self) -> RequestDescriptor {
        self.data_request(&self.sobjects_path(""), RequestOptions::default())
    }

    pub fn metadata(&self, objtype: &str) -> RequestDescriptor {
        self.data_request(&self.sobjects_path(&format!("{objtype}/")), RequestOptions::default())
    }

    pub fn describe(&self, objtype: &str) -> RequestDescriptor {
        self.data_request(
            &self.sobjects_path(&format!("{objtype}/describe/")),
            RequestOptions::default(),
        )
    }

    /// Layouts for `objtype`, narrowed to one record type when given.
    pub fn describe_layout(&self, objtype: &str, record_type_id: Option<&str>) -> RequestDescriptor {
        let record_type_id = record_type_id.unwrap_or("");
        self.data_request(
            &self.sobjects_path(&format!("{objtype}/describe/layouts/{record_type_id}")),
            RequestOptions::default(),
        )
    }

    pub fn create(&self, objtype: &str, fields: Map<String, Value>) -> RequestDescriptor {
        self.data_request(
            &self.sobjects_path(&format!("{objtype}/")),
            RequestOptions::new().method(HttpMethod::Post).params(fields),
        )
    }

    pub fn create_with<T: Serialize>(&self, objtype: &str, fields: &T) -> Result<RequestDescriptor, ApiError> {
        Ok(self.create(objtype, to_fields(fields)?))
    }

    /// Fetch one record. `field_list` is a comma-separated list such as
    /// `Name,Industry`; an empty list is the same as none.
    pub fn retrieve(&self, objtype: &str, id: &str, field_list: Option<&str>) -> RequestDescriptor {
        let mut options = RequestOptions::new().method(HttpMethod::Get);
        if let Some(fields) = field_list.filter(|f| !f.is_empty()) {
            options = options.param("fields", fields);
        }
        self.data_request(&self.sobjects_path(&format!("{objtype}/{id}")), options)
    }

    /// Create or update by external id. Without an id value the record is
    /// inserted (`POST`); with one it is upserted in place (`PATCH`).
    pub fn upsert(
        &self,
        objtype: &str,
        external_id_field: &str,
        external_id: Option<&str>,
        fields: Map<String, Value>,
    ) -> RequestDescriptor {
        let external_id = external_id.filter(|id| !id.is_empty());
        let method = if external_id.is_some() {
            HttpMethod::Patch
        } else {
            HttpMethod::Post
        };
        let path = self.sobjects_path(&format!(
            "{objtype}/{external_id_field}/{}",
            external_id.unwrap_or("")
        ));
        self.data_request(&path, RequestOptions::new().method(method).params(fields))
    }

    pub fn upsert_with<T: Serialize>(
        &self,
        objtype: &str,
        external_id_field: &str,
        external_id: Option<&str>,
        fields: &T,
    ) -> Result<RequestDescriptor, ApiError> {
        Ok(self.upsert(objtype, external_id_field, external_id, to_fields(fields)?))
    }

    pub fn update(&self, objtype: &str, id: &str, fields: Map<String, Value>) -> RequestDescriptor {
        self.data_request(
            &self.sobjects_path(&format!("{objtype}/{id}")),
            RequestOptions::new().method(HttpMethod::Patch).params(fields),
        )
    }

    pub fn update_with<T: Serialize>(&self, objtype: &str, id: &str, fields: &T) -> Result<RequestDescriptor, ApiError> {
        Ok(self.update(objtype, id, to_fields(fields)?))
    }

    pub fn del(&self, objtype: &str, id: &str) -> RequestDescriptor {
        self.data_request(
            &self.sobjects_path(&format!("{objtype}/{id}")),
            RequestOptions::new().method(HttpMethod::Delete),
        )
    }

    pub fn query(&self, soql: &str) -> RequestDescriptor {
        self.data_request(
            &format!("/{}/query", self.api_version),
            RequestOptions::new().param("q", soql),
        )
    }

    /// Follow a `nextRecordsUrl`/`prevRecordsUrl` given as a full URL.
    ///
    /// Returns `None` and logs an error when `url` is not of the form
    /// `https://<host>/<path>`; no request should be issued in that case.
    pub fn query_more(&self, url: &str) -> Option<RequestDescriptor> {
        match path_from_url(url) {
            Some(path) => Some(self.send_request("", path, RequestOptions::default())),
            None => {
                tracing::error!(url = %url, "queryMore failed: url must be a valid https url");
                None
            }
        }
    }

    pub fn search(&self, sosl: &str) -> RequestDescriptor {
        self.data_request(
            &format!("/{}/search", self.api_version),
            RequestOptions::new().param("q", sosl),
        )
    }

    /// Download an attachment body as binary.
    pub fn get_attachment(&self, id: &str) -> RequestDescriptor {
        self.data_request(
            &self.sobjects_path(&format!("Attachment/{id}/Body")),
            RequestOptions::new().return_binary(true),
        )
    }

    fn data_request(&self, path: &str, options: RequestOptions) -> RequestDescriptor {
        self.send_request(DATA_ENDPOINT, path, options)
    }

    fn sobjects_path(&self, rest: &str) -> String {
        format!("/{}/sobjects/{rest}", self.api_version)
    }
}

/// Extract the path following the host of an `https://` URL.
fn path_from_url(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("https://")?;
    let slash = rest.find('/')?;
    if slash == 0 {
        return None;
    }
    Some(&rest[slash..])
}

/// Serialize a typed body into the JSON object a request carries.
fn to_fields<T: Serialize>(fields: &T) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(fields).map_err(|e| ApiError::Serialization(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Serialization(format!(
            "request body must be a JSON object, got {other}"
        ))),
    }
}
