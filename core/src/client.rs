//! Async client that forwards built requests to an executor.
//!
//! # Design
//! `ForceClient` pairs a `RequestBuilder` with a `RequestExecutor`. Each
//! operation builds its descriptor, hands it to the executor, and resolves
//! with whatever the executor returned. The client does not look at
//! responses or errors.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::builder::RequestBuilder;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::executor::RequestExecutor;
use crate::http::{RequestDescriptor, RequestOptions, Response};

pub struct ForceClient<E> {
    builder: RequestBuilder,
    executor: E,
}

impl<E: RequestExecutor> ForceClient<E> {
    pub fn new(config: &ClientConfig, executor: E) -> Self {
        Self {
            builder: RequestBuilder::new(config),
            executor,
        }
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn set_api_version(&mut self, version: impl Into<String>) {
        self.builder.set_api_version(version);
    }

    pub fn api_version(&self) -> &str {
        self.builder.api_version()
    }

    pub async fn send_request(
        &self,
        endpoint: &str,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        self.dispatch(self.builder.send_request(endpoint, path, options)).await
    }

    pub async fn versions(&self) -> Result<Response, ApiError> {
        self.dispatch(self.builder.versions()).await
    }

    pub async fn resources(&self) -> Result<Response, ApiError> {
        self.dispatch(self.builder.resources()).await
    }

    pub async fn describe_global(&self) -> Result<Response, ApiError> {
        self.dispatch(self.builder.describe_global()).await
    }

    pub async fn metadata(&self, objtype: &str) -> Result<Response, ApiError> {
        self.dispatch(self.builder.metadata(objtype)).await
    }

    pub async fn describe(&self, objtype: &str) -> Result<Response, ApiError> {
        self.dispatch(self.builder.describe(objtype)).await
    }

    pub async fn describe_layout(&self, objtype: &str, record_type_id: Option<&str>) -> Result<Response, ApiError> {
        self.dispatch(self.builder.describe_layout(objtype, record_type_id)).await
    }

    pub async fn create(&self, objtype: &str, fields: Map<String, Value>) -> Result<Response, ApiError> {
        self.dispatch(self.builder.create(objtype, fields)).await
    }

    pub async fn create_with<T: Serialize + Sync>(&self, objtype: &str, fields: &T) -> Result<Response, ApiError> {
        self.dispatch(self.builder.create_with(objtype, fields)?).await
    }

    pub async fn retrieve(&self, objtype: &str, id: &str, field_list: Option<&str>) -> Result<Response, ApiError> {
        self.dispatch(self.builder.retrieve(objtype, id, field_list)).await
    }

    pub async fn upsert(
        &self,
        objtype: &str,
        external_id_field: &str,
        external_id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<Response, ApiError> {
        self.dispatch(self.builder.upsert(objtype, external_id_field, external_id, fields))
            .await
    }

    pub async fn upsert_with<T: Serialize + Sync>(
        &self,
        objtype: &str,
        external_id_field: &str,
        external_id: Option<&str>,
        fields: &T,
    ) -> Result<Response, ApiError> {
        self.dispatch(
            self.builder
                .upsert_with(objtype, external_id_field, external_id, fields)?,
        )
        .await
    }

    pub async fn update(&self, objtype: &str, id: &str, fields: Map<String, Value>) -> Result<Response, ApiError> {
        self.dispatch(self.builder.update(objtype, id, fields)).await
    }

    pub async fn update_with<T: Serialize + Sync>(
        &self,
        objtype: &str,
        id: &str,
        fields: &T,
    ) -> Result<Response, ApiError> {
        self.dispatch(self.builder.update_with(objtype, id, fields)?).await
    }

    pub async fn del(&self, objtype: &str, id: &str) -> Result<Response, ApiError> {
        self.dispatch(self.builder.del(objtype, id)).await
    }

    pub async fn query(&self, soql: &str) -> Result<Response, ApiError> {
        self.dispatch(self.builder.query(soql)).await
    }

    /// Fetch the next page of a query from its `nextRecordsUrl`.
    ///
    /// `Ok(None)` means the url was malformed: the problem has been logged
    /// and no request was sent.
    pub async fn query_more(&self, url: &str) -> Result<Option<Response>, ApiError> {
        match self.builder.query_more(url) {
            Some(request) => self.dispatch(request).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn search(&self, sosl: &str) -> Result<Response, ApiError> {
        self.dispatch(self.builder.search(sosl)).await
    }

    pub async fn get_attachment(&self, id: &str) -> Result<Response, ApiError> {
        self.dispatch(self.builder.get_attachment(id)).await
    }

    async fn dispatch(&self, request: RequestDescriptor) -> Result<Response, ApiError> {
        tracing::debug!(
            method = request.method.as_str(),
            path = %request.full_path(),
            return_binary = request.return_binary,
            "sending request"
        );
        self.executor.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;

    /// Records every request and answers with a canned result.
    #[derive(Default)]
    struct RecordingExecutor {
        requests: Mutex<Vec<RequestDescriptor>>,
        fail_with_status: Option<u16>,
    }

    impl RecordingExecutor {
        fn failing(status: u16) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail_with_status: Some(status),
            }
        }

        fn requests(&self) -> Vec<RequestDescriptor> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RequestExecutor for RecordingExecutor {
        async fn execute(&self, request: RequestDescriptor) -> Result<Response, ApiError> {
            let path = request.full_path();
            self.requests.lock().unwrap().push(request);
            match self.fail_with_status {
                Some(status) => Err(ApiError::Http {
                    status,
                    body: r#"[{"errorCode":"NOT_FOUND"}]"#.to_string(),
                }),
                None => Ok(Response::Json(json!({ "path": path }))),
            }
        }
    }

    fn client() -> ForceClient<RecordingExecutor> {
        ForceClient::new(&ClientConfig::default(), RecordingExecutor::default())
    }

    #[tokio::test]
    async fn operations_forward_built_requests() {
        let client = client();
        let response = client.describe("Account").await.unwrap();
        assert_eq!(
            response.as_json().unwrap()["path"],
            "/services/data/v46.0/sobjects/Account/describe/"
        );

        client.del("Account", "001xx").await.unwrap();
        let requests = client.executor().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, HttpMethod::Delete);
        assert!(requests[1].params.is_empty());
    }

    #[tokio::test]
    async fn set_api_version_applies_to_later_calls() {
        let mut client = client();
        client.set_api_version("v99.0");
        assert_eq!(client.api_version(), "v99.0");
        client.query("SELECT Id FROM Account").await.unwrap();
        assert_eq!(client.executor().requests()[0].path, "/v99.0/query");
    }

    #[tokio::test]
    async fn executor_errors_pass_through_unchanged() {
        let client = ForceClient::new(&ClientConfig::default(), RecordingExecutor::failing(404));
        let err = client.retrieve("Account", "missing", None).await.unwrap_err();
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, r#"[{"errorCode":"NOT_FOUND"}]"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_more_follows_valid_url() {
        let client = client();
        let response = client
            .query_more("https://na1.example.com/services/data/v46.0/query/01g-2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.as_json().unwrap()["path"], "/services/data/v46.0/query/01g-2");
    }

    // Known divergence: a malformed url neither fails nor reaches the executor.
    #[tokio::test]
    async fn query_more_malformed_url_sends_nothing() {
        let client = client();
        let result = client.query_more("not-a-url").await.unwrap();
        assert!(result.is_none());
        assert!(client.executor().requests().is_empty());
    }

    #[tokio::test]
    async fn typed_body_errors_do_not_reach_executor() {
        let client = client();
        let err = client.create_with("Account", &"just a string").await.unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
        assert!(client.executor().requests().is_empty());
    }

    #[tokio::test]
    async fn get_attachment_requests_binary() {
        let client = client();
        client.get_attachment("00Pxx").await.unwrap();
        let request = &client.executor().requests()[0];
        assert!(request.return_binary);
        assert_eq!(request.method, HttpMethod::Get);
    }

    #[tokio::test]
    async fn shared_executor_through_arc() {
        let executor = std::sync::Arc::new(RecordingExecutor::default());
        let a = ForceClient::new(&ClientConfig::with_api_version("v50.0"), executor.clone());
        let b = ForceClient::new(&ClientConfig::with_api_version("v60.0"), executor.clone());
        a.resources().await.unwrap();
        b.resources().await.unwrap();
        let paths: Vec<String> = executor.requests().iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec!["/v50.0/".to_string(), "/v60.0/".to_string()]);
    }
}
