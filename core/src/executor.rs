//! The boundary between request building and transport.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{RequestDescriptor, Response};

/// Executes a `RequestDescriptor` on behalf of a `ForceClient`.
///
/// Implementations own transport, authentication and any retry policy. The
/// returned future resolves exactly once; its error is handed to the caller
/// untouched.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: RequestDescriptor) -> Result<Response, ApiError>;
}

#[async_trait]
impl<E: RequestExecutor + ?Sized> RequestExecutor for std::sync::Arc<E> {
    async fn execute(&self, request: RequestDescriptor) -> Result<Response, ApiError> {
        (**self).execute(request).await
    }
}
