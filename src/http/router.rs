use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::content::{
    Content, ContentKind, ContentResolver, ResolveError, UploadError, UploadSink,
};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Failures that end the connection with a 500.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("reading resource failed: {0}")]
    Resolve(#[source] ResolveError),
    #[error("storing upload failed: {0}")]
    Upload(#[from] UploadError),
}

/// Dispatches validated requests to the content collaborators.
#[derive(Clone)]
pub struct Router {
    resolver: Arc<dyn ContentResolver>,
    uploads: Arc<dyn UploadSink>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

impl Router {
    pub fn new(resolver: Arc<dyn ContentResolver>, uploads: Arc<dyn UploadSink>) -> Self {
        Self { resolver, uploads }
    }

    /// `target` is the traversal-checked path relative to the content root.
    ///
    /// Client mistakes (missing file, wrong media type, bad JSON) come back as
    /// `Ok` responses; only resource failures are errors.
    pub async fn route(&self, request: &Request, target: &Path) -> Result<Response, RouteError> {
        match request.method {
            Method::GET => self.handle_get(target).await,
            Method::POST => self.handle_post(request).await,
            _ => Ok(Response::method_not_allowed()),
        }
    }

    async fn handle_get(&self, target: &Path) -> Result<Response, RouteError> {
        match self.resolver.resolve(target).await {
            Ok(content) => Ok(content_response(content)),
            Err(ResolveError::NotFound) => Ok(Response::not_found()),
            Err(ResolveError::Unsupported(ext)) => {
                tracing::debug!(ext = %ext, "refusing unsupported file type");
                Ok(Response::error(StatusCode::UnsupportedMediaType))
            }
            Err(e) => Err(RouteError::Resolve(e)),
        }
    }

    async fn handle_post(&self, request: &Request) -> Result<Response, RouteError> {
        let is_json = request
            .header("content-type")
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
        if !is_json {
            return Ok(Response::error(StatusCode::UnsupportedMediaType));
        }

        let document: serde_json::Value = match serde_json::from_slice(&request.body) {
            Ok(document) => document,
            Err(e) => {
                tracing::debug!(error = %e, "rejecting malformed JSON body");
                return Ok(Response::error(StatusCode::BadRequest));
            }
        };

        let filepath = self.uploads.store(&document).await?;
        let ack = serde_json::json!({
            "status": "success",
            "message": "File created successfully",
            "filepath": filepath,
        });

        Ok(ResponseBuilder::new(StatusCode::Created)
            .header("Content-Type", "application/json")
            .text(ack.to_string())
            .build())
    }
}

fn content_response(content: Content) -> Response {
    match content.kind {
        ContentKind::Markup => ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/html; charset=utf-8")
            .binary(content.bytes)
            .build(),
        ContentKind::Download { file_name } => ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "application/octet-stream")
            .header(
                "Content-Disposition",
                format!("attachment; filename=\"{file_name}\""),
            )
            .binary(content.bytes)
            .build(),
    }
}
