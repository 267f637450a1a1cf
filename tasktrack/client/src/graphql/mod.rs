//! GraphQL plumbing between the data service and the API.
//!
//! A [`Transport`] moves one request to the server and hands back the `data` object.
//! [`RemoteClient`] sits on top of it: it decides the organization scope from the
//! preference store, skips scoped queries when there is none, and keeps the
//! normalized [`cache::Cache`] up to date.

pub mod cache;
pub mod client;
pub mod http;
pub mod operations;

pub use client::RemoteClient;
pub use http::HttpTransport;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Header carrying the slug of the selected organization.
pub const ORGANIZATION_HEADER: &str = "X-Organization-Slug";

/// Errors surfaced by the remote client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Server responded with status {status}: {body}")]
    Status { status: u16, body: String },
    /// The server answered with a GraphQL `errors` array.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),
    /// A mutation came back with `success: false`.
    #[error("Rejected by server: {}", .0.join("; "))]
    Rejected(Vec<String>),
    #[error("Response carried no data")]
    EmptyResponse,
    #[error("Response is missing field '{0}'")]
    MissingField(&'static str),
    #[error("Cannot decode response: {0}")]
    Decode(#[from] serde_json::Error),
    /// An organization-scoped mutation was attempted with no organization selected.
    #[error("No organization selected")]
    MissingScope,
    #[error("Organization slug '{0}' cannot be sent as a header")]
    InvalidScope(String),
}

/// One GraphQL request, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlRequest {
    pub operation_name: &'static str,
    pub query: &'static str,
    pub variables: Value,
    /// Slug sent in [`ORGANIZATION_HEADER`], if any.
    pub scope: Option<String>,
}

/// The JSON body posted to the endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody<'a> {
    pub query: &'a str,
    pub operation_name: &'a str,
    pub variables: &'a Value,
}

impl<'a> From<&'a GraphQlRequest> for RequestBody<'a> {
    fn from(request: &'a GraphQlRequest) -> Self {
        Self {
            query: request.query,
            operation_name: request.operation_name,
            variables: &request.variables,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResponseError {
    pub message: String,
}

/// The envelope every GraphQL response arrives in.
#[derive(Debug, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<ResponseError>,
}

impl ResponseBody {
    /// Unwraps the envelope: any reported error wins over partial data.
    pub fn into_data(self) -> Result<Value, ClientError> {
        if !self.errors.is_empty() {
            return Err(ClientError::GraphQl(
                self.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        match self.data {
            Some(Value::Null) | None => Err(ClientError::EmptyResponse),
            Some(data) => Ok(data),
        }
    }
}

/// Moves a request to the server.
///
/// Implementations return the `data` object of a successful response and map every
/// other outcome onto a [`ClientError`].
#[automock]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: GraphQlRequest) -> Result<Value, ClientError>;
}
