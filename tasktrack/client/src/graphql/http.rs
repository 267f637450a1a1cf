use super::{ClientError, GraphQlRequest, ORGANIZATION_HEADER, RequestBody, ResponseBody, Transport};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

/// [`Transport`] posting JSON to a single GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn headers(scope: Option<&str>) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(slug) = scope {
        let value = HeaderValue::from_str(slug)
            .map_err(|_| ClientError::InvalidScope(slug.to_string()))?;
        headers.insert(HeaderName::from_static("x-organization-slug"), value);
    }
    Ok(headers)
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, request), fields(operation = request.operation_name))]
    async fn execute(&self, request: GraphQlRequest) -> Result<Value, ClientError> {
        tracing::debug!(
            "Sending {} to {} ({}: {:?})",
            request.operation_name,
            self.endpoint,
            ORGANIZATION_HEADER,
            request.scope
        );
        let response = self
            .client
            .post(&self.endpoint)
            .headers(headers(request.scope.as_deref())?)
            .json(&RequestBody::from(&request))
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            // GraphQL servers report query validation problems with a 4xx and an errors array.
            if let Ok(body) = serde_json::from_slice::<ResponseBody>(&bytes) {
                if !body.errors.is_empty() {
                    return body.into_data();
                }
            }
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let body: ResponseBody = serde_json::from_slice(&bytes)?;
        body.into_data()
    }
}
