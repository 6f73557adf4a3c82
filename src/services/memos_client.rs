use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::config::Config;
use crate::error::MemosApiError;
use crate::models::Visibility;
use crate::utils::{content_filter, path_segment};

/// Filters accepted by the list endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub visibility: Option<String>,
    pub tag: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            visibility: None,
            tag: None,
        }
    }
}

/// Partial update; only the fields that are set are sent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoPatch {
    pub content: Option<String>,
    pub visibility: Option<String>,
    pub row_status: Option<String>,
}

impl MemoPatch {
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(content) = &self.content {
            body.insert("content".to_string(), Value::String(content.clone()));
        }
        if let Some(visibility) = &self.visibility {
            body.insert("visibility".to_string(), Value::String(visibility.clone()));
        }
        if let Some(row_status) = &self.row_status {
            body.insert("rowStatus".to_string(), Value::String(row_status.clone()));
        }
        Value::Object(body)
    }
}

/// Operations the tool handlers need from the Memos REST API.
///
/// Every method returns the raw JSON body; shape differences between API
/// generations are resolved later by the normalizer.
#[async_trait]
pub trait MemosApi: Send + Sync {
    async fn create_memo(&self, content: &str, visibility: Visibility) -> Result<Value, MemosApiError>;
    async fn list_memos(&self, query: &ListQuery) -> Result<Value, MemosApiError>;
    async fn search_memos(&self, query: &str, page: u32, page_size: u32) -> Result<Value, MemosApiError>;
    async fn get_memo(&self, identifier: &str) -> Result<Value, MemosApiError>;
    async fn update_memo(&self, identifier: &str, patch: &MemoPatch) -> Result<Value, MemosApiError>;
    async fn delete_memo(&self, identifier: &str) -> Result<Value, MemosApiError>;
}

/// reqwest-backed client for a Memos instance
#[derive(Clone)]
pub struct MemosClient {
    client: Client,
    api_url: String,
}

impl MemosClient {
    pub fn new(config: &Config) -> Result<Self, MemosApiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.access_token))
            .map_err(|e| MemosApiError::Transport(format!("invalid access token: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, MemosApiError> {
        let url = format!("{}{}", self.api_url, endpoint);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Request error: {}", e);
            MemosApiError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("HTTP error: {} - {}", status.as_u16(), text);
            return Err(MemosApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        // DELETE and some PATCH responses come back with no body
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        serde_json::from_str(&text).map_err(|e| MemosApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MemosApi for MemosClient {
    async fn create_memo(&self, content: &str, visibility: Visibility) -> Result<Value, MemosApiError> {
        let body = serde_json::json!({
            "content": content,
            "visibility": visibility.as_str(),
        });
        self.request(Method::POST, "/memos", &[], Some(body)).await
    }

    async fn list_memos(&self, query: &ListQuery) -> Result<Value, MemosApiError> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("pageSize", query.page_size.to_string()),
        ];
        if let Some(visibility) = &query.visibility {
            params.push(("visibility", visibility.clone()));
        }
        if let Some(tag) = &query.tag {
            params.push(("tag", tag.clone()));
        }
        self.request(Method::GET, "/memos", &params, None).await
    }

    async fn search_memos(&self, query: &str, page: u32, page_size: u32) -> Result<Value, MemosApiError> {
        let params = [
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
            ("filter", content_filter(query)),
        ];
        self.request(Method::GET, "/memos", &params, None).await
    }

    async fn get_memo(&self, identifier: &str) -> Result<Value, MemosApiError> {
        let endpoint = format!("/memos/{}", path_segment(identifier));
        self.request(Method::GET, &endpoint, &[], None).await
    }

    async fn update_memo(&self, identifier: &str, patch: &MemoPatch) -> Result<Value, MemosApiError> {
        let endpoint = format!("/memos/{}", path_segment(identifier));
        self.request(Method::PATCH, &endpoint, &[], Some(patch.to_body())).await
    }

    async fn delete_memo(&self, identifier: &str) -> Result<Value, MemosApiError> {
        let endpoint = format!("/memos/{}", path_segment(identifier));
        self.request(Method::DELETE, &endpoint, &[], None).await
    }
}
