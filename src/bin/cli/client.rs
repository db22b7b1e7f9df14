use lostfound::dto::{AnalyzeImageDto, CreateItemDto, ItemQueryDto};
use lostfound::matching::MatchOutcome;
use lostfound::models::{ImageAnalysis, Item, Notification};
use reqwest::Client;

/// Error type for CLI client operations
#[derive(Debug)]
pub enum ClientError {
    /// Server returned an error status with a message body
    Server { status: reqwest::StatusCode, message: String },
    /// Network/connection/request error
    Request(reqwest::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status.as_u16(), message)
            }
            ClientError::Request(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(err) => Some(err),
            ClientError::Server { .. } => None,
        }
    }
}

/// Extension trait for checking HTTP responses and extracting server error messages
trait ResponseExt {
    /// Checks for error status and extracts the server's error message body
    async fn check(self) -> Result<reqwest::Response, ClientError>;
}

impl ResponseExt for reqwest::Response {
    async fn check(self) -> Result<reqwest::Response, ClientError> {
        if self.status().is_success() {
            return Ok(self);
        }
        let status = self.status();
        let message = match self.json::<serde_json::Value>().await {
            Ok(body) => body.get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("Unknown error")
                .to_string(),
            Err(_) => format!("HTTP {}", status),
        };
        Err(ClientError::Server { status, message })
    }
}

/// HTTP client wrapper for communicating with the lost & found server
pub struct LostFoundClient {
    /// The base URL of the server (e.g. "http://localhost:3000")
    base_url: String,
    /// The underlying HTTP client
    client: Client,
}

/// Builds query parameters from an ItemQueryDto
fn build_query_params(query: &ItemQueryDto) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = Vec::new();

    if let Some(kind) = query.kind {
        params.push(("kind", kind.to_string()));
    }
    if let Some(status) = query.status {
        params.push(("status", status.to_string()));
    }
    if let Some(ref search) = query.search {
        params.push(("search", search.clone()));
    }

    params
}

impl LostFoundClient {
    /// Creates a new LostFoundClient
    ///
    /// ### Arguments
    ///
    /// * `base_url` - The base URL of the server
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    // ── Item endpoints ───────────────────────────────────────────────

    /// Lists items with optional filters
    pub async fn list_items(&self, query: &ItemQueryDto) -> Result<Vec<Item>, ClientError> {
        let url = format!("{}/items", self.base_url);
        let params = build_query_params(query);

        let response = self.client.get(&url).query(&params)
            .send().await.map_err(ClientError::Request)?
            .check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Files a new report
    pub async fn create_item(&self, dto: &CreateItemDto) -> Result<Item, ClientError> {
        let url = format!("{}/items", self.base_url);
        let response = self.client.post(&url).json(dto).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Gets a specific item by ID
    pub async fn get_item(&self, id: &str) -> Result<Option<Item>, ClientError> {
        let url = format!("{}/items/{}", self.base_url, id);
        let response = self.client.get(&url).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Marks an item as resolved
    pub async fn resolve_item(&self, id: &str) -> Result<Item, ClientError> {
        let url = format!("{}/items/{}/resolve", self.base_url, id);
        let response = self.client.post(&url).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Rescans an item for matches and waits for the result
    pub async fn match_item(&self, id: &str) -> Result<MatchOutcome, ClientError> {
        let url = format!("{}/items/{}/match", self.base_url, id);
        let response = self.client.post(&url).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Deletes an item
    pub async fn delete_item(&self, id: &str) -> Result<(), ClientError> {
        let url = format!("{}/items/{}", self.base_url, id);
        self.client.delete(&url).send().await.map_err(ClientError::Request)?.check().await?;
        Ok(())
    }

    // ── Analysis endpoint ────────────────────────────────────────────

    /// Asks the server to tag and describe a photo
    pub async fn analyze_image(&self, image: String) -> Result<ImageAnalysis, ClientError> {
        let url = format!("{}/analysis", self.base_url);
        let dto = AnalyzeImageDto { image };
        let response = self.client.post(&url).json(&dto).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    // ── Notification endpoints ───────────────────────────────────────

    /// Lists notifications that have not been dismissed
    pub async fn list_notifications(&self) -> Result<Vec<Notification>, ClientError> {
        let url = format!("{}/notifications", self.base_url);
        let response = self.client.get(&url).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Gets a specific notification by ID
    pub async fn get_notification(&self, id: &str) -> Result<Option<Notification>, ClientError> {
        let url = format!("{}/notifications/{}", self.base_url, id);
        let response = self.client.get(&url).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }

    /// Dismisses a notification
    pub async fn dismiss_notification(&self, id: &str) -> Result<Notification, ClientError> {
        let url = format!("{}/notifications/{}/dismiss", self.base_url, id);
        let response = self.client.post(&url).send().await.map_err(ClientError::Request)?.check().await?;
        response.json().await.map_err(ClientError::Request)
    }
}
