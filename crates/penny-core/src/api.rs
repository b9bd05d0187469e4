//! HTTP client for the finance backend
//!
//! Thin wrapper over `reqwest` for the handful of endpoints Penny uses:
//!
//! - `POST /api/auth/login` - exchange credentials for a bearer token
//! - `POST /api/auth/register` - create an account
//! - `GET /api/auth/me` - current user profile
//! - `PATCH /api/auth/update` - change name/email, or the password
//! - `GET /api/insights/ai` - aggregate insights snapshot
//! - `GET /api/transactions/all` - every transaction for the user
//! - `POST /api/transactions/add`, `PATCH /api/transactions/update/{id}`,
//!   `DELETE /api/transactions/delete/{id}` - transaction edits

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::PennyConfig;
use crate::error::{Error, Result};
use crate::models::{
    InsightsSnapshot, LoginRequest, LoginResponse, MessageResponse, PasswordUpdate,
    ProfileUpdate, RegisterRequest, Transaction, TransactionId, TransactionInput, UserProfile,
};
use crate::recommendations::InsightsSource;

/// Environment variable that overrides the stored session token
pub const TOKEN_ENV: &str = "PENNY_TOKEN";

/// Backend API client
#[derive(Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for `base_url` with no credentials
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Create a client from loaded config (applies the request timeout)
    pub fn from_config(config: &PennyConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            base_url: config.api_url.clone(),
            token: None,
        })
    }

    /// Same client, authenticated with `token`
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Log in and return the backend's response
    ///
    /// Credentials are checked locally first so obviously bad input never
    /// leaves the machine.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        validate_credentials(email, password)?;

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let response = self
            .http_client
            .post(self.url("/api/auth/login"))
            .json(&request)
            .send()
            .await?;

        let login: LoginResponse = read_json(response).await?;
        if login.token.as_deref().map_or(true, str::is_empty) {
            return Err(Error::Unauthorized(
                login
                    .message
                    .unwrap_or_else(|| "Login response did not include a token".to_string()),
            ));
        }
        Ok(login)
    }

    /// Create an account; the caller logs in separately afterwards
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<MessageResponse> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Please enter your name".to_string()));
        }
        validate_credentials(email, password)?;

        let request = RegisterRequest {
            name: name.to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        debug!("POST /api/auth/register");
        let response = self
            .http_client
            .post(self.url("/api/auth/register"))
            .json(&request)
            .send()
            .await?;
        read_message(response).await
    }

    pub async fn update_profile(&self, name: &str, email: &str) -> Result<MessageResponse> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Name must not be empty".to_string()));
        }
        validate_email(email)?;

        let body = ProfileUpdate {
            name: name.to_string(),
            email: email.trim().to_string(),
        };
        let request = self.http_client.patch(self.url("/api/auth/update")).json(&body);
        self.send_authorized("PATCH /api/auth/update", request).await
    }

    /// Change the password; `confirm` must repeat `new_password`
    pub async fn update_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<MessageResponse> {
        validate_new_password(new_password, confirm)?;

        let body = PasswordUpdate {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        let request = self.http_client.patch(self.url("/api/auth/update")).json(&body);
        self.send_authorized("PATCH /api/auth/update", request).await
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        self.get_json("/api/auth/me").await
    }

    pub async fn insights(&self) -> Result<InsightsSnapshot> {
        self.get_json("/api/insights/ai").await
    }

    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        self.get_json("/api/transactions/all").await
    }

    pub async fn add_transaction(&self, input: &TransactionInput) -> Result<MessageResponse> {
        let request = self
            .http_client
            .post(self.url("/api/transactions/add"))
            .json(input);
        self.send_authorized("POST /api/transactions/add", request).await
    }

    /// Replace every field of transaction `id`
    pub async fn update_transaction(
        &self,
        id: &TransactionId,
        input: &TransactionInput,
    ) -> Result<MessageResponse> {
        let path = format!("/api/transactions/update/{}", id);
        let request = self.http_client.patch(self.url(&path)).json(input);
        self.send_authorized(&format!("PATCH {}", path), request).await
    }

    pub async fn delete_transaction(&self, id: &TransactionId) -> Result<MessageResponse> {
        let path = format!("/api/transactions/delete/{}", id);
        let request = self.http_client.delete(self.url(&path));
        self.send_authorized(&format!("DELETE {}", path), request).await
    }

    async fn send_authorized(
        &self,
        label: &str,
        request: RequestBuilder,
    ) -> Result<MessageResponse> {
        let request = self.authorized(request)?;
        debug!("{}", label);
        let response = request.send().await?;
        read_message(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.authorized(self.http_client.get(self.url(path)))?;
        debug!("GET {}", path);
        let response = request.send().await?;
        read_json(response).await
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match &self.token {
            Some(token) => Ok(request.bearer_auth(token)),
            None => Err(Error::NotLoggedIn),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl InsightsSource for ApiClient {
    async fn fetch_insights(&self) -> Result<InsightsSnapshot> {
        self.insights().await
    }
}

/// Decode a success body, or turn an error status into `Error::Api`
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = body_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });
    debug!("Backend error {}: {}", status, message);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Unauthorized(message));
    }
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Acknowledgement from a mutating endpoint; the body may be JSON, text or empty
async fn read_message(response: Response) -> Result<MessageResponse> {
    if !response.status().is_success() {
        return read_json(response).await;
    }
    let body = response.text().await?;
    Ok(MessageResponse {
        message: body_message(&body),
    })
}

/// Pull a human message out of a body: JSON `message`, else the text
fn body_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => json
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .or_else(|| Some(body.to_string())),
        Err(_) => Some(body.to_string()),
    }
}

/// Local sanity check before posting credentials
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    validate_email(email)?;
    validate_password(password)
}

/// New password must repeat its confirmation and meet the length rule
pub fn validate_new_password(new_password: &str, confirm: &str) -> Result<()> {
    if new_password != confirm {
        return Err(Error::InvalidData("Passwords do not match".to_string()));
    }
    validate_password(new_password)
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < 6 {
        return Err(Error::InvalidData(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid_email {
        return Err(Error::InvalidData(format!(
            "Not a valid email address: {}",
            email
        )));
    }
    Ok(())
}
