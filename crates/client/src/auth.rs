//! Auth endpoints and the HTTP refresh transport.
//!
//! Login, registration, and social sign-in all resolve to the same thing:
//! a token pair stored in the session manager. The refresh call lives on
//! its own [`reqwest`] path so it can never recurse into the client's
//! retry pipeline.

use std::sync::Arc;

use serde::Serialize;

use glowdesk_core::session::TokenPair;

use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest};
use crate::session::RefreshTransport;

/// Refresh transport backed by `POST /auth/refresh`.
pub struct HttpRefresher {
    http: reqwest::Client,
    refresh_url: String,
}

impl HttpRefresher {
    /// Create a refresher against the given API base URL.
    pub fn new(api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            refresh_url: format!("{}/auth/refresh", api_url.trim_end_matches('/')),
        }
    }
}

#[async_trait::async_trait]
impl RefreshTransport for HttpRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let response = self
            .http
            .post(&self.refresh_url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        Ok(response.json::<TokenPair>().await?)
    }
}

/// Payload for `POST /auth/register`: a business owner signing up.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub business_name: String,
    pub email: String,
    pub password: String,
}

/// Auth endpoint wrappers. Every successful call stores the returned
/// token pair in the session manager.
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// `POST /auth/login` with email/password credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.authenticate("/auth/login", body).await
    }

    /// `POST /auth/register` a new business owner account.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "business_name": request.business_name,
            "email": request.email,
            "password": request.password,
        });
        self.authenticate("/auth/register", body).await
    }

    /// `POST /auth/social` with an identity token minted by a social
    /// provider (the provider popup flow itself is the UI layer's job).
    pub async fn social_login(&self, provider: &str, id_token: &str) -> Result<(), ApiError> {
        let body = serde_json::json!({ "provider": provider, "id_token": id_token });
        self.authenticate("/auth/social", body).await
    }

    /// Drop the session. Subsequent requests are unauthenticated.
    pub fn logout(&self) {
        self.client.session().clear_tokens();
        tracing::info!("Session cleared on logout");
    }

    /// Send a public auth request and store the token pair it returns.
    async fn authenticate(&self, path: &str, body: serde_json::Value) -> Result<(), ApiError> {
        let response = self
            .client
            .send(ApiRequest::new(reqwest::Method::POST, path).json(body).public())
            .await?;

        let tokens: TokenPair = response.json().await?;
        self.client.session().set_token_pair(tokens);
        Ok(())
    }
}
