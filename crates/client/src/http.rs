//! Request surface of the authenticated HTTP client.
//!
//! [`ApiClient`] owns the [`reqwest`] client, attaches the session's
//! bearer token, and routes every expired-token response through the
//! session manager's shared refresh before replaying the request exactly
//! once. Requests are represented as [`ApiRequest`] values so a replay
//! rebuilds the same call from owned data.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use glowdesk_core::session::{FileTokenStore, MemoryTokenStore, TokenStore};
use glowdesk_core::toast::{ToastReporter, ToastSeverity};

use crate::auth::HttpRefresher;
use crate::config::ClientConfig;
use crate::error::{self, ApiError};
use crate::session::SessionManager;

/// Body of an [`ApiRequest`].
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// Multipart form, used by the image-upload endpoints.
    Multipart(Vec<MultipartField>),
}

/// One field of a multipart form, held as owned data so the request can
/// be rebuilt on replay.
pub struct MultipartField {
    name: String,
    value: MultipartValue,
}

enum MultipartValue {
    Text(String),
    File {
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

impl MultipartField {
    /// A plain text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: MultipartValue::Text(value.into()),
        }
    }

    /// A file field (e.g. a branch or service image).
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            value: MultipartValue::File {
                file_name: file_name.into(),
                mime: mime.into(),
                bytes,
            },
        }
    }
}

/// An outbound call, described as data so it can be issued more than once.
pub struct ApiRequest {
    method: reqwest::Method,
    path: String,
    body: RequestBody,
    authenticated: bool,
}

impl ApiRequest {
    /// A new authenticated request with an empty body.
    pub fn new(method: reqwest::Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            authenticated: true,
        }
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Attach a multipart form body.
    pub fn multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    /// Mark the request as unauthenticated (auth endpoints). Public
    /// requests carry no bearer token and never enter the refresh path.
    pub fn public(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// HTTP client for the Glowdesk backend.
///
/// Callers never manage tokens directly: the injected [`SessionManager`]
/// supplies the bearer token and coordinates refreshes, and the injected
/// [`ToastReporter`] receives one categorized message per failure.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
    toast: Arc<dyn ToastReporter>,
}

impl ApiClient {
    /// Create a client against `config.api_url` with injected collaborators.
    pub fn new(
        config: &ClientConfig,
        session: Arc<SessionManager>,
        toast: Arc<dyn ToastReporter>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
            toast,
        }
    }

    /// Wire up a full client from configuration: token store (file-backed
    /// when `config.token_file` is set), HTTP refresher, session manager.
    pub fn bootstrap(config: &ClientConfig, toast: Arc<dyn ToastReporter>) -> Arc<Self> {
        let store: Arc<dyn TokenStore> = match &config.token_file {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::new()),
        };
        let transport = Arc::new(HttpRefresher::new(&config.api_url));
        let session = Arc::new(SessionManager::new(store, transport));
        Arc::new(Self::new(config, session, toast))
    }

    /// The session manager this client authenticates with.
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Issue a request, refreshing the session and replaying at most once
    /// on an expired access token. Failures are reported to the toast
    /// collaborator and returned.
    pub async fn send(&self, request: ApiRequest) -> Result<reqwest::Response, ApiError> {
        match self.dispatch(&request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                self.toast.show(&err.user_message(), ToastSeverity::Error);
                Err(err)
            }
        }
    }

    // ---- typed helpers ----

    /// `GET` a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(ApiRequest::new(reqwest::Method::GET, path)).await?;
        Ok(response.json().await?)
    }

    /// `POST` a JSON body and parse the JSON response.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let response = self
            .send(ApiRequest::new(reqwest::Method::POST, path).json(body.clone()))
            .await?;
        Ok(response.json().await?)
    }

    /// `PUT` a JSON body, discarding the response body.
    pub async fn put(&self, path: &str, body: &serde_json::Value) -> Result<(), ApiError> {
        self.send(ApiRequest::new(reqwest::Method::PUT, path).json(body.clone()))
            .await?;
        Ok(())
    }

    /// `PUT` with no body, discarding the response body.
    pub async fn put_empty(&self, path: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::new(reqwest::Method::PUT, path)).await?;
        Ok(())
    }

    /// `DELETE` a resource, discarding the response body.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::new(reqwest::Method::DELETE, path))
            .await?;
        Ok(())
    }

    /// `POST` a multipart form (image uploads) and parse the JSON response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: Vec<MultipartField>,
    ) -> Result<T, ApiError> {
        let response = self
            .send(ApiRequest::new(reqwest::Method::POST, path).multipart(fields))
            .await?;
        Ok(response.json().await?)
    }

    // ---- private helpers ----

    /// Issue the request; on a 401 for an authenticated call, join the
    /// shared refresh and replay once.
    async fn dispatch(&self, request: &ApiRequest) -> Result<reqwest::Response, ApiError> {
        let response = self.issue(request).await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED && request.authenticated {
            // Expired access token. Exactly one refresh call is shared by
            // every request that lands here while it is outstanding.
            self.session.refreshed_access_token().await?;

            let retry = self.issue(request).await?;
            if retry.status() == reqwest::StatusCode::UNAUTHORIZED {
                // The refreshed token was rejected as well; do not loop.
                self.session.clear_tokens();
                return Err(ApiError::SessionExpired);
            }
            return Self::into_result(retry, request.authenticated).await;
        }

        Self::into_result(response, request.authenticated).await
    }

    /// Build and send the request once, bearer token attached when the
    /// session has one.
    async fn issue(&self, request: &ApiRequest) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), url);

        if request.authenticated {
            if let Some(token) = self.session.access_token() {
                builder = builder.bearer_auth(token);
            }
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        Ok(builder.send().await?)
    }

    /// Classify a non-success response into an [`ApiError`].
    async fn into_result(
        response: reqwest::Response,
        authenticated: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        // A 401 on a public endpoint (login, register) is a credential
        // problem, not an expired session.
        if status == reqwest::StatusCode::UNAUTHORIZED && !authenticated {
            return Err(error::public_unauthorized(&body));
        }

        Err(ApiError::from_response(status.as_u16(), &body))
    }
}

/// Rebuild a [`reqwest::multipart::Form`] from owned field data.
fn build_form(fields: &[MultipartField]) -> Result<reqwest::multipart::Form, ApiError> {
    let mut form = reqwest::multipart::Form::new();
    for field in fields {
        form = match &field.value {
            MultipartValue::Text(value) => form.text(field.name.clone(), value.clone()),
            MultipartValue::File {
                file_name,
                mime,
                bytes,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)?;
                form.part(field.name.clone(), part)
            }
        };
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_authenticated_by_default() {
        let request = ApiRequest::new(reqwest::Method::GET, "/branches");
        assert!(request.authenticated);
    }

    #[test]
    fn public_clears_the_authenticated_flag() {
        let request = ApiRequest::new(reqwest::Method::POST, "/auth/login").public();
        assert!(!request.authenticated);
    }

    #[test]
    fn multipart_form_rebuilds_from_owned_fields() {
        let fields = vec![
            MultipartField::text("name", "Downtown branch"),
            MultipartField::file("image", "front.jpg", "image/jpeg", vec![0xFF, 0xD8]),
        ];
        // Building twice must succeed: replay after a refresh re-issues
        // the same form.
        assert!(build_form(&fields).is_ok());
        assert!(build_form(&fields).is_ok());
    }
}
