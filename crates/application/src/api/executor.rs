//! API request executor.
//!
//! Builds authenticated requests, applies the bounded retry-on-401
//! policy and classifies every failure before it reaches the caller.

use beacon_domain::{ApiError, ApiRequest, ApiResponse, HttpMethod};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::api::classify;
use crate::auth::AuthCoordinator;
use crate::ports::{AuthLibrary, Clock, HttpClient, StateStorage};

/// Header carrying the fixed client identifier.
const CLIENT_ID_HEADER: &str = "X-Client-Id";
/// Header carrying the per-process session id.
const SESSION_ID_HEADER: &str = "X-Session-Id";
/// Header carrying the per-request correlation id.
const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Executes authenticated API requests.
///
/// The retry policy is deliberately narrow: at most one retry, triggered
/// only by HTTP 401, never by other statuses or transport failures. The
/// refresh backing that retry is single-flighted, so parallel requests
/// hitting 401 at the same time produce one token exchange between them.
pub struct ApiExecutor<H, A, S, C> {
    http: H,
    coordinator: AuthCoordinator<A, S, C>,
    base_url: String,
    client_id: String,
    session_id: Uuid,
}

impl<H, A, S, C> ApiExecutor<H, A, S, C>
where
    H: HttpClient,
    A: AuthLibrary + 'static,
    S: StateStorage + 'static,
    C: Clock + 'static,
{
    /// Creates an executor for the API at `base_url`.
    ///
    /// The session id is fixed for the executor's lifetime and sent with
    /// every request; each request additionally carries a fresh
    /// correlation id.
    #[must_use]
    pub fn new(
        http: H,
        coordinator: AuthCoordinator<A, S, C>,
        base_url: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            coordinator,
            base_url,
            client_id: client_id.into(),
            session_id: Uuid::now_v7(),
        }
    }

    /// Issues an authenticated request against the API.
    ///
    /// Suspends while a token refresh or login is in flight, and while
    /// the HTTP call (and at most one retry) is outstanding.
    ///
    /// # Errors
    ///
    /// A classified [`ApiError`]; [`ApiError::is_login_required`]
    /// distinguishes the redirect-to-login case from technical failures.
    pub async fn call(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError> {
        let token = self.coordinator.get_access_token().await?;
        let url = self.url_for(path);

        let response = self.send(method, &url, body.clone(), &token).await?;
        if !response.status.is_unauthorized() {
            return Self::finish(response, &url);
        }

        // One refresh, one retry. Parallel requests that 401 together
        // share the refresh through the coordinator's single flight.
        debug!(%url, "401 received, refreshing access token and retrying once");
        let token = self.coordinator.refresh_access_token().await?;
        let retried = self.send(method, &url, body, &token).await?;
        if retried.status.is_unauthorized() {
            return Err(classify::from_http_response(&retried, &url));
        }
        Self::finish(retried, &url)
    }

    /// GET convenience wrapper.
    ///
    /// # Errors
    ///
    /// See [`ApiExecutor::call`].
    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.call(HttpMethod::Get, path, None).await
    }

    /// POST convenience wrapper.
    ///
    /// # Errors
    ///
    /// See [`ApiExecutor::call`].
    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.call(HttpMethod::Post, path, Some(body)).await
    }

    /// Starts an interactive login regardless of current token state.
    ///
    /// # Errors
    ///
    /// The classified login failure.
    pub async fn force_login(&self) -> Result<(), ApiError> {
        self.coordinator.login().await.map(|_| ())
    }

    /// Runs the logout flow and clears the stored session.
    ///
    /// # Errors
    ///
    /// The classified logout failure.
    pub async fn force_logout(&self) -> Result<(), ApiError> {
        self.coordinator.logout().await
    }

    /// Drops the access token so the next call exercises the
    /// silent-refresh path. Test and demo hook.
    pub async fn simulate_expired_access_token(&self) {
        self.coordinator.clear_access_token().await;
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
        token: &str,
    ) -> Result<ApiResponse, ApiError> {
        let mut request = ApiRequest::new(method, url)
            .with_bearer(token)
            .with_header(CLIENT_ID_HEADER, self.client_id.clone())
            .with_header(SESSION_ID_HEADER, self.session_id.to_string())
            .with_header(REQUEST_ID_HEADER, Uuid::now_v7().to_string());
        if let Some(body) = body {
            request = request.with_json_body(body);
        }

        self.http
            .execute(&request)
            .await
            .map_err(|error| classify::from_transport_failure(&error, url))
    }

    fn finish(response: ApiResponse, url: &str) -> Result<ApiResponse, ApiError> {
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(classify::from_http_response(&response, url))
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
