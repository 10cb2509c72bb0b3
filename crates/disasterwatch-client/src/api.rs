//! REST client for the DisasterWatch backend.
//!
//! [`ApiClient`] covers the alert feed, authentication and user
//! administration. It implements the core [`FeedBackend`] seam so the
//! controller can drive it directly.
//!
//! No timeouts are configured: a hung request blocks only the operation
//! awaiting it.

use disasterwatch_core::config::BackendConfig;
use disasterwatch_core::{BackendError, FeedBackend};
use disasterwatch_types::{ApiMessage, AuthResponse, EventId, RawEvent, UserId, UserRecord};
use reqwest::{Response, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ClientError;
use crate::forms::{LoginForm, SignupForm};

/// Fallback text when a failed login carries no message.
pub const LOGIN_FAILED: &str = "Login failed, check credentials";

/// Fallback text when a failed signup carries no message.
pub const SIGNUP_FAILED: &str = "Signup failed. Please try again.";

/// HTTP client bound to one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Create a client for the backend at `base_url` (scheme, host, port
    /// and an optional path prefix).
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl {
                url: base_url.to_owned(),
                reason: String::from("expected an http(s) URL"),
            });
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    /// Create a client from the `backend` config section.
    pub fn from_config(config: &BackendConfig) -> Result<Self, ClientError> {
        Self::new(&config.url)
    }

    /// The backend base URL.
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// The base URL with `segments` appended to its path. Each segment is
    /// percent-encoded on its own, so `/`, `?` and `#` inside an id never
    /// leave that segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| matches!(s.trim(), "" | "." | ".."))
        {
            return Err(ClientError::InvalidId((*bad).to_owned()));
        }
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: self.base.to_string(),
                reason: String::from("cannot be a base"),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // -----------------------------------------------------------------------
    // Alerts
    // -----------------------------------------------------------------------

    /// `GET /api/alerts`.
    ///
    /// Entries that are not alert objects are logged and skipped; the rest
    /// of the snapshot still loads.
    pub async fn list_alerts(&self) -> Result<Vec<RawEvent>, ClientError> {
        let url = self.endpoint(&["api", "alerts"])?;
        let response = self.http.get(url).send().await.map_err(transport)?;
        let response = ensure_success(response).await?;
        let values: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("alert list: {e}")))?;

        let total = values.len();
        let records: Vec<RawEvent> = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RawEvent>(value) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    warn!(error = %e, "skipping undecodable alert record");
                    None
                }
            })
            .collect();
        debug!(total, decoded = records.len(), "fetched alerts");
        Ok(records)
    }

    /// `DELETE /api/alerts/{id}` with a bearer credential.
    pub async fn remove_alert(&self, id: &EventId, token: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["api", "alerts", id.as_str()])?;
        let response = self
            .http
            .delete(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    /// `POST /api/auth/login`. The caller stores the result in the session.
    pub async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ClientError> {
        form.check()?;
        let url = self.endpoint(&["api", "auth", "login"])?;
        let response = self.http.post(url).json(form).send().await.map_err(transport)?;
        if !response.status().is_success() {
            let message = rejection_message(response, LOGIN_FAILED).await;
            return Err(ClientError::Rejected(message));
        }
        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("login response: {e}")))?;
        if auth.token.is_empty() {
            return Err(ClientError::Decode(String::from("login response without token")));
        }
        info!(email = %form.email, role = %auth.user.role.as_str(), "signed in");
        Ok(auth)
    }

    /// `POST /api/auth/signup`. Success carries no session; the user signs
    /// in afterwards.
    pub async fn signup(&self, form: &SignupForm) -> Result<(), ClientError> {
        form.check()?;
        let url = self.endpoint(&["api", "auth", "signup"])?;
        let response = self.http.post(url).json(form).send().await.map_err(transport)?;
        if !response.status().is_success() {
            let message = rejection_message(response, SIGNUP_FAILED).await;
            return Err(ClientError::Rejected(message));
        }
        info!(email = %form.email, "account created");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // User administration
    // -----------------------------------------------------------------------

    /// `GET /api/users`.
    pub async fn list_users(&self, token: Option<&str>) -> Result<Vec<UserRecord>, ClientError> {
        let token = require_token(token)?;
        let url = self.endpoint(&["api", "users"])?;
        let response = self.http.get(url).bearer_auth(token).send().await.map_err(transport)?;
        let response = ensure_admin_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("user list: {e}")))
    }

    /// `DELETE /api/users/{id}`.
    pub async fn delete_user(&self, token: Option<&str>, id: &UserId) -> Result<(), ClientError> {
        let token = require_token(token)?;
        let url = self.endpoint(&["api", "users", id.as_str()])?;
        let response = self
            .http
            .delete(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        ensure_admin_success(response).await?;
        info!(%id, "user deleted");
        Ok(())
    }

    /// `PATCH /api/users/{id}/role` with `{"role":"admin"}`.
    pub async fn promote_user(&self, token: Option<&str>, id: &UserId) -> Result<(), ClientError> {
        let token = require_token(token)?;
        let url = self.endpoint(&["api", "users", id.as_str(), "role"])?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "role": "admin" }))
            .send()
            .await
            .map_err(transport)?;
        ensure_admin_success(response).await?;
        info!(%id, "user promoted to admin");
        Ok(())
    }
}

impl FeedBackend for ApiClient {
    async fn fetch_alerts(&self) -> Result<Vec<RawEvent>, BackendError> {
        self.list_alerts().await.map_err(BackendError::from)
    }

    async fn delete_alert(&self, id: &EventId, token: &str) -> Result<(), BackendError> {
        self.remove_alert(id, token).await.map_err(BackendError::from)
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

#[allow(clippy::needless_pass_by_value)]
fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

fn require_token(token: Option<&str>) -> Result<&str, ClientError> {
    match token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ClientError::NotAuthenticated),
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn ensure_admin_success(response: Response) -> Result<Response, ClientError> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::Unauthorized),
        _ => ensure_success(response).await,
    }
}

/// The body's `message`, or `fallback` when there is none.
async fn rejection_message(response: Response, fallback: &str) -> String {
    let status = response.status();
    let message = response
        .json::<ApiMessage>()
        .await
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.trim().is_empty());
    debug!(%status, has_message = message.is_some(), "request rejected");
    message.unwrap_or_else(|| fallback.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_path_prefix() {
        let client = ApiClient::new("https://example.org/dw/").ok();
        let url = client.and_then(|c| c.endpoint(&["api", "alerts"]).ok());
        assert_eq!(
            url.as_ref().map(Url::as_str),
            Some("https://example.org/dw/api/alerts")
        );
    }

    #[test]
    fn ids_stay_inside_one_segment() {
        let client = ApiClient::new("http://h:4000").ok();
        let url = |id: &str| {
            client
                .as_ref()
                .and_then(|c| c.endpoint(&["api", "alerts", id]).ok())
        };
        let cases = [
            ("../users/123", "/api/alerts/..%2Fusers%2F123"),
            ("a/b", "/api/alerts/a%2Fb"),
            ("a?x=1", "/api/alerts/a%3Fx=1"),
            ("a#b", "/api/alerts/a%23b"),
        ];
        for (id, path) in cases {
            let url = url(id);
            assert_eq!(url.as_ref().map(Url::path), Some(path), "{id:?}");
            assert_eq!(url.as_ref().and_then(Url::query), None);
            assert_eq!(url.as_ref().and_then(Url::fragment), None);
        }
    }

    #[test]
    fn dot_segments_are_refused() {
        let client = ApiClient::new("http://h:4000/").ok();
        for id in ["", " ", ".", ".."] {
            let result = client.as_ref().map(|c| c.endpoint(&["api", "users", id]));
            assert!(matches!(result, Some(Err(ClientError::InvalidId(_)))), "{id:?}");
        }
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(ApiClient::new("ftp://example.org").is_err());
        assert!(ApiClient::new("not a url").is_err());
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        assert!(matches!(require_token(Some("")), Err(ClientError::NotAuthenticated)));
        assert!(matches!(require_token(None), Err(ClientError::NotAuthenticated)));
        assert_eq!(require_token(Some("t")).ok(), Some("t"));
    }
}
