use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::base::{IdentityProvider, PasswordCredentials, SignUpRequest, SignUpResponse};
use super::subscription::{EventHub, Subscription};
use crate::config::{AuthConfig, Credentials};
use crate::error::AuthError;
use crate::models::{AuthChangeEvent, AuthEventKind, Session, User};
use crate::storage::SessionStorage;
use crate::utils::log_throttle::LogThrottle;

const REFRESH_FAILURE_LOG_WINDOW: Duration = Duration::from_secs(300);
const REFRESH_FAILURE_KEY: &str = "providers.gotrue.refresh.failed";

/// The session held by the client, plus whether storage has been consulted yet.
#[derive(Default)]
struct SessionSlot {
    restored: bool,
    session: Option<Session>,
}

/// Client for the hosted auth service's GoTrue REST API.
///
/// All session mutations go through one async mutex, so a refresh token is
/// never spent twice by overlapping calls.
pub struct GoTrueProvider {
    name: String,
    credentials: Credentials,
    config: AuthConfig,
    http: reqwest::Client,
    storage: Arc<dyn SessionStorage>,
    slot: Mutex<SessionSlot>,
    events: EventHub,
    refresh_failures: LogThrottle,
}

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Pull a human-readable message out of a GoTrue error body. Different
/// endpoints and server versions use different keys.
fn error_message(body: &Value) -> Option<String> {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

async fn api_error(resp: Response) -> AuthError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .as_ref()
        .and_then(error_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        });
    AuthError::Api {
        status: status.as_u16(),
        message,
    }
}

impl GoTrueProvider {
    /// Creates a client for the service at `credentials.url`.
    pub fn new(
        credentials: Credentials,
        config: AuthConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, AuthError> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http = builder.build()?;

        info!(
            "Creating GoTrueProvider for '{}' (persist: {}, auto refresh: {})",
            credentials.url,
            storage.is_enabled(),
            config.auto_refresh_token
        );

        Ok(Self {
            name: "gotrue".to_string(),
            credentials,
            config,
            http,
            storage,
            slot: Mutex::new(SessionSlot::default()),
            events: EventHub::default(),
            refresh_failures: LogThrottle::new(REFRESH_FAILURE_LOG_WINDOW),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Number of change-notification subscriptions currently registered.
    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let url = format!("{}/auth/v1/{}", self.credentials.url, path);
        self.http
            .request(method, url)
            .header("apikey", &self.credentials.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.credentials.anon_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AuthError> {
        let resp = request.send().await?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(api_error(resp).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AuthError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))
    }

    /// Lock the slot, restoring the persisted session on first use.
    async fn slot(&self) -> MutexGuard<'_, SessionSlot> {
        let mut slot = self.slot.lock().await;
        if !slot.restored {
            slot.restored = true;
            match self.storage.load_session().await {
                Ok(Some(session)) => {
                    debug!("Restored persisted session for user {}", session.user.id);
                    slot.session = Some(session);
                }
                Ok(None) => {}
                Err(e) => warn!("Could not restore persisted session: {}", e),
            }
        }
        slot
    }

    /// Make `session` current, persist it and notify subscribers.
    async fn adopt(&self, slot: &mut SessionSlot, session: Session, kind: AuthEventKind) -> Session {
        let session = session.normalized(now());
        if let Err(e) = self.storage.save_session(&session).await {
            warn!("Could not persist session: {}", e);
        }
        slot.session = Some(session.clone());
        self.events.emit(AuthChangeEvent::new(kind, Some(session.clone())));
        session
    }

    /// Drop the current session everywhere and notify subscribers.
    async fn discard(&self, slot: &mut SessionSlot) {
        if let Err(e) = self.storage.clear_session().await {
            warn!("Could not clear persisted session: {}", e);
        }
        slot.session = None;
        self.events.emit(AuthChangeEvent::signed_out());
    }

    async fn refresh_locked(&self, slot: &mut SessionSlot) -> Result<Session, AuthError> {
        let refresh_token = match &slot.session {
            Some(session) => session.refresh_token.clone(),
            None => {
                return Err(AuthError::Api {
                    status: 401,
                    message: "Auth session missing!".to_string(),
                })
            }
        };

        debug!("Refreshing access token");
        let request = self
            .request(Method::POST, "token?grant_type=refresh_token", None)
            .json(&json!({ "refresh_token": refresh_token }));

        match self.send_json::<Session>(request).await {
            Ok(session) => {
                self.refresh_failures.reset(REFRESH_FAILURE_KEY);
                Ok(self.adopt(slot, session, AuthEventKind::TokenRefreshed).await)
            }
            Err(e) if e.is_client_rejection() => {
                // The refresh token is dead; the user has to log in again.
                info!("Refresh token rejected ({}); signing out", e);
                self.discard(slot).await;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Refresh the session if it expires within the configured margin.
    /// Used by the auto-refresh ticker; failures are logged, not returned.
    pub async fn refresh_if_expiring(&self) {
        let mut slot = self.slot().await;
        let expiring = slot
            .session
            .as_ref()
            .map(|s| s.expires_within(self.config.expiry_margin_secs, now()))
            .unwrap_or(false);
        if !expiring {
            return;
        }

        match self.refresh_locked(&mut slot).await {
            Ok(_) => {}
            Err(e) if e.is_client_rejection() => {}
            Err(e) => {
                if let Some(suppressed_count) = self.refresh_failures.should_emit(REFRESH_FAILURE_KEY) {
                    warn!(
                        event_name = REFRESH_FAILURE_KEY,
                        event_domain = "providers",
                        suppressed_count,
                        "auto refresh failed, will retry: {}",
                        e
                    );
                }
            }
        }
    }

    /// Spawn the background ticker that keeps the access token fresh. The
    /// ticker stops when the returned handle is dropped or the provider goes away.
    pub fn start_auto_refresh(self: &Arc<Self>) -> AutoRefresh {
        let token = CancellationToken::new();
        let provider: Weak<Self> = Arc::downgrade(self);
        let period = Duration::from_secs(self.config.refresh_tick_secs.max(1));
        let cancel = token.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(live) = provider.upgrade() else { break };
                        live.refresh_if_expiring().await;
                    }
                }
            }
            debug!("Auto refresh stopped");
        });

        AutoRefresh { token }
    }
}

/// Handle for the auto-refresh ticker; dropping it stops the ticker.
pub struct AutoRefresh {
    token: CancellationToken,
}

impl AutoRefresh {
    pub fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[async_trait]
impl IdentityProvider for GoTrueProvider {
    fn get_name(&self) -> &str {
        &self.name
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let mut slot = self.slot().await;
        let expiring = match &slot.session {
            None => return Ok(None),
            Some(s) => s.expires_within(self.config.expiry_margin_secs, now()),
        };
        if !expiring {
            return Ok(slot.session.clone());
        }

        match self.refresh_locked(&mut slot).await {
            Ok(session) => Ok(Some(session)),
            Err(e) if e.is_client_rejection() => Ok(None),
            Err(e) => {
                error!("Failed to refresh expiring session: {}", e);
                Err(e)
            }
        }
    }

    fn on_auth_state_change(&self) -> Subscription {
        self.events.subscribe()
    }

    async fn sign_in_with_password(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<Session, AuthError> {
        let mut slot = self.slot().await;
        debug!("Signing in '{}' with password", credentials.email);
        let request = self
            .request(Method::POST, "token?grant_type=password", None)
            .json(credentials);
        let session = self.send_json::<Session>(request).await?;
        info!("User {} signed in", session.user.id);
        Ok(self.adopt(&mut slot, session, AuthEventKind::SignedIn).await)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, AuthError> {
        let mut slot = self.slot().await;
        debug!("Signing up '{}'", request.email);
        let body: Value = self
            .send_json(self.request(Method::POST, "signup", None).json(request))
            .await?;

        // With autoconfirm the body is a session; otherwise it is the bare
        // user (older servers wrap it as {"user": ..., "session": null}).
        if body.get("access_token").is_some() {
            let session: Session =
                serde_json::from_value(body).map_err(|e| AuthError::Decode(e.to_string()))?;
            let session = self.adopt(&mut slot, session, AuthEventKind::SignedIn).await;
            return Ok(SignUpResponse {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        let user_value = match body.get("user") {
            Some(user) if !user.is_null() => user.clone(),
            _ => body,
        };
        let user: User =
            serde_json::from_value(user_value).map_err(|e| AuthError::Decode(e.to_string()))?;
        info!("User {} signed up; email confirmation pending", user.id);
        Ok(SignUpResponse {
            user: Some(user),
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut slot = self.slot().await;
        if let Some(session) = slot.session.clone() {
            let request = self.request(Method::POST, "logout", Some(&session.access_token));
            match self.send(request).await {
                Ok(_) => {}
                // The server already considers this session gone.
                Err(AuthError::Api { status, .. }) if matches!(status, 401 | 403 | 404) => {}
                Err(e) => return Err(e),
            }
            info!("User {} signed out", session.user.id);
        }
        self.discard(&mut slot).await;
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        let mut slot = self.slot().await;
        self.refresh_locked(&mut slot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file_storage::FileStorage;
    use crate::storage::no_storage::NoStorage;
    use mockito::{Matcher, Server};

    const USER_ID: &str = "6f1c8f5e-3c7a-4d43-9e2c-2b1f9a3c0d11";

    fn session_body(access: &str, refresh: &str, expires_in: i64) -> String {
        json!({
            "access_token": access,
            "token_type": "bearer",
            "expires_in": expires_in,
            "refresh_token": refresh,
            "user": {
                "id": USER_ID,
                "email": "rep@felony.fit",
                "user_metadata": {"first_name": "Max", "last_name": "Rep"}
            }
        })
        .to_string()
    }

    fn provider_with(url: String, storage: Arc<dyn SessionStorage>) -> GoTrueProvider {
        GoTrueProvider::new(
            Credentials {
                url,
                anon_key: "anon-key".to_string(),
            },
            AuthConfig::default(),
            storage,
        )
        .expect("client should build")
    }

    fn provider(url: String) -> GoTrueProvider {
        provider_with(url, Arc::new(NoStorage::new()))
    }

    fn credentials(password: &str) -> PasswordCredentials {
        PasswordCredentials {
            email: "rep@felony.fit".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn error_message_prefers_msg_then_description() {
        assert_eq!(
            error_message(&json!({"code": 400, "msg": "Invalid login credentials"})),
            Some("Invalid login credentials".to_string())
        );
        assert_eq!(
            error_message(&json!({"error": "invalid_grant", "error_description": "Invalid Refresh Token"})),
            Some("Invalid Refresh Token".to_string())
        );
        assert_eq!(error_message(&json!({"unrelated": true})), None);
    }

    #[tokio::test]
    async fn sign_in_sends_keys_and_emits_signed_in() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer anon-key")
            .match_body(Matcher::Json(json!({
                "email": "rep@felony.fit",
                "password": "hunter22"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(session_body("access-1", "refresh-1", 3600))
            .create_async()
            .await;

        let provider = provider(server.url());
        let mut events = provider.on_auth_state_change();

        let session = provider
            .sign_in_with_password(&credentials("hunter22"))
            .await
            .expect("sign in should succeed");
        m.assert_async().await;

        assert_eq!(session.access_token, "access-1");
        assert!(session.expires_at.is_some(), "expiry should be normalized");

        let event = events.next().await.expect("event expected");
        assert_eq!(event.kind, AuthEventKind::SignedIn);
        assert_eq!(event.session.map(|s| s.access_token), Some("access-1".to_string()));

        let current = provider.get_session().await.unwrap();
        assert_eq!(current.map(|s| s.refresh_token), Some("refresh-1".to_string()));
    }

    #[tokio::test]
    async fn sign_in_failure_surfaces_provider_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#)
            .create_async()
            .await;

        let provider = provider(server.url());
        let err = provider
            .sign_in_with_password(&credentials("wrong"))
            .await
            .unwrap_err();

        match err {
            AuthError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid login credentials");
            }
            other => panic!("expected api error, got {other:?}"),
        }
        assert!(provider.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn error_without_json_body_uses_status_text() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("upstream down")
            .create_async()
            .await;

        let err = provider(server.url())
            .sign_in_with_password(&credentials("hunter22"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Service Unavailable");
    }

    #[tokio::test]
    async fn sign_up_without_session_requires_confirmation() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth/v1/signup")
            .match_body(Matcher::Json(json!({
                "email": "new@felony.fit",
                "password": "hunter22",
                "data": {"first_name": "Max", "last_name": "Rep"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": USER_ID,
                    "email": "new@felony.fit",
                    "user_metadata": {"first_name": "Max", "last_name": "Rep"},
                    "confirmation_sent_at": "2024-03-01T10:00:00Z"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = provider(server.url());
        let mut data = serde_json::Map::new();
        data.insert("first_name".to_string(), json!("Max"));
        data.insert("last_name".to_string(), json!("Rep"));
        let response = provider
            .sign_up(&SignUpRequest {
                email: "new@felony.fit".to_string(),
                password: "hunter22".to_string(),
                data,
            })
            .await
            .expect("sign up should succeed");
        m.assert_async().await;

        assert!(response.requires_confirmation());
        assert_eq!(response.user.unwrap().first_name(), Some("Max"));
        assert!(provider.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_up_with_session_signs_in() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/v1/signup")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(session_body("access-new", "refresh-new", 3600))
            .create_async()
            .await;

        let provider = provider(server.url());
        let mut events = provider.on_auth_state_change();
        let response = provider
            .sign_up(&SignUpRequest {
                email: "rep@felony.fit".to_string(),
                password: "hunter22".to_string(),
                data: serde_json::Map::new(),
            })
            .await
            .unwrap();

        assert!(!response.requires_confirmation());
        assert!(response.session.is_some());
        assert_eq!(events.next().await.unwrap().kind, AuthEventKind::SignedIn);
    }

    #[tokio::test]
    async fn expiring_session_is_refreshed_on_get() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .with_status(200)
            .with_body(session_body("access-old", "refresh-old", 10))
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()))
            .match_body(Matcher::Json(json!({"refresh_token": "refresh-old"})))
            .with_status(200)
            .with_body(session_body("access-new", "refresh-new", 3600))
            .create_async()
            .await;

        let provider = provider(server.url());
        provider
            .sign_in_with_password(&credentials("hunter22"))
            .await
            .unwrap();
        let mut events = provider.on_auth_state_change();

        let session = provider.get_session().await.unwrap().unwrap();
        refresh.assert_async().await;
        assert_eq!(session.access_token, "access-new");
        assert_eq!(events.next().await.unwrap().kind, AuthEventKind::TokenRefreshed);
    }

    #[tokio::test]
    async fn rejected_refresh_signs_out() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "password".into()))
            .with_status(200)
            .with_body(session_body("access-old", "refresh-old", 10))
            .create_async()
            .await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()))
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token: Already Used"}"#)
            .create_async()
            .await;

        let provider = provider(server.url());
        provider
            .sign_in_with_password(&credentials("hunter22"))
            .await
            .unwrap();
        let mut events = provider.on_auth_state_change();

        assert!(provider.get_session().await.unwrap().is_none());
        assert_eq!(events.next().await.unwrap().kind, AuthEventKind::SignedOut);
    }

    #[tokio::test]
    async fn sign_out_tolerates_unknown_session() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(session_body("access-1", "refresh-1", 3600))
            .create_async()
            .await;
        let logout = server
            .mock("POST", "/auth/v1/logout")
            .match_header("authorization", "Bearer access-1")
            .with_status(404)
            .with_body(r#"{"msg":"Session not found"}"#)
            .create_async()
            .await;

        let provider = provider(server.url());
        provider
            .sign_in_with_password(&credentials("hunter22"))
            .await
            .unwrap();
        let mut events = provider.on_auth_state_change();

        provider.sign_out().await.expect("sign out should succeed");
        logout.assert_async().await;
        assert_eq!(events.next().await.unwrap().kind, AuthEventKind::SignedOut);
        assert!(provider.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_out_server_error_keeps_session() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(session_body("access-1", "refresh-1", 3600))
            .create_async()
            .await;
        server
            .mock("POST", "/auth/v1/logout")
            .with_status(500)
            .create_async()
            .await;

        let provider = provider(server.url());
        provider
            .sign_in_with_password(&credentials("hunter22"))
            .await
            .unwrap();

        assert!(provider.sign_out().await.is_err());
        assert!(provider.get_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn persisted_session_survives_new_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/v1/token")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(session_body("access-1", "refresh-1", 3600))
            .create_async()
            .await;

        let first = provider_with(server.url(), Arc::new(FileStorage::new(&path)));
        first
            .sign_in_with_password(&credentials("hunter22"))
            .await
            .unwrap();
        drop(first);

        let second = provider_with(server.url(), Arc::new(FileStorage::new(&path)));
        let restored = second.get_session().await.unwrap();
        assert_eq!(restored.map(|s| s.access_token), Some("access-1".to_string()));
    }

    #[tokio::test]
    async fn refresh_without_session_is_rejected() {
        let server = Server::new_async().await;
        let err = provider(server.url()).refresh_session().await.unwrap_err();
        assert!(err.is_client_rejection());
        assert_eq!(err.to_string(), "Auth session missing!");
    }

    #[tokio::test]
    async fn auto_refresh_stops_when_handle_dropped() {
        let server = Server::new_async().await;
        let provider = Arc::new(provider(server.url()));
        let handle = provider.start_auto_refresh();
        handle.stop();
        drop(handle);
        // Nothing to refresh and the ticker is stopped; the provider is
        // still usable afterwards.
        assert!(provider.get_session().await.unwrap().is_none());
        assert_eq!(provider.listener_count(), 0);
    }
}
