#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use felonyfit::error::AuthError;
use felonyfit::handlers::{Alert, AlertPresenter};
use felonyfit::models::{AuthChangeEvent, AuthEventKind, AuthState, Session, User};
use felonyfit::providers::{
    EventHub, IdentityProvider, PasswordCredentials, SignUpRequest, SignUpResponse, Subscription,
};
use felonyfit::session::AuthHandle;
use tokio::sync::oneshot;
use uuid::Uuid;

pub fn session_for(email: &str) -> Session {
    Session {
        access_token: format!("access-{email}"),
        token_type: "bearer".to_string(),
        expires_in: Some(3600),
        expires_at: None,
        refresh_token: format!("refresh-{email}"),
        user: User::new(Uuid::new_v4(), email),
    }
}

/// How the scripted provider answers the next sign-in / sign-up.
#[derive(Clone)]
pub enum Reply {
    Session(Session),
    /// Account created, email confirmation pending.
    Pending(User),
    Reject(u16, String),
    Unexpected,
    Panic,
    /// Never answers; the call stays in flight.
    Hang,
}

/// An in-process identity provider whose answers are set by the test.
pub struct ScriptedProvider {
    pub events: EventHub,
    initial: tokio::sync::Mutex<Option<oneshot::Receiver<Result<Option<Session>, AuthError>>>>,
    reply: Mutex<Reply>,
    pub sign_in_calls: AtomicUsize,
    pub sign_up_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

impl ScriptedProvider {
    /// The initial session check resolves when the returned sender is used.
    pub fn new() -> (Arc<Self>, oneshot::Sender<Result<Option<Session>, AuthError>>) {
        let (tx, rx) = oneshot::channel();
        let provider = Arc::new(Self {
            events: EventHub::default(),
            initial: tokio::sync::Mutex::new(Some(rx)),
            reply: Mutex::new(Reply::Unexpected),
            sign_in_calls: AtomicUsize::new(0),
            sign_up_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        });
        (provider, tx)
    }

    /// The initial session check resolves immediately with `session`.
    pub fn with_session(session: Option<Session>) -> Arc<Self> {
        let (provider, tx) = Self::new();
        let _ = tx.send(Ok(session));
        provider
    }

    pub fn reply_with(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    fn next_reply(&self) -> Reply {
        self.reply.lock().unwrap().clone()
    }
}

fn failure(reply: Reply) -> AuthError {
    match reply {
        Reply::Reject(status, message) => AuthError::Api { status, message },
        Reply::Panic => panic!("scripted provider panic"),
        _ => AuthError::Decode("scripted failure".to_string()),
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    fn get_name(&self) -> &str {
        "scripted"
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let rx = self.initial.lock().await.take();
        match rx {
            Some(rx) => rx.await.unwrap_or(Ok(None)),
            None => Ok(None),
        }
    }

    fn on_auth_state_change(&self) -> Subscription {
        self.events.subscribe()
    }

    async fn sign_in_with_password(
        &self,
        _credentials: &PasswordCredentials,
    ) -> Result<Session, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_reply() {
            Reply::Session(session) => {
                self.events.emit(AuthChangeEvent::new(
                    AuthEventKind::SignedIn,
                    Some(session.clone()),
                ));
                Ok(session)
            }
            Reply::Hang => std::future::pending().await,
            other => Err(failure(other)),
        }
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, AuthError> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_reply() {
            Reply::Session(mut session) => {
                session.user.user_metadata = request.data.clone();
                self.events.emit(AuthChangeEvent::new(
                    AuthEventKind::SignedIn,
                    Some(session.clone()),
                ));
                Ok(SignUpResponse {
                    user: Some(session.user.clone()),
                    session: Some(session),
                })
            }
            Reply::Pending(user) => Ok(SignUpResponse {
                user: Some(user),
                session: None,
            }),
            Reply::Hang => std::future::pending().await,
            other => Err(failure(other)),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.events.emit(AuthChangeEvent::signed_out());
        Ok(())
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        Err(AuthError::Api {
            status: 401,
            message: "Auth session missing!".to_string(),
        })
    }
}

/// Keeps every alert it is shown; dismissal is up to the test.
#[derive(Default)]
pub struct RecordingAlerts {
    shown: Mutex<Vec<Alert>>,
}

impl RecordingAlerts {
    pub fn alerts(&self) -> Vec<Alert> {
        self.shown.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Alert> {
        self.shown.lock().unwrap().last().cloned()
    }
}

impl AlertPresenter for RecordingAlerts {
    fn present(&self, alert: Alert) {
        self.shown.lock().unwrap().push(alert);
    }
}

/// Wait (bounded) until the handle publishes a state matching `pred`.
pub async fn wait_for_state(
    handle: &mut AuthHandle,
    pred: impl Fn(&AuthState) -> bool,
) -> AuthState {
    tokio::time::timeout(Duration::from_secs(5), async {
        let current = handle.current_and_mark_seen().expect("store alive");
        if pred(&current) {
            return current;
        }
        loop {
            let state = handle.changed().await.expect("store alive");
            if pred(&state) {
                return state;
            }
        }
    })
    .await
    .expect("state not reached in time")
}

/// Poll until `cond` holds, for state that is applied on another task.
pub async fn eventually(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time")
}
