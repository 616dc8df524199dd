//! Test doubles shared by the unit tests of this crate.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use storekeeper_domain::{
    AuthError, AuthSession, PendingRequest, ResponseSpec, SignupRequest, TokenPair, UserIdentity,
};
use tokio::sync::Notify;

use crate::auth::AuthApi;
use crate::ports::{HttpTransport, SecureKeyValueStore, StorageError, TransportError};

/// In-memory secure store with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
    next_read_error: Mutex<Option<StorageError>>,
    writes: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryStore {
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::default();
        *store.entries.lock().unwrap() = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        store
    }

    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_next_read(&self, error: StorageError) {
        *self.next_read_error.lock().unwrap() = Some(error);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only file system",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SecureKeyValueStore for MemoryStore {
    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if let Some(error) = self.next_read_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.entries())
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        self.check_writable()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.entries.lock().unwrap() = entries.clone();
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        self.check_writable()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

type Handler = dyn Fn(&PendingRequest) -> Result<ResponseSpec, TransportError> + Send + Sync;

/// Transport answering from a closure and recording every request.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<PendingRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&PendingRequest) -> Result<ResponseSpec, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers 200 when the bearer token is one of `valid`, 401 otherwise.
    pub fn accepting(valid: &[&str]) -> Self {
        let valid: Vec<String> = valid.iter().map(|t| (*t).to_string()).collect();
        Self::new(move |request| match request.bearer_token() {
            Some(token) if valid.iter().any(|v| v == token) => {
                Ok(ResponseSpec::new(200, format!(r#"{{"token":"{token}"}}"#)))
            }
            _ => Ok(ResponseSpec::new(401, "Unauthorized")),
        })
    }

    pub fn requests(&self) -> Vec<PendingRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn bearer_tokens(&self) -> Vec<Option<String>> {
        self.requests()
            .iter()
            .map(|r| r.bearer_token().map(String::from))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: &PendingRequest) -> Result<ResponseSpec, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        (self.handler)(request)
    }
}

/// How [`FakeAuth::refresh`] behaves.
#[derive(Clone)]
pub enum RefreshBehaviour {
    Succeed(TokenPair),
    Fail(AuthError),
    Hang,
}

/// Scriptable [`AuthApi`] counting refresh calls.
pub struct FakeAuth {
    refresh: Mutex<RefreshBehaviour>,
    delay: Duration,
    gate: Option<Arc<Notify>>,
    refresh_calls: AtomicUsize,
    refresh_tokens: Mutex<Vec<String>>,
    login_result: Mutex<Result<AuthSession, AuthError>>,
    logout_result: Mutex<Result<(), AuthError>>,
    logout_tokens: Mutex<Vec<Option<String>>>,
}

impl FakeAuth {
    pub fn new(refresh: RefreshBehaviour) -> Self {
        Self {
            refresh: Mutex::new(refresh),
            delay: Duration::ZERO,
            gate: None,
            refresh_calls: AtomicUsize::new(0),
            refresh_tokens: Mutex::new(Vec::new()),
            login_result: Mutex::new(Ok(session("A1", Some("R1")))),
            logout_result: Mutex::new(Ok(())),
            logout_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn refreshing_to(access: &str, refresh: Option<&str>) -> Self {
        Self::new(RefreshBehaviour::Succeed(TokenPair::new(
            access,
            refresh.map(String::from),
        )))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Refresh waits until the gate is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_login_result(&self, result: Result<AuthSession, AuthError>) {
        *self.login_result.lock().unwrap() = result;
    }

    pub fn set_logout_result(&self, result: Result<(), AuthError>) {
        *self.logout_result.lock().unwrap() = result;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_tokens(&self) -> Vec<String> {
        self.refresh_tokens.lock().unwrap().clone()
    }

    pub fn logout_tokens(&self) -> Vec<Option<String>> {
        self.logout_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn login(&self, _identifier: &str, _password: &str) -> Result<AuthSession, AuthError> {
        self.login_result.lock().unwrap().clone()
    }

    async fn register(&self, _request: &SignupRequest) -> Result<AuthSession, AuthError> {
        self.login_result.lock().unwrap().clone()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens
            .lock()
            .unwrap()
            .push(refresh_token.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let behaviour = self.refresh.lock().unwrap().clone();
        match behaviour {
            RefreshBehaviour::Succeed(pair) => Ok(pair),
            RefreshBehaviour::Fail(error) => Err(error),
            RefreshBehaviour::Hang => std::future::pending().await,
        }
    }

    async fn logout(&self, access_token: Option<&str>) -> Result<(), AuthError> {
        self.logout_tokens
            .lock()
            .unwrap()
            .push(access_token.map(String::from));
        self.logout_result.lock().unwrap().clone()
    }
}

pub fn alice() -> UserIdentity {
    UserIdentity::new("u1", Some("A".to_string()), Some("L".to_string()))
}

pub fn session(access: &str, refresh: Option<&str>) -> AuthSession {
    AuthSession {
        tokens: TokenPair::new(access, refresh.map(String::from)),
        identity: alice(),
        login: Some("alice@example.com".to_string()),
        email: Some("alice@example.com".to_string()),
        role: None,
    }
}
