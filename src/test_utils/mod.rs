#![allow(missing_docs)]

use std::{
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::Router;

use crate::{
    entity::EntityId,
    error::{CacheError, NetworkError},
    gateway::Gateway,
    models::Pincode,
    storage::{KeyValueStorage, MemoryStorage},
};

pub(crate) fn pincode(id: i64, office_name: &str, code: &str) -> Pincode {
    Pincode {
        id: Some(EntityId::Int(id)),
        office_name: office_name.to_owned(),
        pincode: code.to_owned(),
        district_name: "Mumbai Suburban".to_owned(),
        taluk: "Andheri".to_owned(),
        state_name: "Maharashtra".to_owned(),
        city: "Mumbai".to_owned(),
    }
}

pub(crate) fn new_pincode(office_name: &str, code: &str) -> Pincode {
    Pincode {
        id: None,
        ..pincode(0, office_name, code)
    }
}

/// A gateway that returns a canned response and counts how often it was called.
pub(crate) struct FakeGateway<E> {
    response: Mutex<Result<Vec<E>, NetworkError>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl<E: Clone> FakeGateway<E> {
    pub(crate) fn returning(entities: Vec<E>) -> Self {
        Self {
            response: Mutex::new(Ok(entities)),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            response: Mutex::new(Err(NetworkError::Transport {
                url: "http://localhost/fake".to_owned(),
                reason: "connection refused".to_owned(),
            })),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn respond_with(&self, response: Result<Vec<E>, NetworkError>) {
        *self.response.lock().unwrap() = response;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: Clone + Send + Sync> Gateway<E> for FakeGateway<E> {
    async fn fetch_all(&self) -> Result<Vec<E>, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.response.lock().unwrap().clone()
    }
}

/// A memory storage whose writes can be made to fail.
#[derive(Default)]
pub(crate) struct FlakyStorage {
    inner: MemoryStorage,
    fail_writes: AtomicBool,
}

impl FlakyStorage {
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KeyValueStorage for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::QuotaExceeded {
                key: key.to_owned(),
                required: key.len() + value.len(),
                quota: 0,
            });
        }

        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.inner.remove(key)
    }
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub(crate) async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Could not bind test listener");
    let address = listener.local_addr().expect("Could not get local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    format!("http://{address}")
}
