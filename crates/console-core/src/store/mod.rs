//! Persisted reactive stores
//!
//! A [`Persisted`] cell holds one optional value under a storage key,
//! mirrors every change into its [`Storage`] backend and notifies its
//! subscribers synchronously, in registration order.

mod backend;
mod codec;

pub use backend::{FileStorage, MemoryStorage, Storage};
pub use codec::{Codec, JsonCodec, StringCodec};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Store error type
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Corrupt storage document: {0}")]
    Corrupt(String),

    #[error("Subscriber already registered: {0}")]
    AlreadySubscribed(SubscriberId),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Codec(e.to_string())
    }
}

/// What happened to a cell, as seen by a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Replay of the current value on subscription
    Initial,
    /// A value was set where there was none
    Create,
    /// An existing value was replaced
    Update,
    /// The value was removed
    Remove,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Initial => write!(f, "initial"),
            ChangeKind::Create => write!(f, "create"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Remove => write!(f, "remove"),
        }
    }
}

/// Subscriber identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub String);

impl SubscriberId {
    pub fn new() -> Self {
        Self(format!("subscriber:{}", Uuid::new_v4()))
    }
}

impl From<&str> for SubscriberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscriber callback: the value after the change (None once removed)
pub type Callback<V> = Arc<dyn Fn(Option<&V>, ChangeKind) + Send + Sync>;

struct Cell<V> {
    value: Option<V>,
    subscribers: Vec<(SubscriberId, Callback<V>)>,
}

/// Observable value persisted under a storage key
pub struct Persisted<V, C> {
    key: String,
    storage: Arc<dyn Storage>,
    codec: C,
    cell: Mutex<Cell<V>>,
}

/// String cell, the common case for credentials and navigation
pub type StringStore = Persisted<String, StringCodec>;

impl<V, C> Persisted<V, C>
where
    V: Clone,
    C: Codec<V>,
{
    /// Open the cell, reading its initial value from storage.
    ///
    /// A stored value that no longer decodes is treated as absent.
    pub fn open(
        key: impl Into<String>,
        storage: Arc<dyn Storage>,
        codec: C,
    ) -> Result<Self, StoreError> {
        let key = key.into();
        let value = match storage.get(&key)? {
            Some(raw) => match codec.decode(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Discarding undecodable value for {}: {}", key, e);
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            key,
            storage,
            codec,
            cell: Mutex::new(Cell {
                value,
                subscribers: Vec::new(),
            }),
        })
    }

    /// Open the cell, persisting `default` when storage has no value yet
    pub fn open_or(
        key: impl Into<String>,
        storage: Arc<dyn Storage>,
        codec: C,
        default: V,
    ) -> Result<Self, StoreError> {
        let store = Self::open(key, storage, codec)?;
        {
            let mut cell = store.cell.lock();
            if cell.value.is_none() {
                let raw = store.codec.encode(&default)?;
                store.storage.set(&store.key, &raw)?;
                cell.value = Some(default);
            }
        }
        Ok(store)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> Option<V> {
        self.cell.lock().value.clone()
    }

    /// Persist `value` and notify every subscriber
    pub fn set(&self, value: V) -> Result<(), StoreError> {
        let raw = self.codec.encode(&value)?;

        let (kind, subscribers) = {
            let mut cell = self.cell.lock();
            self.storage.set(&self.key, &raw)?;
            let kind = if cell.value.is_some() {
                ChangeKind::Update
            } else {
                ChangeKind::Create
            };
            cell.value = Some(value.clone());
            (kind, cell.subscribers.clone())
        };

        tracing::debug!(key = %self.key, %kind, subscribers = subscribers.len(), "store set");
        for (_, run) in &subscribers {
            run(Some(&value), kind);
        }
        Ok(())
    }

    /// Compute the next value from the current one and set it
    pub fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(Option<&V>) -> V,
    {
        self.update_with(|current| Some((f(current), ()))).map(|_| ())
    }

    /// Read-modify-write under the cell lock.
    ///
    /// `f` returns the next value and a result, or `None` to leave the cell
    /// untouched. Subscribers are notified after the lock is released.
    pub fn update_with<F, R>(&self, f: F) -> Result<Option<R>, StoreError>
    where
        F: FnOnce(Option<&V>) -> Option<(V, R)>,
    {
        let (value, kind, out, subscribers) = {
            let mut cell = self.cell.lock();
            let Some((value, out)) = f(cell.value.as_ref()) else {
                return Ok(None);
            };
            let raw = self.codec.encode(&value)?;
            self.storage.set(&self.key, &raw)?;
            let kind = if cell.value.is_some() {
                ChangeKind::Update
            } else {
                ChangeKind::Create
            };
            cell.value = Some(value.clone());
            (value, kind, out, cell.subscribers.clone())
        };

        tracing::debug!(key = %self.key, %kind, subscribers = subscribers.len(), "store update");
        for (_, run) in &subscribers {
            run(Some(&value), kind);
        }
        Ok(Some(out))
    }

    /// Remove the value from storage and notify every subscriber
    pub fn remove(&self) -> Result<(), StoreError> {
        let subscribers = {
            let mut cell = self.cell.lock();
            self.storage.remove(&self.key)?;
            cell.value = None;
            cell.subscribers.clone()
        };

        tracing::debug!(key = %self.key, subscribers = subscribers.len(), "store remove");
        for (_, run) in &subscribers {
            run(None, ChangeKind::Remove);
        }
        Ok(())
    }

    /// Register `run` under a fresh id and replay the current value to it
    pub fn subscribe<F>(&self, run: F) -> SubscriberId
    where
        F: Fn(Option<&V>, ChangeKind) + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        let callback: Callback<V> = Arc::new(run);
        let current = {
            let mut cell = self.cell.lock();
            cell.subscribers.push((id.clone(), callback.clone()));
            cell.value.clone()
        };
        callback(current.as_ref(), ChangeKind::Initial);
        id
    }

    /// Register `run` under an explicit id and replay the current value.
    ///
    /// An id can only be registered once; a second registration is
    /// rejected without replay.
    pub fn subscribe_with_id<F>(&self, id: SubscriberId, run: F) -> Result<(), StoreError>
    where
        F: Fn(Option<&V>, ChangeKind) + Send + Sync + 'static,
    {
        let callback: Callback<V> = Arc::new(run);
        let current = {
            let mut cell = self.cell.lock();
            if cell.subscribers.iter().any(|(existing, _)| *existing == id) {
                tracing::warn!("Subscriber {} already subscribed to {}", id, self.key);
                return Err(StoreError::AlreadySubscribed(id));
            }
            cell.subscribers.push((id, callback.clone()));
            cell.value.clone()
        };
        callback(current.as_ref(), ChangeKind::Initial);
        Ok(())
    }

    /// Deregister a subscriber, returning whether it was registered
    pub fn unsubscribe(&self, id: &SubscriberId) -> bool {
        let mut cell = self.cell.lock();
        let before = cell.subscribers.len();
        cell.subscribers.retain(|(existing, _)| existing != id);
        let removed = cell.subscribers.len() != before;
        if !removed {
            tracing::warn!("Subscriber {} not subscribed to {}", id, self.key);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.cell.lock().subscribers.len()
    }

    /// Drop all subscriptions without touching the value
    pub fn clear_subscribers(&self) {
        self.cell.lock().subscribers.clear();
    }
}

impl<V, C> std::fmt::Debug for Persisted<V, C>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cell = self.cell.lock();
        f.debug_struct("Persisted")
            .field("key", &self.key)
            .field("value", &cell.value)
            .field("subscribers", &cell.subscribers.len())
            .finish()
    }
}
