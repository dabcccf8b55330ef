//! User-facing error notifications

use std::sync::Arc;

use crate::store::{ChangeKind, JsonCodec, MemoryStorage, Persisted, StoreError, SubscriberId};

const ERRORS_KEY: &str = "errors";

/// Observable list of error messages awaiting acknowledgement
pub struct ErrorQueue {
    messages: Persisted<Vec<String>, JsonCodec<Vec<String>>>,
}

impl ErrorQueue {
    pub fn new() -> Result<Self, StoreError> {
        let messages = Persisted::open_or(
            ERRORS_KEY,
            Arc::new(MemoryStorage::new()),
            JsonCodec::new(),
            Vec::new(),
        )?;
        Ok(Self { messages })
    }

    pub fn add(&self, message: impl Into<String>) -> Result<(), StoreError> {
        let message = message.into();
        tracing::debug!("Queued error: {}", message);

        self.messages.update(|list| {
            let mut list = list.cloned().unwrap_or_default();
            list.push(message);
            list
        })
    }

    /// Acknowledge the message at `index`, returning it
    pub fn remove(&self, index: usize) -> Result<Option<String>, StoreError> {
        self.messages.update_with(|list| {
            let mut list = list.cloned().unwrap_or_default();
            if index >= list.len() {
                return None;
            }
            let removed = list.remove(index);
            Some((list, removed))
        })
    }

    pub fn list(&self) -> Vec<String> {
        self.messages.get().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    pub fn subscribe<F>(&self, run: F) -> SubscriberId
    where
        F: Fn(Option<&Vec<String>>, ChangeKind) + Send + Sync + 'static,
    {
        self.messages.subscribe(run)
    }

    pub fn unsubscribe(&self, id: &SubscriberId) -> bool {
        self.messages.unsubscribe(id)
    }

    pub(crate) fn clear_subscribers(&self) {
        self.messages.clear_subscribers();
    }
}
