//! Credential-bound model handle.
//!
//! Owns the primary model client built for the current API key. The session
//! layer passes it to use cases by reference; re-initialising with the same
//! key is a no-op, a new key swaps the client.

use std::sync::{Arc, RwLock};

use crate::infrastructure::ports::LlmPort;

/// Builds a model client for an API key.
pub type LlmFactory = Arc<dyn Fn(&str) -> Arc<dyn LlmPort> + Send + Sync>;

struct BoundModel {
    credential: String,
    client: Arc<dyn LlmPort>,
}

pub struct ModelHandle {
    factory: LlmFactory,
    bound: RwLock<Option<BoundModel>>,
}

impl ModelHandle {
    pub fn new(factory: LlmFactory) -> Self {
        Self {
            factory,
            bound: RwLock::new(None),
        }
    }

    /// Bind the handle to `credential`. Returns true when a new client was built.
    pub fn initialize(&self, credential: &str) -> bool {
        {
            let bound = self.bound.read().unwrap_or_else(|e| e.into_inner());
            if bound.as_ref().is_some_and(|b| b.credential == credential) {
                return false;
            }
        }

        let mut bound = self.bound.write().unwrap_or_else(|e| e.into_inner());
        // Another caller may have bound the same key between the two locks
        if bound.as_ref().is_some_and(|b| b.credential == credential) {
            return false;
        }

        *bound = Some(BoundModel {
            credential: credential.to_string(),
            client: (self.factory)(credential),
        });
        tracing::info!("Primary model initialized for new credential");
        true
    }

    /// Drop the bound client, e.g. after the key is cleared.
    pub fn reset(&self) {
        let mut bound = self.bound.write().unwrap_or_else(|e| e.into_inner());
        if bound.take().is_some() {
            tracing::info!("Primary model handle reset");
        }
    }

    pub fn current(&self) -> Option<Arc<dyn LlmPort>> {
        self.bound
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|b| Arc::clone(&b.client))
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }
}
