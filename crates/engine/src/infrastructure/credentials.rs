//! In-memory credential store, optionally seeded from the environment.

use std::sync::RwLock;

use crate::infrastructure::ports::CredentialPort;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    key: RwLock<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: RwLock::new(key.and_then(normalize)),
        }
    }

    /// Seed from `MYTHICBOT_API_KEY`, then `GEMINI_API_KEY`.
    pub fn from_env() -> Self {
        let key = std::env::var("MYTHICBOT_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok();
        Self::new(key)
    }
}

fn normalize(key: String) -> Option<String> {
    let trimmed = key.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl CredentialPort for InMemoryCredentialStore {
    fn has_credential(&self) -> bool {
        self.get_credential().is_some()
    }

    fn get_credential(&self) -> Option<String> {
        self.key.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_credential(&self, credential: String) {
        *self.key.write().unwrap_or_else(|e| e.into_inner()) = normalize(credential);
    }

    fn clear_credential(&self) {
        *self.key.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_counts_as_missing() {
        let store = InMemoryCredentialStore::new(Some("   ".into()));
        assert!(!store.has_credential());
    }

    #[test]
    fn test_set_and_clear() {
        let store = InMemoryCredentialStore::default();
        store.set_credential(" AIzaSyExample ".into());
        assert_eq!(store.get_credential().as_deref(), Some("AIzaSyExample"));
        store.clear_credential();
        assert!(store.get_credential().is_none());
    }
}
