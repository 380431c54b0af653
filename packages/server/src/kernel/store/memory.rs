use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::StoreError;
use crate::kernel::{BaseStore, StoreModifier};

/// Process-local store. Contents are lost on restart, so this is only a cache or a
/// test double, never the source of truth for a deployment.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn modify(&self, key: &str, f: StoreModifier<'_>) -> Result<Value, StoreError> {
        // Write lock held for the whole update
        let mut values = self.values.write().await;
        let next = f(values.get(key).cloned())?;
        values.insert(key.to_string(), next.clone());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        assert!(store.get("matches").await.unwrap().is_none());

        store
            .set("matches", serde_json::json!([1, 2]))
            .await
            .unwrap();
        assert_eq!(
            store.get("matches").await.unwrap(),
            Some(serde_json::json!([1, 2]))
        );
        assert!(store.get("history").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_modify_leaves_value_untouched() {
        let store = MemoryStore::new();
        store.set("matches", serde_json::json!([1])).await.unwrap();

        let result = store
            .modify("matches", &mut |_| Err(StoreError::Backend("boom".into())))
            .await;
        assert!(result.is_err());
        assert_eq!(
            store.get("matches").await.unwrap(),
            Some(serde_json::json!([1]))
        );
    }

    #[tokio::test]
    async fn concurrent_modifies_do_not_lose_updates() {
        let store = MemoryStore::new();
        store.set("counter", serde_json::json!(0)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .modify("counter", &mut |current| {
                        let n = current.and_then(|v| v.as_i64()).unwrap_or(0);
                        Ok(serde_json::json!(n + 1))
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(
            store.get("counter").await.unwrap(),
            Some(serde_json::json!(20))
        );
    }
}
