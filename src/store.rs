use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Visits,
    SymptomChecks,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Visits => "visits",
            Collection::SymptomChecks => "symptom_checks",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("document could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

// Append-only. `list_all` documents carry the server-assigned `timestamp`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: Collection, document: Value) -> Result<String, StoreError>;
    async fn list_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError>;
}

pub fn stamp(mut document: Value, timestamp: chrono::DateTime<chrono::Utc>) -> Value {
    if let Value::Object(fields) = &mut document {
        fields.insert(
            "timestamp".to_string(),
            Value::String(timestamp.to_rfc3339()),
        );
    }
    document
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        collections: Mutex<HashMap<Collection, Vec<Value>>>,
    }

    impl MemoryStore {
        pub fn len(&self, collection: Collection) -> usize {
            self.collections
                .lock()
                .unwrap()
                .get(&collection)
                .map_or(0, Vec::len)
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn insert(&self, collection: Collection, document: Value) -> Result<String, StoreError> {
            let mut collections = self.collections.lock().unwrap();
            collections
                .entry(collection)
                .or_default()
                .push(stamp(document, Utc::now()));
            Ok(Uuid::new_v4().to_string())
        }

        async fn list_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
            let collections = self.collections.lock().unwrap();
            Ok(collections.get(&collection).cloned().unwrap_or_default())
        }
    }

    pub struct OfflineStore;

    #[async_trait]
    impl DocumentStore for OfflineStore {
        async fn insert(&self, _: Collection, _: Value) -> Result<String, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn list_all(&self, _: Collection) -> Result<Vec<Value>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }
}
