use crate::models::{CheckMeta, ClientInfo, PersistedCheck, PersistedVisit, ScoreRecord, SelectionSet};
use crate::session::Session;
use crate::store::{Collection, DocumentStore, StoreError};

// Failures are logged and leave the session unmarked for a retry.
pub async fn record_visit(
    store: &dyn DocumentStore,
    session: &mut Session,
    client: &ClientInfo,
) -> Option<String> {
    if session.visit_recorded() {
        tracing::debug!(session = session.id(), "visit already tracked");
        return None;
    }

    let visit = PersistedVisit::new(session.id(), client);
    match insert(store, Collection::Visits, &visit).await {
        Ok(id) => {
            session.mark_visit_recorded();
            tracing::info!(
                session = session.id(),
                started_at = %session.started_at(),
                record = %id,
                "visit tracked"
            );
            Some(id)
        }
        Err(err) => {
            tracing::error!(session = session.id(), error = %err, "failed to track visit");
            None
        }
    }
}

pub async fn record_check(
    store: &dyn DocumentStore,
    session: &Session,
    selection: &SelectionSet,
    record: &ScoreRecord,
    meta: &CheckMeta,
) -> Option<String> {
    let check = PersistedCheck::new(session.id(), selection, record, meta);
    match insert(store, Collection::SymptomChecks, &check).await {
        Ok(id) => {
            tracing::info!(
                session = session.id(),
                record = %id,
                symptoms = check.symptom_count,
                top = check.top_deficiency.as_deref().unwrap_or("none"),
                "symptom check saved"
            );
            Some(id)
        }
        Err(err) => {
            tracing::error!(session = session.id(), error = %err, "failed to save symptom check");
            None
        }
    }
}

async fn insert<T: serde::Serialize>(
    store: &dyn DocumentStore,
    collection: Collection,
    document: &T,
) -> Result<String, StoreError> {
    let value = serde_json::to_value(document)?;
    store.insert(collection, value).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WeightTable;
    use crate::models::DeviceClass;
    use crate::risk;
    use crate::store::memory::{MemoryStore, OfflineStore};

    fn client() -> ClientInfo {
        ClientInfo {
            user_agent: "Mozilla/5.0 (Linux; Android 14) Mobile".to_string(),
            platform: "Linux armv81".to_string(),
            language: "en-US".to_string(),
            screen_resolution: "412x915".to_string(),
        }
    }

    #[tokio::test]
    async fn visit_is_recorded_once_per_session() {
        let store = MemoryStore::default();
        let mut session = Session::start();

        assert!(record_visit(&store, &mut session, &client()).await.is_some());
        assert!(record_visit(&store, &mut session, &client()).await.is_none());
        assert_eq!(store.len(Collection::Visits), 1);

        let stored = store.list_all(Collection::Visits).await.unwrap();
        assert_eq!(stored[0]["sessionId"], session.id());
        assert_eq!(stored[0]["isMobile"], true);
        assert!(stored[0]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn failed_visit_leaves_session_unmarked() {
        let mut session = Session::start();
        assert!(record_visit(&OfflineStore, &mut session, &client()).await.is_none());
        assert!(!session.visit_recorded());
    }

    #[tokio::test]
    async fn repeated_checks_are_all_kept() {
        let store = MemoryStore::default();
        let session = Session::start();
        let table = WeightTable::builtin().unwrap();
        let selection = SelectionSet::parse_list("bleeding_gums");
        let record = risk::analyze(&selection, &table);
        let meta = CheckMeta {
            device: DeviceClass::Desktop,
            page_duration_secs: 30,
        };

        record_check(&store, &session, &selection, &record, &meta).await;
        record_check(&store, &session, &selection, &record, &meta).await;
        assert_eq!(store.len(Collection::SymptomChecks), 2);

        let stored = store.list_all(Collection::SymptomChecks).await.unwrap();
        assert_eq!(stored[0]["results"][0]["name"], "Vitamin C");
        assert_eq!(stored[0]["results"][0]["score"], 10);
        assert_eq!(stored[0]["top_deficiency"], "Vitamin C");
    }

    #[tokio::test]
    async fn failed_check_write_is_swallowed() {
        let session = Session::start();
        let meta = CheckMeta {
            device: DeviceClass::Mobile,
            page_duration_secs: 5,
        };
        let saved = record_check(
            &OfflineStore,
            &session,
            &SelectionSet::parse_list("constipation"),
            &ScoreRecord::default(),
            &meta,
        )
        .await;
        assert!(saved.is_none());
    }
}
