use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::catalog::WeightTable;
use crate::models::{CheckMeta, ClientInfo, DeviceClass, PersistedCheck, PersistedVisit, SelectionSet};
use crate::risk;
use crate::store::{stamp, Collection, DocumentStore, StoreError};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ON CONFLICT keeps seed and import reruns idempotent.
    pub async fn insert_keyed(
        &self,
        collection: Collection,
        source_key: &str,
        document: Value,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO vitaguide.documents (id, collection, body, source_key)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(collection.name())
        .bind(Json(document))
        .bind(source_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert(&self, collection: Collection, document: Value) -> Result<String, StoreError> {
        let id: Uuid = sqlx::query(
            r#"
            INSERT INTO vitaguide.documents (id, collection, body)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(collection.name())
        .bind(Json(document))
        .fetch_one(&self.pool)
        .await?
        .get("id");

        Ok(id.to_string())
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query(
            "SELECT body, created_at FROM vitaguide.documents \
             WHERE collection = $1 ORDER BY created_at",
        )
        .bind(collection.name())
        .fetch_all(&self.pool)
        .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(body): Json<Value> = row.get("body");
            let created_at: DateTime<Utc> = row.get("created_at");
            documents.push(stamp(body, created_at));
        }

        Ok(documents)
    }
}

pub async fn seed(store: &PgStore, table: &WeightTable) -> anyhow::Result<()> {
    let visits = [
        (
            "seed-visit-001",
            "session_1769990400000_a1b2c3d4e",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) Mobile/15E148",
            "iPhone",
            "en-US",
            "390x844",
        ),
        (
            "seed-visit-002",
            "session_1769994000000_f5g6h7i8j",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/121.0 Safari/537.36",
            "Win32",
            "en-GB",
            "1920x1080",
        ),
        (
            "seed-visit-003",
            "session_1769997600000_k9l0m1n2o",
            "Mozilla/5.0 (Linux; Android 14; Pixel 8) Chrome/121.0 Mobile Safari/537.36",
            "Linux armv81",
            "es-ES",
            "412x915",
        ),
        (
            "seed-visit-004",
            "session_1770001200000_p3q4r5s6t",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_3) Safari/605.1.15",
            "MacIntel",
            "en-US",
            "1440x900",
        ),
    ];

    for (source_key, session_id, user_agent, platform, language, screen) in visits {
        let client = ClientInfo {
            user_agent: user_agent.to_string(),
            platform: platform.to_string(),
            language: language.to_string(),
            screen_resolution: screen.to_string(),
        };
        let visit = PersistedVisit::new(session_id, &client);
        store
            .insert_keyed(Collection::Visits, source_key, serde_json::to_value(&visit)?)
            .await?;
    }

    for (source_key, check) in seed_checks(table) {
        store
            .insert_keyed(
                Collection::SymptomChecks,
                source_key,
                serde_json::to_value(&check)?,
            )
            .await?;
    }

    Ok(())
}

fn seed_checks(table: &WeightTable) -> Vec<(&'static str, PersistedCheck)> {
    let checks = [
        (
            "seed-check-001",
            "session_1769990400000_a1b2c3d4e",
            "fatigue,weakness,depression",
            DeviceClass::Mobile,
            94,
        ),
        (
            "seed-check-002",
            "session_1769994000000_f5g6h7i8j",
            "bleeding_gums,easy_bruising",
            DeviceClass::Desktop,
            61,
        ),
        (
            "seed-check-003",
            "session_1769997600000_k9l0m1n2o",
            "tingling_hands,memory_problems,fatigue",
            DeviceClass::Mobile,
            148,
        ),
    ];

    checks
        .into_iter()
        .map(|(source_key, session_id, symptoms, device, duration)| {
            let selection = SelectionSet::parse_list(symptoms);
            let record = risk::analyze(&selection, table);
            let meta = CheckMeta {
                device,
                page_duration_secs: duration,
            };
            (
                source_key,
                PersistedCheck::new(session_id, &selection, &record, &meta),
            )
        })
        .collect()
}

#[derive(Debug, serde::Deserialize)]
struct ImportRow {
    session_id: String,
    symptoms: String,
    device_type: String,
    page_duration: Option<u32>,
    source_key: Option<String>,
}

// Re-scores one exported row. Rows without symptoms yield `None`.
fn check_from_row(
    row: ImportRow,
    table: &WeightTable,
    line: usize,
) -> anyhow::Result<Option<(String, PersistedCheck)>> {
    let device = DeviceClass::parse(&row.device_type)
        .with_context(|| format!("row {line}: unknown device_type '{}'", row.device_type))?;
    let selection = SelectionSet::parse_list(&row.symptoms);
    if selection.is_empty() {
        tracing::warn!(row = line, session = %row.session_id, "skipping check without symptoms");
        return Ok(None);
    }

    let record = risk::analyze(&selection, table);
    let meta = CheckMeta {
        device,
        page_duration_secs: row.page_duration.unwrap_or(0),
    };
    let check = PersistedCheck::new(&row.session_id, &selection, &record, &meta);
    let source_key = row
        .source_key
        .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
    Ok(Some((source_key, check)))
}

pub async fn import_csv(
    store: &PgStore,
    table: &WeightTable,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<ImportRow>().enumerate() {
        let Some((source_key, check)) = check_from_row(result?, table, index + 1)? else {
            continue;
        };
        if store
            .insert_keyed(
                Collection::SymptomChecks,
                &source_key,
                serde_json::to_value(&check)?,
            )
            .await?
        {
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> WeightTable {
        WeightTable::builtin().unwrap()
    }

    fn rows(data: &str) -> Vec<ImportRow> {
        csv::Reader::from_reader(data.as_bytes())
            .deserialize::<ImportRow>()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn import_rows_are_rescored() {
        let data = "session_id,symptoms,device_type,page_duration,source_key\n\
                    session_a,bleeding_gums;easy_bruising,Mobile,40,legacy-1\n";
        let row = rows(data).remove(0);
        let (source_key, check) = check_from_row(row, &table(), 1).unwrap().unwrap();

        assert_eq!(source_key, "legacy-1");
        assert_eq!(check.session_id, "session_a");
        assert_eq!(check.device_type, DeviceClass::Mobile);
        assert_eq!(check.page_duration, 40);
        assert_eq!(check.symptom_count, 2);
        assert_eq!(check.top_deficiency.as_deref(), Some("Vitamin C"));
        assert_eq!(check.results[0].score, 19);
    }

    #[test]
    fn import_rows_without_symptoms_are_skipped() {
        let data = "session_id,symptoms,device_type,page_duration,source_key\n\
                    session_b,,desktop,,\n";
        let row = rows(data).remove(0);
        assert!(check_from_row(row, &table(), 1).unwrap().is_none());
    }

    #[test]
    fn import_rows_reject_unknown_devices() {
        let data = "session_id,symptoms,device_type,page_duration,source_key\n\
                    session_c,fatigue,tablet,10,\n";
        let row = rows(data).remove(0);
        let err = check_from_row(row, &table(), 3).unwrap_err();
        assert_eq!(err.to_string(), "row 3: unknown device_type 'tablet'");
    }

    #[test]
    fn generated_source_keys_are_unique() {
        let data = "session_id,symptoms,device_type,page_duration,source_key\n\
                    session_d,fatigue,desktop,,\n\
                    session_d,fatigue,desktop,,\n";
        let keys: Vec<String> = rows(data)
            .into_iter()
            .map(|row| check_from_row(row, &table(), 1).unwrap().unwrap().0)
            .collect();
        assert!(keys[0].starts_with("import-"));
        assert_ne!(keys[0], keys[1]);
    }

    #[test]
    fn seed_checks_match_live_scoring() {
        let table = table();
        let checks = seed_checks(&table);
        assert_eq!(checks.len(), 3);

        let (source_key, check) = &checks[1];
        assert_eq!(*source_key, "seed-check-002");
        let selection = SelectionSet::parse_list("bleeding_gums,easy_bruising");
        let expected = risk::analyze(&selection, &table);
        assert_eq!(check.results.len(), expected.entries.len());
        assert_eq!(check.top_deficiency.as_deref(), Some("Vitamin C"));
        assert_eq!(check.top_deficiency_score, expected.max_score());
    }
}
