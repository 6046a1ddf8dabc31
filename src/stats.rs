use std::collections::{BTreeMap, HashMap};

use crate::models::{CheckSummary, DeficiencyStat, GlobalStatistics, SymptomStat};
use crate::risk::rounded_ratio;
use crate::store::{Collection, DocumentStore, StoreError};

// `total_checks` counts every stored check, readable or not.
pub fn summarize(
    total_visits: usize,
    total_checks: usize,
    checks: &[CheckSummary],
) -> GlobalStatistics {
    let mut deficiency_totals: HashMap<&str, (usize, u64)> = HashMap::new();
    let mut symptom_counts: BTreeMap<String, usize> = BTreeMap::new();

    for check in checks {
        for result in &check.results {
            let entry = deficiency_totals.entry(result.name.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += u64::from(result.score);
        }

        for symptom in &check.symptoms_selected {
            *symptom_counts.entry(symptom.clone()).or_insert(0) += 1;
        }
    }

    let mut deficiencies: Vec<DeficiencyStat> = deficiency_totals
        .into_iter()
        .map(|(name, (count, total_score))| DeficiencyStat {
            name: name.to_string(),
            count,
            percentage: rounded_ratio(100 * count as u64, total_checks as u64),
            avg_score: rounded_ratio(total_score, count as u64),
        })
        .collect();
    deficiencies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    let top_symptom = symptom_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(symptom, count)| SymptomStat {
            symptom: symptom.clone(),
            count: *count,
        });

    GlobalStatistics {
        total_visits,
        total_checks,
        check_percentage: rounded_ratio(100 * total_checks as u64, total_visits as u64),
        top_deficiency: deficiencies.first().cloned(),
        top_symptom,
        deficiencies,
        all_symptoms: symptom_counts,
    }
}

pub async fn compute_global_statistics(
    store: &dyn DocumentStore,
) -> Result<GlobalStatistics, StoreError> {
    let visits = store.list_all(Collection::Visits).await?;
    let documents = store.list_all(Collection::SymptomChecks).await?;

    let total_checks = documents.len();
    let mut checks = Vec::with_capacity(total_checks);
    for document in documents {
        match serde_json::from_value::<CheckSummary>(document) {
            Ok(check) => checks.push(check),
            Err(err) => tracing::warn!(error = %err, "skipping malformed symptom check"),
        }
    }

    let statistics = summarize(visits.len(), total_checks, &checks);
    tracing::debug!(
        visits = statistics.total_visits,
        checks = statistics.total_checks,
        "community statistics recomputed"
    );
    Ok(statistics)
}

pub async fn global_statistics_or_default(store: &dyn DocumentStore) -> GlobalStatistics {
    match compute_global_statistics(store).await {
        Ok(statistics) => statistics,
        Err(err) => {
            tracing::error!(error = %err, "failed to fetch community statistics");
            GlobalStatistics::default()
        }
    }
}
