use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Symptom {
    pub id: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
    pub category: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet(BTreeSet<String>);

impl SelectionSet {
    pub fn parse_list(raw: &str) -> Self {
        raw.split([',', ';'])
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<String> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub symptom_id: String,
    pub label: String,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeficiencyScore {
    pub name: String,
    pub score: u32,
    pub contributions: Vec<Contribution>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreRecord {
    pub entries: Vec<DeficiencyScore>,
}

impl ScoreRecord {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_score(&self) -> u32 {
        self.entries.iter().map(|entry| entry.score).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    pub fn from_user_agent(user_agent: &str) -> Self {
        if ["Mobile", "Android", "iPhone"]
            .iter()
            .any(|marker| user_agent.contains(marker))
        {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mobile" => Some(Self::Mobile),
            "desktop" => Some(Self::Desktop),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub user_agent: String,
    pub platform: String,
    pub language: String,
    pub screen_resolution: String,
}

impl ClientInfo {
    pub fn device_class(&self) -> DeviceClass {
        DeviceClass::from_user_agent(&self.user_agent)
    }
}

#[derive(Debug, Clone)]
pub struct CheckMeta {
    pub device: DeviceClass,
    pub page_duration_secs: u32,
}

impl CheckMeta {
    // Time on page is only known when the caller measured it.
    pub fn for_client(client: &ClientInfo, page_duration_secs: Option<u32>) -> Self {
        Self {
            device: client.device_class(),
            page_duration_secs: page_duration_secs.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredResult")]
pub struct ResultEntry {
    pub name: String,
    pub score: u32,
}

// Older documents store results as `["Vitamin D", 15]` pairs.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredResult {
    Named { name: String, score: u32 },
    Pair(String, u32),
}

impl From<StoredResult> for ResultEntry {
    fn from(value: StoredResult) -> Self {
        match value {
            StoredResult::Named { name, score } | StoredResult::Pair(name, score) => {
                Self { name, score }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCheck {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub symptoms_selected: Vec<String>,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
    #[serde(default)]
    pub symptom_count: u32,
    pub top_deficiency: Option<String>,
    #[serde(default)]
    pub top_deficiency_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub device_type: DeviceClass,
    #[serde(default)]
    pub page_duration: u32,
}

impl PersistedCheck {
    pub fn new(
        session_id: &str,
        selection: &SelectionSet,
        record: &ScoreRecord,
        meta: &CheckMeta,
    ) -> Self {
        let results: Vec<ResultEntry> = record
            .entries
            .iter()
            .map(|entry| ResultEntry {
                name: entry.name.clone(),
                score: entry.score,
            })
            .collect();

        Self {
            session_id: session_id.to_string(),
            symptoms_selected: selection.to_vec(),
            symptom_count: selection.len() as u32,
            top_deficiency: results.first().map(|entry| entry.name.clone()),
            top_deficiency_score: results.first().map(|entry| entry.score).unwrap_or(0),
            results,
            timestamp: None,
            device_type: meta.device,
            page_duration: meta.page_duration_secs,
        }
    }
}

// The only fields aggregation reads. Metadata may be missing on older rows.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckSummary {
    #[serde(default)]
    pub symptoms_selected: Vec<String>,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
}

impl From<PersistedCheck> for CheckSummary {
    fn from(check: PersistedCheck) -> Self {
        Self {
            symptoms_selected: check.symptoms_selected,
            results: check.results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedVisit {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub user_agent: String,
    pub platform: String,
    pub language: String,
    pub screen_resolution: String,
    pub is_mobile: bool,
}

impl PersistedVisit {
    pub fn new(session_id: &str, client: &ClientInfo) -> Self {
        Self {
            session_id: session_id.to_string(),
            timestamp: None,
            user_agent: client.user_agent.clone(),
            platform: client.platform.clone(),
            language: client.language.clone(),
            screen_resolution: client.screen_resolution.clone(),
            is_mobile: client.device_class() == DeviceClass::Mobile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeficiencyStat {
    pub name: String,
    pub count: usize,
    pub percentage: u32,
    pub avg_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomStat {
    pub symptom: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStatistics {
    pub total_visits: usize,
    pub total_checks: usize,
    pub check_percentage: u32,
    pub top_deficiency: Option<DeficiencyStat>,
    pub top_symptom: Option<SymptomStat>,
    pub deficiencies: Vec<DeficiencyStat>,
    pub all_symptoms: BTreeMap<String, usize>,
}
