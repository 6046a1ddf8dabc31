use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::WeightTable;
use crate::models::{Contribution, DeficiencyScore, ScoreRecord, SelectionSet};

pub const MIN_SCORE: u32 = 3;
pub const MAX_RESULTS: usize = 5;

pub fn tally(selected: &SelectionSet, table: &WeightTable) -> BTreeMap<String, DeficiencyScore> {
    let mut totals: BTreeMap<String, DeficiencyScore> = BTreeMap::new();

    for symptom_id in selected.iter() {
        let Some(row) = table.row(symptom_id) else {
            continue;
        };
        let label = table.label(symptom_id);

        for (deficiency, weight) in row {
            let entry = totals
                .entry(deficiency.clone())
                .or_insert_with(|| DeficiencyScore {
                    name: deficiency.clone(),
                    score: 0,
                    contributions: Vec::new(),
                });
            entry.score += weight;
            entry.contributions.push(Contribution {
                symptom_id: symptom_id.to_string(),
                label: label.clone(),
                weight: *weight,
            });
        }
    }

    totals
}

pub fn analyze(selected: &SelectionSet, table: &WeightTable) -> ScoreRecord {
    if selected.is_empty() {
        return ScoreRecord::default();
    }

    let mut entries: Vec<DeficiencyScore> = tally(selected, table)
        .into_values()
        .filter(|entry| entry.score >= MIN_SCORE)
        .collect();

    entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    entries.truncate(MAX_RESULTS);

    ScoreRecord { entries }
}

// Half-up, matching Math.round for non-negative values.
pub fn rounded_ratio(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    ((2 * numerator + denominator) / (2 * denominator)) as u32
}

pub fn percentage(score: u32, max_score: u32) -> u32 {
    rounded_ratio(100 * u64::from(score), u64::from(max_score))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "High Risk",
            RiskLevel::Moderate => "Moderate Risk",
            RiskLevel::Low => "Low Risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskScheme {
    // 60/40/25, below 25 is a low-confidence Low.
    #[default]
    ThreeTier,
    // 70/40.
    TwoTier,
}

impl RiskScheme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "three-tier" | "three_tier" | "3" => Some(Self::ThreeTier),
            "two-tier" | "two_tier" | "2" => Some(Self::TwoTier),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RiskScheme::ThreeTier => "three-tier",
            RiskScheme::TwoTier => "two-tier",
        }
    }

    pub fn assess(&self, score: u32, max_score: u32) -> RiskAssessment {
        let percentage = percentage(score, max_score);
        let (level, low_confidence) = match self {
            RiskScheme::ThreeTier => match percentage {
                60.. => (RiskLevel::High, false),
                40..=59 => (RiskLevel::Moderate, false),
                25..=39 => (RiskLevel::Low, false),
                _ => (RiskLevel::Low, true),
            },
            RiskScheme::TwoTier => match percentage {
                70.. => (RiskLevel::High, false),
                40..=69 => (RiskLevel::Moderate, false),
                _ => (RiskLevel::Low, false),
            },
        };

        RiskAssessment {
            level,
            percentage,
            low_confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub percentage: u32,
    pub low_confidence: bool,
}

impl RiskAssessment {
    pub fn label(&self) -> String {
        if self.low_confidence {
            format!("{} (limited evidence)", self.level.label())
        } else {
            self.level.label().to_string()
        }
    }
}

pub fn assess_record(record: &ScoreRecord, scheme: RiskScheme) -> Vec<RiskAssessment> {
    let max_score = record.max_score();
    record
        .entries
        .iter()
        .map(|entry| scheme.assess(entry.score, max_score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::catalog::SYMPTOMS;
    use crate::models::Symptom;

    fn table() -> WeightTable {
        WeightTable::builtin().unwrap()
    }

    fn select(ids: &[&str]) -> SelectionSet {
        ids.iter().copied().collect()
    }

    fn ranked(record: &ScoreRecord) -> Vec<(&str, u32)> {
        record
            .entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.score))
            .collect()
    }

    #[test]
    fn empty_selection_yields_empty_record() {
        assert!(analyze(&SelectionSet::default(), &table()).is_empty());
    }

    #[test]
    fn bleeding_gums_ranks_vitamin_c_over_k() {
        let record = analyze(&select(&["bleeding_gums"]), &table());
        assert_eq!(ranked(&record), vec![("Vitamin C", 10), ("Vitamin K", 6)]);

        let contribution = &record.entries[0].contributions[0];
        assert_eq!(contribution.label, "Bleeding Gums");
        assert_eq!(contribution.weight, 10);
    }

    #[test]
    fn score_at_threshold_is_kept() {
        let record = analyze(&select(&["constipation"]), &table());
        assert_eq!(ranked(&record), vec![("Vitamin D", 3)]);
    }

    #[test]
    fn score_below_threshold_is_dropped() {
        let symptoms = [Symptom {
            id: "mild_itch",
            label: "Mild Itch",
            prompt: "Mild itch",
            category: "Skin & Mouth",
        }];
        let table = WeightTable::load(&symptoms, &[("mild_itch", &[("Vitamin E", 2)])]).unwrap();
        assert!(analyze(&select(&["mild_itch"]), &table).is_empty());
    }

    #[test]
    fn independent_symptoms_rank_together_and_cap_at_five() {
        let record = analyze(&select(&["tingling_hands", "bone_pain"]), &table());
        assert_eq!(
            ranked(&record),
            vec![
                ("Vitamin B12", 10),
                ("Vitamin D", 10),
                ("Vitamin B6", 7),
                ("Vitamin B1", 6),
                ("Vitamin A", 4),
            ]
        );
    }

    #[test]
    fn shared_deficiencies_accumulate() {
        let record = analyze(&select(&["fatigue", "weakness"]), &table());
        assert_eq!(record.entries[0].name, "Vitamin D");
        assert_eq!(record.entries[0].score, 15);
        assert_eq!(record.entries[1].name, "Vitamin B12");
        assert_eq!(record.entries[1].score, 14);
        assert_eq!(record.entries[0].contributions.len(), 2);
    }

    #[test]
    fn unknown_symptoms_contribute_nothing() {
        let with_unknown = analyze(&select(&["bleeding_gums", "cold_hands"]), &table());
        let without = analyze(&select(&["bleeding_gums"]), &table());
        assert_eq!(with_unknown, without);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(rounded_ratio(1, 2), 1);
        assert_eq!(rounded_ratio(1, 3), 0);
        assert_eq!(rounded_ratio(2, 3), 1);
        assert_eq!(rounded_ratio(5, 0), 0);
        assert_eq!(percentage(6, 10), 60);
        assert_eq!(percentage(2, 3), 67);
    }

    #[test]
    fn three_tier_boundaries() {
        let scheme = RiskScheme::ThreeTier;
        assert_eq!(scheme.assess(6, 10).level, RiskLevel::High);
        assert_eq!(scheme.assess(4, 10).level, RiskLevel::Moderate);
        let low = scheme.assess(25, 100);
        assert_eq!((low.level, low.low_confidence), (RiskLevel::Low, false));
        let weak = scheme.assess(24, 100);
        assert_eq!((weak.level, weak.low_confidence), (RiskLevel::Low, true));
        assert_eq!(weak.label(), "Low Risk (limited evidence)");
    }

    #[test]
    fn two_tier_boundaries() {
        let scheme = RiskScheme::TwoTier;
        assert_eq!(scheme.assess(7, 10).level, RiskLevel::High);
        assert_eq!(scheme.assess(6, 10).level, RiskLevel::Moderate);
        assert_eq!(scheme.assess(3, 10).level, RiskLevel::Low);
        assert!(!scheme.assess(1, 10).low_confidence);
    }

    #[test]
    fn scheme_names_parse() {
        assert_eq!(RiskScheme::parse("Two-Tier"), Some(RiskScheme::TwoTier));
        assert_eq!(RiskScheme::parse("three_tier"), Some(RiskScheme::ThreeTier));
        assert_eq!(RiskScheme::parse("five"), None);
    }

    fn catalog_ids() -> Vec<&'static str> {
        SYMPTOMS.iter().map(|symptom| symptom.id).collect()
    }

    proptest! {
        #[test]
        fn scores_are_additive_over_disjoint_sets(
            picks in proptest::sample::subsequence(catalog_ids(), 0..12),
            split in 0usize..12,
        ) {
            let table = table();
            let split = split.min(picks.len());
            let (left, right) = picks.split_at(split);
            let whole = tally(&select(&picks), &table);
            let a = tally(&select(left), &table);
            let b = tally(&select(right), &table);

            for (name, entry) in &whole {
                let expected = a.get(name).map_or(0, |e| e.score) + b.get(name).map_or(0, |e| e.score);
                prop_assert_eq!(entry.score, expected);
            }
        }

        #[test]
        fn ranked_record_is_thresholded_sorted_and_bounded(
            picks in proptest::sample::subsequence(catalog_ids(), 1..20),
        ) {
            let record = analyze(&select(&picks), &table());
            prop_assert!(record.entries.len() <= MAX_RESULTS);
            prop_assert!(record.entries.iter().all(|entry| entry.score >= MIN_SCORE));
            prop_assert!(record.entries.windows(2).all(|pair| pair[0].score >= pair[1].score));

            let assessments = assess_record(&record, RiskScheme::ThreeTier);
            prop_assert!(assessments.iter().all(|risk| risk.percentage <= 100));
            if let Some(top) = assessments.first() {
                prop_assert_eq!(top.percentage, 100);
            }
        }
    }
}
