use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::catalog::{self, WeightTable};
use crate::models::{GlobalStatistics, ScoreRecord};
use crate::risk::{self, RiskScheme};

pub fn render_assessment(record: &ScoreRecord, scheme: RiskScheme) -> String {
    let mut output = String::new();

    if record.is_empty() {
        let _ = writeln!(output, "No significant risk detected.");
        let _ = writeln!(
            output,
            "No strong deficiency pattern matched the selected symptoms. Talk to a doctor about lab tests if you have concerns."
        );
        return output;
    }

    let _ = writeln!(output, "Your risk assessment (educational only, not a diagnosis):");
    let assessments = risk::assess_record(record, scheme);
    for (entry, assessment) in record.entries.iter().zip(assessments.iter()) {
        let _ = writeln!(
            output,
            "- {}: {} ({}%, score {})",
            entry.name,
            assessment.label(),
            assessment.percentage,
            entry.score
        );
        let sources: Vec<String> = entry
            .contributions
            .iter()
            .map(|contribution| format!("{} +{}", contribution.label, contribution.weight))
            .collect();
        let _ = writeln!(output, "    from: {}", sources.join(", "));
        if let Some(slug) = catalog::page_slug(&entry.name) {
            let _ = writeln!(output, "    learn more: /vitamin/{}", slug);
        }
    }

    output
}

pub fn render_statistics(statistics: &GlobalStatistics, table: &WeightTable) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Community: {} visits, {} checks ({}% took the quiz)",
        statistics.total_visits, statistics.total_checks, statistics.check_percentage
    );

    match &statistics.top_deficiency {
        Some(top) => {
            let _ = writeln!(
                output,
                "Most flagged: {} in {} checks ({}%)",
                top.name, top.count, top.percentage
            );
        }
        None => {
            let _ = writeln!(output, "Most flagged: no checks recorded yet");
        }
    }

    if let Some(top) = &statistics.top_symptom {
        let _ = writeln!(
            output,
            "Most reported symptom: {} ({} checks)",
            table.label(&top.symptom),
            top.count
        );
    }

    output
}

pub fn build_report(
    statistics: &GlobalStatistics,
    table: &WeightTable,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# VitaGuide Community Report");
    let _ = writeln!(output, "Generated {}", generated_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Participation");
    let _ = writeln!(output, "- Visits: {}", statistics.total_visits);
    let _ = writeln!(output, "- Symptom checks: {}", statistics.total_checks);
    let _ = writeln!(output, "- Participation rate: {}%", statistics.check_percentage);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Flagged Deficiencies");

    if statistics.deficiencies.is_empty() {
        let _ = writeln!(output, "No symptom checks recorded yet.");
    } else {
        for deficiency in statistics.deficiencies.iter() {
            let _ = writeln!(
                output,
                "- {}: {} checks ({}%, avg score {})",
                deficiency.name, deficiency.count, deficiency.percentage, deficiency.avg_score
            );
        }
    }

    let mut symptoms: Vec<(&String, &usize)> = statistics.all_symptoms.iter().collect();
    symptoms.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Reported Symptoms");

    if symptoms.is_empty() {
        let _ = writeln!(output, "No symptoms reported yet.");
    } else {
        for (symptom, count) in symptoms.iter().take(10) {
            let _ = writeln!(output, "- {}: {}", table.label(symptom), count);
        }
    }

    output
}
