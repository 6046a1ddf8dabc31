use std::collections::{BTreeMap, HashSet};

use crate::models::Symptom;

pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("symptom '{0}' is listed twice in the catalog")]
    DuplicateSymptom(String),
    #[error("weight row references unknown symptom '{0}'")]
    UnknownSymptom(String),
    #[error("symptom '{symptom}' has more than one weight row")]
    DuplicateRow { symptom: String },
    #[error("symptom '{symptom}' lists '{deficiency}' more than once")]
    DuplicateDeficiency { symptom: String, deficiency: String },
    #[error("symptom '{symptom}' weight for '{deficiency}' is {weight}, expected 1..=10")]
    WeightOutOfRange {
        symptom: String,
        deficiency: String,
        weight: i32,
    },
}

type RawRow = (&'static str, &'static [(&'static str, i32)]);

pub static SYMPTOMS: &[Symptom] = &[
    Symptom { id: "night_blindness", label: "Night Blindness", prompt: "Night blindness / poor vision in dim light", category: "Eyes & Vision" },
    Symptom { id: "dry_eyes", label: "Dry Eyes", prompt: "Dry or irritated eyes", category: "Eyes & Vision" },
    Symptom { id: "blurry_vision", label: "Blurry Vision", prompt: "Blurry or deteriorating vision", category: "Eyes & Vision" },
    Symptom { id: "light_sensitivity", label: "Light Sensitivity", prompt: "Light sensitivity or burning eyes", category: "Eyes & Vision" },
    Symptom { id: "fatigue", label: "Fatigue", prompt: "Fatigue and persistent tiredness", category: "Energy & Mood" },
    Symptom { id: "weakness", label: "Muscle Weakness", prompt: "Muscle weakness", category: "Energy & Mood" },
    Symptom { id: "depression", label: "Depression", prompt: "Depression or low mood", category: "Energy & Mood" },
    Symptom { id: "memory_problems", label: "Memory Problems", prompt: "Memory problems or brain fog", category: "Energy & Mood" },
    Symptom { id: "irritability", label: "Irritability", prompt: "Irritability or mood swings", category: "Energy & Mood" },
    Symptom { id: "poor_concentration", label: "Poor Concentration", prompt: "Poor concentration or difficulty focusing", category: "Energy & Mood" },
    Symptom { id: "loss_of_appetite", label: "Loss of Appetite", prompt: "Loss of appetite or nausea", category: "Energy & Mood" },
    Symptom { id: "tingling_hands", label: "Tingling in Hands", prompt: "Tingling or numbness in hands or feet", category: "Nerves" },
    Symptom { id: "balance_issues", label: "Balance Issues", prompt: "Balance problems or difficulty walking", category: "Nerves" },
    Symptom { id: "muscle_cramps", label: "Muscle Cramps", prompt: "Muscle cramps or spasms", category: "Nerves" },
    Symptom { id: "burning_sensation", label: "Burning Sensation", prompt: "Burning sensations in limbs", category: "Nerves" },
    Symptom { id: "seizures", label: "Seizures", prompt: "Seizures (especially in infants)", category: "Nerves" },
    Symptom { id: "bleeding_gums", label: "Bleeding Gums", prompt: "Bleeding or swollen gums", category: "Skin & Mouth" },
    Symptom { id: "mouth_sores", label: "Mouth Sores", prompt: "Mouth sores or cracked lips (corners of mouth)", category: "Skin & Mouth" },
    Symptom { id: "swollen_tongue", label: "Swollen Tongue", prompt: "Swollen or inflamed tongue (glossitis)", category: "Skin & Mouth" },
    Symptom { id: "skin_rash", label: "Skin Rash", prompt: "Skin rash or rough darkened skin (sun-exposed areas)", category: "Skin & Mouth" },
    Symptom { id: "dry_peeling_skin", label: "Dry Peeling Skin", prompt: "Dry, peeling or scaly skin", category: "Skin & Mouth" },
    Symptom { id: "easy_bruising", label: "Easy Bruising", prompt: "Easy bruising", category: "Skin & Mouth" },
    Symptom { id: "hair_loss", label: "Hair Loss", prompt: "Hair loss or brittle hair", category: "Skin & Mouth" },
    Symptom { id: "petechiae", label: "Petechiae", prompt: "Petechiae (tiny red spots on skin)", category: "Skin & Mouth" },
    Symptom { id: "bone_pain", label: "Bone Pain", prompt: "Bone pain or tenderness", category: "Bones & Joints" },
    Symptom { id: "joint_pain", label: "Joint Pain", prompt: "Joint pain or stiffness", category: "Bones & Joints" },
    Symptom { id: "frequent_fractures", label: "Frequent Fractures", prompt: "Frequent fractures or weak bones", category: "Bones & Joints" },
    Symptom { id: "frequent_infections", label: "Frequent Infections", prompt: "Frequent infections or slow recovery", category: "Immune" },
    Symptom { id: "poor_wound_healing", label: "Poor Wound Healing", prompt: "Poor or slow wound healing", category: "Immune" },
    Symptom { id: "anemia", label: "Anemia", prompt: "Anemia (pale skin, shortness of breath, weakness)", category: "Blood" },
    Symptom { id: "heavy_bleeding", label: "Heavy Bleeding", prompt: "Excessive bleeding (cuts, menstrual, internal)", category: "Blood" },
    Symptom { id: "heart_palpitations", label: "Heart Palpitations", prompt: "Heart palpitations", category: "Blood" },
    Symptom { id: "shortness_of_breath", label: "Shortness of Breath", prompt: "Shortness of breath", category: "Blood" },
    Symptom { id: "digestive_issues", label: "Digestive Issues", prompt: "Digestive problems or diarrhea", category: "Digestive" },
    Symptom { id: "constipation", label: "Constipation", prompt: "Constipation", category: "Digestive" },
];

// 10 = hallmark, 7-9 = strong, 4-6 = moderate, 1-3 = weak or shared.
static WEIGHTS: &[RawRow] = &[
    ("night_blindness", &[("Vitamin A", 10), ("Zinc (mineral)", 4)]),
    ("dry_eyes", &[("Vitamin A", 8)]),
    ("blurry_vision", &[("Vitamin A", 5), ("Vitamin B12", 3), ("Vitamin E", 3)]),
    ("light_sensitivity", &[("Vitamin B2", 9), ("Vitamin A", 3)]),
    ("fatigue", &[("Vitamin B12", 8), ("Folate (B9)", 7), ("Vitamin D", 7), ("Vitamin B1", 6), ("Vitamin B2", 5), ("Vitamin B6", 5), ("Vitamin C", 4)]),
    ("weakness", &[("Vitamin D", 8), ("Vitamin B1", 7), ("Vitamin B12", 6), ("Vitamin E", 5), ("Vitamin C", 4)]),
    ("depression", &[("Vitamin D", 8), ("Vitamin B12", 7), ("Vitamin B6", 6), ("Folate (B9)", 6)]),
    ("memory_problems", &[("Vitamin B12", 9), ("Vitamin B1", 6), ("Vitamin D", 5), ("Folate (B9)", 4)]),
    ("irritability", &[("Vitamin B3", 6), ("Vitamin B6", 5), ("Folate (B9)", 5), ("Vitamin B1", 4), ("Vitamin C", 3)]),
    ("poor_concentration", &[("Vitamin B1", 8), ("Vitamin B12", 6), ("Folate (B9)", 5), ("Vitamin D", 4)]),
    ("loss_of_appetite", &[("Vitamin B1", 7), ("Vitamin B12", 4), ("Vitamin C", 4)]),
    ("tingling_hands", &[("Vitamin B12", 10), ("Vitamin B6", 7), ("Vitamin B1", 6), ("Vitamin E", 4)]),
    ("balance_issues", &[("Vitamin B12", 9), ("Vitamin B1", 6), ("Vitamin B6", 5)]),
    ("muscle_cramps", &[("Vitamin D", 6)]),
    ("burning_sensation", &[("Vitamin B6", 8), ("Vitamin B12", 6), ("Vitamin B1", 5)]),
    ("seizures", &[("Vitamin B6", 9), ("Vitamin B1", 5)]),
    ("bleeding_gums", &[("Vitamin C", 10), ("Vitamin K", 6)]),
    ("mouth_sores", &[("Vitamin B2", 9), ("Vitamin B3", 7), ("Folate (B9)", 6), ("Vitamin B12", 5), ("Vitamin B6", 5)]),
    ("swollen_tongue", &[("Vitamin B12", 8), ("Vitamin B3", 7), ("Folate (B9)", 6), ("Vitamin B2", 6), ("Vitamin B6", 5)]),
    ("skin_rash", &[("Vitamin B3", 10), ("Vitamin B2", 7), ("Vitamin A", 5), ("Vitamin B6", 5)]),
    ("dry_peeling_skin", &[("Vitamin A", 8), ("Vitamin B2", 5), ("Vitamin B3", 4)]),
    ("easy_bruising", &[("Vitamin C", 9), ("Vitamin K", 9)]),
    ("hair_loss", &[("Vitamin D", 5), ("Vitamin A", 4)]),
    ("petechiae", &[("Vitamin C", 9), ("Vitamin K", 6)]),
    ("bone_pain", &[("Vitamin D", 10), ("Vitamin A", 4)]),
    ("joint_pain", &[("Vitamin D", 7), ("Vitamin C", 5)]),
    ("frequent_fractures", &[("Vitamin D", 9), ("Vitamin K", 7)]),
    ("frequent_infections", &[("Vitamin C", 9), ("Vitamin A", 8), ("Vitamin D", 7)]),
    ("poor_wound_healing", &[("Vitamin C", 10), ("Vitamin A", 8), ("Vitamin K", 4)]),
    ("anemia", &[("Vitamin B12", 9), ("Folate (B9)", 9), ("Vitamin B6", 6), ("Vitamin C", 4)]),
    ("heavy_bleeding", &[("Vitamin K", 10)]),
    ("heart_palpitations", &[("Vitamin B1", 8), ("Vitamin B12", 5)]),
    ("shortness_of_breath", &[("Vitamin B12", 7), ("Folate (B9)", 7), ("Vitamin C", 5)]),
    ("digestive_issues", &[("Vitamin B3", 6), ("Vitamin C", 3), ("Vitamin B1", 3)]),
    ("constipation", &[("Vitamin D", 3)]),
];

static PAGE_SLUGS: &[(&str, &str)] = &[
    ("Vitamin A", "vitamin-a"),
    ("Vitamin B1", "vitamin-b1"),
    ("Vitamin B2", "vitamin-b2"),
    ("Vitamin B3", "vitamin-b3"),
    ("Vitamin B6", "vitamin-b6"),
    ("Vitamin B12", "vitamin-b12"),
    ("Folate (B9)", "folate"),
    ("Vitamin C", "vitamin-c"),
    ("Vitamin D", "vitamin-d"),
    ("Vitamin E", "vitamin-e"),
    ("Vitamin K", "vitamin-k"),
];

/// Validated symptom -> deficiency weights, plus the symptom catalog they index.
#[derive(Debug, Clone)]
pub struct WeightTable {
    symptoms: BTreeMap<String, Symptom>,
    order: Vec<&'static str>,
    rows: BTreeMap<String, Vec<(String, u32)>>,
}

impl WeightTable {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::load(SYMPTOMS, WEIGHTS)
    }

    pub fn load(symptoms: &[Symptom], raw: &[RawRow]) -> Result<Self, CatalogError> {
        let mut catalog = BTreeMap::new();
        let mut order = Vec::with_capacity(symptoms.len());
        for symptom in symptoms {
            order.push(symptom.id);
            if catalog
                .insert(symptom.id.to_string(), symptom.clone())
                .is_some()
            {
                return Err(CatalogError::DuplicateSymptom(symptom.id.to_string()));
            }
        }

        let mut rows = BTreeMap::new();
        for (symptom, pairs) in raw {
            if !catalog.contains_key(*symptom) {
                return Err(CatalogError::UnknownSymptom(symptom.to_string()));
            }

            let mut seen = HashSet::new();
            let mut row = Vec::with_capacity(pairs.len());
            for (deficiency, weight) in pairs.iter() {
                if !(i32::from(MIN_WEIGHT)..=i32::from(MAX_WEIGHT)).contains(weight) {
                    return Err(CatalogError::WeightOutOfRange {
                        symptom: symptom.to_string(),
                        deficiency: deficiency.to_string(),
                        weight: *weight,
                    });
                }
                if !seen.insert(*deficiency) {
                    return Err(CatalogError::DuplicateDeficiency {
                        symptom: symptom.to_string(),
                        deficiency: deficiency.to_string(),
                    });
                }
                row.push((deficiency.to_string(), *weight as u32));
            }

            if rows.insert(symptom.to_string(), row).is_some() {
                return Err(CatalogError::DuplicateRow {
                    symptom: symptom.to_string(),
                });
            }
        }

        Ok(Self {
            symptoms: catalog,
            order,
            rows,
        })
    }

    pub fn row(&self, symptom_id: &str) -> Option<&[(String, u32)]> {
        self.rows.get(symptom_id).map(Vec::as_slice)
    }

    pub fn symptom(&self, symptom_id: &str) -> Option<&Symptom> {
        self.symptoms.get(symptom_id)
    }

    pub fn contains(&self, symptom_id: &str) -> bool {
        self.symptoms.contains_key(symptom_id)
    }

    pub fn label(&self, symptom_id: &str) -> String {
        self.symptom(symptom_id)
            .map(|symptom| symptom.label.to_string())
            .unwrap_or_else(|| symptom_id.replace('_', " "))
    }

    pub fn by_category(&self) -> Vec<(&'static str, Vec<&Symptom>)> {
        let mut groups: Vec<(&'static str, Vec<&Symptom>)> = Vec::new();
        for id in &self.order {
            let Some(symptom) = self.symptom(id) else {
                continue;
            };
            match groups.iter_mut().find(|(category, _)| *category == symptom.category) {
                Some((_, members)) => members.push(symptom),
                None => groups.push((symptom.category, vec![symptom])),
            }
        }
        groups
    }
}

pub fn page_slug(deficiency: &str) -> Option<&'static str> {
    PAGE_SLUGS
        .iter()
        .find(|(name, _)| *name == deficiency)
        .map(|(_, slug)| *slug)
}
