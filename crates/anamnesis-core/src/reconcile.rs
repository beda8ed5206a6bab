//! Reconciliation of model output into one consistent view.
//!
//! A single diagnosis request returns two categorized lists that may overlap
//! or disagree with each other; [`reconcile_diagnoses`] collapses them into a
//! deduplicated pair bucketed by probability. When several diagnoses are
//! investigated at once, [`merge_details`] unions their checklists and
//! management plans.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::diagnosis::{ChecklistItem, Diagnosis, DiagnosisDetail, DiagnosisResponse, ManagementPlan};

/// Diagnoses with a probability above this value are "probable"; the rest are
/// differentials.
pub const PROBABLE_THRESHOLD: u8 = 10;

/// Deduplicated, probability-ranked diagnoses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledDiagnoses {
    /// Probability above [`PROBABLE_THRESHOLD`], highest first.
    pub probable: Vec<Diagnosis>,
    /// Probability at or below [`PROBABLE_THRESHOLD`], highest first.
    pub differential: Vec<Diagnosis>,
}

impl ReconciledDiagnoses {
    pub fn is_empty(&self) -> bool {
        self.probable.is_empty() && self.differential.is_empty()
    }

    pub fn len(&self) -> usize {
        self.probable.len() + self.differential.len()
    }

    /// Both partitions as one list, highest probability first.
    pub fn ranked(&self) -> Vec<Diagnosis> {
        let mut all: Vec<Diagnosis> = self
            .probable
            .iter()
            .chain(&self.differential)
            .cloned()
            .collect();
        all.sort_by(|a, b| b.probability.cmp(&a.probability));
        all
    }

    /// Look up a diagnosis by case-insensitive name.
    pub fn find(&self, name: &str) -> Option<&Diagnosis> {
        let wanted = name.trim().to_lowercase();
        self.probable
            .iter()
            .chain(&self.differential)
            .find(|d| d.name.to_lowercase() == wanted)
    }
}

impl From<DiagnosisResponse> for ReconciledDiagnoses {
    fn from(response: DiagnosisResponse) -> Self {
        reconcile_diagnoses(response.probable, response.differential)
    }
}

/// Merge the two model-provided lists into a single consistent ranking.
///
/// Identity is the lowercased name. Among duplicates the higher probability
/// wins; on a tie the first one seen is kept. The surviving set is split at
/// [`PROBABLE_THRESHOLD`] and each half sorted by descending probability.
pub fn reconcile_diagnoses(probable: Vec<Diagnosis>, differential: Vec<Diagnosis>) -> ReconciledDiagnoses {
    let mut unique: Vec<Diagnosis> = Vec::with_capacity(probable.len() + differential.len());
    let mut position: HashMap<String, usize> = HashMap::new();

    for diagnosis in probable.into_iter().chain(differential) {
        let key = diagnosis.name.to_lowercase();
        match position.get(&key) {
            Some(&i) => {
                if diagnosis.probability > unique[i].probability {
                    unique[i] = diagnosis;
                }
            }
            None => {
                position.insert(key, unique.len());
                unique.push(diagnosis);
            }
        }
    }

    let (mut probable, mut differential): (Vec<_>, Vec<_>) = unique
        .into_iter()
        .partition(|d| d.probability > PROBABLE_THRESHOLD);

    // Stable sort: equal probabilities keep their first-seen order.
    probable.sort_by(|a, b| b.probability.cmp(&a.probability));
    differential.sort_by(|a, b| b.probability.cmp(&a.probability));

    ReconciledDiagnoses {
        probable,
        differential,
    }
}

/// A checklist item together with every diagnosis that asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedChecklistItem {
    pub item: ChecklistItem,
    pub sources: Vec<String>,
}

/// The union of several diagnoses' details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedDetails {
    pub checklist: Vec<MergedChecklistItem>,
    pub plan: ManagementPlan,
}

impl MergedDetails {
    pub fn is_empty(&self) -> bool {
        self.checklist.is_empty() && self.plan.is_empty()
    }
}

/// Union the details fetched for several diagnoses.
///
/// `details` yields `(diagnosis name, detail)` pairs in selection order.
/// Checklist items are keyed by exact item text and keep the first
/// occurrence's rationale; the source list records each diagnosis once.
/// Plan entries are deduplicated per category and lose their provenance.
/// Output order is first appearance throughout.
pub fn merge_details<'a, I>(details: I) -> MergedDetails
where
    I: IntoIterator<Item = (&'a str, &'a DiagnosisDetail)>,
{
    let mut checklist: Vec<MergedChecklistItem> = Vec::new();
    let mut by_text: HashMap<&'a str, usize> = HashMap::new();

    let mut tests = UniqueList::default();
    let mut medications = UniqueList::default();
    let mut referrals = UniqueList::default();

    for (name, detail) in details {
        for entry in &detail.checklist {
            match by_text.get(entry.item.as_str()) {
                Some(&i) => {
                    let sources = &mut checklist[i].sources;
                    if !sources.iter().any(|s| s == name) {
                        sources.push(name.to_string());
                    }
                }
                None => {
                    by_text.insert(entry.item.as_str(), checklist.len());
                    checklist.push(MergedChecklistItem {
                        item: entry.clone(),
                        sources: vec![name.to_string()],
                    });
                }
            }
        }

        tests.extend(&detail.plan.confirmation_tests);
        medications.extend(&detail.plan.suggested_medications);
        referrals.extend(&detail.plan.referrals);
    }

    MergedDetails {
        checklist,
        plan: ManagementPlan {
            confirmation_tests: tests.items,
            suggested_medications: medications.items,
            referrals: referrals.items,
        },
    }
}

/// Insertion-ordered list that ignores repeated values.
#[derive(Default)]
struct UniqueList {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl UniqueList {
    fn extend<'a>(&mut self, values: impl IntoIterator<Item = &'a String>) {
        for value in values {
            if self.seen.insert(value.clone()) {
                self.items.push(value.clone());
            }
        }
    }
}
