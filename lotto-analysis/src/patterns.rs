use std::collections::BTreeMap;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use lotto_db::models::{DrawHistory, LOW_MAX, PICK_COUNT};

use crate::error::AnalysisError;

/// Motifs observés sur un ensemble de tirages.
///
/// Les proportions pair/impair et bas/haut sont des pourcentages des `slots`
/// analysés (tirages × 6).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    #[serde(serialize_with = "pairs_as_list")]
    pub consecutive_pairs: BTreeMap<(u8, u8), u32>,
    pub even_pct: f64,
    pub odd_pct: f64,
    pub low_pct: f64,
    pub high_pct: f64,
    pub slots: usize,
}

impl PatternReport {
    /// Nombre total de paires consécutives, toutes paires confondues.
    pub fn total_consecutive(&self) -> u32 {
        self.consecutive_pairs.values().sum()
    }

    /// Les `k` paires les plus fréquentes (fréquence décroissante, puis paire croissante).
    pub fn top_consecutive_pairs(&self, k: usize) -> Vec<((u8, u8), u32)> {
        let mut pairs: Vec<((u8, u8), u32)> = self
            .consecutive_pairs
            .iter()
            .map(|(&pair, &count)| (pair, count))
            .collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        pairs.truncate(k);
        pairs
    }
}

#[derive(Serialize)]
struct PairCount {
    pair: (u8, u8),
    count: u32,
}

fn pairs_as_list<S: Serializer>(
    pairs: &BTreeMap<(u8, u8), u32>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(pairs.len()))?;
    for (&pair, &count) in pairs {
        seq.serialize_element(&PairCount { pair, count })?;
    }
    seq.end()
}

pub fn analyze_patterns(history: &DrawHistory) -> Result<PatternReport, AnalysisError> {
    if history.is_empty() {
        return Err(AnalysisError::InsufficientData);
    }

    let mut consecutive_pairs = BTreeMap::new();
    let mut even = 0usize;
    let mut low = 0usize;

    for draw in history {
        for pair in draw.numbers.consecutive_pairs() {
            *consecutive_pairs.entry(pair).or_insert(0) += 1;
        }
        for &n in draw.numbers.numbers() {
            if n % 2 == 0 {
                even += 1;
            }
            if n <= LOW_MAX {
                low += 1;
            }
        }
    }

    let slots = history.len() * PICK_COUNT;
    let pct = |count: usize| count as f64 / slots as f64 * 100.0;

    Ok(PatternReport {
        consecutive_pairs,
        even_pct: pct(even),
        odd_pct: pct(slots - even),
        low_pct: pct(low),
        high_pct: pct(slots - low),
        slots,
    })
}
