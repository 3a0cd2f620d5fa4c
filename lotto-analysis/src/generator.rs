use std::collections::HashSet;

use rand::seq::index;
use rand::Rng;

use lotto_db::models::{
    is_valid_number, Combination, DrawError, DrawHistory, PICK_COUNT, POOL_SIZE,
};

use crate::error::AnalysisError;

pub const DEFAULT_ATTEMPT_LIMIT: usize = 100_000;

/// Source d'aléa : tirage sans remise de `amount` numéros parmi 1..=`pool`.
pub trait NumberSource {
    fn sample_distinct(&mut self, pool: u8, amount: usize) -> Vec<u8>;
}

impl<R: Rng + ?Sized> NumberSource for R {
    fn sample_distinct(&mut self, pool: u8, amount: usize) -> Vec<u8> {
        index::sample(self, pool as usize, amount)
            .into_iter()
            .map(|i| (i + 1) as u8)
            .collect()
    }
}

/// Combinaisons interdites à la génération.
pub trait Exclusion {
    fn is_excluded(&self, combination: &Combination) -> bool;
}

impl Exclusion for DrawHistory {
    fn is_excluded(&self, combination: &Combination) -> bool {
        self.contains(combination)
    }
}

/// Génère `count` combinations distinctes par échantillonnage avec rejet.
///
/// Une candidate est rejetée si elle est exclue, si elle ne contient aucun
/// numéro de `seeds` (quand `seeds` n'est pas vide) ou si elle a déjà été
/// produite par cet appel. `attempt_limit` borne le nombre total de tirages
/// pour l'ensemble de l'appel.
pub fn generate_combinations<E, S>(
    exclusion: &E,
    seeds: &[u8],
    count: usize,
    attempt_limit: usize,
    source: &mut S,
) -> Result<Vec<Combination>, AnalysisError>
where
    E: Exclusion + ?Sized,
    S: NumberSource + ?Sized,
{
    if let Some(&bad) = seeds.iter().find(|&&n| !is_valid_number(n)) {
        return Err(DrawError::OutOfRange(bad).into());
    }

    let mut accepted: Vec<Combination> = Vec::with_capacity(count);
    let mut seen: HashSet<Combination> = HashSet::with_capacity(count);
    let mut attempts = 0usize;

    while accepted.len() < count {
        if attempts >= attempt_limit {
            tracing::warn!(
                attempts,
                generated = accepted.len(),
                requested = count,
                "génération épuisée"
            );
            return Err(AnalysisError::GenerationExhausted {
                attempts,
                generated: accepted.len(),
                requested: count,
            });
        }
        attempts += 1;

        let candidate = Combination::from_slice(&source.sample_distinct(POOL_SIZE, PICK_COUNT))?;
        if !seeds.is_empty() && !candidate.intersects(seeds) {
            continue;
        }
        if exclusion.is_excluded(&candidate) || seen.contains(&candidate) {
            continue;
        }

        seen.insert(candidate);
        accepted.push(candidate);
    }

    tracing::debug!(attempts, generated = accepted.len(), "combinaisons générées");
    Ok(accepted)
}
