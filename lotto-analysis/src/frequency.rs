use serde::Serialize;

use lotto_db::models::{Draw, DrawHistory, POOL_SIZE};

/// Nombre d'apparitions de chaque numéro 1..=45, zéros compris.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyTable {
    counts: Vec<u32>,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self {
            counts: vec![0; POOL_SIZE as usize],
        }
    }
}

impl FrequencyTable {
    pub fn count(&self, number: u8) -> u32 {
        match number {
            1..=POOL_SIZE => self.counts[(number - 1) as usize],
            _ => 0,
        }
    }

    /// (numéro, fréquence) par numéro croissant.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| ((i + 1) as u8, c))
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Numéros par fréquence décroissante, puis par valeur croissante.
    pub fn ranked(&self) -> Vec<(u8, u32)> {
        let mut ranked: Vec<(u8, u32)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    /// Numéros jamais sortis, par ordre croissant.
    pub fn absent(&self) -> Vec<u8> {
        self.iter().filter(|&(_, c)| c == 0).map(|(n, _)| n).collect()
    }

    fn record(&mut self, draw: &Draw) {
        for &n in draw.numbers.numbers() {
            self.counts[(n - 1) as usize] += 1;
        }
    }
}

pub fn count_numbers<'a>(draws: impl IntoIterator<Item = &'a Draw>) -> FrequencyTable {
    let mut table = FrequencyTable::default();
    for draw in draws {
        table.record(draw);
    }
    table
}

pub fn analyze_frequency(history: &DrawHistory) -> FrequencyTable {
    count_numbers(history)
}
