use chrono::{Duration, NaiveDate};

use lotto_db::models::{Draw, DrawHistory, PICK_COUNT};

use crate::frequency::{count_numbers, FrequencyTable};

pub const DEFAULT_WINDOW_DAYS: u32 = 365;
pub const DEFAULT_TOP_K: usize = 5;

/// Tirages strictement postérieurs à `reference - window_days`.
pub fn recent_draws(
    history: &DrawHistory,
    reference: NaiveDate,
    window_days: u32,
) -> impl Iterator<Item = &Draw> + '_ {
    let cutoff = reference
        .checked_sub_signed(Duration::days(i64::from(window_days)))
        .unwrap_or(NaiveDate::MIN);
    history.iter().filter(move |d| d.date > cutoff)
}

pub fn recent_frequency(
    history: &DrawHistory,
    reference: NaiveDate,
    window_days: u32,
) -> FrequencyTable {
    count_numbers(recent_draws(history, reference, window_days))
}

/// Les `top_k` numéros les plus sortis sur la fenêtre.
///
/// Égalités départagées par valeur croissante ; seuls les numéros sortis au
/// moins une fois sont retenus, d'où une liste vide si la fenêtre est vide.
pub fn rank_recent_top_numbers(
    history: &DrawHistory,
    reference: NaiveDate,
    window_days: u32,
    top_k: usize,
) -> Vec<u8> {
    let table = recent_frequency(history, reference, window_days);
    let top: Vec<u8> = table
        .ranked()
        .into_iter()
        .filter(|&(_, count)| count > 0)
        .take(top_k)
        .map(|(n, _)| n)
        .collect();

    tracing::debug!(
        window_days,
        draws_in_window = table.total() as usize / PICK_COUNT,
        ?top,
        "classement récent"
    );
    top
}

/// Numéros absents de la fenêtre, par ordre croissant.
pub fn cold_numbers(history: &DrawHistory, reference: NaiveDate, window_days: u32) -> Vec<u8> {
    recent_frequency(history, reference, window_days).absent()
}
