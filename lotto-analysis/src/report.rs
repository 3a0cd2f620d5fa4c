use chrono::NaiveDate;
use serde::Serialize;

use lotto_db::models::{Combination, DrawHistory};

use crate::error::AnalysisError;
use crate::frequency::{analyze_frequency, FrequencyTable};
use crate::generator::{generate_combinations, NumberSource, DEFAULT_ATTEMPT_LIMIT};
use crate::patterns::{analyze_patterns, PatternReport};
use crate::recency::{cold_numbers, rank_recent_top_numbers, DEFAULT_TOP_K, DEFAULT_WINDOW_DAYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub window_days: u32,
    pub top_k: usize,
    pub recommendations: usize,
    pub attempt_limit: usize,
    pub pair_limit: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            top_k: DEFAULT_TOP_K,
            recommendations: 5,
            attempt_limit: DEFAULT_ATTEMPT_LIMIT,
            pair_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub reference: NaiveDate,
    pub draw_count: usize,
    pub last_draw_no: Option<u32>,
    pub frequency: FrequencyTable,
    pub patterns: PatternReport,
    pub top_pairs: Vec<((u8, u8), u32)>,
    pub top_numbers: Vec<u8>,
    pub cold_numbers: Vec<u8>,
    pub recommendations: Vec<Combination>,
}

/// Assemble l'analyse complète et les recommandations biaisées vers les numéros récents.
pub fn build_report<S: NumberSource + ?Sized>(
    history: &DrawHistory,
    reference: NaiveDate,
    options: &ReportOptions,
    source: &mut S,
) -> Result<AnalysisReport, AnalysisError> {
    let patterns = analyze_patterns(history)?;
    let top_numbers =
        rank_recent_top_numbers(history, reference, options.window_days, options.top_k);
    let recommendations = generate_combinations(
        history,
        &top_numbers,
        options.recommendations,
        options.attempt_limit,
        source,
    )?;

    Ok(AnalysisReport {
        reference,
        draw_count: history.len(),
        last_draw_no: history.last_draw_no(),
        frequency: analyze_frequency(history),
        top_pairs: patterns.top_consecutive_pairs(options.pair_limit),
        patterns,
        top_numbers,
        cold_numbers: cold_numbers(history, reference, options.window_days),
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_db::models::Draw;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_report_contents() {
        let history = DrawHistory::new(vec![
            Draw::new(1, date("2024-08-03"), &[1, 2, 3, 4, 5, 6], 7).unwrap(),
            Draw::new(2, date("2024-08-10"), &[1, 2, 13, 24, 35, 45], 8).unwrap(),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let options = ReportOptions::default();
        let report = build_report(&history, date("2024-10-19"), &options, &mut rng).unwrap();

        assert_eq!(report.draw_count, 2);
        assert_eq!(report.last_draw_no, Some(2));
        assert_eq!(report.frequency.total(), 12);
        assert_eq!(report.top_numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(report.top_pairs[0], ((1, 2), 2));
        assert_eq!(report.cold_numbers.len(), 45 - 10);
        assert_eq!(report.recommendations.len(), 5);
        assert!(report.recommendations.iter().all(|c| c.intersects(&report.top_numbers)));
    }

    #[test]
    fn test_report_empty_history() {
        let mut rng = StdRng::seed_from_u64(5);
        let empty = DrawHistory::default();
        let options = ReportOptions::default();
        let err = build_report(&empty, date("2024-10-19"), &options, &mut rng).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData);
    }

    #[test]
    fn test_report_without_recent_draws_is_unbiased() {
        let history = DrawHistory::new(vec![
            Draw::new(1, date("2001-01-06"), &[1, 2, 3, 4, 5, 6], 7).unwrap(),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let options = ReportOptions::default();
        let report = build_report(&history, date("2024-10-19"), &options, &mut rng).unwrap();
        assert!(report.top_numbers.is_empty());
        assert_eq!(report.recommendations.len(), 5);
    }

    #[test]
    fn test_report_serializes() {
        let history = DrawHistory::new(vec![
            Draw::new(1, date("2024-10-12"), &[1, 2, 3, 4, 5, 6], 7).unwrap(),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let options = ReportOptions::default();
        let report = build_report(&history, date("2024-10-19"), &options, &mut rng).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["draw_count"], 1);
        assert_eq!(json["recommendations"].as_array().unwrap().len(), 5);
        assert_eq!(json["frequency"]["counts"].as_array().unwrap().len(), 45);
    }
}
