use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use lotto_analysis::recency::{DEFAULT_TOP_K, DEFAULT_WINDOW_DAYS};
use lotto_analysis::report::ReportOptions;

/// Configuration du serveur : arguments ou variables d'environnement (`.env` accepté).
#[derive(Debug, Clone, Parser)]
#[command(name = "lotto-web", about = "Serveur HTTP d'analyse du loto 6/45")]
pub struct Config {
    /// Adresse d'écoute
    #[arg(long, env = "LOTTO_WEB_ADDR", default_value = "127.0.0.1:5000")]
    pub addr: SocketAddr,

    /// Chemin de la base SQLite (défaut : ./data/lotto.db)
    #[arg(long, env = "LOTTO_DB")]
    pub db: Option<PathBuf>,

    /// Fenêtre récente (jours)
    #[arg(long, env = "LOTTO_WINDOW_DAYS", default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window_days: u32,

    /// Nombre de numéros favoris
    #[arg(long, env = "LOTTO_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Nombre de combinaisons proposées
    #[arg(long, env = "LOTTO_RECOMMENDATIONS", default_value_t = 5)]
    pub recommendations: usize,

    /// Date de référence fixe (AAAA-MM-JJ) ; défaut : jour courant
    #[arg(long, env = "LOTTO_REFERENCE_DATE")]
    pub reference: Option<NaiveDate>,
}

impl Config {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(lotto_db::db::db_path)
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            window_days: self.window_days,
            top_k: self.top_k,
            recommendations: self.recommendations,
            ..ReportOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["lotto-web"]).unwrap();
        assert_eq!(config.window_days, 365);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.report_options().recommendations, 5);
        assert_eq!(config.report_options().attempt_limit, 100_000);
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "lotto-web",
            "--addr",
            "0.0.0.0:8080",
            "--window-days",
            "90",
            "--reference",
            "2024-10-19",
        ])
        .unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.report_options().window_days, 90);
        assert_eq!(config.reference, NaiveDate::from_ymd_opt(2024, 10, 19));
    }
}
