mod display;
mod fetch;
mod import;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::display::{
    display_check, display_combinations, display_draws, display_fetch_summary, display_frequency,
    display_frequency_chart, display_import_summary, display_patterns, display_recent,
};
use crate::fetch::{DEFAULT_BASE_URL, LottoClient, refresh};
use lotto_analysis::frequency::analyze_frequency;
use lotto_analysis::generator::{DEFAULT_ATTEMPT_LIMIT, generate_combinations};
use lotto_analysis::patterns::analyze_patterns;
use lotto_analysis::recency::{
    DEFAULT_TOP_K, DEFAULT_WINDOW_DAYS, cold_numbers, rank_recent_top_numbers,
};
use lotto_analysis::AnalysisError;
use lotto_db::db::{count_draws, db_path, fetch_last_draws, load_history, migrate, open_db};
use lotto_db::models::{Combination, DrawHistory};
use lotto_db::rusqlite::Connection;

const EMPTY_DB: &str = "Base vide. Lancez d'abord : lotto fetch (ou lotto import)";

#[derive(Parser)]
#[command(name = "lotto", about = "Analyseur de tirages du loto 6/45")]
struct Cli {
    /// Chemin de la base SQLite (défaut : ./data/lotto.db)
    #[arg(long, global = true, env = "LOTTO_DB")]
    db: Option<PathBuf>,

    /// Logs détaillés sur stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer un historique (CSV ou JSON)
    Import {
        /// Chemin vers le fichier
        #[arg(short, long, default_value = "lotto_numbers.csv")]
        file: PathBuf,
    },

    /// Exporter la base au format JSON
    Export {
        /// Fichier de sortie
        #[arg(short, long, default_value = "data/lotto_numbers.json")]
        file: PathBuf,
    },

    /// Récupérer les nouveaux tirages depuis le site officiel
    Fetch {
        /// URL de l'API
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Nouvelles tentatives par tirage
        #[arg(long, default_value = "2")]
        retries: u32,

        /// Échecs consécutifs avant abandon
        #[arg(long, default_value = "3")]
        max_failures: u32,

        /// Nombre maximal de tirages à récupérer
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Statistiques : fréquences, motifs, numéros récents
    Stats {
        /// Fenêtre récente (jours)
        #[arg(short, long, default_value_t = DEFAULT_WINDOW_DAYS)]
        window_days: u32,

        /// Nombre de numéros favoris
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        top: usize,

        /// Date de référence (AAAA-MM-JJ, défaut : aujourd'hui)
        #[arg(long)]
        reference: Option<NaiveDate>,

        /// Afficher le graphique des fréquences
        #[arg(long)]
        chart: bool,
    },

    /// Générer des combinaisons jamais sorties
    Generate {
        /// Nombre de combinaisons
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Fenêtre récente (jours)
        #[arg(short, long, default_value_t = DEFAULT_WINDOW_DAYS)]
        window_days: u32,

        /// Nombre de numéros favoris
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        top: usize,

        /// Nombre maximal de tentatives
        #[arg(long, default_value_t = DEFAULT_ATTEMPT_LIMIT)]
        attempts: usize,

        /// Ne pas imposer de numéro favori
        #[arg(long)]
        no_bias: bool,

        /// Date de référence (AAAA-MM-JJ, défaut : aujourd'hui)
        #[arg(long)]
        reference: Option<NaiveDate>,
    },

    /// Vérifier si une combinaison est déjà sortie
    Check {
        /// 6 numéros (ex : 1,2,3,4,5,6 ou 1 2 3 4 5 6)
        #[arg(required = true, num_args = 1..)]
        numbers: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let path = cli.db.unwrap_or_else(db_path);
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::Export { file } => cmd_export(&conn, &file),
        Command::Fetch {
            base_url,
            retries,
            max_failures,
            limit,
        } => cmd_fetch(&conn, &base_url, retries, max_failures, limit),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats {
            window_days,
            top,
            reference,
            chart,
        } => cmd_stats(&conn, window_days, top, reference, chart),
        Command::Generate {
            count,
            seed,
            window_days,
            top,
            attempts,
            no_bias,
            reference,
        } => cmd_generate(&conn, count, seed, window_days, top, attempts, no_bias, reference),
        Command::Check { numbers } => cmd_check(&conn, &numbers),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn load_non_empty(conn: &Connection) -> Result<Option<DrawHistory>> {
    let history = load_history(conn)?;
    if history.is_empty() {
        println!("{EMPTY_DB}");
        return Ok(None);
    }
    Ok(Some(history))
}

fn cmd_import(conn: &Connection, file: &PathBuf) -> Result<()> {
    let result = import::import_file(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_export(conn: &Connection, file: &PathBuf) -> Result<()> {
    let written = import::export_json(conn, file)?;
    println!("{} tirages exportés dans {}", written, file.display());
    Ok(())
}

fn cmd_fetch(
    conn: &Connection,
    base_url: &str,
    retries: u32,
    max_failures: u32,
    limit: Option<u32>,
) -> Result<()> {
    let client = LottoClient::new(base_url, retries)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {pos} tirages {msg}")
        .context("Template de progression invalide")?);

    let summary = refresh(conn, &client, max_failures.max(1), limit, &pb)?;
    pb.finish_with_message("terminé");

    display_fetch_summary(&summary);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("{EMPTY_DB}");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(
    conn: &Connection,
    window_days: u32,
    top: usize,
    reference: Option<NaiveDate>,
    chart: bool,
) -> Result<()> {
    let Some(history) = load_non_empty(conn)? else {
        return Ok(());
    };
    let reference = reference.unwrap_or_else(today);

    let frequency = analyze_frequency(&history);
    display_frequency(&frequency, history.len());
    if chart {
        display_frequency_chart(&frequency);
    }

    let patterns = analyze_patterns(&history)?;
    display_patterns(&patterns, &patterns.top_consecutive_pairs(5));

    let top_numbers = rank_recent_top_numbers(&history, reference, window_days, top);
    let cold = cold_numbers(&history, reference, window_days);
    display_recent(&top_numbers, &cold, window_days);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    conn: &Connection,
    count: usize,
    seed: Option<u64>,
    window_days: u32,
    top: usize,
    attempts: usize,
    no_bias: bool,
    reference: Option<NaiveDate>,
) -> Result<()> {
    let history = load_history(conn)?;
    if history.is_empty() {
        tracing::warn!("historique vide : seules les contraintes de base s'appliquent");
    }
    let reference = reference.unwrap_or_else(today);

    let seeds = if no_bias {
        Vec::new()
    } else {
        rank_recent_top_numbers(&history, reference, window_days, top)
    };

    let mut rng: StdRng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    match generate_combinations(&history, &seeds, count, attempts, &mut rng) {
        Ok(combinations) => {
            display_combinations(&combinations, &seeds);
            Ok(())
        }
        Err(AnalysisError::GenerationExhausted { attempts, generated, requested }) => bail!(
            "Seulement {generated} combinaison(s) sur {requested} trouvée(s) en {attempts} tentatives. \
             Augmentez --attempts ou réduisez --count."
        ),
        Err(e) => Err(e.into()),
    }
}

fn cmd_check(conn: &Connection, numbers: &[String]) -> Result<()> {
    let combination: Combination = numbers
        .join(",")
        .parse()
        .context("Combinaison invalide : 6 numéros distincts de 1 à 45 attendus")?;

    let n = count_draws(conn)?;
    if n == 0 {
        bail!("{EMPTY_DB}");
    }
    let history = load_history(conn)?;
    display_check(&combination, history.winning_draw(&combination));
    Ok(())
}
