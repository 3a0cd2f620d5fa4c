use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use indicatif::ProgressBar;
use lotto_db::rusqlite::Connection;
use serde::Deserialize;

use crate::import::parse_date;
use lotto_db::db::{insert_draws, last_draw_no, missing_draw_nos};
use lotto_db::models::Draw;

pub const DEFAULT_BASE_URL: &str = "https://www.dhlottery.co.kr/common.do";

/// Réponse de l'API `getLottoNumber`. Seul `returnValue` est garanti.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawPayload {
    return_value: String,
    drw_no: Option<u32>,
    drw_no_date: Option<String>,
    drwt_no1: Option<u8>,
    drwt_no2: Option<u8>,
    drwt_no3: Option<u8>,
    drwt_no4: Option<u8>,
    drwt_no5: Option<u8>,
    drwt_no6: Option<u8>,
    bnus_no: Option<u8>,
}

/// `Ok(None)` : le tirage n'a pas encore eu lieu.
pub fn parse_payload(payload: DrawPayload) -> Result<Option<Draw>> {
    if payload.return_value != "success" {
        return Ok(None);
    }
    let draw_no = payload.drw_no.context("Champ drwNo manquant")?;
    let date = parse_date(payload.drw_no_date.as_deref().context("Champ drwNoDate manquant")?)?;
    let numbers = [
        payload.drwt_no1,
        payload.drwt_no2,
        payload.drwt_no3,
        payload.drwt_no4,
        payload.drwt_no5,
        payload.drwt_no6,
    ]
    .into_iter()
    .collect::<Option<Vec<u8>>>()
    .with_context(|| format!("Numéros manquants pour le tirage {}", draw_no))?;
    let bonus = payload.bnus_no.context("Champ bnusNo manquant")?;

    Draw::new(draw_no, date, &numbers, bonus)
        .with_context(|| format!("Tirage {} invalide", draw_no))
        .map(Some)
}

pub trait DrawSource {
    fn fetch_draw(&self, draw_no: u32) -> Result<Option<Draw>>;
}

pub struct LottoClient {
    http: reqwest::blocking::Client,
    base_url: String,
    retries: u32,
}

impl LottoClient {
    pub fn new(base_url: &str, retries: u32) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Impossible de créer le client HTTP")?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            retries,
        })
    }

    fn request(&self, draw_no: u32) -> Result<Option<Draw>> {
        let payload: DrawPayload = self
            .http
            .get(&self.base_url)
            .query(&[
                ("method", "getLottoNumber".to_string()),
                ("drwNo", draw_no.to_string()),
            ])
            .send()?
            .error_for_status()?
            .json()?;
        parse_payload(payload)
    }
}

impl DrawSource for LottoClient {
    fn fetch_draw(&self, draw_no: u32) -> Result<Option<Draw>> {
        let mut last_error = None;
        for attempt in 0..=self.retries {
            match self.request(draw_no) {
                Ok(draw) => return Ok(draw),
                Err(e) => {
                    tracing::warn!(draw_no, attempt, error = %e, "requête échouée");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("Aucune tentative pour le tirage {}", draw_no)))
    }
}

#[derive(Debug, Default)]
pub struct FetchSummary {
    pub inserted: usize,
    pub skipped: Vec<u32>,
    pub latest: Option<u32>,
}

/// Complète les trous de la base puis récupère séquentiellement les tirages
/// postérieurs au dernier tirage en base.
///
/// S'arrête au premier tirage inexistant, après `limit` tirages récupérés, ou
/// après `max_failures` échecs consécutifs. Un tirage en échec est ignoré et
/// sera redemandé au prochain appel.
pub fn refresh(
    conn: &Connection,
    source: &dyn DrawSource,
    max_failures: u32,
    limit: Option<u32>,
    progress: &ProgressBar,
) -> Result<FetchSummary> {
    let gaps = missing_draw_nos(conn)?;
    let start = last_draw_no(conn)?.map_or(1, |n| n + 1);
    tracing::info!(start, gaps = gaps.len(), "récupération des tirages");

    let mut draws: Vec<Draw> = Vec::new();
    let mut summary = FetchSummary {
        latest: start.checked_sub(1).filter(|&n| n > 0),
        ..FetchSummary::default()
    };
    let mut failures = 0u32;
    let mut stalled = false;

    for draw_no in gaps {
        if limit.is_some_and(|l| draws.len() as u32 >= l) {
            break;
        }
        progress.set_message(format!("tirage n°{draw_no} (rattrapage)"));
        match source.fetch_draw(draw_no) {
            Ok(Some(draw)) => {
                failures = 0;
                draws.push(draw);
            }
            Ok(None) => {
                tracing::warn!(draw_no, "tirage manquant introuvable");
                summary.skipped.push(draw_no);
            }
            Err(e) => {
                tracing::warn!(draw_no, error = %format!("{e:#}"), "tirage ignoré");
                summary.skipped.push(draw_no);
                failures += 1;
                if failures >= max_failures {
                    stalled = true;
                    break;
                }
            }
        }
        progress.inc(1);
    }

    let mut draw_no = start;
    while !stalled {
        if limit.is_some_and(|l| draws.len() as u32 >= l) {
            break;
        }
        progress.set_message(format!("tirage n°{draw_no}"));
        match source.fetch_draw(draw_no) {
            Ok(Some(draw)) => {
                failures = 0;
                summary.latest = Some(draw.draw_no);
                draws.push(draw);
            }
            Ok(None) => {
                tracing::info!(draw_no, "dernier tirage atteint");
                break;
            }
            Err(e) => {
                tracing::warn!(draw_no, error = %format!("{e:#}"), "tirage ignoré");
                summary.skipped.push(draw_no);
                failures += 1;
                if failures >= max_failures {
                    stalled = true;
                }
            }
        }
        progress.inc(1);
        draw_no += 1;
    }

    summary.inserted = insert_draws(conn, &draws)?;
    Ok(summary)
}
