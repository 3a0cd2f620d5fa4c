use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::models::{Draw, DrawHistory};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    draw_no  INTEGER PRIMARY KEY,
    date     TEXT NOT NULL,
    n1       INTEGER NOT NULL,
    n2       INTEGER NOT NULL,
    n3       INTEGER NOT NULL,
    n4       INTEGER NOT NULL,
    n5       INTEGER NOT NULL,
    n6       INTEGER NOT NULL,
    bonus    INTEGER NOT NULL
);
";

const SELECT_COLUMNS: &str = "SELECT draw_no, date, n1, n2, n3, n4, n5, n6, bonus FROM draws";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotto.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let n = draw.numbers.numbers();
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (draw_no, date, n1, n2, n3, n4, n5, n6, bonus)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            draw.draw_no,
            draw.date,
            n[0],
            n[1],
            n[2],
            n[3],
            n[4],
            n[5],
            draw.bonus,
        ],
    ).with_context(|| format!("Échec de l'insertion du tirage n°{}", draw.draw_no))?;
    Ok(changed > 0)
}

/// Insère un lot de tirages dans une seule transaction. Renvoie le nombre de nouvelles lignes.
pub fn insert_draws(conn: &Connection, draws: &[Draw]) -> Result<usize> {
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;
    let mut inserted = 0;
    for draw in draws {
        if insert_draw(&tx, draw)? {
            inserted += 1;
        }
    }
    tx.commit().context("Échec du commit")?;
    Ok(inserted)
}

struct RawDraw {
    draw_no: u32,
    date: NaiveDate,
    numbers: [u8; 6],
    bonus: u8,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDraw> {
    Ok(RawDraw {
        draw_no: row.get(0)?,
        date: row.get(1)?,
        numbers: [
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
            row.get::<_, u8>(7)?,
        ],
        bonus: row.get(8)?,
    })
}

fn into_draw(raw: RawDraw) -> Result<Draw> {
    Draw::new(raw.draw_no, raw.date, &raw.numbers, raw.bonus)
        .with_context(|| format!("Tirage n°{} invalide en base", raw.draw_no))
}

pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY draw_no DESC LIMIT ?1"))?;
    let rows = stmt
        .query_map([limit], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_draw).collect()
}

pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY draw_no ASC"))?;
    let rows = stmt
        .query_map([], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_draw).collect()
}

/// Charge l'historique complet, validé, trié par numéro de tirage.
pub fn load_history(conn: &Connection) -> Result<DrawHistory> {
    let draws = fetch_all_draws(conn)?;
    DrawHistory::new(draws).context("Historique incohérent")
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

pub fn last_draw_no(conn: &Connection) -> Result<Option<u32>> {
    let last: Option<u32> = conn
        .query_row("SELECT MAX(draw_no) FROM draws", [], |row| row.get::<_, Option<u32>>(0))
        .optional()?
        .flatten();
    Ok(last)
}

/// Numéros absents de la base entre 1 et le dernier tirage enregistré.
pub fn missing_draw_nos(conn: &Connection) -> Result<Vec<u32>> {
    let mut stmt = conn.prepare("SELECT draw_no FROM draws ORDER BY draw_no ASC")?;
    let present = stmt
        .query_map([], |row| row.get::<_, u32>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut missing = Vec::new();
    let mut expected = 1;
    for no in present {
        missing.extend(expected..no);
        expected = no + 1;
    }
    Ok(missing)
}
