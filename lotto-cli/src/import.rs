use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use lotto_db::rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use lotto_db::db::{fetch_all_draws, insert_draw};
use lotto_db::models::{Combination, Draw};

/// Ligne du CSV historique : les numéros y sont une liste texte `[1, 2, 3, 4, 5, 6]`.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "회차")]
    draw_no: u32,
    #[serde(rename = "날짜")]
    date: String,
    #[serde(rename = "번호")]
    numbers: String,
    #[serde(rename = "보너스 번호")]
    bonus: u8,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonRecord {
    #[serde(rename = "회차")]
    draw_no: u32,
    #[serde(rename = "날짜")]
    date: String,
    #[serde(rename = "번호")]
    numbers: Vec<u8>,
    #[serde(rename = "보너스 번호")]
    bonus: u8,
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(datetime.date());
    }
    bail!("Format de date invalide: '{}'", raw)
}

fn csv_to_draw(record: CsvRecord) -> Result<Draw> {
    let numbers: Combination = record
        .numbers
        .parse()
        .with_context(|| format!("Numéros illisibles pour le tirage {}", record.draw_no))?;
    let date = parse_date(&record.date)?;
    Ok(Draw::new(record.draw_no, date, numbers.numbers(), record.bonus)?)
}

fn json_to_draw(record: JsonRecord) -> Result<Draw> {
    let date = parse_date(&record.date)?;
    Draw::new(record.draw_no, date, &record.numbers, record.bonus)
        .with_context(|| format!("Tirage {} invalide", record.draw_no))
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

impl ImportResult {
    fn record(&mut self, conn: &Connection, parsed: Result<Draw>) {
        self.total_records += 1;
        match parsed {
            Ok(draw) => match insert_draw(conn, &draw) {
                Ok(true) => self.inserted += 1,
                Ok(false) => self.skipped += 1,
                Err(e) => {
                    tracing::warn!(line = self.total_records, error = %e, "erreur d'insertion");
                    self.errors += 1;
                }
            },
            Err(e) => {
                tracing::warn!(line = self.total_records, error = %format!("{e:#}"), "ligne ignorée");
                self.errors += 1;
            }
        }
    }
}

/// Importe un historique CSV ou JSON, selon l'extension du fichier.
pub fn import_file(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        import_json(conn, path)
    } else {
        import_csv(conn, path)
    }
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();
    for record in reader.deserialize::<CsvRecord>() {
        let parsed = record
            .context("Ligne CSV illisible")
            .and_then(csv_to_draw);
        result.record(&tx, parsed);
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

pub fn import_json(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let file = File::open(path).with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let rows: Vec<serde_json::Value> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("JSON invalide dans {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();
    for row in rows {
        let parsed = serde_json::from_value::<JsonRecord>(row)
            .context("Enregistrement JSON illisible")
            .and_then(json_to_draw);
        result.record(&tx, parsed);
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

/// Exporte toute la base au format JSON historique. Renvoie le nombre de tirages écrits.
pub fn export_json(conn: &Connection, path: &Path) -> Result<usize> {
    let draws = fetch_all_draws(conn)?;
    let records: Vec<JsonRecord> = draws
        .iter()
        .map(|d| JsonRecord {
            draw_no: d.draw_no,
            date: d.date.format("%Y-%m-%d").to_string(),
            numbers: d.numbers.numbers().to_vec(),
            bonus: d.bonus,
        })
        .collect();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("Impossible de créer {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &records)
        .with_context(|| format!("Échec de l'écriture de {:?}", path))?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_db::db::{count_draws, migrate};
    use std::io::Write;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2002, 12, 7).unwrap();
        assert_eq!(parse_date("2002-12-07").unwrap(), expected);
        assert_eq!(parse_date("2002.12.07").unwrap(), expected);
        assert_eq!(parse_date("2002-12-07 00:00:00").unwrap(), expected);
        assert!(parse_date("07/12").is_err());
    }

    #[test]
    fn test_import_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "회차,날짜,번호,보너스 번호").unwrap();
        writeln!(file, "1,2002-12-07,\"[10, 23, 29, 33, 37, 40]\",16").unwrap();
        writeln!(file, "2,2002-12-14,\"[9, 13, 21, 25, 32, 42]\",2").unwrap();
        writeln!(file, "3,2002-12-21,\"[1, 1, 2, 3, 4, 5]\",7").unwrap();
        writeln!(file, "1,2002-12-07,\"[10, 23, 29, 33, 37, 40]\",16").unwrap();
        file.flush().unwrap();

        let conn = memory_db();
        let result = import_file(&conn, file.path()).unwrap();
        assert_eq!(result.total_records, 4);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors, 1);
        assert_eq!(count_draws(&conn).unwrap(), 2);
    }

    #[test]
    fn test_import_json_and_export() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"회차": 1, "날짜": "2002-12-07", "번호": [10, 23, 29, 33, 37, 40], "보너스 번호": 16}},
                {{"회차": 2, "날짜": "2002-12-14", "번호": [9, 13, 21, 25, 32, 42], "보너스 번호": 2}},
                {{"회차": 3, "날짜": "2002-12-21", "번호": [9, 13], "보너스 번호": 2}}
            ]"#
        )
        .unwrap();
        file.flush().unwrap();

        let conn = memory_db();
        let result = import_file(&conn, file.path()).unwrap();
        assert_eq!(result.inserted, 2);
        assert_eq!(result.errors, 1);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("export").join("lotto_numbers.json");
        assert_eq!(export_json(&conn, &out).unwrap(), 2);

        let other = memory_db();
        let reimported = import_file(&other, &out).unwrap();
        assert_eq!(reimported.inserted, 2);
        assert_eq!(reimported.errors, 0);
    }

    #[test]
    fn test_import_missing_file() {
        let conn = memory_db();
        assert!(import_file(&conn, Path::new("/nonexistent/lotto.csv")).is_err());
    }
}
