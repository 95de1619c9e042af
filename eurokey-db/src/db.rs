use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::models::{DailyKey, Pool, StatRow};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS stat_rows (
    pool                         TEXT NOT NULL,
    number                       INTEGER NOT NULL,
    total_draw_times             INTEGER NOT NULL,
    total_draw_times_percentage  REAL NOT NULL,
    last_draw_id                 TEXT NOT NULL DEFAULT '',
    last_draw_date               TEXT NOT NULL,
    missing_draws                INTEGER NOT NULL,
    PRIMARY KEY (pool, number)
);

CREATE TABLE IF NOT EXISTS daily_keys (
    date  TEXT PRIMARY KEY,
    key   TEXT NOT NULL
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("eurokey.db");
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

/// Remplace tout le tableau de statistiques d'une catégorie.
pub fn replace_rows(conn: &Connection, pool: Pool, rows: &[StatRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    tx.execute("DELETE FROM stat_rows WHERE pool = ?1", [pool.name()])
        .context("Échec de la suppression")?;

    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO stat_rows (pool, number, total_draw_times, total_draw_times_percentage, last_draw_id, last_draw_date, missing_draws)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for row in rows {
            stmt.execute(rusqlite::params![
                pool.name(),
                row.number,
                row.total_draw_times,
                row.total_draw_times_percentage,
                row.last_draw_id,
                row.last_draw_date,
                row.missing_draws,
            ]).context("Échec de l'insertion")?;
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(rows.len())
}

pub fn fetch_rows(conn: &Connection, pool: Pool) -> Result<Vec<StatRow>> {
    let mut stmt = conn.prepare(
        "SELECT number, total_draw_times, total_draw_times_percentage, last_draw_id, last_draw_date, missing_draws
         FROM stat_rows WHERE pool = ?1 ORDER BY number ASC"
    )?;
    let rows = stmt.query_map([pool.name()], |row| {
        Ok(StatRow {
            number: row.get(0)?,
            total_draw_times: row.get(1)?,
            total_draw_times_percentage: row.get(2)?,
            last_draw_id: row.get(3)?,
            last_draw_date: row.get(4)?,
            missing_draws: row.get(5)?,
        })
    })?.collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_rows(conn: &Connection, pool: Pool) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM stat_rows WHERE pool = ?1",
        [pool.name()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn save_daily_key(conn: &Connection, daily: &DailyKey) -> Result<()> {
    let key = serde_json::to_string(&daily.key)?;
    conn.execute(
        "INSERT OR REPLACE INTO daily_keys (date, key) VALUES (?1, ?2)",
        rusqlite::params![daily.date, key],
    ).context("Échec de l'enregistrement de la clé")?;
    Ok(())
}

pub fn fetch_daily_key(conn: &Connection, date: NaiveDate) -> Result<Option<DailyKey>> {
    let raw: Option<String> = conn
        .query_row("SELECT key FROM daily_keys WHERE date = ?1", [date], |row| row.get(0))
        .optional()?;
    match raw {
        Some(json) => {
            let key: Vec<u8> = serde_json::from_str(&json)
                .with_context(|| format!("Clé corrompue pour le {}", date))?;
            Ok(Some(DailyKey { date, key }))
        }
        None => Ok(None),
    }
}

pub fn fetch_last_keys(conn: &Connection, limit: u32) -> Result<Vec<DailyKey>> {
    let mut stmt = conn.prepare(
        "SELECT date, key FROM daily_keys ORDER BY date DESC LIMIT ?1"
    )?;
    let raw = stmt.query_map([limit], |row| {
        Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, String>(1)?))
    })?.collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(date, json)| -> Result<DailyKey> {
            let key: Vec<u8> = serde_json::from_str(&json)
                .with_context(|| format!("Clé corrompue pour le {}", date))?;
            Ok(DailyKey { date, key })
        })
        .collect()
}

/// Oublie la clé du jour, pour forcer une nouvelle génération.
pub fn clear_daily_key(conn: &Connection, date: NaiveDate) -> Result<bool> {
    let changed = conn.execute("DELETE FROM daily_keys WHERE date = ?1", [date])?;
    Ok(changed > 0)
}
