use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;

use eurokey_db::db::replace_rows;
use eurokey_db::models::{parse_day_month_year, validate_row, Pool, StatRow};
use eurokey_db::rusqlite::Connection;

pub fn parse_french_decimal(s: &str) -> Result<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    let normalized = s.replace(',', ".");
    normalized
        .parse::<f64>()
        .with_context(|| format!("Impossible de parser le nombre: '{}'", s))
}

/// Colonnes : catégorie;numéro;tirages;pourcentage;dernier tirage;date;retards
fn parse_record(record: &csv::StringRecord) -> Result<(Pool, StatRow)> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let pool: Pool = get(0)?.parse()?;
    let raw_number = get(1)?;
    let number = raw_number
        .parse::<u8>()
        .with_context(|| format!("Numéro invalide: '{}'", raw_number))?;
    let total_draw_times = get(2)?
        .parse::<u32>()
        .with_context(|| format!("Nombre de tirages invalide pour {}", number))?;
    let total_draw_times_percentage = parse_french_decimal(&get(3)?)?;
    let last_draw_id = get(4)?;
    let last_draw_date = parse_day_month_year(&get(5)?)?;
    let missing_draws = get(6)?
        .parse::<u32>()
        .with_context(|| format!("Retard invalide pour {}", number))?;

    let row = StatRow {
        number,
        total_draw_times,
        total_draw_times_percentage,
        last_draw_id,
        last_draw_date,
        missing_draws,
    };
    validate_row(&row)?;
    Ok((pool, row))
}

pub struct ParsedStats {
    pub rows: BTreeMap<Pool, Vec<StatRow>>,
    pub total_records: u32,
    pub errors: u32,
}

/// Lit le tableau de statistiques ; les lignes invalides sont comptées et ignorées.
pub fn read_stats<R: Read>(input: R) -> ParsedStats {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(input);

    let mut parsed = ParsedStats {
        rows: BTreeMap::new(),
        total_records: 0,
        errors: 0,
    };

    for record_result in reader.records() {
        parsed.total_records += 1;
        let outcome = record_result
            .context("Erreur de lecture")
            .and_then(|record| parse_record(&record));
        match outcome {
            Ok((pool, row)) => parsed.rows.entry(pool).or_default().push(row),
            Err(e) => {
                warn!("ligne {} ignorée : {:#}", parsed.total_records, e);
                parsed.errors += 1;
            }
        }
    }

    for rows in parsed.rows.values_mut() {
        rows.sort_by_key(|r| r.number);
        rows.dedup_by_key(|r| r.number);
    }

    parsed
}

pub struct ImportResult {
    pub total_records: u32,
    pub imported: Vec<(Pool, usize)>,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let parsed = read_stats(file);

    let mut imported = Vec::new();
    for (pool, rows) in &parsed.rows {
        let n = replace_rows(conn, *pool, rows)?;
        imported.push((*pool, n));
    }

    Ok(ImportResult {
        total_records: parsed.total_records,
        imported,
        errors: parsed.errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use eurokey_db::db::{fetch_rows, migrate};

    const SAMPLE: &str = "\
categorie;numero;tirages;pourcentage;dernier;date;retards
numbers;1;180;10,71;045/2024;04/06/2024;3
numbers;2;167;9,94;041/2024;21/05/2024;7
stars;1;250;14,88;046/2024;07/06/2024;0
stars;2;231;13,75;040/2024;17/05/2024;8
numbers;x;1;1;1;01/01/2024;1
stars;3;210;12,50;039/2024;14/05/2024
";

    #[test]
    fn test_parse_french_decimal() {
        assert!((parse_french_decimal("10,71").unwrap() - 10.71).abs() < 1e-9);
        assert!((parse_french_decimal(" 3.5 ").unwrap() - 3.5).abs() < 1e-9);
        assert!((parse_french_decimal("").unwrap() - 0.0).abs() < 1e-9);
        assert!(parse_french_decimal("abc").is_err());
    }

    #[test]
    fn test_read_stats_groups_by_pool() {
        let parsed = read_stats(SAMPLE.as_bytes());
        assert_eq!(parsed.total_records, 6);
        assert_eq!(parsed.errors, 2);

        let numbers = &parsed.rows[&Pool::Numbers];
        assert_eq!(numbers.len(), 2);
        assert_eq!(numbers[1].number, 2);
        assert_eq!(numbers[1].missing_draws, 7);
        assert!((numbers[1].total_draw_times_percentage - 9.94).abs() < 1e-9);
        assert_eq!(numbers[1].last_draw_id, "041/2024");

        assert_eq!(parsed.rows[&Pool::Stars].len(), 2);
    }

    #[test]
    fn test_out_of_range_percentage_rejected() {
        let data = "h\nstars;1;1;120,0;001/2024;01/01/2024;0\n";
        let parsed = read_stats(data.as_bytes());
        assert_eq!(parsed.errors, 1);
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn test_import_replaces_pool() {
        let path = std::env::temp_dir().join(format!("eurokey-import-{}.csv", std::process::id()));
        std::fs::write(&path, SAMPLE).unwrap();

        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let result = import_csv(&conn, &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(result.errors, 2);
        assert_eq!(result.imported, vec![(Pool::Numbers, 2), (Pool::Stars, 2)]);
        assert_eq!(fetch_rows(&conn, Pool::Stars).unwrap()[0].total_draw_times, 250);
    }
}
