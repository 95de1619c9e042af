use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::import::ImportResult;
use eurokey_bag::Bag;
use eurokey_db::models::{DailyKey, Pool, StatRow};

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    for (pool, count) in &result.imported {
        println!("  {:<18}: {}", pool.name(), count);
    }
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_rows(pool: Pool, rows: &[StatRow]) {
    println!("\n── {} ({} valeurs) ──", pool.name(), rows.len());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Numéro", "Tirages", "%", "Dernier tirage", "Date", "Retard"]);

    for row in rows {
        table.add_row(vec![
            format!("{:2}", row.number),
            row.total_draw_times.to_string(),
            format!("{:.2}", row.total_draw_times_percentage),
            row.last_draw_id.clone(),
            row.last_draw_date.format("%d/%m/%Y").to_string(),
            row.missing_draws.to_string(),
        ]);
    }
    println!("{table}");
}

/// Poids de chaque numéro dans le sac, du plus lourd au plus léger.
pub fn display_bag(pool: Pool, bag: &Bag, rows: &[StatRow], diagnosis: Option<&str>) {
    println!("\n🎒 Sac {} : {} éléments, total {:.2} %\n", pool.name(), bag.len(), bag.total_percentage());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Numéro", "Occurrences", "Poids %", "Retard", "% tirages"]);

    let counts = bag.counts();
    let uniform = 100.0 / counts.len().max(1) as f64;

    let mut weights: Vec<(u8, f64)> = bag
        .percentages()
        .into_iter()
        .filter(|(n, _)| counts.contains_key(n))
        .collect();
    weights.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (number, pct) in weights {
        let color = if pct > uniform * 1.3 {
            Color::Green
        } else if pct < uniform * 0.7 {
            Color::Red
        } else {
            Color::White
        };
        let row = rows.iter().find(|r| r.number == number);
        table.add_row(vec![
            Cell::new(format!("{:2}", number)),
            Cell::new(counts.get(&number).copied().unwrap_or(0)),
            Cell::new(format!("{:.2}", pct)).fg(color),
            Cell::new(row.map(|r| r.missing_draws.to_string()).unwrap_or_default()),
            Cell::new(row.map(|r| format!("{:.2}", r.total_draw_times_percentage)).unwrap_or_default()),
        ]);
    }
    println!("{table}");

    match diagnosis {
        None => println!("Validation : OK"),
        Some(msg) => println!("Validation : ÉCHEC ({})", msg),
    }
}

/// Affiche la clé ; les `numbers_count` premiers numéros sont les numéros, le reste les étoiles.
pub fn display_key(daily: &DailyKey, numbers_count: usize, cached: bool) {
    let split = numbers_count.min(daily.key.len());
    let (numbers, stars) = daily.key.split_at(split);

    let origin = if cached { "clé enregistrée" } else { "nouvelle clé" };
    println!("\n🎲 Clé du {} ({})\n", daily.date.format("%d/%m/%Y"), origin);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Numéros", "Étoiles"]);
    table.add_row(vec![join_numbers(numbers), join_numbers(stars)]);
    println!("{table}");
}

pub fn display_history(keys: &[DailyKey], numbers_count: usize) {
    if keys.is_empty() {
        println!("Aucune clé enregistrée.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Numéros", "Étoiles"]);

    for daily in keys {
        let split = numbers_count.min(daily.key.len());
        let (numbers, stars) = daily.key.split_at(split);
        table.add_row(vec![
            daily.date.format("%d/%m/%Y").to_string(),
            join_numbers(numbers),
            join_numbers(stars),
        ]);
    }
    println!("{table}");
}
