use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Une ligne du tableau de statistiques : un numéro candidat et son historique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub number: u8,
    pub total_draw_times: u32,
    /// Pourcentage des tirages où le numéro est sorti (0-100).
    pub total_draw_times_percentage: f64,
    pub last_draw_id: String,
    pub last_draw_date: NaiveDate,
    /// Nombre de tirages consécutifs sans apparition.
    pub missing_draws: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    Numbers,
    Stars,
}

impl Pool {
    pub const ALL: [Pool; 2] = [Pool::Numbers, Pool::Stars];

    pub fn name(&self) -> &'static str {
        match self {
            Pool::Numbers => "numbers",
            Pool::Stars => "stars",
        }
    }

    pub fn pick_count(&self) -> usize {
        match self {
            Pool::Numbers => 5,
            Pool::Stars => 2,
        }
    }
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Pool {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "numbers" | "numeros" | "numéros" | "boules" => Ok(Pool::Numbers),
            "stars" | "estrelas" | "etoiles" | "étoiles" => Ok(Pool::Stars),
            other => bail!("Catégorie inconnue : '{}'", other),
        }
    }
}

/// Une catégorie à tirer : ses lignes de statistiques et combien de valeurs en choisir.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub rows: Vec<StatRow>,
    pub pick_count: usize,
}

impl Category {
    pub fn new(name: impl Into<String>, rows: Vec<StatRow>, pick_count: usize) -> Self {
        Self {
            name: name.into(),
            rows,
            pick_count,
        }
    }

    pub fn from_pool(pool: Pool, rows: Vec<StatRow>) -> Self {
        Self::new(pool.name(), rows, pool.pick_count())
    }
}

/// Clé retenue pour un jour donné.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyKey {
    pub date: NaiveDate,
    pub key: Vec<u8>,
}

pub fn validate_row(row: &StatRow) -> Result<()> {
    if row.number < 1 {
        bail!("Numéro {} hors limites (>= 1)", row.number);
    }
    if !(0.0..=100.0).contains(&row.total_draw_times_percentage) {
        bail!(
            "Pourcentage {} hors limites (0-100) pour le numéro {}",
            row.total_draw_times_percentage,
            row.number
        );
    }
    Ok(())
}

/// Date du tableau source, au format JJ/MM/AAAA.
pub fn parse_day_month_year(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y")
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

/// Lignes synthétiques 1..=count, utilisées par les tests des différentes crates.
pub fn make_test_rows(count: u8) -> Vec<StatRow> {
    (1..=count)
        .map(|n| {
            let total = 150 + (n as u32 * 37) % 23;
            StatRow {
                number: n,
                total_draw_times: total,
                total_draw_times_percentage: total as f64 / 15.0,
                last_draw_id: format!("{:03}/2024", n),
                last_draw_date: NaiveDate::from_ymd_opt(2024, 1, (n as u32 % 28) + 1)
                    .unwrap_or_default(),
                missing_draws: (n as u32 * 11) % 17,
            }
        })
        .collect()
}
