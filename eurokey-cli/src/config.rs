use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use eurokey_db::db::db_path;
use eurokey_db::models::Pool;

pub const DEFAULT_CONFIG_PATH: &str = "eurokey.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page d'où proviennent les statistiques à importer.
    pub statistics_source: String,
    pub db_path: Option<PathBuf>,
    pub numbers_pick: usize,
    pub stars_pick: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            statistics_source: "https://www.jogossantacasa.pt/web/SCEstatisticas/".to_string(),
            db_path: None,
            numbers_pick: Pool::Numbers.pick_count(),
            stars_pick: Pool::Stars.pick_count(),
        }
    }
}

impl AppConfig {
    /// Charge la configuration ; un fichier absent donne les valeurs par défaut.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {:?}", path))?;
        let config: AppConfig = serde_json::from_str(&json)
            .with_context(|| format!("Configuration invalide dans {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(db_path)
    }

    pub fn pick_count(&self, pool: Pool) -> usize {
        match pool {
            Pool::Numbers => self.numbers_pick,
            Pool::Stars => self.stars_pick,
        }
    }
}
