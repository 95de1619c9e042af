mod config;
mod display;
mod import;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{AppConfig, DEFAULT_CONFIG_PATH};
use crate::display::{
    display_bag, display_history, display_import_summary, display_key, display_rows,
};
use eurokey_bag::rng::make_rng;
use eurokey_bag::validator::diagnose;
use eurokey_bag::{build_bag, generate_key};
use eurokey_db::db::{
    clear_daily_key, count_rows, fetch_daily_key, fetch_last_keys, fetch_rows, migrate, open_db,
    save_daily_key,
};
use eurokey_db::models::{Category, DailyKey, Pool};
use eurokey_db::rusqlite::Connection;

#[derive(Parser)]
#[command(name = "eurokey", about = "Clé EuroMillions du jour, pondérée par les statistiques")]
struct Cli {
    /// Fichier de configuration (JSON)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer le tableau de statistiques depuis un fichier CSV
    Import {
        /// Chemin vers le fichier CSV (séparateur ';')
        #[arg(short, long, default_value = "assets/statistiques.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Afficher les statistiques importées
    Stats {
        /// Catégorie (numbers ou stars), toutes par défaut
        #[arg(short, long)]
        pool: Option<Pool>,
    },

    /// Construire et valider le sac d'une catégorie
    Bag {
        /// Catégorie (numbers ou stars)
        #[arg(short, long, default_value = "numbers")]
        pool: Pool,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Afficher la clé du jour (générée si absente)
    Key {
        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Oublier la clé du jour et en générer une nouvelle
        #[arg(long)]
        refresh: bool,
    },

    /// Lister les dernières clés enregistrées
    History {
        /// Nombre de clés à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Gérer le fichier de configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Écrire la configuration par défaut
    Init {
        /// Écraser un fichier existant
        #[arg(long)]
        force: bool,
    },
    /// Afficher la configuration effective
    Show,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    if let Command::Config { action } = &cli.command {
        return cmd_config(&config, &cli.config, action);
    }

    let path = config.db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            for pool in Pool::ALL {
                println!("  {:<8}: {} lignes", pool.name(), count_rows(&conn, pool)?);
            }
            Ok(())
        }
        Command::Stats { pool } => cmd_stats(&conn, &config, pool),
        Command::Bag { pool, seed } => cmd_bag(&conn, &config, pool, seed),
        Command::Key { seed, refresh } => cmd_key(&conn, &config, seed, refresh),
        Command::History { last } => cmd_history(&conn, &config, last),
        Command::Config { .. } => Ok(()),
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn print_no_data(pool: Pool, config: &AppConfig) {
    println!("Aucune statistique pour '{}'. Lancez d'abord : eurokey import --file <csv>", pool);
    println!("Source des statistiques : {}", config.statistics_source);
}

fn cmd_config(config: &AppConfig, path: &PathBuf, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{:?} existe déjà (utilisez --force pour l'écraser)", path);
            }
            AppConfig::default().save(path)?;
            println!("Configuration écrite dans {}", path.display());
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}

fn cmd_import(conn: &Connection, file: &PathBuf) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);

    // Les statistiques ont changé : la clé du jour sera régénérée.
    if !result.imported.is_empty() && clear_daily_key(conn, today())? {
        println!("Clé du jour effacée.");
    }
    Ok(())
}

fn cmd_stats(conn: &Connection, config: &AppConfig, pool: Option<Pool>) -> Result<()> {
    let pools = match pool {
        Some(p) => vec![p],
        None => Pool::ALL.to_vec(),
    };
    for pool in pools {
        let rows = fetch_rows(conn, pool)?;
        if rows.is_empty() {
            print_no_data(pool, config);
            continue;
        }
        display_rows(pool, &rows);
    }
    Ok(())
}

fn cmd_bag(conn: &Connection, config: &AppConfig, pool: Pool, seed: Option<u64>) -> Result<()> {
    let rows = fetch_rows(conn, pool)?;
    if rows.is_empty() {
        print_no_data(pool, config);
        return Ok(());
    }

    let mut rng = make_rng(seed);
    let bag = build_bag(&rows, &mut rng)?;
    let diagnosis = diagnose(&bag, &rows);
    display_bag(pool, &bag, &rows, diagnosis.as_deref());
    Ok(())
}

fn cmd_key(conn: &Connection, config: &AppConfig, seed: Option<u64>, refresh: bool) -> Result<()> {
    let date = today();
    if refresh {
        clear_daily_key(conn, date)?;
    }

    if let Some(daily) = fetch_daily_key(conn, date)? {
        display_key(&daily, config.numbers_pick, true);
        return Ok(());
    }

    let mut categories = Vec::with_capacity(Pool::ALL.len());
    for pool in Pool::ALL {
        let rows = fetch_rows(conn, pool)?;
        if rows.is_empty() {
            print_no_data(pool, config);
            return Ok(());
        }
        categories.push(Category::new(pool.name(), rows, config.pick_count(pool)));
    }

    let mut rng = make_rng(seed);
    let key = generate_key(&categories, &mut rng)
        .context("Échec de la génération de la clé")?;

    let daily = DailyKey { date, key };
    save_daily_key(conn, &daily)?;
    display_key(&daily, config.numbers_pick, false);
    Ok(())
}

fn cmd_history(conn: &Connection, config: &AppConfig, last: u32) -> Result<()> {
    let keys = fetch_last_keys(conn, last)?;
    display_history(&keys, config.numbers_pick);
    Ok(())
}
