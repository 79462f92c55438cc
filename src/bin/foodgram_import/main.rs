//! Loads reference data (ingredients, tags) from CSV files.
//!
//! Ingredient files hold `name,measurement_unit` rows and tag files hold
//! `name,color,slug` rows, without a header line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use foodgram::app_config;
use foodgram::db::init_db;
use foodgram::error::field_errors;
use foodgram::ingredients::{insert_ingredients, NewIngredient};
use foodgram::tags::{insert_tags, NewTag};
use sea_orm::TransactionTrait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use validator::Validate;

#[derive(Parser)]
#[command(name = "foodgram-import")]
#[command(about = "Bulk-load foodgram reference data from CSV", long_about = None)]
struct Cli {
    /// Database URL, overriding config.toml
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import `name,measurement_unit` rows
    Ingredients {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Import `name,color,slug` rows
    Tags {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Reads every record of a header-less CSV file and validates it.
fn read_rows<T>(path: &Path) -> Result<Vec<T>>
where
    T: DeserializeOwned + Validate,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Can't open {}", path.display()))?;

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<T>().enumerate() {
        let line = index + 1;
        let row = record.with_context(|| format!("Malformed row at line {}", line))?;
        if let Err(errors) = row.validate() {
            bail!("Invalid row at line {}: {:?}", line, field_errors(&errors));
        }
        rows.push(row);
    }

    Ok(rows)
}

#[actix_web::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = app_config::get_config();
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    let db = init_db(&config.database)
        .await
        .context("Can't connect to the database")?;
    let txn = db.begin().await?;

    match cli.command {
        Commands::Ingredients { file } => {
            let rows: Vec<NewIngredient> = read_rows(&file)?;
            let inserted = insert_ingredients(&txn, &rows).await?;
            log::info!(
                "Ingredients have been uploaded to the database: {} new of {} rows",
                inserted,
                rows.len()
            );
        }
        Commands::Tags { file } => {
            let rows: Vec<NewTag> = read_rows(&file)?;
            let inserted = insert_tags(&txn, &rows).await?;
            log::info!(
                "Tags have been uploaded to the database: {} new of {} rows",
                inserted,
                rows.len()
            );
        }
    }

    txn.commit().await?;
    Ok(())
}
