use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{self, SqliteConnectOptions, SqlitePool};
use tracing::info;

use crate::StorageError;

pub const DB_FILENAME: &str = "counters.db";

/// Opens (creating if missing) the counter database under
/// `{data_folder}/sqlitedata` and applies the schema.
pub async fn open_pool(data_folder: &str) -> Result<SqlitePool, StorageError> {
    let db_path = format!("{}/sqlitedata", data_folder);
    std::fs::create_dir_all(&db_path)?;

    let db_filename = format!("{}/{}", db_path, DB_FILENAME);

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_filename))?
        .create_if_missing(true)
        .journal_mode(sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlite::SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30))
        .statement_cache_capacity(100);

    let pool = SqlitePool::connect_with(options).await?;

    let schema = include_str!("../../../sql/schema.sql");

    sqlx::query(schema).execute(&pool).await?;
    info!("Counter database ready at {}", db_filename);
    Ok(pool)
}
