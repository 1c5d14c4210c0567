// Shared SQLite plumbing for the stores: pool creation and timestamp encoding.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// Open (creating if needed) the SQLite database at `database_url`.
///
/// Accepts either a `sqlite://` URL or a bare file path.
pub async fn connect_pool(database_url: &str, max_connections: u32) -> anyhow::Result<Pool<Sqlite>> {
    let conn_str = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite://{}", database_url)
    };

    // Keep runtime databases in their own folder; make sure it exists
    let path_str = conn_str
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    if !path_str.contains(":memory:") {
        if let Some(parent) = Path::new(path_str.split('?').next().unwrap_or(path_str)).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(&conn_str)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Fixed-width UTC text, so ordering rows by the column orders them in time.
pub fn to_db_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn from_db_time(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
}
