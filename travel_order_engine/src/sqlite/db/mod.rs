use std::env;

use log::*;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub mod orders;
pub mod users;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/travel_orders.db";

pub fn db_url() -> String {
    env::var("TOS_DATABASE_URL").unwrap_or_else(|_| {
        warn!("🗃️ TOS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}");
        DEFAULT_DATABASE_URL.to_string()
    })
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options: SqliteConnectOptions = url.parse()?;
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
