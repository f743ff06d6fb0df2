//! Database configuration module for the coin ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{Balance, Item, LedgerEntry, Order};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/bonz_shop.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

/// Creates all ledger tables if they do not exist yet.
///
/// Safe to call on every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Balance).await?;
    create_table(db, &schema, Item).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, LedgerEntry).await?;

    info!("Database tables ensured");
    Ok(())
}
