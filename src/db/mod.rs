use std::time::Duration;

use sqlx::{
	pool::PoolOptions,
	sqlite::{SqliteConnectOptions, SqliteJournalMode},
	Pool,
};

use crate::prelude::*;

/// Creates the tables of the API on an empty database.
mod initializer;
/// Principal lookups and account creation.
mod user;

pub use self::{initializer::initialize, user::*};

/// Connects to the database based on a config. Not much to say here.
#[instrument(skip(config))]
pub async fn connect(config: &DatabaseConfig) -> Result<Pool<DatabaseType>, sqlx::Error> {
	info!("Connecting to database: `{}`", config.file);
	PoolOptions::<DatabaseType>::new()
		.max_connections(config.connection_limit)
		.acquire_timeout(Duration::from_secs(5))
		.connect_with(
			SqliteConnectOptions::new()
				.filename(&config.file)
				.journal_mode(SqliteJournalMode::Wal)
				.foreign_keys(true)
				.create_if_missing(true),
		)
		.await
}
