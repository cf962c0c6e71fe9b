//! Throwaway Postgres databases seeded with an event relation for integration tests.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor, PgPool,
	postgres::{PgConnectOptions, PgConnection, PgPoolOptions},
};
use time::OffsetDateTime;
use tokio::runtime::Builder;
use uuid::Uuid;

pub const DSN_ENV: &str = "RECS_PG_DSN";
pub const EVENT_RELATION: &str = "pio_event_1";

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

/// One row to seed into the event relation.
#[derive(Debug, Clone)]
pub struct SeedEvent<'a> {
	pub entity_type: &'a str,
	pub entity_id: &'a str,
	pub event: &'a str,
	pub target_entity_id: Option<&'a str>,
	pub event_time: OffsetDateTime,
}

pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Failed to parse {DSN_ENV}: {err}.")))?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("recs_test_{}", Uuid::new_v4().simple());
		let create_sql = format!(r#"CREATE DATABASE "{name}""#);

		admin_conn
			.execute(create_sql.as_str())
			.await
			.map_err(|err| Error::Message(format!("Failed to create test database: {err}.")))?;

		let dsn = base_options.clone().database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub async fn pool(&self) -> Result<PgPool> {
		Ok(PgPoolOptions::new().max_connections(2).connect(&self.dsn).await?)
	}

	/// Creates the event relation with the column layout the event server writes.
	pub async fn create_event_relation(&self, pool: &PgPool) -> Result<()> {
		let sql = format!(
			"\
CREATE TABLE IF NOT EXISTS {EVENT_RELATION} (
	id varchar(32) NOT NULL PRIMARY KEY,
	event text NOT NULL,
	entityType text NOT NULL,
	entityId text NOT NULL,
	targetEntityType text,
	targetEntityId text,
	properties text,
	eventTime timestamp with time zone NOT NULL,
	eventTimeZone varchar(50) NOT NULL DEFAULT 'UTC',
	tags text,
	prId text,
	creationTime timestamp with time zone NOT NULL DEFAULT now()
)"
		);

		sqlx::query(sql.as_str()).execute(pool).await?;

		Ok(())
	}

	pub async fn insert_events(&self, pool: &PgPool, events: &[SeedEvent<'_>]) -> Result<()> {
		let sql = format!(
			"\
INSERT INTO {EVENT_RELATION} (id, event, entityType, entityId, targetEntityType, targetEntityId, eventTime)
VALUES ($1, $2, $3, $4, $5, $6, $7)"
		);

		for seed in events {
			sqlx::query(sql.as_str())
				.bind(Uuid::new_v4().simple().to_string())
				.bind(seed.event)
				.bind(seed.entity_type)
				.bind(seed.entity_id)
				.bind(seed.target_entity_id.map(|_| "item"))
				.bind(seed.target_entity_id)
				.bind(seed.event_time)
				.execute(pool)
				.await?;
		}

		Ok(())
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		drop_database(&self.name, &self.admin_options).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let name = self.name.clone();
		let admin_options = self.admin_options.clone();
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test database cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(drop_database(&name, &admin_options)) {
				eprintln!("Test database cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok()
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::Message(format!("Failed to connect to an admin database: {last_err:?}.")))
}

async fn drop_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin_options).await.map_err(|err| {
		Error::Message(format!("Failed to connect to admin database for cleanup: {err}."))
	})?;
	let drop_sql = format!(r#"DROP DATABASE IF EXISTS "{name}""#);
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await;

	sqlx::query(drop_sql.as_str())
		.execute(&mut conn)
		.await
		.map_err(|err| Error::Message(format!("Failed to drop test database: {err}.")))?;

	Ok(())
}
