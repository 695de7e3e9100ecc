use sqlx::Pool;

use crate::prelude::*;

/// Creates the schema of the API if the database is empty. An existing schema
/// is left untouched.
#[instrument(skip(database))]
pub async fn initialize(database: &Pool<DatabaseType>) -> Result<(), sqlx::Error> {
	info!("Initializing database");

	let tables = query_scalar::<_, i64>(
		r#"
		SELECT
			COUNT(*)
		FROM
			sqlite_schema
		WHERE
			type = 'table' AND
			name NOT LIKE 'sqlite_%';
		"#,
	)
	.fetch_one(database)
	.await?;

	if tables > 0 {
		info!("Database already initialized with {} tables", tables);
		return Ok(());
	}

	warn!("No tables exist. Creating fresh");

	let mut transaction = database.begin().await?;

	initialize_user_tables(&mut transaction).await?;
	initialize_trip_tables(&mut transaction).await?;
	initialize_inventory_tables(&mut transaction).await?;
	initialize_log_tables(&mut transaction).await?;

	transaction.commit().await?;

	info!("Database created");

	Ok(())
}

async fn initialize_user_tables(connection: &mut DatabaseConnection) -> Result<(), sqlx::Error> {
	info!("Setting up user tables");

	query(
		r#"
		CREATE TABLE users(
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			public_id TEXT NOT NULL UNIQUE,
			email TEXT NOT NULL UNIQUE,
			password TEXT NOT NULL,
			name TEXT NOT NULL,
			phone TEXT,
			active INTEGER NOT NULL DEFAULT 1 CHECK(active IN (0, 1)),
			admin INTEGER NOT NULL DEFAULT 0 CHECK(admin IN (0, 1))
		);
		"#,
	)
	.execute(&mut *connection)
	.await?;

	Ok(())
}

async fn initialize_trip_tables(connection: &mut DatabaseConnection) -> Result<(), sqlx::Error> {
	info!("Setting up trip tables");

	for statement in [
		r#"
		CREATE TABLE trip(
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			name TEXT NOT NULL
		);
		"#,
		r#"
		CREATE TABLE user_has_trip(
			user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
			trip_id INTEGER NOT NULL REFERENCES trip(id) ON DELETE CASCADE,
			PRIMARY KEY(user_id, trip_id)
		);
		"#,
		r#"
		CREATE INDEX user_has_trip_idx_trip_id ON user_has_trip(trip_id);
		"#,
		r#"
		CREATE TABLE itinerary(
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			trip_id INTEGER NOT NULL REFERENCES trip(id) ON DELETE CASCADE,
			is_public INTEGER NOT NULL DEFAULT 0 CHECK(is_public IN (0, 1)),
			total_miles REAL
		);
		"#,
		r#"
		CREATE INDEX itinerary_idx_trip_id ON itinerary(trip_id);
		"#,
		r#"
		CREATE TABLE day(
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			itinerary_id INTEGER NOT NULL REFERENCES itinerary(id) ON DELETE CASCADE,
			day_number INTEGER NOT NULL,
			date TEXT,
			UNIQUE(itinerary_id, day_number)
		);
		"#,
		r#"
		CREATE TABLE sea(
			day_id INTEGER PRIMARY KEY REFERENCES day(id) ON DELETE CASCADE,
			moon_phase TEXT,
			high_tide TEXT,
			low_tide TEXT
		);
		"#,
		r#"
		CREATE TABLE weather(
			day_id INTEGER PRIMARY KEY REFERENCES day(id) ON DELETE CASCADE,
			temperature REAL,
			wind_speed REAL,
			wind_direction TEXT
		);
		"#,
		r#"
		CREATE TABLE point(
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			day_id INTEGER NOT NULL REFERENCES day(id) ON DELETE CASCADE,
			name TEXT,
			latitude REAL NOT NULL,
			longitude REAL NOT NULL
		);
		"#,
		r#"
		CREATE INDEX point_idx_day_id ON point(day_id);
		"#,
		r#"
		CREATE TABLE image(
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			name TEXT,
			location TEXT NOT NULL,
			size INTEGER
		);
		"#,
		r#"
		CREATE TABLE point_has_image(
			image_id INTEGER NOT NULL REFERENCES image(id) ON DELETE CASCADE,
			point_id INTEGER NOT NULL REFERENCES point(id) ON DELETE CASCADE,
			PRIMARY KEY(image_id, point_id)
		);
		"#,
		r#"
		CREATE INDEX point_has_image_idx_point_id ON point_has_image(point_id);
		"#,
	] {
		query(statement).execute(&mut *connection).await?;
	}

	Ok(())
}

async fn initialize_inventory_tables(
	connection: &mut DatabaseConnection,
) -> Result<(), sqlx::Error> {
	info!("Setting up inventory tables");

	for statement in [
		r#"
		CREATE TABLE inventory(
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			trip_id INTEGER NOT NULL REFERENCES trip(id) ON DELETE CASCADE,
			name TEXT
		);
		"#,
		r#"
		CREATE INDEX inventory_idx_trip_id ON inventory(trip_id);
		"#,
		r#"
		CREATE TABLE item(
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
			name TEXT NOT NULL,
			quantity INTEGER NOT NULL DEFAULT 1
		);
		"#,
		r#"
		CREATE INDEX item_idx_user_id ON item(user_id);
		"#,
		r#"
		CREATE TABLE inventory_items(
			inventory_id INTEGER NOT NULL REFERENCES inventory(id) ON DELETE CASCADE,
			item_id INTEGER NOT NULL REFERENCES item(id) ON DELETE CASCADE,
			PRIMARY KEY(inventory_id, item_id)
		);
		"#,
		r#"
		CREATE INDEX inventory_items_idx_item_id ON inventory_items(item_id);
		"#,
	] {
		query(statement).execute(&mut *connection).await?;
	}

	Ok(())
}

async fn initialize_log_tables(connection: &mut DatabaseConnection) -> Result<(), sqlx::Error> {
	info!("Setting up log tables");

	for statement in [
		r#"
		CREATE TABLE log(
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
			hours REAL,
			avg_sea REAL
		);
		"#,
		r#"
		CREATE INDEX log_idx_user_id ON log(user_id);
		"#,
	] {
		query(statement).execute(&mut *connection).await?;
	}

	Ok(())
}
