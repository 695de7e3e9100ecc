use std::str::FromStr;

use sqlx::{pool::PoolOptions, sqlite::SqliteConnectOptions};

use crate::{
	db::{self, UserToSignUp},
	models::Principal,
	prelude::*,
	service,
};

/// The password of every principal created by [`create_principal`]
pub const PASSWORD: &str = "correct horse battery staple";

pub fn config() -> AppConfig {
	AppConfig {
		bind_address: "127.0.0.1:0".parse().unwrap(),
		jwt_secret: "test-jwt-secret".to_string(),
		password_pepper: "test-pepper".to_string(),
		environment: RunningEnvironment::Development,
		database: DatabaseConfig {
			file: ":memory:".to_string(),
			connection_limit: 1,
		},
	}
}

/// A state backed by a fresh in-memory database with the full schema. The pool
/// holds exactly one connection that is never recycled, so the database lives
/// as long as the pool does.
pub async fn state() -> AppState {
	let database = PoolOptions::<DatabaseType>::new()
		.max_connections(1)
		.min_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect_with(
			SqliteConnectOptions::from_str("sqlite::memory:")
				.unwrap()
				.foreign_keys(true),
		)
		.await
		.unwrap();
	db::initialize(&database).await.unwrap();

	AppState::new(database, config())
}

/// A state backed by a fresh database file in the temporary directory, for
/// tests that need several connections at once. The files are removed by
/// [`remove_database`].
pub async fn file_state(connections: u32) -> AppState {
	let mut config = config();
	config.database = DatabaseConfig {
		file: std::env::temp_dir()
			.join(format!("waypoint-{}.db", Uuid::new_v4()))
			.to_string_lossy()
			.into_owned(),
		connection_limit: connections,
	};

	let database = db::connect(&config.database).await.unwrap();
	db::initialize(&database).await.unwrap();

	AppState::new(database, config)
}

/// Closes the pool of a [`file_state`] and deletes its files
pub async fn remove_database(state: AppState) {
	state.database.close().await;
	for suffix in ["", "-wal", "-shm"] {
		let _ = std::fs::remove_file(format!("{}{suffix}", state.config.database.file));
	}
}

pub async fn create_principal(state: &AppState, email: &str) -> Principal {
	let password_hash = service::hash_password(PASSWORD, &state.config.password_pepper).unwrap();
	let mut connection = state.database.acquire().await.unwrap();

	db::create_user(
		&mut connection,
		UserToSignUp {
			email,
			password_hash: &password_hash,
			name: "Test User",
			phone: None,
		},
	)
	.await
	.unwrap()
	.into_principal()
	.unwrap()
}

pub fn access_token(state: &AppState, principal: &Principal) -> String {
	state
		.tokens
		.generate_access_token(principal.external_id, &principal.email, principal.admin)
		.unwrap()
}

async fn insert(state: &AppState, sql: &str, binds: &[i64]) -> i64 {
	let mut connection = state.database.acquire().await.unwrap();
	let mut statement = query(sql);
	for bind in binds {
		statement = statement.bind(*bind);
	}
	statement
		.execute(&mut *connection)
		.await
		.unwrap()
		.last_insert_rowid()
}

pub async fn create_trip(state: &AppState) -> i64 {
	insert(state, "INSERT INTO trip(name) VALUES ('Around the island');", &[]).await
}

pub async fn add_traveller(state: &AppState, trip: i64, principal: &Principal) {
	insert(
		state,
		"INSERT INTO user_has_trip(user_id, trip_id) VALUES ($1, $2);",
		&[principal.id, trip],
	)
	.await;
}

pub async fn remove_traveller(state: &AppState, trip: i64, principal: &Principal) {
	let mut connection = state.database.acquire().await.unwrap();
	query("DELETE FROM user_has_trip WHERE user_id = $1 AND trip_id = $2;")
		.bind(principal.id)
		.bind(trip)
		.execute(&mut *connection)
		.await
		.unwrap();
}

pub async fn create_itinerary(state: &AppState, trip: i64) -> i64 {
	insert(state, "INSERT INTO itinerary(trip_id) VALUES ($1);", &[trip]).await
}

pub async fn create_day(state: &AppState, itinerary: i64, day_number: i64) -> i64 {
	insert(
		state,
		"INSERT INTO day(itinerary_id, day_number) VALUES ($1, $2);",
		&[itinerary, day_number],
	)
	.await
}

pub async fn create_point(state: &AppState, day: i64) -> i64 {
	insert(
		state,
		"INSERT INTO point(day_id, latitude, longitude) VALUES ($1, 39.57, 2.65);",
		&[day],
	)
	.await
}

pub async fn create_image(state: &AppState) -> i64 {
	insert(state, "INSERT INTO image(location) VALUES ('images/harbour.jpg');", &[]).await
}

pub async fn attach_image(state: &AppState, image: i64, point: i64) {
	insert(
		state,
		"INSERT INTO point_has_image(image_id, point_id) VALUES ($1, $2);",
		&[image, point],
	)
	.await;
}

pub async fn create_inventory(state: &AppState, trip: i64) -> i64 {
	insert(state, "INSERT INTO inventory(trip_id) VALUES ($1);", &[trip]).await
}

pub async fn create_item(state: &AppState, author: &Principal) -> i64 {
	insert(
		state,
		"INSERT INTO item(user_id, name) VALUES ($1, 'Anchor');",
		&[author.id],
	)
	.await
}

pub async fn stow_item(state: &AppState, inventory: i64, item: i64) {
	insert(
		state,
		"INSERT INTO inventory_items(inventory_id, item_id) VALUES ($1, $2);",
		&[inventory, item],
	)
	.await;
}

pub async fn create_log(state: &AppState, author: &Principal) -> i64 {
	insert(state, "INSERT INTO log(user_id, hours) VALUES ($1, 6.5);", &[author.id]).await
}

/// One of everything, all hanging off a single trip
#[derive(Debug, Clone, Copy)]
pub struct TripTree {
	pub trip: i64,
	pub itinerary: i64,
	/// Also the id of the day's sea and weather rows
	pub day: i64,
	pub point: i64,
	pub image: i64,
	pub inventory: i64,
	pub item: i64,
	pub log: i64,
}

/// Creates a trip with `traveller` on it, and one resource of every type
/// below it. The item is authored by `traveller` and stowed in the trip's
/// inventory, and the log is written by `traveller`.
pub async fn create_trip_tree(state: &AppState, traveller: &Principal) -> TripTree {
	let trip = create_trip(state).await;
	add_traveller(state, trip, traveller).await;

	let itinerary = create_itinerary(state, trip).await;
	let day = create_day(state, itinerary, 1).await;
	insert(state, "INSERT INTO sea(day_id, moon_phase) VALUES ($1, 'full');", &[day]).await;
	insert(
		state,
		"INSERT INTO weather(day_id, temperature) VALUES ($1, 24.5);",
		&[day],
	)
	.await;
	let point = create_point(state, day).await;
	let image = create_image(state).await;
	attach_image(state, image, point).await;

	let inventory = create_inventory(state, trip).await;
	let item = create_item(state, traveller).await;
	stow_item(state, inventory, item).await;

	let log = create_log(state, traveller).await;

	TripTree {
		trip,
		itinerary,
		day,
		point,
		image,
		inventory,
		item,
		log,
	}
}
