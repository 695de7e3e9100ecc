//! The Waypoint API server. Serves the authentication endpoints; resource
//! handlers are mounted behind the authorization gate by the REST layer using
//! [`waypoint::routes::resources::mount`].

use waypoint::{app, db, prelude::*, utils};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let config = utils::config::parse_config()?;

	utils::logger::initialize(&config)?;

	info!(
		"Starting {} v{} in {} mode",
		env!("CARGO_PKG_NAME"),
		env!("CARGO_PKG_VERSION"),
		config.environment
	);

	let database = db::connect(&config.database).await?;
	db::initialize(&database).await?;

	let state = AppState::new(database, config);
	let router = app::create_router(&state);

	app::start_server(&state, router).await?;

	state.database.close().await;
	info!("Server stopped");

	Ok(())
}
