use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
	prelude::*,
	routes,
	service::{OwnershipGraph, TokenService},
};

/// The global state of the application.
/// This will contain the database connection and other configuration.
#[derive(Clone)]
pub struct AppState {
	/// The database connection.
	pub database: sqlx::Pool<DatabaseType>,
	/// The application configuration.
	pub config: AppConfig,
	/// Signs and checks the tokens of the API, with the configured secret.
	pub tokens: TokenService,
	/// Built once at startup and only read afterwards.
	pub ownership: Arc<OwnershipGraph>,
}

impl AppState {
	/// Creates the state with the standard ownership graph of the trip
	/// planner.
	pub fn new(database: sqlx::Pool<DatabaseType>, config: AppConfig) -> Self {
		Self::with_ownership_graph(database, config, OwnershipGraph::standard())
	}

	/// Creates the state with the given ownership graph
	pub fn with_ownership_graph(
		database: sqlx::Pool<DatabaseType>,
		config: AppConfig,
		ownership: OwnershipGraph,
	) -> Self {
		Self {
			tokens: TokenService::new(&config.jwt_secret),
			ownership: Arc::new(ownership),
			database,
			config,
		}
	}
}

impl std::fmt::Debug for AppState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AppState")
			.field("database", &self.database)
			.field("environment", &self.config.environment)
			.finish_non_exhaustive()
	}
}

/// The router of the API, with every request traced.
pub fn create_router(state: &AppState) -> Router {
	routes::setup_routes(state).layer(TraceLayer::new_for_http())
}

/// Binds to the configured address and serves the router until the process
/// is asked to stop.
#[instrument(skip(state, router))]
pub async fn start_server(state: &AppState, router: Router) -> std::io::Result<()> {
	let listener = TcpListener::bind(state.config.bind_address).await?;

	info!("Listening for connections on {}", state.config.bind_address);
	axum::serve(listener, router)
		.with_graceful_shutdown(async {
			if let Err(err) = tokio::signal::ctrl_c().await {
				error!("Unable to listen for the shutdown signal: {}", err);
				std::future::pending::<()>().await;
			}
			info!("Shutting down");
		})
		.await
}
