use axum::Router;

/// Registration, login, token refresh and the caller's status
mod auth;
/// The gating of the resource endpoints of the trip planner
pub mod resources;

use crate::prelude::*;

/// Sets up the routes served by this crate, under `/api`.
#[instrument(skip(state))]
pub fn setup_routes(state: &AppState) -> Router {
	Router::new()
		.nest("/api", auth::setup_routes(state))
		.with_state(state.clone())
}
