use axum::{
	extract::rejection::JsonRejection,
	routing::{get, post},
	Json,
	Router,
};

mod login;
mod refresh_token;
mod register;
mod status;

use self::{login::*, refresh_token::*, register::*, status::*};
use crate::{prelude::*, utils::RouterExt};

/// Sets up the `/auth` routes. Everything here is reachable without a token,
/// except for the status endpoint.
#[instrument(skip(state))]
pub fn setup_routes(state: &AppState) -> Router<AppState> {
	Router::new()
		.route("/auth/register", post(register))
		.route("/auth/login", post(login))
		.route("/auth/refresh", post(refresh_token))
		.mount_authenticated("/auth/status", get(status), state)
}

/// Turns a body that could not be parsed into [`ErrorType::WrongParameters`]
fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ErrorType> {
	body.map(|Json(body)| body).map_err(|err| {
		debug!("Unable to parse request body: {}", err);
		ErrorType::WrongParameters
	})
}
