use axum::{
	extract::{rejection::JsonRejection, State},
	Json,
};

use crate::{
	db,
	models::{ApiSuccessResponse, LoginRequest, TokenPairResponse},
	prelude::*,
	service,
};

/// Exchanges an email and password for a pair of tokens.
#[instrument(skip(state, body))]
pub async fn login(
	State(state): State<AppState>,
	body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiSuccessResponse<TokenPairResponse>, ErrorType> {
	let LoginRequest { email, password } = super::parse_body(body)?;

	let mut connection = state.database.acquire().await?;

	let user = db::get_user_by_email(&mut connection, email.trim().to_lowercase().as_str())
		.await?
		.ok_or(ErrorType::UserNotFound)?;
	drop(connection);

	let success =
		service::verify_password(&password, &user.password, &state.config.password_pepper)?;

	if !success {
		return Err(ErrorType::InvalidPassword);
	}

	if !user.active {
		warn!("Inactive user {} tried to log in", user.public_id);
		return Err(ErrorType::InvalidCredential);
	}

	let user = user.into_principal()?;

	Ok(ApiSuccessResponse::ok(TokenPairResponse {
		access_token: state.tokens.generate_access_token(
			user.external_id,
			&user.email,
			user.admin,
		)?,
		refresh_token: state.tokens.generate_refresh_token(user.external_id)?,
	}))
}
