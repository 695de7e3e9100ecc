use axum::{
	extract::{rejection::JsonRejection, State},
	Json,
};

use crate::{
	db::{self, UserToSignUp},
	models::{ApiSuccessResponse, RegisterRequest, TokenPairResponse},
	prelude::*,
	service,
};

/// Creates an active account and logs it in right away.
#[instrument(skip(state, body))]
pub async fn register(
	State(state): State<AppState>,
	body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<ApiSuccessResponse<TokenPairResponse>, ErrorType> {
	let RegisterRequest {
		email,
		password,
		name,
		phone,
	} = super::parse_body(body)?;

	let email = email.trim().to_lowercase();
	if email.is_empty() || password.is_empty() || name.trim().is_empty() {
		return Err(ErrorType::WrongParameters);
	}

	let mut connection = state.database.acquire().await?;

	if !db::is_email_available(&mut connection, &email).await? {
		debug!("Email `{}` is already registered", email);
		return Err(ErrorType::EmailUnavailable);
	}

	let password_hash = service::hash_password(&password, &state.config.password_pepper)?;

	let user = db::create_user(
		&mut connection,
		UserToSignUp {
			email: &email,
			password_hash: &password_hash,
			name: name.trim(),
			phone: phone.as_deref(),
		},
	)
	.await
	.map_err(|err| {
		if err
			.as_database_error()
			.is_some_and(|err| err.is_unique_violation())
		{
			debug!("Email `{}` was registered by a concurrent request", email);
			ErrorType::EmailUnavailable
		} else {
			err.into()
		}
	})?
	.into_principal()?;

	info!("Registered principal {}", user.external_id);

	Ok(ApiSuccessResponse::ok(TokenPairResponse {
		access_token: state.tokens.generate_access_token(
			user.external_id,
			&user.email,
			user.admin,
		)?,
		refresh_token: state.tokens.generate_refresh_token(user.external_id)?,
	}))
}
