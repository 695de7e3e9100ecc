use axum::{
	extract::{rejection::JsonRejection, State},
	Json,
};

use crate::{
	db,
	models::{ApiSuccessResponse, RefreshTokenRequest, RefreshTokenResponse, TokenKind},
	prelude::*,
	service::TokenVerification,
};

/// Mints a new access token from a refresh token. Only tokens minted as
/// refresh tokens are accepted here, and the account must still be active.
#[instrument(skip(state, body))]
pub async fn refresh_token(
	State(state): State<AppState>,
	body: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<ApiSuccessResponse<RefreshTokenResponse>, ErrorType> {
	let RefreshTokenRequest { refresh_token } = super::parse_body(body)?;

	let claims = match state.tokens.verify(&refresh_token, TokenKind::Refresh) {
		TokenVerification::Valid(claims) => claims,
		TokenVerification::Expired => {
			info!("Refresh token has expired");
			return Err(ErrorType::InvalidCredential);
		}
		TokenVerification::Malformed => {
			warn!("Refresh token is malformed or not signed by us");
			return Err(ErrorType::InvalidCredential);
		}
		TokenVerification::WrongKind { expected, found } => {
			warn!("Expected a {expected} token, but a {found} token was presented");
			return Err(ErrorType::InvalidCredential);
		}
	};

	let mut connection = state.database.acquire().await?;

	let user = db::get_user_by_public_id(&mut connection, &claims.sub)
		.await?
		.filter(|user| user.active)
		.ok_or_else(|| {
			warn!("Refresh token issued to unknown or inactive principal {}", claims.sub);
			ErrorType::InvalidCredential
		})?
		.into_principal()?;

	Ok(ApiSuccessResponse::ok(RefreshTokenResponse {
		access_token: state.tokens.generate_access_token(
			user.external_id,
			&user.email,
			user.admin,
		)?,
	}))
}
