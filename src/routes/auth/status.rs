use crate::{
	models::{ApiSuccessResponse, Principal, StatusResponse},
	prelude::*,
};

/// Describes the caller. Mounted behind the authentication layer, so the
/// principal always comes from the request context.
#[instrument(skip(principal), fields(principal = %principal.external_id))]
pub async fn status(principal: Principal) -> Result<ApiSuccessResponse<StatusResponse>, ErrorType> {
	Ok(ApiSuccessResponse::ok(StatusResponse {
		user_id: principal.external_id,
		email: principal.email,
		is_admin: principal.admin,
	}))
}
