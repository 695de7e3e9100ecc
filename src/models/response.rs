use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use super::ErrorType;

/// This struct represents a successful response from the API. It contains the
/// status code and the body, which is flattened into the JSON envelope next to
/// `"success": true`.
#[derive(Debug, Clone)]
pub struct ApiSuccessResponse<T>
where
	T: Serialize,
{
	/// The status code of the success response. Ideally in the 2xx range.
	pub status_code: StatusCode,
	/// The body of the success response.
	pub body: T,
}

impl<T> ApiSuccessResponse<T>
where
	T: Serialize,
{
	/// Creates a `200 OK` response with the given body
	pub fn ok(body: T) -> Self {
		Self {
			status_code: StatusCode::OK,
			body,
		}
	}
}

impl<T> IntoResponse for ApiSuccessResponse<T>
where
	T: Serialize,
{
	fn into_response(self) -> axum::response::Response {
		(
			self.status_code,
			Json(ApiSuccessResponseBody {
				success: true,
				response: self.body,
			}),
		)
			.into_response()
	}
}

/// This struct represents the JSON body of successful response from the API.
/// This is mostly used internally and would ideally not need to be constructed
/// manually.
///
/// Use [`ApiSuccessResponse`] to create a success response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiSuccessResponseBody<T> {
	/// Whether the request was successful or not. This is always true.
	pub success: bool,
	/// The JSON body of the response. This is flattened so that the fields of
	/// the body are at the top level.
	#[serde(flatten)]
	pub response: T,
}

/// This struct represents an error response from the API. It contains the
/// status code and the body of the response.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
	/// The status code of the error response. Ideally in the 4xx or 5xx range.
	pub status_code: StatusCode,
	/// The body of the error response. This is a JSON object that contains the
	/// error message.
	pub body: ApiErrorResponseBody,
}

impl ApiErrorResponse {
	/// Creates a new [`ApiErrorResponse`] with the given [`ErrorType`], using
	/// the default status code.
	pub fn error(error: ErrorType) -> Self {
		Self {
			status_code: error.default_status_code(),
			body: ApiErrorResponseBody {
				success: false,
				message: error.message().into(),
				error,
			},
		}
	}
}

impl IntoResponse for ApiErrorResponse {
	fn into_response(self) -> axum::response::Response {
		(self.status_code, Json(self.body)).into_response()
	}
}

impl IntoResponse for ErrorType {
	fn into_response(self) -> axum::response::Response {
		if let Self::InternalServerError(ref error) = self {
			tracing::error!("Internal server error: {:?}", error);
		}
		ApiErrorResponse::error(self).into_response()
	}
}

/// This struct represents the JSON body of an error response from the API.
/// This is mostly used internally and would ideally not need to be constructed
/// manually.
///
/// Use [`ApiErrorResponse`] to create an error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponseBody {
	/// Whether the request was successful or not. This is always false.
	pub success: bool,
	/// The error type of the response.
	pub error: ErrorType,
	/// A user-friendly message describing the error.
	pub message: String,
}
