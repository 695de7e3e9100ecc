use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The body of `POST /api/auth/register`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
	/// The email to log in with. Compared case-insensitively
	pub email: String,
	/// The password in clear, hashed before it is stored
	pub password: String,
	/// Display name of the account
	pub name: String,
	/// Optional contact number
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
}

/// The body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
	/// The email the account was registered with
	pub email: String,
	/// The password in clear
	pub password: String,
}

/// The body of `POST /api/auth/refresh`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
	/// A refresh token handed out on login or registration
	pub refresh_token: String,
}

/// The credentials handed out on login and registration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
	/// Authorizes API calls for 15 minutes
	pub access_token: String,
	/// Mints new access tokens for 30 days
	pub refresh_token: String,
}

/// A fresh access token, minted from a refresh token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
	/// The new access token
	pub access_token: String,
}

/// The caller of `GET /api/auth/status`, as the API sees them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
	/// The external id of the caller
	pub user_id: Uuid,
	/// The email of the caller
	pub email: String,
	/// Whether the caller is an administrator
	pub is_admin: bool,
}

#[cfg(test)]
mod tests {
	use serde_test::{assert_de_tokens, assert_ser_tokens, Token};

	use super::{RefreshTokenRequest, RegisterRequest};

	#[test]
	fn register_request_phone_is_optional() {
		assert_de_tokens(
			&RegisterRequest {
				email: "skipper@example.com".to_string(),
				password: "hunter22".to_string(),
				name: "Skipper".to_string(),
				phone: None,
			},
			&[
				Token::Struct {
					name: "RegisterRequest",
					len: 3,
				},
				Token::Str("email"),
				Token::Str("skipper@example.com"),
				Token::Str("password"),
				Token::Str("hunter22"),
				Token::Str("name"),
				Token::Str("Skipper"),
				Token::StructEnd,
			],
		);
	}

	#[test]
	fn refresh_request_is_camel_case() {
		assert_ser_tokens(
			&RefreshTokenRequest {
				refresh_token: "token".to_string(),
			},
			&[
				Token::Struct {
					name: "RefreshTokenRequest",
					len: 1,
				},
				Token::Str("refreshToken"),
				Token::Str("token"),
				Token::StructEnd,
			],
		);
	}
}
