use std::{
	error::Error as StdError,
	fmt::{Display, Formatter},
	mem,
};

use axum::http::StatusCode;
use serde::{de::Error, Deserialize, Serialize};

/// A list of all the possible errors that can be returned by the API
#[derive(Debug)]
pub enum ErrorType {
	/// The parameters sent with the request is invalid. This would ideally not
	/// happen unless there is a bug in the client
	WrongParameters,
	/// The request did not carry an `Authorization` header at all
	MissingCredential,
	/// The credential provided is expired, malformed, of the wrong kind, or
	/// belongs to a principal that is unknown or inactive. These causes are
	/// deliberately not told apart to the client
	InvalidCredential,
	/// The request does not name the resource it is trying to act on
	MissingResourceIdentifier,
	/// The authenticated principal is not entitled to act on the resource
	OwnershipDenied,
	/// The request body is larger than the server is willing to read
	PayloadTooLarge,
	/// The password provided does not match the account
	InvalidPassword,
	/// No account exists with the credentials provided
	UserNotFound,
	/// The email provided is not available. It is being used by another account
	EmailUnavailable,
	/// An internal server error occurred. This should not happen unless there
	/// is a bug in the server
	InternalServerError(anyhow::Error),
}

impl ErrorType {
	/// Returns the status code that should be used for this error. Note that
	/// this is only the default status code and specific endpoints can override
	/// this if needed
	pub fn default_status_code(&self) -> StatusCode {
		match self {
			Self::WrongParameters => StatusCode::BAD_REQUEST,
			Self::MissingCredential => StatusCode::FORBIDDEN,
			Self::InvalidCredential => StatusCode::UNAUTHORIZED,
			Self::MissingResourceIdentifier => StatusCode::BAD_REQUEST,
			Self::OwnershipDenied => StatusCode::FORBIDDEN,
			Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
			Self::InvalidPassword => StatusCode::UNAUTHORIZED,
			Self::UserNotFound => StatusCode::UNAUTHORIZED,
			Self::EmailUnavailable => StatusCode::CONFLICT,
			Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Returns the message that should be used for this error. This is the
	/// message that is user-friendly and can be shown to the user
	pub fn message(&self) -> impl Into<String> {
		match self {
			Self::WrongParameters => "The parameters sent with that request is invalid",
			Self::MissingCredential => "Provide a valid auth token",
			Self::InvalidCredential => "Your access token is invalid. Please login again",
			Self::MissingResourceIdentifier => "The resource identifier is missing from the request",
			Self::OwnershipDenied => "You are not authorized to access that resource",
			Self::PayloadTooLarge => "The request body is too large",
			Self::InvalidPassword => "Invalid Password",
			Self::UserNotFound => "No user exists with those credentials",
			Self::EmailUnavailable => "An account already exists with that email",
			Self::InternalServerError(_) => "An internal server error has occured",
		}
	}

	/// Creates an [`ErrorType::InternalServerError`] with the given message
	pub fn server_error(message: impl Display) -> Self {
		Self::InternalServerError(anyhow::anyhow!(message.to_string()))
	}

	/// The camelCase code this error is serialized as
	pub fn code(&self) -> &'static str {
		match self {
			Self::WrongParameters => "wrongParameters",
			Self::MissingCredential => "missingCredential",
			Self::InvalidCredential => "invalidCredential",
			Self::MissingResourceIdentifier => "missingResourceIdentifier",
			Self::OwnershipDenied => "ownershipDenied",
			Self::PayloadTooLarge => "payloadTooLarge",
			Self::InvalidPassword => "invalidPassword",
			Self::UserNotFound => "userNotFound",
			Self::EmailUnavailable => "emailUnavailable",
			Self::InternalServerError(_) => "internalServerError",
		}
	}
}

impl PartialEq for ErrorType {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::InternalServerError(_), Self::InternalServerError(_)) => true,
			_ => mem::discriminant(self) == mem::discriminant(other),
		}
	}
}

impl Eq for ErrorType {}

impl<Error> From<Error> for ErrorType
where
	Error: StdError + Send + Sync + 'static,
{
	fn from(error: Error) -> Self {
		Self::InternalServerError(error.into())
	}
}

impl Clone for ErrorType {
	fn clone(&self) -> Self {
		match self {
			Self::WrongParameters => Self::WrongParameters,
			Self::MissingCredential => Self::MissingCredential,
			Self::InvalidCredential => Self::InvalidCredential,
			Self::MissingResourceIdentifier => Self::MissingResourceIdentifier,
			Self::OwnershipDenied => Self::OwnershipDenied,
			Self::PayloadTooLarge => Self::PayloadTooLarge,
			Self::InvalidPassword => Self::InvalidPassword,
			Self::UserNotFound => Self::UserNotFound,
			Self::EmailUnavailable => Self::EmailUnavailable,
			Self::InternalServerError(arg0) => {
				Self::InternalServerError(anyhow::anyhow!(arg0.to_string()))
			}
		}
	}
}

impl Display for ErrorType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.message().into())
	}
}

impl Serialize for ErrorType {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(self.code())
	}
}

impl<'de> Deserialize<'de> for ErrorType {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let string = String::deserialize(deserializer)?;
		Ok(match string.as_str() {
			"wrongParameters" => Self::WrongParameters,
			"missingCredential" => Self::MissingCredential,
			"invalidCredential" => Self::InvalidCredential,
			"missingResourceIdentifier" => Self::MissingResourceIdentifier,
			"ownershipDenied" => Self::OwnershipDenied,
			"payloadTooLarge" => Self::PayloadTooLarge,
			"invalidPassword" => Self::InvalidPassword,
			"userNotFound" => Self::UserNotFound,
			"emailUnavailable" => Self::EmailUnavailable,
			"internalServerError" => {
				Self::InternalServerError(anyhow::anyhow!("Internal Server Error"))
			}
			unknown => return Err(Error::custom(format!("unknown variant: {unknown}"))),
		})
	}
}
