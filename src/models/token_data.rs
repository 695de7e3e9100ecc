use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The two kinds of credential the API hands out. A token minted as one kind
/// never satisfies a check for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
	/// Short-lived token that authorizes API calls
	Access,
	/// Long-lived token that can only be exchanged for a new access token
	Refresh,
}

impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{}",
			match self {
				Self::Access => "access",
				Self::Refresh => "refresh",
			}
		)
	}
}

/// The claims signed into every token. Remember, JWTs can be decoded on the
/// client side, so no sensitive data should be stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
	/// RFC7519:
	/// The "sub" (subject) claim identifies the principal that is the subject
	/// of the JWT.
	///
	/// This is the externally exposed id of the user, never the internal
	/// numeric key.
	pub sub: Uuid,
	/// RFC7519:
	/// The "iat" (issued at) claim identifies the time at which the JWT was
	/// issued.
	#[serde(with = "datetime_as_seconds")]
	pub iat: OffsetDateTime,
	/// The expiration time of the token. A token is still accepted at exactly
	/// this second, and rejected from the next one onwards.
	#[serde(with = "datetime_as_seconds")]
	pub exp: OffsetDateTime,
	/// Kind specific claims, tagged with `tokenType`
	#[serde(flatten)]
	pub payload: TokenPayload,
}

impl TokenClaims {
	/// The kind of token these claims were minted as
	pub fn kind(&self) -> TokenKind {
		match self.payload {
			TokenPayload::Access { .. } => TokenKind::Access,
			TokenPayload::Refresh => TokenKind::Refresh,
		}
	}

	/// The email of the subject. Only access tokens carry one
	pub fn email(&self) -> Option<&str> {
		match &self.payload {
			TokenPayload::Access { email, .. } => Some(email),
			TokenPayload::Refresh => None,
		}
	}

	/// Whether the subject is an administrator. Only access tokens carry the
	/// flag
	pub fn is_admin(&self) -> Option<bool> {
		match self.payload {
			TokenPayload::Access { is_admin, .. } => Some(is_admin),
			TokenPayload::Refresh => None,
		}
	}
}

/// The claims that differ between access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tokenType", rename_all = "lowercase")]
pub enum TokenPayload {
	/// Claims of an access token
	#[serde(rename_all = "camelCase")]
	Access {
		/// The email of the subject at the time of issue
		email: String,
		/// Whether the subject was an administrator at the time of issue
		is_admin: bool,
	},
	/// A refresh token carries nothing beyond the common claims
	Refresh,
}

/// A module to help serialize and deserialize `OffsetDateTime` as seconds
mod datetime_as_seconds {
	use serde::{de::Error, Deserialize, Deserializer, Serializer};
	use time::OffsetDateTime;

	/// Serialize an `OffsetDateTime` as seconds
	pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.unix_timestamp())
	}

	/// Deserialize an `OffsetDateTime` from seconds
	pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
	where
		D: Deserializer<'de>,
	{
		OffsetDateTime::from_unix_timestamp(i64::deserialize(deserializer)?).map_err(Error::custom)
	}
}
