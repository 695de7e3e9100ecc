use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use time::OffsetDateTime;

use crate::{
	models::{TokenClaims, TokenKind, TokenPayload},
	prelude::*,
};

/// Why a token could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
	/// The signature and structure are fine, but the expiry has passed
	#[error("the token has expired")]
	Expired,
	/// The signature does not match, or the token is not a well formed JWS of
	/// our claims
	#[error("the token is malformed")]
	Malformed,
}

/// The outcome of checking a token against the kind a caller expects. Every
/// branch other than [`TokenVerification::Valid`] must be treated as a denial;
/// the branches only exist so that the cause can be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenVerification {
	/// The token is authentic, unexpired and of the expected kind
	Valid(TokenClaims),
	/// The token has expired
	Expired,
	/// The token is not a token this service has signed
	Malformed,
	/// The token is authentic but was minted as another kind
	WrongKind {
		/// The kind the caller asked for
		expected: TokenKind,
		/// The kind the token was minted as
		found: TokenKind,
	},
}

impl TokenVerification {
	/// Returns the claims if the token is valid, and nothing otherwise
	pub fn into_claims(self) -> Option<TokenClaims> {
		match self {
			Self::Valid(claims) => Some(claims),
			_ => None,
		}
	}
}

/// Mints and checks the signed credentials of the API. Tokens are never stored
/// server side. A token is good for as long as its signature verifies and
/// its expiry has not passed, which makes every operation here a pure function
/// of the token, the secret and the clock.
#[derive(Clone)]
pub struct TokenService {
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
}

impl TokenService {
	/// Creates a token service that signs with the given secret using
	/// HMAC-SHA256
	pub fn new(secret: &str) -> Self {
		Self {
			encoding_key: EncodingKey::from_secret(secret.as_bytes()),
			decoding_key: DecodingKey::from_secret(secret.as_bytes()),
		}
	}

	/// Mints an access token for the given principal, valid for
	/// [`constants::ACCESS_TOKEN_VALIDITY`] from now.
	pub fn generate_access_token(
		&self,
		external_id: Uuid,
		email: &str,
		is_admin: bool,
	) -> Result<String, ErrorType> {
		self.generate_access_token_at(external_id, email, is_admin, OffsetDateTime::now_utc())
	}

	/// Same as [`TokenService::generate_access_token`], issued at the given
	/// time.
	pub fn generate_access_token_at(
		&self,
		external_id: Uuid,
		email: &str,
		is_admin: bool,
		issued_at: OffsetDateTime,
	) -> Result<String, ErrorType> {
		self.sign(&TokenClaims {
			sub: external_id,
			iat: issued_at,
			exp: issued_at + constants::ACCESS_TOKEN_VALIDITY,
			payload: TokenPayload::Access {
				email: email.to_string(),
				is_admin,
			},
		})
	}

	/// Mints a refresh token for the given principal, valid for
	/// [`constants::REFRESH_TOKEN_VALIDITY`] from now.
	pub fn generate_refresh_token(&self, external_id: Uuid) -> Result<String, ErrorType> {
		self.generate_refresh_token_at(external_id, OffsetDateTime::now_utc())
	}

	/// Same as [`TokenService::generate_refresh_token`], issued at the given
	/// time.
	pub fn generate_refresh_token_at(
		&self,
		external_id: Uuid,
		issued_at: OffsetDateTime,
	) -> Result<String, ErrorType> {
		self.sign(&TokenClaims {
			sub: external_id,
			iat: issued_at,
			exp: issued_at + constants::REFRESH_TOKEN_VALIDITY,
			payload: TokenPayload::Refresh,
		})
	}

	/// Checks the signature, structure and expiry of a token and returns its
	/// claims.
	pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
		self.decode_at(token, OffsetDateTime::now_utc())
	}

	/// Same as [`TokenService::decode`], with expiry judged at the given time.
	pub fn decode_at(&self, token: &str, now: OffsetDateTime) -> Result<TokenClaims, TokenError> {
		let TokenData { header: _, claims } =
			jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &{
				let mut validation = Validation::new(Algorithm::HS256);

				// We'll manually do this
				validation.validate_exp = false;
				validation.validate_nbf = false;
				validation.validate_aud = false;

				validation
			})
			.map_err(|err| {
				debug!("Unable to decode token: {}", err);
				TokenError::Malformed
			})?;

		if now > claims.exp {
			return Err(TokenError::Expired);
		}

		Ok(claims)
	}

	/// Decodes a token and checks that it was minted as the expected kind.
	pub fn verify(&self, token: &str, expected: TokenKind) -> TokenVerification {
		self.verify_at(token, expected, OffsetDateTime::now_utc())
	}

	/// Same as [`TokenService::verify`], with expiry judged at the given time.
	pub fn verify_at(
		&self,
		token: &str,
		expected: TokenKind,
		now: OffsetDateTime,
	) -> TokenVerification {
		match self.decode_at(token, now) {
			Ok(claims) if claims.kind() == expected => TokenVerification::Valid(claims),
			Ok(claims) => TokenVerification::WrongKind {
				expected,
				found: claims.kind(),
			},
			Err(TokenError::Expired) => TokenVerification::Expired,
			Err(TokenError::Malformed) => TokenVerification::Malformed,
		}
	}

	fn sign(&self, claims: &TokenClaims) -> Result<String, ErrorType> {
		Ok(jsonwebtoken::encode(
			&Header::new(Algorithm::HS256),
			claims,
			&self.encoding_key,
		)?)
	}
}

#[cfg(test)]
mod tests {
	use time::{Duration, OffsetDateTime};
	use uuid::Uuid;

	use super::{TokenError, TokenService, TokenVerification};
	use crate::{
		models::{TokenKind, TokenPayload},
		utils::constants,
	};

	fn service() -> TokenService {
		TokenService::new("test-jwt-secret-key")
	}

	fn issued_at() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_760_000_000).unwrap()
	}

	#[test]
	fn access_token_round_trips_its_claims() {
		let tokens = service();
		let subject = Uuid::new_v4();
		let token = tokens
			.generate_access_token(subject, "skipper@example.com", true)
			.unwrap();

		let claims = tokens.decode(&token).unwrap();
		assert_eq!(claims.sub, subject);
		assert_eq!(claims.kind(), TokenKind::Access);
		assert_eq!(
			claims.payload,
			TokenPayload::Access {
				email: "skipper@example.com".to_string(),
				is_admin: true,
			}
		);
		assert_eq!(claims.exp - claims.iat, constants::ACCESS_TOKEN_VALIDITY);
	}

	#[test]
	fn refresh_token_lives_thirty_days() {
		let tokens = service();
		let token = tokens
			.generate_refresh_token_at(Uuid::new_v4(), issued_at())
			.unwrap();

		let claims = tokens.decode_at(&token, issued_at()).unwrap();
		assert_eq!(claims.kind(), TokenKind::Refresh);
		assert_eq!(claims.exp, issued_at() + Duration::days(30));
	}

	#[test]
	fn expiry_boundary() {
		let tokens = service();
		let token = tokens
			.generate_access_token_at(Uuid::new_v4(), "mate@example.com", false, issued_at())
			.unwrap();
		let expiry = issued_at() + constants::ACCESS_TOKEN_VALIDITY;

		assert!(matches!(
			tokens.verify_at(&token, TokenKind::Access, expiry - Duration::seconds(1)),
			TokenVerification::Valid(_)
		));
		assert!(matches!(
			tokens.verify_at(&token, TokenKind::Access, expiry),
			TokenVerification::Valid(_)
		));
		assert_eq!(
			tokens.verify_at(&token, TokenKind::Access, expiry + Duration::seconds(1)),
			TokenVerification::Expired
		);
		assert_eq!(
			tokens.decode_at(&token, expiry + Duration::seconds(1)),
			Err(TokenError::Expired)
		);
	}

	#[test]
	fn kinds_never_satisfy_each_other() {
		let tokens = service();
		let subject = Uuid::new_v4();
		let access = tokens
			.generate_access_token(subject, "skipper@example.com", false)
			.unwrap();
		let refresh = tokens.generate_refresh_token(subject).unwrap();

		assert_eq!(
			tokens.verify(&refresh, TokenKind::Access),
			TokenVerification::WrongKind {
				expected: TokenKind::Access,
				found: TokenKind::Refresh,
			}
		);
		assert_eq!(
			tokens.verify(&access, TokenKind::Refresh),
			TokenVerification::WrongKind {
				expected: TokenKind::Refresh,
				found: TokenKind::Access,
			}
		);
		assert!(tokens.verify(&refresh, TokenKind::Refresh).into_claims().is_some());
	}

	#[test]
	fn foreign_signature_is_malformed() {
		let token = TokenService::new("someone-elses-secret")
			.generate_access_token(Uuid::new_v4(), "skipper@example.com", false)
			.unwrap();

		assert_eq!(service().decode(&token), Err(TokenError::Malformed));
		assert_eq!(
			service().verify(&token, TokenKind::Access),
			TokenVerification::Malformed
		);
	}

	#[test]
	fn garbage_is_malformed() {
		assert_eq!(service().decode("not.a.token"), Err(TokenError::Malformed));
		assert_eq!(service().decode(""), Err(TokenError::Malformed));
	}
}
