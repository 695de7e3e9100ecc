use argon2::{
	password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
	Algorithm,
	Argon2,
	Version,
};

use crate::prelude::*;

fn hasher(pepper: &str) -> Result<Argon2<'_>, ErrorType> {
	Argon2::new_with_secret(
		pepper.as_bytes(),
		Algorithm::Argon2id,
		Version::V0x13,
		constants::HASHING_PARAMS,
	)
	.inspect_err(|err| {
		error!("Error creating Argon2: `{}`", err);
	})
	.map_err(ErrorType::server_error)
}

/// Hashes a password with Argon2id, salted per password and peppered with the
/// configured secret. Returns the PHC string to store.
pub fn hash_password(password: &str, pepper: &str) -> Result<String, ErrorType> {
	Ok(hasher(pepper)?
		.hash_password(
			password.as_bytes(),
			SaltString::generate(&mut rand::thread_rng()).as_salt(),
		)
		.inspect_err(|err| {
			error!("Error hashing password: `{}`", err);
		})
		.map_err(ErrorType::server_error)?
		.to_string())
}

/// Checks a password against a stored PHC string. A mismatch is `Ok(false)`;
/// only a corrupt hash or a bad pepper is an error.
pub fn verify_password(password: &str, hash: &str, pepper: &str) -> Result<bool, ErrorType> {
	let hash = PasswordHash::new(hash).map_err(|err| ErrorType::server_error(err.to_string()))?;

	Ok(hasher(pepper)?
		.verify_password(password.as_bytes(), &hash)
		.is_ok())
}
