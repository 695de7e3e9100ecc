use sqlx::FromRow;

use crate::{models::Principal, prelude::*};

/// A row of the `users` table, as far as authentication cares about it
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
	/// The internal id, used as the key of every ownership join
	pub id: i64,
	/// The id exposed to clients and carried in tokens, as a UUID string
	pub public_id: String,
	/// Lowercased email the account logs in with
	pub email: String,
	/// The argon2 hash of the password
	pub password: String,
	/// Inactive accounts cannot log in or use their tokens
	pub active: bool,
	/// Administrator flag, copied into access tokens
	pub admin: bool,
}

impl UserRow {
	/// The principal this account authenticates as
	pub fn into_principal(self) -> Result<Principal, ErrorType> {
		let external_id = Uuid::parse_str(&self.public_id).map_err(|err| {
			error!("User {} has an invalid public id `{}`: {}", self.id, self.public_id, err);
			ErrorType::server_error(err)
		})?;

		Ok(Principal {
			id: self.id,
			external_id,
			email: self.email,
			active: self.active,
			admin: self.admin,
		})
	}
}

/// The details needed to register a new account
#[derive(Debug, Clone)]
pub struct UserToSignUp<'a> {
	/// Already lowercased by the caller
	pub email: &'a str,
	/// The argon2 hash, never the password itself
	pub password_hash: &'a str,
	/// Display name
	pub name: &'a str,
	/// Optional contact number
	pub phone: Option<&'a str>,
}

/// Looks up the account a token was issued to
pub async fn get_user_by_public_id(
	connection: &mut DatabaseConnection,
	public_id: &Uuid,
) -> Result<Option<UserRow>, sqlx::Error> {
	query_as::<_, UserRow>(
		r#"
		SELECT
			id,
			public_id,
			email,
			password,
			active,
			admin
		FROM
			users
		WHERE
			public_id = $1;
		"#,
	)
	.bind(public_id.to_string())
	.fetch_optional(&mut *connection)
	.await
}

/// Looks up the account registered with `email`
pub async fn get_user_by_email(
	connection: &mut DatabaseConnection,
	email: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
	query_as::<_, UserRow>(
		r#"
		SELECT
			id,
			public_id,
			email,
			password,
			active,
			admin
		FROM
			users
		WHERE
			email = $1;
		"#,
	)
	.bind(email)
	.fetch_optional(&mut *connection)
	.await
}

/// Whether no account is registered with `email` yet
pub async fn is_email_available(
	connection: &mut DatabaseConnection,
	email: &str,
) -> Result<bool, sqlx::Error> {
	get_user_by_email(connection, email)
		.await
		.map(|user| user.is_none())
}

/// Creates an active, non-admin account and returns it
pub async fn create_user(
	connection: &mut DatabaseConnection,
	user: UserToSignUp<'_>,
) -> Result<UserRow, sqlx::Error> {
	let public_id = Uuid::new_v4();

	query_as::<_, UserRow>(
		r#"
		INSERT INTO
			users(
				public_id,
				email,
				password,
				name,
				phone
			)
		VALUES
			($1, $2, $3, $4, $5)
		RETURNING
			id,
			public_id,
			email,
			password,
			active,
			admin;
		"#,
	)
	.bind(public_id.to_string())
	.bind(user.email)
	.bind(user.password_hash)
	.bind(user.name)
	.bind(user.phone)
	.fetch_one(&mut *connection)
	.await
}

/// Activates or deactivates the account with the internal id `id`
pub async fn set_user_active(
	connection: &mut DatabaseConnection,
	user_id: i64,
	active: bool,
) -> Result<(), sqlx::Error> {
	query(
		r#"
		UPDATE
			users
		SET
			active = $2
		WHERE
			id = $1;
		"#,
	)
	.bind(user_id)
	.bind(active)
	.execute(&mut *connection)
	.await?;

	Ok(())
}
