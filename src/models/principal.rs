use uuid::Uuid;

/// The authenticated caller of a request. It is resolved once by the
/// authentication layer and then stored in the request extensions, so that
/// every layer and handler after it reads the same principal instead of
/// deriving it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
	/// The internal numeric id. This is the key every ownership chain joins on
	/// and is never exposed outside the API
	pub id: i64,
	/// The opaque identifier handed out to clients and used as the token
	/// subject
	pub external_id: Uuid,
	/// The email the account was registered with
	pub email: String,
	/// Inactive principals are refused at authentication time
	pub active: bool,
	/// Whether the principal is an administrator
	pub admin: bool,
}
