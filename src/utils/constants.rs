use time::Duration;

/// How long an access token stays valid after it is issued
pub const ACCESS_TOKEN_VALIDITY: Duration = Duration::minutes(15);

/// How long a refresh token stays valid after it is issued. After this time,
/// the client has to log in again
pub const REFRESH_TOKEN_VALIDITY: Duration = Duration::days(30);

/// The parameters that will be used to hash user passwords, using argon2 as
/// the hashing algorithm.
pub const HASHING_PARAMS: argon2::Params =
	if let Ok(params) = argon2::Params::new(8192, 4, 4, None) {
		params
	} else {
		panic!("Failed to create hashing params");
	};

/// The largest request body the ownership layer will buffer when it has to
/// read a parent id out of the body
pub const MAX_BUFFERED_BODY_SIZE: usize = 1024 * 1024;
